//! Single-point panorama lookup with the official-then-unofficial fallback.

use panofind_core::{CoverageTier, GeoPoint, LocationOptions, PanoramaRecord};
use panofind_imagery::{ImageryError, PanoramaProvider};

use crate::policy::is_panorama_wanted;
use crate::retry::{retry_with_backoff, RetryPolicy};

/// Everything a single lookup needs besides the point.
#[derive(Debug)]
pub struct LookupContext<'a, P> {
    pub provider: &'a P,
    pub radius_m: u32,
    pub locale: &'a str,
    pub options: &'a LocationOptions,
    pub retry: RetryPolicy,
}

impl<P> Clone for LookupContext<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for LookupContext<'_, P> {}

impl<P: PanoramaProvider> LookupContext<'_, P> {
    /// Nearest panorama to `point` in one coverage tier, with retries.
    ///
    /// # Errors
    ///
    /// Returns the provider error once retries are exhausted, or immediately
    /// for permanent errors.
    pub async fn lookup(
        &self,
        point: GeoPoint,
        tier: CoverageTier,
    ) -> Result<Option<PanoramaRecord>, ImageryError> {
        retry_with_backoff(self.retry, || {
            self.provider
                .find_panorama(point, self.radius_m, self.locale, tier)
        })
        .await
    }

    async fn lookup_wanted(
        &self,
        point: GeoPoint,
        tier: CoverageTier,
    ) -> Result<Option<PanoramaRecord>, ImageryError> {
        match self.lookup(point, tier).await? {
            Some(found) => {
                is_panorama_wanted(self.provider, found, self.options, self.locale, self.retry)
                    .await
            }
            None => Ok(None),
        }
    }

    /// Finds an acceptable panorama near `point`.
    ///
    /// Official coverage is searched first. Only when that finds nothing
    /// acceptable, and unofficial coverage is not rejected, is the unofficial
    /// tier searched.
    ///
    /// # Errors
    ///
    /// Propagates provider errors from either tier or from a metadata upgrade.
    pub async fn find_location(
        &self,
        point: GeoPoint,
    ) -> Result<Option<PanoramaRecord>, ImageryError> {
        if let Some(found) = self.lookup_wanted(point, CoverageTier::Official).await? {
            return Ok(Some(found));
        }
        if !self.options.allows_unofficial() {
            return Ok(None);
        }
        tracing::debug!(%point, "nothing acceptable in official coverage, trying unofficial");
        self.lookup_wanted(point, CoverageTier::Unofficial).await
    }
}
