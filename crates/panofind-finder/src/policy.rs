//! Accept/reject decisions for found panoramas.
//!
//! [`evaluate`] is a pure function of the record and the options. When a
//! non-ignored predicate needs metadata the record lacks, it asks for it
//! instead of guessing; [`is_panorama_wanted`] then fetches the full record by
//! id once and evaluates again.

use std::fmt;

use panofind_core::{
    ImageGeneration, LocationOptions, MetadataLevel, PanoramaRecord, PredicateOption,
};
use panofind_imagery::{ImageryError, PanoramaProvider};

use crate::retry::{retry_with_backoff, RetryPolicy};

/// Why a panorama was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Coverage,
    Buildings,
    /// Building presence was constrained but the panorama has no place data.
    BuildingsUnknown,
    Trekker,
    Intersection,
    FirstGen,
    Terminus,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Rejection::Coverage => "coverage",
            Rejection::Buildings => "buildings",
            Rejection::BuildingsUnknown => "buildings unknown",
            Rejection::Trekker => "trekker",
            Rejection::Intersection => "intersection",
            Rejection::FirstGen => "first generation",
            Rejection::Terminus => "terminus",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject(Rejection),
    /// The record must be fetched in full before a decision can be made.
    NeedsMetadata(MetadataLevel),
}

/// Applies `options` to `panorama`, short-circuiting on the first failure.
///
/// Checks run in a fixed order: coverage, buildings, trekker, intersection,
/// first generation, terminus. Ignored predicates never request metadata.
#[must_use]
pub fn evaluate(panorama: &PanoramaRecord, options: &LocationOptions) -> Verdict {
    let needs_extended = !panorama.has_metadata(MetadataLevel::Extended);

    if !options.unofficial.is_ignore() {
        if needs_extended {
            return Verdict::NeedsMetadata(MetadataLevel::Extended);
        }
        if !options.unofficial.admits(panorama.is_third_party) {
            return Verdict::Reject(Rejection::Coverage);
        }
    }

    if !options.buildings.is_ignore() {
        if !panorama.has_metadata(MetadataLevel::Places) {
            return Verdict::NeedsMetadata(MetadataLevel::Places);
        }
        match panorama.has_building() {
            None => return Verdict::Reject(Rejection::BuildingsUnknown),
            Some(found) if !options.buildings.admits(found) => {
                return Verdict::Reject(Rejection::Buildings);
            }
            Some(_) => {}
        }
    }

    let checks: [(PredicateOption, Rejection, fn(&PanoramaRecord) -> bool); 4] = [
        (options.trekker, Rejection::Trekker, PanoramaRecord::is_trekker),
        (options.intersections, Rejection::Intersection, PanoramaRecord::is_intersection),
        (options.first_gen, Rejection::FirstGen, is_first_gen),
        (options.terminus, Rejection::Terminus, PanoramaRecord::is_terminus),
    ];
    for (option, rejection, predicate) in checks {
        if option.is_ignore() {
            continue;
        }
        if needs_extended {
            return Verdict::NeedsMetadata(MetadataLevel::Extended);
        }
        if !option.admits(predicate(panorama)) {
            return Verdict::Reject(rejection);
        }
    }

    Verdict::Accept
}

/// Unknown generations are not first generation.
fn is_first_gen(panorama: &PanoramaRecord) -> bool {
    panorama.generation() == Some(ImageGeneration::Gen1)
}

/// Re-fetches `panorama` by id with all metadata, returning a new record.
///
/// A malformed depth payload is not fatal when `want_depth` is set: the record
/// is fetched again without depth and marked as carrying all the depth it can.
/// If the id no longer resolves, the input is returned with its metadata flags
/// set so callers do not ask again.
///
/// # Errors
///
/// Propagates provider errors once retries are exhausted.
pub async fn ensure_full_panorama<P: PanoramaProvider>(
    provider: &P,
    panorama: &PanoramaRecord,
    locale: &str,
    want_depth: bool,
    retry: RetryPolicy,
) -> Result<PanoramaRecord, ImageryError> {
    let id = panorama.id.as_str();
    let fetched =
        match retry_with_backoff(retry, || provider.find_panorama_by_id(id, locale, want_depth))
            .await
        {
            Err(ImageryError::MalformedDepth { reason, .. }) if want_depth => {
                tracing::warn!(pano_id = id, %reason, "malformed depth map, refetching without it");
                retry_with_backoff(retry, || provider.find_panorama_by_id(id, locale, false))
                    .await?
                    .map(|mut full| {
                        full.has_depth = true;
                        full
                    })
            }
            other => other?,
        };

    Ok(fetched.unwrap_or_else(|| {
        tracing::debug!(pano_id = id, "panorama not found by id, keeping partial record");
        let mut partial = panorama.clone();
        partial.has_extended_info = true;
        partial.has_places = true;
        partial.has_depth = want_depth;
        partial
    }))
}

/// Evaluates `panorama` against `options`, upgrading it at most once.
///
/// Returns the (possibly upgraded) record when accepted and `None` when
/// rejected.
///
/// # Errors
///
/// Propagates provider errors from the metadata upgrade.
pub async fn is_panorama_wanted<P: PanoramaProvider>(
    provider: &P,
    panorama: PanoramaRecord,
    options: &LocationOptions,
    locale: &str,
    retry: RetryPolicy,
) -> Result<Option<PanoramaRecord>, ImageryError> {
    let mut panorama = panorama;
    let mut upgraded = false;
    loop {
        match evaluate(&panorama, options) {
            Verdict::Accept => return Ok(Some(panorama)),
            Verdict::Reject(reason) => {
                tracing::debug!(pano_id = %panorama.id, %reason, "panorama rejected");
                return Ok(None);
            }
            Verdict::NeedsMetadata(level) if !upgraded => {
                tracing::debug!(pano_id = %panorama.id, ?level, "fetching full panorama metadata");
                panorama = ensure_full_panorama(provider, &panorama, locale, false, retry).await?;
                upgraded = true;
            }
            Verdict::NeedsMetadata(level) => {
                tracing::debug!(
                    pano_id = %panorama.id,
                    ?level,
                    "metadata still missing after upgrade, rejecting"
                );
                return Ok(None);
            }
        }
    }
}

/// Keeps the panoramas in `panoramas` that `options` accept, in input order.
///
/// A panorama whose metadata upgrade fails is logged and dropped.
pub async fn filter_panoramas<P: PanoramaProvider>(
    provider: &P,
    panoramas: Vec<PanoramaRecord>,
    options: &LocationOptions,
    locale: &str,
    retry: RetryPolicy,
) -> Vec<PanoramaRecord> {
    let mut accepted = Vec::with_capacity(panoramas.len());
    for panorama in panoramas {
        let id = panorama.id.clone();
        match is_panorama_wanted(provider, panorama, options, locale, retry).await {
            Ok(Some(kept)) => accepted.push(kept),
            Ok(None) => {}
            Err(err) => tracing::warn!(pano_id = %id, error = %err, "could not evaluate panorama"),
        }
    }
    accepted
}

#[cfg(test)]
#[path = "policy_test.rs"]
mod tests;
