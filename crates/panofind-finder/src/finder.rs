//! Search orchestration: sample a geometry, look up every candidate point with
//! bounded concurrency, and stream the accepted panoramas.

use std::collections::HashSet;

use futures::future;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use geo::Geometry;
use panofind_core::{FinderConfig, GeoPoint, LocationOptions, PanoramaRecord};
use panofind_imagery::PanoramaProvider;
use tokio::sync::Semaphore;

use crate::geometry::{coord_to_point, validate_geometry};
use crate::lookup::LookupContext;
use crate::policy::filter_panoramas;
use crate::retry::RetryPolicy;
use crate::sampler::{Sampler, SamplingStrategy};
use crate::tiles::panos_in_geometry_via_tiles;

/// Batches a random search may draw before settling for fewer than `count`.
pub const DEFAULT_MAX_BATCHES: u32 = 50;

const DEFAULT_RADIUS_M: u32 = 50;

/// A panorama that passed the options, and the candidate point it was found
/// from.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedPanorama {
    pub panorama: PanoramaRecord,
    pub origin: GeoPoint,
}

/// Finds panoramas in geometries.
///
/// Built with [`Finder::lattice`], [`Finder::random`] or [`Finder::vertices`]
/// (or [`Finder::from_config`]) and tuned with the `with_*` methods:
///
/// ```no_run
/// # use panofind_finder::Finder;
/// # fn demo<P: panofind_imagery::PanoramaProvider>(provider: P) {
/// let finder = Finder::random(provider, 20)
///     .with_concurrency(4)
///     .with_radius(100)
///     .with_seed(7);
/// # }
/// ```
///
/// All lookups made through one `Finder` share its concurrency limit.
pub struct Finder<P> {
    provider: P,
    sampler: Sampler,
    limiter: Semaphore,
    concurrency: usize,
    radius_m: u32,
    locale: String,
    options: LocationOptions,
    retry: RetryPolicy,
    /// Batch budget for topping random searches up to their count; `None`
    /// runs a single batch.
    max_batches: Option<u32>,
}

impl<P: PanoramaProvider> Finder<P> {
    /// A finder with default settings: one lookup at a time, 50 m radius,
    /// `en` locale, default options and retry policy.
    #[must_use]
    pub fn new(provider: P, strategy: SamplingStrategy) -> Self {
        Self {
            provider,
            sampler: Sampler::new(strategy),
            limiter: Semaphore::new(1),
            concurrency: 1,
            radius_m: DEFAULT_RADIUS_M,
            locale: "en".to_owned(),
            options: LocationOptions::default(),
            retry: RetryPolicy::default(),
            max_batches: Some(DEFAULT_MAX_BATCHES),
        }
    }

    /// Grid points `spacing_m` apart.
    #[must_use]
    pub fn lattice(provider: P, spacing_m: f64) -> Self {
        Self::new(provider, SamplingStrategy::Lattice { spacing_m })
    }

    /// `count` random points per geometry, topped up in further batches until
    /// `count` distinct panoramas are found or [`DEFAULT_MAX_BATCHES`] batches
    /// have run.
    #[must_use]
    pub fn random(provider: P, count: usize) -> Self {
        Self::new(provider, SamplingStrategy::Random { count })
    }

    /// Only the geometry's own vertices.
    #[must_use]
    pub fn vertices(provider: P) -> Self {
        Self::new(provider, SamplingStrategy::Vertices)
    }

    /// A finder using the radius, locale, concurrency, options and retry
    /// settings of `config`.
    #[must_use]
    pub fn from_config(provider: P, strategy: SamplingStrategy, config: &FinderConfig) -> Self {
        Self::new(provider, strategy)
            .with_concurrency(config.max_concurrent_lookups)
            .with_radius(config.search_radius_m)
            .with_locale(&config.locale)
            .with_options(config.options)
            .with_retry_policy(RetryPolicy::from_config(config))
    }

    /// Caps simultaneous lookups. Values below 1 are raised to 1.
    #[must_use]
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        let limit = limit.max(1);
        self.concurrency = limit;
        self.limiter = Semaphore::new(limit);
        self
    }

    #[must_use]
    pub fn with_radius(mut self, radius_m: u32) -> Self {
        self.radius_m = radius_m;
        self
    }

    #[must_use]
    pub fn with_locale(mut self, locale: &str) -> Self {
        locale.clone_into(&mut self.locale);
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: LocationOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Makes random sampling reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.sampler = Sampler::seeded(self.sampler.strategy(), seed);
        self
    }

    /// Sets the batch budget of random searches; `None` draws a single batch
    /// and returns whatever it finds. A budget of 0 also runs one batch.
    #[must_use]
    pub fn with_max_batches(mut self, max_batches: Option<u32>) -> Self {
        self.max_batches = max_batches;
        self
    }

    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    #[must_use]
    pub fn options(&self) -> &LocationOptions {
        &self.options
    }

    #[must_use]
    pub fn strategy(&self) -> SamplingStrategy {
        self.sampler.strategy()
    }

    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    fn context(&self) -> LookupContext<'_, P> {
        LookupContext {
            provider: &self.provider,
            radius_m: self.radius_m,
            locale: &self.locale,
            options: &self.options,
            retry: self.retry,
        }
    }

    /// Looks up one point. Failures are logged and yield `None`.
    pub async fn find_point(&self, point: GeoPoint) -> Option<AcceptedPanorama> {
        // The semaphore is never closed; the permit is released on drop.
        let _permit = self.limiter.acquire().await.ok()?;
        match self.context().find_location(point).await {
            Ok(found) => found.map(|panorama| AcceptedPanorama {
                panorama,
                origin: point,
            }),
            Err(err) => {
                tracing::warn!(%point, error = %err, "lookup failed, skipping point");
                None
            }
        }
    }

    /// Looks up every point, yielding accepted panoramas as lookups complete.
    ///
    /// Results are not deduplicated.
    pub fn find_locations(
        &self,
        points: Vec<GeoPoint>,
    ) -> impl Stream<Item = AcceptedPanorama> + Send + '_ {
        stream::iter(points)
            .map(move |point| self.find_point(point))
            .buffer_unordered(self.concurrency)
            .filter_map(future::ready)
    }

    /// Streams the accepted panoramas in `geometry`, each panorama id at most
    /// once.
    ///
    /// A geometry with out-of-range coordinates, or parts of a kind the
    /// strategy cannot sample, is logged and skipped.
    pub fn search<'a>(
        &'a self,
        geometry: &'a Geometry<f64>,
        name: Option<&'a str>,
    ) -> BoxStream<'a, AcceptedPanorama> {
        if let Err(err) = validate_geometry(geometry, name.unwrap_or("geometry")) {
            tracing::warn!(error = %err, "skipping geometry");
            return stream::empty().boxed();
        }
        let mut seen = HashSet::new();
        self.search_parts(geometry, name)
            .filter(move |found| future::ready(seen.insert(found.panorama.id.clone())))
            .boxed()
    }

    /// [`Finder::search`] collected into a `Vec`.
    pub async fn search_all(
        &self,
        geometry: &Geometry<f64>,
        name: Option<&str>,
    ) -> Vec<AcceptedPanorama> {
        self.search(geometry, name).collect().await
    }

    fn search_parts<'a>(
        &'a self,
        geometry: &'a Geometry<f64>,
        name: Option<&'a str>,
    ) -> BoxStream<'a, AcceptedPanorama> {
        match geometry {
            Geometry::Point(point) => stream::once(self.find_point(coord_to_point(point.0)))
                .filter_map(future::ready)
                .boxed(),
            Geometry::GeometryCollection(collection) => stream::iter(collection.iter())
                .flat_map(move |part| self.search_parts(part, name))
                .boxed(),
            _ => {
                if let Some((count, max_batches)) = self.top_up(geometry) {
                    return stream::once(self.search_until_n(geometry, name, count, max_batches))
                        .flat_map(stream::iter)
                        .boxed();
                }
                match self.sampler.points_in(geometry) {
                    Ok(points) => {
                        tracing::debug!(
                            name = name.unwrap_or("geometry"),
                            points = points.len(),
                            "searching candidate points"
                        );
                        self.find_locations(points).boxed()
                    }
                    Err(err) => {
                        tracing::warn!(
                            name = name.unwrap_or("geometry"),
                            error = %err,
                            "skipping geometry"
                        );
                        stream::empty().boxed()
                    }
                }
            }
        }
    }

    /// Random areas and lines are topped up; everything else is one pass.
    fn top_up(&self, geometry: &Geometry<f64>) -> Option<(usize, u32)> {
        let SamplingStrategy::Random { count } = self.sampler.strategy() else {
            return None;
        };
        let sampled = matches!(
            geometry,
            Geometry::Polygon(_)
                | Geometry::MultiPolygon(_)
                | Geometry::LineString(_)
                | Geometry::MultiLineString(_)
        );
        match self.max_batches {
            Some(max_batches) if sampled => Some((count, max_batches)),
            _ => None,
        }
    }

    /// Draws random batches until `n` distinct panoramas are accepted or
    /// `max_batches` batches have run. At least one batch always runs.
    ///
    /// Each batch samples as many points as are still missing. Panorama ids
    /// are deduplicated across batches and at most `n` results are returned,
    /// in acceptance order. Running out of batches is not an error.
    pub async fn search_until_n(
        &self,
        geometry: &Geometry<f64>,
        name: Option<&str>,
        n: usize,
        max_batches: u32,
    ) -> Vec<AcceptedPanorama> {
        let label = name.unwrap_or("geometry");
        let max_batches = max_batches.max(1);
        let mut seen = HashSet::new();
        let mut accepted = Vec::with_capacity(n);
        let mut batches = 0u32;

        while accepted.len() < n {
            batches += 1;
            if batches > max_batches {
                tracing::info!(
                    name = label,
                    found = accepted.len(),
                    wanted = n,
                    max_batches,
                    "batch budget spent, returning partial result"
                );
                break;
            }
            let points = match self.sampler.points_with_count(geometry, n - accepted.len()) {
                Ok(points) => points,
                Err(err) => {
                    tracing::warn!(name = label, error = %err, "skipping geometry");
                    break;
                }
            };
            let batch: Vec<AcceptedPanorama> = self.find_locations(points).collect().await;
            for found in batch {
                if seen.insert(found.panorama.id.clone()) {
                    accepted.push(found);
                }
            }
            tracing::debug!(
                name = label,
                batch = batches,
                found = accepted.len(),
                wanted = n,
                "random batch complete"
            );
        }

        accepted.truncate(n);
        accepted
    }

    /// Every panorama inside `geometry` according to the provider's coverage
    /// tiles, unfiltered and without extended metadata.
    pub fn panos_via_tiles<'a>(
        &'a self,
        geometry: &'a Geometry<f64>,
    ) -> impl Stream<Item = PanoramaRecord> + 'a {
        panos_in_geometry_via_tiles(&self.provider, geometry, self.retry)
    }

    /// Applies this finder's options to already-known panoramas.
    pub async fn filter(&self, panoramas: Vec<PanoramaRecord>) -> Vec<PanoramaRecord> {
        filter_panoramas(
            &self.provider,
            panoramas,
            &self.options,
            &self.locale,
            self.retry,
        )
        .await
    }
}
