//! Street-level panorama search and filtering.
//!
//! A [`Finder`] samples candidate points from a geometry, looks each one up
//! through a [`PanoramaProvider`](panofind_imagery::PanoramaProvider) with
//! bounded concurrency and retries, keeps the panoramas its
//! [`LocationOptions`](panofind_core::LocationOptions) accept, and streams
//! them deduplicated by id.

pub mod collect;
pub mod error;
pub mod finder;
pub mod geometry;
pub mod lookup;
pub mod policy;
pub mod retry;
pub mod sampler;
pub mod tiles;

pub use collect::{collect_locations, LocationSource};
pub use error::FinderError;
pub use finder::{AcceptedPanorama, Finder, DEFAULT_MAX_BATCHES};
pub use lookup::LookupContext;
pub use policy::{
    ensure_full_panorama, evaluate, filter_panoramas, is_panorama_wanted, Rejection, Verdict,
};
pub use retry::{retry_with_backoff, RetryPolicy};
pub use sampler::{Sampler, SamplingStrategy};
pub use tiles::{
    panos_in_geometry_via_tiles, tile_at, tile_bounds, tiles_covering, TileCoord, COVERAGE_ZOOM,
    MAX_ZOOM,
};
