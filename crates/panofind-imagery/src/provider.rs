use std::future::Future;

use panofind_core::{CoverageTier, GeoPoint, PanoramaRecord};

use crate::error::ImageryError;

/// Source of panorama metadata.
///
/// Every call is a network round trip and may fail transiently; see
/// [`ImageryError::is_transient`]. Implementations do not retry.
pub trait PanoramaProvider: Send + Sync {
    /// Finds the panorama nearest to `point` within `radius_m` metres in the
    /// given coverage tier. Returned records carry extended metadata but no
    /// places.
    fn find_panorama(
        &self,
        point: GeoPoint,
        radius_m: u32,
        locale: &str,
        tier: CoverageTier,
    ) -> impl Future<Output = Result<Option<PanoramaRecord>, ImageryError>> + Send;

    /// Fetches a panorama by id with all metadata, including places, and a
    /// depth payload when `want_depth` is set.
    fn find_panorama_by_id(
        &self,
        id: &str,
        locale: &str,
        want_depth: bool,
    ) -> impl Future<Output = Result<Option<PanoramaRecord>, ImageryError>> + Send;

    /// Lists every panorama in a zoom-17 Web Mercator tile. Returned records
    /// carry only position and heading.
    fn get_tile_coverage(
        &self,
        tile_x: u32,
        tile_y: u32,
    ) -> impl Future<Output = Result<Vec<PanoramaRecord>, ImageryError>> + Send;
}
