//! Exhaustive panorama discovery from Web Mercator coverage tiles.
//!
//! Instead of sampling points, every zoom-17 tile overlapping the geometry is
//! listed and the panoramas inside the geometry are kept. Records found this
//! way only carry position and heading.

use std::f64::consts::PI;

use futures::stream::{self, Stream, StreamExt};
use geo::{BoundingRect, Coord, Geometry, Intersects, Point, Rect};
use panofind_core::{GeoPoint, PanoramaRecord};
use panofind_imagery::PanoramaProvider;

use crate::geometry::point_to_coord;
use crate::retry::{retry_with_backoff, RetryPolicy};

/// Zoom level of the provider's coverage tiles.
pub const COVERAGE_ZOOM: u8 = 17;

/// Deepest zoom accepted; deeper requests are clamped to it. Tile indices at
/// this level, plus one, still fit in a `u32`.
pub const MAX_ZOOM: u8 = 30;

/// Web Mercator is undefined beyond this latitude.
const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

/// The tile containing `point`. Latitudes past the Mercator limit are clamped,
/// as are zooms past [`MAX_ZOOM`].
#[must_use]
pub fn tile_at(point: GeoPoint, zoom: u8) -> TileCoord {
    let zoom = zoom.min(MAX_ZOOM);
    let n = f64::from(1u32 << zoom);
    let lat_rad = point.lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    let x = ((point.lng + 180.0) / 360.0 * n).floor();
    let y = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n).floor();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let clamp = |v: f64| v.clamp(0.0, n - 1.0) as u32;
    TileCoord {
        x: clamp(x),
        y: clamp(y),
        zoom,
    }
}

/// North-west corner of a tile.
fn tile_corner(x: u32, y: u32, zoom: u8) -> Coord<f64> {
    let n = f64::from(1u32 << zoom.min(MAX_ZOOM));
    let lng = f64::from(x) / n * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * f64::from(y) / n)).sinh().atan().to_degrees();
    Coord { x: lng, y: lat }
}

/// Geographic extent of a tile (`x = lng`, `y = lat`). A zoom past
/// [`MAX_ZOOM`] is read as [`MAX_ZOOM`].
#[must_use]
pub fn tile_bounds(tile: TileCoord) -> Rect<f64> {
    Rect::new(
        tile_corner(tile.x, tile.y, tile.zoom),
        tile_corner(tile.x.saturating_add(1), tile.y.saturating_add(1), tile.zoom),
    )
}

/// Tiles within the bounding box of `geometry` that it actually touches,
/// row by row from the north-west.
#[must_use]
pub fn tiles_covering(geometry: &Geometry<f64>, zoom: u8) -> Vec<TileCoord> {
    let Some(bbox) = geometry.bounding_rect() else {
        return Vec::new();
    };
    let north_west = tile_at(GeoPoint::new(bbox.max().y, bbox.min().x), zoom);
    let south_east = tile_at(GeoPoint::new(bbox.min().y, bbox.max().x), zoom);

    let mut tiles = Vec::new();
    for y in north_west.y..=south_east.y {
        for x in north_west.x..=south_east.x {
            let tile = TileCoord { x, y, zoom };
            if geometry.intersects(&tile_bounds(tile).to_polygon()) {
                tiles.push(tile);
            }
        }
    }
    tiles
}

/// Streams every panorama inside `geometry` listed by the coverage tiles
/// overlapping it.
///
/// Tiles are fetched one at a time. A tile that still fails after retries is
/// logged and skipped.
pub fn panos_in_geometry_via_tiles<'a, P: PanoramaProvider>(
    provider: &'a P,
    geometry: &'a Geometry<f64>,
    retry: RetryPolicy,
) -> impl Stream<Item = PanoramaRecord> + 'a {
    let tiles = tiles_covering(geometry, COVERAGE_ZOOM);
    tracing::debug!(tiles = tiles.len(), "fetching coverage tiles");

    stream::iter(tiles)
        .then(move |tile| async move {
            match retry_with_backoff(retry, || provider.get_tile_coverage(tile.x, tile.y)).await {
                Ok(panoramas) => panoramas,
                Err(err) => {
                    tracing::warn!(
                        tile_x = tile.x,
                        tile_y = tile.y,
                        error = %err,
                        "skipping coverage tile"
                    );
                    Vec::new()
                }
            }
        })
        .flat_map(stream::iter)
        .filter(move |panorama| {
            let inside = geometry.intersects(&Point::from(point_to_coord(panorama.position)));
            futures::future::ready(inside)
        })
}
