//! Helpers for the `geo` geometry types the finder consumes.

use geo::{Coord, CoordsIter, Geometry};
use panofind_core::GeoPoint;

use crate::error::FinderError;

/// `geo` stores `x = longitude`, `y = latitude`.
#[must_use]
pub fn coord_to_point(c: Coord<f64>) -> GeoPoint {
    GeoPoint::new(c.y, c.x)
}

#[must_use]
pub fn point_to_coord(p: GeoPoint) -> Coord<f64> {
    Coord { x: p.lng, y: p.lat }
}

#[must_use]
pub fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

/// Checks every vertex is a finite WGS84 position.
///
/// # Errors
///
/// Returns [`FinderError::InvalidCoordinates`] for the first offending vertex.
pub fn validate_geometry(geometry: &Geometry<f64>, context: &str) -> Result<(), FinderError> {
    match geometry
        .coords_iter()
        .map(coord_to_point)
        .find(|p| !p.is_valid())
    {
        Some(bad) => Err(FinderError::InvalidCoordinates {
            context: context.to_owned(),
            lat: bad.lat,
            lng: bad.lng,
        }),
        None => Ok(()),
    }
}
