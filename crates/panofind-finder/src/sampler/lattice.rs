//! Evenly spaced sample points.

use geo::{BoundingRect, Contains, Coord, InteriorPoint, MapCoords, MultiPolygon, Point};
use geo::{LineString, Rect};

use super::projection::LocalProjection;

/// Grid points inside `area`, `spacing_m` apart, holes excluded.
///
/// The grid is aligned on cell centres: the first column sits half a cell in
/// from the western edge of the bounding box, so a square of side `k *
/// spacing_m` yields `k²` points. When no grid point lands inside (the area is
/// smaller than a cell), a single interior point is returned instead.
pub(crate) fn points_in_area(area: &MultiPolygon<f64>, spacing_m: f64) -> Vec<Coord<f64>> {
    let Some(bbox) = area.bounding_rect() else {
        return Vec::new();
    };
    let mut points = if spacing_m > 0.0 && spacing_m.is_finite() {
        grid_points(area, bbox, spacing_m)
    } else {
        Vec::new()
    };
    if points.is_empty() {
        tracing::info!(spacing_m, "no lattice points inside area, using an interior point");
        points.extend(area.interior_point().map(|p| p.0));
    }
    points
}

fn grid_points(area: &MultiPolygon<f64>, bbox: Rect<f64>, spacing_m: f64) -> Vec<Coord<f64>> {
    let proj = LocalProjection::centred_on(bbox.center());
    let projected = area.map_coords(|c| proj.forward(c));
    let Some(extent) = projected.bounding_rect() else {
        return Vec::new();
    };

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let cols = (extent.width() / spacing_m).ceil() as usize;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let rows = (extent.height() / spacing_m).ceil() as usize;

    let mut points = Vec::new();
    for row in 0..rows {
        #[allow(clippy::cast_precision_loss)]
        let y = extent.min().y + (row as f64 + 0.5) * spacing_m;
        for col in 0..cols {
            #[allow(clippy::cast_precision_loss)]
            let x = extent.min().x + (col as f64 + 0.5) * spacing_m;
            if projected.contains(&Point::new(x, y)) {
                points.push(proj.inverse(Coord { x, y }));
            }
        }
    }
    points
}

/// Points every `spacing_m` metres along `line`, starting at its first vertex.
pub(crate) fn points_along_line(line: &LineString<f64>, spacing_m: f64) -> Vec<Coord<f64>> {
    let Some(bbox) = line.bounding_rect() else {
        return Vec::new();
    };
    if !(spacing_m > 0.0 && spacing_m.is_finite()) {
        return line.0.first().copied().into_iter().collect();
    }
    let proj = LocalProjection::centred_on(bbox.center());
    let projected: Vec<Coord<f64>> = line.0.iter().map(|&c| proj.forward(c)).collect();
    if projected.len() == 1 {
        return vec![line.0[0]];
    }

    let mut points = Vec::new();
    let mut walked = 0.0;
    let mut next = 0.0;
    for segment in projected.windows(2) {
        let (a, b) = (segment[0], segment[1]);
        let length = (b.x - a.x).hypot(b.y - a.y);
        while next <= walked + length {
            let t = if length > 0.0 {
                (next - walked) / length
            } else {
                0.0
            };
            points.push(proj.inverse(Coord {
                x: a.x + t * (b.x - a.x),
                y: a.y + t * (b.y - a.y),
            }));
            next += spacing_m;
        }
        walked += length;
    }
    points
}

#[cfg(test)]
mod tests {
    use geo::{Polygon, Within};

    use super::*;

    /// Axis-aligned square of `side_m` metres with its south-west corner at
    /// (`lat`, `lng`).
    fn square(lat: f64, lng: f64, side_m: f64) -> Polygon<f64> {
        let dlat = LocalProjection::lat_degrees(side_m);
        let dlng = LocalProjection::lng_degrees(side_m, lat + dlat / 2.0);
        Polygon::new(
            LineString::from(vec![
                (lng, lat),
                (lng + dlng, lat),
                (lng + dlng, lat + dlat),
                (lng, lat + dlat),
                (lng, lat),
            ]),
            vec![],
        )
    }

    #[test]
    fn square_of_200m_at_50m_spacing_gives_4_by_4() {
        let area = MultiPolygon::new(vec![square(0.0, 0.0, 200.0)]);
        let points = points_in_area(&area, 50.0);
        assert!(
            (15..=17).contains(&points.len()),
            "expected about 16 points, got {}",
            points.len()
        );
    }

    #[test]
    fn lattice_is_deterministic() {
        let area = MultiPolygon::new(vec![square(59.3, 18.0, 500.0)]);
        assert_eq!(points_in_area(&area, 40.0), points_in_area(&area, 40.0));
    }

    #[test]
    fn points_avoid_holes() {
        let outer = square(-33.9, 151.2, 400.0);
        let hole = square(-33.9 + LocalProjection::lat_degrees(100.0), 151.2 + 0.001, 150.0);
        let with_hole = Polygon::new(outer.exterior().clone(), vec![hole.exterior().clone()]);
        let area = MultiPolygon::new(vec![with_hole.clone()]);

        let points = points_in_area(&area, 25.0);
        assert!(!points.is_empty());
        for c in &points {
            let p = Point::from(*c);
            assert!(p.is_within(&with_hole), "{c:?} outside polygon or inside hole");
            assert!(!hole.contains(&p), "{c:?} inside hole");
        }
        let without_hole = points_in_area(&MultiPolygon::new(vec![outer]), 25.0);
        assert!(points.len() < without_hole.len());
    }

    #[test]
    fn tiny_area_falls_back_to_interior_point() {
        let area = MultiPolygon::new(vec![square(10.0, 10.0, 5.0)]);
        let points = points_in_area(&area, 50.0);
        assert_eq!(points.len(), 1);
        assert!(area.contains(&Point::from(points[0])));
    }

    #[test]
    fn empty_area_gives_nothing() {
        let area: MultiPolygon<f64> = MultiPolygon::new(vec![]);
        assert!(points_in_area(&area, 50.0).is_empty());
    }

    #[test]
    fn line_points_spaced_from_start() {
        let dlat = LocalProjection::lat_degrees(200.0);
        let line = LineString::from(vec![(5.0, 0.0), (5.0, dlat)]);
        let points = points_along_line(&line, 50.0);
        // 0, 50, 100, 150 and (within rounding) 200 metres
        assert!((4..=5).contains(&points.len()), "got {}", points.len());
        assert!((points[0].y - 0.0).abs() < 1e-12);
        assert!((points[1].y - LocalProjection::lat_degrees(50.0)).abs() < 1e-9);
    }

    #[test]
    fn line_spacing_carries_across_vertices() {
        let d = LocalProjection::lat_degrees(30.0);
        let line = LineString::from(vec![(0.0, 0.0), (0.0, d), (0.0, 2.0 * d)]);
        let points = points_along_line(&line, 40.0);
        assert_eq!(points.len(), 2);
        assert!((points[1].y - LocalProjection::lat_degrees(40.0)).abs() < 1e-9);
    }
}
