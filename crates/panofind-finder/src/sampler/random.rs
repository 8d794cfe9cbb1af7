//! Uniformly random sample points.

use geo::{BoundingRect, Contains, Coord, LineString, MultiPolygon, Point};
use rand::Rng;

use super::projection::LocalProjection;

/// Rejection sampling gives up after this many draws per requested point.
const MAX_DRAWS_PER_POINT: usize = 1_000;

/// Up to `count` points drawn uniformly from the bounding box of `area`,
/// keeping only those inside it (holes excluded).
///
/// Fewer than `count` points come back only when the area is so thin relative
/// to its bounding box that the draw budget runs out.
pub(crate) fn points_in_area<R: Rng>(
    area: &MultiPolygon<f64>,
    count: usize,
    rng: &mut R,
) -> Vec<Coord<f64>> {
    let Some(bbox) = area.bounding_rect() else {
        return Vec::new();
    };
    let (min, max) = (bbox.min(), bbox.max());
    let budget = count.saturating_mul(MAX_DRAWS_PER_POINT);

    let mut points = Vec::with_capacity(count);
    let mut draws = 0usize;
    while points.len() < count && draws < budget {
        draws += 1;
        let candidate = Coord {
            x: rng.random_range(min.x..=max.x),
            y: rng.random_range(min.y..=max.y),
        };
        if area.contains(&Point::from(candidate)) {
            points.push(candidate);
        }
    }
    if points.len() < count {
        tracing::warn!(
            requested = count,
            sampled = points.len(),
            draws,
            "random sampling ran out of draws, area is degenerate"
        );
    }
    points
}

/// `count` points at uniformly random distances along `line`.
pub(crate) fn points_along_line<R: Rng>(
    line: &LineString<f64>,
    count: usize,
    rng: &mut R,
) -> Vec<Coord<f64>> {
    let Some(bbox) = line.bounding_rect() else {
        return Vec::new();
    };
    let proj = LocalProjection::centred_on(bbox.center());
    let projected: Vec<Coord<f64>> = line.0.iter().map(|&c| proj.forward(c)).collect();

    // cumulative[i] is the distance from the start to vertex i.
    let mut cumulative = Vec::with_capacity(projected.len());
    let mut total = 0.0;
    cumulative.push(0.0);
    for segment in projected.windows(2) {
        total += (segment[1].x - segment[0].x).hypot(segment[1].y - segment[0].y);
        cumulative.push(total);
    }
    if projected.len() == 1 || total <= 0.0 {
        return line.0.first().copied().into_iter().collect();
    }

    (0..count)
        .map(|_| {
            let distance = rng.random_range(0.0..=total);
            let end = cumulative
                .partition_point(|&d| d < distance)
                .clamp(1, projected.len() - 1);
            let (a, b) = (projected[end - 1], projected[end]);
            let length = cumulative[end] - cumulative[end - 1];
            let t = if length > 0.0 {
                (distance - cumulative[end - 1]) / length
            } else {
                0.0
            };
            proj.inverse(Coord {
                x: a.x + t * (b.x - a.x),
                y: a.y + t * (b.y - a.y),
            })
        })
        .collect()
}
