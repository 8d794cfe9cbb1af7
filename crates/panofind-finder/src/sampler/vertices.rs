use std::collections::HashSet;

use geo::{Coord, CoordsIter};

/// Distinct vertices of `geometry`, in first-seen order.
pub(crate) fn unique_vertices<G>(geometry: &G) -> Vec<Coord<f64>>
where
    G: CoordsIter<Scalar = f64>,
{
    let mut seen = HashSet::new();
    geometry
        .coords_iter()
        // `+ 0.0` folds -0.0 into 0.0 so both hash alike.
        .filter(|c| seen.insert(((c.x + 0.0).to_bits(), (c.y + 0.0).to_bits())))
        .collect()
}
