//! Locally flat metric projection for sampling.
//!
//! An equirectangular projection centred on the geometry: metres east and
//! north of the centre. The map is affine, so point-in-polygon tests give the
//! same answer before and after projecting.

use geo::Coord;

const EARTH_RADIUS_M: f64 = 6_371_008.8;

#[derive(Debug, Clone, Copy)]
pub(crate) struct LocalProjection {
    lng0: f64,
    lat0: f64,
    cos_lat0: f64,
}

impl LocalProjection {
    /// `centre` is in degrees, `x = lng`, `y = lat`.
    pub(crate) fn centred_on(centre: Coord<f64>) -> Self {
        // Keep the x scale away from zero at the poles.
        let cos_lat0 = centre.y.to_radians().cos().max(1e-6);
        Self {
            lng0: centre.x,
            lat0: centre.y,
            cos_lat0,
        }
    }

    pub(crate) fn forward(&self, c: Coord<f64>) -> Coord<f64> {
        Coord {
            x: EARTH_RADIUS_M * (c.x - self.lng0).to_radians() * self.cos_lat0,
            y: EARTH_RADIUS_M * (c.y - self.lat0).to_radians(),
        }
    }

    pub(crate) fn inverse(&self, c: Coord<f64>) -> Coord<f64> {
        Coord {
            x: self.lng0 + (c.x / (EARTH_RADIUS_M * self.cos_lat0)).to_degrees(),
            y: self.lat0 + (c.y / EARTH_RADIUS_M).to_degrees(),
        }
    }

    /// Degrees of latitude spanning `metres`.
    pub(crate) fn lat_degrees(metres: f64) -> f64 {
        (metres / EARTH_RADIUS_M).to_degrees()
    }

    /// Degrees of longitude spanning `metres` at `lat` degrees.
    pub(crate) fn lng_degrees(metres: f64, lat: f64) -> f64 {
        (metres / (EARTH_RADIUS_M * lat.to_radians().cos().max(1e-6))).to_degrees()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_then_inverse_is_identity() {
        let proj = LocalProjection::centred_on(Coord { x: 18.07, y: 59.33 });
        let c = Coord { x: 18.08, y: 59.34 };
        let back = proj.inverse(proj.forward(c));
        assert!((back.x - c.x).abs() < 1e-12);
        assert!((back.y - c.y).abs() < 1e-12);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let proj = LocalProjection::centred_on(Coord { x: 0.0, y: 0.0 });
        let p = proj.forward(Coord { x: 0.0, y: 1.0 });
        assert!((p.y - 111_195.0).abs() < 10.0, "got {}", p.y);
    }

    #[test]
    fn longitude_shrinks_with_latitude() {
        let proj = LocalProjection::centred_on(Coord { x: 0.0, y: 60.0 });
        let p = proj.forward(Coord { x: 1.0, y: 60.0 });
        assert!((p.x - 55_597.0).abs() < 10.0, "got {}", p.x);
    }
}
