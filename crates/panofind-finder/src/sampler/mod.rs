//! Candidate point generation.
//!
//! Each [`SamplingStrategy`] has one function per geometry kind, picked by a
//! single `match` in `Sampler::sample`. Kinds a strategy does not specialise
//! fall back to shared behaviour: a `MultiPolygon` is sampled as one area, a
//! `MultiLineString` concatenates its lines, and a `MultiPoint` yields its
//! points as-is.

mod lattice;
mod projection;
mod random;
mod vertices;

use std::sync::{Mutex, PoisonError};

use geo::{Coord, Geometry, MultiPolygon};
use panofind_core::{FinderConfig, GeoPoint};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::FinderError;
use crate::geometry::{coord_to_point, geometry_kind, validate_geometry};

/// How candidate points are derived from a geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplingStrategy {
    /// A regular grid over areas and evenly spaced points along lines.
    Lattice { spacing_m: f64 },
    /// `count` uniformly random points per area or line.
    Random { count: usize },
    /// The geometry's own distinct vertices, nothing synthesised.
    Vertices,
}

impl SamplingStrategy {
    /// A lattice spaced at the configured search radius, so neighbouring
    /// lookups just touch.
    #[must_use]
    pub fn lattice_for(config: &FinderConfig) -> Self {
        Self::Lattice {
            spacing_m: f64::from(config.search_radius_m),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Lattice { .. } => "lattice",
            Self::Random { .. } => "random",
            Self::Vertices => "vertices",
        }
    }
}

/// A [`SamplingStrategy`] plus the random source it draws from.
#[derive(Debug)]
pub struct Sampler {
    strategy: SamplingStrategy,
    rng: Mutex<StdRng>,
}

impl Sampler {
    /// Random draws are seeded from the operating system.
    #[must_use]
    pub fn new(strategy: SamplingStrategy) -> Self {
        Self {
            strategy,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Same geometry and seed give the same random points.
    #[must_use]
    pub fn seeded(strategy: SamplingStrategy, seed: u64) -> Self {
        Self {
            strategy,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    #[must_use]
    pub fn strategy(&self) -> SamplingStrategy {
        self.strategy
    }

    /// Candidate points for `geometry`.
    ///
    /// A `Point` is returned unchanged and a `GeometryCollection` is sampled
    /// part by part; parts the strategy cannot handle are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::InvalidCoordinates`] if any vertex is not a
    /// finite WGS84 position, and [`FinderError::UnsupportedGeometry`] for
    /// `Line`, `Rect` and `Triangle` geometries.
    pub fn points_in(&self, geometry: &Geometry<f64>) -> Result<Vec<GeoPoint>, FinderError> {
        let count = match self.strategy {
            SamplingStrategy::Random { count } => count,
            _ => 0,
        };
        self.points_with_count(geometry, count)
    }

    /// Like [`Sampler::points_in`], but a random strategy draws `count`
    /// points instead of its configured count.
    ///
    /// # Errors
    ///
    /// See [`Sampler::points_in`].
    pub fn points_with_count(
        &self,
        geometry: &Geometry<f64>,
        count: usize,
    ) -> Result<Vec<GeoPoint>, FinderError> {
        // Sampling below assumes finite bounds.
        validate_geometry(geometry, geometry_kind(geometry))?;
        Ok(self
            .sample(geometry, count)?
            .into_iter()
            .map(coord_to_point)
            .collect())
    }

    fn sample(&self, geometry: &Geometry<f64>, count: usize) -> Result<Vec<Coord<f64>>, FinderError> {
        use SamplingStrategy::{Lattice, Random, Vertices};

        let points = match (self.strategy, geometry) {
            (_, Geometry::Point(point)) => vec![point.0],
            (_, Geometry::GeometryCollection(collection)) => {
                let mut points = Vec::new();
                for part in collection.iter() {
                    match self.sample(part, count) {
                        Ok(part_points) => points.extend(part_points),
                        Err(err) => tracing::warn!(error = %err, "skipping geometry part"),
                    }
                }
                points
            }

            (Vertices, Geometry::Polygon(g)) => vertices::unique_vertices(g),
            (Vertices, Geometry::MultiPolygon(g)) => vertices::unique_vertices(g),
            (Vertices, Geometry::LineString(g)) => vertices::unique_vertices(g),
            (Vertices, Geometry::MultiLineString(g)) => vertices::unique_vertices(g),
            (Vertices, Geometry::MultiPoint(g)) => vertices::unique_vertices(g),

            (_, Geometry::MultiPoint(points)) => points.iter().map(|p| p.0).collect(),

            (Lattice { spacing_m }, Geometry::Polygon(polygon)) => {
                lattice::points_in_area(&MultiPolygon::new(vec![polygon.clone()]), spacing_m)
            }
            (Lattice { spacing_m }, Geometry::MultiPolygon(area)) => {
                lattice::points_in_area(area, spacing_m)
            }
            (Lattice { spacing_m }, Geometry::LineString(line)) => {
                lattice::points_along_line(line, spacing_m)
            }
            (Lattice { spacing_m }, Geometry::MultiLineString(lines)) => lines
                .iter()
                .flat_map(|line| lattice::points_along_line(line, spacing_m))
                .collect(),

            (Random { .. }, Geometry::Polygon(polygon)) => random::points_in_area(
                &MultiPolygon::new(vec![polygon.clone()]),
                count,
                &mut *self.lock_rng(),
            ),
            (Random { .. }, Geometry::MultiPolygon(area)) => {
                random::points_in_area(area, count, &mut *self.lock_rng())
            }
            (Random { .. }, Geometry::LineString(line)) => {
                random::points_along_line(line, count, &mut *self.lock_rng())
            }
            (Random { .. }, Geometry::MultiLineString(lines)) => {
                let mut rng = self.lock_rng();
                lines
                    .iter()
                    .flat_map(|line| random::points_along_line(line, count, &mut *rng))
                    .collect()
            }

            (strategy, other @ (Geometry::Line(_) | Geometry::Rect(_) | Geometry::Triangle(_))) => {
                return Err(FinderError::UnsupportedGeometry {
                    kind: geometry_kind(other),
                    strategy: strategy.name(),
                });
            }
        };
        Ok(points)
    }

    fn lock_rng(&self) -> std::sync::MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
