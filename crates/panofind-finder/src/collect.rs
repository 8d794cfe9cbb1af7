//! Runs a sequence of named geometries through a [`Finder`] and turns the
//! accepted panoramas into map coordinates.

use geo::Geometry;
use panofind_core::{pano_to_coordinate, Coordinate, Extra, PanningMode};
use panofind_imagery::PanoramaProvider;

use crate::error::FinderError;
use crate::finder::Finder;
use crate::geometry::validate_geometry;

/// One geometry to search, with an optional display name and attributes
/// copied onto every location found in it.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSource {
    geometry: Geometry<f64>,
    name: Option<String>,
    extra: Extra,
}

impl LocationSource {
    /// # Errors
    ///
    /// Returns [`FinderError::InvalidCoordinates`] if any vertex is not a
    /// finite WGS84 position.
    pub fn new(
        geometry: Geometry<f64>,
        name: Option<String>,
        extra: Extra,
    ) -> Result<Self, FinderError> {
        validate_geometry(&geometry, name.as_deref().unwrap_or("geometry"))?;
        Ok(Self {
            geometry,
            name,
            extra,
        })
    }

    #[must_use]
    pub fn geometry(&self) -> &Geometry<f64> {
        &self.geometry
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn extra(&self) -> &Extra {
        &self.extra
    }
}

/// Searches each source in turn and returns the locations found, source by
/// source.
///
/// Within a source each panorama appears once. With `panning` unset, direct
/// point lookups face the original point and sampled geometries keep the
/// panorama heading. `snap_to_original_point` reports the candidate point a
/// panorama was found from instead of the panorama position.
pub async fn collect_locations<P, I>(
    finder: &Finder<P>,
    sources: I,
    panning: Option<PanningMode>,
    snap_to_original_point: bool,
) -> Vec<Coordinate>
where
    P: PanoramaProvider,
    I: IntoIterator<Item = LocationSource>,
{
    let mut coordinates = Vec::new();
    for source in sources {
        let label = source.name().unwrap_or("geometry");
        let mode = panning.unwrap_or(match source.geometry {
            Geometry::Point(_) => PanningMode::OriginalPoint,
            _ => PanningMode::Default,
        });

        let found = finder.search_all(&source.geometry, source.name()).await;
        let before = coordinates.len();
        for accepted in found {
            match pano_to_coordinate(
                &accepted.panorama,
                Some(accepted.origin),
                source.extra.clone(),
                Some(mode),
                snap_to_original_point,
            ) {
                Ok(coordinate) => coordinates.push(coordinate),
                Err(err) => tracing::warn!(
                    name = label,
                    pano_id = %accepted.panorama.id,
                    error = %err,
                    "could not build coordinate"
                ),
            }
        }
        tracing::info!(
            name = label,
            locations = coordinates.len() - before,
            "collected locations"
        );
    }
    coordinates
}
