//! Map-ready location records built from accepted panoramas.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo_point::GeoPoint;
use crate::panorama::PanoramaRecord;

/// A scalar attribute carried through from the geometry source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_owned())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Text(v)
    }
}

/// Per-geometry attributes, ordered by key.
pub type Extra = BTreeMap<String, Scalar>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoordinateError {
    #[error("{0} requires the original point")]
    MissingOriginalPoint(&'static str),
}

/// How the initial camera heading of a location is chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanningMode {
    /// The panorama's own heading, usually along the road.
    Default,
    /// The panorama's heading turned 90° clockwise, facing the roadside.
    Skewed,
    /// Towards the point the panorama was found from.
    OriginalPoint,
    /// Uniformly random.
    Random,
    /// A fixed heading in degrees.
    Fixed(f64),
}

/// One entry in a map's `customCoordinates` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pano_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: Extra,
}

/// A coordinates-mode map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinateMap {
    pub mode: String,
    pub custom_coordinates: Vec<Coordinate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CoordinateMap {
    #[must_use]
    pub fn new(coordinates: Vec<Coordinate>, name: Option<String>) -> Self {
        Self {
            mode: "coordinates".to_owned(),
            custom_coordinates: coordinates,
            name,
            description: None,
        }
    }
}

/// Resolves a panning mode to a heading in degrees.
///
/// # Errors
///
/// Returns [`CoordinateError::MissingOriginalPoint`] for
/// [`PanningMode::OriginalPoint`] without an `origin`.
pub fn resolve_heading(
    panorama: &PanoramaRecord,
    mode: PanningMode,
    origin: Option<GeoPoint>,
) -> Result<f64, CoordinateError> {
    match mode {
        PanningMode::Default => Ok(panorama.heading),
        PanningMode::Skewed => Ok((panorama.heading + 90.0).rem_euclid(360.0)),
        PanningMode::OriginalPoint => origin
            .map(|o| panorama.position.bearing_to(&o))
            .ok_or(CoordinateError::MissingOriginalPoint("OriginalPoint panning")),
        PanningMode::Random => Ok(rand::rng().random_range(0.0..360.0)),
        PanningMode::Fixed(deg) => Ok(deg),
    }
}

/// Builds a [`Coordinate`] from a panorama.
///
/// With `panning` unset, pans towards `origin` when one is given and keeps the
/// panorama heading otherwise. `snap_to_original_point` reports `origin` as the
/// location while still loading the panorama found.
///
/// # Errors
///
/// Returns [`CoordinateError::MissingOriginalPoint`] when the chosen panning
/// or snapping needs `origin` and it is `None`.
pub fn pano_to_coordinate(
    panorama: &PanoramaRecord,
    origin: Option<GeoPoint>,
    extra: Extra,
    panning: Option<PanningMode>,
    snap_to_original_point: bool,
) -> Result<Coordinate, CoordinateError> {
    let mode = panning.unwrap_or(if origin.is_some() {
        PanningMode::OriginalPoint
    } else {
        PanningMode::Default
    });
    let heading = resolve_heading(panorama, mode, origin)?;

    let position = if snap_to_original_point {
        origin.ok_or(CoordinateError::MissingOriginalPoint("snap_to_original_point"))?
    } else {
        panorama.position
    };

    Ok(Coordinate {
        lat: position.lat,
        lng: position.lng,
        pano_id: Some(panorama.id.clone()),
        heading: Some(heading),
        pitch: Some(panorama.pitch),
        zoom: None,
        country_code: panorama.country_code.clone(),
        extra,
    })
}
