//! Imagery lookup service response types.
//!
//! Every response is a `{"status": "...", ...}` envelope. `"OK"` carries a
//! `panorama` object (single lookups) or a `panoramas` array (tile coverage),
//! `"ZERO_RESULTS"` means nothing was found, and `"ERROR"` carries a
//! `message`.

use panofind_core::{ImageSize, Place, StreetName};
use serde::Deserialize;

pub const STATUS_OK: &str = "OK";
pub const STATUS_ZERO_RESULTS: &str = "ZERO_RESULTS";
pub const STATUS_ERROR: &str = "ERROR";

#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub panorama: Option<WirePanorama>,
    #[serde(default)]
    pub panoramas: Vec<WirePanorama>,
}

/// A panorama as sent by the lookup service.
///
/// Only `id`, `lat` and `lng` are always present. Tile coverage responses
/// stop there; search responses add the extended fields; fetches by id add
/// `places` and, when requested, `depth`.
#[derive(Debug, Deserialize)]
pub struct WirePanorama {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    /// Degrees clockwise from north.
    #[serde(default)]
    pub heading: f64,
    #[serde(default)]
    pub pitch: f64,
    #[serde(default)]
    pub country_code: Option<String>,
    /// Capture month as `"YYYY-MM"`.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub is_third_party: bool,
    #[serde(default)]
    pub image_sizes: Vec<ImageSize>,
    #[serde(default)]
    pub street_names: Vec<StreetName>,
    #[serde(default)]
    pub places: Vec<Place>,
    #[serde(default)]
    pub links: Option<Vec<WireLink>>,
    /// Kept raw so a broken depth payload does not fail the whole record.
    #[serde(default)]
    pub depth: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct WireLink {
    pub id: String,
    #[serde(default)]
    pub direction: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct WireDepth {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}
