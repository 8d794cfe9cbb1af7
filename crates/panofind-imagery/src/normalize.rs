//! Conversion of wire panoramas into [`PanoramaRecord`]s.

use chrono::NaiveDate;
use panofind_core::{DepthMap, GeoPoint, PanoramaRecord};

use crate::error::ImageryError;
use crate::types::{WireDepth, WirePanorama};

/// Which parts of a record the originating call returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fetched {
    pub extended: bool,
    pub places: bool,
    pub depth: bool,
}

impl Fetched {
    /// Nearest-panorama search: extended fields, no places.
    pub const SEARCH: Fetched = Fetched {
        extended: true,
        places: false,
        depth: false,
    };

    /// Tile coverage: position and heading only.
    pub const TILE: Fetched = Fetched {
        extended: false,
        places: false,
        depth: false,
    };

    /// Fetch by id: everything, depth only when asked for.
    #[must_use]
    pub const fn by_id(want_depth: bool) -> Fetched {
        Fetched {
            extended: true,
            places: true,
            depth: want_depth,
        }
    }
}

/// Parses a `"YYYY-MM"` capture month into the first day of that month.
///
/// Returns `None` if the string does not match the expected format.
#[must_use]
pub fn parse_year_month(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d").ok()
}

fn parse_depth(pano_id: &str, raw: serde_json::Value) -> Result<DepthMap, ImageryError> {
    let wire: WireDepth =
        serde_json::from_value(raw).map_err(|e| ImageryError::MalformedDepth {
            pano_id: pano_id.to_owned(),
            reason: e.to_string(),
        })?;
    let depth = DepthMap {
        width: wire.width,
        height: wire.height,
        data: wire.data,
    };
    depth
        .validate()
        .map_err(|reason| ImageryError::MalformedDepth {
            pano_id: pano_id.to_owned(),
            reason,
        })?;
    Ok(depth)
}

/// Converts a [`WirePanorama`] into a [`PanoramaRecord`].
///
/// # Errors
///
/// Returns [`ImageryError::MalformedDepth`] when depth was requested and the
/// payload is missing, undecodable, or does not match its dimensions.
pub fn normalize_panorama(
    wire: WirePanorama,
    fetched: Fetched,
) -> Result<PanoramaRecord, ImageryError> {
    let depth = if fetched.depth {
        match wire.depth {
            Some(raw) => Some(parse_depth(&wire.id, raw)?),
            None => {
                return Err(ImageryError::MalformedDepth {
                    pano_id: wire.id,
                    reason: "depth requested but not returned".to_owned(),
                })
            }
        }
    } else {
        None
    };

    let link_count = wire
        .links
        .as_ref()
        .map(|links| u32::try_from(links.len()).unwrap_or(u32::MAX));

    Ok(PanoramaRecord {
        position: GeoPoint::new(wire.lat, wire.lng),
        heading: wire.heading,
        pitch: wire.pitch,
        country_code: wire.country_code,
        date: wire.date.as_deref().and_then(parse_year_month),
        source: wire.source,
        is_third_party: wire.is_third_party,
        image_sizes: wire.image_sizes,
        street_names: wire.street_names,
        places: if fetched.places { wire.places } else { Vec::new() },
        link_count,
        depth,
        has_extended_info: fetched.extended,
        has_places: fetched.places,
        has_depth: fetched.depth,
        id: wire.id,
    })
}
