//! Panorama records returned by the imagery provider.
//!
//! A [`PanoramaRecord`] may be partial: search responses omit nearby places
//! and tile coverage responses omit everything but position and heading. The
//! `has_*` flags record which parts were requested so callers know when a
//! fuller fetch is needed.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::geo_point::GeoPoint;
use crate::places::is_non_building_place_type;

/// Capture sources for imagery taken by non-vehicle rigs.
pub const TREKKER_SOURCES: &[&str] = &["scout", "innerspace", "cultural_institute"];

/// Which coverage tier a lookup searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoverageTier {
    Official,
    Unofficial,
}

impl std::fmt::Display for CoverageTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoverageTier::Official => write!(f, "official"),
            CoverageTier::Unofficial => write!(f, "unofficial"),
        }
    }
}

/// Coverage class of a single panorama.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageClass {
    /// Official car coverage.
    Official,
    /// Official coverage from a backpack, boat or institutional rig.
    Trekker,
    /// Third-party contributed imagery.
    Unofficial,
}

/// Camera generation inferred from the maximum image resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageGeneration {
    Gen1,
    /// Generations 2 and 3 share a resolution and cannot be told apart.
    Gen2Or3,
    Gen4,
}

impl ImageGeneration {
    /// Maps a full-resolution image size to a generation, if it is a known one.
    #[must_use]
    pub fn from_size(size: ImageSize) -> Option<Self> {
        match (size.width, size.height) {
            (3328, 1664) => Some(Self::Gen1),
            (13312, 6656) => Some(Self::Gen2Or3),
            (16384, 8192) => Some(Self::Gen4),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    #[must_use]
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// A street label on a panorama, with the headings it connects towards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreetName {
    pub name: String,
    #[serde(default)]
    pub angles: Vec<f64>,
}

/// A nearby place reported for a panorama.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub place_type: String,
}

/// Dense depth payload: one value per pixel in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthMap {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

impl DepthMap {
    /// Checks that the payload length matches the declared dimensions.
    ///
    /// # Errors
    ///
    /// Returns a description of the mismatch.
    pub fn validate(&self) -> Result<(), String> {
        let expected = u64::from(self.width) * u64::from(self.height);
        if expected == 0 {
            return Err(format!("empty depth map ({}x{})", self.width, self.height));
        }
        if self.data.len() as u64 != expected {
            return Err(format!(
                "depth map declares {}x{} but carries {} values",
                self.width,
                self.height,
                self.data.len()
            ));
        }
        Ok(())
    }
}

/// Which part of a record a check depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataLevel {
    /// Source tag, image sizes, street names and links.
    Extended,
    /// Nearby places, only returned by a fetch by id.
    Places,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanoramaRecord {
    pub id: String,
    pub position: GeoPoint,
    /// Degrees clockwise from north.
    pub heading: f64,
    pub pitch: f64,
    pub country_code: Option<String>,
    pub date: Option<NaiveDate>,
    /// Capture source tag, e.g. `"launch"` or `"scout"`.
    pub source: Option<String>,
    pub is_third_party: bool,
    /// Available image sizes, smallest first.
    pub image_sizes: Vec<ImageSize>,
    pub street_names: Vec<StreetName>,
    pub places: Vec<Place>,
    pub link_count: Option<u32>,
    pub depth: Option<DepthMap>,
    pub has_extended_info: bool,
    pub has_places: bool,
    pub has_depth: bool,
}

impl PanoramaRecord {
    /// A record with only the basic location fields filled in.
    #[must_use]
    pub fn basic(id: impl Into<String>, position: GeoPoint, heading: f64) -> Self {
        Self {
            id: id.into(),
            position,
            heading,
            pitch: 0.0,
            country_code: None,
            date: None,
            source: None,
            is_third_party: false,
            image_sizes: Vec::new(),
            street_names: Vec::new(),
            places: Vec::new(),
            link_count: None,
            depth: None,
            has_extended_info: false,
            has_places: false,
            has_depth: false,
        }
    }

    #[must_use]
    pub fn has_metadata(&self, level: MetadataLevel) -> bool {
        match level {
            MetadataLevel::Extended => self.has_extended_info,
            MetadataLevel::Places => self.has_places,
        }
    }

    #[must_use]
    pub fn coverage_class(&self) -> CoverageClass {
        if self.is_third_party {
            CoverageClass::Unofficial
        } else if self.is_trekker() {
            CoverageClass::Trekker
        } else {
            CoverageClass::Official
        }
    }

    #[must_use]
    pub fn is_trekker(&self) -> bool {
        self.source
            .as_deref()
            .is_some_and(|s| TREKKER_SOURCES.contains(&s))
    }

    /// Returns `true` if the panorama appears to sit on a junction.
    ///
    /// Two street labels mean two roads meet. A single label with more than
    /// two angles is a junction of roads sharing a name. Road curves where the
    /// name changes can produce false positives.
    #[must_use]
    pub fn is_intersection(&self) -> bool {
        match self.street_names.as_slice() {
            [] => false,
            [only] => only.angles.len() > 2,
            _ => true,
        }
    }

    /// Returns `true` for a dead end of coverage: exactly one neighbour.
    #[must_use]
    pub fn is_terminus(&self) -> bool {
        self.link_count == Some(1)
    }

    /// `None` when there is no place data to decide from.
    #[must_use]
    pub fn has_building(&self) -> Option<bool> {
        if self.places.is_empty() {
            return None;
        }
        Some(
            self.places
                .iter()
                .any(|place| !is_non_building_place_type(&place.place_type)),
        )
    }

    #[must_use]
    pub fn max_image_size(&self) -> Option<ImageSize> {
        self.image_sizes.iter().copied().max_by_key(ImageSize::area)
    }

    /// Third-party imagery and unrecognised resolutions yield `None`.
    #[must_use]
    pub fn generation(&self) -> Option<ImageGeneration> {
        if self.is_third_party {
            return None;
        }
        self.max_image_size().and_then(ImageGeneration::from_size)
    }
}
