pub mod app_config;
pub mod config;
pub mod coordinate;
pub mod geo_point;
pub mod options;
pub mod panorama;
pub mod places;
pub mod telemetry;

use thiserror::Error;

pub use app_config::FinderConfig;
pub use config::{load_finder_config, load_finder_config_from_env};
pub use coordinate::{
    pano_to_coordinate, resolve_heading, Coordinate, CoordinateError, CoordinateMap, Extra,
    PanningMode, Scalar,
};
pub use geo_point::GeoPoint;
pub use options::{LocationOptions, PredicateOption};
pub use panorama::{
    CoverageClass, CoverageTier, DepthMap, ImageGeneration, ImageSize, MetadataLevel,
    PanoramaRecord, Place, StreetName,
};
pub use telemetry::init_tracing;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
