use panofind_imagery::ImageryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FinderError {
    #[error("invalid coordinates in {context}: ({lat}, {lng})")]
    InvalidCoordinates { context: String, lat: f64, lng: f64 },

    #[error("{kind} geometry is not supported by the {strategy} strategy")]
    UnsupportedGeometry {
        kind: &'static str,
        strategy: &'static str,
    },

    #[error(transparent)]
    Imagery(#[from] ImageryError),
}
