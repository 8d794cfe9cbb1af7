pub mod client;
pub mod error;
pub mod normalize;
pub mod provider;
pub mod types;

pub use client::ImageryClient;
pub use error::ImageryError;
pub use normalize::{normalize_panorama, parse_year_month, Fetched};
pub use provider::PanoramaProvider;
