//! Price prediction: label encoders, a seeded random forest, and the service
//! that trains, persists and reloads the resulting artifact.

pub mod artifact;
pub mod encoder;
pub mod forest;
pub mod metrics;
pub mod service;

pub use artifact::{FEATURE_COLUMNS, ModelArtifact, PriceQuery};
pub use service::{ArtifactOrigin, PriceModelService, predict, similar_price};
