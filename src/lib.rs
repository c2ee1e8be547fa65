//! Hardware price dashboard core: dataset loading and aggregation, a
//! random-forest price model, brand headquarters lookup and a hardware
//! chat assistant. The egui front end lives in the `rigscope` binary.

pub mod chat;
pub mod config;
pub mod data;
pub mod error;
pub mod geo;
pub mod pricing;
pub mod rng;
pub mod session;

pub use config::AppConfig;
pub use session::Session;
