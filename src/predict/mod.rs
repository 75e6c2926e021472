//! Rental price prediction: feature schema, model artifact and gateway.

pub mod features;
pub mod gateway;
pub mod model;

pub use features::PricingFeatures;
pub use gateway::PredictionGateway;
pub use model::{LinearPriceModel, PriceModel, UnknownCategory};
