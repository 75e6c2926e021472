use std::path::Path;
use std::sync::Arc;

use super::features::PricingFeatures;
use super::model::{LinearPriceModel, PriceModel};
use crate::error::{InsightsError, Result};

/// Front door to the price model.
///
/// The model is loaded once. If that fails the gateway stays disabled and
/// every call answers [`InsightsError::ModelUnavailable`]; there is no reload.
#[derive(Clone)]
pub struct PredictionGateway {
    model: std::result::Result<Arc<dyn PriceModel>, String>,
}

impl PredictionGateway {
    /// Load the model artifact at `path`.
    pub fn load(path: &Path) -> Self {
        match LinearPriceModel::load(path) {
            Ok(model) => {
                log::info!("Loaded {} from {}", model.describe(), path.display());
                Self::from_model(Arc::new(model))
            }
            Err(e) => {
                log::error!("Error loading model: {e:#}. Prediction feature is disabled.");
                Self::unavailable(format!("{e:#}"))
            }
        }
    }

    pub fn from_model(model: Arc<dyn PriceModel>) -> Self {
        PredictionGateway { model: Ok(model) }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        PredictionGateway {
            model: Err(reason.into()),
        }
    }

    pub fn is_available(&self) -> bool {
        self.model.is_ok()
    }

    /// Why prediction is disabled, if it is.
    pub fn unavailable_reason(&self) -> Option<&str> {
        self.model.as_ref().err().map(String::as_str)
    }

    pub fn describe(&self) -> String {
        match &self.model {
            Ok(model) => model.describe(),
            Err(_) => "unavailable".to_string(),
        }
    }

    /// Score one vehicle. The result is finite and non-negative.
    pub fn predict(&self, features: &PricingFeatures) -> Result<f64> {
        let model = self
            .model
            .as_ref()
            .map_err(|reason| InsightsError::ModelUnavailable(reason.clone()))?;

        let price = model
            .predict(features)
            .map_err(|e| InsightsError::PredictionFailed(format!("{e:#}")))?;

        if !price.is_finite() || price < 0.0 {
            return Err(InsightsError::PredictionFailed(format!(
                "model returned an invalid price: {price}"
            )));
        }
        log::debug!("Predicted {price:.2} for {features:?}");
        Ok(price)
    }
}

impl std::fmt::Debug for PredictionGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionGateway")
            .field("model", &self.describe())
            .finish()
    }
}
