use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use super::features::PricingFeatures;

/// A pre-trained price estimator. Read-only once loaded.
pub trait PriceModel: Send + Sync {
    /// Estimated rental price per day.
    fn predict(&self, features: &PricingFeatures) -> Result<f64>;

    /// Short human-readable description for logs and `/health`.
    fn describe(&self) -> String;
}

/// Policy for categorical values missing from the fitted encoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownCategory {
    /// Fail the prediction.
    #[default]
    Error,
    /// Contribute nothing (all-zero one-hot row).
    Ignore,
}

/// Standardized numeric input: `coef * (x - mean) / scale`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericTerm {
    pub mean: f64,
    pub scale: f64,
    pub coef: f64,
}

/// Fitted linear pricing pipeline exported as JSON.
///
/// ```json
/// {
///   "intercept": 121.3,
///   "numeric": { "mileage": { "mean": 140962.8, "scale": 60196.7, "coef": -11.9 } },
///   "flags": { "has_gps": 8.4 },
///   "categorical": { "fuel": { "diesel": 0.0, "petrol": -3.1 } },
///   "unknown_category": "error"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearPriceModel {
    pub intercept: f64,
    #[serde(default)]
    pub numeric: BTreeMap<String, NumericTerm>,
    #[serde(default)]
    pub flags: BTreeMap<String, f64>,
    #[serde(default)]
    pub categorical: BTreeMap<String, BTreeMap<String, f64>>,
    #[serde(default)]
    pub unknown_category: UnknownCategory,
}

impl LinearPriceModel {
    /// Read and validate a model artifact.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read model artifact {}", path.display()))?;
        let model: LinearPriceModel = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse model artifact {}", path.display()))?;
        model.validate()?;
        Ok(model)
    }

    /// Every term must refer to a known feature and carry finite numbers.
    pub fn validate(&self) -> Result<()> {
        let known = PricingFeatures::default();
        if !self.intercept.is_finite() {
            bail!("intercept is not finite");
        }
        for (name, term) in &self.numeric {
            if known.numeric(name).is_none() {
                bail!("unknown numeric feature '{name}'");
            }
            if !(term.scale.is_finite() && term.scale > 0.0) {
                bail!("numeric feature '{name}' has invalid scale {}", term.scale);
            }
            if !(term.mean.is_finite() && term.coef.is_finite()) {
                bail!("numeric feature '{name}' has non-finite parameters");
            }
        }
        for (name, coef) in &self.flags {
            if known.flag(name).is_none() {
                bail!("unknown flag feature '{name}'");
            }
            if !coef.is_finite() {
                bail!("flag feature '{name}' has a non-finite coefficient");
            }
        }
        for (name, levels) in &self.categorical {
            if known.category(name).is_none() {
                bail!("unknown categorical feature '{name}'");
            }
            if let Some((level, _)) = levels.iter().find(|(_, c)| !c.is_finite()) {
                bail!("category '{name}={level}' has a non-finite coefficient");
            }
        }
        Ok(())
    }
}

impl PriceModel for LinearPriceModel {
    fn predict(&self, features: &PricingFeatures) -> Result<f64> {
        let mut price = self.intercept;

        for (name, term) in &self.numeric {
            let x = features
                .numeric(name)
                .with_context(|| format!("missing numeric feature '{name}'"))?;
            price += term.coef * (x - term.mean) / term.scale;
        }

        for (name, coef) in &self.flags {
            if features.flag(name) == Some(true) {
                price += coef;
            }
        }

        for (name, levels) in &self.categorical {
            let value = features
                .category(name)
                .with_context(|| format!("missing categorical feature '{name}'"))?;
            match (levels.get(value), self.unknown_category) {
                (Some(coef), _) => price += coef,
                (None, UnknownCategory::Ignore) => {}
                (None, UnknownCategory::Error) => {
                    bail!("Found unknown categories ['{value}'] in column '{name}' during transform")
                }
            }
        }

        Ok(price.max(0.0))
    }

    fn describe(&self) -> String {
        format!(
            "linear model ({} numeric, {} flags, {} categorical)",
            self.numeric.len(),
            self.flags.len(),
            self.categorical.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_model() -> LinearPriceModel {
        serde_json::from_value(serde_json::json!({
            "intercept": 120.0,
            "numeric": {
                "mileage": { "mean": 100000.0, "scale": 50000.0, "coef": -10.0 },
                "engine_power": { "mean": 135.0, "scale": 40.0, "coef": 15.0 }
            },
            "flags": { "has_gps": 5.0, "winter_tires": -1.0 },
            "categorical": {
                "fuel": { "diesel": 0.0, "petrol": -2.0 },
                "model_key": { "Peugeot": 0.0, "BMW": 25.0 }
            }
        }))
        .unwrap()
    }

    #[test]
    fn scores_a_known_combination() {
        let model = sample_model();
        let features = PricingFeatures {
            model_key: "BMW".into(),
            mileage: 150_000.0,
            engine_power: 175.0,
            ..PricingFeatures::default()
        };
        // 120 - 10 + 15 + 5 (gps) - 1 (winter) + 0 (diesel) + 25 (BMW)
        assert_eq!(model.predict(&features).unwrap(), 154.0);
    }

    #[test]
    fn unseen_category_fails_by_default() {
        let model = sample_model();
        let features = PricingFeatures {
            fuel: "hydrogen".into(),
            ..PricingFeatures::default()
        };
        let err = model.predict(&features).unwrap_err();
        assert!(err.to_string().contains("unknown categories ['hydrogen']"));
    }

    #[test]
    fn unseen_category_ignored_when_configured() {
        let model = LinearPriceModel {
            unknown_category: UnknownCategory::Ignore,
            ..sample_model()
        };
        let features = PricingFeatures {
            fuel: "hydrogen".into(),
            ..PricingFeatures::default()
        };
        // 120 + 0 + 0 + 5 - 1 + 0 (Peugeot)
        assert_eq!(model.predict(&features).unwrap(), 124.0);
    }

    #[test]
    fn negative_scores_clip_to_zero() {
        let model = LinearPriceModel {
            intercept: -500.0,
            ..sample_model()
        };
        assert_eq!(model.predict(&PricingFeatures::default()).unwrap(), 0.0);
    }

    #[test]
    fn validation_rejects_bad_artifacts() {
        let mut model = sample_model();
        model.numeric.get_mut("mileage").unwrap().scale = 0.0;
        assert!(model.validate().is_err());

        let mut model = sample_model();
        model.flags.insert("has_sunroof".into(), 1.0);
        assert!(model.validate().is_err());

        assert!(sample_model().validate().is_ok());
    }

    #[test]
    fn missing_artifact_fails_to_load() {
        let err = LinearPriceModel::load(Path::new("/nonexistent/modele_GAR.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read model artifact"));
    }
}
