use serde::{Deserialize, Serialize};

/// Categorical columns of the pricing dataset.
pub const CATEGORICAL: [&str; 4] = ["model_key", "fuel", "paint_color", "car_type"];
/// Numeric columns of the pricing dataset.
pub const NUMERIC: [&str; 2] = ["mileage", "engine_power"];
/// Boolean equipment flags of the pricing dataset.
pub const FLAGS: [&str; 7] = [
    "private_parking_available",
    "has_gps",
    "has_air_conditioning",
    "automatic_car",
    "has_getaround_connect",
    "has_speed_regulator",
    "winter_tires",
];
/// Label column; present in the dataset, never needed for scoring.
pub const TARGET: &str = "rental_price_per_day";

/// Vehicle description scored by the price model.
///
/// String categories are accepted as-is: they are not checked against a
/// fixed list, and values the model has never seen are reported by the
/// model itself at scoring time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingFeatures {
    pub model_key: String,
    pub mileage: f64,
    pub engine_power: f64,
    pub fuel: String,
    pub paint_color: String,
    pub car_type: String,
    pub private_parking_available: bool,
    pub has_gps: bool,
    pub has_air_conditioning: bool,
    pub automatic_car: bool,
    pub has_getaround_connect: bool,
    pub has_speed_regulator: bool,
    pub winter_tires: bool,
}

impl Default for PricingFeatures {
    /// Starting values of the dashboard form.
    fn default() -> Self {
        PricingFeatures {
            model_key: "Peugeot".to_string(),
            mileage: 100_000.0,
            engine_power: 135.0,
            fuel: "diesel".to_string(),
            paint_color: "black".to_string(),
            car_type: "sedan".to_string(),
            private_parking_available: true,
            has_gps: true,
            has_air_conditioning: false,
            automatic_car: false,
            has_getaround_connect: true,
            has_speed_regulator: false,
            winter_tires: true,
        }
    }
}

impl PricingFeatures {
    pub fn category(&self, name: &str) -> Option<&str> {
        match name {
            "model_key" => Some(&self.model_key),
            "fuel" => Some(&self.fuel),
            "paint_color" => Some(&self.paint_color),
            "car_type" => Some(&self.car_type),
            _ => None,
        }
    }

    pub fn numeric(&self, name: &str) -> Option<f64> {
        match name {
            "mileage" => Some(self.mileage),
            "engine_power" => Some(self.engine_power),
            _ => None,
        }
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        match name {
            "private_parking_available" => Some(self.private_parking_available),
            "has_gps" => Some(self.has_gps),
            "has_air_conditioning" => Some(self.has_air_conditioning),
            "automatic_car" => Some(self.automatic_car),
            "has_getaround_connect" => Some(self.has_getaround_connect),
            "has_speed_regulator" => Some(self.has_speed_regulator),
            "winter_tires" => Some(self.winter_tires),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_documented_example() {
        let body = r#"{
            "model_key": " Renault",
            "mileage": 109839,
            "engine_power": 135,
            "fuel": "diesel",
            "paint_color": "black",
            "car_type": "sedan",
            "private_parking_available": true,
            "has_gps": true,
            "has_air_conditioning": false,
            "automatic_car": false,
            "has_getaround_connect": true,
            "has_speed_regulator": false,
            "winter_tires": true
        }"#;
        let f: PricingFeatures = serde_json::from_str(body).unwrap();
        // leading space is kept: categories pass through untouched
        assert_eq!(f.model_key, " Renault");
        assert_eq!(f.mileage, 109839.0);
    }

    #[test]
    fn wrong_types_are_rejected() {
        let mut value = serde_json::to_value(PricingFeatures::default()).unwrap();
        value["has_gps"] = serde_json::json!("yes");
        assert!(serde_json::from_value::<PricingFeatures>(value).is_err());
    }

    #[test]
    fn missing_field_is_rejected() {
        let mut value = serde_json::to_value(PricingFeatures::default()).unwrap();
        value.as_object_mut().unwrap().remove("winter_tires");
        assert!(serde_json::from_value::<PricingFeatures>(value).is_err());
    }
}
