use serde::{Deserialize, Serialize};

use crate::regression::FeatureVector;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Fare the rule adjusts from.
    pub base_price: f64,

    /// Demand index paired with `base_price` when asking the model for demand.
    pub reference_demand_index: f64,

    /// Forecasts strictly above this raise the price.
    pub demand_threshold: f64,

    /// Fractional increase applied above the threshold (0.10 = 10%).
    pub increase_percentage: f64,

    /// Fractional decrease applied at or below the threshold.
    pub decrease_percentage: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_price: 200.0,
            reference_demand_index: 0.85,
            demand_threshold: 100.0,
            increase_percentage: 0.10,
            decrease_percentage: 0.10,
        }
    }
}

/// Threshold pricing: one step up or one step down, rounded to cents.
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Feature vector the demand model is evaluated at before pricing.
    pub fn reference_features(&self) -> FeatureVector {
        FeatureVector::new(self.config.base_price, self.config.reference_demand_index)
    }

    pub fn adjust_price(&self, current_price: f64, demand_forecast: f64) -> f64 {
        let multiplier = if demand_forecast > self.config.demand_threshold {
            1.0 + self.config.increase_percentage
        } else {
            1.0 - self.config.decrease_percentage
        };

        round_to_cents(current_price * multiplier)
    }
}

fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
