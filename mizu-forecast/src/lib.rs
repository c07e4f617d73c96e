pub mod regression;
pub mod forecasting;
pub mod pricing;

pub use regression::{FeatureVector, LinearModel, RegressionError, Sample};
pub use forecasting::{forecast_demand, DemandForecast, ForecastConfig, ForecastError};
pub use pricing::{PricingConfig, PricingEngine};
