use mizu_core::HistoricalDataPoint;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::regression::{
    mean_squared_error, train_test_split, FeatureVector, LinearModel, RegressionError, Sample,
};

/// Knobs for the per-route demand model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Share of rows held out for the error estimate.
    pub test_fraction: f64,

    /// Seed for the holdout shuffle.
    pub seed: u64,

    /// Fewer usable rows than this (and never fewer than 2) means no forecast.
    pub min_samples: usize,

    /// When set, the point forecast is the prediction at this vector instead of
    /// the mean prediction over the route's history.
    pub probe: Option<FeatureVector>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
            min_samples: 2,
            probe: None,
        }
    }
}

/// Result of fitting one route
#[derive(Debug, Clone, PartialEq)]
pub struct DemandForecast {
    pub route: String,
    pub model: LinearModel,
    /// Point forecast of tickets sold.
    pub forecasted_demand: f64,
    /// Holdout error of the model.
    pub mean_squared_error: f64,
    pub train_size: usize,
    pub test_size: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    #[error("Not enough data to forecast route {route}: {available} usable rows, need {required}")]
    InsufficientData {
        route: String,
        available: usize,
        required: usize,
    },

    #[error("Regression failed: {0}")]
    Regression(#[from] RegressionError),
}

/// Rows missing any of the three numeric columns cannot be used.
fn usable_samples(history: &[HistoricalDataPoint]) -> Vec<Sample> {
    history
        .iter()
        .filter_map(|row| {
            Some(Sample::new(
                row.competitor_price?,
                row.demand_index?,
                row.tickets_sold?,
            ))
        })
        .filter(|sample| {
            sample.tickets_sold.is_finite()
                && sample.features.competitor_price.is_finite()
                && sample.features.demand_index.is_finite()
        })
        .collect()
}

/// Fit tickets sold against competitor price and demand index for one route.
pub fn forecast_demand(
    route: &str,
    history: &[HistoricalDataPoint],
    config: &ForecastConfig,
) -> Result<DemandForecast, ForecastError> {
    let samples = usable_samples(history);
    if samples.len() < history.len() {
        warn!(
            "Dropped {} incomplete historical rows for route {}",
            history.len() - samples.len(),
            route
        );
    }

    let required = config.min_samples.max(2);
    if samples.len() < required {
        return Err(ForecastError::InsufficientData {
            route: route.to_string(),
            available: samples.len(),
            required,
        });
    }

    let (train, test) = train_test_split(&samples, config.test_fraction, config.seed)?;
    let model = LinearModel::fit(&train)?;

    let actual: Vec<f64> = test.iter().map(|s| s.tickets_sold).collect();
    let mse = mean_squared_error(&actual, &model.predict_samples(&test));
    info!("Mean Squared Error for {}: {:.2}", route, mse);

    let forecasted_demand = match &config.probe {
        Some(probe) => model.predict(probe),
        None => {
            let predictions = model.predict_samples(&samples);
            predictions.iter().sum::<f64>() / predictions.len() as f64
        }
    };

    Ok(DemandForecast {
        route: route.to_string(),
        model,
        forecasted_demand,
        mean_squared_error: mse,
        train_size: train.len(),
        test_size: test.len(),
    })
}
