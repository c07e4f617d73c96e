use mizu_forecast::{ForecastConfig, PricingConfig};
use mizu_ops::{DisruptionConfig, PipelineSettings, SeatingConfig};
use mizu_store::DatabaseConfig;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub forecasting: ForecastConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub seating: SeatingConfig,
    #[serde(default)]
    pub disruption: DisruptionConfig,
}

impl Config {
    pub fn load(config_dir: &str) -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let dir = config_dir.trim_end_matches('/');

        let s = config::Config::builder()
            .add_source(config::File::with_name(&format!("{}/default", dir)))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("{}/{}", dir, run_mode)).required(false))
            // Machine-local overrides, never checked in
            .add_source(config::File::with_name(&format!("{}/local", dir)).required(false))
            // Eg. `MIZU__DATABASE__URL=postgres://...` sets `database.url`
            .add_source(config::Environment::with_prefix("MIZU").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            forecasting: self.forecasting.clone(),
            pricing: self.pricing.clone(),
            seating: self.seating.clone(),
            disruption: self.disruption.clone(),
        }
    }
}
