use std::fmt;
use std::io;
use std::sync::Arc;

use mizu_core::repository::{
    BookingRepository, CustomerRepository, ForecastResultRepository, HistoricalDataRepository,
    RepoError,
};
use mizu_core::{CoreError, CustomerProfile, ForecastRecord, OptimizedPrice};
use mizu_forecast::{forecast_demand, ForecastConfig, ForecastError, PricingConfig, PricingEngine};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::disruption::{DisruptionConfig, DisruptionManager};
use crate::notify::{LogNotifier, Notifier};
use crate::prompt::{DecisionSource, TerminalPrompt};
use crate::suggestions::{SeatingConfig, SuggestionEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Fit the demand model per route and store the forecast.
    Forecast,
    /// Forecast, then derive a price with the threshold rule.
    Pricing,
    /// Seat/meal heuristics per customer profile.
    Suggestions,
    /// Resolve disrupted bookings.
    Disruptions,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Forecast => "forecast",
            Strategy::Pricing => "pricing",
            Strategy::Suggestions => "suggestions",
            Strategy::Disruptions => "disruptions",
        };
        f.write_str(name)
    }
}

/// Which entities a run covers. `One` holds a route, a customer email or a flight
/// number depending on the strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    All,
    One(String),
}

impl Target {
    pub fn from_option(id: Option<String>) -> Self {
        id.map_or(Target::All, Target::One)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Repository error: {0}")]
    Repository(RepoError),

    #[error("Forecast error: {0}")]
    Forecast(#[from] ForecastError),

    #[error("Prompt error: {0}")]
    Prompt(#[from] io::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<RepoError> for PipelineError {
    fn from(err: RepoError) -> Self {
        PipelineError::Repository(err)
    }
}

/// Storage handles the pipeline reads from and writes to.
#[derive(Clone)]
pub struct Repositories {
    pub history: Arc<dyn HistoricalDataRepository>,
    pub results: Arc<dyn ForecastResultRepository>,
    pub customers: Arc<dyn CustomerRepository>,
    pub bookings: Arc<dyn BookingRepository>,
}

/// Per-job settings, deserialized straight from the config file sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub forecasting: ForecastConfig,
    pub pricing: PricingConfig,
    pub seating: SeatingConfig,
    pub disruption: DisruptionConfig,
}

enum Step {
    Done,
    Skipped,
}

/// One fetch, compute, persist loop shared by every job. Entities are processed
/// one at a time and a failing entity does not stop the run; only a failure to
/// list the entities does.
pub struct Pipeline {
    repos: Repositories,
    forecast: ForecastConfig,
    pricing: PricingEngine,
    suggestions: SuggestionEngine,
    disruption_config: DisruptionConfig,
    notifier: Arc<dyn Notifier>,
    decisions: Arc<dyn DecisionSource>,
}

impl Pipeline {
    /// Notifications go to the log and decisions are read from the terminal until
    /// overridden.
    pub fn new(repos: Repositories, settings: PipelineSettings) -> Self {
        Self {
            repos,
            forecast: settings.forecasting,
            pricing: PricingEngine::new(settings.pricing),
            suggestions: SuggestionEngine::new(settings.seating),
            disruption_config: settings.disruption,
            notifier: Arc::new(LogNotifier),
            decisions: Arc::new(TerminalPrompt::stdio()),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_decisions(mut self, decisions: Arc<dyn DecisionSource>) -> Self {
        self.decisions = decisions;
        self
    }

    pub async fn run(
        &self,
        strategy: Strategy,
        target: &Target,
    ) -> Result<PipelineReport, PipelineError> {
        info!(%strategy, ?target, "Starting run");

        let report = match strategy {
            Strategy::Forecast | Strategy::Pricing => self.run_routes(strategy, target).await?,
            Strategy::Suggestions => self.run_suggestions(target).await?,
            Strategy::Disruptions => self.run_disruptions(target).await?,
        };

        info!(
            %strategy,
            processed = report.processed,
            skipped = report.skipped,
            failed = report.failed,
            "Run finished"
        );
        Ok(report)
    }

    async fn run_routes(
        &self,
        strategy: Strategy,
        target: &Target,
    ) -> Result<PipelineReport, PipelineError> {
        let routes = match target {
            Target::All => self.repos.history.list_routes().await?,
            Target::One(route) => vec![route.clone()],
        };
        info!("Found {} routes with historical data", routes.len());

        let mut report = PipelineReport::default();
        for route in &routes {
            match self.process_route(strategy, route).await {
                Ok(Step::Done) => report.processed += 1,
                Ok(Step::Skipped) => report.skipped += 1,
                Err(e) => {
                    error!("Failed to process route {}: {}", route, e);
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }

    async fn process_route(&self, strategy: Strategy, route: &str) -> Result<Step, PipelineError> {
        let history = self.repos.history.fetch_history(route).await?;
        info!("Fetched {} historical rows for route {}", history.len(), route);

        let forecast = match forecast_demand(route, &history, &self.forecast) {
            Ok(forecast) => forecast,
            Err(ForecastError::InsufficientData {
                available,
                required,
                ..
            }) => {
                warn!(
                    "Not enough data to run the model for route {}: {} of {} rows",
                    route, available, required
                );
                return Ok(Step::Skipped);
            }
            Err(e) => return Err(e.into()),
        };

        let optimized_price = if strategy == Strategy::Pricing {
            let config = self.pricing.config();
            let reference_demand = forecast.model.predict(&self.pricing.reference_features());
            let price = self.pricing.adjust_price(config.base_price, reference_demand);

            self.repos
                .results
                .insert_optimized_price(&OptimizedPrice {
                    route: route.to_string(),
                    optimized_price: price,
                    forecasted_demand: forecast.forecasted_demand,
                })
                .await?;
            info!(
                "Optimized price for route {}: {:.2} (reference demand {:.2})",
                route, price, reference_demand
            );
            Some(price)
        } else {
            None
        };

        self.repos
            .results
            .insert_forecast_result(&ForecastRecord {
                route: route.to_string(),
                optimized_price,
                forecasted_demand: forecast.forecasted_demand,
                mean_squared_error: forecast.mean_squared_error,
            })
            .await?;
        info!(
            "Stored forecast for route {}: demand {:.2}, mse {:.2}",
            route, forecast.forecasted_demand, forecast.mean_squared_error
        );

        Ok(Step::Done)
    }

    async fn run_suggestions(&self, target: &Target) -> Result<PipelineReport, PipelineError> {
        let profiles: Vec<CustomerProfile> = self
            .repos
            .customers
            .list_profiles()
            .await?
            .into_iter()
            .filter(|profile| match target {
                Target::All => true,
                Target::One(email) => profile.email.as_deref() == Some(email.as_str()),
            })
            .collect();
        info!("Found {} customer profiles", profiles.len());

        let mut report = PipelineReport::default();
        for profile in &profiles {
            let suggestion = {
                let mut rng = rand::thread_rng();
                self.suggestions.suggest(profile, &mut rng)
            };
            let Some(suggestion) = suggestion else {
                warn!("Customer profile without a name, skipping");
                report.skipped += 1;
                continue;
            };

            let email = suggestion.email.as_deref().unwrap_or("<no email>");
            info!(
                "Suggestions for {}: seat {}, meal {}, route {}, assigned seat {}",
                email,
                suggestion.seat_suggestion.as_str(),
                suggestion.meal_suggestion.as_str(),
                suggestion
                    .most_common_route
                    .as_deref()
                    .unwrap_or("no frequent routes found"),
                suggestion.assigned_seat_number
            );

            match self.repos.customers.save_suggestion(&suggestion).await {
                Ok(()) => report.processed += 1,
                Err(e) => {
                    error!("Failed to save suggestion for {}: {}", email, e);
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }

    async fn run_disruptions(&self, target: &Target) -> Result<PipelineReport, PipelineError> {
        let bookings: Vec<_> = self
            .repos
            .bookings
            .list_bookings()
            .await?
            .into_iter()
            .filter(|booking| match target {
                Target::All => true,
                Target::One(flight) => booking.flight_number == *flight,
            })
            .collect();
        info!("Found {} bookings to check", bookings.len());

        let manager = DisruptionManager::new(self.disruption_config.clone(), self.notifier.clone());
        let mut report = PipelineReport::default();
        for booking in &bookings {
            info!("Checking disruption for flight: {}", booking.flight_number);
            match manager
                .handle_booking(self.repos.bookings.as_ref(), self.decisions.as_ref(), booking)
                .await
            {
                Ok(outcome) if outcome.is_resolution() => report.processed += 1,
                Ok(_) => report.skipped += 1,
                Err(e) => {
                    error!("Failed to handle booking {}: {}", booking.id, e);
                    report.failed += 1;
                }
            }
        }
        info!("All flight disruptions processed.");
        Ok(report)
    }
}
