mod app_config;
mod cli;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use mizu_ops::{FixedDecision, Pipeline, Repositories, Strategy, Target};
use mizu_store::{
    DbClient, PostgresBookingRepository, PostgresCustomerRepository,
    PostgresForecastResultRepository, PostgresHistoricalRepository,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app_config::Config;
use crate::cli::{Cli, Commands};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "mizu=info,mizu_ops=info,mizu_forecast=info,mizu_store=info,sqlx=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = Config::load(&cli.config_dir)
        .with_context(|| format!("Failed to load config from {}", cli.config_dir))?;

    let db = DbClient::connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await.context("Failed to run migrations")?;

    let (strategy, target, decision) = match cli.command {
        Commands::Migrate => {
            info!("Schema is up to date");
            return Ok(());
        }
        Commands::Forecast { route } => (Strategy::Forecast, Target::from_option(route), None),
        Commands::Price { route } => (Strategy::Pricing, Target::from_option(route), None),
        Commands::Suggest { email } => (Strategy::Suggestions, Target::from_option(email), None),
        Commands::Disruptions { flight, decision } => {
            (Strategy::Disruptions, Target::from_option(flight), decision)
        }
    };

    let repos = Repositories {
        history: Arc::new(PostgresHistoricalRepository::new(db.pool.clone())),
        results: Arc::new(PostgresForecastResultRepository::new(db.pool.clone())),
        customers: Arc::new(PostgresCustomerRepository::new(db.pool.clone())),
        bookings: Arc::new(PostgresBookingRepository::new(db.pool.clone())),
    };

    let mut pipeline = Pipeline::new(repos, config.pipeline_settings());
    if let Some(decision) = decision {
        info!(?decision, "Applying the same decision to every disrupted booking");
        pipeline = pipeline.with_decisions(Arc::new(FixedDecision(decision.into())));
    }

    let report = pipeline
        .run(strategy, &target)
        .await
        .with_context(|| format!("{} run failed", strategy))?;

    info!(summary = %serde_json::to_string(&report)?, "Done");
    db.pool.close().await;
    Ok(())
}

