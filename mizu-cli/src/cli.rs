use clap::{Parser, Subcommand, ValueEnum};
use mizu_core::Resolution;

#[derive(Parser, Debug)]
#[command(name = "mizu")]
#[command(version, about = "Batch jobs for airline demand, pricing, seating and disruptions")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding default.toml and its overrides
    #[arg(long, global = true, default_value = "config")]
    pub config_dir: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create any missing tables and exit
    Migrate,

    /// Fit the demand model per route and store the forecasts
    Forecast {
        /// Only this route (e.g. "JFK-LAX")
        #[arg(long)]
        route: Option<String>,
    },

    /// Forecast demand, then store a threshold-adjusted price per route
    Price {
        /// Only this route
        #[arg(long)]
        route: Option<String>,
    },

    /// Write seat and meal suggestions for customer profiles
    Suggest {
        /// Only the profile with this email
        #[arg(long)]
        email: Option<String>,
    },

    /// Flag disrupted bookings and resolve them
    Disruptions {
        /// Only bookings on this flight
        #[arg(long)]
        flight: Option<String>,

        /// Apply this decision to every booking instead of prompting
        #[arg(long, value_enum)]
        decision: Option<DecisionArg>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DecisionArg {
    Refund,
    Reschedule,
}

impl From<DecisionArg> for Resolution {
    fn from(arg: DecisionArg) -> Self {
        match arg {
            DecisionArg::Refund => Resolution::Refund,
            DecisionArg::Reschedule => Resolution::Reschedule,
        }
    }
}
