pub mod models;
pub mod pii;
pub mod repository;

pub use models::{
    Booking, BookingStatus, CustomerProfile, CustomerSuggestion, DisruptionLog, DisruptionState,
    ForecastRecord, HistoricalDataPoint, MealPreference, OptimizedPrice, Resolution,
    SeatPreference,
};
pub use pii::Masked;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid booking transition: {from:?} cannot be {attempted}")]
    InvalidTransition {
        from: DisruptionState,
        attempted: &'static str,
    },
}

pub type CoreResult<T> = Result<T, CoreError>;
