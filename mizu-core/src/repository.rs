use async_trait::async_trait;

use crate::models::{
    Booking, BookingStatus, CustomerProfile, CustomerSuggestion, DisruptionLog, ForecastRecord,
    HistoricalDataPoint, OptimizedPrice,
};

pub type RepoError = Box<dyn std::error::Error + Send + Sync>;
pub type RepoResult<T> = Result<T, RepoError>;

/// Read access to `historical_data`
#[async_trait]
pub trait HistoricalDataRepository: Send + Sync {
    /// Distinct routes that have any history.
    async fn list_routes(&self) -> RepoResult<Vec<String>>;

    async fn fetch_history(&self, route: &str) -> RepoResult<Vec<HistoricalDataPoint>>;
}

/// Write access to the forecast output tables
#[async_trait]
pub trait ForecastResultRepository: Send + Sync {
    async fn insert_optimized_price(&self, price: &OptimizedPrice) -> RepoResult<()>;

    async fn insert_forecast_result(&self, record: &ForecastRecord) -> RepoResult<()>;
}

/// Customer profiles in, suggestions out
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn list_profiles(&self) -> RepoResult<Vec<CustomerProfile>>;

    async fn save_suggestion(&self, suggestion: &CustomerSuggestion) -> RepoResult<()>;
}

/// Booking status updates for the disruption flow
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn list_bookings(&self) -> RepoResult<Vec<Booking>>;

    /// Set the status, the `disrupted` flag and the reason on one booking.
    async fn mark_disrupted(
        &self,
        booking_id: i64,
        status: &BookingStatus,
        reason: &str,
    ) -> RepoResult<()>;

    /// Flag the booking as refunded and append the log row atomically.
    async fn record_refund(&self, booking: &Booking, log: &DisruptionLog) -> RepoResult<()>;

    /// Move the booking to `new_flight` and append the log row atomically.
    async fn record_reschedule(
        &self,
        booking: &Booking,
        new_flight: &str,
        log: &DisruptionLog,
    ) -> RepoResult<()>;
}
