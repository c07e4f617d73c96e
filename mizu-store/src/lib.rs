pub mod database;
pub mod history_repo;
pub mod customer_repo;
pub mod booking_repo;

pub use database::{DatabaseConfig, DbClient};
pub use history_repo::{PostgresForecastResultRepository, PostgresHistoricalRepository};
pub use customer_repo::PostgresCustomerRepository;
pub use booking_repo::PostgresBookingRepository;
