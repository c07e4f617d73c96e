use async_trait::async_trait;
use chrono::NaiveDate;
use mizu_core::repository::{ForecastResultRepository, HistoricalDataRepository, RepoResult};
use mizu_core::{ForecastRecord, HistoricalDataPoint, OptimizedPrice};
use sqlx::PgPool;
use tracing::debug;

pub struct PostgresHistoricalRepository {
    pool: PgPool,
}

impl PostgresHistoricalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Numeric columns are cast so any int/numeric/real layout decodes as f64.
#[derive(sqlx::FromRow)]
struct HistoryRow {
    date: Option<NaiveDate>,
    tickets_sold: Option<f64>,
    competitor_price: Option<f64>,
    demand_index: Option<f64>,
}

impl From<HistoryRow> for HistoricalDataPoint {
    fn from(row: HistoryRow) -> Self {
        HistoricalDataPoint {
            date: row.date,
            tickets_sold: row.tickets_sold,
            competitor_price: row.competitor_price,
            demand_index: row.demand_index,
        }
    }
}

#[async_trait]
impl HistoricalDataRepository for PostgresHistoricalRepository {
    async fn list_routes(&self) -> RepoResult<Vec<String>> {
        let routes = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT route FROM historical_data WHERE route IS NOT NULL ORDER BY route",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(routes)
    }

    async fn fetch_history(&self, route: &str) -> RepoResult<Vec<HistoricalDataPoint>> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT
                date::date AS date,
                tickets_sold::float8 AS tickets_sold,
                competitor_price::float8 AS competitor_price,
                demand_index::float8 AS demand_index
            FROM historical_data
            WHERE route = $1
            ORDER BY date
            "#,
        )
        .bind(route)
        .fetch_all(&self.pool)
        .await?;

        debug!(route, rows = rows.len(), "Fetched historical data");
        Ok(rows.into_iter().map(HistoricalDataPoint::from).collect())
    }
}

pub struct PostgresForecastResultRepository {
    pool: PgPool,
}

impl PostgresForecastResultRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ForecastResultRepository for PostgresForecastResultRepository {
    async fn insert_optimized_price(&self, price: &OptimizedPrice) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO optimized_results (route, optimized_price, forecasted_demand)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&price.route)
        .bind(price.optimized_price)
        .bind(price.forecasted_demand)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_forecast_result(&self, record: &ForecastRecord) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO forecast_results (route, optimized_price, forecasted_demand, mean_squared_error)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&record.route)
        .bind(record.optimized_price)
        .bind(record.forecasted_demand)
        .bind(record.mean_squared_error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
