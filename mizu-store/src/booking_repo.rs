use async_trait::async_trait;
use mizu_core::repository::{BookingRepository, RepoResult};
use mizu_core::{Booking, BookingStatus, DisruptionLog};
use sqlx::PgPool;
use tracing::debug;

pub struct PostgresBookingRepository {
    pool: PgPool,
}

impl PostgresBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: i64,
    flight_number: String,
    status: Option<String>,
    disrupted: bool,
    disruption_reason: Option<String>,
    is_refunded: bool,
    is_rescheduled: bool,
    reschedule_flight_number: Option<String>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Booking {
            id: row.id,
            flight_number: row.flight_number,
            status: BookingStatus::from(row.status.unwrap_or_default()),
            disrupted: row.disrupted,
            disruption_reason: row.disruption_reason,
            is_refunded: row.is_refunded,
            is_rescheduled: row.is_rescheduled,
            reschedule_flight_number: row.reschedule_flight_number,
        }
    }
}

const INSERT_LOG: &str = r#"
    INSERT INTO disruption_logs (flight_number, status, disruption_reason, timestamp, user_decision)
    VALUES ($1, $2, $3, $4, $5)
"#;

#[async_trait]
impl BookingRepository for PostgresBookingRepository {
    async fn list_bookings(&self) -> RepoResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT
                id::int8 AS id,
                flight_number,
                status,
                COALESCE(disrupted, FALSE) AS disrupted,
                disruption_reason,
                COALESCE(is_refunded, FALSE) AS is_refunded,
                COALESCE(is_rescheduled, FALSE) AS is_rescheduled,
                reschedule_flight_number
            FROM bookings
            WHERE flight_number IS NOT NULL
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Booking::from).collect())
    }

    async fn mark_disrupted(
        &self,
        booking_id: i64,
        status: &BookingStatus,
        reason: &str,
    ) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = $1, disrupted = TRUE, disruption_reason = $2
            WHERE id = $3
            "#,
        )
        .bind(status.as_str())
        .bind(reason)
        .bind(booking_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(format!("Booking {} not found", booking_id).into());
        }
        Ok(())
    }

    async fn record_refund(&self, booking: &Booking, log: &DisruptionLog) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE bookings
            SET is_refunded = TRUE, status = $1
            WHERE flight_number = $2 AND id = $3
            "#,
        )
        .bind(BookingStatus::Refunded.as_str())
        .bind(&booking.flight_number)
        .bind(booking.id)
        .execute(&mut *tx)
        .await?;

        insert_log(&mut tx, log).await?;
        tx.commit().await?;

        debug!(booking_id = booking.id, "Refund committed");
        Ok(())
    }

    async fn record_reschedule(
        &self,
        booking: &Booking,
        new_flight: &str,
        log: &DisruptionLog,
    ) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE bookings
            SET is_rescheduled = TRUE, reschedule_flight_number = $1, status = $2
            WHERE flight_number = $3 AND id = $4
            "#,
        )
        .bind(new_flight)
        .bind(BookingStatus::Rescheduled.as_str())
        .bind(&booking.flight_number)
        .bind(booking.id)
        .execute(&mut *tx)
        .await?;

        insert_log(&mut tx, log).await?;
        tx.commit().await?;

        debug!(booking_id = booking.id, new_flight, "Reschedule committed");
        Ok(())
    }
}

async fn insert_log(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    log: &DisruptionLog,
) -> Result<(), sqlx::Error> {
    sqlx::query(INSERT_LOG)
        .bind(&log.flight_number)
        .bind(log.status.as_str())
        .bind(&log.disruption_reason)
        .bind(log.timestamp)
        .bind(&log.user_decision)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
