use async_trait::async_trait;
use mizu_core::repository::{CustomerRepository, RepoResult};
use mizu_core::{CustomerProfile, CustomerSuggestion, Masked};
use sqlx::PgPool;

pub struct PostgresCustomerRepository {
    pool: PgPool,
}

impl PostgresCustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    name: Option<String>,
    email: Option<String>,
    frequent_routes: Option<String>,
    seat_preference: Option<String>,
    meal_preference: Option<String>,
    phone_number: Option<String>,
}

impl From<ProfileRow> for CustomerProfile {
    fn from(row: ProfileRow) -> Self {
        CustomerProfile {
            name: row.name,
            email: row.email,
            frequent_routes: row.frequent_routes,
            seat_preference: row.seat_preference,
            meal_preference: row.meal_preference,
            phone_number: row.phone_number.map(Masked),
        }
    }
}

#[async_trait]
impl CustomerRepository for PostgresCustomerRepository {
    async fn list_profiles(&self) -> RepoResult<Vec<CustomerProfile>> {
        let rows = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT name, email, frequent_routes, seat_preference, meal_preference,
                   phone_number::text AS phone_number
            FROM customer_profiles
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CustomerProfile::from).collect())
    }

    async fn save_suggestion(&self, suggestion: &CustomerSuggestion) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO customer_suggestions
                (first_name, last_name, email, seat_suggestion, meal_suggestion, most_common_route, assigned_seat_number)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&suggestion.first_name)
        .bind(&suggestion.last_name)
        .bind(&suggestion.email)
        .bind(suggestion.seat_suggestion.as_str())
        .bind(suggestion.meal_suggestion.as_str())
        .bind(&suggestion.most_common_route)
        .bind(&suggestion.assigned_seat_number)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
