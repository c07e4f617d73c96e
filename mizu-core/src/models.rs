use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pii::Masked;
use crate::{CoreError, CoreResult};

/// One row of `historical_data` for a route.
///
/// Numeric columns are optional because the source table does not constrain
/// them; incomplete rows are dropped before a model is fitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalDataPoint {
    pub date: Option<NaiveDate>,
    pub tickets_sold: Option<f64>,
    pub competitor_price: Option<f64>,
    pub demand_index: Option<f64>,
}

/// Row written to `optimized_results`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedPrice {
    pub route: String,
    pub optimized_price: f64,
    pub forecasted_demand: f64,
}

/// Row written to `forecast_results`. The timestamp is filled in by the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub route: String,
    pub optimized_price: Option<f64>,
    pub forecasted_demand: f64,
    pub mean_squared_error: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatPreference {
    Aisle,
    Window,
}

impl SeatPreference {
    /// Anything other than an exact `"aisle"` is treated as a window preference.
    pub fn from_stated(value: Option<&str>) -> Self {
        match value {
            Some("aisle") => SeatPreference::Aisle,
            _ => SeatPreference::Window,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeatPreference::Aisle => "aisle",
            SeatPreference::Window => "window",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MealPreference {
    Vegetarian,
    NonVegetarian,
}

impl MealPreference {
    pub fn from_stated(value: Option<&str>) -> Self {
        match value {
            Some("vegetarian") => MealPreference::Vegetarian,
            _ => MealPreference::NonVegetarian,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MealPreference::Vegetarian => "vegetarian",
            MealPreference::NonVegetarian => "non-vegetarian",
        }
    }
}

/// A row from `customer_profiles`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub name: Option<String>,
    pub email: Option<String>,
    /// Comma-separated route codes, e.g. `"JFK-LAX, JFK-SFO"`.
    pub frequent_routes: Option<String>,
    pub seat_preference: Option<String>,
    pub meal_preference: Option<String>,
    pub phone_number: Option<Masked<String>>,
}

/// Derived suggestion for a customer. Inserted once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSuggestion {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub seat_suggestion: SeatPreference,
    pub meal_suggestion: MealPreference,
    pub most_common_route: Option<String>,
    pub assigned_seat_number: String,
}

/// Value of the `bookings.status` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BookingStatus {
    Delayed,
    Cancelled,
    Refunded,
    Rescheduled,
    /// Any status the disruption flow does not act on ("Confirmed", "On Time", ...).
    Other(String),
}

impl BookingStatus {
    pub fn as_str(&self) -> &str {
        match self {
            BookingStatus::Delayed => "Delayed",
            BookingStatus::Cancelled => "Cancelled",
            BookingStatus::Refunded => "Refunded",
            BookingStatus::Rescheduled => "Rescheduled",
            BookingStatus::Other(raw) => raw,
        }
    }

    pub fn is_disruption(&self) -> bool {
        matches!(self, BookingStatus::Delayed | BookingStatus::Cancelled)
    }
}

impl From<String> for BookingStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Delayed" => BookingStatus::Delayed,
            "Cancelled" => BookingStatus::Cancelled,
            "Refunded" => BookingStatus::Refunded,
            "Rescheduled" => BookingStatus::Rescheduled,
            _ => BookingStatus::Other(raw),
        }
    }
}

impl From<BookingStatus> for String {
    fn from(status: BookingStatus) -> Self {
        match status {
            BookingStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a booking sits in the disruption flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisruptionState {
    Normal,
    Disrupted,
    Refunded,
    Rescheduled,
}

/// Customer's answer to a disruption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Refund,
    Reschedule,
}

impl DisruptionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DisruptionState::Refunded | DisruptionState::Rescheduled)
    }

    /// Only a disrupted booking can be refunded or rescheduled.
    pub fn resolve(self, resolution: Resolution) -> CoreResult<DisruptionState> {
        let attempted = match resolution {
            Resolution::Refund => "refunded",
            Resolution::Reschedule => "rescheduled",
        };
        match (self, resolution) {
            (DisruptionState::Disrupted, Resolution::Refund) => Ok(DisruptionState::Refunded),
            (DisruptionState::Disrupted, Resolution::Reschedule) => {
                Ok(DisruptionState::Rescheduled)
            }
            (from, _) => Err(CoreError::InvalidTransition { from, attempted }),
        }
    }
}

/// A row from `bookings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub flight_number: String,
    pub status: BookingStatus,
    pub disrupted: bool,
    pub disruption_reason: Option<String>,
    pub is_refunded: bool,
    pub is_rescheduled: bool,
    pub reschedule_flight_number: Option<String>,
}

impl Booking {
    /// Resolution flags win over the status column so a refunded booking whose
    /// status was later overwritten is still treated as closed.
    pub fn disruption_state(&self) -> DisruptionState {
        if self.is_refunded || self.status == BookingStatus::Refunded {
            DisruptionState::Refunded
        } else if self.is_rescheduled || self.status == BookingStatus::Rescheduled {
            DisruptionState::Rescheduled
        } else if self.status.is_disruption() {
            DisruptionState::Disrupted
        } else {
            DisruptionState::Normal
        }
    }
}

/// A row for `disruption_logs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisruptionLog {
    pub flight_number: String,
    pub status: BookingStatus,
    pub disruption_reason: String,
    pub timestamp: NaiveDateTime,
    pub user_decision: String,
}
