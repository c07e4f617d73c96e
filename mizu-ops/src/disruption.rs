use std::sync::Arc;

use chrono::Utc;
use mizu_core::repository::BookingRepository;
use mizu_core::{Booking, BookingStatus, DisruptionLog, DisruptionState, Resolution};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::notify::Notifier;
use crate::pipeline::PipelineError;
use crate::prompt::{Choice, DecisionSource};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisruptionConfig {
    /// Flight offered to customers who choose to reschedule. `None` means nothing
    /// is available and reschedule requests are declined.
    pub reschedule_flight: Option<String>,
}

impl Default for DisruptionConfig {
    fn default() -> Self {
        Self {
            reschedule_flight: Some("NEW123".to_string()),
        }
    }
}

/// What happened to one booking
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisruptionOutcome {
    NoDisruption,
    AlreadyResolved(DisruptionState),
    Refunded,
    Rescheduled(String),
    /// Customer asked to reschedule but no flight was available.
    NoAlternative,
    InvalidChoice(String),
}

impl DisruptionOutcome {
    pub fn is_resolution(&self) -> bool {
        matches!(self, DisruptionOutcome::Refunded | DisruptionOutcome::Rescheduled(_))
    }
}

/// Drives one booking through Normal -> Disrupted -> Refunded | Rescheduled
pub struct DisruptionManager {
    config: DisruptionConfig,
    notifier: Arc<dyn Notifier>,
}

impl DisruptionManager {
    pub fn new(config: DisruptionConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self { config, notifier }
    }

    pub fn next_available_flight(&self, current_flight: &str) -> Option<String> {
        self.config
            .reschedule_flight
            .as_deref()
            .map(str::trim)
            .filter(|flight| !flight.is_empty() && *flight != current_flight)
            .map(str::to_string)
    }

    pub async fn handle_booking(
        &self,
        repo: &dyn BookingRepository,
        decisions: &dyn DecisionSource,
        booking: &Booking,
    ) -> Result<DisruptionOutcome, PipelineError> {
        let state = booking.disruption_state();
        if state.is_terminal() {
            debug!(booking_id = booking.id, ?state, "Booking already resolved");
            return Ok(DisruptionOutcome::AlreadyResolved(state));
        }
        if state == DisruptionState::Normal {
            info!("No disruptions detected for flight {}", booking.flight_number);
            return Ok(DisruptionOutcome::NoDisruption);
        }

        info!(
            "Current status for flight {}: {}",
            booking.flight_number, booking.status
        );

        // 1. Flag the booking the first time the disruption is seen
        if !booking.disrupted {
            let reason = format!("Flight status changed to {}", booking.status);
            repo.mark_disrupted(booking.id, &booking.status, &reason)
                .await?;
            info!(
                "Booking {} updated for flight {}: {}",
                booking.id, booking.flight_number, booking.status
            );
            self.notifier
                .notify(&booking.flight_number, booking.status.as_str());
        }

        // 2. Ask the customer
        let resolution = match decisions.decide(booking)? {
            Choice::Resolve(resolution) => resolution,
            Choice::Invalid(raw) => {
                warn!(
                    booking_id = booking.id,
                    "Invalid choice {:?}. Please choose 1 or 2.", raw
                );
                return Ok(DisruptionOutcome::InvalidChoice(raw));
            }
        };
        state.resolve(resolution)?;

        // 3. Apply it
        match resolution {
            Resolution::Refund => {
                let log = self.log_entry(
                    booking,
                    BookingStatus::Refunded,
                    "User withdrew ticket.",
                    "Withdrawn".to_string(),
                );
                repo.record_refund(booking, &log).await?;
                info!(
                    "Ticket withdrawn for flight {}, booking {}.",
                    booking.flight_number, booking.id
                );
                self.notifier
                    .notify(&booking.flight_number, "Your ticket has been refunded.");
                Ok(DisruptionOutcome::Refunded)
            }
            Resolution::Reschedule => {
                let Some(new_flight) = self.next_available_flight(&booking.flight_number) else {
                    warn!("No available flights to reschedule booking {}.", booking.id);
                    return Ok(DisruptionOutcome::NoAlternative);
                };

                let log = self.log_entry(
                    booking,
                    BookingStatus::Rescheduled,
                    "User rescheduled ticket.",
                    format!("Rescheduled to {}", new_flight),
                );
                repo.record_reschedule(booking, &new_flight, &log).await?;
                info!(
                    "Ticket rescheduled from flight {} to {}, booking {}.",
                    booking.flight_number, new_flight, booking.id
                );
                self.notifier.notify(
                    &booking.flight_number,
                    &format!("Your ticket has been rescheduled to flight {}.", new_flight),
                );
                Ok(DisruptionOutcome::Rescheduled(new_flight))
            }
        }
    }

    fn log_entry(
        &self,
        booking: &Booking,
        status: BookingStatus,
        reason: &str,
        user_decision: String,
    ) -> DisruptionLog {
        DisruptionLog {
            flight_number: booking.flight_number.clone(),
            status,
            disruption_reason: reason.to_string(),
            timestamp: Utc::now().naive_utc(),
            user_decision,
        }
    }
}
