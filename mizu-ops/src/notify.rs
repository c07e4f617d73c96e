use tracing::info;

/// Delivers disruption updates to the affected customer.
pub trait Notifier: Send + Sync {
    fn notify(&self, flight_number: &str, message: &str);
}

/// Writes notifications to the log. Stands in until a real delivery channel exists.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, flight_number: &str, message: &str) {
        info!(flight_number, "Customer notified: Flight {} is now {}", flight_number, message);
    }
}
