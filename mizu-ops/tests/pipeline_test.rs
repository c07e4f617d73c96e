use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mizu_core::repository::{
    BookingRepository, CustomerRepository, ForecastResultRepository, HistoricalDataRepository,
    RepoResult,
};
use mizu_core::{
    Booking, BookingStatus, CustomerProfile, CustomerSuggestion, DisruptionLog, ForecastRecord,
    HistoricalDataPoint, OptimizedPrice, Resolution,
};
use mizu_ops::{
    DisruptionConfig, FixedDecision, Notifier, Pipeline, PipelineError, PipelineReport,
    PipelineSettings, Repositories, Strategy, Target, TerminalPrompt,
};

#[derive(Default)]
struct MemoryStore {
    history: HashMap<String, Vec<HistoricalDataPoint>>,
    prices: Mutex<Vec<OptimizedPrice>>,
    forecasts: Mutex<Vec<ForecastRecord>>,
    /// Inserts for this route fail.
    broken_route: Option<String>,
    /// Reading this route's history fails.
    unreadable_route: Option<String>,
    /// Every listing query fails.
    offline: bool,
    profiles: Vec<CustomerProfile>,
    suggestions: Mutex<Vec<CustomerSuggestion>>,
    bookings: Mutex<Vec<Booking>>,
    logs: Mutex<Vec<DisruptionLog>>,
}

impl MemoryStore {
    fn check_online(&self) -> RepoResult<()> {
        if self.offline {
            return Err("connection refused".into());
        }
        Ok(())
    }

    fn check_route(&self, route: &str) -> RepoResult<()> {
        if self.broken_route.as_deref() == Some(route) {
            return Err(format!("insert rejected for {}", route).into());
        }
        Ok(())
    }

    fn booking(&self, id: i64) -> Booking {
        self.bookings
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .unwrap()
    }

    fn update_booking(&self, id: i64, apply: impl FnOnce(&mut Booking)) -> RepoResult<()> {
        let mut bookings = self.bookings.lock().unwrap();
        let booking = bookings
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| format!("booking {} not found", id))?;
        apply(booking);
        Ok(())
    }
}

#[async_trait]
impl HistoricalDataRepository for MemoryStore {
    async fn list_routes(&self) -> RepoResult<Vec<String>> {
        self.check_online()?;
        let mut routes: Vec<String> = self.history.keys().cloned().collect();
        routes.sort();
        Ok(routes)
    }

    async fn fetch_history(&self, route: &str) -> RepoResult<Vec<HistoricalDataPoint>> {
        if self.unreadable_route.as_deref() == Some(route) {
            return Err(format!("history for {} unavailable", route).into());
        }
        Ok(self.history.get(route).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl ForecastResultRepository for MemoryStore {
    async fn insert_optimized_price(&self, price: &OptimizedPrice) -> RepoResult<()> {
        self.check_route(&price.route)?;
        self.prices.lock().unwrap().push(price.clone());
        Ok(())
    }

    async fn insert_forecast_result(&self, record: &ForecastRecord) -> RepoResult<()> {
        self.check_route(&record.route)?;
        self.forecasts.lock().unwrap().push(record.clone());
        Ok(())
    }
}

#[async_trait]
impl CustomerRepository for MemoryStore {
    async fn list_profiles(&self) -> RepoResult<Vec<CustomerProfile>> {
        self.check_online()?;
        Ok(self.profiles.clone())
    }

    async fn save_suggestion(&self, suggestion: &CustomerSuggestion) -> RepoResult<()> {
        self.suggestions.lock().unwrap().push(suggestion.clone());
        Ok(())
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn list_bookings(&self) -> RepoResult<Vec<Booking>> {
        self.check_online()?;
        Ok(self.bookings.lock().unwrap().clone())
    }

    async fn mark_disrupted(
        &self,
        booking_id: i64,
        status: &BookingStatus,
        reason: &str,
    ) -> RepoResult<()> {
        self.update_booking(booking_id, |b| {
            b.status = status.clone();
            b.disrupted = true;
            b.disruption_reason = Some(reason.to_string());
        })
    }

    async fn record_refund(&self, booking: &Booking, log: &DisruptionLog) -> RepoResult<()> {
        self.update_booking(booking.id, |b| {
            b.status = BookingStatus::Refunded;
            b.is_refunded = true;
        })?;
        self.logs.lock().unwrap().push(log.clone());
        Ok(())
    }

    async fn record_reschedule(
        &self,
        booking: &Booking,
        new_flight: &str,
        log: &DisruptionLog,
    ) -> RepoResult<()> {
        self.update_booking(booking.id, |b| {
            b.status = BookingStatus::Rescheduled;
            b.is_rescheduled = true;
            b.reschedule_flight_number = Some(new_flight.to_string());
        })?;
        self.logs.lock().unwrap().push(log.clone());
        Ok(())
    }
}

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, flight_number: &str, message: &str) {
        self.sent
            .lock()
            .unwrap()
            .push((flight_number.to_string(), message.to_string()));
    }
}

const PRICES: [f64; 10] = [150.0, 160.0, 170.0, 180.0, 190.0, 200.0, 210.0, 220.0, 230.0, 240.0];
const DEMAND: [f64; 10] = [0.5, 0.9, 0.6, 0.8, 0.7, 0.95, 0.55, 0.75, 0.65, 0.85];

/// Rows that lie exactly on `tickets = a + b * price + c * demand`.
fn linear_history(a: f64, b: f64, c: f64) -> Vec<HistoricalDataPoint> {
    PRICES
        .iter()
        .zip(DEMAND.iter())
        .map(|(&price, &demand)| HistoricalDataPoint {
            date: None,
            tickets_sold: Some(a + b * price + c * demand),
            competitor_price: Some(price),
            demand_index: Some(demand),
        })
        .collect()
}

fn route_store() -> MemoryStore {
    let mut history = HashMap::new();
    // 185 tickets at the reference point (200, 0.85)
    history.insert("JFK-LAX".to_string(), linear_history(300.0, -1.0, 100.0));
    // 58.5 tickets at the reference point
    history.insert("BOS-ORD".to_string(), linear_history(150.0, -0.5, 10.0));
    history.insert(
        "SFO-SEA".to_string(),
        vec![HistoricalDataPoint {
            date: None,
            tickets_sold: Some(40.0),
            competitor_price: Some(180.0),
            demand_index: Some(0.4),
        }],
    );
    MemoryStore {
        history,
        ..Default::default()
    }
}

fn booking(id: i64, flight: &str, status: BookingStatus) -> Booking {
    Booking {
        id,
        flight_number: flight.to_string(),
        status,
        disrupted: false,
        disruption_reason: None,
        is_refunded: false,
        is_rescheduled: false,
        reschedule_flight_number: None,
    }
}

fn booking_store(bookings: Vec<Booking>) -> MemoryStore {
    MemoryStore {
        bookings: Mutex::new(bookings),
        ..Default::default()
    }
}

fn pipeline(store: &Arc<MemoryStore>) -> Pipeline {
    pipeline_with(store, PipelineSettings::default())
}

fn pipeline_with(store: &Arc<MemoryStore>, settings: PipelineSettings) -> Pipeline {
    let repos = Repositories {
        history: store.clone(),
        results: store.clone(),
        customers: store.clone(),
        bookings: store.clone(),
    };
    Pipeline::new(repos, settings)
}

fn report(processed: usize, skipped: usize, failed: usize) -> PipelineReport {
    PipelineReport {
        processed,
        skipped,
        failed,
    }
}

#[tokio::test]
async fn test_forecast_run_stores_one_result_per_route() {
    let store = Arc::new(route_store());

    let result = pipeline(&store)
        .run(Strategy::Forecast, &Target::All)
        .await
        .unwrap();

    // SFO-SEA has a single row and is skipped
    assert_eq!(result, report(2, 1, 0));

    let forecasts = store.forecasts.lock().unwrap();
    assert_eq!(forecasts.len(), 2);
    assert!(forecasts.iter().all(|f| f.optimized_price.is_none()));
    assert!(forecasts.iter().all(|f| f.mean_squared_error < 1e-6));
    assert!(store.prices.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_pricing_run_applies_threshold_rule() {
    let store = Arc::new(route_store());

    let result = pipeline(&store)
        .run(Strategy::Pricing, &Target::All)
        .await
        .unwrap();
    assert_eq!(result, report(2, 1, 0));

    let prices = store.prices.lock().unwrap();
    let price_for = |route: &str| {
        prices
            .iter()
            .find(|p| p.route == route)
            .map(|p| p.optimized_price)
            .unwrap()
    };
    assert_eq!(price_for("JFK-LAX"), 220.0);
    assert_eq!(price_for("BOS-ORD"), 180.0);

    let forecasts = store.forecasts.lock().unwrap();
    let jfk = forecasts.iter().find(|f| f.route == "JFK-LAX").unwrap();
    assert_eq!(jfk.optimized_price, Some(220.0));
}

#[tokio::test]
async fn test_single_route_target() {
    let store = Arc::new(route_store());

    let result = pipeline(&store)
        .run(Strategy::Forecast, &Target::One("BOS-ORD".to_string()))
        .await
        .unwrap();
    assert_eq!(result, report(1, 0, 0));

    let forecasts = store.forecasts.lock().unwrap();
    assert_eq!(forecasts.len(), 1);
    assert_eq!(forecasts[0].route, "BOS-ORD");
}

#[tokio::test]
async fn test_failed_insert_does_not_stop_the_run() {
    let store = Arc::new(MemoryStore {
        broken_route: Some("BOS-ORD".to_string()),
        ..route_store()
    });

    let result = pipeline(&store)
        .run(Strategy::Pricing, &Target::All)
        .await
        .unwrap();
    assert_eq!(result, report(1, 1, 1));

    let forecasts = store.forecasts.lock().unwrap();
    assert_eq!(forecasts.len(), 1);
    assert_eq!(forecasts[0].route, "JFK-LAX");
}

#[tokio::test]
async fn test_history_read_failure_counts_as_failed() {
    let store = Arc::new(MemoryStore {
        unreadable_route: Some("JFK-LAX".to_string()),
        ..route_store()
    });

    let result = pipeline(&store)
        .run(Strategy::Forecast, &Target::All)
        .await
        .unwrap();

    // BOS-ORD stored, JFK-LAX failed, SFO-SEA skipped for lack of data
    assert_eq!(result, report(1, 1, 1));
    assert_eq!(store.forecasts.lock().unwrap()[0].route, "BOS-ORD");
}

#[tokio::test]
async fn test_listing_failure_aborts_every_strategy() {
    let store = Arc::new(MemoryStore {
        offline: true,
        ..route_store()
    });
    let pipeline = pipeline(&store).with_decisions(Arc::new(FixedDecision(Resolution::Refund)));

    for strategy in [
        Strategy::Forecast,
        Strategy::Pricing,
        Strategy::Suggestions,
        Strategy::Disruptions,
    ] {
        let result = pipeline.run(strategy, &Target::All).await;
        assert!(
            matches!(result, Err(PipelineError::Repository(_))),
            "{} should abort",
            strategy
        );
    }
    assert!(store.forecasts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_report_serializes_for_the_summary_line() {
    let json = serde_json::to_value(report(3, 1, 0)).unwrap();
    assert_eq!(json["processed"], 3);
    assert_eq!(json["skipped"], 1);
    assert_eq!(json["failed"], 0);
}

fn profile(name: Option<&str>, email: &str, seat: &str, routes: &str) -> CustomerProfile {
    CustomerProfile {
        name: name.map(str::to_string),
        email: Some(email.to_string()),
        frequent_routes: Some(routes.to_string()),
        seat_preference: Some(seat.to_string()),
        meal_preference: Some("vegetarian".to_string()),
        phone_number: Some("555-0100".to_string().into()),
    }
}

#[tokio::test]
async fn test_suggestions_are_saved_per_named_profile() {
    let store = Arc::new(MemoryStore {
        profiles: vec![
            profile(Some("Ana Lopez"), "ana@example.com", "aisle", "JFK-LAX, BOS-ORD, JFK-LAX"),
            profile(Some("Cher"), "cher@example.com", "window", ""),
            profile(None, "ghost@example.com", "aisle", "JFK-LAX"),
        ],
        ..Default::default()
    });

    let result = pipeline(&store)
        .run(Strategy::Suggestions, &Target::All)
        .await
        .unwrap();
    assert_eq!(result, report(2, 1, 0));

    let suggestions = store.suggestions.lock().unwrap();
    assert_eq!(suggestions.len(), 2);

    let ana = &suggestions[0];
    assert_eq!(ana.first_name, "Ana");
    assert_eq!(ana.most_common_route.as_deref(), Some("JFK-LAX"));
    assert!("ACEGJ".contains(ana.assigned_seat_number.chars().last().unwrap()));

    let cher = &suggestions[1];
    assert_eq!(cher.last_name, "");
    assert_eq!(cher.most_common_route, None);
    assert!("BDFHK".contains(cher.assigned_seat_number.chars().last().unwrap()));
}

#[tokio::test]
async fn test_suggestions_for_one_email() {
    let store = Arc::new(MemoryStore {
        profiles: vec![
            profile(Some("Ana Lopez"), "ana@example.com", "aisle", "JFK-LAX"),
            profile(Some("Bo Chen"), "bo@example.com", "window", "BOS-ORD"),
        ],
        ..Default::default()
    });

    let result = pipeline(&store)
        .run(Strategy::Suggestions, &Target::One("bo@example.com".to_string()))
        .await
        .unwrap();
    assert_eq!(result, report(1, 0, 0));
    assert_eq!(store.suggestions.lock().unwrap()[0].first_name, "Bo");
}

#[tokio::test]
async fn test_refund_marks_booking_and_writes_log() {
    let store = Arc::new(booking_store(vec![
        booking(1, "MZ101", BookingStatus::Delayed),
        booking(2, "MZ202", BookingStatus::Other("Confirmed".to_string())),
    ]));
    let notifier = Arc::new(RecordingNotifier::default());

    let result = pipeline(&store)
        .with_notifier(notifier.clone())
        .with_decisions(Arc::new(FixedDecision(Resolution::Refund)))
        .run(Strategy::Disruptions, &Target::All)
        .await
        .unwrap();
    assert_eq!(result, report(1, 1, 0));

    let refunded = store.booking(1);
    assert!(refunded.disrupted);
    assert!(refunded.is_refunded);
    assert_eq!(refunded.status, BookingStatus::Refunded);
    assert_eq!(
        refunded.disruption_reason.as_deref(),
        Some("Flight status changed to Delayed")
    );

    let untouched = store.booking(2);
    assert!(!untouched.disrupted);

    let logs = store.logs.lock().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, BookingStatus::Refunded);
    assert_eq!(logs[0].user_decision, "Withdrawn");
    assert_eq!(logs[0].disruption_reason, "User withdrew ticket.");

    let sent = notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], ("MZ101".to_string(), "Delayed".to_string()));
}

#[tokio::test]
async fn test_reschedule_moves_booking_to_configured_flight() {
    let store = Arc::new(booking_store(vec![booking(
        3,
        "MZ303",
        BookingStatus::Cancelled,
    )]));

    let result = pipeline(&store)
        .with_decisions(Arc::new(FixedDecision(Resolution::Reschedule)))
        .run(Strategy::Disruptions, &Target::All)
        .await
        .unwrap();
    assert_eq!(result, report(1, 0, 0));

    let rescheduled = store.booking(3);
    assert!(rescheduled.is_rescheduled);
    assert_eq!(rescheduled.reschedule_flight_number.as_deref(), Some("NEW123"));
    assert_eq!(
        store.logs.lock().unwrap()[0].user_decision,
        "Rescheduled to NEW123"
    );
}

#[tokio::test]
async fn test_invalid_answer_leaves_booking_disrupted() {
    let store = Arc::new(booking_store(vec![booking(
        4,
        "MZ404",
        BookingStatus::Delayed,
    )]));
    let prompt = TerminalPrompt::new(std::io::Cursor::new("maybe\n"), Vec::new());

    let result = pipeline(&store)
        .with_decisions(Arc::new(prompt))
        .run(Strategy::Disruptions, &Target::All)
        .await
        .unwrap();
    assert_eq!(result, report(0, 1, 0));

    let booking = store.booking(4);
    assert!(booking.disrupted);
    assert!(!booking.is_refunded && !booking.is_rescheduled);
    assert!(store.logs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_resolved_bookings_are_left_alone() {
    let mut refunded = booking(5, "MZ505", BookingStatus::Cancelled);
    refunded.disrupted = true;
    refunded.is_refunded = true;
    let store = Arc::new(booking_store(vec![
        refunded.clone(),
        booking(6, "MZ606", BookingStatus::Rescheduled),
    ]));

    let result = pipeline(&store)
        .with_decisions(Arc::new(FixedDecision(Resolution::Refund)))
        .run(Strategy::Disruptions, &Target::All)
        .await
        .unwrap();
    assert_eq!(result, report(0, 2, 0));
    assert_eq!(store.booking(5), refunded);
    assert!(store.logs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_disruptions_for_one_flight() {
    let store = Arc::new(booking_store(vec![
        booking(7, "MZ707", BookingStatus::Delayed),
        booking(8, "MZ808", BookingStatus::Delayed),
    ]));

    let result = pipeline(&store)
        .with_decisions(Arc::new(FixedDecision(Resolution::Refund)))
        .run(Strategy::Disruptions, &Target::One("MZ808".to_string()))
        .await
        .unwrap();
    assert_eq!(result, report(1, 0, 0));
    assert!(!store.booking(7).is_refunded);
    assert!(store.booking(8).is_refunded);
}

#[tokio::test]
async fn test_reschedule_without_alternative_keeps_booking_disrupted() {
    let store = Arc::new(booking_store(vec![booking(
        9,
        "MZ909",
        BookingStatus::Cancelled,
    )]));
    let settings = PipelineSettings {
        disruption: DisruptionConfig {
            reschedule_flight: None,
        },
        ..PipelineSettings::default()
    };

    let result = pipeline_with(&store, settings)
        .with_decisions(Arc::new(FixedDecision(Resolution::Reschedule)))
        .run(Strategy::Disruptions, &Target::All)
        .await
        .unwrap();
    assert_eq!(result, report(0, 1, 0));

    let booking = store.booking(9);
    assert!(booking.disrupted);
    assert!(!booking.is_rescheduled);
    assert_eq!(booking.reschedule_flight_number, None);
    assert!(store.logs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_rerun_does_not_notify_twice() {
    let store = Arc::new(booking_store(vec![booking(
        10,
        "MZ110",
        BookingStatus::Delayed,
    )]));
    let notifier = Arc::new(RecordingNotifier::default());
    let prompt = TerminalPrompt::new(std::io::Cursor::new("x\nx\n"), Vec::new());
    let pipeline = pipeline(&store)
        .with_notifier(notifier.clone())
        .with_decisions(Arc::new(prompt));

    for _ in 0..2 {
        let result = pipeline
            .run(Strategy::Disruptions, &Target::All)
            .await
            .unwrap();
        assert_eq!(result, report(0, 1, 0));
    }

    let sent = notifier.sent.lock().unwrap();
    assert_eq!(*sent, vec![("MZ110".to_string(), "Delayed".to_string())]);
    assert!(store.booking(10).disrupted);
}
