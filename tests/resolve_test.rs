// =============================================================================
// End-to-end resolution through the public API, with stub couriers.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use parcel_track_engine::{
    merge_parcels, Config, Dispatcher, FetchContext, FetchError, ParcelEvent, ParcelInfo,
    Provider, Registry, ResolveError, TrackingPattern,
};

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, d, 12, 0, 0).unwrap()
}

fn midnight(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
}

/// A courier that answers with a canned record, or fails.
struct Canned {
    name: &'static str,
    domain: &'static str,
    pattern: TrackingPattern,
    answer: Option<ParcelInfo>,
}

impl Canned {
    fn ok(name: &'static str, pattern: &str, answer: ParcelInfo) -> Arc<dyn Provider> {
        Arc::new(Self {
            name,
            domain: "example.test",
            pattern: TrackingPattern::new(pattern).unwrap(),
            answer: Some(answer),
        })
    }

    fn failing(name: &'static str, pattern: &str) -> Arc<dyn Provider> {
        Arc::new(Self {
            name,
            domain: "broken.test",
            pattern: TrackingPattern::new(pattern).unwrap(),
            answer: None,
        })
    }
}

#[async_trait]
impl Provider for Canned {
    fn name(&self) -> &str {
        self.name
    }

    fn origin_domain(&self) -> &str {
        self.domain
    }

    fn pattern(&self) -> &TrackingPattern {
        &self.pattern
    }

    async fn fetch(
        &self,
        _tracking_number: &str,
        _ctx: &FetchContext,
    ) -> Result<ParcelInfo, FetchError> {
        match &self.answer {
            Some(parcel) => Ok(parcel.clone()),
            None => Err(FetchError::Status {
                provider: self.name.to_string(),
                status: 503,
            }),
        }
    }
}

fn record(provider: &str, origin: &str, days: &[u32]) -> ParcelInfo {
    let mut parcel = ParcelInfo::new();
    parcel.origin = origin.to_string();
    parcel.extend_events(
        days.iter()
            .map(|d| ParcelEvent::new(provider, day(*d), None, format!("{} day {}", provider, d)))
            .collect::<Vec<_>>(),
    );
    parcel
}

fn dispatcher(registry: Registry) -> Dispatcher {
    Dispatcher::new(Arc::new(registry), &Config::default())
        .with_fetch_timeout(Some(Duration::from_secs(5)))
}

#[tokio::test]
async fn test_unknown_number_finds_no_provider() {
    let registry = Registry::builder()
        .register(Canned::ok("Digits", "[0-9]{11}", ParcelInfo::new()))
        .build();

    let err = dispatcher(registry).resolve("not-a-number").await.unwrap_err();
    assert!(matches!(err, ResolveError::NoProviderFound { .. }));
}

#[tokio::test]
async fn test_bulgarian_parcel_newest_event_first() {
    let mut answer = ParcelInfo::new();
    answer.destination = "Bulgaria".to_string();
    answer.extend_events(vec![
        ParcelEvent::new("Speedy", midnight(10), None, "Accepted"),
        ParcelEvent::new("Speedy", midnight(12), None, "Delivered"),
    ]);
    let registry = Registry::builder()
        .register(Canned::ok("Speedy", "^[0-9]{11}$", answer))
        .build();

    let parcel = dispatcher(registry).resolve("12345678901").await.unwrap();
    assert_eq!(parcel.destination, "Bulgaria");
    assert_eq!(parcel.events().len(), 2);
    assert_eq!(
        parcel.events()[0].timestamp().date_naive(),
        chrono::NaiveDate::from_ymd_opt(2024, 1, 12).unwrap()
    );
}

#[tokio::test]
async fn test_one_failure_out_of_three_is_tolerated() {
    let registry = Registry::builder()
        .register(Canned::ok("First", "[0-9]{11}", record("First", "CN", &[1, 3])))
        .register(Canned::failing("Broken", "[0-9]{11}"))
        .register(Canned::ok("Third", "[0-9]{11}", record("Third", "BG", &[2])))
        .build();

    let dispatcher = dispatcher(registry);
    let parcel = dispatcher.resolve("12345678901").await.unwrap();

    assert_eq!(parcel.events().len(), 3);
    assert!(parcel
        .events()
        .iter()
        .all(|e| e.provider_name() == "First" || e.provider_name() == "Third"));

    let stats = dispatcher.metrics().snapshot();
    assert_eq!(stats.provider_fetches, 3);
    assert_eq!(stats.provider_failures, 1);
}

#[tokio::test]
async fn test_everyone_failing_is_an_error() {
    let registry = Registry::builder()
        .register(Canned::failing("A", "[0-9]{11}"))
        .register(Canned::failing("B", "[0-9]{11}"))
        .build();

    match dispatcher(registry).resolve("12345678901").await {
        Err(ResolveError::AllProvidersFailed { failures, .. }) => {
            let names: Vec<&str> = failures.iter().map(|(name, _)| name.as_str()).collect();
            assert_eq!(names, vec!["A", "B"]);
        }
        other => panic!("expected AllProvidersFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_first_registered_provider_wins_origin() {
    let registry = Registry::builder()
        .register(Canned::ok("Early", "[0-9]{11}", record("Early", "China", &[1])))
        .register(Canned::ok("Late", "[0-9]{11}", record("Late", "Bulgaria", &[2])))
        .build();

    let parcel = dispatcher(registry).resolve("12345678901").await.unwrap();
    assert_eq!(parcel.origin, "China");
    assert_eq!(parcel.events().len(), 2);
}

#[test]
fn test_merge_precedence_follows_input_order() {
    let mut r1 = ParcelInfo::new();
    r1.destination = "A".to_string();
    let mut r2 = ParcelInfo::new();
    r2.destination = "B".to_string();

    assert_eq!(merge_parcels(&[r1.clone(), r2.clone()]).destination, "A");
    assert_eq!(merge_parcels(&[r2, r1]).destination, "B");
}

#[test]
fn test_merging_one_record_changes_nothing() {
    let mut parcel = record("Solo", "CN", &[4, 9, 2]);
    parcel.tracking_numbers.push("12345678901".to_string());
    parcel.weight_kg = 1.25;

    assert_eq!(merge_parcels(std::slice::from_ref(&parcel)), parcel);
}
