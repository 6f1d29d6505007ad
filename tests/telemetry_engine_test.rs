//! Integration tests for the telemetry engine cycle.
//!
//! Uses a scripted location provider to exercise the poll-fallback chain,
//! the control channel, and the snapshot broadcast.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use veloride::location::{Fix, LocationError, LocationProvider, ProviderSource};
use veloride::storage::Database;
use veloride::telemetry::state::{ControlAction, RideStatus};
use veloride::telemetry::types::SignalStatus;
use veloride::telemetry::TelemetryEngine;

/// Location provider that replays scripted poll results per source.
struct ScriptedProvider {
    primary: Mutex<VecDeque<Result<Fix, LocationError>>>,
    fallback: Mutex<VecDeque<Result<Fix, LocationError>>>,
}

impl ScriptedProvider {
    fn new() -> Self {
        Self {
            primary: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(VecDeque::new()),
        }
    }

    fn push_primary(&self, result: Result<Fix, LocationError>) {
        self.primary.lock().unwrap().push_back(result);
    }

    fn push_fallback(&self, result: Result<Fix, LocationError>) {
        self.fallback.lock().unwrap().push_back(result);
    }
}

impl LocationProvider for ScriptedProvider {
    async fn poll(&self, source: ProviderSource) -> Result<Fix, LocationError> {
        let queue = match source {
            ProviderSource::Primary => &self.primary,
            ProviderSource::Fallback => &self.fallback,
        };
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LocationError::Timeout))
    }
}

fn good_fix() -> Fix {
    Fix {
        latitude: 48.2082,
        longitude: 16.3738,
        altitude: 171.0,
        speed: 0.0,
        bearing: 10.0,
    }
}

fn setup(provider: ScriptedProvider) -> (TelemetryEngine<ScriptedProvider>, veloride::EngineHandle) {
    let database = Arc::new(Mutex::new(Database::open_in_memory().unwrap()));
    TelemetryEngine::new(provider, database, Duration::from_secs(1))
}

#[tokio::test]
async fn test_primary_fix_is_broadcast() {
    let provider = ScriptedProvider::new();
    provider.push_primary(Ok(good_fix()));

    let (mut engine, handle) = setup(provider);
    let mut snapshots = handle.subscribe();

    engine.run_cycle().await;

    let snapshot = snapshots.try_recv().unwrap();
    assert!((snapshot.lat - 48.2082).abs() < 1e-9);
    assert_eq!(snapshot.status, SignalStatus::Connected);
    assert!(!snapshot.recording);
}

#[tokio::test]
async fn test_fallback_covers_primary_failure() {
    let provider = ScriptedProvider::new();
    provider.push_primary(Err(LocationError::Timeout));
    provider.push_fallback(Ok(good_fix()));

    let (mut engine, handle) = setup(provider);
    let mut snapshots = handle.subscribe();

    engine.run_cycle().await;

    assert!(snapshots.try_recv().is_ok());
}

#[tokio::test]
async fn test_fixless_cycle_broadcasts_nothing() {
    let provider = ScriptedProvider::new();
    provider.push_primary(Err(LocationError::Timeout));
    provider.push_fallback(Err(LocationError::ProviderFailed));

    let (mut engine, handle) = setup(provider);
    let mut snapshots = handle.subscribe();

    engine.run_cycle().await;

    assert!(snapshots.try_recv().is_err());
}

#[tokio::test]
async fn test_control_applies_at_cycle_boundary() {
    let provider = ScriptedProvider::new();
    provider.push_primary(Ok(good_fix()));
    provider.push_primary(Ok(good_fix()));

    let (mut engine, handle) = setup(provider);

    handle.control(ControlAction::Start).unwrap();
    assert_eq!(engine.tracker().status(), RideStatus::Idle);

    engine.run_cycle().await;
    assert_eq!(engine.tracker().status(), RideStatus::Recording);

    handle.control(ControlAction::Stop).unwrap();
    engine.run_cycle().await;
    assert_eq!(engine.tracker().status(), RideStatus::Idle);
}

#[tokio::test]
async fn test_malformed_fix_skips_cycle() {
    let provider = ScriptedProvider::new();
    provider.push_primary(Err(LocationError::MalformedFix("no coordinates".into())));
    provider.push_fallback(Err(LocationError::MalformedFix("no coordinates".into())));

    let (mut engine, handle) = setup(provider);
    let mut snapshots = handle.subscribe();

    engine.run_cycle().await;

    assert!(snapshots.try_recv().is_err());
}
