//! Telemetry engine: the sampling cadence loop.
//!
//! One cycle = drain pending control actions, acquire a fix (primary, then
//! fallback), feed the tracker, broadcast the snapshot, then sleep whatever
//! is left of the cycle period. Provider failures skip the cycle; nothing
//! short of process shutdown stops the loop.

use crate::location::{Fix, LocationProvider, ProviderSource};
use crate::storage::database::Database;
use crate::telemetry::state::ControlAction;
use crate::telemetry::tracker::RideTracker;
use crate::telemetry::types::LiveSnapshot;
use chrono::Utc;
use crossbeam::channel::{Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::broadcast;

/// Sleep floor per cycle; a slow cycle never spins but also never starves
/// the next poll indefinitely.
const MIN_CYCLE_SLEEP: Duration = Duration::from_millis(100);

/// Broadcast channel depth for live snapshots.
const SNAPSHOT_CHANNEL_CAPACITY: usize = 100;

/// Errors from the control surface.
#[derive(Debug, Error)]
pub enum ControlError {
    /// The engine loop is no longer running
    #[error("Telemetry engine is not running")]
    EngineStopped,
}

/// Handle for controlling and observing a running engine.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    control_tx: Sender<ControlAction>,
    snapshot_tx: broadcast::Sender<LiveSnapshot>,
}

impl EngineHandle {
    /// Submit a control action; it takes effect at the next cycle boundary.
    pub fn control(&self, action: ControlAction) -> Result<(), ControlError> {
        self.control_tx
            .send(action)
            .map_err(|_| ControlError::EngineStopped)
    }

    /// Subscribe to live snapshots, one per cycle with a usable fix.
    ///
    /// Receivers that fall behind or disconnect drop out of the channel on
    /// their own; the engine never blocks on a subscriber.
    pub fn subscribe(&self) -> broadcast::Receiver<LiveSnapshot> {
        self.snapshot_tx.subscribe()
    }
}

/// The sampling cadence loop driving all ride-state mutation.
pub struct TelemetryEngine<P: LocationProvider> {
    provider: P,
    tracker: RideTracker,
    control_rx: Receiver<ControlAction>,
    snapshot_tx: broadcast::Sender<LiveSnapshot>,
    cycle_period: Duration,
}

impl<P: LocationProvider> TelemetryEngine<P> {
    /// Create an engine and its control handle.
    pub fn new(
        provider: P,
        database: Arc<Mutex<Database>>,
        cycle_period: Duration,
    ) -> (Self, EngineHandle) {
        let (control_tx, control_rx) = crossbeam::channel::unbounded();
        let (snapshot_tx, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);

        let handle = EngineHandle {
            control_tx,
            snapshot_tx: snapshot_tx.clone(),
        };

        let engine = Self {
            provider,
            tracker: RideTracker::new(database),
            control_rx,
            snapshot_tx,
            cycle_period,
        };

        (engine, handle)
    }

    /// Access the tracker (for tests and status queries).
    pub fn tracker(&self) -> &RideTracker {
        &self.tracker
    }

    /// Run the loop until the process shuts down.
    pub async fn run(mut self) {
        tracing::info!(period = ?self.cycle_period, "Telemetry loop started");

        loop {
            let cycle_started = Instant::now();
            self.run_cycle().await;

            let elapsed = cycle_started.elapsed();
            let sleep = self
                .cycle_period
                .saturating_sub(elapsed)
                .max(MIN_CYCLE_SLEEP);
            tokio::time::sleep(sleep).await;
        }
    }

    /// Execute one cycle: apply control, poll, process, broadcast.
    pub async fn run_cycle(&mut self) {
        // Control actions apply exactly at the cycle boundary; the cycle
        // body reads one consistent state snapshot.
        while let Ok(action) = self.control_rx.try_recv() {
            tracing::debug!(%action, "Applying control action");
            self.tracker.apply(action);
        }

        let Some(fix) = self.acquire_fix().await else {
            // No usable fix: skip processing and broadcast nothing.
            return;
        };

        let now = Utc::now().timestamp_millis() as f64 / 1000.0;
        let snapshot = self.tracker.process_fix(&fix, now);

        // Send only fails when nobody is subscribed.
        let _ = self.snapshot_tx.send(snapshot);
    }

    /// Poll the primary source, falling back to the network source.
    async fn acquire_fix(&self) -> Option<Fix> {
        match self.provider.poll(ProviderSource::Primary).await {
            Ok(fix) => Some(fix),
            Err(primary_err) => {
                tracing::debug!(error = %primary_err, "Primary fix failed, trying fallback");
                match self.provider.poll(ProviderSource::Fallback).await {
                    Ok(fix) => Some(fix),
                    Err(fallback_err) => {
                        tracing::debug!(error = %fallback_err, "No fix this cycle");
                        None
                    }
                }
            }
        }
    }
}
