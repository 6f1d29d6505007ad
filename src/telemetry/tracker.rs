//! Ride tracker: the recording core of the telemetry loop.
//!
//! Owns the state machine, the smoothing filters, the checkpoint state, and
//! the persistence buffer. The async engine feeds it one fix per cycle;
//! everything in here is synchronous so the whole recording path can be
//! driven deterministically in tests.

use crate::location::Fix;
use crate::metrics::smoothing::{AltitudeWindow, ElevationGainFilter, GradeFilter};
use crate::physics;
use crate::storage::database::Database;
use crate::telemetry::state::{ControlAction, RideState, RideStatus};
use crate::telemetry::types::{LiveSnapshot, Ride, SignalStatus, TrackPoint};
use chrono::Utc;
use std::sync::{Arc, Mutex, PoisonError};

/// Track points buffered in memory before a batch write.
pub const POINT_BUFFER_CAPACITY: usize = 5;

/// Elapsed time between samples is capped at this many seconds so a
/// provider dropout cannot inflate moving time or distance.
pub const MAX_SAMPLE_GAP_S: f64 = 2.0;

/// Live-loop moving classification threshold in km/h.
///
/// Intentionally differs from the batch importer's 0.5 m/s threshold
/// (see `import::IMPORT_MOVING_MIN_MS`); file data is typically
/// pre-filtered, live GPS speed is not.
pub const LIVE_MOVING_MIN_KPH: f64 = 3.0;

const MS_TO_KPH: f64 = 3.6;

/// Last fused point accepted as a distance/time baseline.
#[derive(Debug, Clone, Copy)]
struct FusedPoint {
    lat: f64,
    lon: f64,
    timestamp: f64,
}

/// The recording core: state machine, smoothers, checkpoints, buffer.
pub struct RideTracker {
    /// Database for persistence
    database: Arc<Mutex<Database>>,
    /// Recording state machine
    state: RideState,
    /// Active ride totals, mirrored to the store once per accepted sample
    current_ride: Option<Ride>,
    /// Raw altitude window
    altitude: AltitudeWindow,
    /// Grade checkpoint filter
    grade: GradeFilter,
    /// Elevation gain hysteresis filter
    elevation: ElevationGainFilter,
    /// Last valid fused point
    last_valid_point: Option<FusedPoint>,
    /// Track points awaiting a batch write
    point_buffer: Vec<TrackPoint>,
}

impl RideTracker {
    /// Create a new tracker against the given database.
    pub fn new(database: Arc<Mutex<Database>>) -> Self {
        Self {
            database,
            state: RideState::new(),
            current_ride: None,
            altitude: AltitudeWindow::five_sample(),
            grade: GradeFilter::new(),
            elevation: ElevationGainFilter::new(),
            last_valid_point: None,
            point_buffer: Vec::with_capacity(POINT_BUFFER_CAPACITY),
        }
    }

    /// Get the current recording status.
    pub fn status(&self) -> RideStatus {
        self.state.status()
    }

    /// Get the active ride id, if any.
    pub fn active_ride(&self) -> Option<uuid::Uuid> {
        self.state.active_ride()
    }

    /// Number of track points currently buffered.
    pub fn buffered_points(&self) -> usize {
        self.point_buffer.len()
    }

    /// Apply one control action.
    ///
    /// Actions arriving in an inapplicable state are no-ops.
    pub fn apply(&mut self, action: ControlAction) {
        match action {
            ControlAction::Start => self.handle_start(),
            ControlAction::Pause => {
                self.state.on_pause();
            }
            ControlAction::Resume => {
                self.state.on_resume();
            }
            ControlAction::Stop => self.handle_stop(),
        }
    }

    fn handle_start(&mut self) {
        if self.state.status() != RideStatus::Idle {
            tracing::warn!(status = ?self.state.status(), "Ignoring start while not idle");
            return;
        }

        let ride = Ride::new(Utc::now());
        let insert = self
            .database
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert_ride(&ride);
        if let Err(e) = insert {
            tracing::error!(error = %e, "Could not create ride row, staying idle");
            return;
        }

        // Fresh ride, fresh smoothing baselines
        self.altitude.reset();
        self.grade.reset();
        self.elevation.reset();
        self.last_valid_point = None;
        self.point_buffer.clear();

        self.state.on_start(ride.id);
        self.current_ride = Some(ride);
    }

    fn handle_stop(&mut self) {
        let Some(ride_id) = self.state.on_stop() else {
            return;
        };

        // Buffered points land before the finalization commit, so stopping
        // never loses accepted samples.
        if let Err(e) = self.flush_buffer() {
            tracing::error!(error = %e, "Buffer flush on stop failed, {} points not persisted", self.point_buffer.len());
        }

        let Some(mut ride) = self.current_ride.take() else {
            tracing::error!(%ride_id, "No in-memory ride to finalize");
            return;
        };

        let ended_at = Utc::now();
        ride.ended_at = Some(ended_at);
        ride.elapsed_time_seconds = (ended_at - ride.started_at).num_milliseconds() as f64 / 1000.0;
        ride.calories =
            physics::calories_kcal(ride.avg_power_watts as f64, ride.moving_time_seconds);
        if ride.moving_time_seconds > 0.0 {
            ride.avg_speed_kph = ride.distance_km / (ride.moving_time_seconds / 3600.0);
        }

        let update = self
            .database
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .update_ride(&ride);
        if let Err(e) = update {
            tracing::error!(ride_id = %ride.id, error = %e, "Ride finalization commit failed");
        }
    }

    /// Process one fix at the given epoch timestamp, returning the snapshot
    /// to broadcast.
    pub fn process_fix(&mut self, fix: &Fix, now: f64) -> LiveSnapshot {
        let smoothed_alt = self.altitude.add(fix.altitude);
        let speed_kph = fix.speed * MS_TO_KPH;

        let mut snapshot = LiveSnapshot {
            lat: fix.latitude,
            lon: fix.longitude,
            speed_kph,
            bearing: fix.bearing,
            dist_km: 0.0,
            power_watts: 0,
            moving_time_seconds: 0.0,
            status: SignalStatus::Connected,
            recording: self.state.active_ride().is_some(),
            paused: self.state.is_paused(),
        };

        if self.state.is_recording() {
            self.process_recording_sample(fix, now, smoothed_alt, speed_kph, &mut snapshot);
        } else {
            // Idle or paused: keep the distance/time baseline fresh so the
            // first sample after (re)starting doesn't span the gap.
            self.last_valid_point = Some(FusedPoint {
                lat: fix.latitude,
                lon: fix.longitude,
                timestamp: now,
            });
        }

        snapshot
    }

    fn process_recording_sample(
        &mut self,
        fix: &Fix,
        now: f64,
        smoothed_alt: f64,
        speed_kph: f64,
        snapshot: &mut LiveSnapshot,
    ) {
        let dt = self
            .last_valid_point
            .map(|p| (now - p.timestamp).clamp(0.0, MAX_SAMPLE_GAP_S))
            .unwrap_or(0.0);
        let dist_delta_km = self
            .last_valid_point
            .map(|p| physics::haversine_km(p.lat, p.lon, fix.latitude, fix.longitude))
            .unwrap_or(0.0);

        let grade = self.grade.update(fix.latitude, fix.longitude, smoothed_alt);
        let elev_delta = self.elevation.update(smoothed_alt);

        if speed_kph <= LIVE_MOVING_MIN_KPH {
            snapshot.status = SignalStatus::StationaryAutoPause;
            return;
        }

        let Some(ride) = self.current_ride.as_mut() else {
            tracing::error!("Recording without an active ride");
            return;
        };

        let watts = physics::power_watts(fix.speed, grade);

        ride.distance_km += dist_delta_km;
        ride.moving_time_seconds += dt;
        ride.elevation_gain_m += elev_delta;
        ride.max_speed_kph = ride.max_speed_kph.max(speed_kph);
        ride.update_avg_power(watts);

        snapshot.dist_km = ride.distance_km;
        snapshot.power_watts = watts;
        snapshot.moving_time_seconds = ride.moving_time_seconds;

        // Single-row commit per accepted sample; on failure the in-memory
        // totals remain authoritative and the next sample retries.
        let update = self
            .database
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .update_ride(ride);
        if let Err(e) = update {
            tracing::warn!(ride_id = %ride.id, error = %e, "Ride update commit failed, keeping in-memory totals");
        }

        self.point_buffer.push(TrackPoint {
            ride_id: ride.id,
            timestamp: now,
            latitude: fix.latitude,
            longitude: fix.longitude,
            altitude_m: smoothed_alt,
            speed_ms: fix.speed,
            power_watts: watts,
        });

        self.last_valid_point = Some(FusedPoint {
            lat: fix.latitude,
            lon: fix.longitude,
            timestamp: now,
        });

        if self.point_buffer.len() >= POINT_BUFFER_CAPACITY {
            if let Err(e) = self.flush_buffer() {
                tracing::warn!(error = %e, "Point buffer flush failed, retrying next batch");
            }
        }
    }

    /// Flush buffered track points to the store as one batch.
    ///
    /// The buffer is retained on failure so a later flush can retry.
    pub fn flush_buffer(&mut self) -> Result<(), crate::storage::DatabaseError> {
        if self.point_buffer.is_empty() {
            return Ok(());
        }

        self.database
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert_track_points(&self.point_buffer)?;

        tracing::debug!(points = self.point_buffer.len(), "Flushed point buffer");
        self.point_buffer.clear();
        Ok(())
    }
}
