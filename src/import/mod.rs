//! Batch import of recorded track files.
//!
//! Replays the ride physics over a static, time-sorted point sequence to
//! produce one finished ride in a single pass. The importer bypasses the
//! live state machine entirely; the ride spans the file's own timestamps.

pub mod gpx;

use crate::physics;
use crate::storage::database::{Database, DatabaseError};
use crate::telemetry::types::{Ride, TrackPoint};
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Batch moving classification threshold in m/s.
///
/// Intentionally lower than the live loop's 3.0 km/h threshold
/// (`telemetry::tracker::LIVE_MOVING_MIN_KPH`); recorded files are usually
/// pre-filtered by the recording device.
pub const IMPORT_MOVING_MIN_MS: f64 = 0.5;

/// Elevation gain hysteresis applied per consecutive pair, in meters.
const IMPORT_ELEVATION_THRESHOLD_M: f64 = 1.5;

/// Assumed average power for imported files, which carry no power data.
const ASSUMED_IMPORT_AVG_WATTS: f64 = 150.0;

/// One raw point parsed from a track file.
#[derive(Debug, Clone, Copy)]
pub struct GpsPoint {
    /// GPS latitude
    pub latitude: f64,
    /// GPS longitude
    pub longitude: f64,
    /// Elevation in meters
    pub elevation_m: f64,
    /// Point timestamp
    pub timestamp: DateTime<Utc>,
}

/// Errors during track import.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The file yielded no usable points
    #[error("Track file contained no usable points")]
    EmptyImport,

    /// The file could not be parsed
    #[error("Failed to parse track file: {0}")]
    ParseError(String),

    /// The store rejected the import; nothing was written
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Import a GPX track file, returning the created ride's id.
///
/// The ride and all its points are committed in a single transaction; a
/// failure leaves no partial ride behind.
pub fn import_gpx(content: &[u8], database: &mut Database) -> Result<Uuid, ImportError> {
    let mut points = gpx::parse_gpx(content)?;
    if points.is_empty() {
        return Err(ImportError::EmptyImport);
    }

    // Stabilize against out-of-order file data
    points.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    let (ride, track_points) = replay_points(&points);
    if track_points.is_empty() {
        return Err(ImportError::EmptyImport);
    }

    database.insert_imported_ride(&ride, &track_points)?;

    tracing::info!(
        ride_id = %ride.id,
        distance_km = ride.distance_km,
        points = track_points.len(),
        "Imported track file"
    );

    Ok(ride.id)
}

/// Walk consecutive point pairs, accumulating ride totals and emitting one
/// track point per moving pair.
fn replay_points(points: &[GpsPoint]) -> (Ride, Vec<TrackPoint>) {
    let first = &points[0];
    let last = &points[points.len() - 1];

    let mut ride = Ride::new(first.timestamp);
    ride.ended_at = Some(last.timestamp);
    ride.elapsed_time_seconds =
        (last.timestamp - first.timestamp).num_milliseconds() as f64 / 1000.0;

    let mut track_points = Vec::new();

    for pair in points.windows(2) {
        let (prev, point) = (&pair[0], &pair[1]);

        let dt = (point.timestamp - prev.timestamp).num_milliseconds() as f64 / 1000.0;
        let dist_km = physics::haversine_km(
            prev.latitude,
            prev.longitude,
            point.latitude,
            point.longitude,
        );
        let speed_ms = if dt > 0.0 { dist_km * 1000.0 / dt } else { 0.0 };

        if speed_ms <= IMPORT_MOVING_MIN_MS {
            continue;
        }

        ride.distance_km += dist_km;
        ride.moving_time_seconds += dt;

        let ele_diff = point.elevation_m - prev.elevation_m;
        if ele_diff > IMPORT_ELEVATION_THRESHOLD_M {
            ride.elevation_gain_m += ele_diff;
        }

        // Every pair is a grade boundary here; file data is already
        // spatially coarse enough that no checkpoint gating is needed.
        let grade = if dist_km > 0.0 {
            ele_diff / (dist_km * 1000.0)
        } else {
            0.0
        };
        let watts = physics::power_watts(speed_ms, grade);

        let speed_kph = speed_ms * 3.6;
        ride.max_speed_kph = ride.max_speed_kph.max(speed_kph);

        track_points.push(TrackPoint {
            ride_id: ride.id,
            timestamp: point.timestamp.timestamp_millis() as f64 / 1000.0,
            latitude: point.latitude,
            longitude: point.longitude,
            altitude_m: point.elevation_m,
            speed_ms,
            power_watts: watts,
        });
    }

    if ride.moving_time_seconds > 0.0 {
        ride.avg_speed_kph = ride.distance_km / (ride.moving_time_seconds / 3600.0);
    }

    // Imported files carry no power trace; estimate from an assumed
    // steady effort instead of the absent sensor data.
    ride.calories = physics::calories_kcal(ASSUMED_IMPORT_AVG_WATTS, ride.moving_time_seconds);

    (ride, track_points)
}
