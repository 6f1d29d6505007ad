//! Database operations using rusqlite.
//!
//! Ride rows live in `rides`, accepted samples in `track_points`. The
//! telemetry loop commits ride updates one row at a time and track points in
//! buffered batches; the importer persists a whole ride atomically.

use crate::telemetry::types::{Ride, TrackPoint};
use crate::storage::schema::{CURRENT_VERSION, SCHEMA, SCHEMA_VERSION_TABLE};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

/// Database wrapper for SQLite operations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create a database at the given path.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::IoError(e.to_string()))?;
        }

        let conn =
            Connection::open(path).map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let db = Self { conn };
        db.initialize()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let db = Self { conn };
        db.initialize()?;

        Ok(db)
    }

    /// Initialize the database schema.
    fn initialize(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(SCHEMA_VERSION_TABLE)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

        let current_version = self.get_schema_version()?;

        if current_version < CURRENT_VERSION {
            self.migrate(current_version)?;
        }

        Ok(())
    }

    /// Get the current schema version.
    fn get_schema_version(&self) -> Result<i32, DatabaseError> {
        let result: SqliteResult<i32> = self.conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        );

        match result {
            Ok(version) => Ok(version),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
            Err(e) => Err(DatabaseError::QueryFailed(e.to_string())),
        }
    }

    /// Run database migrations.
    fn migrate(&self, from_version: i32) -> Result<(), DatabaseError> {
        if from_version < 1 {
            self.conn
                .execute_batch(SCHEMA)
                .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

            self.conn
                .execute(
                    "INSERT INTO schema_version (version, applied_at) VALUES (?, datetime('now'))",
                    [CURRENT_VERSION],
                )
                .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

            tracing::info!("Database migrated to version {}", CURRENT_VERSION);
        }

        Ok(())
    }

    // ========== Ride operations ==========

    /// Insert a new ride.
    pub fn insert_ride(&self, ride: &Ride) -> Result<(), DatabaseError> {
        self.conn
            .execute(
                "INSERT INTO rides (id, started_at, ended_at, distance_km, moving_time_seconds,
                 elapsed_time_seconds, elevation_gain_m, calories, avg_speed_kph, max_speed_kph,
                 avg_power_watts)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                ride_params(ride),
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    /// Update an existing ride's totals in a single-row commit.
    pub fn update_ride(&self, ride: &Ride) -> Result<(), DatabaseError> {
        let rows_affected = self
            .conn
            .execute(
                "UPDATE rides SET started_at = ?2, ended_at = ?3, distance_km = ?4,
                 moving_time_seconds = ?5, elapsed_time_seconds = ?6, elevation_gain_m = ?7,
                 calories = ?8, avg_speed_kph = ?9, max_speed_kph = ?10, avg_power_watts = ?11
                 WHERE id = ?1",
                ride_params(ride),
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        if rows_affected == 0 {
            return Err(DatabaseError::NotFound(format!("Ride {}", ride.id)));
        }

        Ok(())
    }

    /// Get a ride by ID.
    pub fn get_ride(&self, id: &Uuid) -> Result<Option<Ride>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {RIDE_COLUMNS} FROM rides WHERE id = ?1"
            ))
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let result = stmt.query_row(params![id.to_string()], read_ride_row);

        match result {
            Ok(row) => Ok(Some(row.into_ride()?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DatabaseError::QueryFailed(e.to_string())),
        }
    }

    /// List all rides, newest first.
    pub fn list_rides(&self) -> Result<Vec<Ride>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {RIDE_COLUMNS} FROM rides ORDER BY started_at DESC"
            ))
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map([], read_ride_row)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut rides = Vec::new();
        for row in rows {
            let row = row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            rides.push(row.into_ride()?);
        }

        Ok(rides)
    }

    /// Count rides in the store.
    pub fn count_rides(&self) -> Result<usize, DatabaseError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM rides", [], |row| row.get(0))
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(count as usize)
    }

    // ========== Track point operations ==========

    /// Insert track points in bulk inside one transaction.
    pub fn insert_track_points(&mut self, points: &[TrackPoint]) -> Result<(), DatabaseError> {
        if points.is_empty() {
            return Ok(());
        }

        let tx = self
            .conn
            .transaction()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        insert_points_in_tx(&tx, points)?;

        tx.commit()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Get all track points of a ride in timestamp order.
    pub fn get_track_points(&self, ride_id: &Uuid) -> Result<Vec<TrackPoint>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT ride_id, timestamp, latitude, longitude, altitude_m, speed_ms,
                 power_watts
                 FROM track_points WHERE ride_id = ?1 ORDER BY timestamp",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map(params![ride_id.to_string()], |row| {
                Ok(TrackPointRow {
                    ride_id: row.get(0)?,
                    timestamp: row.get(1)?,
                    latitude: row.get(2)?,
                    longitude: row.get(3)?,
                    altitude_m: row.get(4)?,
                    speed_ms: row.get(5)?,
                    power_watts: row.get(6)?,
                })
            })
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut points = Vec::new();
        for row in rows {
            let row = row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            points.push(row.into_track_point()?);
        }

        Ok(points)
    }

    /// Get a ride together with its full point trace.
    pub fn get_ride_with_points(
        &self,
        id: &Uuid,
    ) -> Result<Option<(Ride, Vec<TrackPoint>)>, DatabaseError> {
        let ride = match self.get_ride(id)? {
            Some(ride) => ride,
            None => return Ok(None),
        };

        let points = self.get_track_points(id)?;
        Ok(Some((ride, points)))
    }

    /// Get a decimated [lat, lon] path for map display (every 3rd point).
    pub fn get_ride_path(&self, ride_id: &Uuid) -> Result<Vec<[f64; 2]>, DatabaseError> {
        let points = self.get_track_points(ride_id)?;

        Ok(points
            .iter()
            .step_by(3)
            .map(|p| [p.latitude, p.longitude])
            .collect())
    }

    // ========== Import operations ==========

    /// Persist an imported ride and its points in one transaction.
    ///
    /// Either the whole ride lands or nothing does; a failure mid-import
    /// never leaves a half-written ride behind.
    pub fn insert_imported_ride(
        &mut self,
        ride: &Ride,
        points: &[TrackPoint],
    ) -> Result<(), DatabaseError> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        tx.execute(
            "INSERT INTO rides (id, started_at, ended_at, distance_km, moving_time_seconds,
             elapsed_time_seconds, elevation_gain_m, calories, avg_speed_kph, max_speed_kph,
             avg_power_watts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            ride_params(ride),
        )
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        insert_points_in_tx(&tx, points)?;

        tx.commit()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        tracing::info!(ride_id = %ride.id, points = points.len(), "Persisted imported ride");
        Ok(())
    }
}

/// Ride column list shared by the read queries.
const RIDE_COLUMNS: &str = "id, started_at, ended_at, distance_km, moving_time_seconds,
    elapsed_time_seconds, elevation_gain_m, calories, avg_speed_kph, max_speed_kph,
    avg_power_watts";

/// Bind a ride's fields in column order for insert/update statements.
fn ride_params(ride: &Ride) -> impl rusqlite::Params {
    (
        ride.id.to_string(),
        ride.started_at.to_rfc3339(),
        ride.ended_at.map(|dt| dt.to_rfc3339()),
        ride.distance_km,
        ride.moving_time_seconds,
        ride.elapsed_time_seconds,
        ride.elevation_gain_m,
        ride.calories,
        ride.avg_speed_kph,
        ride.max_speed_kph,
        ride.avg_power_watts,
    )
}

/// Read one ride row in [`RIDE_COLUMNS`] order.
fn read_ride_row(row: &rusqlite::Row<'_>) -> SqliteResult<RideRow> {
    Ok(RideRow {
        id: row.get(0)?,
        started_at: row.get(1)?,
        ended_at: row.get(2)?,
        distance_km: row.get(3)?,
        moving_time_seconds: row.get(4)?,
        elapsed_time_seconds: row.get(5)?,
        elevation_gain_m: row.get(6)?,
        calories: row.get(7)?,
        avg_speed_kph: row.get(8)?,
        max_speed_kph: row.get(9)?,
        avg_power_watts: row.get(10)?,
    })
}

/// Insert track points through an open transaction.
fn insert_points_in_tx(
    tx: &rusqlite::Transaction<'_>,
    points: &[TrackPoint],
) -> Result<(), DatabaseError> {
    let mut stmt = tx
        .prepare(
            "INSERT INTO track_points (ride_id, timestamp, latitude, longitude, altitude_m,
             speed_ms, power_watts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

    for point in points {
        stmt.execute(params![
            point.ride_id.to_string(),
            point.timestamp,
            point.latitude,
            point.longitude,
            point.altitude_m,
            point.speed_ms,
            point.power_watts,
        ])
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
    }

    Ok(())
}

/// Intermediate struct for reading ride rows from database.
struct RideRow {
    id: String,
    started_at: String,
    ended_at: Option<String>,
    distance_km: f64,
    moving_time_seconds: f64,
    elapsed_time_seconds: f64,
    elevation_gain_m: f64,
    calories: u32,
    avg_speed_kph: f64,
    max_speed_kph: f64,
    avg_power_watts: u16,
}

impl RideRow {
    fn into_ride(self) -> Result<Ride, DatabaseError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| DatabaseError::DeserializationError(format!("Invalid UUID: {}", e)))?;

        let started_at = parse_timestamp(&self.started_at)?;
        let ended_at = self
            .ended_at
            .as_deref()
            .map(parse_timestamp)
            .transpose()?;

        Ok(Ride {
            id,
            started_at,
            ended_at,
            distance_km: self.distance_km,
            moving_time_seconds: self.moving_time_seconds,
            elapsed_time_seconds: self.elapsed_time_seconds,
            elevation_gain_m: self.elevation_gain_m,
            calories: self.calories,
            avg_speed_kph: self.avg_speed_kph,
            max_speed_kph: self.max_speed_kph,
            avg_power_watts: self.avg_power_watts,
        })
    }
}

/// Intermediate struct for reading track point rows from database.
struct TrackPointRow {
    ride_id: String,
    timestamp: f64,
    latitude: f64,
    longitude: f64,
    altitude_m: f64,
    speed_ms: f64,
    power_watts: u16,
}

impl TrackPointRow {
    fn into_track_point(self) -> Result<TrackPoint, DatabaseError> {
        let ride_id = Uuid::parse_str(&self.ride_id)
            .map_err(|e| DatabaseError::DeserializationError(format!("Invalid UUID: {}", e)))?;

        Ok(TrackPoint {
            ride_id,
            timestamp: self.timestamp,
            latitude: self.latitude,
            longitude: self.longitude,
            altitude_m: self.altitude_m,
            speed_ms: self.speed_ms,
            power_watts: self.power_watts,
        })
    }
}

fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::DeserializationError(format!("Invalid timestamp: {}", e)))
}

/// Database errors.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}
