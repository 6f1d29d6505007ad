//! Recording state machine for the telemetry loop.

use uuid::Uuid;

/// Status of the ride recording state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RideStatus {
    /// Not recording
    #[default]
    Idle,
    /// Actively recording
    Recording,
    /// Recording paused
    Paused,
}

/// External control actions accepted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    /// Begin a new ride
    Start,
    /// Pause the active ride
    Pause,
    /// Resume a paused ride
    Resume,
    /// Finalize the active ride
    Stop,
}

impl std::fmt::Display for ControlAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlAction::Start => write!(f, "start"),
            ControlAction::Pause => write!(f, "pause"),
            ControlAction::Resume => write!(f, "resume"),
            ControlAction::Stop => write!(f, "stop"),
        }
    }
}

/// Recording status plus the identity of the active ride.
///
/// An action received in an inapplicable state is a no-op; the control
/// surface is fire-and-forget, so illegal transitions are logged rather
/// than surfaced as errors.
#[derive(Debug, Default)]
pub struct RideState {
    status: RideStatus,
    active_ride: Option<Uuid>,
}

impl RideState {
    /// Create a new state machine in `Idle`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current status.
    pub fn status(&self) -> RideStatus {
        self.status
    }

    /// Get the active ride id, if any.
    pub fn active_ride(&self) -> Option<Uuid> {
        self.active_ride
    }

    /// Whether samples should currently accumulate into a ride.
    pub fn is_recording(&self) -> bool {
        self.status == RideStatus::Recording
    }

    /// Whether the active ride is paused.
    pub fn is_paused(&self) -> bool {
        self.status == RideStatus::Paused
    }

    /// `Idle → Recording`; returns false if a ride is already active.
    pub fn on_start(&mut self, ride_id: Uuid) -> bool {
        if self.status != RideStatus::Idle {
            tracing::warn!(status = ?self.status, "Ignoring start while not idle");
            return false;
        }
        self.status = RideStatus::Recording;
        self.active_ride = Some(ride_id);
        tracing::info!(%ride_id, "Started recording ride");
        true
    }

    /// `Recording → Paused`; no-op otherwise.
    pub fn on_pause(&mut self) -> bool {
        if self.status != RideStatus::Recording {
            tracing::warn!(status = ?self.status, "Ignoring pause while not recording");
            return false;
        }
        self.status = RideStatus::Paused;
        tracing::info!("Paused recording");
        true
    }

    /// `Paused → Recording`; no-op otherwise.
    pub fn on_resume(&mut self) -> bool {
        if self.status != RideStatus::Paused {
            tracing::warn!(status = ?self.status, "Ignoring resume while not paused");
            return false;
        }
        self.status = RideStatus::Recording;
        tracing::info!("Resumed recording");
        true
    }

    /// `Recording|Paused → Idle`; returns the finalized ride id.
    pub fn on_stop(&mut self) -> Option<Uuid> {
        if self.status == RideStatus::Idle {
            tracing::warn!("Ignoring stop while idle");
            return None;
        }
        self.status = RideStatus::Idle;
        let ride_id = self.active_ride.take();
        if let Some(id) = ride_id {
            tracing::info!(ride_id = %id, "Stopped recording ride");
        }
        ride_id
    }
}
