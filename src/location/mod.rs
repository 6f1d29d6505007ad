//! Location providers: the polling seam between the telemetry loop and the
//! OS-level positioning service.

pub mod termux;

use serde::Deserialize;
use std::future::Future;
use thiserror::Error;

pub use termux::TermuxLocation;

/// One raw reading from a location provider.
///
/// Latitude and longitude are required; a payload missing either fails
/// deserialization and the cycle treats it as no fix. The remaining fields
/// default to zero, matching providers that omit them indoors.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Fix {
    /// GPS latitude in degrees
    pub latitude: f64,
    /// GPS longitude in degrees
    pub longitude: f64,
    /// Altitude above sea level in meters
    #[serde(default)]
    pub altitude: f64,
    /// Ground speed in m/s
    #[serde(default)]
    pub speed: f64,
    /// Heading in degrees
    #[serde(default)]
    pub bearing: f64,
}

/// Which positioning source to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderSource {
    /// Full-precision satellite fix
    Primary,
    /// Lower-precision network fix, used when the primary fails
    Fallback,
}

impl ProviderSource {
    /// Provider name understood by the Termux location service.
    pub fn provider_name(&self) -> &'static str {
        match self {
            ProviderSource::Primary => "gps",
            ProviderSource::Fallback => "network",
        }
    }
}

/// Errors from a location provider.
#[derive(Debug, Error)]
pub enum LocationError {
    /// The provider process could not be spawned
    #[error("Failed to invoke location provider: {0}")]
    InvocationFailed(String),

    /// The provider did not answer within the poll timeout
    #[error("Location provider timed out")]
    Timeout,

    /// The provider exited unsuccessfully
    #[error("Location provider exited with failure")]
    ProviderFailed,

    /// The provider reported an API-level error in its payload
    #[error("Location provider reported an error: {0}")]
    ApiError(String),

    /// The payload could not be parsed into a fix
    #[error("Malformed fix payload: {0}")]
    MalformedFix(String),
}

/// A pollable positioning source.
pub trait LocationProvider: Send + Sync {
    /// Acquire one fix from the given source.
    fn poll(
        &self,
        source: ProviderSource,
    ) -> impl Future<Output = Result<Fix, LocationError>> + Send;
}

/// Parse a provider JSON payload into a fix.
///
/// A payload carrying an `API_ERROR` key is a provider-reported error even
/// when the process exited cleanly.
pub fn parse_fix(payload: &str) -> Result<Fix, LocationError> {
    let value: serde_json::Value = serde_json::from_str(payload)
        .map_err(|e| LocationError::MalformedFix(e.to_string()))?;

    if let Some(api_error) = value.get("API_ERROR") {
        return Err(LocationError::ApiError(api_error.to_string()));
    }

    serde_json::from_value(value).map_err(|e| LocationError::MalformedFix(e.to_string()))
}
