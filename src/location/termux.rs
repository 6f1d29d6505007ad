//! Location provider backed by the Termux `termux-location` utility.

use super::{parse_fix, Fix, LocationError, LocationProvider, ProviderSource};
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;

/// Default path of the Termux location binary when not on `$PATH`.
const DEFAULT_BINARY: &str = "/data/data/com.termux/files/usr/bin/termux-location";

/// Polls position fixes by invoking `termux-location` as a child process.
pub struct TermuxLocation {
    /// Location binary path
    binary: PathBuf,
    /// Per-attempt poll timeout
    timeout: Duration,
}

impl TermuxLocation {
    /// Create a provider with an explicit binary path and timeout.
    pub fn new(binary: PathBuf, timeout: Duration) -> Self {
        Self { binary, timeout }
    }

    /// Create a provider with the stock Termux binary path and a 5 s timeout.
    pub fn with_defaults() -> Self {
        Self::new(PathBuf::from(DEFAULT_BINARY), Duration::from_secs(5))
    }
}

impl LocationProvider for TermuxLocation {
    async fn poll(&self, source: ProviderSource) -> Result<Fix, LocationError> {
        let output = tokio::time::timeout(
            self.timeout,
            Command::new(&self.binary)
                .arg("-p")
                .arg(source.provider_name())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| LocationError::Timeout)?
        .map_err(|e| LocationError::InvocationFailed(e.to_string()))?;

        if !output.status.success() {
            tracing::debug!(
                provider = source.provider_name(),
                status = ?output.status,
                "Location provider exited with failure"
            );
            return Err(LocationError::ProviderFailed);
        }

        let payload = String::from_utf8_lossy(&output.stdout);
        parse_fix(&payload)
    }
}
