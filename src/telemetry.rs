//! Tracing subscriber setup for binaries and tests that embed the registry.

use tracing_subscriber::EnvFilter;

/// Error returned when a global subscriber is already installed.
pub type TelemetryError = Box<dyn std::error::Error + Send + Sync>;

/// Installs a formatted tracing subscriber filtered by `RUST_LOG`.
///
/// Falls back to the `info` level when `RUST_LOG` is unset or invalid. The
/// registry logs registrations, demotions, and start/stop at `info` or
/// `warn`, and per-call detail at `debug`.
///
/// # Errors
///
/// Returns an error when another global subscriber is already installed.
///
/// # Examples
///
/// ```
/// // A second call reports the existing subscriber instead of panicking.
/// let _ = capability_registry::telemetry::init_tracing();
/// assert!(capability_registry::telemetry::init_tracing().is_err());
/// ```
pub fn init_tracing() -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).try_init()
}
