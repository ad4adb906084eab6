use thiserror::Error;

/// Top-level error type for the `nam-api` crate.
///
/// A closed set of failure kinds: callers are expected to branch on the
/// variant (prompt for new credentials on `AuthFailed`, treat `Transport`
/// as "device offline", and so on).
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// Connection could not be established or timed out across all retries.
    #[error("Cannot connect to device {host}: {source}")]
    Transport {
        host: String,
        #[source]
        source: reqwest::Error,
    },

    // ── Protocol ────────────────────────────────────────────────────
    /// Device answered with a non-success status. Never retried.
    #[error("Invalid response from device {host}: {status}")]
    Api { host: String, status: u16 },

    /// Device rejected the credentials. Never retried.
    #[error("Authorization has failed")]
    AuthFailed,

    // ── Data ────────────────────────────────────────────────────────
    /// No MAC address found in the values endpoint body.
    #[error("Cannot get MAC address from device")]
    CannotGetMac,

    /// Sensor payload was malformed or failed to decode.
    #[error("Invalid sensor data: {message}")]
    InvalidSensorData { message: String },
}

impl Error {
    /// Returns `true` if new credentials might resolve this error.
    pub fn is_auth_failed(&self) -> bool {
        matches!(self, Self::AuthFailed)
    }

    /// Returns `true` if the device is likely offline and a later retry
    /// might succeed. The request executor has already exhausted its own
    /// retry budget by the time this surfaces.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// The HTTP status the device answered with, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::AuthFailed => Some(401),
            _ => None,
        }
    }
}
