// Endpoint resolution for the NAM firmware's HTTP surface.

/// Named HTTP resources exposed by the device firmware.
///
/// The firmware serves a handful of fixed paths; resolving one is pure
/// string substitution with no failure mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Device configuration page, used as a reachability probe.
    Config,
    /// Current sensor readings as JSON.
    Data,
    /// Diagnostic HTML page containing the MAC address.
    Values,
    /// Reboots the device.
    Restart,
    /// Triggers an over-the-air firmware update check.
    Ota,
}

impl Endpoint {
    /// Path component of the endpoint URL.
    fn path(self) -> &'static str {
        match self {
            Self::Config => "config.json",
            Self::Data => "data.json",
            Self::Values => "values",
            Self::Restart => "reset",
            Self::Ota => "ota",
        }
    }

    /// Full device URL for this endpoint.
    ///
    /// NAM firmware speaks plain HTTP only.
    pub fn url(self, host: &str) -> String {
        format!("http://{host}/{}", self.path())
    }
}
