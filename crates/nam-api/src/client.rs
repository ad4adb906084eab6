// Device client for Nettigo Air Monitor firmware.
//
// Wraps a caller-supplied `reqwest::Client` with NAM-specific URL
// construction, bounded retries with linear backoff, and response
// classification. The HTTP client is externally owned: pooling, TLS, and
// DNS are the caller's concern.

use std::sync::{LazyLock, PoisonError, RwLock};
use std::time::Duration;

use regex::Regex;
use reqwest::{Method, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, info};

use crate::endpoint::Endpoint;
use crate::error::Error;
use crate::sensors::{self, DataResponse, NamSensors};

/// Default number of attempts for idempotent requests.
pub const RETRIES: u64 = 4;

/// Per-attempt request timeout.
pub const TIMEOUT: Duration = Duration::from_secs(5);

/// MAC address in free text: six hex byte pairs separated by `:` or `-`.
static MAC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9A-Fa-f]{2}[:-]){5}[0-9A-Fa-f]{2}").expect("valid MAC pattern")
});

/// Basic-auth credentials for devices with auth enabled in firmware.
///
/// Username and password travel as one pair, so "username without
/// password" cannot be constructed.
#[derive(Debug, Clone)]
pub struct BasicAuth {
    pub username: String,
    pub password: SecretString,
}

/// Connection parameters for a single device. Immutable after construction.
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    pub host: String,
    pub auth: Option<BasicAuth>,
}

impl ConnectionOptions {
    /// Options for an unauthenticated device.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            auth: None,
        }
    }

    /// Attach basic-auth credentials.
    pub fn with_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.auth = Some(BasicAuth {
            username: username.into(),
            password: SecretString::from(password.into()),
        });
        self
    }
}

/// Async client for a single Nettigo Air Monitor device.
///
/// Every operation performs at most one in-flight request at a time,
/// sequentially across its retry loop. Operations may run concurrently
/// against the same instance; the only shared mutable state is the cached
/// software version.
pub struct NamClient {
    http: reqwest::Client,
    options: ConnectionOptions,
    software_version: RwLock<Option<String>>,
}

impl NamClient {
    /// Wrap a pre-built `reqwest::Client`.
    ///
    /// By convention callers should follow up with [`Self::initialize`]
    /// before other use; [`Self::create`] does both in one step.
    pub fn new(http: reqwest::Client, options: ConnectionOptions) -> Self {
        Self {
            http,
            options,
            software_version: RwLock::new(None),
        }
    }

    /// Create a client and verify the device is reachable and the
    /// credentials work.
    pub async fn create(
        http: reqwest::Client,
        options: ConnectionOptions,
    ) -> Result<Self, Error> {
        let client = Self::new(http, options);
        client.initialize().await?;
        Ok(client)
    }

    /// The configured device host.
    pub fn host(&self) -> &str {
        &self.options.host
    }

    /// Probe the config endpoint with a single attempt.
    ///
    /// Side-effect free beyond failing: a setup probe should report an
    /// unreachable device promptly rather than retry.
    pub async fn initialize(&self) -> Result<(), Error> {
        debug!("Initializing device {}", self.host());

        let url = Endpoint::Config.url(self.host());
        self.request(Method::GET, &url, 1).await?;
        Ok(())
    }

    /// Fetch current readings from the data endpoint.
    ///
    /// Caches the reported software version as a side effect; readable
    /// afterwards via [`Self::software_version`].
    pub async fn fetch_sensors(&self) -> Result<NamSensors, Error> {
        let url = Endpoint::Data.url(self.host());
        let resp = self.request(Method::GET, &url, RETRIES).await?;

        let body = resp.text().await.map_err(|source| Error::Transport {
            host: self.host().to_owned(),
            source,
        })?;
        let data: DataResponse =
            serde_json::from_str(&body).map_err(|error| Error::InvalidSensorData {
                message: error.to_string(),
            })?;

        {
            let mut version = self
                .software_version
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            *version = Some(data.software_version);
        }

        let mut result = sensors::normalize_sensor_data(&data.sensordatavalues)?;
        if let Some(raw) = &data.uptime {
            result.insert("uptime".to_owned(), Value::from(sensors::parse_uptime(raw)?));
        }

        sensors::decode_sensors(result)
    }

    /// Scrape the device MAC address from the values page.
    ///
    /// Returns the first MAC-shaped token verbatim.
    pub async fn fetch_mac_address(&self) -> Result<String, Error> {
        let url = Endpoint::Values.url(self.host());
        let resp = self.request(Method::GET, &url, RETRIES).await?;

        let body = resp.text().await.map_err(|source| Error::Transport {
            host: self.host().to_owned(),
            source,
        })?;

        MAC_PATTERN
            .find(&body)
            .map(|m| m.as_str().to_owned())
            .ok_or(Error::CannotGetMac)
    }

    /// Restart the device. Single attempt; a reboot is not idempotent.
    pub async fn restart(&self) -> Result<(), Error> {
        let url = Endpoint::Restart.url(self.host());
        self.request(Method::POST, &url, 1).await?;
        Ok(())
    }

    /// Trigger an over-the-air firmware update check. Single attempt.
    pub async fn ota_update(&self) -> Result<(), Error> {
        let url = Endpoint::Ota.url(self.host());
        self.request(Method::POST, &url, 1).await?;
        Ok(())
    }

    /// Software version reported by the device.
    ///
    /// `None` until the first successful [`Self::fetch_sensors`] call.
    pub fn software_version(&self) -> Option<String> {
        self.software_version
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Issue a request with bounded retries and linear backoff.
    ///
    /// Connection-level failures (unreachable host, per-attempt timeout)
    /// are retried with a `TIMEOUT + attempt` sleep between attempts.
    /// Protocol-level rejections are terminal on the first response:
    /// retrying a 401 or a 5xx cannot change the outcome.
    async fn request(&self, method: Method, url: &str, retries: u64) -> Result<Response, Error> {
        let mut retry: u64 = 0;

        loop {
            debug!("Requesting {url}, method: {method}");

            let mut req = self.http.request(method.clone(), url).timeout(TIMEOUT);
            if let Some(auth) = &self.options.auth {
                req = req.basic_auth(&auth.username, Some(auth.password.expose_secret()));
            }

            match req.send().await {
                Ok(resp) if resp.status() == StatusCode::OK => {
                    debug!(
                        "Data retrieved from {}, status: {}",
                        self.host(),
                        resp.status()
                    );
                    return Ok(resp);
                }
                Ok(resp) if resp.status() == StatusCode::UNAUTHORIZED => {
                    return Err(Error::AuthFailed);
                }
                Ok(resp) => {
                    return Err(Error::Api {
                        host: self.host().to_owned(),
                        status: resp.status().as_u16(),
                    });
                }
                Err(error) if error.is_connect() || error.is_timeout() => {
                    info!("Invalid response from device: {}, retry: {retry}", self.host());

                    if retry + 1 >= retries {
                        return Err(Error::Transport {
                            host: self.host().to_owned(),
                            source: error,
                        });
                    }

                    let wait = backoff(retry);
                    debug!(
                        "Waiting {} seconds for device {}",
                        wait.as_secs(),
                        self.host()
                    );
                    tokio::time::sleep(wait).await;
                    retry += 1;
                }
                Err(error) => {
                    return Err(Error::Transport {
                        host: self.host().to_owned(),
                        source: error,
                    });
                }
            }
        }
    }
}

/// Delay before the retry following failed attempt `retry` (zero-indexed).
fn backoff(retry: u64) -> Duration {
    TIMEOUT + Duration::from_secs(retry)
}
