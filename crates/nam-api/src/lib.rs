// nam-api: Async Rust client for Nettigo Air Monitor air quality sensors

pub mod client;
pub mod endpoint;
pub mod error;
pub mod sensors;

pub use client::{BasicAuth, ConnectionOptions, NamClient, RETRIES, TIMEOUT};
pub use endpoint::Endpoint;
pub use error::Error;
pub use sensors::{NamSensors, RawSensorValue};
