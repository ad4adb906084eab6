// Sensor payload normalization.
//
// The firmware reports readings as an ad-hoc list of `{value_type, value}`
// pairs with inconsistent casing, string-encoded numbers, and raw units.
// This module shapes that list into a stable keyed mapping and decodes it
// into the typed [`NamSensors`] record.

use serde::Deserialize;
use serde_json::{Map, Number, Value};

use crate::error::Error;

/// Keys the firmware reports with spurious precision; rounded to whole
/// numbers instead of one decimal place.
const INTEGER_KEYS: [&str; 8] = [
    "conc_co2_ppm",
    "sds_p1",
    "sds_p2",
    "sps30_p0",
    "sps30_p1",
    "sps30_p2",
    "sps30_p4",
    "signal",
];

/// Ordered key renames applied after rounding, first to last over the same
/// mapping. Configuration data, not logic: a later pair would observe an
/// earlier pair's output key.
const RENAME_KEYS: [(&str, &str); 3] = [
    ("conc_co2_ppm", "mhz14a_carbon_dioxide"),
    ("sds_p1", "sds011_p1"),
    ("sds_p2", "sds011_p2"),
];

/// One entry of the device's `sensordatavalues` list.
///
/// The firmware emits `value` as a bare number or a numeric string
/// depending on the sensor; both are accepted and parsed during
/// normalization. Entries missing either field fail the strict decode.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSensorValue {
    pub value_type: String,
    pub value: Value,
}

/// Body of the data endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct DataResponse {
    pub software_version: String,
    pub sensordatavalues: Vec<RawSensorValue>,
    /// Seconds since boot; string or integer depending on firmware build.
    #[serde(default)]
    pub uptime: Option<Value>,
}

/// Typed sensor record decoded from a normalized readings mapping.
///
/// Every field is optional: a device reports only the sensors it carries.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NamSensors {
    pub bme280_humidity: Option<f64>,
    pub bme280_pressure: Option<f64>,
    pub bme280_temperature: Option<f64>,
    pub bmp180_pressure: Option<f64>,
    pub bmp180_temperature: Option<f64>,
    pub bmp280_pressure: Option<f64>,
    pub bmp280_temperature: Option<f64>,
    pub dht22_humidity: Option<f64>,
    pub dht22_temperature: Option<f64>,
    pub heca_humidity: Option<f64>,
    pub heca_temperature: Option<f64>,
    pub mhz14a_carbon_dioxide: Option<i64>,
    pub sds011_p1: Option<f64>,
    pub sds011_p2: Option<f64>,
    pub sht3x_humidity: Option<f64>,
    pub sht3x_temperature: Option<f64>,
    pub signal: Option<i64>,
    pub sps30_p0: Option<f64>,
    pub sps30_p1: Option<f64>,
    pub sps30_p2: Option<f64>,
    pub sps30_p4: Option<f64>,
    pub uptime: Option<i64>,
}

/// Normalize the raw `sensordatavalues` list into a keyed numeric mapping.
///
/// Labels are lowercased (duplicate labels: last occurrence wins) and
/// values parsed and rounded to one decimal place. Pressure readings are
/// converted from Pa to hPa, the [`INTEGER_KEYS`] set is rounded to whole
/// numbers, and [`RENAME_KEYS`] is applied in order. Unknown keys pass
/// through unchanged.
///
/// Any unparsable value fails the whole normalization: a partial mapping
/// would silently misrepresent the device.
pub fn normalize_sensor_data(data: &[RawSensorValue]) -> Result<Map<String, Value>, Error> {
    let mut result = Map::new();

    for item in data {
        let key = item.value_type.to_lowercase();
        let parsed = parse_number(&item.value).ok_or_else(|| Error::InvalidSensorData {
            message: format!("unparsable value for {key}: {}", item.value),
        })?;
        result.insert(key, to_value((parsed * 10.0).round() / 10.0)?);
    }

    for (key, value) in &mut result {
        let Some(v) = value.as_f64() else { continue };
        if key.contains("pressure") {
            // Pa → hPa
            *value = Value::from((v / 100.0).round() as i64);
        } else if INTEGER_KEYS.contains(&key.as_str()) {
            *value = Value::from(v.round() as i64);
        }
    }

    for (old_key, new_key) in RENAME_KEYS {
        if let Some(value) = result.remove(old_key) {
            result.insert(new_key.to_owned(), value);
        }
    }

    Ok(result)
}

/// Decode a normalized mapping into the typed record.
///
/// Keys outside the record's vocabulary are ignored; a wrong-shaped value
/// under a known key is an error.
pub fn decode_sensors(sensors: Map<String, Value>) -> Result<NamSensors, Error> {
    serde_json::from_value(Value::Object(sensors)).map_err(|error| Error::InvalidSensorData {
        message: error.to_string(),
    })
}

/// Parse the payload-level `uptime` field.
pub(crate) fn parse_uptime(raw: &Value) -> Result<i64, Error> {
    let parsed = match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| Error::InvalidSensorData {
        message: format!("unparsable uptime: {raw}"),
    })
}

fn parse_number(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok().filter(|v: &f64| v.is_finite()),
        _ => None,
    }
}

fn to_value(value: f64) -> Result<Value, Error> {
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| Error::InvalidSensorData {
            message: format!("non-finite value: {value}"),
        })
}
