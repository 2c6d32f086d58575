//! Wire decoding of sensor payloads.
//!
//! Producers send a flat JSON object with one numeric field per sensor and an
//! optional timestamp:
//!
//! ```json
//! { "mq137_ppm": 12.5, "mq4_ppm": 210.0, "mq7_ppm": 4.2, "timestamp": "2024-05-01T12:00:00Z" }
//! ```
//!
//! Field names come from the [`ProfileTable`], so a deployment with different
//! firmware keys only needs configuration changes.

use chrono::{DateTime, NaiveDateTime};
use serde_json::{Map, Value};

use gaswatch_types::{ProfileTable, Reading, SensorId, TimestampOrigin};

use crate::FetchError;

/// Field carrying the producer's timestamp.
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Decode a payload into a complete [`Reading`].
///
/// Fails with [`FetchError::Decode`] if the body is not a JSON object, a
/// sensor field is missing or not a number, or the timestamp cannot be
/// parsed. A missing or `null` timestamp is replaced by `received_at_ms`.
pub fn decode_reading(
    body: &[u8],
    profiles: &ProfileTable,
    received_at_ms: u64,
) -> Result<Reading, FetchError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| FetchError::decode(format!("invalid JSON: {}", e)))?;

    let Value::Object(object) = value else {
        return Err(FetchError::decode("expected a JSON object"));
    };

    let mut values = [0.0; SensorId::COUNT];
    let mut missing = Vec::new();

    for profile in profiles.iter() {
        match object.get(&profile.field) {
            Some(Value::Number(n)) => match n.as_f64() {
                Some(v) => values[profile.id.index()] = v,
                None => {
                    return Err(FetchError::decode(format!(
                        "field '{}' is not representable as a number",
                        profile.field
                    )))
                }
            },
            Some(Value::Null) | None => missing.push(profile.field.as_str()),
            Some(other) => {
                return Err(FetchError::decode(format!(
                    "field '{}' must be a number, got {}",
                    profile.field,
                    type_name(other)
                )))
            }
        }
    }

    if !missing.is_empty() {
        return Err(FetchError::decode(format!(
            "missing sensor field(s): {}",
            missing.join(", ")
        )));
    }

    match parse_timestamp(&object)? {
        Some(ts) => Ok(Reading::with_origin(values, ts, TimestampOrigin::Producer)),
        None => Ok(Reading::with_origin(
            values,
            received_at_ms,
            TimestampOrigin::Receipt,
        )),
    }
}

fn parse_timestamp(object: &Map<String, Value>) -> Result<Option<u64>, FetchError> {
    match object.get(TIMESTAMP_FIELD) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => parse_iso8601(s).map(Some),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| FetchError::decode(format!("invalid timestamp {}", n))),
        Some(other) => Err(FetchError::decode(format!(
            "timestamp must be a string or number, got {}",
            type_name(other)
        ))),
    }
}

/// Parse an ISO-8601 timestamp into Unix milliseconds.
///
/// Accepts RFC 3339 (with offset) and naive date-times, which are taken as UTC.
pub fn parse_iso8601(s: &str) -> Result<u64, FetchError> {
    let s = s.trim();
    let millis = match DateTime::parse_from_rfc3339(s) {
        Ok(dt) => dt.timestamp_millis(),
        Err(_) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|dt| dt.and_utc().timestamp_millis())
            .map_err(|e| FetchError::decode(format!("invalid timestamp '{}': {}", s, e)))?,
    };

    u64::try_from(millis)
        .map_err(|_| FetchError::decode(format!("timestamp '{}' is before the Unix epoch", s)))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    const RECEIVED: u64 = 1_700_000_000_000;

    fn decode(body: &str) -> Result<Reading, FetchError> {
        decode_reading(body.as_bytes(), &ProfileTable::default(), RECEIVED)
    }

    #[test]
    fn test_decode_complete_payload() {
        let reading = decode(
            r#"{"mq137_ppm": 12.5, "mq4_ppm": 210, "mq7_ppm": 4.2, "timestamp": "2024-05-01T12:00:00Z"}"#,
        )
        .unwrap();

        assert_eq!(reading.get(SensorId::Ammonia), 12.5);
        assert_eq!(reading.get(SensorId::Methane), 210.0);
        assert_eq!(reading.get(SensorId::CarbonMonoxide), 4.2);
        assert_eq!(reading.timestamp_ms(), 1_714_564_800_000);
        assert_eq!(reading.origin(), TimestampOrigin::Producer);
    }

    #[test]
    fn test_missing_timestamp_uses_receipt_time() {
        let reading = decode(r#"{"mq137_ppm": 1, "mq4_ppm": 2, "mq7_ppm": 3}"#).unwrap();
        assert_eq!(reading.timestamp_ms(), RECEIVED);
        assert_eq!(reading.origin(), TimestampOrigin::Receipt);

        let body = r#"{"mq137_ppm": 1, "mq4_ppm": 2, "mq7_ppm": 3, "timestamp": null}"#;
        let reading = decode(body).unwrap();
        assert_eq!(reading.origin(), TimestampOrigin::Receipt);
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let err = decode(r#"{"mq137_ppm": 1, "mq4_ppm": 2}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(err.to_string().contains("mq7_ppm"));
    }

    #[test]
    fn test_non_numeric_field_is_rejected() {
        let err = decode(r#"{"mq137_ppm": "12", "mq4_ppm": 2, "mq7_ppm": 3}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(err.to_string().contains("a string"));
    }

    #[test]
    fn test_invalid_json_and_non_object() {
        assert_eq!(decode("not json").unwrap_err().kind(), ErrorKind::Decode);
        assert_eq!(decode("[1, 2, 3]").unwrap_err().kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_bad_timestamp_is_rejected() {
        let body = r#"{"mq137_ppm": 1, "mq4_ppm": 2, "mq7_ppm": 3, "timestamp": "yesterday"}"#;
        let err = decode(body).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_numeric_and_naive_timestamps() {
        let body = r#"{"mq137_ppm": 1, "mq4_ppm": 2, "mq7_ppm": 3, "timestamp": 1234}"#;
        let reading = decode(body).unwrap();
        assert_eq!(reading.timestamp_ms(), 1234);

        let naive = parse_iso8601("2024-05-01T12:00:00.500").unwrap();
        assert_eq!(naive, 1_714_564_800_500);
        let offset = parse_iso8601("2024-05-01T14:00:00+02:00").unwrap();
        assert_eq!(offset, 1_714_564_800_000);
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let body = r#"{"mq137_ppm": 1, "mq4_ppm": 2, "mq7_ppm": 3, "mq135": 99, "rssi": -60}"#;
        let reading = decode(body).unwrap();
        assert_eq!(reading.get(SensorId::Ammonia), 1.0);
    }

    #[test]
    fn test_field_names_follow_profiles() {
        let mut methane = gaswatch_types::SensorProfile::reference(SensorId::Methane);
        methane.field = "ch4".into();
        let profiles = ProfileTable::default().with_profile(methane);

        let body = br#"{"mq137_ppm": 1, "ch4": 7, "mq7_ppm": 3}"#;
        let reading = decode_reading(body, &profiles, RECEIVED).unwrap();
        assert_eq!(reading.get(SensorId::Methane), 7.0);
    }
}
