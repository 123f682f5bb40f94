/// Timestamp parsing for client input
///
/// Browsers post `datetime-local` values without a zone (`2025-01-01T10:00`);
/// those are read as UTC. RFC 3339 values keep their offset.
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer};

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse an RFC 3339 or zone-less ISO 8601 timestamp as UTC
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Some(ts.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

/// `deserialize_with` helper for optional timestamps; empty strings count as absent
pub fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_timestamp(value)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp `{}`", value))),
    }
}
