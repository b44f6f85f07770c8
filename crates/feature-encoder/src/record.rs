//! Raw Input Records

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Canonical record field names
pub mod fields {
    pub const HOUR: &str = "hour";
    pub const MONTH: &str = "month";
    pub const WEEKDAY: &str = "weekday";
    pub const DAY_OF_MONTH: &str = "day-of-month";
    pub const TEMPERATURE: &str = "temperature";
    pub const FEELS_LIKE: &str = "feels-like-temperature";
    pub const HUMIDITY: &str = "humidity";
    pub const WINDSPEED: &str = "windspeed";
    pub const SEASON: &str = "season";
    pub const WEATHER: &str = "weather-situation";
    pub const HOLIDAY: &str = "holiday";
    pub const WORKING_DAY: &str = "working-day";
    pub const YEAR_INDEX: &str = "year-index";
}

/// Map dataset column spellings onto canonical field names.
///
/// Unrecognized names are returned unchanged.
pub fn canonical_field_name(name: &str) -> &str {
    match name.trim() {
        "hr" => fields::HOUR,
        "mnth" => fields::MONTH,
        "day" => fields::DAY_OF_MONTH,
        "yr" => fields::YEAR_INDEX,
        "temp" => fields::TEMPERATURE,
        "atemp" => fields::FEELS_LIKE,
        "hum" => fields::HUMIDITY,
        "weathersit" | "weather" => fields::WEATHER,
        "workingday" => fields::WORKING_DAY,
        other => other,
    }
}

/// A scalar field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Numeric view of the value; `None` when it cannot be read as a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Flag(b) => Some(if *b { 1.0 } else { 0.0 }),
            FieldValue::Number(n) if n.is_finite() => Some(*n),
            FieldValue::Number(_) => None,
            FieldValue::Text(s) => {
                let s = s.trim();
                match s.to_ascii_lowercase().as_str() {
                    "on" | "yes" | "true" => Some(1.0),
                    "off" | "no" | "false" => Some(0.0),
                    _ => s.parse::<f64>().ok().filter(|v| v.is_finite()),
                }
            }
        }
    }

    /// Categorical view of the value; integral numbers render without a fraction
    pub fn as_category(&self) -> String {
        match self {
            FieldValue::Flag(b) => b.to_string(),
            FieldValue::Number(n) if n.fract() == 0.0 => format!("{}", *n as i64),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Text(s) => s.trim().to_string(),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Number(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Number(v as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Flag(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

/// One raw input record, keyed by canonical field name.
///
/// Deserializing skips `null` fields, so they read as missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, Option<FieldValue>>",
    into = "BTreeMap<String, FieldValue>"
)]
pub struct RawRecord {
    values: BTreeMap<String, FieldValue>,
}

impl RawRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.insert(field, value);
        self
    }

    /// Insert a field, normalizing its name
    pub fn insert(&mut self, field: &str, value: impl Into<FieldValue>) {
        self.values
            .insert(canonical_field_name(field).to_string(), value.into());
    }

    /// Raw value of a field
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(canonical_field_name(field))
    }

    /// Numeric value of a field, if present and readable
    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(FieldValue::as_number)
    }

    /// Categorical value of a field, if present
    pub fn category(&self, field: &str) -> Option<String> {
        self.get(field).map(FieldValue::as_category)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the record has no fields
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over fields in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl From<BTreeMap<String, FieldValue>> for RawRecord {
    fn from(map: BTreeMap<String, FieldValue>) -> Self {
        let mut record = RawRecord::new();
        for (k, v) in map {
            record.insert(&k, v);
        }
        record
    }
}

impl From<BTreeMap<String, Option<FieldValue>>> for RawRecord {
    fn from(map: BTreeMap<String, Option<FieldValue>>) -> Self {
        map.into_iter().filter_map(|(k, v)| Some((k, v?))).collect()
    }
}

impl From<RawRecord> for BTreeMap<String, FieldValue> {
    fn from(record: RawRecord) -> Self {
        record.values
    }
}

impl<K: AsRef<str>, V: Into<FieldValue>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = RawRecord::new();
        for (k, v) in iter {
            record.insert(k.as_ref(), v);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_normalized() {
        let record = RawRecord::new().with("hr", 8).with("weathersit", "Mist");
        assert_eq!(record.number(fields::HOUR), Some(8.0));
        assert_eq!(record.category("weather-situation").as_deref(), Some("Mist"));
    }

    #[test]
    fn test_text_coercion() {
        assert_eq!(FieldValue::from("0.25").as_number(), Some(0.25));
        assert_eq!(FieldValue::from("on").as_number(), Some(1.0));
        assert_eq!(FieldValue::from("No").as_number(), Some(0.0));
        assert_eq!(FieldValue::from("?").as_number(), None);
        assert_eq!(FieldValue::Number(f64::NAN).as_number(), None);
    }

    #[test]
    fn test_numeric_category() {
        assert_eq!(FieldValue::Number(3.0).as_category(), "3");
        assert_eq!(FieldValue::from(" fall ").as_category(), "fall");
    }

    #[test]
    fn test_deserialize_json() {
        let json = r#"{"hr": 8, "season": "fall", "holiday": false, "temp": "0.5"}"#;
        let record: RawRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.len(), 4);
        assert_eq!(record.number(fields::HOLIDAY), Some(0.0));
        assert_eq!(record.number(fields::TEMPERATURE), Some(0.5));
        assert_eq!(record.category(fields::SEASON).as_deref(), Some("fall"));
    }

    #[test]
    fn test_json_nulls_read_as_missing() {
        let record: RawRecord = serde_json::from_str(r#"{"hr": 8, "season": null}"#).unwrap();
        assert_eq!(record.len(), 1);
        assert_eq!(record.number(fields::HOUR), Some(8.0));
        assert!(record.get(fields::SEASON).is_none());
    }

    #[test]
    fn test_json_nested_value_rejected() {
        assert!(serde_json::from_str::<RawRecord>(r#"{"hr": [8]}"#).is_err());
    }
}
