//! Typed scalar values held by resource documents.

use crate::schema::AttributeType;
use chrono::{DateTime, FixedOffset, SecondsFormat};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Number, Value};
use std::cmp::Ordering;
use std::str::FromStr;

/// One scalar attribute value, typed according to its schema attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    String(String),
    Boolean(bool),
    Integer(i64),
    Decimal(Decimal),
    DateTime(DateTime<FixedOffset>),
    Reference(String),
    /// Base64 text, kept encoded
    Binary(String),
    /// Value of an `any` typed attribute, kept verbatim
    Any(Value),
}

impl ScalarValue {
    pub fn to_json(&self) -> Value {
        match self {
            Self::String(s) | Self::Reference(s) | Self::Binary(s) => Value::String(s.clone()),
            Self::Boolean(b) => Value::Bool(*b),
            Self::Integer(i) => Value::Number(Number::from(*i)),
            Self::Decimal(d) => decimal_to_json(d),
            Self::DateTime(dt) => Value::String(format_datetime(dt)),
            Self::Any(v) => v.clone(),
        }
    }

    /// Text of string-like values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Reference(s) | Self::Binary(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric value widened to a decimal.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Integer(i) => Some(Decimal::from(*i)),
            Self::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Milliseconds since the epoch, for dateTime values.
    pub fn as_epoch_millis(&self) -> Option<i64> {
        match self {
            Self::DateTime(dt) => Some(dt.timestamp_millis()),
            _ => None,
        }
    }

    pub fn data_type(&self) -> AttributeType {
        match self {
            Self::String(_) => AttributeType::String,
            Self::Boolean(_) => AttributeType::Boolean,
            Self::Integer(_) => AttributeType::Integer,
            Self::Decimal(_) => AttributeType::Decimal,
            Self::DateTime(_) => AttributeType::DateTime,
            Self::Reference(_) => AttributeType::Reference,
            Self::Binary(_) => AttributeType::Binary,
            Self::Any(_) => AttributeType::Any,
        }
    }

    /// Order two values of the same attribute.
    ///
    /// Strings honour `case_exact`; values of unrelated kinds are unordered.
    pub fn compare(&self, other: &ScalarValue, case_exact: bool) -> Option<Ordering> {
        if let (Some(a), Some(b)) = (self.as_decimal(), other.as_decimal()) {
            return Some(a.cmp(&b));
        }
        match (self, other) {
            (Self::DateTime(a), Self::DateTime(b)) => {
                Some(a.timestamp_millis().cmp(&b.timestamp_millis()))
            }
            (Self::Boolean(a), Self::Boolean(b)) => Some(a.cmp(b)),
            _ => {
                let (a, b) = (self.as_str()?, other.as_str()?);
                if case_exact {
                    Some(a.cmp(b))
                } else {
                    Some(a.to_lowercase().cmp(&b.to_lowercase()))
                }
            }
        }
    }

    /// Equality under the attribute's case sensitivity.
    pub fn equals(&self, other: &ScalarValue, case_exact: bool) -> bool {
        match (self, other) {
            (Self::Any(a), Self::Any(b)) => a == b,
            _ => self.compare(other, case_exact) == Some(Ordering::Equal),
        }
    }
}

/// Render a dateTime in RFC 3339 form, using `Z` for UTC.
pub fn format_datetime(value: &DateTime<FixedOffset>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse an RFC 3339 dateTime.
pub fn parse_datetime(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).ok()
}

/// Convert a JSON number to a decimal without going through `f64` when the
/// number is integral or written in plain notation.
pub fn decimal_from_number(number: &Number) -> Option<Decimal> {
    if let Some(i) = number.as_i64() {
        return Some(Decimal::from(i));
    }
    if let Some(u) = number.as_u64() {
        return Some(Decimal::from(u));
    }
    let text = number.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

fn decimal_to_json(value: &Decimal) -> Value {
    if value.fract().is_zero() {
        if let Some(i) = value.to_i64() {
            return Value::Number(Number::from(i));
        }
    }
    value
        .to_f64()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decimal_from_number_precision() {
        let number = json!(0.1);
        let decimal = decimal_from_number(number.as_number().unwrap()).unwrap();
        assert_eq!(decimal, Decimal::from_str("0.1").unwrap());

        let scientific: Value = serde_json::from_str("1.5e3").unwrap();
        let decimal = decimal_from_number(scientific.as_number().unwrap()).unwrap();
        assert_eq!(decimal, Decimal::from(1500));
    }

    #[test]
    fn test_integer_and_decimal_compare() {
        let a = ScalarValue::Integer(10);
        let b = ScalarValue::Decimal(Decimal::from_str("9.5").unwrap());
        assert_eq!(a.compare(&b, true), Some(Ordering::Greater));
    }

    #[test]
    fn test_case_insensitive_equality() {
        let a = ScalarValue::String("Bjensen".to_string());
        let b = ScalarValue::String("bjensen".to_string());
        assert!(a.equals(&b, false));
        assert!(!a.equals(&b, true));
    }

    #[test]
    fn test_datetime_compares_instants() {
        let utc = ScalarValue::DateTime(parse_datetime("2024-01-01T10:00:00Z").unwrap());
        let offset = ScalarValue::DateTime(parse_datetime("2024-01-01T12:00:00+02:00").unwrap());
        assert!(utc.equals(&offset, true));
    }

    #[test]
    fn test_datetime_renders_with_z() {
        let dt = parse_datetime("2024-05-01T08:30:00+00:00").unwrap();
        assert_eq!(ScalarValue::DateTime(dt).to_json(), json!("2024-05-01T08:30:00Z"));
    }

    #[test]
    fn test_unrelated_kinds_unordered() {
        let a = ScalarValue::Boolean(true);
        let b = ScalarValue::String("true".to_string());
        assert_eq!(a.compare(&b, true), None);
    }
}
