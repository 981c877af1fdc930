//! Scalar leaf values

use std::borrow::Cow;
use std::fmt;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::debug;

/// Wire and display format of date leaves.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Value held by a leaf.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FieldValue {
    /// Field never filled in.
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl FieldValue {
    /// True for `Empty` and for empty text, the two values a required field rejects.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Empty => true,
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::Number(_) | FieldValue::Date(_) => false,
        }
    }

    /// String form used by pattern rules. None for `Empty`.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            FieldValue::Empty => None,
            FieldValue::Text(s) => Some(Cow::Borrowed(s)),
            FieldValue::Number(n) => Some(Cow::Owned(n.to_string())),
            FieldValue::Date(d) => Some(Cow::Owned(d.format(DATE_FORMAT).to_string())),
        }
    }

    /// Numeric reading used by range rules; text is parsed leniently.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) if !n.is_nan() => Some(*n),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| !n.is_nan()),
            _ => None,
        }
    }

    /// JSON encoding sent to the validation endpoint.
    pub fn to_wire(&self) -> Value {
        match self {
            FieldValue::Empty => Value::Null,
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Number(n) => match serde_json::Number::from_f64(*n) {
                Some(number) => Value::Number(number),
                None => {
                    debug!(value = %n, "non-finite number sent as null");
                    Value::Null
                }
            },
            FieldValue::Date(d) => Value::String(d.format(DATE_FORMAT).to_string()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(s) => write!(f, "{s}"),
            None => Ok(()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(d: NaiveDate) -> Self {
        FieldValue::Date(d)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or_default()
    }
}
