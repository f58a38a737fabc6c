//! Typed runtime values.
//!
//! [`TypedValue`] is what accessors hand back to callers: the result of
//! running a raw stored value through a field's caster. It is deliberately
//! wider than JSON — dates and datetimes are first-class so callers get
//! `chrono` types instead of strings.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;

/// The cast value of a single store field.
///
/// Serializes untagged: a `TypedValue` in a host's API payload looks like
/// the plain JSON value it wraps, dates as their ISO strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TypedValue {
    /// Field is unset (or explicitly null) and has no default.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    /// Arbitrary JSON-compatible structure (arrays, objects) passed through
    /// uncast.
    Json(Value),
}

impl TypedValue {
    pub fn is_null(&self) -> bool {
        matches!(self, TypedValue::Null)
    }

    /// Predicate semantics: everything except null and `false` counts as
    /// set. Zero and the empty string are truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, TypedValue::Null | TypedValue::Bool(false))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TypedValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            TypedValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TypedValue::Float(f) => Some(*f),
            TypedValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            TypedValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            TypedValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            TypedValue::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            TypedValue::Null => "null",
            TypedValue::Bool(_) => "boolean",
            TypedValue::Int(_) => "integer",
            TypedValue::Float(_) => "float",
            TypedValue::Str(_) => "string",
            TypedValue::Date(_) => "date",
            TypedValue::DateTime(_) => "datetime",
            TypedValue::Json(_) => "json",
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Null => write!(f, "null"),
            TypedValue::Bool(b) => write!(f, "{}", b),
            TypedValue::Int(i) => write!(f, "{}", i),
            TypedValue::Float(x) => write!(f, "{}", x),
            TypedValue::Str(s) => write!(f, "{}", s),
            TypedValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            TypedValue::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            TypedValue::Json(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for TypedValue {
    fn from(b: bool) -> Self {
        TypedValue::Bool(b)
    }
}

impl From<i64> for TypedValue {
    fn from(i: i64) -> Self {
        TypedValue::Int(i)
    }
}

impl From<i32> for TypedValue {
    fn from(i: i32) -> Self {
        TypedValue::Int(i as i64)
    }
}

impl From<f64> for TypedValue {
    fn from(f: f64) -> Self {
        TypedValue::Float(f)
    }
}

impl From<&str> for TypedValue {
    fn from(s: &str) -> Self {
        TypedValue::Str(s.to_string())
    }
}

impl From<String> for TypedValue {
    fn from(s: String) -> Self {
        TypedValue::Str(s)
    }
}

impl From<NaiveDate> for TypedValue {
    fn from(d: NaiveDate) -> Self {
        TypedValue::Date(d)
    }
}

impl From<DateTime<Utc>> for TypedValue {
    fn from(dt: DateTime<Utc>) -> Self {
        TypedValue::DateTime(dt)
    }
}
