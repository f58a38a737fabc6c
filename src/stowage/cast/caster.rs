use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::error::{Result, StowageError};
use crate::value::TypedValue;

/// A type-specific bidirectional converter between raw container values and
/// typed values.
///
/// Casters are stateless and shared across every field declared with the
/// same descriptor. `cast` never mutates anything; callers decide what to
/// do with the result.
pub trait Caster: Send + Sync {
    /// Convert arbitrary raw input into the declared type.
    fn cast(&self, raw: &Value) -> Result<TypedValue>;

    /// Convert a typed value into the representation stored in the
    /// container. Only values this caster produces (plus `Null`) are
    /// accepted.
    fn serialize(&self, typed: &TypedValue) -> Result<Value>;
}

fn cast_error(target: &'static str, raw: &Value, reason: impl Into<String>) -> StowageError {
    StowageError::Cast {
        target,
        value: raw.to_string(),
        reason: reason.into(),
    }
}

fn serialize_error(target: &'static str, typed: &TypedValue) -> StowageError {
    StowageError::Cast {
        target,
        value: typed.to_string(),
        reason: format!("cannot serialize a {} value", typed.type_name()),
    }
}

// Mirrors the usual false-literal set for form input. Anything else
// non-empty casts to true.
const FALSE_STRINGS: &[&str] = &["0", "f", "F", "false", "FALSE", "off", "OFF"];

pub struct BooleanCaster;

impl Caster for BooleanCaster {
    fn cast(&self, raw: &Value) -> Result<TypedValue> {
        match raw {
            Value::Null => Ok(TypedValue::Null),
            Value::Bool(b) => Ok(TypedValue::Bool(*b)),
            Value::Number(n) => {
                let is_zero = n.as_f64().map(|f| f == 0.0).unwrap_or(false);
                Ok(TypedValue::Bool(!is_zero))
            }
            Value::String(s) if s.is_empty() => Ok(TypedValue::Null),
            Value::String(s) => Ok(TypedValue::Bool(!FALSE_STRINGS.contains(&s.as_str()))),
            _ => Err(cast_error("boolean", raw, "expected a scalar")),
        }
    }

    fn serialize(&self, typed: &TypedValue) -> Result<Value> {
        match typed {
            TypedValue::Null => Ok(Value::Null),
            TypedValue::Bool(b) => Ok(Value::Bool(*b)),
            other => Err(serialize_error("boolean", other)),
        }
    }
}

pub struct IntegerCaster {
    limit: Option<u32>,
}

impl IntegerCaster {
    pub fn new(limit: Option<u32>) -> Self {
        Self { limit }
    }

    /// Signed range for a storage width in bytes. Widths of 8 or more
    /// cover all of i64, so no check applies.
    fn range(&self) -> Option<(i64, i64)> {
        match self.limit {
            Some(limit) if limit >= 1 && limit < 8 => {
                let bits = 8 * limit - 1;
                Some((-(1i64 << bits), (1i64 << bits) - 1))
            }
            _ => None,
        }
    }

    fn check_range(&self, i: i64, raw: &Value) -> Result<i64> {
        if let Some((min, max)) = self.range() {
            if i < min || i > max {
                return Err(StowageError::OutOfRange {
                    target: "integer",
                    value: raw.to_string(),
                    min,
                    max,
                });
            }
        }
        Ok(i)
    }
}

impl Caster for IntegerCaster {
    fn cast(&self, raw: &Value) -> Result<TypedValue> {
        let i = match raw {
            Value::Null => return Ok(TypedValue::Null),
            Value::Bool(b) => {
                if *b {
                    1
                } else {
                    0
                }
            }
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    i
                } else if let Some(f) = n.as_f64() {
                    if !f.is_finite() || f < i64::MIN as f64 || f > i64::MAX as f64 {
                        return Err(cast_error("integer", raw, "not representable as i64"));
                    }
                    f.trunc() as i64
                } else {
                    return Err(cast_error("integer", raw, "not representable as i64"));
                }
            }
            Value::String(s) => {
                let trimmed = s.trim();
                if let Ok(i) = trimmed.parse::<i64>() {
                    i
                } else if let Ok(f) = trimmed.parse::<f64>() {
                    if !f.is_finite() || f < i64::MIN as f64 || f > i64::MAX as f64 {
                        return Err(cast_error("integer", raw, "not representable as i64"));
                    }
                    f.trunc() as i64
                } else {
                    return Err(cast_error("integer", raw, "not a numeric string"));
                }
            }
            _ => return Err(cast_error("integer", raw, "expected a scalar")),
        };
        Ok(TypedValue::Int(self.check_range(i, raw)?))
    }

    fn serialize(&self, typed: &TypedValue) -> Result<Value> {
        match typed {
            TypedValue::Null => Ok(Value::Null),
            TypedValue::Int(i) => Ok(Value::from(*i)),
            other => Err(serialize_error("integer", other)),
        }
    }
}

pub struct FloatCaster {
    precision: Option<u32>,
    scale: Option<u32>,
}

impl FloatCaster {
    pub fn new(precision: Option<u32>, scale: Option<u32>) -> Self {
        Self { precision, scale }
    }

    fn round(&self, x: f64) -> f64 {
        if let Some(scale) = self.scale {
            let factor = 10f64.powi(scale as i32);
            (x * factor).round() / factor
        } else if let Some(precision) = self.precision {
            if x == 0.0 || !x.is_finite() {
                x
            } else {
                let digits = precision as i32 - 1 - x.abs().log10().floor() as i32;
                let factor = 10f64.powi(digits);
                (x * factor).round() / factor
            }
        } else {
            x
        }
    }
}

impl Caster for FloatCaster {
    fn cast(&self, raw: &Value) -> Result<TypedValue> {
        let x = match raw {
            Value::Null => return Ok(TypedValue::Null),
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| cast_error("float", raw, "not representable as f64"))?,
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| cast_error("float", raw, "not a numeric string"))?,
            _ => return Err(cast_error("float", raw, "expected a number")),
        };
        Ok(TypedValue::Float(self.round(x)))
    }

    fn serialize(&self, typed: &TypedValue) -> Result<Value> {
        match typed {
            TypedValue::Null => Ok(Value::Null),
            TypedValue::Float(x) if x.is_finite() => Ok(Value::from(*x)),
            TypedValue::Float(_) => Err(serialize_error("float", typed)),
            other => Err(serialize_error("float", other)),
        }
    }
}

pub struct StringCaster;

impl Caster for StringCaster {
    fn cast(&self, raw: &Value) -> Result<TypedValue> {
        match raw {
            Value::Null => Ok(TypedValue::Null),
            Value::String(s) => Ok(TypedValue::Str(s.clone())),
            Value::Bool(b) => Ok(TypedValue::Str(b.to_string())),
            Value::Number(n) => Ok(TypedValue::Str(n.to_string())),
            _ => Err(cast_error("string", raw, "expected a scalar")),
        }
    }

    fn serialize(&self, typed: &TypedValue) -> Result<Value> {
        match typed {
            TypedValue::Null => Ok(Value::Null),
            TypedValue::Str(s) => Ok(Value::String(s.clone())),
            other => Err(serialize_error("string", other)),
        }
    }
}

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct DateCaster;

impl Caster for DateCaster {
    fn cast(&self, raw: &Value) -> Result<TypedValue> {
        match raw {
            Value::Null => Ok(TypedValue::Null),
            Value::String(s) => {
                let trimmed = s.trim();
                if let Ok(d) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
                    return Ok(TypedValue::Date(d));
                }
                // A full timestamp narrows to its calendar date.
                if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
                    return Ok(TypedValue::Date(dt.with_timezone(&Utc).date_naive()));
                }
                Err(cast_error("date", raw, "expected YYYY-MM-DD"))
            }
            _ => Err(cast_error("date", raw, "expected a date string")),
        }
    }

    fn serialize(&self, typed: &TypedValue) -> Result<Value> {
        match typed {
            TypedValue::Null => Ok(Value::Null),
            TypedValue::Date(d) => Ok(Value::String(d.format(DATE_FORMAT).to_string())),
            other => Err(serialize_error("date", other)),
        }
    }
}

const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

pub struct DateTimeCaster;

impl Caster for DateTimeCaster {
    fn cast(&self, raw: &Value) -> Result<TypedValue> {
        match raw {
            Value::Null => Ok(TypedValue::Null),
            Value::String(s) => {
                let trimmed = s.trim();
                if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
                    return Ok(TypedValue::DateTime(dt.with_timezone(&Utc)));
                }
                // Offset-less timestamps are taken as UTC.
                for format in NAIVE_DATETIME_FORMATS {
                    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
                        return Ok(TypedValue::DateTime(naive.and_utc()));
                    }
                }
                Err(cast_error("datetime", raw, "unrecognized timestamp format"))
            }
            Value::Number(n) => {
                let secs = n
                    .as_i64()
                    .ok_or_else(|| cast_error("datetime", raw, "expected unix seconds"))?;
                DateTime::from_timestamp(secs, 0)
                    .map(TypedValue::DateTime)
                    .ok_or_else(|| cast_error("datetime", raw, "unix seconds out of range"))
            }
            _ => Err(cast_error("datetime", raw, "expected a timestamp")),
        }
    }

    fn serialize(&self, typed: &TypedValue) -> Result<Value> {
        match typed {
            TypedValue::Null => Ok(Value::Null),
            TypedValue::DateTime(dt) => Ok(Value::String(
                dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            )),
            other => Err(serialize_error("datetime", other)),
        }
    }
}

/// Pass-through caster for nested JSON-compatible values.
pub struct JsonCaster;

impl Caster for JsonCaster {
    fn cast(&self, raw: &Value) -> Result<TypedValue> {
        match raw {
            Value::Null => Ok(TypedValue::Null),
            other => Ok(TypedValue::Json(other.clone())),
        }
    }

    fn serialize(&self, typed: &TypedValue) -> Result<Value> {
        match typed {
            TypedValue::Null => Ok(Value::Null),
            TypedValue::Json(v) => Ok(v.clone()),
            other => Err(serialize_error("json", other)),
        }
    }
}
