//! Conversion of projected values into caller types

use chrono::{DateTime, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

use crate::model::Value;

/// Value could not become the requested type
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("cannot convert {found} into {target}")]
    Mismatch { found: String, target: &'static str },

    #[error("value {value} out of range for {target}")]
    OutOfRange { value: String, target: &'static str },

    #[error("cannot deserialize record: {0}")]
    Deserialize(String),
}

impl ConversionError {
    pub(crate) fn mismatch(found: &Value, target: &'static str) -> Self {
        ConversionError::Mismatch {
            found: found.kind().map(|k| k.as_str()).unwrap_or("null").to_string(),
            target,
        }
    }

    pub(crate) fn out_of_range(value: impl ToString, target: &'static str) -> Self {
        ConversionError::OutOfRange {
            value: value.to_string(),
            target,
        }
    }
}

/// Types a projected [`Value`] can be converted into
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, ConversionError>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        Ok(value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(ConversionError::mismatch(&other, "bool")),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Int(i) => Ok(i),
            Value::Long(l) => i32::try_from(l).map_err(|_| ConversionError::out_of_range(l, "i32")),
            other => Err(ConversionError::mismatch(&other, "i32")),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Int(i) => Ok(i64::from(i)),
            Value::Long(l) => Ok(l),
            other => Err(ConversionError::mismatch(&other, "i64")),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Double(d) => Ok(d as f32),
            Value::Int(i) => Ok(i as f32),
            Value::Long(l) => Ok(l as f32),
            other => Err(ConversionError::mismatch(&other, "f32")),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Double(d) => Ok(d),
            Value::Float(f) => Ok(f64::from(f)),
            Value::Int(i) => Ok(f64::from(i)),
            Value::Long(l) => Ok(l as f64),
            Value::Decimal(d) => d.to_f64().ok_or_else(|| ConversionError::out_of_range(d, "f64")),
            other => Err(ConversionError::mismatch(&other, "f64")),
        }
    }
}

impl FromValue for Decimal {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Decimal(d) => Ok(d),
            Value::Int(i) => Ok(Decimal::from(i)),
            Value::Long(l) => Ok(Decimal::from(l)),
            Value::Double(d) => {
                Decimal::from_f64(d).ok_or_else(|| ConversionError::out_of_range(d, "decimal"))
            }
            Value::Float(f) => {
                Decimal::from_f32(f).ok_or_else(|| ConversionError::out_of_range(f, "decimal"))
            }
            other => Err(ConversionError::mismatch(&other, "decimal")),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(ConversionError::mismatch(&other, "string")),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Bytes(b) => Ok(b),
            other => Err(ConversionError::mismatch(&other, "bytes")),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Timestamp(t) => Ok(t),
            other => Err(ConversionError::mismatch(&other, "timestamp")),
        }
    }
}

impl FromValue for Uuid {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Uuid(u) => Ok(u),
            other => Err(ConversionError::mismatch(&other, "uuid")),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        Ok(value.to_json())
    }
}

/// A record projection deserialized into `T` through serde
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record<T>(pub T);

impl<T> Record<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: DeserializeOwned> FromValue for Record<T> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Record(_) => serde_json::from_value(value.to_json())
                .map(Record)
                .map_err(|e| ConversionError::Deserialize(e.to_string())),
            other => Err(ConversionError::mismatch(&other, "record")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_numeric_widening() {
        assert_eq!(i64::from_value(Value::Int(4)).unwrap(), 4);
        assert_eq!(f64::from_value(Value::Float(1.5)).unwrap(), 1.5);
        assert_eq!(
            Decimal::from_value(Value::Long(12)).unwrap(),
            Decimal::from(12)
        );
    }

    #[test]
    fn test_narrowing_checks_range() {
        assert_eq!(i32::from_value(Value::Long(12)).unwrap(), 12);
        assert!(matches!(
            i32::from_value(Value::Long(i64::MAX)),
            Err(ConversionError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_null_requires_option() {
        assert_eq!(Option::<i32>::from_value(Value::Null).unwrap(), None);
        assert_eq!(
            i32::from_value(Value::Null).unwrap_err().to_string(),
            "cannot convert null into i32"
        );
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        name: String,
        age: i32,
    }

    #[test]
    fn test_record_deserialize() {
        let value = Value::Record(vec![
            ("name".into(), Value::from("Grace")),
            ("age".into(), Value::Int(85)),
        ]);
        let Record(user) = Record::<User>::from_value(value).unwrap();
        assert_eq!(
            user,
            User {
                name: "Grace".into(),
                age: 85
            }
        );
    }

    #[test]
    fn test_record_rejects_scalar() {
        assert!(Record::<User>::from_value(Value::Int(1)).is_err());
    }
}
