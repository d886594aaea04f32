use crate::core::data_type::DataType;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, hash::Hash};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Json(serde_json::Value),
    Uuid(Uuid),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Null,
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        use Value::*;
        std::mem::discriminant(self).hash(state);
        match self {
            Int(v) => v.hash(state),
            Float(v) => {
                // Hash the bits of the float to handle NaN and -0.0 correctly
                v.to_bits().hash(state);
            }
            String(v) => v.hash(state),
            Boolean(v) => v.hash(state),
            Json(v) => {
                let json_str = serde_json::to_string(v).unwrap_or_default();
                json_str.hash(state);
            }
            Uuid(v) => v.hash(state),
            Date(v) => v.hash(state),
            Timestamp(v) => v.hash(state),
            Null => {}
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            Value::String(v) => v.trim().parse::<i64>().ok(),
            Value::Boolean(v) => Some(i64::from(*v)),
            Value::Json(v) => v.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::String(v) => v.trim().parse::<f64>().ok(),
            Value::Boolean(v) => Some(if *v { 1.0 } else { 0.0 }),
            Value::Json(v) => v.as_f64(),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<String> {
        match self {
            Value::Int(v) => Some(v.to_string()),
            Value::Float(v) => Some(v.to_string()),
            Value::String(v) => Some(v.clone()),
            Value::Boolean(v) => Some(v.to_string()),
            Value::Json(v) => Some(v.to_string()),
            Value::Uuid(v) => Some(v.to_string()),
            Value::Date(v) => Some(v.to_string()),
            Value::Timestamp(v) => Some(v.to_rfc3339()),
            Value::Null => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Int(v) => Some(*v != 0),
            Value::Float(v) => Some(*v != 0.0),
            Value::String(v) => match v.to_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            Value::Boolean(v) => Some(*v),
            Value::Json(v) => v.as_bool(),
            _ => None,
        }
    }

    /// Interprets the value as a UTC timestamp. Dates become midnight UTC;
    /// strings are accepted in RFC 3339 or `YYYY-MM-DD` form.
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(v) => Some(*v),
            Value::Date(v) => v.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt)),
            Value::String(v) => {
                if let Ok(dt) = DateTime::parse_from_rfc3339(v.trim()) {
                    return Some(dt.with_timezone(&Utc));
                }
                let date = v.trim().parse::<NaiveDate>().ok()?;
                date.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt))
            }
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(v) => Some(*v),
            Value::Timestamp(v) => Some(v.date_naive()),
            Value::String(v) => v
                .trim()
                .parse::<NaiveDate>()
                .ok()
                .or_else(|| self.as_timestamp().map(|ts| ts.date_naive())),
            _ => None,
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Value::Int(_) => DataType::Int,
            Value::Float(_) => DataType::Float,
            Value::String(_) => DataType::String,
            Value::Boolean(_) => DataType::Boolean,
            Value::Json(_) => DataType::Json,
            Value::Uuid(_) => DataType::Uuid,
            Value::Date(_) => DataType::Date,
            Value::Timestamp(_) => DataType::Timestamp,
            Value::Null => DataType::Null,
        }
    }

    /// Attempts to coerce the value into the declared type. `None` means the
    /// value cannot represent the target type; `Null` coerces to `Null`.
    pub fn coerce_to(&self, target: &DataType) -> Option<Value> {
        if self.is_null() {
            return Some(Value::Null);
        }
        if &self.data_type() == target {
            return Some(self.clone());
        }

        match target {
            DataType::Int => self.as_i64().map(Value::Int),
            DataType::Float => self.as_f64().map(Value::Float),
            DataType::Boolean => self.as_bool().map(Value::Boolean),
            DataType::String => self.as_string().map(Value::String),
            DataType::Date => self.as_date().map(Value::Date),
            DataType::Timestamp => self.as_timestamp().map(Value::Timestamp),
            DataType::Json => match self {
                Value::String(s) => serde_json::from_str(s).ok().map(Value::Json),
                _ => None,
            },
            DataType::Uuid => match self {
                Value::String(s) => Uuid::parse_str(s.trim()).ok().map(Value::Uuid),
                _ => None,
            },
            DataType::Null => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v}"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Json(v) => write!(f, "{v}"),
            Value::Uuid(v) => write!(f, "{v}"),
            Value::Date(v) => write!(f, "{v}"),
            Value::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
            Value::Null => write!(f, "NULL"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldValue {
    pub name: String,
    pub value: Option<Value>,
    pub data_type: DataType,
}

impl FieldValue {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        let data_type = value.data_type();
        Self {
            name: name.into(),
            value: Some(value),
            data_type,
        }
    }

    pub fn null(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            value: None,
            data_type,
        }
    }

    pub fn is_null(&self) -> bool {
        self.value.as_ref().is_none_or(Value::is_null)
    }
}
