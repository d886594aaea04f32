use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt};

/// Canonical column types the engine validates and coerces against.
/// Source-specific type names are normalized into these at plan load time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Int,
    Float,
    Boolean,
    String,
    Date,
    Timestamp,
    Json,
    Uuid,
    Null,
}

lazy_static! {
    static ref TYPE_NAME_MAP: HashMap<&'static str, DataType> = build_type_name_map();
}

impl DataType {
    pub fn from_name(type_name: &str) -> Result<Self, String> {
        let normalized = type_name.trim().to_uppercase();
        TYPE_NAME_MAP
            .get(normalized.as_str())
            .cloned()
            .ok_or_else(|| format!("Unknown column type: {type_name}"))
    }

    pub fn name(&self) -> &'static str {
        match self {
            DataType::Int => "INTEGER",
            DataType::Float => "FLOAT",
            DataType::Boolean => "BOOLEAN",
            DataType::String => "TEXT",
            DataType::Date => "DATE",
            DataType::Timestamp => "TIMESTAMP",
            DataType::Json => "JSON",
            DataType::Uuid => "UUID",
            DataType::Null => "NULL",
        }
    }

    /// Whether values of this type participate in numeric range checks.
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int | DataType::Float)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, DataType::Date | DataType::Timestamp)
    }
}

impl TryFrom<&str> for DataType {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        DataType::from_name(s)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn build_type_name_map() -> HashMap<&'static str, DataType> {
    use DataType::*;

    let entries = [
        ("BOOLEAN", Boolean),
        ("BOOL", Boolean),
        ("TINYINT", Int),
        ("SMALLINT", Int),
        ("INT2", Int),
        ("MEDIUMINT", Int),
        ("INT", Int),
        ("INT4", Int),
        ("INTEGER", Int),
        ("BIGINT", Int),
        ("INT8", Int),
        ("FLOAT", Float),
        ("FLOAT4", Float),
        ("FLOAT8", Float),
        ("REAL", Float),
        ("DOUBLE", Float),
        ("DOUBLE PRECISION", Float),
        ("DECIMAL", Float),
        ("NUMERIC", Float),
        ("NULL", Null),
        ("TIMESTAMP", Timestamp),
        ("TIMESTAMPTZ", Timestamp),
        ("TIMESTAMP WITHOUT TIME ZONE", Timestamp),
        ("TIMESTAMP WITH TIME ZONE", Timestamp),
        ("DATETIME", Timestamp),
        ("DATE", Date),
        ("JSON", Json),
        ("JSONB", Json),
        ("UUID", Uuid),
        ("CHAR", String),
        ("CHARACTER", String),
        ("VARCHAR", String),
        ("CHARACTER VARYING", String),
        ("BPCHAR", String),
        ("TEXT", String),
        ("TINYTEXT", String),
        ("MEDIUMTEXT", String),
        ("LONGTEXT", String),
        ("NAME", String),
    ];

    let mut map = HashMap::new();
    for (name, data_type) in entries {
        map.insert(name, data_type);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_dialect_type_names() {
        assert_eq!(DataType::from_name("bigint").unwrap(), DataType::Int);
        assert_eq!(DataType::from_name(" varchar ").unwrap(), DataType::String);
        assert_eq!(
            DataType::from_name("timestamp with time zone").unwrap(),
            DataType::Timestamp
        );
        assert!(DataType::from_name("geometry").is_err());
    }
}
