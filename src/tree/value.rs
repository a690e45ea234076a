//! Host-side static types and literal values carried by query trees.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Static type of a host value (constant, column, member).
///
/// Serialized as a short name, with a trailing `?` for nullable types:
/// `"int"`, `"string"`, `"int?"`, `"guid"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ValueType {
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Decimal,
    String,
    Bool,
    Guid,
    DateTime,
    Nullable(Box<ValueType>),
}

impl ValueType {
    /// Wrap a type as nullable (idempotent).
    pub fn nullable(self) -> Self {
        match self {
            ValueType::Nullable(_) => self,
            other => ValueType::Nullable(Box::new(other)),
        }
    }

    /// Strip any nullable wrapper.
    pub fn underlying(&self) -> &ValueType {
        match self {
            ValueType::Nullable(inner) => inner.underlying(),
            other => other,
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, ValueType::Nullable(_))
    }

    fn base_name(&self) -> &'static str {
        match self {
            ValueType::Byte => "byte",
            ValueType::Short => "short",
            ValueType::Int => "int",
            ValueType::Long => "long",
            ValueType::Float => "float",
            ValueType::Double => "double",
            ValueType::Decimal => "decimal",
            ValueType::String => "string",
            ValueType::Bool => "bool",
            ValueType::Guid => "guid",
            ValueType::DateTime => "datetime",
            ValueType::Nullable(inner) => inner.base_name(),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Nullable(inner) => write!(f, "{}?", inner),
            other => f.write_str(other.base_name()),
        }
    }
}

impl FromStr for ValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(inner) = s.strip_suffix('?') {
            return inner.parse::<ValueType>().map(ValueType::nullable);
        }
        match s.to_lowercase().as_str() {
            "byte" => Ok(ValueType::Byte),
            "short" | "int16" => Ok(ValueType::Short),
            "int" | "int32" => Ok(ValueType::Int),
            "long" | "int64" => Ok(ValueType::Long),
            "float" | "single" => Ok(ValueType::Float),
            "double" => Ok(ValueType::Double),
            "decimal" => Ok(ValueType::Decimal),
            "string" => Ok(ValueType::String),
            "bool" | "boolean" => Ok(ValueType::Bool),
            "guid" | "uuid" => Ok(ValueType::Guid),
            "datetime" => Ok(ValueType::DateTime),
            other => Err(format!("unknown value type '{}'", other)),
        }
    }
}

impl TryFrom<String> for ValueType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ValueType> for String {
    fn from(value: ValueType) -> Self {
        value.to_string()
    }
}

/// Literal value of a constant node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl ConstValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ConstValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConstValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<i64> for ConstValue {
    fn from(n: i64) -> Self {
        ConstValue::Int(n)
    }
}

impl From<f64> for ConstValue {
    fn from(n: f64) -> Self {
        ConstValue::Float(n)
    }
}

impl From<bool> for ConstValue {
    fn from(b: bool) -> Self {
        ConstValue::Bool(b)
    }
}

impl From<&str> for ConstValue {
    fn from(s: &str) -> Self {
        ConstValue::String(s.to_string())
    }
}
