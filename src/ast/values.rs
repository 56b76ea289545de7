use crate::ast::ValueKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A literal value in the IR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstValue {
    /// NULL literal
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// String
    String(String),
    /// UUID value
    Uuid(Uuid),
}

impl ConstValue {
    /// The primitive kind this literal belongs to.
    pub fn kind(&self) -> ValueKind {
        match self {
            ConstValue::Null => ValueKind::Null,
            ConstValue::Bool(_) => ValueKind::Bool,
            ConstValue::Int(_) => ValueKind::Int,
            ConstValue::Float(_) => ValueKind::Float,
            ConstValue::String(_) => ValueKind::String,
            ConstValue::Uuid(_) => ValueKind::Uuid,
        }
    }
}

impl std::fmt::Display for ConstValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstValue::Null => write!(f, "NULL"),
            ConstValue::Bool(b) => write!(f, "{}", b),
            ConstValue::Int(n) => write!(f, "{}", n),
            ConstValue::Float(n) => write!(f, "{}", n),
            ConstValue::String(s) => write!(f, "'{}'", s),
            ConstValue::Uuid(u) => write!(f, "'{}'", u),
        }
    }
}

impl From<bool> for ConstValue {
    fn from(b: bool) -> Self {
        ConstValue::Bool(b)
    }
}

impl From<i32> for ConstValue {
    fn from(n: i32) -> Self {
        ConstValue::Int(n as i64)
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

impl From<&str> for ConstValue {
    fn from(s: &str) -> Self {
        ConstValue::String(s.to_string())
    }
}

impl From<String> for ConstValue {
    fn from(s: String) -> Self {
        ConstValue::String(s)
    }
}

impl From<Uuid> for ConstValue {
    fn from(u: Uuid) -> Self {
        ConstValue::Uuid(u)
    }
}
