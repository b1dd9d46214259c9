//! Values held by a store, across all three repositories
//!
//! Typed accessors never need this type; it appears where entries of every
//! repository are handled together: whole-store iteration and the change
//! records raised on the buses.

use crate::number::Number;
use crate::types::Repository;
use std::fmt;

/// A value from any repository
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean repository value
    Boolean(bool),
    /// Number repository value
    Number(Number),
    /// String repository value
    String(String),
}

impl Value {
    /// Repository this value belongs to
    pub fn repository(&self) -> Repository {
        match self {
            Value::Boolean(_) => Repository::Boolean,
            Value::Number(_) => Repository::Number,
            Value::String(_) => Repository::String,
        }
    }

    /// Boolean payload, if this is a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Number payload, if this is a number
    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    /// String payload, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        Value::Number(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

/// A flushed `(key, value)` pair yielded by store iteration
pub type Entry = (String, Value);
