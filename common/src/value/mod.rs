use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::err::decode_error::EngineError;
use crate::err::CResult;

pub mod cast;

/// The declared kind of a column (spec §3 "Column").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Float,
    Bool,
    Bytes,
    Text,
    Timestamp,
}

impl ValueKind {
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Bool => "bool",
            ValueKind::Bytes => "bytes",
            ValueKind::Text => "text",
            ValueKind::Timestamp => "timestamp",
        }
    }

    /// The value a cell of this kind resets to when assigned `Value::Null`.
    pub fn zero(&self) -> Value {
        match self {
            ValueKind::Int => Value::Int(0),
            ValueKind::Float => Value::Float(0.0),
            ValueKind::Bool => Value::Bool(false),
            ValueKind::Bytes => Value::Bytes(Vec::new()),
            ValueKind::Text => Value::Text(String::new()),
            ValueKind::Timestamp => Value::Timestamp(NaiveDateTime::new(
                NaiveDate::from_ymd_opt(1970, 1, 1).unwrap(),
                NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
            )),
        }
    }
}

/// A name plus a declared [`ValueKind`] (spec §3 "Column").
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub kind: ValueKind,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Column { name: name.into(), kind }
    }
}

/// The dynamic, tagged value representation every literal, placeholder
/// argument, and table cell passes through (spec §3 "Dynamic value").
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Bytes(Vec<u8>),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl Value {
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::Null => None,
            Value::Int(_) => Some(ValueKind::Int),
            Value::Float(_) => Some(ValueKind::Float),
            Value::Bool(_) => Some(ValueKind::Bool),
            Value::Bytes(_) => Some(ValueKind::Bytes),
            Value::Text(_) => Some(ValueKind::Text),
            Value::Timestamp(_) => Some(ValueKind::Timestamp),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// `get_key` (spec §4.A): only text/bytes cells serialize to key bytes.
    pub fn get_key(&self) -> CResult<Vec<u8>> {
        match self {
            Value::Bytes(b) => Ok(b.clone()),
            Value::Text(s) => Ok(s.clone().into_bytes()),
            other => Err(EngineError::Assignment {
                from: other.kind().map(|k| k.name()).unwrap_or("null").to_string(),
                to: "key".to_string(),
            }),
        }
    }

    /// `set_in_key` (spec §4.A): writes raw key bytes back into a text/bytes cell,
    /// preserving the cell's current kind.
    pub fn set_in_key(&mut self, bytes: &[u8]) -> CResult<()> {
        match self {
            Value::Bytes(_) => {
                *self = Value::Bytes(bytes.to_vec());
                Ok(())
            }
            Value::Text(_) => {
                let s = String::from_utf8(bytes.to_vec())?;
                *self = Value::Text(s);
                Ok(())
            }
            other => Err(EngineError::Assignment {
                from: "key".to_string(),
                to: other.kind().map(|k| k.name()).unwrap_or("null").to_string(),
            }),
        }
    }

    /// `get` (spec §4.A): normalize any cell into the canonical `Value`. Since
    /// cells already are `Value` in this representation, this is a clone.
    pub fn get(&self) -> Value {
        self.clone()
    }

    /// `set` (spec §4.A): assign `v` into a cell declared as `target`, applying
    /// lossless widening (integer kinds interchange freely within 64 bits,
    /// bytes and text convert freely) and resetting to the kind's zero value
    /// on null.
    pub fn set(&mut self, target: ValueKind, v: Value) -> CResult<()> {
        let widened = match (&v, target) {
            (Value::Null, _) => target.zero(),
            (Value::Int(n), ValueKind::Int) => Value::Int(*n),
            (Value::Int(n), ValueKind::Float) => Value::Float(*n as f64),
            (Value::Int(n), ValueKind::Bool) => Value::Bool(*n != 0),
            (Value::Float(n), ValueKind::Float) => Value::Float(*n),
            (Value::Float(n), ValueKind::Int) => Value::Int(*n as i64),
            (Value::Bool(b), ValueKind::Bool) => Value::Bool(*b),
            (Value::Bool(b), ValueKind::Int) => Value::Int(if *b { 1 } else { 0 }),
            (Value::Bytes(b), ValueKind::Bytes) => Value::Bytes(b.clone()),
            (Value::Bytes(b), ValueKind::Text) => Value::Text(String::from_utf8(b.clone())?),
            (Value::Text(s), ValueKind::Text) => Value::Text(s.clone()),
            (Value::Text(s), ValueKind::Bytes) => Value::Bytes(s.clone().into_bytes()),
            (Value::Timestamp(t), ValueKind::Timestamp) => Value::Timestamp(*t),
            (other, target) => {
                return Err(EngineError::Assignment {
                    from: other.kind().map(|k| k.name()).unwrap_or("null").to_string(),
                    to: target.name().to_string(),
                })
            }
        };
        *self = widened;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn get_key_round_trips_bytes() {
        let v = Value::Bytes(b"abc".to_vec());
        let key = v.get_key().unwrap();
        let mut cell = Value::Bytes(Vec::new());
        cell.set_in_key(&key).unwrap();
        assert_eq!(cell, Value::Bytes(b"abc".to_vec()));
    }

    #[test]
    fn get_key_rejects_non_string_cells() {
        let v = Value::Int(5);
        assert!(v.get_key().is_err());
    }

    #[test]
    fn set_widens_int_to_float() {
        let mut cell = Value::Float(0.0);
        cell.set(ValueKind::Float, Value::Int(7)).unwrap();
        assert_eq!(cell, Value::Float(7.0));
    }

    #[test]
    fn set_null_resets_to_zero_value() {
        let mut cell = Value::Int(42);
        cell.set(ValueKind::Int, Value::Null).unwrap();
        assert_eq!(cell, Value::Int(0));
    }

    #[test]
    fn set_rejects_incompatible_kinds() {
        let mut cell = Value::Bool(false);
        assert!(cell.set(ValueKind::Bool, Value::Bytes(vec![1])).is_err());
    }
}
