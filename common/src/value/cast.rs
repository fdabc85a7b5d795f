//! MySQL `CONVERT(expr, type)` semantics (spec §4.A).

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::err::decode_error::EngineError;
use crate::err::CResult;
use crate::value::Value;

/// The cast targets `CONVERT` supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastTarget {
    Signed,
    Unsigned,
    Decimal,
    Binary,
    Char,
    Time,
    Date,
    DateTime,
}

impl CastTarget {
    pub fn parse(name: &str) -> Option<CastTarget> {
        match name.to_ascii_lowercase().as_str() {
            "signed" => Some(CastTarget::Signed),
            "unsigned" => Some(CastTarget::Unsigned),
            "decimal" => Some(CastTarget::Decimal),
            "binary" => Some(CastTarget::Binary),
            "char" => Some(CastTarget::Char),
            "time" => Some(CastTarget::Time),
            "date" => Some(CastTarget::Date),
            "datetime" => Some(CastTarget::DateTime),
            _ => None,
        }
    }
}

/// Apply a `CONVERT(value, target)` cast. Parse errors here are fatal to
/// compilation (spec §4.A — "Parse errors are fatal to compilation").
pub fn convert(value: &Value, target: CastTarget) -> CResult<Value> {
    let text_of = |v: &Value| -> CResult<String> {
        Ok(match v {
            Value::Text(s) => s.clone(),
            Value::Bytes(b) => String::from_utf8(b.clone())?,
            Value::Int(n) => n.to_string(),
            Value::Float(n) => n.to_string(),
            Value::Bool(b) => if *b { "1".to_string() } else { "0".to_string() },
            Value::Timestamp(t) => t.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
            Value::Null => "".to_string(),
        })
    };

    match target {
        CastTarget::Signed => match value {
            Value::Int(n) => Ok(Value::Int(*n)),
            Value::Float(n) => Ok(Value::Int(*n as i64)),
            Value::Bool(b) => Ok(Value::Int(if *b { 1 } else { 0 })),
            Value::Null => Ok(Value::Null),
            other => {
                let s = text_of(other)?;
                s.trim()
                    .parse::<i64>()
                    .map(Value::Int)
                    .map_err(|e| EngineError::Error(format!("CONVERT to signed: {}", e)))
            }
        },
        CastTarget::Unsigned => match value {
            Value::Int(n) if *n >= 0 => Ok(Value::Int(*n)),
            Value::Null => Ok(Value::Null),
            other => {
                let s = text_of(other)?;
                s.trim()
                    .parse::<u64>()
                    .map(|n| Value::Int(n as i64))
                    .map_err(|e| EngineError::Error(format!("CONVERT to unsigned: {}", e)))
            }
        },
        CastTarget::Decimal => {
            let s = text_of(value)?;
            BigDecimal::from_str(s.trim())
                .map(|d| Value::Text(d.to_string()))
                .map_err(|e| EngineError::Error(format!("CONVERT to decimal: {}", e)))
        }
        CastTarget::Binary => Ok(Value::Bytes(text_of(value)?.into_bytes())),
        CastTarget::Char => Ok(Value::Text(text_of(value)?)),
        CastTarget::Time => {
            let s = text_of(value)?;
            NaiveTime::parse_from_str(s.trim(), "%H:%M:%S")
                .map(|t| Value::Timestamp(NaiveDateTime::new(epoch_date(), t)))
                .map_err(|e| EngineError::Error(format!("CONVERT to time: {}", e)))
        }
        CastTarget::Date => {
            let s = text_of(value)?;
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map(|d| Value::Timestamp(NaiveDateTime::new(d, NaiveTime::from_hms_opt(0, 0, 0).unwrap())))
                .map_err(|e| EngineError::Error(format!("CONVERT to date: {}", e)))
        }
        CastTarget::DateTime => {
            let s = text_of(value)?;
            parse_timestamp(s.trim())
                .map(Value::Timestamp)
                .map_err(|e| EngineError::Error(format!("CONVERT to datetime: {}", e)))
        }
    }
}

fn epoch_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()
}

/// Try, in order, the three layouts spec §3 documents for timestamp
/// literals: full datetime with optional sub-seconds, date-only, time-only.
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, String> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(NaiveDateTime::new(d, NaiveTime::from_hms_opt(0, 0, 0).unwrap()));
    }
    if let Ok(t) = NaiveTime::parse_from_str(s, "%H:%M:%S") {
        return Ok(NaiveDateTime::new(epoch_date(), t));
    }
    Err(format!("not a recognized timestamp literal: {}", s))
}
