//! `resolve_value` (spec §4.D) — turns a parsed scalar expression into a
//! compiled value slot, folding literals and recording placeholders.

use common::err::decode_error::EngineError;
use common::err::CResult;
use common::value::cast::{convert, CastTarget};
use common::value::Value;
use sqlparser::ast::{Expr, UnaryOperator, Value as SqlValue};

use crate::table::{placeholder_slot, value_slot, ListSlot, ListSlotRef, SlotRef};
use std::cell::RefCell;
use std::rc::Rc;

/// Monotonic counter assigning stable names to bare `?` positional
/// placeholders within one compile call (spec §6 only names `:name`/`::name`
/// explicitly; `?` has no source name to recover, see DESIGN.md).
pub struct PositionalCounter(pub usize);

impl PositionalCounter {
    pub fn new() -> Self {
        PositionalCounter(0)
    }

    fn next_name(&mut self) -> String {
        let n = self.0;
        self.0 += 1;
        n.to_string()
    }
}

pub fn resolve_value(expr: &Expr, counter: &mut PositionalCounter) -> CResult<SlotRef> {
    match expr {
        Expr::Nested(inner) => resolve_value(inner, counter),
        Expr::UnaryOp { op: UnaryOperator::Minus, expr } => {
            let slot = resolve_value(expr, counter)?;
            let negated = match &*slot.borrow() {
                crate::table::ScalarSlot::Value(Value::Int(n)) => Value::Int(-n),
                crate::table::ScalarSlot::Value(Value::Float(n)) => Value::Float(-n),
                other => {
                    return Err(EngineError::Unsupported(format!(
                        "cannot negate non-numeric literal: {:?}",
                        other
                    )))
                }
            };
            Ok(value_slot(negated))
        }
        Expr::Value(v) => resolve_sql_value(v, counter),
        Expr::Cast { expr, data_type, .. } => {
            let slot = resolve_value(expr, counter)?;
            let target = CastTarget::parse(&data_type.to_string())
                .ok_or_else(|| EngineError::Unsupported(format!("unsupported CAST target: {}", data_type)))?;
            let current = match &*slot.borrow() {
                crate::table::ScalarSlot::Value(v) => v.clone(),
                crate::table::ScalarSlot::Placeholder { .. } => {
                    return Err(EngineError::Unsupported(
                        "CONVERT/CAST over a placeholder is not supported".to_string(),
                    ))
                }
            };
            Ok(value_slot(convert(&current, target)?))
        }
        other => Err(EngineError::Unsupported(format!(
            "unsupported value expression: {}",
            other
        ))),
    }
}

fn resolve_sql_value(v: &SqlValue, counter: &mut PositionalCounter) -> CResult<SlotRef> {
    match v {
        SqlValue::Null => Ok(value_slot(Value::Null)),
        SqlValue::Boolean(b) => Ok(value_slot(Value::Bool(*b))),
        SqlValue::SingleQuotedString(s) | SqlValue::DoubleQuotedString(s) => {
            Ok(value_slot(Value::Text(s.clone())))
        }
        SqlValue::Number(s, _) => {
            if let Ok(n) = s.parse::<i64>() {
                Ok(value_slot(Value::Int(n)))
            } else {
                let f = s
                    .parse::<f64>()
                    .map_err(|e| EngineError::Error(format!("bad numeric literal {}: {}", s, e)))?;
                Ok(value_slot(Value::Float(f)))
            }
        }
        SqlValue::HexStringLiteral(s) => {
            let bytes = hex::decode(s).map_err(|e| EngineError::Error(e.to_string()))?;
            Ok(value_slot(Value::Bytes(bytes)))
        }
        SqlValue::Placeholder(tok) => resolve_placeholder(tok, counter),
        other => Err(EngineError::Unsupported(format!("unsupported literal: {}", other))),
    }
}

fn resolve_placeholder(tok: &str, counter: &mut PositionalCounter) -> CResult<SlotRef> {
    let name = if tok == "?" {
        counter.next_name()
    } else if let Some(rest) = tok.strip_prefix("::") {
        rest.to_string()
    } else if let Some(rest) = tok.strip_prefix(':') {
        rest.to_string()
    } else {
        return Err(EngineError::Unsupported(format!("unrecognized placeholder token: {}", tok)));
    };
    Ok(placeholder_slot(name))
}

/// Resolve a list placeholder (`::name`) standing alone as an `IN (...)`
/// argument, spec §6 "List placeholder".
pub fn resolve_list_placeholder(tok: &str) -> Option<ListSlotRef> {
    tok.strip_prefix("::")
        .map(|name| Rc::new(RefCell::new(ListSlot::Placeholder { name: name.to_string() })))
}
