//! Shared `WHERE`/`HAVING` → `TableScan.filter` walk (spec §4.D).
//!
//! `HAVING` is parsed through the same walk and appended to the same filter
//! list as `WHERE` — the back-end cannot tell them apart (spec §4.D, §9 open
//! question: left as specified, since no aggregation stage exists to give it
//! different semantics).

use std::collections::HashMap;

use common::err::decode_error::EngineError;
use common::err::CResult;
use sqlparser::ast::Expr;

use sqlparser::ast::Value as SqlValue;

use super::value_resolve::{resolve_list_placeholder, resolve_value, PositionalCounter};
use crate::table::{ColumnFilter, FilterOp, FilterValue};

pub fn resolve_column_ref(expr: &Expr, colmap: &HashMap<String, usize>) -> CResult<usize> {
    match expr {
        Expr::Nested(inner) => resolve_column_ref(inner, colmap),
        Expr::Identifier(id) => colmap
            .get(&id.value.to_ascii_lowercase())
            .copied()
            .ok_or_else(|| EngineError::UnknownColumn(id.value.clone())),
        Expr::CompoundIdentifier(parts) => {
            let last = parts
                .last()
                .ok_or_else(|| EngineError::UnknownColumn("<empty identifier>".to_string()))?;
            colmap
                .get(&last.value.to_ascii_lowercase())
                .copied()
                .ok_or_else(|| EngineError::UnknownColumn(last.value.clone()))
        }
        other => Err(EngineError::Unsupported(format!(
            "expected a column reference, found: {}",
            other
        ))),
    }
}

fn binary_filter_op(op_str: &str) -> Option<FilterOp> {
    match op_str {
        "=" => Some(FilterOp::Eq),
        "<=>" => Some(FilterOp::NullSafeEq),
        "<" => Some(FilterOp::Lt),
        "<=" => Some(FilterOp::Le),
        ">" => Some(FilterOp::Gt),
        ">=" => Some(FilterOp::Ge),
        _ => None,
    }
}

/// Walk one WHERE/HAVING expression as a conjunction, appending each
/// `ColumnFilter` it produces onto `out` (spec §4.D "Select" algorithm).
pub fn walk_conjunction(
    expr: &Expr,
    colmap: &HashMap<String, usize>,
    counter: &mut PositionalCounter,
    out: &mut Vec<ColumnFilter>,
) -> CResult<()> {
    match expr {
        Expr::Nested(inner) => walk_conjunction(inner, colmap, counter, out),
        Expr::BinaryOp { left, op, right } => {
            let op_str = op.to_string();
            if op_str.eq_ignore_ascii_case("AND") {
                walk_conjunction(left, colmap, counter, out)?;
                walk_conjunction(right, colmap, counter, out)?;
                return Ok(());
            }
            if let Some(filter_op) = binary_filter_op(&op_str) {
                let col_idx = resolve_column_ref(left, colmap)?;
                let value = resolve_value(right, counter)?;
                out.push(ColumnFilter {
                    col_idx,
                    op: filter_op,
                    value: FilterValue::Scalar(value),
                    escape: None,
                });
                return Ok(());
            }
            Err(EngineError::Unsupported(format!("unsupported comparison operator: {}", op_str)))
        }
        Expr::Like { negated: false, expr, pattern, .. } => {
            let col_idx = resolve_column_ref(expr, colmap)?;
            let value = resolve_value(pattern, counter)?;
            out.push(ColumnFilter {
                col_idx,
                op: FilterOp::Like,
                value: FilterValue::Scalar(value),
                escape: None,
            });
            Ok(())
        }
        Expr::InList { expr, list, negated: false } => {
            let col_idx = resolve_column_ref(expr, colmap)?;

            // A single `::name` list placeholder standing alone as the IN
            // argument binds the whole list at once (spec §6 "List
            // placeholder"); anything else resolves item-by-item into a
            // fixed list of literals/scalar placeholders is unsupported —
            // only one list placeholder shape is recognized per §4.E's
            // list-setter semantics.
            if let [Expr::Value(SqlValue::Placeholder(tok))] = list.as_slice() {
                if let Some(list_slot) = resolve_list_placeholder(tok) {
                    out.push(ColumnFilter {
                        col_idx,
                        op: FilterOp::In,
                        value: FilterValue::List(list_slot),
                        escape: None,
                    });
                    return Ok(());
                }
            }

            let mut values = Vec::with_capacity(list.len());
            for item in list {
                let slot = resolve_value(item, counter)?;
                let v = match &*slot.borrow() {
                    crate::table::ScalarSlot::Value(v) => v.clone(),
                    crate::table::ScalarSlot::Placeholder { .. } => {
                        return Err(EngineError::Unsupported(
                            "scalar placeholders inside IN (...) are not supported; use a list placeholder".to_string(),
                        ))
                    }
                };
                values.push(v);
            }
            out.push(ColumnFilter {
                col_idx,
                op: FilterOp::In,
                value: FilterValue::List(std::rc::Rc::new(std::cell::RefCell::new(
                    crate::table::ListSlot::Values(values),
                ))),
                escape: None,
            });
            Ok(())
        }
        Expr::Between { expr, negated, low, high } => {
            let col_idx = resolve_column_ref(expr, colmap)?;
            let low_slot = resolve_value(low, counter)?;
            let high_slot = resolve_value(high, counter)?;
            if *negated {
                out.push(ColumnFilter { col_idx, op: FilterOp::Lt, value: FilterValue::Scalar(low_slot), escape: None });
                out.push(ColumnFilter { col_idx, op: FilterOp::Gt, value: FilterValue::Scalar(high_slot), escape: None });
            } else {
                out.push(ColumnFilter { col_idx, op: FilterOp::Ge, value: FilterValue::Scalar(low_slot), escape: None });
                out.push(ColumnFilter { col_idx, op: FilterOp::Le, value: FilterValue::Scalar(high_slot), escape: None });
            }
            Ok(())
        }
        other => Err(EngineError::Unsupported(format!("unsupported WHERE/HAVING clause: {}", other))),
    }
}
