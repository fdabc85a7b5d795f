//! Filter/order pushdown rules for the reference backend (spec §4.G): the
//! filter column must be the primary key (column 0) and the only supported
//! operators are the six comparisons; `ORDER BY` is only honored ascending
//! on column 0.

use std::ops::Bound;

use common::err::CResult;
use common::value::{Column, Value};
use engine::table::{unsupported_filter_field, unsupported_filter_operator, unsupported_order_direction, unsupported_order_field};
use engine::table::{FilterOp, FilterValue, ScalarSlot, TableScan};

pub struct RangePlan {
    pub start: Bound<Vec<u8>>,
    pub end: Bound<Vec<u8>>,
}

pub fn plan_range(scan: &TableScan, columns: &[Column]) -> CResult<RangePlan> {
    let mut start = Bound::Unbounded;
    let mut end = Bound::Unbounded;

    for f in &scan.filter {
        let name = columns.get(f.col_idx).map(|c| c.name.as_str());
        if f.col_idx != 0 {
            return Err(unsupported_filter_field(f.col_idx, name).into());
        }
        let value = scalar_value(&f.value, f.col_idx, name)?;
        let key = value.get_key()?;
        match f.op {
            FilterOp::Eq | FilterOp::NullSafeEq => {
                start = Bound::Included(key.clone());
                end = Bound::Included(key);
            }
            FilterOp::Lt => end = Bound::Excluded(key),
            FilterOp::Le => end = Bound::Included(key),
            FilterOp::Gt => start = Bound::Excluded(key),
            FilterOp::Ge => start = Bound::Included(key),
            other => return Err(unsupported_filter_operator(other, f.col_idx, name).into()),
        }
    }

    if let Some(order) = scan.order.first() {
        let name = columns.get(order.col_idx).map(|c| c.name.as_str());
        if order.col_idx != 0 {
            return Err(unsupported_order_field(order.col_idx, name).into());
        }
        if order.desc {
            return Err(unsupported_order_direction(true, order.col_idx, name).into());
        }
    }

    Ok(RangePlan { start, end })
}

fn scalar_value(value: &FilterValue, col_idx: usize, name: Option<&str>) -> CResult<Value> {
    match value {
        FilterValue::Scalar(slot) => match &*slot.borrow() {
            ScalarSlot::Value(v) => Ok(v.clone()),
            ScalarSlot::Placeholder { name } => Err(common::err::decode_error::EngineError::BUG(format!(
                "unbound placeholder `{}` reached scan execution",
                name
            ))),
        },
        FilterValue::List(_) => Err(unsupported_filter_operator(FilterOp::In, col_idx, name).into()),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use common::value::ValueKind;
    use engine::table::{value_slot, ColumnFilter};

    fn cols() -> Vec<Column> {
        vec![Column::new("id", ValueKind::Bytes)]
    }

    #[test]
    fn equality_pins_both_bounds() {
        let scan = TableScan {
            filter: vec![ColumnFilter {
                col_idx: 0,
                op: FilterOp::Eq,
                value: FilterValue::Scalar(value_slot(Value::Bytes(b"k".to_vec()))),
                escape: None,
            }],
            order: Vec::new(),
        };
        let plan = plan_range(&scan, &cols()).unwrap();
        assert_eq!(plan.start, Bound::Included(b"k".to_vec()));
        assert_eq!(plan.end, Bound::Included(b"k".to_vec()));
    }

    #[test]
    fn rejects_filter_on_non_key_column() {
        let scan = TableScan {
            filter: vec![ColumnFilter {
                col_idx: 1,
                op: FilterOp::Eq,
                value: FilterValue::Scalar(value_slot(Value::Int(1))),
                escape: None,
            }],
            order: Vec::new(),
        };
        assert!(plan_range(&scan, &[Column::new("id", ValueKind::Bytes), Column::new("age", ValueKind::Int)]).is_err());
    }
}
