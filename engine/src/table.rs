//! The polymorphic back-end contract (spec §3, §4.B).

use std::cell::RefCell;
use std::rc::Rc;

use common::err::decode_error::{EngineError, ScanError, ScanErrorCode};
use common::err::CResult;
use common::value::{Column, Value};

/// A scan/filter value slot: either resolved at compile time or still a
/// placeholder sentinel (spec §3 "Placeholder", §4.E).
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarSlot {
    Value(Value),
    Placeholder { name: String },
}

pub type SlotRef = Rc<RefCell<ScalarSlot>>;

pub fn value_slot(v: Value) -> SlotRef {
    Rc::new(RefCell::new(ScalarSlot::Value(v)))
}

pub fn placeholder_slot(name: impl Into<String>) -> SlotRef {
    Rc::new(RefCell::new(ScalarSlot::Placeholder { name: name.into() }))
}

/// A list placeholder (`::name`) or a resolved list of values, used by the
/// `IN (...)` filter operator.
#[derive(Debug, Clone)]
pub enum ListSlot {
    Values(Vec<Value>),
    Placeholder { name: String },
}

pub type ListSlotRef = Rc<RefCell<ListSlot>>;

#[derive(Debug, Clone)]
pub enum FilterValue {
    Scalar(SlotRef),
    List(ListSlotRef),
}

/// Comparison operators a `TableScan` filter may carry (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    NullSafeEq,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
    In,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::NullSafeEq => "<=>",
            FilterOp::Lt => "<",
            FilterOp::Le => "<=",
            FilterOp::Gt => ">",
            FilterOp::Ge => ">=",
            FilterOp::Like => "LIKE",
            FilterOp::In => "IN",
        }
    }
}

/// One conjunct of a `TableScan.filter` (spec §3).
#[derive(Debug, Clone)]
pub struct ColumnFilter {
    pub col_idx: usize,
    pub op: FilterOp,
    pub value: FilterValue,
    pub escape: Option<SlotRef>,
}

#[derive(Debug, Clone)]
pub struct ColumnOrder {
    pub col_idx: usize,
    pub desc: bool,
}

/// A pushdown scan request (spec §3 "TableScan").
#[derive(Debug, Clone, Default)]
pub struct TableScan {
    pub filter: Vec<ColumnFilter>,
    pub order: Vec<ColumnOrder>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableOp {
    Insert,
    InsertIgnore,
    Replace,
    Update,
    Delete,
}

/// A row-oriented insert payload (spec §3 "TableInsert").
#[derive(Debug, Clone)]
pub struct TableInsert {
    pub all_cols: bool,
    pub cols: Vec<usize>,
    pub values: Vec<Vec<SlotRef>>,
    pub op: TableOp,
    pub ondup_cols: Vec<usize>,
    pub ondup_vals: Vec<SlotRef>,
}

/// A scan-and-modify update or delete job (spec §3 "TableUpdate").
#[derive(Debug, Clone)]
pub struct TableUpdate {
    pub op: TableOp,
    pub scan: TableScan,
    pub upd_cols: Vec<usize>,
    pub upd_vals: Vec<SlotRef>,
}

/// A single step of scan iteration (spec §4.B).
pub enum ScanStep {
    Row,
    Eof,
}

/// Yields rows from a `scan` call, filling the caller's projection buffer in
/// place (spec §4.B — "the projection array passed to `scan` and each `next`
/// call must be the same array").
pub trait TableCursor {
    fn next(&mut self, out: &mut [Value]) -> CResult<ScanStep>;
}

pub trait InsertStatement {
    fn execute(&mut self) -> CResult<u64>;
    fn close(&mut self) -> CResult<()>;
    fn abort(&mut self) -> CResult<()>;
}

pub trait UpdateStatement {
    fn execute(&mut self) -> CResult<u64>;
    fn close(&mut self) -> CResult<()>;
    fn abort(&mut self) -> CResult<()>;
}

/// The capability set a back-end exposes: `columns`, `scan`, and optionally
/// `prepare_insert`/`prepare_update` (spec §3 "Table").
pub trait Table {
    fn columns(&self) -> &[Column];

    fn scan(&self, projection: &[usize], scan: &TableScan) -> CResult<Box<dyn TableCursor>>;

    fn prepare_insert(&self, _insert: TableInsert) -> CResult<Box<dyn InsertStatement>> {
        Err(EngineError::NotUpdatable("table not updatable".to_string()))
    }

    fn prepare_update(&self, _update: TableUpdate) -> CResult<Box<dyn UpdateStatement>> {
        Err(EngineError::NotUpdatable("table not updatable".to_string()))
    }
}

pub fn unsupported_filter_field(col_idx: usize, name: Option<&str>) -> ScanError {
    ScanError {
        code: ScanErrorCode::FilterFieldUnsupported,
        operator: String::new(),
        field_index: col_idx,
        field_name: name.map(|s| s.to_string()),
    }
}

pub fn unsupported_filter_operator(op: FilterOp, col_idx: usize, name: Option<&str>) -> ScanError {
    ScanError {
        code: ScanErrorCode::FilterOperatorUnsupported,
        operator: op.as_str().to_string(),
        field_index: col_idx,
        field_name: name.map(|s| s.to_string()),
    }
}

pub fn unsupported_filter_operator_on_field(op: FilterOp, col_idx: usize, name: Option<&str>) -> ScanError {
    ScanError {
        code: ScanErrorCode::FilterOperatorOnField,
        operator: op.as_str().to_string(),
        field_index: col_idx,
        field_name: name.map(|s| s.to_string()),
    }
}

pub fn unsupported_order_field(col_idx: usize, name: Option<&str>) -> ScanError {
    ScanError {
        code: ScanErrorCode::OrderByField,
        operator: String::new(),
        field_index: col_idx,
        field_name: name.map(|s| s.to_string()),
    }
}

pub fn unsupported_order_direction_on_field(desc: bool, col_idx: usize, name: Option<&str>) -> ScanError {
    ScanError {
        code: ScanErrorCode::OrderByOrderField,
        operator: if desc { "DESC".to_string() } else { "ASC".to_string() },
        field_index: col_idx,
        field_name: name.map(|s| s.to_string()),
    }
}

pub fn unsupported_order_direction(desc: bool, col_idx: usize, name: Option<&str>) -> ScanError {
    ScanError {
        code: ScanErrorCode::OrderByOrder,
        operator: if desc { "DESC".to_string() } else { "ASC".to_string() },
        field_index: col_idx,
        field_name: name.map(|s| s.to_string()),
    }
}
