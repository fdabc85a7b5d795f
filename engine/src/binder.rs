//! Placeholder binder (spec §4.E) — walks a compiled plan once, replacing
//! placeholder sentinels with live setter handles, then lets a driver reset
//! and populate them per invocation without recompiling.

use std::collections::HashMap;

use common::value::Value;

use crate::compiler::{InsertPlan, Plan, SelectPlan, UpdatePlan};
use crate::table::{ColumnFilter, FilterValue, ListSlot, ScalarSlot, SlotRef, TableInsert, TableUpdate};

enum Setter {
    Scalar(SlotRef),
    List(crate::table::ListSlotRef),
}

/// name → setter handle produced from one compiled plan (spec §3
/// "`SetterMap`").
#[derive(Default)]
pub struct SetterMap(HashMap<String, Setter>);

impl SetterMap {
    /// Clear every setter to its reset value — scalar setters to null, list
    /// setters to empty (spec §4.E).
    pub fn reset(&mut self) {
        for setter in self.0.values() {
            match setter {
                Setter::Scalar(slot) => *slot.borrow_mut() = ScalarSlot::Value(Value::Null),
                Setter::List(slot) => *slot.borrow_mut() = ListSlot::Values(Vec::new()),
            }
        }
    }

    /// Write `value` through the setter named `name`. Scalar setters
    /// replace; list setters append. Names with no matching slot are
    /// dropped silently (spec §3, §4.E).
    pub fn put(&mut self, name: &str, value: Value) {
        match self.0.get(name) {
            Some(Setter::Scalar(slot)) => *slot.borrow_mut() = ScalarSlot::Value(value),
            Some(Setter::List(slot)) => {
                if let ListSlot::Values(values) = &mut *slot.borrow_mut() {
                    values.push(value);
                } else {
                    *slot.borrow_mut() = ListSlot::Values(vec![value]);
                }
            }
            None => {}
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn walk_scalar(slot: &SlotRef, map: &mut SetterMap) {
    let name = match &*slot.borrow() {
        ScalarSlot::Placeholder { name } => Some(name.clone()),
        ScalarSlot::Value(_) => None,
    };
    if let Some(name) = name {
        map.0.insert(name, Setter::Scalar(slot.clone()));
        *slot.borrow_mut() = ScalarSlot::Value(Value::Null);
    }
}

fn walk_filter_value(value: &FilterValue, map: &mut SetterMap) {
    match value {
        FilterValue::Scalar(slot) => walk_scalar(slot, map),
        FilterValue::List(slot) => {
            let name = match &*slot.borrow() {
                ListSlot::Placeholder { name } => Some(name.clone()),
                ListSlot::Values(_) => None,
            };
            if let Some(name) = name {
                map.0.insert(name, Setter::List(slot.clone()));
                *slot.borrow_mut() = ListSlot::Values(Vec::new());
            }
        }
    }
}

fn walk_filters(filters: &[ColumnFilter], map: &mut SetterMap) {
    for f in filters {
        walk_filter_value(&f.value, map);
        if let Some(escape) = &f.escape {
            walk_scalar(escape, map);
        }
    }
}

fn walk_insert(insert: &TableInsert, map: &mut SetterMap) {
    for row in &insert.values {
        for cell in row {
            walk_scalar(cell, map);
        }
    }
    for v in &insert.ondup_vals {
        walk_scalar(v, map);
    }
}

fn walk_update(update: &TableUpdate, map: &mut SetterMap) {
    walk_filters(&update.scan.filter, map);
    for v in &update.upd_vals {
        walk_scalar(v, map);
    }
}

/// Bind a compiled plan, producing its `SetterMap` (spec §4.E).
pub fn bind(plan: &Plan) -> SetterMap {
    let mut map = SetterMap::default();
    match plan {
        Plan::Select(SelectPlan { scan, .. }) => walk_filters(&scan.filter, &mut map),
        Plan::Insert(InsertPlan { insert, .. }) => walk_insert(insert, &mut map),
        Plan::Update(UpdatePlan { update, .. }) => walk_update(update, &mut map),
    }
    map
}
