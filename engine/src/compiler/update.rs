//! `compile_update` / `compile_delete` (spec §4.D "Update", "Delete").

use std::collections::HashMap;
use std::sync::Arc;

use common::err::decode_error::EngineError;
use common::err::CResult;
use sqlparser::ast::{FromTable, Statement, TableFactor};

use crate::schema::Schema;
use crate::table::{ColumnOrder, Table, TableOp, TableScan, TableUpdate};

use super::filter::{resolve_column_ref, walk_conjunction};
use super::insert::resolve_assignment_target;
use super::value_resolve::{resolve_value, PositionalCounter};

pub struct UpdatePlan {
    pub table: Arc<dyn Table>,
    pub update: TableUpdate,
}

pub fn compile_update(schema: &Schema, stmt: &Statement) -> CResult<UpdatePlan> {
    let Statement::Update { table, assignments, selection, .. } = stmt else {
        return Err(EngineError::Unsupported("not an UPDATE".to_string()));
    };

    let name = table_factor_name(&table.relation)?;
    let table_handle = schema.get(&name).ok_or_else(|| EngineError::UnknownTable(name))?;
    let colmap = column_map(&table_handle);

    let mut counter = PositionalCounter::new();
    let mut filter = Vec::new();
    if let Some(selection) = selection {
        walk_conjunction(selection, &colmap, &mut counter, &mut filter)?;
    }

    let mut upd_cols = Vec::with_capacity(assignments.len());
    let mut upd_vals = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        let col_idx = resolve_assignment_target(&assignment.target, &colmap)?;
        if col_idx == 0 {
            return Err(EngineError::Unsupported("Trying to update the primary key".to_string()));
        }
        upd_cols.push(col_idx);
        upd_vals.push(resolve_value(&assignment.value, &mut counter)?);
    }

    Ok(UpdatePlan {
        table: table_handle,
        update: TableUpdate {
            op: TableOp::Update,
            scan: TableScan { filter, order: Vec::new() },
            upd_cols,
            upd_vals,
        },
    })
}

pub fn compile_delete(schema: &Schema, stmt: &Statement) -> CResult<UpdatePlan> {
    let Statement::Delete(delete) = stmt else {
        return Err(EngineError::Unsupported("not a DELETE".to_string()));
    };
    let sqlparser::ast::Delete { tables, from, selection, order_by, limit, .. } = delete;

    if limit.is_some() {
        return Err(EngineError::Unsupported("LIMIT is not supported".to_string()));
    }
    if !tables.is_empty() {
        return Err(EngineError::Unsupported("multi-table DELETE is not supported".to_string()));
    }

    let from_tables = match from {
        FromTable::WithFromKeyword(t) | FromTable::WithoutKeyword(t) => t,
    };
    if from_tables.len() != 1 || !from_tables[0].joins.is_empty() {
        return Err(EngineError::Unsupported(
            "exactly one table expression in FROM is required (no joins)".to_string(),
        ));
    }

    let name = table_factor_name(&from_tables[0].relation)?;
    let table_handle = schema.get(&name).ok_or_else(|| EngineError::UnknownTable(name))?;
    let colmap = column_map(&table_handle);

    let mut counter = PositionalCounter::new();
    let mut filter = Vec::new();
    if let Some(selection) = selection {
        walk_conjunction(selection, &colmap, &mut counter, &mut filter)?;
    }

    let mut order = Vec::new();
    if let Some(order_by) = order_by {
        for ob in &order_by.exprs {
            let col_idx = resolve_column_ref(&ob.expr, &colmap)?;
            let desc = matches!(ob.asc, Some(false));
            order.push(ColumnOrder { col_idx, desc });
        }
    }

    Ok(UpdatePlan {
        table: table_handle,
        update: TableUpdate {
            op: TableOp::Delete,
            scan: TableScan { filter, order },
            upd_cols: Vec::new(),
            upd_vals: Vec::new(),
        },
    })
}

fn table_factor_name(factor: &TableFactor) -> CResult<String> {
    match factor {
        TableFactor::Table { name, .. } => name
            .0
            .last()
            .map(|i| i.value.clone())
            .ok_or_else(|| EngineError::UnknownTable("<empty table name>".to_string())),
        other => Err(EngineError::Unsupported(format!("unsupported table expression: {}", other))),
    }
}

fn column_map(table: &Arc<dyn Table>) -> HashMap<String, usize> {
    table
        .columns()
        .iter()
        .enumerate()
        .map(|(i, c)| (c.name.to_ascii_lowercase(), i))
        .collect()
}
