//! `compile_insert` (spec §4.D "Insert").

use std::collections::HashMap;
use std::sync::Arc;

use common::err::decode_error::EngineError;
use common::err::CResult;
use sqlparser::ast::{SetExpr, Statement};

use crate::schema::Schema;
use crate::table::{SlotRef, Table, TableInsert, TableOp};

use super::value_resolve::{resolve_value, PositionalCounter};

pub struct InsertPlan {
    pub table: Arc<dyn Table>,
    pub insert: TableInsert,
}

pub fn compile_insert(schema: &Schema, stmt: &Statement) -> CResult<InsertPlan> {
    let Statement::Insert(insert) = stmt else {
        return Err(EngineError::Unsupported("not an INSERT/REPLACE".to_string()));
    };
    let sqlparser::ast::Insert { table_name, columns, source, on, ignore, replace_into, .. } = insert;

    if *replace_into && *ignore {
        return Err(EngineError::Unsupported("REPLACE IGNORE is not supported".to_string()));
    }

    let name = table_name
        .0
        .last()
        .map(|i| i.value.clone())
        .ok_or_else(|| EngineError::UnknownTable("<empty table name>".to_string()))?;
    let table = schema.get(&name).ok_or_else(|| EngineError::UnknownTable(name))?;
    let table_columns = table.columns();
    let colmap: HashMap<String, usize> = table_columns
        .iter()
        .enumerate()
        .map(|(i, c)| (c.name.to_ascii_lowercase(), i))
        .collect();

    let all_cols = columns.is_empty();
    let cols: Vec<usize> = columns
        .iter()
        .map(|id| {
            colmap
                .get(&id.value.to_ascii_lowercase())
                .copied()
                .ok_or_else(|| EngineError::UnknownColumn(id.value.clone()))
        })
        .collect::<CResult<_>>()?;

    let source = source
        .as_ref()
        .ok_or_else(|| EngineError::Unsupported("INSERT requires a VALUES(...) list".to_string()))?;
    let values_rows = match source.body.as_ref() {
        SetExpr::Values(values) => &values.rows,
        other => {
            return Err(EngineError::Unsupported(format!(
                "INSERT source must be VALUES(...), found: {}",
                other
            )))
        }
    };

    let mut counter = PositionalCounter::new();
    let mut values = Vec::with_capacity(values_rows.len());
    for row in values_rows {
        let mut cells = Vec::with_capacity(row.len());
        for expr in row {
            cells.push(resolve_value(expr, &mut counter)?);
        }
        values.push(cells);
    }

    let op = if *replace_into {
        TableOp::Replace
    } else if *ignore {
        TableOp::InsertIgnore
    } else {
        TableOp::Insert
    };

    let (ondup_cols, ondup_vals) = compile_on_duplicate(on, &colmap, &mut counter)?;

    if ondup_cols.iter().any(|&c| c == 0) {
        return Err(EngineError::Unsupported(
            "ON DUPLICATE KEY UPDATE must not target the primary key".to_string(),
        ));
    }

    Ok(InsertPlan {
        table,
        insert: TableInsert { all_cols, cols, values, op, ondup_cols, ondup_vals },
    })
}

fn compile_on_duplicate(
    on: &Option<sqlparser::ast::OnInsert>,
    colmap: &HashMap<String, usize>,
    counter: &mut PositionalCounter,
) -> CResult<(Vec<usize>, Vec<SlotRef>)> {
    use sqlparser::ast::OnInsert;

    let assignments = match on {
        None => return Ok((Vec::new(), Vec::new())),
        Some(OnInsert::DuplicateKeyUpdate(assignments)) => assignments,
        Some(_) => return Err(EngineError::Unsupported("unsupported ON INSERT clause".to_string())),
    };

    let mut cols = Vec::with_capacity(assignments.len());
    let mut vals = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        let col_idx = resolve_assignment_target(&assignment.target, colmap)?;
        cols.push(col_idx);
        vals.push(resolve_value(&assignment.value, counter)?);
    }
    Ok((cols, vals))
}

pub fn resolve_assignment_target(
    target: &sqlparser::ast::AssignmentTarget,
    colmap: &HashMap<String, usize>,
) -> CResult<usize> {
    use sqlparser::ast::AssignmentTarget;

    let name = match target {
        AssignmentTarget::ColumnName(name) => name,
        AssignmentTarget::Tuple(_) => {
            return Err(EngineError::Unsupported("tuple assignment targets are not supported".to_string()))
        }
    };
    let last = name
        .0
        .last()
        .ok_or_else(|| EngineError::UnknownColumn("<empty assignment target>".to_string()))?;
    colmap
        .get(&last.value.to_ascii_lowercase())
        .copied()
        .ok_or_else(|| EngineError::UnknownColumn(last.value.clone()))
}
