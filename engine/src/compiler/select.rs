//! `compile_select` (spec §4.D "Select").

use std::collections::HashMap;
use std::sync::Arc;

use common::err::decode_error::EngineError;
use common::err::CResult;
use sqlparser::ast::{Query, Select, SelectItem, SetExpr, Statement, TableFactor};

use crate::schema::Schema;
use crate::table::{ColumnOrder, Table, TableScan};

use super::filter::{resolve_column_ref, walk_conjunction};
use super::value_resolve::PositionalCounter;

pub struct SelectPlan {
    pub table: Arc<dyn Table>,
    pub cols: Vec<usize>,
    pub scan: TableScan,
}

pub fn compile_select(schema: &Schema, stmt: &Statement) -> CResult<SelectPlan> {
    let query = match stmt {
        Statement::Query(q) => q,
        other => return Err(EngineError::Unsupported(format!("not a SELECT: {}", other))),
    };
    compile_query(schema, query)
}

fn compile_query(schema: &Schema, query: &Query) -> CResult<SelectPlan> {
    if query.limit.is_some() {
        return Err(EngineError::Unsupported("LIMIT is not supported".to_string()));
    }

    let select = match query.body.as_ref() {
        SetExpr::Select(s) => s.as_ref(),
        other => return Err(EngineError::Unsupported(format!("unsupported query body: {}", other))),
    };

    let (table_name, table) = resolve_single_table(schema, select)?;
    let columns = table.columns();
    let colmap: HashMap<String, usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| (c.name.to_ascii_lowercase(), i))
        .collect();

    if !group_by_is_empty(select) {
        return Err(EngineError::Unsupported("GROUP BY is not supported".to_string()));
    }

    let cols = resolve_projection(select, &colmap)?;

    let mut counter = PositionalCounter::new();
    let mut filter = Vec::new();
    if let Some(selection) = &select.selection {
        walk_conjunction(selection, &colmap, &mut counter, &mut filter)?;
    }
    if let Some(having) = &select.having {
        walk_conjunction(having, &colmap, &mut counter, &mut filter)?;
    }

    let mut order = Vec::new();
    if let Some(order_by) = &query.order_by {
        for ob in &order_by.exprs {
            let col_idx = resolve_column_ref(&ob.expr, &colmap)?;
            let desc = matches!(ob.asc, Some(false));
            order.push(ColumnOrder { col_idx, desc });
        }
    }

    let _ = table_name;
    Ok(SelectPlan { table, cols, scan: TableScan { filter, order } })
}

fn group_by_is_empty(select: &Select) -> bool {
    // sqlparser's `GroupByExpr` shape varies across versions; comparing the
    // rendered clause against an empty group-by keeps this resilient to that.
    let rendered = select.group_by.to_string();
    rendered.trim().is_empty() || rendered.eq_ignore_ascii_case("GROUP BY")
}

fn resolve_single_table(schema: &Schema, select: &Select) -> CResult<(String, Arc<dyn Table>)> {
    if select.from.len() != 1 || !select.from[0].joins.is_empty() {
        return Err(EngineError::Unsupported(
            "exactly one table expression in FROM is required (no joins)".to_string(),
        ));
    }
    let name = match &select.from[0].relation {
        TableFactor::Table { name, .. } => name
            .0
            .last()
            .map(|i| i.value.clone())
            .ok_or_else(|| EngineError::UnknownTable("<empty table name>".to_string()))?,
        other => return Err(EngineError::Unsupported(format!("unsupported FROM expression: {}", other))),
    };
    let table = schema
        .get(&name)
        .ok_or_else(|| EngineError::UnknownTable(name.clone()))?;
    Ok((name, table))
}

fn resolve_projection(select: &Select, colmap: &HashMap<String, usize>) -> CResult<Vec<usize>> {
    let mut cols = Vec::new();
    for item in &select.projection {
        match item {
            SelectItem::Wildcard(_) => {
                cols.extend(0..colmap.len());
            }
            SelectItem::UnnamedExpr(expr) => {
                cols.push(resolve_column_ref(expr, colmap)?);
            }
            SelectItem::ExprWithAlias { expr, .. } => {
                cols.push(resolve_column_ref(expr, colmap)?);
            }
            SelectItem::QualifiedWildcard(_, _) => {
                cols.extend(0..colmap.len());
            }
        }
    }
    Ok(cols)
}
