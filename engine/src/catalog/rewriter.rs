//! `SELECT *` → explicit column list rewriter (spec §4.H).
//!
//! Runs as a text-to-text pre-pass ahead of [`crate::compiler::compile`]: it
//! re-serializes the rewritten AST back to SQL so the compiler never has to
//! know wildcards existed.

use common::err::decode_error::EngineError;
use common::err::CResult;
use sqlparser::ast::{Expr, Ident, Query, Select, SelectItem, SetExpr, Statement, TableFactor};
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;

use super::LiteCatalog;

/// Expands every `*` / `t.*` in a single `SELECT` statement's projection list
/// against `catalog`, returning the rewritten SQL text (spec §4.H "`SELECT *
/// FROM people` → `SELECT id, name, age FROM people`").
pub fn rewrite_select_star(catalog: &LiteCatalog, sql: &str) -> CResult<String> {
    let mut statements = Parser::parse_sql(&MySqlDialect {}, sql)?;
    if statements.len() != 1 {
        return Err(EngineError::Unsupported(
            "exactly one statement per rewrite call is supported".to_string(),
        ));
    }
    if let Statement::Query(query) = &mut statements[0] {
        if let SetExpr::Select(select) = query.body.as_mut() {
            rewrite_select(catalog, select)?;
        }
    }
    Ok(statements[0].to_string())
}

fn rewrite_select(catalog: &LiteCatalog, select: &mut Select) -> CResult<()> {
    // A sub-query in FROM is expanded first regardless of whether the outer
    // `SELECT` itself has a wildcard, so a later `t.*` against it sees fully
    // named columns (spec §4.H "Sub-query-in-FROM expansion").
    if select.from.len() == 1 && select.from[0].joins.is_empty() {
        if let TableFactor::Derived { subquery, .. } = &mut select.from[0].relation {
            rewrite_query(catalog, subquery)?;
        }
    }

    if select.projection.iter().all(|item| !is_wildcard(item)) {
        return Ok(());
    }
    // Joins are out of scope for the core engine (spec §1) so the rewriter
    // only ever sees one base table expression to expand against.
    if select.from.len() != 1 || !select.from[0].joins.is_empty() {
        return Err(EngineError::Unsupported(
            "`SELECT *` can only be expanded against a single, unjoined table".to_string(),
        ));
    }
    let (columns, qualifier) = from_columns(catalog, &select.from[0].relation)?;

    let mut expanded = Vec::with_capacity(select.projection.len() + columns.len());
    for item in &select.projection {
        match item {
            SelectItem::Wildcard(_) => {
                // A single table in scope: the qualifier is suppressed
                // (spec §4.H, §8 example).
                expanded.extend(columns.iter().map(|c| unqualified(c)));
            }
            SelectItem::QualifiedWildcard(obj, _) => {
                let requested = obj.0.last().map(|i| i.value.clone()).unwrap_or_default();
                if !requested.eq_ignore_ascii_case(&qualifier) {
                    return Err(EngineError::Unsupported(format!(
                        "unknown table qualifier in wildcard: {}",
                        requested
                    )));
                }
                expanded.extend(columns.iter().map(|c| qualified(&requested, c)));
            }
            other => expanded.push(other.clone()),
        }
    }
    select.projection = expanded;
    Ok(())
}

fn is_wildcard(item: &SelectItem) -> bool {
    matches!(item, SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(_, _))
}

fn unqualified(col: &str) -> SelectItem {
    SelectItem::UnnamedExpr(Expr::Identifier(Ident::new(col)))
}

fn qualified(qualifier: &str, col: &str) -> SelectItem {
    SelectItem::UnnamedExpr(Expr::CompoundIdentifier(vec![Ident::new(qualifier), Ident::new(col)]))
}

/// Recursively expand `*` inside a sub-query, then give every still-unnamed
/// projection item an explicit alias, so its projection list is fully named
/// before the outer `SELECT` reuses it (spec §4.H).
fn rewrite_query(catalog: &LiteCatalog, query: &mut Query) -> CResult<()> {
    if let SetExpr::Select(select) = query.body.as_mut() {
        rewrite_select(catalog, select)?;
        name_projection(select);
    }
    Ok(())
}

/// Gives every projection item without an explicit name an auto-generated
/// `__i_col_<hex>` alias so the list becomes a pure rename of the underlying
/// expressions (spec §4.H). Explicit aliases and bare column references are
/// left untouched.
fn name_projection(select: &mut Select) {
    let renamed: Vec<SelectItem> = select
        .projection
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            SelectItem::ExprWithAlias { .. } => item.clone(),
            SelectItem::UnnamedExpr(Expr::Identifier(_)) | SelectItem::UnnamedExpr(Expr::CompoundIdentifier(_)) => {
                item.clone()
            }
            SelectItem::UnnamedExpr(expr) => SelectItem::ExprWithAlias {
                expr: expr.clone(),
                alias: Ident::new(auto_label(i)),
            },
            other => other.clone(),
        })
        .collect();
    select.projection = renamed;
}

/// The columns and qualifier a `FROM` expression contributes to wildcard
/// expansion: a base table looks itself up in the catalog; a derived table
/// (sub-query) reuses its own — by now fully named — projection list (spec
/// §4.H "Sub-query-in-FROM expansion reuses the sub-select's projection
/// list").
fn from_columns(catalog: &LiteCatalog, factor: &TableFactor) -> CResult<(Vec<String>, String)> {
    match factor {
        TableFactor::Table { name, alias, .. } => {
            let table = name
                .0
                .last()
                .map(|i| i.value.clone())
                .ok_or_else(|| EngineError::UnknownTable("<empty table name>".to_string()))?;
            let columns = catalog
                .columns_for(None, &table)
                .ok_or_else(|| EngineError::UnknownTable(table.clone()))?
                .to_vec();
            let qualifier = alias.as_ref().map(|a| a.name.value.clone()).unwrap_or(table);
            Ok((columns, qualifier))
        }
        TableFactor::Derived { subquery, alias, .. } => {
            let inner = match subquery.body.as_ref() {
                SetExpr::Select(s) => s.as_ref(),
                other => {
                    return Err(EngineError::Unsupported(format!(
                        "unsupported sub-query body in wildcard expansion: {}",
                        other
                    )))
                }
            };
            let columns = projection_column_names(inner);
            let qualifier = alias
                .as_ref()
                .map(|a| a.name.value.clone())
                .ok_or_else(|| EngineError::Unsupported("a derived table in FROM must be aliased".to_string()))?;
            Ok((columns, qualifier))
        }
        other => Err(EngineError::Unsupported(format!(
            "unsupported FROM expression in wildcard expansion: {}",
            other
        ))),
    }
}

/// Reads the names off an already-[`name_projection`]-ed sub-select: explicit
/// aliases and bare column references keep their name; everything else
/// carries the auto-generated label `name_projection` gave it.
fn projection_column_names(select: &Select) -> Vec<String> {
    select
        .projection
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            SelectItem::ExprWithAlias { alias, .. } => alias.value.clone(),
            SelectItem::UnnamedExpr(Expr::Identifier(id)) => id.value.clone(),
            SelectItem::UnnamedExpr(Expr::CompoundIdentifier(parts)) => {
                parts.last().map(|p| p.value.clone()).unwrap_or_else(|| auto_label(i))
            }
            _ => auto_label(i),
        })
        .collect()
}

fn auto_label(i: usize) -> String {
    format!("__i_col_{:x}", i)
}
