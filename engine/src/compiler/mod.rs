//! Compiler (spec §4.D) — produces a back-end-neutral plan from a parsed
//! statement. Every entry point is total: it returns either a plan or a
//! [`common::err::decode_error::EngineError`] (spec §4.D "a single top-level
//! catch-any → error frame per compile entry"; in Rust this falls out of `?`
//! propagation rather than an explicit catch).

pub mod filter;
pub mod insert;
pub mod select;
pub mod update;
pub mod value_resolve;

use common::err::decode_error::EngineError;
use common::err::CResult;
use sqlparser::ast::Statement;
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;

use crate::schema::Schema;

pub use insert::{compile_insert, InsertPlan};
pub use select::{compile_select, SelectPlan};
pub use update::{compile_delete, compile_update, UpdatePlan};

pub enum Plan {
    Select(SelectPlan),
    Insert(InsertPlan),
    Update(UpdatePlan),
}

/// Parse `sql` (MySQL dialect, the external collaborator — spec §1) and
/// compile the single resulting statement against `schema`.
pub fn compile(schema: &Schema, sql: &str) -> CResult<Plan> {
    tracing::debug!(sql, "compiling statement");
    let mut statements = Parser::parse_sql(&MySqlDialect {}, sql)?;
    if statements.len() != 1 {
        return Err(EngineError::Unsupported(
            "exactly one statement per prepare call is supported".to_string(),
        ));
    }
    let stmt = statements.remove(0);
    compile_statement(schema, &stmt)
}

pub fn compile_statement(schema: &Schema, stmt: &Statement) -> CResult<Plan> {
    match stmt {
        Statement::Query(_) => compile_select(schema, stmt).map(Plan::Select),
        Statement::Insert(_) => compile_insert(schema, stmt).map(Plan::Insert),
        Statement::Update { .. } => compile_update(schema, stmt).map(Plan::Update),
        Statement::Delete(_) => compile_delete(schema, stmt).map(Plan::Update),
        other => Err(EngineError::Unsupported(format!("unsupported statement: {}", other))),
    }
}
