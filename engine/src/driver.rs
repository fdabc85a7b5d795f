//! Driver adapter (spec §4.F, §6) — the standard `prepare` /
//! `query_context` / `exec_context` surface over a compiled plan. The
//! generic connection-pooling/result-materialization framing itself is out
//! of scope (spec §1); this exposes the hooks an embedder's driver glue
//! would call.

use std::collections::HashMap;
use std::sync::Arc;

use common::err::decode_error::EngineError;
use common::err::CResult;
use common::value::Value;

use crate::binder::{bind, SetterMap};
use crate::compiler::{compile, Plan};
use crate::schema::Schema;
use crate::table::{InsertStatement, ScanStep, TableCursor, UpdateStatement};

/// Maps database names to a registered [`Schema`], the way a generic
/// driver's `open(name)` resolves a connection string (spec §6).
#[derive(Default)]
pub struct DbRegistry {
    databases: HashMap<String, Arc<Schema>>,
}

impl DbRegistry {
    pub fn new() -> Self {
        DbRegistry::default()
    }

    pub fn register(&mut self, name: impl Into<String>, schema: Arc<Schema>) {
        self.databases.insert(name.into(), schema);
    }

    pub fn open(&self, name: &str) -> CResult<Connection> {
        let schema = self
            .databases
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::Error(format!("unknown database: {}", name)))?;
        tracing::info!(database = name, "opened connection");
        Ok(Connection { schema })
    }
}

pub struct Connection {
    schema: Arc<Schema>,
}

impl Connection {
    /// Parses and compiles `sql` (spec §4.F "`prepare(sql)` parses and
    /// compiles").
    pub fn prepare(&self, sql: &str) -> CResult<Statement> {
        let plan = compile(&self.schema, sql)?;
        let setters = bind(&plan);
        Ok(Statement { plan, setters })
    }

    /// A `begin()` call returns no active transaction object — transactions
    /// are opened per-statement inside the back-end (spec §4.F).
    pub fn begin(&self) {}
}

pub struct Statement {
    plan: Plan,
    setters: SetterMap,
}

/// A materialized row stream from a `SELECT` (spec §6 "Rows").
pub struct Rows {
    columns: Vec<String>,
    cursor: Box<dyn TableCursor>,
    projection_len: usize,
}

impl Rows {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Fills `out` with the next row's values; returns `false` at end of
    /// stream (spec §6 "`Rows.next(out_values[])` with end-of-stream
    /// sentinel").
    pub fn next(&mut self, out: &mut [Value]) -> CResult<bool> {
        if out.len() != self.projection_len {
            return Err(EngineError::BUG(
                "Rows::next called with a buffer of the wrong width".to_string(),
            ));
        }
        match self.cursor.next(out)? {
            ScanStep::Row => Ok(true),
            ScanStep::Eof => Ok(false),
        }
    }
}

impl Statement {
    /// Variadic: always -1 (spec §6 "`Statement.num_input() → -1`").
    pub fn num_input(&self) -> i32 {
        -1
    }

    fn apply_args(&mut self, named_args: &[(String, Value)]) {
        self.setters.reset();
        for (name, value) in named_args {
            self.setters.put(name, value.clone());
        }
    }

    /// Runs a compiled `SELECT` plan (spec §4.F).
    pub fn query_context(&mut self, named_args: &[(String, Value)]) -> CResult<Rows> {
        self.apply_args(named_args);
        let select = match &self.plan {
            Plan::Select(s) => s,
            _ => return Err(EngineError::Error("query_context called on a non-SELECT statement".to_string())),
        };
        let table_columns = select.table.columns();
        let columns = select.cols.iter().map(|&i| table_columns[i].name.clone()).collect();
        let cursor = select.table.scan(&select.cols, &select.scan)?;
        Ok(Rows { columns, cursor, projection_len: select.cols.len() })
    }

    /// Runs a compiled `INSERT`/`UPDATE`/`DELETE` plan, returning the number
    /// of affected rows (spec §4.F).
    pub fn exec_context(&mut self, named_args: &[(String, Value)]) -> CResult<u64> {
        self.apply_args(named_args);
        match &self.plan {
            Plan::Insert(i) => {
                let mut stmt = i.table.prepare_insert(i.insert.clone())?;
                run_to_completion_insert(&mut *stmt)
            }
            Plan::Update(u) => {
                let mut stmt = u.table.prepare_update(u.update.clone())?;
                run_to_completion_update(&mut *stmt)
            }
            Plan::Select(_) => Err(EngineError::Error("exec_context called on a SELECT statement".to_string())),
        }
    }
}

fn run_to_completion_insert(stmt: &mut dyn InsertStatement) -> CResult<u64> {
    match stmt.execute() {
        Ok(n) => {
            stmt.close()?;
            Ok(n)
        }
        Err(e) => {
            let _ = stmt.abort();
            Err(e)
        }
    }
}

fn run_to_completion_update(stmt: &mut dyn UpdateStatement) -> CResult<u64> {
    match stmt.execute() {
        Ok(n) => {
            stmt.close()?;
            Ok(n)
        }
        Err(e) => {
            let _ = stmt.abort();
            Err(e)
        }
    }
}
