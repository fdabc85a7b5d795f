//! End-to-end: the catalog rewriter (spec §4.H) feeding its expanded SQL
//! straight into the compiler (spec §4.D), exactly as a `prepare` call would
//! chain them ahead of compilation.

use std::sync::Arc;

use common::value::{Column, Value, ValueKind};
use engine::catalog::LiteCatalog;
use engine::compiler::{compile, Plan};
use engine::schema::Schema;
use engine::table::{ScanStep, Table, TableCursor, TableScan};

struct People(Vec<Column>);

impl Table for People {
    fn columns(&self) -> &[Column] {
        &self.0
    }
    fn scan(&self, _projection: &[usize], _scan: &TableScan) -> common::err::CResult<Box<dyn TableCursor>> {
        struct Done;
        impl TableCursor for Done {
            fn next(&mut self, _out: &mut [Value]) -> common::err::CResult<ScanStep> {
                Ok(ScanStep::Eof)
            }
        }
        Ok(Box::new(Done))
    }
}

fn people_schema() -> Schema {
    let mut schema = Schema::new();
    schema.put(
        "people",
        Arc::new(People(vec![
            Column::new("id", ValueKind::Bytes),
            Column::new("name", ValueKind::Text),
            Column::new("age", ValueKind::Int),
        ])),
    );
    schema
}

fn people_catalog() -> LiteCatalog {
    let mut catalog = LiteCatalog::new(false, "main");
    catalog.register(None, "people", vec!["id".to_string(), "name".to_string(), "age".to_string()]);
    catalog
}

#[test]
fn rewritten_star_compiles_to_all_three_columns() {
    let catalog = people_catalog();
    let sql = engine::catalog::rewrite_select_star(&catalog, "SELECT * FROM people").unwrap();
    assert_eq!(sql, "SELECT id, name, age FROM people");

    let schema = people_schema();
    let plan = compile(&schema, &sql).unwrap();
    match plan {
        Plan::Select(s) => assert_eq!(s.cols, vec![0, 1, 2]),
        _ => panic!("expected a select plan"),
    }
}

#[test]
fn rewritten_qualified_star_compiles_the_same_as_explicit_columns() {
    let catalog = people_catalog();
    let sql = engine::catalog::rewrite_select_star(&catalog, "SELECT p.* FROM people AS p").unwrap();
    assert_eq!(sql, "SELECT p.id, p.name, p.age FROM people AS p");

    let schema = people_schema();
    let plan = compile(&schema, &sql).unwrap();
    match plan {
        Plan::Select(s) => assert_eq!(s.cols, vec![0, 1, 2]),
        _ => panic!("expected a select plan"),
    }
}
