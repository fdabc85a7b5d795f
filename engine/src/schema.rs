//! Case-insensitive name → table registry (spec §4.C).

use std::collections::HashMap;
use std::sync::Arc;

use crate::table::Table;

#[derive(Default)]
pub struct Schema {
    tables: HashMap<String, Arc<dyn Table>>,
    /// Original-case registration order, for catalog/rewriter enumeration
    /// (SPEC_FULL §4.C).
    names: Vec<String>,
}

impl Schema {
    pub fn new() -> Self {
        Schema::default()
    }

    pub fn put(&mut self, name: impl Into<String>, table: Arc<dyn Table>) {
        let name = name.into();
        self.tables.insert(name.to_ascii_lowercase(), table);
        self.names.push(name);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Table>> {
        self.tables.get(&name.to_ascii_lowercase()).cloned()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use common::value::{Column, ValueKind};
    use crate::table::{ScanStep, TableCursor, TableScan};
    use common::err::CResult;
    use common::value::Value;

    struct EmptyTable(Vec<Column>);
    impl Table for EmptyTable {
        fn columns(&self) -> &[Column] {
            &self.0
        }
        fn scan(&self, _projection: &[usize], _scan: &TableScan) -> CResult<Box<dyn TableCursor>> {
            struct Done;
            impl TableCursor for Done {
                fn next(&mut self, _out: &mut [Value]) -> CResult<ScanStep> {
                    Ok(ScanStep::Eof)
                }
            }
            Ok(Box::new(Done))
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut schema = Schema::new();
        schema.put("People", Arc::new(EmptyTable(vec![Column::new("id", ValueKind::Bytes)])));
        assert!(schema.get("people").is_some());
        assert!(schema.get("PEOPLE").is_some());
        assert!(schema.get("other").is_none());
    }

    #[test]
    fn names_preserve_original_case_and_order() {
        let mut schema = Schema::new();
        schema.put("People", Arc::new(EmptyTable(vec![])));
        schema.put("Orders", Arc::new(EmptyTable(vec![])));
        assert_eq!(schema.names(), &["People".to_string(), "Orders".to_string()]);
    }
}
