//! Catalog-aware `SELECT *` rewriter (spec §4.H).

pub mod rewriter;

use std::collections::HashMap;

pub use rewriter::rewrite_select_star;

/// A lightweight `(schema, table) → columns` map the rewriter consults
/// (spec §6 "Catalog configuration").
pub struct LiteCatalog {
    case_sensitive: bool,
    default_schema: String,
    map: HashMap<(String, String), Vec<String>>,
}

impl LiteCatalog {
    pub fn new(case_sensitive: bool, default_schema: impl Into<String>) -> Self {
        LiteCatalog { case_sensitive, default_schema: default_schema.into(), map: HashMap::new() }
    }

    fn fold(&self, s: &str) -> String {
        if self.case_sensitive {
            s.to_string()
        } else {
            s.to_ascii_lowercase()
        }
    }

    pub fn register(&mut self, schema: Option<&str>, table: &str, columns: Vec<String>) {
        let schema = schema.unwrap_or(&self.default_schema).to_string();
        let key = (self.fold(&schema), self.fold(table));
        self.map.insert(key, columns);
    }

    /// Look up by table name, applying the default schema to unqualified
    /// names (spec §6 "Catalog configuration").
    pub fn columns_for(&self, schema: Option<&str>, table: &str) -> Option<&[String]> {
        let schema = schema.unwrap_or(&self.default_schema);
        self.map
            .get(&(self.fold(schema), self.fold(table)))
            .map(|v| v.as_slice())
    }
}
