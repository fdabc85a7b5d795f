pub mod config;

use std::fs::File;
use std::io::Read;
use std::path::Path;

pub use config::{CatalogConfig, CatalogTableEntry};

use crate::err::decode_error::EngineError;

/// Read a [`CatalogConfig`] from a TOML file at `path`.
pub fn read_config<P: AsRef<Path>>(path: P) -> Result<CatalogConfig, EngineError> {
    let mut file = File::open(path.as_ref())?;
    let mut s = String::new();
    file.read_to_string(&mut s)?;
    toml::from_str(s.as_str()).map_err(|e| EngineError::ConfigFileParseErr(e.to_string()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_fill_in_missing_fields() {
        let toml_src = "storage_path = \"./people.kv\"\n";
        let cfg: CatalogConfig = toml::from_str(toml_src).unwrap();
        assert_eq!(cfg.default_schema, "main");
        assert!(!cfg.case_sensitive);
        assert!(cfg.tables.is_empty());
    }

    #[test]
    fn parses_table_catalog_entries() {
        let toml_src = r#"
storage_path = "./data.kv"

[[tables]]
schema = "main"
table = "people"
columns = ["id", "name", "age"]
"#;
        let cfg: CatalogConfig = toml::from_str(toml_src).unwrap();
        assert_eq!(cfg.tables.len(), 1);
        assert_eq!(cfg.tables[0].table, "people");
        assert_eq!(cfg.tables[0].columns, vec!["id", "name", "age"]);
    }
}
