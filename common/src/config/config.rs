use serde::{Deserialize, Serialize};

/// One entry of a [`CatalogConfig`]'s `[[tables]]` array (spec §6 "Catalog
/// configuration", SPEC_FULL §6 config file shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogTableEntry {
    pub schema: Option<String>,
    pub table: String,
    pub columns: Vec<String>,
}

/// Storage and catalog-rewriter configuration, loaded from a TOML file by an
/// embedder at start-up (spec §6, §4.H).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub case_sensitive: bool,

    #[serde(default = "default_schema")]
    pub default_schema: String,

    pub storage_path: String,

    #[serde(default)]
    pub tables: Vec<CatalogTableEntry>,
}

fn default_schema() -> String {
    "main".to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            case_sensitive: false,
            default_schema: default_schema(),
            storage_path: "./data.kv".to_string(),
            tables: Vec::new(),
        }
    }
}
