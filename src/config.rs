//! Declarative configuration for the board's data sources.
//!
//! Two JSON files drive startup: a database descriptor list
//! (`database_config.json`) naming each backend and its connection
//! parameters, and a table-routing map (`table_map.json`) saying which
//! logical tables each database hosts. Routing values are positions into
//! the descriptor list; the registry translates them to connection ids
//! once connections are actually open.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default MySQL server port.
const fn default_mysql_port() -> u16 {
    3306
}

/// One entry of the database descriptor list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DatabaseDescriptor {
    /// A networked MySQL database.
    Mysql {
        /// Server hostname or IP address.
        host: String,
        /// Login user.
        user: String,
        /// Login password.
        password: String,
        /// Database (schema) name.
        database: String,
        /// Server port, 3306 when omitted.
        #[serde(default = "default_mysql_port")]
        port: u16,
        /// Display label for dropdowns; generated from the host when omitted.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    /// An embedded SQLite database file.
    Sqlite {
        /// Path of the database file.
        path: PathBuf,
        /// Display label for dropdowns; generated from the path when omitted.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
}

impl DatabaseDescriptor {
    /// Human-readable label for this database, for UI dropdowns.
    #[must_use]
    pub fn display_label(&self) -> String {
        match self {
            Self::Mysql { host, label, .. } => {
                label.clone().unwrap_or_else(|| format!("MySQL at {host}"))
            }
            Self::Sqlite { path, label } => {
                label.clone().unwrap_or_else(|| format!("SQLite: {}", path.display()))
            }
        }
    }
}

/// Logical table name mapped to the descriptor positions hosting it.
///
/// Ordered so that lookup merges happen in a stable, documented order.
pub type TableRouting = BTreeMap<String, Vec<usize>>;

/// Full board configuration: databases plus table routing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoardConfig {
    /// Databases to open, in registration order.
    pub databases: Vec<DatabaseDescriptor>,
    /// Which databases host which logical tables.
    pub tables: TableRouting,
}

impl BoardConfig {
    /// Load configuration from the two JSON files.
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be read or parsed. Unlike
    /// connection failures, a broken config file aborts startup.
    pub fn load(databases_path: &Path, tables_path: &Path) -> Result<Self> {
        let databases = serde_json::from_str(&std::fs::read_to_string(databases_path)?)?;
        let tables = serde_json::from_str(&std::fs::read_to_string(tables_path)?)?;
        Ok(Self { databases, tables })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_descriptor_list() {
        let json = r#"[
            {"type": "mysql", "host": "10.0.0.5", "user": "gtd",
             "password": "secret", "database": "gtd_shared", "label": "Shared DB"},
            {"type": "sqlite", "path": "/home/me/gtd_local.db"}
        ]"#;

        let descriptors: Vec<DatabaseDescriptor> = serde_json::from_str(json).unwrap();
        assert_eq!(descriptors.len(), 2);

        match &descriptors[0] {
            DatabaseDescriptor::Mysql { host, port, label, .. } => {
                assert_eq!(host, "10.0.0.5");
                assert_eq!(*port, 3306);
                assert_eq!(label.as_deref(), Some("Shared DB"));
            }
            DatabaseDescriptor::Sqlite { .. } => panic!("expected mysql descriptor"),
        }
        assert_eq!(descriptors[0].display_label(), "Shared DB");
        assert_eq!(descriptors[1].display_label(), "SQLite: /home/me/gtd_local.db");
    }

    #[test]
    fn test_parse_table_routing() {
        let json = r#"{"Tasks": [0, 1], "Categories": [0], "Projects": []}"#;
        let routing: TableRouting = serde_json::from_str(json).unwrap();
        assert_eq!(routing["Tasks"], vec![0, 1]);
        assert_eq!(routing["Categories"], vec![0]);
        assert!(routing["Projects"].is_empty());
    }

    #[test]
    fn test_unknown_database_type_is_rejected() {
        let json = r#"[{"type": "postgres", "host": "x"}]"#;
        let parsed: std::result::Result<Vec<DatabaseDescriptor>, _> = serde_json::from_str(json);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_load_from_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let db_path = dir.path().join("database_config.json");
        let map_path = dir.path().join("table_map.json");
        std::fs::write(&db_path, r#"[{"type": "sqlite", "path": "a.db"}]"#).unwrap();
        std::fs::write(&map_path, r#"{"Tasks": [0]}"#).unwrap();

        let config = BoardConfig::load(&db_path, &map_path).unwrap();
        assert_eq!(config.databases.len(), 1);
        assert_eq!(config.tables["Tasks"], vec![0]);
    }
}
