//! Backend abstraction over the two database kinds.
//!
//! The registry stores every connection as a boxed [`Backend`], so the
//! lookup cache and the task repository never dispatch on backend kind
//! themselves. Both implementations use parameterized statements for every
//! write; there is no string-spliced SQL anywhere.
//!
//! Row decoding rules shared by both backends:
//! - SQL NULL decodes to `None` for every nullable column.
//! - Boolean columns decode zero to `false` and any non-zero value to
//!   `true`; NULL decodes to `false`, not to an unset state.
//! - Malformed numeric text in an id column decodes to `None` instead of
//!   failing the whole fetch.

pub mod mysql;
pub mod sqlite;

use crate::error::Result;
use crate::lookup::{LookupId, LookupTable};
use crate::tasks::models::Task;

pub use self::mysql::MySqlBackend;
pub use self::sqlite::SqliteBackend;

/// The two supported backend kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Networked MySQL server.
    Mysql,
    /// Embedded SQLite file.
    Sqlite,
}

impl BackendKind {
    /// Lowercase name matching the config `type` tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mysql => "mysql",
            Self::Sqlite => "sqlite",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One open database connection.
///
/// Methods take `&mut self` because the MySQL client requires exclusive
/// access per query; everything is single-threaded, so this costs nothing.
pub trait Backend {
    /// Which kind of backend this is.
    fn kind(&self) -> BackendKind;

    /// Fetch every row of the `Tasks` table.
    ///
    /// Returned records carry no `db_id` and no labels; the repository
    /// tags and enriches them. Row order is backend-determined.
    fn fetch_tasks(&mut self) -> Result<Vec<Task>>;

    /// Insert-or-replace a task keyed by its uuid. All persisted columns
    /// are written.
    fn upsert_task(&mut self, task: &Task) -> Result<()>;

    /// Delete a task by uuid. Returns whether a row was actually removed.
    fn delete_task(&mut self, uuid: &str) -> Result<bool>;

    /// Fetch `(key, name)` pairs from one reference table. Rows with a
    /// NULL or malformed key are skipped.
    fn lookup_pairs(&mut self, table: LookupTable) -> Result<Vec<(LookupId, String)>>;
}

/// The persisted `Tasks` columns, in wire order. Both backends select and
/// write exactly this set.
pub(crate) const TASK_COLUMNS: [&str; 19] = [
    "uuid",
    "title",
    "notes",
    "category_id",
    "context_id",
    "project_uuid",
    "topic_id",
    "delegated_to",
    "time_required_minutes",
    "in_focus",
    "due_date",
    "defer_date",
    "created_at",
    "updated_at",
    "is_done",
    "completed_at",
    "link_from",
    "link_to",
    "is_locked",
];

/// `SELECT <columns> FROM Tasks`.
pub(crate) fn select_tasks_sql() -> String {
    format!("SELECT {} FROM Tasks", TASK_COLUMNS.join(", "))
}

/// `REPLACE INTO Tasks (<columns>) VALUES (?, ...)`, valid on both
/// backends.
pub(crate) fn replace_task_sql() -> String {
    let placeholders = vec!["?"; TASK_COLUMNS.len()].join(", ");
    format!("REPLACE INTO Tasks ({}) VALUES ({placeholders})", TASK_COLUMNS.join(", "))
}

/// `SELECT <key>, name FROM <table>` for a reference table.
pub(crate) fn select_lookup_sql(table: LookupTable) -> String {
    format!("SELECT {}, name FROM {}", table.key_column(), table.table_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_sql_lists_all_columns() {
        let sql = select_tasks_sql();
        assert!(sql.starts_with("SELECT uuid, title, notes,"));
        assert!(sql.ends_with("is_locked FROM Tasks"));
    }

    #[test]
    fn test_replace_sql_has_matching_placeholder_count() {
        let sql = replace_task_sql();
        assert_eq!(sql.matches('?').count(), TASK_COLUMNS.len());
        assert!(sql.starts_with("REPLACE INTO Tasks (uuid,"));
    }

    #[test]
    fn test_lookup_sql_uses_key_column() {
        assert_eq!(select_lookup_sql(LookupTable::Projects), "SELECT uuid, name FROM Projects");
        assert_eq!(select_lookup_sql(LookupTable::Contexts), "SELECT id, name FROM Contexts");
    }
}
