//! `SQLite` backend over `rusqlite`.

use super::{replace_task_sql, select_lookup_sql, select_tasks_sql, Backend, BackendKind};
use crate::error::Result;
use crate::lookup::{LookupId, LookupTable};
use crate::tasks::models::Task;
use rusqlite::{params, Connection, Row};
use std::path::Path;

/// An open SQLite database file.
#[derive(Debug)]
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Open (or create) the database file at `path`.
    ///
    /// The task and reference tables are created if missing, so a fresh
    /// file is immediately usable. A path in a nonexistent directory fails
    /// to open, like any other unreachable backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the schema cannot
    /// be ensured.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let backend = Self { conn };
        backend.ensure_schema()?;
        Ok(backend)
    }

    /// Create the task and reference tables if they do not exist yet.
    fn ensure_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS Tasks (
                uuid TEXT PRIMARY KEY,
                title TEXT NOT NULL DEFAULT '',
                notes TEXT NOT NULL DEFAULT '',
                category_id INTEGER,
                context_id INTEGER,
                project_uuid TEXT,
                topic_id INTEGER,
                delegated_to INTEGER,
                time_required_minutes INTEGER,
                in_focus INTEGER,
                due_date TEXT,
                defer_date TEXT,
                created_at TEXT,
                updated_at TEXT,
                is_done INTEGER,
                completed_at TEXT,
                link_from TEXT NOT NULL DEFAULT '',
                link_to TEXT NOT NULL DEFAULT '',
                is_locked INTEGER
            );

            CREATE TABLE IF NOT EXISTS Categories (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
            CREATE TABLE IF NOT EXISTS Contexts   (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
            CREATE TABLE IF NOT EXISTS Topics     (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
            CREATE TABLE IF NOT EXISTS People     (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
            CREATE TABLE IF NOT EXISTS Projects   (uuid TEXT PRIMARY KEY, name TEXT NOT NULL);
            ",
        )?;
        Ok(())
    }

    /// Decode one `Tasks` row. Never fails: NULL and malformed cells
    /// decode to unset (or false, for flags).
    fn task_from_row(row: &Row) -> Task {
        Task {
            uuid: text(row, 0),
            title: text(row, 1),
            notes: text(row, 2),
            category_id: opt_i64(row, 3),
            context_id: opt_i64(row, 4),
            project_uuid: opt_text(row, 5),
            topic_id: opt_i64(row, 6),
            delegated_to: opt_i64(row, 7),
            time_required_minutes: opt_i64(row, 8),
            in_focus: flag(row, 9),
            due_date: opt_text(row, 10),
            defer_date: opt_text(row, 11),
            created_at: opt_text(row, 12),
            updated_at: opt_text(row, 13),
            is_done: flag(row, 14),
            completed_at: opt_text(row, 15),
            link_from: text(row, 16),
            link_to: text(row, 17),
            is_locked: flag(row, 18),
            ..Task::default()
        }
    }
}

/// Nullable integer cell; NULL or a non-numeric value reads as `None`.
fn opt_i64(row: &Row, idx: usize) -> Option<i64> {
    row.get::<_, Option<i64>>(idx).ok().flatten()
}

/// Nullable text cell.
fn opt_text(row: &Row, idx: usize) -> Option<String> {
    row.get::<_, Option<String>>(idx).ok().flatten()
}

/// Required text cell; NULL reads as the empty string.
fn text(row: &Row, idx: usize) -> String {
    opt_text(row, idx).unwrap_or_default()
}

/// Boolean cell; zero or NULL is false, anything else is true.
fn flag(row: &Row, idx: usize) -> bool {
    opt_i64(row, idx).is_some_and(|v| v != 0)
}

impl Backend for SqliteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    fn fetch_tasks(&mut self) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(&select_tasks_sql())?;
        let rows = stmt.query_map([], |row| Ok(Self::task_from_row(row)))?;
        let mut tasks = Vec::new();
        for task in rows {
            tasks.push(task?);
        }
        Ok(tasks)
    }

    fn upsert_task(&mut self, task: &Task) -> Result<()> {
        self.conn.execute(
            &replace_task_sql(),
            params![
                task.uuid,
                task.title,
                task.notes,
                task.category_id,
                task.context_id,
                task.project_uuid,
                task.topic_id,
                task.delegated_to,
                task.time_required_minutes,
                task.in_focus,
                task.due_date,
                task.defer_date,
                task.created_at,
                task.updated_at,
                task.is_done,
                task.completed_at,
                task.link_from,
                task.link_to,
                task.is_locked,
            ],
        )?;
        Ok(())
    }

    fn delete_task(&mut self, uuid: &str) -> Result<bool> {
        let removed = self.conn.execute("DELETE FROM Tasks WHERE uuid = ?", params![uuid])?;
        Ok(removed > 0)
    }

    fn lookup_pairs(&mut self, table: LookupTable) -> Result<Vec<(LookupId, String)>> {
        let mut stmt = self.conn.prepare(&select_lookup_sql(table))?;
        let rows = stmt.query_map([], move |row| {
            let key = if table.is_uuid_keyed() {
                opt_text(row, 0).map(LookupId::Uuid)
            } else {
                opt_i64(row, 0).map(LookupId::Int)
            };
            Ok(key.zip(opt_text(row, 1)))
        })?;

        let mut pairs = Vec::new();
        for row in rows {
            if let Some(pair) = row? {
                pairs.push(pair);
            }
        }
        Ok(pairs)
    }
}
