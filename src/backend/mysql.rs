//! `MySQL` backend over the synchronous `mysql` client.

use super::{replace_task_sql, select_lookup_sql, select_tasks_sql, Backend, BackendKind};
use crate::error::Result;
use crate::lookup::{LookupId, LookupTable};
use crate::tasks::models::Task;
use mysql::prelude::Queryable;
use mysql::{Conn, OptsBuilder, Params, Row, Value};

/// An open connection to a MySQL server.
pub struct MySqlBackend {
    conn: Conn,
}

impl MySqlBackend {
    /// Connect to a MySQL server and select the given database.
    ///
    /// # Errors
    ///
    /// Returns an error on bad credentials, an unreachable host, or an
    /// unknown database.
    pub fn connect(
        host: &str,
        user: &str,
        password: &str,
        database: &str,
        port: u16,
    ) -> Result<Self> {
        let opts = OptsBuilder::new()
            .ip_or_hostname(Some(host))
            .tcp_port(port)
            .user(Some(user))
            .pass(Some(password))
            .db_name(Some(database));
        Ok(Self { conn: Conn::new(opts)? })
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

    /// The 19 column values of a task, in wire order, for the REPLACE.
    fn task_values(task: &Task) -> Vec<Value> {
        vec![
            Value::from(task.uuid.as_str()),
            Value::from(task.title.as_str()),
            Value::from(task.notes.as_str()),
            Value::from(task.category_id),
            Value::from(task.context_id),
            Value::from(task.project_uuid.as_deref()),
            Value::from(task.topic_id),
            Value::from(task.delegated_to),
            Value::from(task.time_required_minutes),
            Value::from(task.in_focus),
            Value::from(task.due_date.as_deref()),
            Value::from(task.defer_date.as_deref()),
            Value::from(task.created_at.as_deref()),
            Value::from(task.updated_at.as_deref()),
            Value::from(task.is_done),
            Value::from(task.completed_at.as_deref()),
            Value::from(task.link_from.as_str()),
            Value::from(task.link_to.as_str()),
            Value::from(task.is_locked),
        ]
    }
}

/// A cell by index; out-of-range reads as NULL.
fn cell(row: &Row, idx: usize) -> Value {
    match row.get_opt::<Value, usize>(idx) {
        Some(Ok(value)) => value,
        _ => Value::NULL,
    }
}

/// Render a cell as text. Dates come out as ISO 8601.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::NULL => None,
        Value::Bytes(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        Value::Int(n) => Some(n.to_string()),
        Value::UInt(n) => Some(n.to_string()),
        Value::Float(x) => Some(x.to_string()),
        Value::Double(x) => Some(x.to_string()),
        Value::Date(y, mo, d, h, mi, s, 0) => {
            Some(format!("{y:04}-{mo:02}-{d:02}T{h:02}:{mi:02}:{s:02}"))
        }
        Value::Date(y, mo, d, h, mi, s, us) => {
            Some(format!("{y:04}-{mo:02}-{d:02}T{h:02}:{mi:02}:{s:02}.{us:06}"))
        }
        Value::Time(negative, days, h, mi, s, _us) => {
            let sign = if *negative { "-" } else { "" };
            let hours = *days * 24 + u32::from(*h);
            Some(format!("{sign}{hours:02}:{mi:02}:{s:02}"))
        }
    }
}

/// Read a cell as an integer; numeric text parses fallibly, anything
/// malformed reads as `None`.
fn value_int(value: &Value) -> Option<i64> {
    match value {
        Value::Int(n) => Some(*n),
        Value::UInt(n) => i64::try_from(*n).ok(),
        Value::Bytes(bytes) => std::str::from_utf8(bytes).ok()?.trim().parse().ok(),
        _ => None,
    }
}

fn opt_i64(row: &Row, idx: usize) -> Option<i64> {
    value_int(&cell(row, idx))
}

fn opt_text(row: &Row, idx: usize) -> Option<String> {
    value_text(&cell(row, idx))
}

fn text(row: &Row, idx: usize) -> String {
    opt_text(row, idx).unwrap_or_default()
}

/// Boolean cell; zero or NULL is false, anything else is true.
fn flag(row: &Row, idx: usize) -> bool {
    opt_i64(row, idx).is_some_and(|v| v != 0)
}

impl Backend for MySqlBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Mysql
    }

    fn fetch_tasks(&mut self) -> Result<Vec<Task>> {
        let rows: Vec<Row> = self.conn.query(select_tasks_sql())?;
        Ok(rows.iter().map(Self::task_from_row).collect())
    }

    fn upsert_task(&mut self, task: &Task) -> Result<()> {
        self.conn.exec_drop(replace_task_sql(), Params::Positional(Self::task_values(task)))?;
        Ok(())
    }

    fn delete_task(&mut self, uuid: &str) -> Result<bool> {
        let result = self.conn.exec_iter("DELETE FROM Tasks WHERE uuid = ?", (uuid,))?;
        Ok(result.affected_rows() > 0)
    }

    fn lookup_pairs(&mut self, table: LookupTable) -> Result<Vec<(LookupId, String)>> {
        let rows: Vec<Row> = self.conn.query(select_lookup_sql(table))?;
        let mut pairs = Vec::new();
        for row in &rows {
            let key = if table.is_uuid_keyed() {
                value_text(&cell(row, 0)).map(LookupId::Uuid)
            } else {
                value_int(&cell(row, 0)).map(LookupId::Int)
            };
            if let Some(pair) = key.zip(value_text(&cell(row, 1))) {
                pairs.push(pair);
            }
        }
        Ok(pairs)
    }
}
