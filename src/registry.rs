//! The set of open database connections and the logical-table routing map.
//!
//! The registry owns every backend handle for the life of the process and
//! hands out stable indices ([`ConnectionId`]) that task records carry as
//! their `db_id`. Ids are assigned in registration order and never reused
//! or reordered, so a record's owner stays meaningful for the whole
//! session.

use crate::backend::{Backend, BackendKind, MySqlBackend, SqliteBackend};
use crate::config::{BoardConfig, DatabaseDescriptor};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stable index of a registered connection.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ConnectionId(usize);

impl ConnectionId {
    /// The underlying index, for positional UI widgets.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One registered connection slot. The backend becomes `None` once
/// closed; the slot itself is never removed, keeping ids stable.
struct Slot {
    label: String,
    kind: BackendKind,
    backend: Option<Box<dyn Backend>>,
}

/// Registry of open connections plus the table-routing map.
#[derive(Default)]
pub struct ConnectionRegistry {
    slots: Vec<Slot>,
    routes: BTreeMap<String, Vec<ConnectionId>>,
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("connections", &self.slots.len())
            .field("routes", &self.routes)
            .finish()
    }
}

impl ConnectionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open every configured database and install the routing map.
    ///
    /// A connection that fails to open is logged and skipped; a partially
    /// available registry is acceptable. Routing entries are translated
    /// from descriptor positions to assigned connection ids, and routes
    /// pointing at skipped or out-of-range entries are dropped with a
    /// warning so a stale position can never alias a different live
    /// connection.
    #[must_use]
    pub fn from_config(config: &BoardConfig) -> Self {
        let mut registry = Self::new();

        let mut assigned: Vec<Option<ConnectionId>> = Vec::with_capacity(config.databases.len());
        for descriptor in &config.databases {
            match registry.register(descriptor) {
                Ok(id) => assigned.push(Some(id)),
                Err(err) => {
                    tracing::warn!(
                        label = %descriptor.display_label(),
                        error = %err,
                        "failed to open database; skipping"
                    );
                    assigned.push(None);
                }
            }
        }

        for (table, positions) in &config.tables {
            let ids: Vec<ConnectionId> = positions
                .iter()
                .filter_map(|&position| {
                    let id = assigned.get(position).copied().flatten();
                    if id.is_none() {
                        tracing::warn!(
                            table = %table,
                            position,
                            "route refers to an unavailable database; dropped"
                        );
                    }
                    id
                })
                .collect();
            registry.set_route(table.clone(), ids);
        }

        registry
    }

    /// Open a connection for a descriptor and assign it the next id.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be opened (bad credentials,
    /// unreachable host, unopenable file); nothing is registered then.
    pub fn register(&mut self, descriptor: &DatabaseDescriptor) -> Result<ConnectionId> {
        let backend: Box<dyn Backend> = match descriptor {
            DatabaseDescriptor::Mysql { host, user, password, database, port, .. } => {
                tracing::info!(host = %host, port = *port, "connecting to MySQL");
                Box::new(MySqlBackend::connect(host, user, password, database, *port)?)
            }
            DatabaseDescriptor::Sqlite { path, .. } => {
                tracing::info!(path = %path.display(), "opening SQLite file");
                Box::new(SqliteBackend::open(path)?)
            }
        };
        Ok(self.register_backend(descriptor.display_label(), backend))
    }

    /// Register an already-open backend under a display label.
    ///
    /// This is the seam the constructors above go through; it also lets
    /// tests inject doubles without touching a real database.
    pub fn register_backend(&mut self, label: String, backend: Box<dyn Backend>) -> ConnectionId {
        let id = ConnectionId(self.slots.len());
        tracing::info!(connection = %id, label = %label, kind = %backend.kind(), "registered connection");
        self.slots.push(Slot { label, kind: backend.kind(), backend: Some(backend) });
        id
    }

    /// Declare which connections host a logical table.
    pub fn set_route(&mut self, table: String, ids: Vec<ConnectionId>) {
        self.routes.insert(table, ids);
    }

    /// Every connection declared to host a logical table, in the declared
    /// order. Empty when no source provides the table.
    #[must_use]
    pub fn route_for(&self, table: &str) -> &[ConnectionId] {
        self.routes.get(table).map_or(&[], Vec::as_slice)
    }

    /// Mutable access to the backend behind an id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownConnection`] for a never-assigned id and
    /// [`Error::ConnectionClosed`] after `close_all`.
    pub fn backend_mut(&mut self, id: ConnectionId) -> Result<&mut dyn Backend> {
        let slot = self.slots.get_mut(id.0).ok_or(Error::UnknownConnection(id))?;
        let backend = slot.backend.as_deref_mut().ok_or(Error::ConnectionClosed(id))?;
        Ok(backend)
    }

    /// Ids of every registered connection, in registration order.
    pub fn ids(&self) -> impl Iterator<Item = ConnectionId> {
        (0..self.slots.len()).map(ConnectionId)
    }

    /// Number of registered connections (open or closed).
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no connection was registered at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Display label of a connection.
    #[must_use]
    pub fn label(&self, id: ConnectionId) -> Option<&str> {
        self.slots.get(id.0).map(|slot| slot.label.as_str())
    }

    /// Backend kind of a connection.
    #[must_use]
    pub fn kind(&self, id: ConnectionId) -> Option<BackendKind> {
        self.slots.get(id.0).map(|slot| slot.kind)
    }

    /// All display labels, in id order, for the database dropdown.
    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        self.slots.iter().map(|slot| slot.label.as_str()).collect()
    }

    /// Release every open connection. Idempotent, and safe to call after
    /// a partial startup; ids stay assigned, but using them afterwards
    /// yields [`Error::ConnectionClosed`].
    pub fn close_all(&mut self) {
        let open = self.slots.iter().filter(|slot| slot.backend.is_some()).count();
        if open > 0 {
            tracing::info!(connections = open, "closing all database connections");
        }
        for slot in &mut self.slots {
            slot.backend = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TableRouting;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn sqlite_descriptor(dir: &TempDir, file: &str, label: &str) -> DatabaseDescriptor {
        DatabaseDescriptor::Sqlite {
            path: dir.path().join(file),
            label: Some(label.to_string()),
        }
    }

    #[test]
    fn test_register_assigns_sequential_ids() {
        let dir = TempDir::new().unwrap();
        let mut registry = ConnectionRegistry::new();

        let a = registry.register(&sqlite_descriptor(&dir, "a.db", "A")).unwrap();
        let b = registry.register(&sqlite_descriptor(&dir, "b.db", "B")).unwrap();

        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.labels(), vec!["A", "B"]);
        assert_eq!(registry.kind(a), Some(BackendKind::Sqlite));
    }

    #[test]
    fn test_from_config_skips_failed_connection_and_translates_routes() {
        let dir = TempDir::new().unwrap();
        let config = BoardConfig {
            databases: vec![
                DatabaseDescriptor::Sqlite {
                    path: PathBuf::from("/nonexistent/dir/broken.db"),
                    label: None,
                },
                sqlite_descriptor(&dir, "ok.db", "OK"),
            ],
            tables: TableRouting::from([
                ("Tasks".to_string(), vec![0, 1]),
                ("Categories".to_string(), vec![0]),
                ("Topics".to_string(), vec![7]),
            ]),
        };

        let registry = ConnectionRegistry::from_config(&config);

        // Only the good descriptor registered; it got id 0.
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.labels(), vec!["OK"]);

        // The broken position 0 and out-of-range position 7 were dropped.
        assert_eq!(registry.route_for("Tasks").len(), 1);
        assert_eq!(registry.route_for("Tasks")[0].index(), 0);
        assert!(registry.route_for("Categories").is_empty());
        assert!(registry.route_for("Topics").is_empty());
        assert!(registry.route_for("People").is_empty());
    }

    #[test]
    fn test_backend_mut_unknown_and_closed() {
        let dir = TempDir::new().unwrap();
        let mut registry = ConnectionRegistry::new();
        let id = registry.register(&sqlite_descriptor(&dir, "a.db", "A")).unwrap();

        assert!(registry.backend_mut(id).is_ok());

        let bogus = ConnectionId(9);
        assert!(matches!(registry.backend_mut(bogus), Err(Error::UnknownConnection(_))));

        registry.close_all();
        assert!(matches!(registry.backend_mut(id), Err(Error::ConnectionClosed(_))));
    }

    #[test]
    fn test_close_all_is_idempotent_and_keeps_ids() {
        let dir = TempDir::new().unwrap();
        let mut registry = ConnectionRegistry::new();
        registry.register(&sqlite_descriptor(&dir, "a.db", "A")).unwrap();

        registry.close_all();
        registry.close_all();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.labels(), vec!["A"]);
    }

    #[test]
    fn test_route_for_unknown_table_is_empty() {
        let registry = ConnectionRegistry::new();
        assert!(registry.route_for("Tasks").is_empty());
    }
}
