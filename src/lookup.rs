//! In-memory id → label maps used to enrich task records for display.
//!
//! Five small reference tables (categories, contexts, topics, people,
//! projects) are loaded once after the registry is built and queried with
//! pure lookups from then on. Labels are display projections only:
//! mutating a label never touches the underlying id, and labels going
//! stale because another process edited a reference table is tolerated.

use crate::registry::{ConnectionId, ConnectionRegistry};
use std::collections::BTreeMap;

/// The five reference tables the cache knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupTable {
    /// Task categories, integer-keyed.
    Categories,
    /// GTD contexts, integer-keyed.
    Contexts,
    /// Topics, integer-keyed.
    Topics,
    /// People a task can be delegated to, integer-keyed.
    People,
    /// Projects, keyed by uuid string.
    Projects,
}

impl LookupTable {
    /// Every reference table, in reload order.
    pub const ALL: [Self; 5] =
        [Self::Categories, Self::Contexts, Self::Topics, Self::People, Self::Projects];

    /// The logical (and physical) table name.
    #[must_use]
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::Categories => "Categories",
            Self::Contexts => "Contexts",
            Self::Topics => "Topics",
            Self::People => "People",
            Self::Projects => "Projects",
        }
    }

    /// The key column name: `uuid` for projects, `id` otherwise.
    #[must_use]
    pub const fn key_column(self) -> &'static str {
        match self {
            Self::Projects => "uuid",
            _ => "id",
        }
    }

    /// Whether the table is keyed by uuid string rather than integer id.
    #[must_use]
    pub const fn is_uuid_keyed(self) -> bool {
        matches!(self, Self::Projects)
    }
}

/// A reference-table key: integer id or project uuid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupId {
    /// Integer primary key.
    Int(i64),
    /// Uuid string primary key (projects).
    Uuid(String),
}

/// Id → display-name maps for the five reference tables.
///
/// Built by [`LookupCache::reload`]; every read is a pure map lookup and
/// never triggers I/O. Absence of a key is not an error.
#[derive(Debug, Clone, Default)]
pub struct LookupCache {
    categories: BTreeMap<i64, String>,
    contexts: BTreeMap<i64, String>,
    topics: BTreeMap<i64, String>,
    people: BTreeMap<i64, String>,
    projects: BTreeMap<String, String>,
}

impl LookupCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild every map from the connections routed for each table.
    ///
    /// Maps are cleared first, then each table's routed connections are
    /// queried in registration order and merged. On a key collision across
    /// connections the last one loaded wins. A query failure on one
    /// connection is logged and skipped; the affected map is simply left
    /// partially populated, and the reload never aborts as a whole.
    pub fn reload(&mut self, registry: &mut ConnectionRegistry) {
        self.categories.clear();
        self.contexts.clear();
        self.topics.clear();
        self.people.clear();
        self.projects.clear();

        for table in LookupTable::ALL {
            let routed: Vec<ConnectionId> = registry.route_for(table.table_name()).to_vec();
            for id in routed {
                let pairs =
                    registry.backend_mut(id).and_then(|backend| backend.lookup_pairs(table));
                match pairs {
                    Ok(pairs) => {
                        for (key, name) in pairs {
                            self.insert(table, key, name);
                        }
                    }
                    Err(err) => {
                        tracing::warn!(
                            table = table.table_name(),
                            connection = %id,
                            error = %err,
                            "lookup query failed; leaving map partially populated"
                        );
                    }
                }
            }
        }

        tracing::debug!(
            categories = self.categories.len(),
            contexts = self.contexts.len(),
            topics = self.topics.len(),
            people = self.people.len(),
            projects = self.projects.len(),
            "lookup maps reloaded"
        );
    }

    /// Insert one pair, ignoring keys whose kind does not match the table.
    pub(crate) fn insert(&mut self, table: LookupTable, key: LookupId, name: String) {
        match (table, key) {
            (LookupTable::Categories, LookupId::Int(id)) => {
                self.categories.insert(id, name);
            }
            (LookupTable::Contexts, LookupId::Int(id)) => {
                self.contexts.insert(id, name);
            }
            (LookupTable::Topics, LookupId::Int(id)) => {
                self.topics.insert(id, name);
            }
            (LookupTable::People, LookupId::Int(id)) => {
                self.people.insert(id, name);
            }
            (LookupTable::Projects, LookupId::Uuid(uuid)) => {
                self.projects.insert(uuid, name);
            }
            (table, key) => {
                tracing::warn!(table = table.table_name(), ?key, "mismatched lookup key; skipped");
            }
        }
    }

    /// Generic label lookup by table and key.
    #[must_use]
    pub fn label_for(&self, table: LookupTable, key: &LookupId) -> Option<&str> {
        match (table, key) {
            (LookupTable::Categories, LookupId::Int(id)) => self.category(*id),
            (LookupTable::Contexts, LookupId::Int(id)) => self.context(*id),
            (LookupTable::Topics, LookupId::Int(id)) => self.topic(*id),
            (LookupTable::People, LookupId::Int(id)) => self.person(*id),
            (LookupTable::Projects, LookupId::Uuid(uuid)) => self.project(uuid),
            _ => None,
        }
    }

    /// Label of a category id.
    #[must_use]
    pub fn category(&self, id: i64) -> Option<&str> {
        self.categories.get(&id).map(String::as_str)
    }

    /// Label of a context id.
    #[must_use]
    pub fn context(&self, id: i64) -> Option<&str> {
        self.contexts.get(&id).map(String::as_str)
    }

    /// Label of a topic id.
    #[must_use]
    pub fn topic(&self, id: i64) -> Option<&str> {
        self.topics.get(&id).map(String::as_str)
    }

    /// Name of a person id.
    #[must_use]
    pub fn person(&self, id: i64) -> Option<&str> {
        self.people.get(&id).map(String::as_str)
    }

    /// Title of a project uuid.
    #[must_use]
    pub fn project(&self, uuid: &str) -> Option<&str> {
        self.projects.get(uuid).map(String::as_str)
    }

    /// All categories in ascending id order, for dropdown population.
    pub fn categories(&self) -> impl Iterator<Item = (i64, &str)> {
        self.categories.iter().map(|(id, name)| (*id, name.as_str()))
    }

    /// All contexts in ascending id order.
    pub fn contexts(&self) -> impl Iterator<Item = (i64, &str)> {
        self.contexts.iter().map(|(id, name)| (*id, name.as_str()))
    }

    /// All topics in ascending id order.
    pub fn topics(&self) -> impl Iterator<Item = (i64, &str)> {
        self.topics.iter().map(|(id, name)| (*id, name.as_str()))
    }

    /// All people in ascending id order.
    pub fn people(&self) -> impl Iterator<Item = (i64, &str)> {
        self.people.iter().map(|(id, name)| (*id, name.as_str()))
    }

    /// All projects in ascending uuid order.
    pub fn projects(&self) -> impl Iterator<Item = (&str, &str)> {
        self.projects.iter().map(|(uuid, title)| (uuid.as_str(), title.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_cache() -> LookupCache {
        let mut cache = LookupCache::new();
        cache.insert(LookupTable::Categories, LookupId::Int(3), "Errands".to_string());
        cache.insert(LookupTable::Contexts, LookupId::Int(1), "Home".to_string());
        cache.insert(
            LookupTable::Projects,
            LookupId::Uuid("p-1".to_string()),
            "Garden".to_string(),
        );
        cache
    }

    #[test]
    fn test_label_for_hits_and_misses() {
        let cache = sample_cache();
        assert_eq!(cache.label_for(LookupTable::Categories, &LookupId::Int(3)), Some("Errands"));
        assert_eq!(cache.label_for(LookupTable::Categories, &LookupId::Int(99)), None);
        assert_eq!(
            cache.label_for(LookupTable::Projects, &LookupId::Uuid("p-1".to_string())),
            Some("Garden")
        );
        // Key kind mismatch is a miss, not a panic.
        assert_eq!(cache.label_for(LookupTable::Projects, &LookupId::Int(3)), None);
    }

    #[test]
    fn test_typed_accessors() {
        let cache = sample_cache();
        assert_eq!(cache.category(3), Some("Errands"));
        assert_eq!(cache.context(1), Some("Home"));
        assert_eq!(cache.topic(1), None);
        assert_eq!(cache.project("p-1"), Some("Garden"));
    }

    #[test]
    fn test_last_insert_wins_on_collision() {
        let mut cache = sample_cache();
        cache.insert(LookupTable::Categories, LookupId::Int(3), "Chores".to_string());
        assert_eq!(cache.category(3), Some("Chores"));
    }

    #[test]
    fn test_mismatched_key_is_skipped() {
        let mut cache = LookupCache::new();
        cache.insert(LookupTable::Categories, LookupId::Uuid("x".to_string()), "Bad".to_string());
        assert_eq!(cache.categories().count(), 0);
    }

    #[test]
    fn test_iteration_order_is_ascending() {
        let mut cache = LookupCache::new();
        cache.insert(LookupTable::Topics, LookupId::Int(7), "Work".to_string());
        cache.insert(LookupTable::Topics, LookupId::Int(2), "Play".to_string());
        let ids: Vec<i64> = cache.topics().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![2, 7]);
    }

    #[test]
    fn test_table_metadata() {
        assert_eq!(LookupTable::Projects.key_column(), "uuid");
        assert!(LookupTable::Projects.is_uuid_keyed());
        assert_eq!(LookupTable::People.key_column(), "id");
        assert_eq!(LookupTable::ALL.len(), 5);
    }
}
