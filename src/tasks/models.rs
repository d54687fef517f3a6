//! The task record shared by every backend and the board UI.

use crate::lookup::LookupCache;
use crate::registry::ConnectionId;
use serde::{Deserialize, Serialize};

/// One task card.
///
/// Persisted fields mirror the `Tasks` table column-for-column; the
/// trailing `*_label` fields are display projections resolved from the
/// [`LookupCache`] and are never written back to a database.
///
/// `uuid` is immutable once created. `db_id` names the owning connection
/// and changes only through an explicit move. Date-time fields are
/// ISO 8601 text, stored exactly as retrieved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Globally unique identifier, the upsert key.
    pub uuid: String,
    /// Short card title.
    pub title: String,
    /// Free-form notes.
    pub notes: String,

    /// Category foreign key, if categorized.
    pub category_id: Option<i64>,
    /// Context foreign key, if any.
    pub context_id: Option<i64>,
    /// Owning project uuid, if any.
    pub project_uuid: Option<String>,
    /// Topic foreign key, if any.
    pub topic_id: Option<i64>,
    /// Person this task is delegated to, if any.
    pub delegated_to: Option<i64>,

    /// Owning connection in the registry.
    pub db_id: ConnectionId,

    /// Estimated effort in minutes, if estimated.
    pub time_required_minutes: Option<i64>,

    /// Whether the task is on the focus list. NULL in storage reads as false.
    pub in_focus: bool,
    /// Whether the task is complete. NULL in storage reads as false.
    pub is_done: bool,
    /// Blocks deletion in the UI; not enforced by the repository.
    pub is_locked: bool,

    /// Hard deadline, ISO 8601.
    pub due_date: Option<String>,
    /// Date before which the task is hidden from planning, ISO 8601.
    pub defer_date: Option<String>,
    /// Creation timestamp, ISO 8601.
    pub created_at: Option<String>,
    /// Last save timestamp; stamped by the repository on every save.
    pub updated_at: Option<String>,
    /// Completion timestamp, ISO 8601.
    pub completed_at: Option<String>,

    /// Free-form reference to a predecessor record; never dereferenced.
    pub link_from: String,
    /// Free-form reference to a successor record; never dereferenced.
    pub link_to: String,

    /// Resolved category label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_label: Option<String>,
    /// Resolved context label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_label: Option<String>,
    /// Resolved project title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_title: Option<String>,
    /// Resolved topic label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_label: Option<String>,
    /// Resolved delegate name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegate_name: Option<String>,
}

impl Task {
    /// Create a task with the given uuid and title, owned by no particular
    /// connection yet (`db_id` 0).
    #[must_use]
    pub fn new(uuid: impl Into<String>, title: impl Into<String>) -> Self {
        Self { uuid: uuid.into(), title: title.into(), ..Self::default() }
    }

    /// Resolve the five display labels from the lookup cache.
    ///
    /// A classification id with no cache entry leaves its label unset;
    /// that is expected for records referencing ids another database owns.
    pub fn enrich(&mut self, lookups: &LookupCache) {
        self.category_label =
            self.category_id.and_then(|id| lookups.category(id)).map(str::to_string);
        self.context_label =
            self.context_id.and_then(|id| lookups.context(id)).map(str::to_string);
        self.project_title =
            self.project_uuid.as_deref().and_then(|uuid| lookups.project(uuid)).map(str::to_string);
        self.topic_label = self.topic_id.and_then(|id| lookups.topic(id)).map(str::to_string);
        self.delegate_name =
            self.delegated_to.and_then(|id| lookups.person(id)).map(str::to_string);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::{LookupId, LookupTable};

    fn sample_cache() -> LookupCache {
        let mut cache = LookupCache::new();
        cache.insert(LookupTable::Categories, LookupId::Int(3), "Errands".to_string());
        cache.insert(LookupTable::People, LookupId::Int(5), "Alex".to_string());
        cache.insert(
            LookupTable::Projects,
            LookupId::Uuid("p-9".to_string()),
            "Garden".to_string(),
        );
        cache
    }

    #[test]
    fn test_enrich_sets_known_labels_and_leaves_unknown_unset() {
        let cache = sample_cache();

        let mut task = Task::new("abc-1", "Buy milk");
        task.category_id = Some(3);
        task.context_id = Some(42); // not in cache
        task.project_uuid = Some("p-9".to_string());
        task.delegated_to = Some(5);
        task.enrich(&cache);

        assert_eq!(task.category_label.as_deref(), Some("Errands"));
        assert_eq!(task.context_label, None);
        assert_eq!(task.project_title.as_deref(), Some("Garden"));
        assert_eq!(task.topic_label, None);
        assert_eq!(task.delegate_name.as_deref(), Some("Alex"));
    }

    #[test]
    fn test_enrich_clears_labels_when_ids_are_cleared() {
        let cache = sample_cache();
        let mut task = Task::new("abc-1", "Buy milk");
        task.category_id = Some(3);
        task.enrich(&cache);
        assert!(task.category_label.is_some());

        task.category_id = None;
        task.enrich(&cache);
        assert_eq!(task.category_label, None);
    }

    #[test]
    fn test_enrich_with_no_ids_is_a_noop() {
        let cache = sample_cache();
        let mut task = Task::new("abc-2", "Untagged");
        task.enrich(&cache);
        assert_eq!(task.category_label, None);
        assert_eq!(task.delegate_name, None);
    }

    #[test]
    fn test_new_task_defaults() {
        let task = Task::new("abc-3", "Water plants");
        assert_eq!(task.uuid, "abc-3");
        assert_eq!(task.title, "Water plants");
        assert!(!task.in_focus);
        assert!(!task.is_done);
        assert!(!task.is_locked);
        assert_eq!(task.db_id.index(), 0);
        assert_eq!(task.updated_at, None);
    }
}
