//! The data side of the card/canvas boundary.
//!
//! Rendering and event handling live in the embedding application; this
//! module supplies what that layer needs from the core: display filters
//! over the working set, dropdown choice lists built from the lookup
//! cache and registry, and the commit rule that turns an edited card into
//! a repository `save` or `move_task` call.

use crate::lookup::LookupCache;
use crate::registry::{ConnectionId, ConnectionRegistry};
use crate::tasks::models::Task;
use crate::tasks::repository::TaskRepository;
use std::collections::HashSet;

/// Display filter over the task working set.
///
/// Every field is optional; `None` means "don't filter on this". Set
/// filters match a task only when its id is present in the set, so a task
/// with no category never matches an explicit category filter. Filtering
/// affects what is displayed, never the working set itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardFilter {
    /// Keep only tasks with this focus state.
    pub in_focus: Option<bool>,
    /// Keep only tasks with this completion state.
    pub is_done: Option<bool>,
    /// Keep only tasks whose category id is in the set.
    pub categories: Option<HashSet<i64>>,
    /// Keep only tasks whose context id is in the set.
    pub contexts: Option<HashSet<i64>>,
    /// Keep only tasks whose topic id is in the set.
    pub topics: Option<HashSet<i64>>,
    /// Keep only tasks delegated to someone in the set.
    pub delegates: Option<HashSet<i64>>,
    /// Keep only tasks whose project uuid is in the set.
    pub projects: Option<HashSet<String>>,
}

impl BoardFilter {
    /// A filter that shows everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset every criterion to "show everything".
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether a task passes every active criterion.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        if self.in_focus.is_some_and(|want| task.in_focus != want) {
            return false;
        }
        if self.is_done.is_some_and(|want| task.is_done != want) {
            return false;
        }
        if let Some(allowed) = &self.categories {
            if !task.category_id.is_some_and(|id| allowed.contains(&id)) {
                return false;
            }
        }
        if let Some(allowed) = &self.contexts {
            if !task.context_id.is_some_and(|id| allowed.contains(&id)) {
                return false;
            }
        }
        if let Some(allowed) = &self.topics {
            if !task.topic_id.is_some_and(|id| allowed.contains(&id)) {
                return false;
            }
        }
        if let Some(allowed) = &self.delegates {
            if !task.delegated_to.is_some_and(|id| allowed.contains(&id)) {
                return false;
            }
        }
        if let Some(allowed) = &self.projects {
            if !task.project_uuid.as_ref().is_some_and(|uuid| allowed.contains(uuid)) {
                return false;
            }
        }
        true
    }

    /// Indices of the tasks to display, preserving working-set order.
    #[must_use]
    pub fn visible_indices(&self, tasks: &[Task]) -> Vec<usize> {
        tasks
            .iter()
            .enumerate()
            .filter_map(|(index, task)| self.matches(task).then_some(index))
            .collect()
    }
}

/// Parallel id/label vectors for one integer-keyed dropdown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdChoices {
    /// Selectable ids, in label-map order.
    pub ids: Vec<i64>,
    /// Display labels, index-aligned with `ids`.
    pub labels: Vec<String>,
}

impl IdChoices {
    fn from_pairs<'p>(pairs: impl Iterator<Item = (i64, &'p str)>) -> Self {
        let mut choices = Self::default();
        for (id, label) in pairs {
            choices.ids.push(id);
            choices.labels.push(label.to_string());
        }
        choices
    }

    /// Index of the currently selected id, or 0 when unset or no longer
    /// offered.
    #[must_use]
    pub fn selected(&self, current: Option<i64>) -> usize {
        current.and_then(|id| self.ids.iter().position(|&c| c == id)).unwrap_or(0)
    }
}

/// Parallel uuid/title vectors for the project dropdown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectChoices {
    /// Selectable project uuids.
    pub uuids: Vec<String>,
    /// Project titles, index-aligned with `uuids`.
    pub titles: Vec<String>,
}

impl ProjectChoices {
    /// Index of the currently selected project, or 0 when unset or no
    /// longer offered.
    #[must_use]
    pub fn selected(&self, current: Option<&str>) -> usize {
        current.and_then(|uuid| self.uuids.iter().position(|c| c == uuid)).unwrap_or(0)
    }
}

/// Every dropdown's contents, built once per lookup reload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardChoices {
    /// Category dropdown.
    pub categories: IdChoices,
    /// Context dropdown.
    pub contexts: IdChoices,
    /// Topic dropdown.
    pub topics: IdChoices,
    /// Delegate dropdown.
    pub delegates: IdChoices,
    /// Project dropdown.
    pub projects: ProjectChoices,
    /// Database dropdown labels; index-aligned with connection ids.
    pub databases: Vec<String>,
}

impl BoardChoices {
    /// Build every choice list from the lookup cache and the registry.
    #[must_use]
    pub fn build(lookups: &LookupCache, registry: &ConnectionRegistry) -> Self {
        let mut projects = ProjectChoices::default();
        for (uuid, title) in lookups.projects() {
            projects.uuids.push(uuid.to_string());
            projects.titles.push(title.to_string());
        }
        Self {
            categories: IdChoices::from_pairs(lookups.categories()),
            contexts: IdChoices::from_pairs(lookups.contexts()),
            topics: IdChoices::from_pairs(lookups.topics()),
            delegates: IdChoices::from_pairs(lookups.people()),
            projects,
            databases: registry.labels().iter().map(ToString::to_string).collect(),
        }
    }
}

/// What committing an edit session did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditAction {
    /// Nothing changed; no database call was made.
    None,
    /// Fields changed; the task was saved in place.
    Saved,
    /// The owning database changed; the task was moved.
    Moved {
        /// The connection the task was moved away from.
        from: ConnectionId,
    },
}

/// One card's edit session.
///
/// Captures the owning connection when editing starts so that a database
/// dropdown change can be told apart from a plain field edit at commit
/// time: only the former becomes a `move_task`.
#[derive(Debug, Clone, Copy)]
pub struct CardEdit {
    original_db: ConnectionId,
    dirty: bool,
}

impl CardEdit {
    /// Start an edit session for a task.
    #[must_use]
    pub const fn begin(task: &Task) -> Self {
        Self { original_db: task.db_id, dirty: false }
    }

    /// Record that some field of the card changed.
    pub fn mark_changed(&mut self) {
        self.dirty = true;
    }

    /// Whether anything was changed so far.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Persist the session's outcome: a move when the owning database
    /// changed, a save when only fields changed, nothing otherwise.
    ///
    /// # Errors
    ///
    /// Propagates repository errors from the underlying save or move.
    pub fn commit(self, repo: &mut TaskRepository<'_>, task: &mut Task) -> crate::error::Result<EditAction> {
        if task.db_id != self.original_db {
            repo.move_task(task, self.original_db)?;
            Ok(EditAction::Moved { from: self.original_db })
        } else if self.dirty {
            repo.save(task)?;
            Ok(EditAction::Saved)
        } else {
            Ok(EditAction::None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::{LookupId, LookupTable};

    fn task(uuid: &str) -> Task {
        Task::new(uuid, uuid)
    }

    #[test]
    fn test_default_filter_shows_everything() {
        let filter = BoardFilter::new();
        let tasks = vec![task("a"), task("b")];
        assert_eq!(filter.visible_indices(&tasks), vec![0, 1]);
    }

    #[test]
    fn test_tri_state_done_filter() {
        let mut done = task("a");
        done.is_done = true;
        let open = task("b");
        let tasks = vec![done, open];

        let mut filter = BoardFilter::new();
        filter.is_done = Some(true);
        assert_eq!(filter.visible_indices(&tasks), vec![0]);

        filter.is_done = Some(false);
        assert_eq!(filter.visible_indices(&tasks), vec![1]);

        filter.clear();
        assert_eq!(filter.visible_indices(&tasks), vec![0, 1]);
    }

    #[test]
    fn test_category_set_filter_excludes_uncategorized() {
        let mut errands = task("a");
        errands.category_id = Some(3);
        let mut calls = task("b");
        calls.category_id = Some(4);
        let bare = task("c");
        let tasks = vec![errands, calls, bare];

        let mut filter = BoardFilter::new();
        filter.categories = Some(HashSet::from([3]));
        assert_eq!(filter.visible_indices(&tasks), vec![0]);
    }

    #[test]
    fn test_project_set_filter() {
        let mut garden = task("a");
        garden.project_uuid = Some("p-1".to_string());
        let tasks = vec![garden, task("b")];

        let mut filter = BoardFilter::new();
        filter.projects = Some(HashSet::from(["p-1".to_string()]));
        assert_eq!(filter.visible_indices(&tasks), vec![0]);
    }

    #[test]
    fn test_combined_criteria_all_must_match() {
        let mut t = task("a");
        t.in_focus = true;
        t.category_id = Some(3);
        let tasks = vec![t];

        let mut filter = BoardFilter::new();
        filter.in_focus = Some(true);
        filter.categories = Some(HashSet::from([4]));
        assert!(filter.visible_indices(&tasks).is_empty());
    }

    #[test]
    fn test_choices_selected_index_and_fallback() {
        let mut cache = LookupCache::new();
        cache.insert(LookupTable::Categories, LookupId::Int(3), "Errands".to_string());
        cache.insert(LookupTable::Categories, LookupId::Int(7), "Calls".to_string());

        let choices = IdChoices::from_pairs(cache.categories());
        assert_eq!(choices.ids, vec![3, 7]);
        assert_eq!(choices.labels, vec!["Errands", "Calls"]);
        assert_eq!(choices.selected(Some(7)), 1);
        assert_eq!(choices.selected(Some(99)), 0);
        assert_eq!(choices.selected(None), 0);
    }

    #[test]
    fn test_build_choices_includes_database_labels() {
        let cache = LookupCache::new();
        let registry = crate::registry::ConnectionRegistry::new();
        let choices = BoardChoices::build(&cache, &registry);
        assert!(choices.databases.is_empty());
        assert!(choices.categories.ids.is_empty());
    }

    #[test]
    fn test_card_edit_dirty_tracking() {
        let t = task("a");
        let mut edit = CardEdit::begin(&t);
        assert!(!edit.is_dirty());
        edit.mark_changed();
        assert!(edit.is_dirty());
    }
}
