//! Fetching, saving, and moving tasks across every registered database.

use crate::error::{Error, Result};
use crate::lookup::LookupCache;
use crate::registry::{ConnectionId, ConnectionRegistry};
use crate::tasks::models::Task;

/// Repository over every registered connection.
///
/// Borrows the registry and lookup cache for the duration of a batch of
/// operations; construct one wherever data access is needed instead of
/// reaching for process-wide state. Everything blocks the calling thread.
#[derive(Debug)]
pub struct TaskRepository<'a> {
    registry: &'a mut ConnectionRegistry,
    lookups: &'a LookupCache,
}

impl<'a> TaskRepository<'a> {
    /// Create a repository over a registry and a populated lookup cache.
    pub fn new(registry: &'a mut ConnectionRegistry, lookups: &'a LookupCache) -> Self {
        Self { registry, lookups }
    }

    /// Fetch every task from every registered connection.
    ///
    /// Records are tagged with the connection they were read from and
    /// enriched with display labels. Results concatenate in registration
    /// order; order within one connection is backend-determined. A fetch
    /// failure on one connection is logged and contributes nothing, it
    /// never fails the overall load.
    pub fn fetch_all(&mut self) -> Vec<Task> {
        let mut all = Vec::new();
        let ids: Vec<ConnectionId> = self.registry.ids().collect();
        for id in ids {
            match self.registry.backend_mut(id).and_then(|backend| backend.fetch_tasks()) {
                Ok(mut tasks) => {
                    for task in &mut tasks {
                        task.db_id = id;
                        task.enrich(self.lookups);
                    }
                    tracing::debug!(connection = %id, count = tasks.len(), "fetched tasks");
                    all.append(&mut tasks);
                }
                Err(err) => {
                    tracing::warn!(connection = %id, error = %err, "task fetch failed; skipping connection");
                }
            }
        }
        all
    }

    /// Persist a task to its owning connection.
    ///
    /// Stamps `updated_at` with the current UTC time (any caller-supplied
    /// value is discarded), then issues an insert-or-replace keyed by
    /// uuid.
    ///
    /// # Errors
    ///
    /// Returns an error if the owning connection is unknown or closed, or
    /// with the backend's error detail if the upsert fails. No retry.
    pub fn save(&mut self, task: &mut Task) -> Result<()> {
        task.updated_at = Some(now_stamp());
        let backend = self.registry.backend_mut(task.db_id)?;
        backend.upsert_task(task)?;
        tracing::debug!(uuid = %task.uuid, connection = %task.db_id, "task saved");
        Ok(())
    }

    /// Relocate a task from `from` to its (already updated) `db_id`.
    ///
    /// Two independent steps, not a transaction: delete from the source,
    /// then save into the target. A delete failure is logged and does not
    /// stop the insert attempt.
    ///
    /// # Errors
    ///
    /// - [`Error::SameConnectionMove`] if `from` equals the task's current
    ///   `db_id`; rejected before any I/O.
    /// - [`Error::UnknownConnection`] / [`Error::ConnectionClosed`] if the
    ///   target is unavailable; checked before the source delete so a bad
    ///   target cannot destroy the only copy of the record.
    /// - [`Error::MoveInterrupted`] if the source delete succeeded but the
    ///   target insert failed: the record is then absent from both
    ///   connections and the caller must decide how to recover.
    pub fn move_task(&mut self, task: &mut Task, from: ConnectionId) -> Result<()> {
        if from == task.db_id {
            return Err(Error::SameConnectionMove(from));
        }
        let to = task.db_id;
        self.registry.backend_mut(to)?;

        let deleted = match self
            .registry
            .backend_mut(from)
            .and_then(|backend| backend.delete_task(&task.uuid))
        {
            Ok(deleted) => deleted,
            Err(err) => {
                tracing::warn!(
                    uuid = %task.uuid,
                    connection = %from,
                    error = %err,
                    "delete from source failed; still attempting target insert"
                );
                false
            }
        };

        match self.save(task) {
            Ok(()) => {
                tracing::info!(uuid = %task.uuid, %from, %to, "task moved");
                Ok(())
            }
            Err(err) if deleted => Err(Error::MoveInterrupted {
                uuid: task.uuid.clone(),
                from,
                to,
                source: Box::new(err),
            }),
            Err(err) => Err(err),
        }
    }
}

/// Current UTC time as ISO 8601 text with microsecond precision, so that
/// consecutive saves get strictly increasing stamps.
fn now_stamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_stamp_is_iso_8601_with_micros() {
        let stamp = now_stamp();
        // e.g. 2026-08-28T14:03:11.042187
        assert_eq!(stamp.len(), 26);
        assert_eq!(&stamp[4..5], "-");
        assert_eq!(&stamp[10..11], "T");
        assert_eq!(&stamp[19..20], ".");
    }

    #[test]
    fn test_now_stamp_sorts_lexicographically() {
        let first = now_stamp();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = now_stamp();
        assert!(second > first);
    }
}
