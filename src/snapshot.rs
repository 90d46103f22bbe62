//! Last-known usecase list shown in the sidebar.
//!
//! Every mutation replaces the whole list; the last write wins. Effective
//! changes bump `version` and are broadcast to subscribers. Writing back an
//! identical list is a no-op, so repeated refreshes converge silently.

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::api::UsecaseApi;
use crate::error::SyncError;
use crate::types::Usecase;

/// Buffered change notifications per subscriber.
const CHANGE_CHANNEL_SIZE: usize = 64;

/// Notification emitted after an effective store mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SnapshotChange {
    Replaced,
    Renamed { id: String, name: String },
    /// Optimistic move-to-front; the UI animates the row once.
    Touched { id: String },
}

#[derive(Default)]
struct SnapshotInner {
    usecases: Vec<Usecase>,
    moved: Option<String>,
    version: u64,
}

pub struct SnapshotStore {
    inner: Mutex<SnapshotInner>,
    changes: broadcast::Sender<SnapshotChange>,
}

/// Sort by recency, newest first. Stable, so ties keep server order.
pub fn sort_by_recency(usecases: &mut [Usecase]) {
    usecases.sort_by_key(|u| Reverse(u.recency()));
}

impl SnapshotStore {
    pub fn new() -> Self {
        let (changes, _rx) = broadcast::channel(CHANGE_CHANNEL_SIZE);
        Self {
            inner: Mutex::new(SnapshotInner::default()),
            changes,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SnapshotChange> {
        self.changes.subscribe()
    }

    fn notify(&self, change: SnapshotChange) {
        // No subscribers is fine.
        let _ = self.changes.send(change);
    }

    /// Fetch the authoritative list and replace the snapshot with it.
    pub async fn refresh(&self, api: &dyn UsecaseApi) -> Result<Vec<Usecase>, SyncError> {
        let fetched = api.list_usecases().await?;
        self.replace(fetched);
        Ok(self.list())
    }

    /// Replace the snapshot. Returns false if nothing changed.
    pub fn replace(&self, mut usecases: Vec<Usecase>) -> bool {
        sort_by_recency(&mut usecases);
        {
            let mut inner = self.inner.lock();
            if inner.usecases == usecases {
                return false;
            }
            inner.usecases = usecases;
            inner.version += 1;
        }
        self.notify(SnapshotChange::Replaced);
        true
    }

    /// Move `id` to the front with a fresh `updated_at`, before any server
    /// confirmation. Returns false if the usecase is unknown.
    pub fn apply_optimistic_touch(&self, id: &str, now: DateTime<Utc>) -> bool {
        {
            let mut inner = self.inner.lock();
            let Some(pos) = inner.usecases.iter().position(|u| u.id == id) else {
                return false;
            };
            let mut touched = inner.usecases.remove(pos);
            touched.updated_at = Some(now);
            inner.usecases.insert(0, touched);
            inner.moved = Some(id.to_string());
            inner.version += 1;
        }
        self.notify(SnapshotChange::Touched { id: id.to_string() });
        true
    }

    /// Set the display name of `id`. Returns false if unknown or unchanged.
    pub fn patch_display_name(&self, id: &str, name: &str) -> bool {
        {
            let mut inner = self.inner.lock();
            let Some(pos) = inner.usecases.iter().position(|u| u.id == id) else {
                return false;
            };
            if inner.usecases[pos].display_name == name {
                return false;
            }
            inner.usecases[pos].display_name = name.to_string();
            inner.version += 1;
        }
        self.notify(SnapshotChange::Renamed {
            id: id.to_string(),
            name: name.to_string(),
        });
        true
    }

    pub fn get(&self, id: &str) -> Option<Usecase> {
        self.inner.lock().usecases.iter().find(|u| u.id == id).cloned()
    }

    pub fn display_name(&self, id: &str) -> Option<String> {
        self.inner
            .lock()
            .usecases
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.display_name.clone())
    }

    pub fn list(&self) -> Vec<Usecase> {
        self.inner.lock().usecases.clone()
    }

    pub fn version(&self) -> u64 {
        self.inner.lock().version
    }

    /// One-shot "moved" marker for the move animation.
    pub fn take_moved(&self) -> Option<String> {
        self.inner.lock().moved.take()
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{ts, usecase, FakeApi};

    fn ids(store: &SnapshotStore) -> Vec<String> {
        store.list().into_iter().map(|u| u.id).collect()
    }

    #[test]
    fn test_replace_sorts_newest_first_with_stable_ties() {
        let store = SnapshotStore::new();
        store.replace(vec![
            usecase("a", "Chat 1", 10),
            usecase("b", "Chat 2", 30),
            usecase("c", "Chat 3", 10),
            usecase("d", "Chat 4", 20),
        ]);
        assert_eq!(ids(&store), vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_rows_without_timestamps_sort_last() {
        let store = SnapshotStore::new();
        let mut bare = usecase("bare", "Chat 9", 0);
        bare.updated_at = None;
        bare.created_at = None;
        store.replace(vec![bare, usecase("a", "Chat 1", 5)]);
        assert_eq!(ids(&store), vec!["a", "bare"]);
    }

    #[test]
    fn test_identical_snapshot_is_idempotent() {
        let store = SnapshotStore::new();
        let mut rx = store.subscribe();
        let list = vec![usecase("a", "Chat 1", 10), usecase("b", "Chat 2", 20)];

        assert!(store.replace(list.clone()));
        let version = store.version();
        assert_eq!(rx.try_recv().unwrap(), SnapshotChange::Replaced);

        assert!(!store.replace(list));
        assert_eq!(store.version(), version);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_optimistic_touch_moves_to_front() {
        let store = SnapshotStore::new();
        store.replace(vec![
            usecase("e1", "Chat 1", 30),
            usecase("e2", "Chat 2", 20),
            usecase("e3", "Regression Suite", 10),
        ]);

        let now = ts(99);
        assert!(store.apply_optimistic_touch("e3", now));

        assert_eq!(ids(&store), vec!["e3", "e1", "e2"]);
        assert_eq!(store.get("e3").unwrap().updated_at, Some(now));
        assert_eq!(store.take_moved().as_deref(), Some("e3"));
        assert_eq!(store.take_moved(), None);
    }

    #[test]
    fn test_touch_unknown_is_noop() {
        let store = SnapshotStore::new();
        store.replace(vec![usecase("a", "Chat 1", 10)]);
        let version = store.version();
        assert!(!store.apply_optimistic_touch("missing", ts(50)));
        assert_eq!(store.version(), version);
        assert!(store.take_moved().is_none());
    }

    #[test]
    fn test_patch_display_name() {
        let store = SnapshotStore::new();
        let mut rx = store.subscribe();
        store.replace(vec![usecase("a", "Chat 1", 10)]);
        let _ = rx.try_recv();

        assert!(store.patch_display_name("a", "Checkout Flow"));
        assert_eq!(store.display_name("a").as_deref(), Some("Checkout Flow"));
        assert_eq!(
            rx.try_recv().unwrap(),
            SnapshotChange::Renamed {
                id: "a".to_string(),
                name: "Checkout Flow".to_string()
            }
        );

        assert!(!store.patch_display_name("a", "Checkout Flow"));
        assert!(!store.patch_display_name("missing", "Anything"));
    }

    #[tokio::test]
    async fn test_refresh_replaces_from_api() {
        let api = FakeApi::with_usecases(vec![
            usecase("old", "Chat 1", 1),
            usecase("new", "Chat 2", 2),
        ]);
        let store = SnapshotStore::new();

        let list = store.refresh(&api).await.unwrap();

        assert_eq!(list.len(), 2);
        assert_eq!(ids(&store), vec!["new", "old"]);
        assert_eq!(api.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_snapshot() {
        let api = FakeApi::with_usecases(vec![usecase("a", "Chat 1", 1)]);
        let store = SnapshotStore::new();
        store.refresh(&api).await.unwrap();

        api.set_fail_lists(true);
        let result = store.refresh(&api).await;

        assert!(matches!(result, Err(SyncError::Network(_))));
        assert_eq!(ids(&store), vec!["a"]);
    }
}
