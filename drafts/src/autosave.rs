use tracing::{debug, warn};

use blockdoc::Document;

use crate::error::StoreError;
use crate::snapshot::{PostKey, Snapshot};
use crate::store::SnapshotStore;

/// Quiet period after the last change before a tick is allowed to write.
pub const DEFAULT_DEBOUNCE_MS: i64 = 2_000;

/// The draft state a host hands to [`Autosave::tick`]. Borrowed, because
/// the controller never owns editor state.
#[derive(Debug, Clone, Copy)]
pub struct Draft<'a> {
    pub title: &'a str,
    pub document: &'a Document,
    pub category: &'a str,
    pub tags: &'a [String],
}

/// Local snapshot persistence for one post.
///
/// One instance owns the whole autosave lifecycle: the host reports edits
/// through [`note_change`](Self::note_change) and drives a single timer
/// into [`tick`](Self::tick); nothing here polls or samples a clock of its
/// own. Writes happen only when the draft is dirty, the debounce window
/// has passed, a title is present, and the serialized document actually
/// differs from the last write. Last writer wins; restore is
/// all-or-nothing.
pub struct Autosave<S: SnapshotStore> {
    store: S,
    key: PostKey,
    debounce_ms: i64,
    /// Document JSON as of the last successful write (or offered restore).
    last_saved: Option<String>,
    /// When the first unsaved change was reported.
    dirty_since: Option<i64>,
}

impl<S: SnapshotStore> Autosave<S> {
    pub fn new(store: S, key: PostKey) -> Self {
        Autosave {
            store,
            key,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            last_saved: None,
            dirty_since: None,
        }
    }

    pub fn with_debounce_ms(mut self, debounce_ms: i64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }

    /// Record that the editor content changed. The timestamp of the first
    /// change since the last write is kept, so a burst of edits saves once
    /// the burst is `debounce_ms` old, not never.
    pub fn note_change(&mut self, now_ms: i64) {
        self.dirty_since.get_or_insert(now_ms);
    }

    /// Run one autosave pass. Returns whether a snapshot was written.
    pub fn tick(&mut self, now_ms: i64, draft: Draft<'_>) -> Result<bool, StoreError> {
        let Some(since) = self.dirty_since else {
            return Ok(false);
        };
        if now_ms.saturating_sub(since) < self.debounce_ms {
            return Ok(false);
        }
        // A draft with no title is not worth keeping yet; stay dirty and
        // retry on a later tick.
        if draft.title.trim().is_empty() {
            return Ok(false);
        }

        let content = draft
            .document
            .to_json()
            .map_err(|e| StoreError::Serialize(e.to_string()))?;
        if self.last_saved.as_deref() == Some(content.as_str()) {
            self.dirty_since = None;
            return Ok(false);
        }

        let snapshot = Snapshot {
            title: draft.title.to_string(),
            content: content.clone(),
            timestamp: now_ms,
            category: draft.category.to_string(),
            tags: draft.tags.to_vec(),
        };
        self.store.put(&self.key.storage_key(), &snapshot)?;
        self.last_saved = Some(content);
        self.dirty_since = None;
        debug!(key = %self.key.storage_key(), "autosave snapshot written");
        Ok(true)
    }

    /// The snapshot to offer for restore, if one exists and is fresh.
    /// Stale or unreadable entries are purged and nothing is offered.
    pub fn restore_offer(&mut self, now_ms: i64) -> Option<Snapshot> {
        let key = self.key.storage_key();
        match self.store.get(&key) {
            Ok(Some(snapshot)) if !snapshot.is_stale(now_ms) => {
                self.last_saved = Some(snapshot.content.clone());
                Some(snapshot)
            }
            Ok(Some(_)) => {
                debug!(%key, "stale autosave snapshot purged");
                if let Err(e) = self.store.remove(&key) {
                    warn!(%key, "cannot purge stale snapshot: {e}");
                }
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(%key, "discarding unreadable autosave snapshot: {e}");
                if let Err(e) = self.store.remove(&key) {
                    warn!(%key, "cannot purge unreadable snapshot: {e}");
                }
                None
            }
        }
    }

    /// Drop the stored snapshot, e.g. after a successful publish.
    pub fn discard(&mut self) -> Result<(), StoreError> {
        self.last_saved = None;
        self.dirty_since = None;
        self.store.remove(&self.key.storage_key())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

/// Sweep a whole store, removing stale and unreadable snapshots. Returns
/// the removed keys.
pub fn purge_stale<S: SnapshotStore>(
    store: &mut S,
    now_ms: i64,
) -> Result<Vec<String>, StoreError> {
    let mut removed = Vec::new();
    for key in store.keys()? {
        if PostKey::from_storage_key(&key).is_none() {
            continue;
        }
        let drop = match store.get(&key) {
            Ok(Some(snapshot)) => snapshot.is_stale(now_ms),
            Ok(None) => false,
            Err(StoreError::Corrupt { .. }) => true,
            Err(e) => return Err(e),
        };
        if drop {
            store.remove(&key)?;
            removed.push(key);
        }
    }
    Ok(removed)
}
