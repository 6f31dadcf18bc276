//! Durable per-recipient queues of offline notes.
//!
//! The whole mailbox is one JSON document keyed by lowercase recipient name,
//! read in full at activation and rewritten in full (stage-then-swap) on
//! every mutation. Persistence failures are logged and non-fatal: the
//! in-memory map stays authoritative for the rest of the run.

use std::{collections::HashMap, fs, path::PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One note awaiting delivery. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingNote {
    pub from: String,
    pub body: String,
    pub created_at_ms: i64,
}

/// Per-recipient FIFO queues. An emptied queue is removed from the map, so
/// no entry is ever an empty sequence.
pub struct MailboxStore {
    path: PathBuf,
    boxes: HashMap<String, Vec<PendingNote>>,
}

impl MailboxStore {
    /// Read the whole document. A missing file is a normal first run; an
    /// unreadable or malformed one is logged and yields an empty mailbox.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let boxes = match fs::read_to_string(&path) {
            Ok(txt) if txt.trim().is_empty() => HashMap::new(),
            Ok(txt) => match serde_json::from_str(&txt) {
                Ok(map) => map,
                Err(e) => {
                    warn!("malformed mailbox file {}: {e}", path.display());
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!("failed to read mailbox file {}: {e}", path.display());
                HashMap::new()
            }
        };
        Self { path, boxes }
    }

    /// Append a note (body already inbound-sanitized by the caller) to the
    /// target's queue, creating the queue if absent. Persists immediately.
    pub fn enqueue(&mut self, target: &str, from: &str, body: &str) {
        let note = PendingNote {
            from: from.to_string(),
            body: body.to_string(),
            created_at_ms: Utc::now().timestamp_millis(),
        };
        self.boxes
            .entry(target.to_lowercase())
            .or_default()
            .push(note);
        self.save();
    }

    /// Pending notes for an identity, oldest first. Read-only.
    pub fn peek(&self, identity: &str) -> &[PendingNote] {
        self.boxes
            .get(&identity.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Remove and return the identity's whole queue, oldest first, persisting
    /// once after the removal. An absent queue is a no-op with no I/O.
    pub fn drain(&mut self, identity: &str) -> Vec<PendingNote> {
        let Some(notes) = self.boxes.remove(&identity.to_lowercase()) else {
            return Vec::new();
        };
        self.save();
        notes
    }

    /// Rewrite the document via a temp file + rename, so a crash mid-write
    /// leaves either the old complete file or the new one.
    pub fn save(&self) {
        if let Err(e) = self.try_save() {
            warn!("failed to persist mailbox to {}: {e}", self.path.display());
        }
    }

    fn try_save(&self) -> crate::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.boxes)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json.as_bytes())?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn tmp(prefix: &str) -> PathBuf {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or(Duration::from_secs(0))
            .as_nanos();
        let pid = std::process::id();
        PathBuf::from(format!("/tmp/{prefix}-{pid}-{ts}.json"))
    }

    #[test]
    fn enqueue_then_peek_is_case_insensitive() {
        let mut store = MailboxStore::load(tmp("mailbox-peek"));
        store.enqueue("Alex", "Steve", "don't wait up");

        let notes = store.peek("ALEX");
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].from, "Steve");
        assert_eq!(notes[0].body, "don't wait up");
    }

    #[test]
    fn different_case_spellings_share_one_mailbox() {
        let mut store = MailboxStore::load(tmp("mailbox-case"));
        store.enqueue("Bob", "a", "first");
        store.enqueue("BOB", "b", "second");

        let notes = store.peek("bob");
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].body, "first");
        assert_eq!(notes[1].body, "second");
    }

    #[test]
    fn drain_removes_everything_and_is_then_a_noop() {
        let mut store = MailboxStore::load(tmp("mailbox-drain"));
        store.enqueue("alex", "Steve", "one");
        store.enqueue("alex", "Steve", "two");

        let drained = store.drain("Alex");
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].body, "one");

        assert!(store.peek("alex").is_empty());
        assert!(store.drain("alex").is_empty());
    }

    #[test]
    fn persists_and_reloads_equivalently() {
        let path = tmp("mailbox-roundtrip");
        let mut store = MailboxStore::load(&path);
        store.enqueue("alex", "Steve", "see you");
        store.enqueue("alex", "Herobrine", "boo");
        store.enqueue("bob", "Steve", "hi bob");

        let reloaded = MailboxStore::load(&path);
        assert_eq!(reloaded.peek("alex"), store.peek("alex"));
        assert_eq!(reloaded.peek("bob"), store.peek("bob"));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn malformed_file_loads_as_empty() {
        let path = tmp("mailbox-malformed");
        fs::write(&path, "not json at all").unwrap();

        let store = MailboxStore::load(&path);
        assert!(store.peek("anyone").is_empty());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn drained_mailbox_leaves_no_entry_on_disk() {
        let path = tmp("mailbox-drained-disk");
        let mut store = MailboxStore::load(&path);
        store.enqueue("alex", "Steve", "note");
        store.drain("alex");

        let txt = fs::read_to_string(&path).unwrap();
        let map: HashMap<String, Vec<PendingNote>> = serde_json::from_str(&txt).unwrap();
        assert!(map.is_empty());

        let _ = fs::remove_file(&path);
    }
}
