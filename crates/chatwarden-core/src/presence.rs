//! Edge-triggered presence detection over a polled roster.

use std::collections::HashSet;

use crate::domain::{EntryId, RosterEntry};

/// Tracks which stable identifiers have been seen this session.
///
/// Membership only grows between activation and deactivation. This set
/// answers "did X just appear", never "is X present right now"; the live
/// roster answers that.
#[derive(Debug, Default)]
pub struct PresenceWatcher {
    seen: HashSet<EntryId>,
}

impl PresenceWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from the current snapshot so participants already present at
    /// activation do not spuriously trigger delivery.
    pub fn activate(&mut self, roster: &[RosterEntry]) {
        self.seen.clear();
        self.seen.extend(roster.iter().map(|e| e.id.clone()));
    }

    pub fn deactivate(&mut self) {
        self.seen.clear();
    }

    /// Entries appearing for the first time this session, each reported
    /// exactly once.
    pub fn observe(&mut self, roster: &[RosterEntry]) -> Vec<RosterEntry> {
        let mut fresh = Vec::new();
        for entry in roster {
            if self.seen.insert(entry.id.clone()) {
                fresh.push(entry.clone());
            }
        }
        fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, name: &str) -> RosterEntry {
        RosterEntry {
            id: EntryId(id.to_string()),
            name: name.to_string(),
            latency_ms: 0,
        }
    }

    #[test]
    fn seeded_entries_do_not_retrigger() {
        let mut watcher = PresenceWatcher::new();
        let roster = vec![entry("u1", "Steve")];
        watcher.activate(&roster);

        assert!(watcher.observe(&roster).is_empty());
    }

    #[test]
    fn new_entry_is_reported_exactly_once() {
        let mut watcher = PresenceWatcher::new();
        watcher.activate(&[entry("u1", "Steve")]);

        let roster = vec![entry("u1", "Steve"), entry("u2", "Alex")];
        let fresh = watcher.observe(&roster);
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].name, "Alex");

        assert!(watcher.observe(&roster).is_empty());
    }

    #[test]
    fn renamed_entry_with_same_id_is_not_an_edge() {
        let mut watcher = PresenceWatcher::new();
        watcher.activate(&[entry("u1", "Steve")]);

        assert!(watcher.observe(&[entry("u1", "Steve_v2")]).is_empty());
    }

    #[test]
    fn reactivation_reseeds_from_the_new_snapshot() {
        let mut watcher = PresenceWatcher::new();
        watcher.activate(&[entry("u1", "Steve")]);
        watcher.deactivate();

        // u2 was online at reactivation time: no edge for them either.
        watcher.activate(&[entry("u2", "Alex")]);
        assert!(watcher.observe(&[entry("u2", "Alex")]).is_empty());

        // u1 coming back after the reseed is a fresh edge.
        let fresh = watcher.observe(&[entry("u2", "Alex"), entry("u1", "Steve")]);
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].name, "Steve");
    }
}
