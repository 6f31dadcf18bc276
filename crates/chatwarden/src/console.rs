//! Thin console shims: stdout as the chat channel, an env-described roster.
//!
//! These carry no logic of their own; they exist so the assistant can be run
//! and poked at from a terminal.

use async_trait::async_trait;
use chrono::{Local, Timelike};

use chatwarden_core::{
    domain::{EntryId, RosterEntry},
    ports::{ChatTransport, WorldView},
    Result,
};

/// Prints sends to stdout. Private delivery is always available here.
#[derive(Default)]
pub struct ConsoleTransport;

impl ConsoleTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ChatTransport for ConsoleTransport {
    async fn send_public(&self, text: &str) -> Result<()> {
        println!("[chat] {text}");
        Ok(())
    }

    async fn send_private(&self, recipient: &str, text: &str) -> Result<bool> {
        println!("[dm -> {recipient}] {text}");
        Ok(true)
    }
}

/// Roster parsed once from `ROSTER` (`id:name:latency_ms,...`); the wall
/// clock supplies the time of day.
pub struct ConsoleWorld {
    entries: Vec<RosterEntry>,
    world_id: String,
}

impl ConsoleWorld {
    pub fn from_env() -> Self {
        let entries = std::env::var("ROSTER")
            .unwrap_or_default()
            .split(',')
            .filter_map(parse_roster_entry)
            .collect();
        let world_id = std::env::var("WORLD_ID").unwrap_or_else(|_| "console".to_string());
        Self { entries, world_id }
    }
}

fn parse_roster_entry(raw: &str) -> Option<RosterEntry> {
    let mut it = raw.trim().splitn(3, ':');
    let id = it.next()?.trim();
    let name = it.next()?.trim();
    if id.is_empty() || name.is_empty() {
        return None;
    }
    let latency_ms = it.next().and_then(|s| s.trim().parse().ok()).unwrap_or(0);
    Some(RosterEntry {
        id: EntryId(id.to_string()),
        name: name.to_string(),
        latency_ms,
    })
}

impl WorldView for ConsoleWorld {
    fn roster(&self) -> Vec<RosterEntry> {
        self.entries.clone()
    }

    fn world_id(&self) -> String {
        self.world_id.clone()
    }

    fn minute_of_day(&self) -> u32 {
        let now = Local::now();
        now.hour() * 60 + now.minute()
    }
}
