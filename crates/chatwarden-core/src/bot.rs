//! The assistant itself: command dispatch, offline-note delivery, and the
//! cooperative event loop tying them to the chat channel.
//!
//! One `ChatBot` owns the mailbox and the presence watcher and is driven by a
//! single task, so a chat line and a presence tick never mutate state
//! concurrently.

use std::sync::Arc;

use chrono::{Local, TimeZone};
use tokio::sync::mpsc;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    domain::RosterEntry,
    mailbox::{MailboxStore, PendingNote},
    parser::{self, ParsedMessage},
    ports::{ChatTransport, WorldView},
    presence::PresenceWatcher,
    sanitize::LeakGuard,
    Result,
};

pub struct ChatBot {
    cfg: Arc<Config>,
    guard: LeakGuard,
    transport: Arc<dyn ChatTransport>,
    world: Arc<dyn WorldView>,
    mailbox: MailboxStore,
    presence: PresenceWatcher,
}

impl ChatBot {
    pub fn new(
        cfg: Arc<Config>,
        transport: Arc<dyn ChatTransport>,
        world: Arc<dyn WorldView>,
    ) -> Self {
        let guard = LeakGuard::from_config(&cfg);
        let mailbox = MailboxStore::load(cfg.mailbox_path());
        Self {
            cfg,
            guard,
            transport,
            world,
            mailbox,
            presence: PresenceWatcher::new(),
        }
    }

    /// Reload persisted state and seed presence from the current roster.
    pub fn activate(&mut self) {
        self.mailbox = MailboxStore::load(self.cfg.mailbox_path());
        self.presence.activate(&self.world.roster());
        info!(prefix = %self.cfg.command_prefix, "chat assistant active");
    }

    /// Final save and presence reset.
    pub fn deactivate(&mut self) {
        self.mailbox.save();
        self.presence.deactivate();
        info!("chat assistant inactive");
    }

    pub fn mailbox(&self) -> &MailboxStore {
        &self.mailbox
    }

    /// Handle one raw inbound line. Lines that match no known shape, and
    /// chatter without the command prefix, are dropped silently.
    pub async fn on_chat_line(&mut self, raw: &str) -> Result<()> {
        let Some(msg) = parser::parse(raw) else {
            debug!("unrecognized line shape: {raw:?}");
            return Ok(());
        };
        self.dispatch(msg).await
    }

    /// One presence sample: anyone who just appeared gets their mailbox
    /// drained. Gated on the offline messenger feature.
    pub async fn on_presence_tick(&mut self) -> Result<()> {
        if !self.cfg.enable_offline_messenger {
            return Ok(());
        }
        let fresh = self.presence.observe(&self.world.roster());
        for entry in fresh {
            debug!("presence edge: {}", entry.name);
            self.deliver_to(&entry.name).await?;
        }
        Ok(())
    }

    /// Cooperative single-owner loop over the two event sources. Delivery on
    /// a presence edge is delayed by at most one poll interval.
    pub async fn run(&mut self, mut lines: mpsc::Receiver<String>, cancel: CancellationToken) {
        let mut ticker = interval(self.cfg.presence_poll_interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                maybe = lines.recv() => {
                    let Some(line) = maybe else { break };
                    if let Err(e) = self.on_chat_line(&line).await {
                        warn!("failed to handle chat line: {e}");
                    }
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.on_presence_tick().await {
                        warn!("presence tick failed: {e}");
                    }
                }
            }
        }
    }

    async fn dispatch(&mut self, msg: ParsedMessage) -> Result<()> {
        let body = msg.body.trim();
        let Some(cmdline) = body.strip_prefix(self.cfg.command_prefix.as_str()) else {
            return Ok(());
        };
        let cmdline = cmdline.trim();
        if cmdline.is_empty() {
            return Ok(());
        }

        if self.cfg.enable_info_commands {
            if cmdline.eq_ignore_ascii_case("help") {
                let text = self.help_line();
                return self.reply(&msg.sender, &text, msg.is_private).await;
            }
            if cmdline.eq_ignore_ascii_case("ping") {
                let text = match self.latency_for(&msg.sender) {
                    Some(ms) => format!("Your ping: {ms} ms"),
                    None => "Ping: N/A (you are not visible in the roster)".to_string(),
                };
                return self.reply(&msg.sender, &text, msg.is_private).await;
            }
            if cmdline.eq_ignore_ascii_case("info") {
                let text = self.info_line();
                return self.reply(&msg.sender, &text, msg.is_private).await;
            }
        }

        if self.cfg.enable_offline_messenger {
            if let Some(rest) = strip_keyword(cmdline, "leave") {
                return self.cmd_leave(&msg, rest).await;
            }
            if cmdline.eq_ignore_ascii_case("inbox") {
                return self.cmd_inbox(&msg).await;
            }
        }

        // Anything else carrying the prefix is inert text, not an error.
        Ok(())
    }

    async fn cmd_leave(&mut self, msg: &ParsedMessage, rest: &str) -> Result<()> {
        // `leave <target> <message>`: the message is everything after the
        // target, never further word-split.
        let mut it = rest.splitn(2, char::is_whitespace);
        let target = it.next().unwrap_or("");
        let note = it.next().map(str::trim).unwrap_or("");
        if target.is_empty() || note.is_empty() {
            let usage = format!("Usage: {}leave <player> <message>", self.cfg.command_prefix);
            return self.reply(&msg.sender, &usage, msg.is_private).await;
        }

        let sanitized = self.guard.inbound(note);
        self.mailbox.enqueue(target, &msg.sender, &sanitized);

        let ack =
            format!("Saved a note for {target}. It will be delivered when they come online.");
        self.reply(&msg.sender, &ack, msg.is_private).await?;

        if self.roster_entry(target).is_some() {
            self.deliver_to(target).await?;
        }
        Ok(())
    }

    async fn cmd_inbox(&mut self, msg: &ParsedMessage) -> Result<()> {
        let count = self.mailbox.peek(&msg.sender).len();
        if count == 0 {
            return self
                .reply(&msg.sender, "You have no offline messages.", msg.is_private)
                .await;
        }
        let text = format!("You have {count} offline message(s). They'll arrive shortly.");
        self.reply(&msg.sender, &text, msg.is_private).await?;
        self.deliver_to(&msg.sender).await
    }

    /// Drain the recipient's mailbox and transmit every note in one pass.
    /// Removal is unconditional on the attempt: a note that fell back to the
    /// public channel still counts as transmitted.
    pub async fn deliver_to(&mut self, recipient: &str) -> Result<()> {
        let notes = self.mailbox.drain(recipient);
        if notes.is_empty() {
            return Ok(());
        }
        info!("delivering {} offline note(s) to {recipient}", notes.len());
        for note in notes {
            self.deliver_one(recipient, &note).await?;
        }
        Ok(())
    }

    async fn deliver_one(&self, recipient: &str, note: &PendingNote) -> Result<()> {
        let line = format!(
            "Offline message from {} ({}): {}",
            note.from,
            format_note_timestamp(note.created_at_ms),
            self.guard.outbound(&note.body),
        );
        let line = self.guard.outbound(&line);

        let went_private = self.transport.send_private(recipient, &line).await?;
        if !went_private {
            self.transport
                .send_public(&format!("{recipient}: {line}"))
                .await?;
        }

        if self.cfg.notify_sender_on_delivery {
            let ack = format!("Your note for {recipient} was delivered.");
            if !self.transport.send_private(&note.from, &ack).await? {
                self.transport
                    .send_public(&format!("{}: {ack}", note.from))
                    .await?;
            }
        }
        Ok(())
    }

    /// Route a reply: a private origin (or disabled public replies) tries the
    /// private channel first and falls back to public prefixed with the
    /// recipient's name; a public reply goes out bare.
    async fn reply(&self, to: &str, text: &str, came_private: bool) -> Result<()> {
        let text = self.guard.outbound(text);
        let want_private = came_private || !self.cfg.public_replies;
        if want_private {
            if self.transport.send_private(to, &text).await? {
                return Ok(());
            }
            return self.transport.send_public(&format!("{to}: {text}")).await;
        }
        self.transport.send_public(&text).await
    }

    fn help_line(&self) -> String {
        let p = &self.cfg.command_prefix;
        format!("Commands: {p}help, {p}ping, {p}info, {p}leave <player> <message>, {p}inbox")
    }

    fn info_line(&self) -> String {
        let roster = self.world.roster();
        let minute = self.world.minute_of_day() % (24 * 60);
        format!(
            "{} players online | world: {} | time: {:02}:{:02}",
            roster.len(),
            self.world.world_id(),
            minute / 60,
            minute % 60
        )
    }

    fn roster_entry(&self, name: &str) -> Option<RosterEntry> {
        self.world
            .roster()
            .into_iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
    }

    fn latency_for(&self, name: &str) -> Option<u32> {
        self.roster_entry(name).map(|e| e.latency_ms)
    }
}

/// Case-insensitive keyword match requiring a whitespace-separated remainder;
/// returns the remainder with leading whitespace removed.
fn strip_keyword<'a>(cmdline: &'a str, keyword: &str) -> Option<&'a str> {
    if cmdline.len() <= keyword.len() || !cmdline.is_char_boundary(keyword.len()) {
        return None;
    }
    let (head, rest) = cmdline.split_at(keyword.len());
    if !head.eq_ignore_ascii_case(keyword) || !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(rest.trim_start())
}

fn format_note_timestamp(epoch_ms: i64) -> String {
    match Local.timestamp_millis_opt(epoch_ms).single() {
        Some(dt) => dt.format("%b %d %H:%M").to_string(),
        None => "unknown time".to_string(),
    }
}
