use async_trait::async_trait;

use crate::{domain::RosterEntry, Result};

/// Port to the chat channel.
///
/// Private delivery is best-effort: `Ok(false)` means the channel cannot
/// reach the recipient privately right now. That is a normal outcome, not an
/// error; callers fall back to a public send with the recipient's name.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_public(&self, text: &str) -> Result<()>;
    async fn send_private(&self, recipient: &str, text: &str) -> Result<bool>;
}

/// Port to the surrounding world: who is visible and what the clock says.
///
/// Queried synchronously on demand; the core keeps no cache of it beyond the
/// presence watcher's seen-set.
pub trait WorldView: Send + Sync {
    fn roster(&self) -> Vec<RosterEntry>;
    fn world_id(&self) -> String;
    /// Minutes since local midnight; the core renders it as HH:MM.
    fn minute_of_day(&self) -> u32;
}
