/// Opaque stable identifier of a roster participant.
///
/// Display names restyle and collide; presence edges key on this id.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EntryId(pub String);

/// One visible participant in a roster snapshot.
#[derive(Clone, Debug)]
pub struct RosterEntry {
    pub id: EntryId,
    pub name: String,
    pub latency_ms: u32,
}
