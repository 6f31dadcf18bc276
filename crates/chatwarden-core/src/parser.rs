//! Chat-line classification.
//!
//! Raw lines arrive with no shared schema, so each recognized textual shape
//! is one variant of [`ChatLineKind`], tried in a fixed priority order. A
//! line that matches no shape is not a message this assistant understands.

use std::sync::OnceLock;

use regex::Regex;

/// A chat line reduced to who sent it, what they said, and how it arrived.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedMessage {
    pub sender: String,
    pub body: String,
    pub is_private: bool,
}

/// Recognized line shapes, in priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatLineKind {
    /// `<Name> body`, `[Name] body`, `Name: body`, `Name » body`.
    Public,
    /// `Name -> me: body`, optionally with a leading `from`.
    DirectArrow,
    /// `Name whispers to you: body`.
    Whisper,
    /// `[PM] Name: body`.
    BracketedPm,
}

impl ChatLineKind {
    fn is_private(self) -> bool {
        !matches!(self, ChatLineKind::Public)
    }
}

// Names are 3-16 alphanumeric-or-underscore characters. Shorter or punctuated
// "names" are left unmatched on purpose: a missed command is safe, a
// misattributed sender is not. The connector words are case-insensitive but
// the captured name and body keep their original case.
fn matchers() -> &'static [(ChatLineKind, Regex)] {
    static MATCHERS: OnceLock<Vec<(ChatLineKind, Regex)>> = OnceLock::new();
    MATCHERS.get_or_init(|| {
        vec![
            (
                ChatLineKind::Public,
                Regex::new(r"^\s*<([A-Za-z0-9_]{3,16})>\s*:?\s*(.+)$").expect("valid regex"),
            ),
            (
                ChatLineKind::Public,
                Regex::new(r"^\s*\[([A-Za-z0-9_]{3,16})\]\s*:?\s*(.+)$").expect("valid regex"),
            ),
            (
                // Bare names need the separator to avoid misfiring on prose.
                ChatLineKind::Public,
                Regex::new(r"^\s*([A-Za-z0-9_]{3,16})\s*[:»]\s*(.+)$").expect("valid regex"),
            ),
            (
                ChatLineKind::DirectArrow,
                Regex::new(r"(?i)^\s*(?:from\s+)?([A-Za-z0-9_]{3,16})\s*->\s*(?:me|you)\s*:\s*(.+)$")
                    .expect("valid regex"),
            ),
            (
                ChatLineKind::Whisper,
                Regex::new(r"(?i)^\s*([A-Za-z0-9_]{3,16})\s+whispers\s+to\s+you\s*:\s*(.+)$")
                    .expect("valid regex"),
            ),
            (
                ChatLineKind::BracketedPm,
                Regex::new(r"(?i)^\s*\[pm\]\s*([A-Za-z0-9_]{3,16})\s*:\s*(.+)$")
                    .expect("valid regex"),
            ),
        ]
    })
}

/// Classify a raw line. `None` means the line is noise to this assistant.
///
/// First matching shape wins. The body is trimmed at its edges and never
/// re-parsed.
pub fn parse(raw: &str) -> Option<ParsedMessage> {
    for (kind, re) in matchers() {
        let Some(caps) = re.captures(raw) else {
            continue;
        };
        let sender = caps.get(1)?.as_str().to_string();
        let body = caps.get(2)?.as_str().trim().to_string();
        if body.is_empty() {
            continue;
        }
        return Some(ParsedMessage {
            sender,
            body,
            is_private: kind.is_private(),
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn must_parse(raw: &str) -> ParsedMessage {
        parse(raw).unwrap_or_else(|| panic!("expected a match for {raw:?}"))
    }

    #[test]
    fn public_angle_shape() {
        let m = must_parse("<Steve> hello there");
        assert_eq!(m.sender, "Steve");
        assert_eq!(m.body, "hello there");
        assert!(!m.is_private);
    }

    #[test]
    fn public_bracket_and_colon_shapes() {
        let m = must_parse("[Herobrine] boo");
        assert_eq!(m.sender, "Herobrine");
        assert!(!m.is_private);

        let m = must_parse("Steve: hi");
        assert_eq!((m.sender.as_str(), m.body.as_str()), ("Steve", "hi"));

        let m = must_parse("Steve » over here");
        assert_eq!(m.body, "over here");
        assert!(!m.is_private);
    }

    #[test]
    fn body_is_edge_trimmed_only() {
        let m = must_parse("<Steve>    two  spaces kept   ");
        assert_eq!(m.body, "two  spaces kept");
    }

    #[test]
    fn short_names_and_punctuated_names_do_not_match() {
        assert!(parse("ab: hi").is_none());
        assert!(parse("Ste-ve: hi").is_none());
        assert!(parse("<x> hi").is_none());
        assert!(parse("a2345678901234567: too long").is_none());
    }

    #[test]
    fn prose_with_a_colon_does_not_match() {
        assert!(parse("see here: a colon").is_none());
        assert!(parse("server restarting in 5 minutes...").is_none());
    }

    #[test]
    fn arrow_dm_shape_is_private_and_case_preserving() {
        let m = must_parse("Steve -> me: psst");
        assert!(m.is_private);
        assert_eq!(m.sender, "Steve");

        let m = must_parse("FROM Steve -> You: psst");
        assert!(m.is_private);
        assert_eq!(m.sender, "Steve");
        assert_eq!(m.body, "psst");
    }

    #[test]
    fn whisper_shape_matches_case_insensitively() {
        let m = must_parse("Alex WHISPERS TO YOU: meet me at spawn");
        assert!(m.is_private);
        assert_eq!(m.sender, "Alex");
        assert_eq!(m.body, "meet me at spawn");
    }

    #[test]
    fn bracketed_pm_shape() {
        let m = must_parse("[PM] Alex: got a sec?");
        assert!(m.is_private);
        assert_eq!(m.sender, "Alex");

        // "PM" itself is two characters, so the public bracket shape cannot
        // steal this line.
        let m = must_parse("[pm] Alex: lowercase tag");
        assert!(m.is_private);
    }

    #[test]
    fn empty_bodies_are_dropped() {
        assert!(parse("Steve:   ").is_none());
        assert!(parse("<Steve>").is_none());
    }
}
