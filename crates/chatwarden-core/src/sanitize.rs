//! Leak guard: keeps evaluatable template syntax and positional telemetry out
//! of anything the assistant stores or transmits.
//!
//! Two contracts, both idempotent: `inbound` defuses template braces once at
//! store time; `outbound` runs the full three-stage pipeline on every string
//! immediately before transmission, including already-defused text.

use std::sync::OnceLock;

use regex::Regex;

use crate::config::Config;

/// Replacement for deny-listed template expressions.
const BLOCKED: &str = "[blocked]";
/// Replacement for raw coordinate shapes.
const COORDS_BLOCKED: &str = "[coords blocked]";

#[derive(Clone, Copy, Debug)]
pub struct LeakGuard {
    pub enabled: bool,
    pub block_dangerous: bool,
    pub strip_braces: bool,
    pub block_raw_coords: bool,
}

impl LeakGuard {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            enabled: cfg.leak_guard,
            block_dangerous: cfg.block_dangerous_starscript,
            strip_braces: cfg.strip_starscript_braces,
            block_raw_coords: cfg.block_raw_xyz_patterns,
        }
    }

    /// Applied once when a note is stored: defuse template braces so a later
    /// verbatim echo cannot be evaluated. Inner text survives verbatim.
    pub fn inbound(&self, text: &str) -> String {
        if !self.enabled || !self.strip_braces {
            return text.to_string();
        }
        defuse_braces(text)
    }

    /// Applied to every string about to be transmitted.
    ///
    /// Stage order matters: deny-listed expressions are discarded whole
    /// before the remaining braces are defused, and the raw-pattern mask runs
    /// last so it also catches telemetry that never came through a template.
    pub fn outbound(&self, text: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }

        let mut out = text.to_string();

        if self.block_dangerous {
            out = dangerous_expr_re().replace_all(&out, BLOCKED).into_owned();
        }
        if self.strip_braces {
            out = defuse_braces(&out);
        }
        if self.block_raw_coords {
            out = mask_raw_coords(&out);
        }

        out
    }
}

// U+FF5B / U+FF5D render like braces but are inert to an ASCII-brace
// template renderer.
fn defuse_braces(text: &str) -> String {
    text.replace('{', "｛").replace('}', "｝")
}

// Template variables exposing self position/orientation/facing, camera
// orientation or server performance counters. The whole expression is
// discarded, not escaped.
fn dangerous_expr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\{[^{}]*\b(?:player\.(?:pos|x|y|z|yaw|pitch|facing|direction)|camera\.(?:yaw|pitch|direction)|server\.tps)\b[^{}]*\}",
        )
        .expect("valid regex")
    })
}

// Three short signed integers separated by spaces and/or commas.
fn coord_triple_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"-?\b\d{1,6}(?:\s*,\s*|\s+)-?\d{1,6}(?:\s*,\s*|\s+)-?\d{1,6}\b")
            .expect("valid regex")
    })
}

// An axis label with a signed decimal value, e.g. `X: 120.5` or `yaw=-90`.
fn labeled_axis_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:x|y|z|yaw|pitch)\s*[:=]\s*-?\d+(?:\.\d+)?").expect("valid regex")
    })
}

// One positional-looking shape anywhere masks every match of both shapes.
fn mask_raw_coords(text: &str) -> String {
    if !coord_triple_re().is_match(text) && !labeled_axis_re().is_match(text) {
        return text.to_string();
    }
    let out = coord_triple_re().replace_all(text, COORDS_BLOCKED);
    labeled_axis_re().replace_all(&out, COORDS_BLOCKED).into_owned()
}
