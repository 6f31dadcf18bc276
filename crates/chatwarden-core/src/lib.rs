//! Core domain + application logic for the chatwarden assistant.
//!
//! This crate is intentionally framework-agnostic. The chat channel and the
//! roster/world provider live behind ports (traits) implemented by thin
//! adapter shims in the host binary.

pub mod bot;
pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod mailbox;
pub mod parser;
pub mod ports;
pub mod presence;
pub mod sanitize;

pub use errors::{Error, Result};
