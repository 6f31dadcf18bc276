use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

/// Typed configuration for the assistant.
///
/// Owned by the host; read-only from the core's perspective.
#[derive(Clone, Debug)]
pub struct Config {
    /// Exact, case-sensitive command prefix.
    pub command_prefix: String,
    /// Whether publicly-issued commands may be answered in public chat.
    pub public_replies: bool,

    // Feature groups
    pub enable_info_commands: bool,
    pub enable_offline_messenger: bool,
    pub notify_sender_on_delivery: bool,

    // Leak guard
    pub leak_guard: bool,
    pub strip_starscript_braces: bool,
    pub block_dangerous_starscript: bool,
    pub block_raw_xyz_patterns: bool,

    // Storage / cadence
    pub data_dir: PathBuf,
    pub presence_poll_interval: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let command_prefix = env_str("COMMAND_PREFIX").unwrap_or_else(|| "!".to_string());
        if command_prefix.trim().is_empty() {
            return Err(Error::Config(
                "COMMAND_PREFIX must not be empty".to_string(),
            ));
        }

        let public_replies = env_bool("PUBLIC_REPLIES").unwrap_or(true);

        let enable_info_commands = env_bool("ENABLE_INFO_COMMANDS").unwrap_or(true);
        let enable_offline_messenger = env_bool("ENABLE_OFFLINE_MESSENGER").unwrap_or(true);
        let notify_sender_on_delivery = env_bool("NOTIFY_SENDER_ON_DELIVERY").unwrap_or(true);

        let leak_guard = env_bool("LEAK_GUARD").unwrap_or(true);
        let strip_starscript_braces = env_bool("STRIP_STARSCRIPT_BRACES").unwrap_or(true);
        let block_dangerous_starscript = env_bool("BLOCK_DANGEROUS_STARSCRIPT").unwrap_or(true);
        let block_raw_xyz_patterns = env_bool("BLOCK_RAW_XYZ_PATTERNS").unwrap_or(true);

        let data_dir =
            PathBuf::from(env_str("DATA_DIR").unwrap_or_else(|| "./chatwarden-data".to_string()));
        fs::create_dir_all(&data_dir)?;

        let presence_poll_interval =
            Duration::from_millis(env_u64("PRESENCE_POLL_MS").unwrap_or(1000));

        Ok(Self {
            command_prefix,
            public_replies,
            enable_info_commands,
            enable_offline_messenger,
            notify_sender_on_delivery,
            leak_guard,
            strip_starscript_braces,
            block_dangerous_starscript,
            block_raw_xyz_patterns,
            data_dir,
            presence_poll_interval,
        })
    }

    /// Path of the offline mailbox document inside the data directory.
    pub fn mailbox_path(&self) -> PathBuf {
        self.data_dir.join("offline-mailbox.json")
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_bool(key: &str) -> Option<bool> {
    env_str(key).map(|s| {
        matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}
