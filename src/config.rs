//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;
use std::path::PathBuf;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Top-level chat gateway configuration.
///
/// Loaded once at startup via [`ChatConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:5555`).
    pub listen_addr: SocketAddr,

    /// Allow at most one live session per client IP.
    pub block_by_ip: bool,

    /// Largest accepted WebSocket frame, in bytes. Image messages travel
    /// inline as data URLs, so this bounds image size too.
    pub max_message_bytes: usize,

    /// Capacity of the EventBus broadcast channel.
    pub event_bus_capacity: usize,

    /// Messages returned by a history request that names no limit.
    pub default_history_limit: usize,

    /// Messages replayed when a session joins a room.
    pub join_history_limit: usize,

    /// Timeout for REST requests, in seconds.
    pub request_timeout_secs: u64,

    /// Directory of static client files served at `/`, if any.
    pub static_dir: Option<PathBuf>,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 5555)),
            block_by_ip: false,
            max_message_bytes: 25 * 1024 * 1024,
            event_bus_capacity: 1024,
            default_history_limit: 50,
            join_history_limit: 100,
            request_timeout_secs: 30,
            static_dir: None,
            log_format: LogFormat::Pretty,
        }
    }
}

impl ChatConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to [`ChatConfig::default`] values when a variable is
    /// not set. Calls `dotenvy::dotenv().ok()` to optionally load a
    /// `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, std::net::AddrParseError> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let listen_addr = match std::env::var("LISTEN_ADDR") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.listen_addr,
        };

        let static_dir = std::env::var("STATIC_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let log_format = match std::env::var("LOG_FORMAT").ok().as_deref() {
            Some("json") | Some("JSON") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            listen_addr,
            block_by_ip: parse_env_bool("BLOCK_BY_IP", defaults.block_by_ip),
            max_message_bytes: parse_env("MAX_MESSAGE_BYTES", defaults.max_message_bytes),
            event_bus_capacity: parse_env("EVENT_BUS_CAPACITY", defaults.event_bus_capacity),
            default_history_limit: parse_env(
                "DEFAULT_HISTORY_LIMIT",
                defaults.default_history_limit,
            ),
            join_history_limit: parse_env("JOIN_HISTORY_LIMIT", defaults.join_history_limit),
            request_timeout_secs: parse_env(
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            ),
            static_dir,
            log_format,
        })
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key)
        .ok()
        .map(|v| v.to_ascii_lowercase())
        .as_deref()
    {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        _ => default,
    }
}
