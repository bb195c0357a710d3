use std::time::Duration;

pub const DEFAULT_SIDECAR_PATH: &str = "src/data/players.json";
/// Key of the sidecar document the playlist is written under.
pub const PLAYLIST_KEY: &str = "playlist";

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_STATIC_DIR: &str = "dist";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Knobs for a single extraction run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Drop a trailing seed marker such as " [1]" from names.
    pub strip_seed: bool,
}

impl ExtractOptions {
    /// Live pages always show seeds next to names; strip them by default there.
    pub fn live() -> Self {
        Self { strip_seed: true }
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl FetchConfig {
    pub fn with_timeout_secs(secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(secs),
            ..Self::default()
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub static_dir: String,
    pub fetch: FetchConfig,
    pub extract: ExtractOptions,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            static_dir: DEFAULT_STATIC_DIR.to_string(),
            fetch: FetchConfig::default(),
            extract: ExtractOptions::live(),
        }
    }
}
