//! Engine Configuration
//!
//! Defaults suitable for production, overridable from `CADENCE_*`
//! environment variables.

use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// DEFAULTS
// ============================================================================

/// Training records buffered before a flush
pub const DEFAULT_TELEMETRY_CAPACITY: usize = 1000;

/// Upper bound on a single remote or similarity call
pub const DEFAULT_COLLABORATOR_TIMEOUT_MS: u64 = 5_000;

/// Related items requested from the similarity lookup
pub const DEFAULT_SIMILARITY_LIMIT: usize = 5;

/// Minimum similarity for a related item to be interleaved
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.75;

/// Related items taken from metadata when the lookup is unavailable
pub const DEFAULT_FALLBACK_RELATED_ITEMS: usize = 3;

// ============================================================================
// ENGINE CONFIG
// ============================================================================

/// Configuration shared by the contextual adjuster, telemetry collector and
/// dispatcher
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Whether the dispatcher may use the contextual path at all
    pub contextual_enabled: bool,
    /// Training records buffered before a flush (min 1)
    pub telemetry_capacity: usize,
    /// Timeout for each collaborator call (remote schedule, similarity lookup)
    pub collaborator_timeout: Duration,
    /// Base URL of the remote scheduling backend (None = local contextual engine)
    pub remote_endpoint: Option<String>,
    /// Related items requested from the similarity lookup
    pub similarity_limit: usize,
    /// Minimum similarity for a related item
    pub similarity_threshold: f64,
    /// Related items taken from metadata when the lookup fails
    pub fallback_related_items: usize,
    /// Where flushed training records are appended (JSON lines)
    pub telemetry_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            contextual_enabled: true,
            telemetry_capacity: DEFAULT_TELEMETRY_CAPACITY,
            collaborator_timeout: Duration::from_millis(DEFAULT_COLLABORATOR_TIMEOUT_MS),
            remote_endpoint: None,
            similarity_limit: DEFAULT_SIMILARITY_LIMIT,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            fallback_related_items: DEFAULT_FALLBACK_RELATED_ITEMS,
            telemetry_path: None,
        }
    }
}

impl EngineConfig {
    /// Defaults with environment overrides applied.
    ///
    /// Unparseable values are ignored with a warning rather than failing
    /// startup.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let capacity = env_parse::<usize>("CADENCE_TELEMETRY_CAPACITY")
            .unwrap_or(defaults.telemetry_capacity)
            .max(1);

        Self {
            contextual_enabled: env_parse::<bool>("CADENCE_CONTEXTUAL_ENABLED")
                .unwrap_or(defaults.contextual_enabled),
            telemetry_capacity: capacity,
            collaborator_timeout: env_parse::<u64>("CADENCE_COLLABORATOR_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.collaborator_timeout),
            remote_endpoint: env_string("CADENCE_REMOTE_ENDPOINT"),
            telemetry_path: env_string("CADENCE_TELEMETRY_PATH").map(PathBuf::from),
            ..defaults
        }
    }

    /// Builder-style capacity override (min 1)
    pub fn with_telemetry_capacity(mut self, capacity: usize) -> Self {
        self.telemetry_capacity = capacity.max(1);
        self
    }

    /// Builder-style timeout override
    pub fn with_collaborator_timeout(mut self, timeout: Duration) -> Self {
        self.collaborator_timeout = timeout;
        self
    }

    /// Telemetry file location, falling back to the platform data directory
    pub fn resolved_telemetry_path(&self) -> Option<PathBuf> {
        self.telemetry_path.clone().or_else(default_telemetry_path)
    }
}

/// Platform data directory location of the telemetry file.
///
/// - macOS: ~/Library/Application Support/com.cadence.core/telemetry.jsonl
/// - Linux: ~/.local/share/cadence/telemetry.jsonl
/// - Windows: %APPDATA%\cadence\core\data\telemetry.jsonl
pub fn default_telemetry_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "cadence", "core")
        .map(|dirs| dirs.data_dir().join("telemetry.jsonl"))
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env_string(key)?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable environment override");
            None
        }
    }
}
