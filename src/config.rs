/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing, incomplete or
/// invalid; problems are handed back so they can be logged once logging is up.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::entity::Bounds;
use crate::error::ConfigError;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub bounds: Bounds,
    pub spawn: SpawnConfig,
    pub speed: SpeedConfig,
    pub oracle: Option<OracleConfig>,
    pub log_file: PathBuf,
    pub log_filter: String,
}

#[derive(Clone, Debug)]
pub struct SpawnConfig {
    pub obstacles: usize, // random draws, not a guaranteed count
    pub items: usize,
    pub puzzles: usize,
    pub seed: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct SpeedConfig {
    pub adversary_interval: Duration,
    pub auto_move_interval: Duration,
    pub frame_sleep: Duration,
}

#[derive(Clone, Debug)]
pub struct OracleConfig {
    pub command: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    #[serde(default)]
    grid: TomlGrid,
    #[serde(default)]
    spawn: TomlSpawn,
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    oracle: TomlOracle,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct TomlGrid {
    #[serde(default = "default_rows")]
    rows: usize,
    #[serde(default = "default_cols")]
    cols: usize,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct TomlSpawn {
    #[serde(default = "default_obstacles")]
    obstacles: usize,
    #[serde(default = "default_items")]
    items: usize,
    #[serde(default = "default_puzzles")]
    puzzles: usize,
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct TomlSpeed {
    #[serde(default = "default_adversary_interval")]
    adversary_interval_ms: u64,
    #[serde(default = "default_auto_move_interval")]
    auto_move_interval_ms: u64,
    #[serde(default = "default_frame_sleep")]
    frame_sleep_ms: u64,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct TomlOracle {
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default = "default_oracle_timeout")]
    timeout_ms: u64,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct TomlGeneral {
    #[serde(default = "default_log_file")]
    log_file: String,
    #[serde(default = "default_log_filter")]
    log_filter: String,
}

// ── Defaults ──

fn default_rows() -> usize { 10 }
fn default_cols() -> usize { 10 }
fn default_obstacles() -> usize { 15 }
fn default_items() -> usize { 5 }
fn default_puzzles() -> usize { 3 }
fn default_adversary_interval() -> u64 { 2000 }
fn default_auto_move_interval() -> u64 { 250 }
fn default_frame_sleep() -> u64 { 5 }
fn default_oracle_timeout() -> u64 { 500 }
fn default_log_file() -> String { "cluegrid.log".into() }
fn default_log_filter() -> String { "info".into() }

impl Default for TomlGrid {
    fn default() -> Self {
        TomlGrid { rows: default_rows(), cols: default_cols() }
    }
}

impl Default for TomlSpawn {
    fn default() -> Self {
        TomlSpawn {
            obstacles: default_obstacles(),
            items: default_items(),
            puzzles: default_puzzles(),
            seed: None,
        }
    }
}

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            adversary_interval_ms: default_adversary_interval(),
            auto_move_interval_ms: default_auto_move_interval(),
            frame_sleep_ms: default_frame_sleep(),
        }
    }
}

impl Default for TomlOracle {
    fn default() -> Self {
        TomlOracle { command: None, args: vec![], timeout_ms: default_oracle_timeout() }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral { log_file: default_log_file(), log_filter: default_log_filter() }
    }
}

// ── Loading ──

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::build(TomlConfig::default())
    }
}

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Any problem yields the defaults plus the error that caused it.
    pub fn load() -> (Self, Option<ConfigError>) {
        for dir in candidate_dirs() {
            let path = dir.join("config.toml");
            if !path.exists() {
                continue;
            }
            let parsed = std::fs::read_to_string(&path)
                .map_err(|source| ConfigError::Read { path: path.clone(), source })
                .and_then(|text| GameConfig::parse(&text));
            return match parsed {
                Ok(cfg) => (cfg, None),
                Err(e) => (GameConfig::default(), Some(e)),
            };
        }
        (GameConfig::default(), None)
    }

    /// Parse and validate a config document.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let raw: TomlConfig = toml::from_str(text)?;
        GameConfig::from_toml(raw)
    }

    fn from_toml(raw: TomlConfig) -> Result<Self, ConfigError> {
        if raw.grid.rows < 2 || raw.grid.cols < 2 {
            return Err(ConfigError::Invalid(format!(
                "grid must be at least 2x2, got {}x{}", raw.grid.rows, raw.grid.cols,
            )));
        }
        if raw.grid.rows > i32::MAX as usize || raw.grid.cols > i32::MAX as usize {
            return Err(ConfigError::Invalid("grid dimensions too large".into()));
        }
        for (name, ms) in [
            ("speed.adversary_interval_ms", raw.speed.adversary_interval_ms),
            ("speed.auto_move_interval_ms", raw.speed.auto_move_interval_ms),
            ("oracle.timeout_ms", raw.oracle.timeout_ms),
        ] {
            if ms == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be greater than 0")));
            }
        }
        Ok(GameConfig::build(raw))
    }

    /// Convert an already-validated schema.
    fn build(raw: TomlConfig) -> Self {
        let oracle = match raw.oracle.command {
            Some(cmd) if !cmd.trim().is_empty() => Some(OracleConfig {
                command: cmd,
                args: raw.oracle.args,
                timeout: Duration::from_millis(raw.oracle.timeout_ms),
            }),
            _ => None,
        };

        GameConfig {
            bounds: Bounds::new(raw.grid.rows, raw.grid.cols),
            spawn: SpawnConfig {
                obstacles: raw.spawn.obstacles,
                items: raw.spawn.items,
                puzzles: raw.spawn.puzzles,
                seed: raw.spawn.seed,
            },
            speed: SpeedConfig {
                adversary_interval: Duration::from_millis(raw.speed.adversary_interval_ms),
                auto_move_interval: Duration::from_millis(raw.speed.auto_move_interval_ms),
                frame_sleep: Duration::from_millis(raw.speed.frame_sleep_ms),
            },
            oracle,
            log_file: PathBuf::from(raw.general.log_file),
            log_filter: raw.general.log_filter,
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // Resolve symlinks so a linked binary still finds its own config.
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}
