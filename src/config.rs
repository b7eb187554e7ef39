//! Configuration loading and management.

use crate::board::BoardOptions;
use crate::geometry::{Point, Size};
use crate::persist::WritePolicy;
use crate::store::ids::IdStyle;
use crate::store::{Clock, StoreOptions};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Project-level config file, relative to the working directory.
pub const PROJECT_CONFIG: &str = "task-board.yaml";

/// Board configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub canvas: CanvasConfig,
    pub ids: IdsConfig,
    pub connections: ConnectionsConfig,
}

/// Where and how the snapshot is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Snapshot file. A `.gz` extension writes it compressed.
    pub path: PathBuf,

    /// Indent the JSON.
    pub pretty: bool,

    pub write_policy: WritePolicyKind,

    /// Quiet period before a debounced write.
    pub debounce_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("tasks.json"),
            pretty: true,
            write_policy: WritePolicyKind::Immediate,
            debounce_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicyKind {
    #[default]
    Immediate,
    Debounced,
}

/// Canvas geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub node_width: f64,
    pub node_height: f64,
    /// Where tasks created without a position are placed.
    pub new_task_position: Point,
    pub arrow_size: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            node_width: 200.0,
            node_height: 80.0,
            new_task_position: Point::new(20.0, 20.0),
            arrow_size: 15.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdsConfig {
    pub style: IdStyle,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionsConfig {
    /// Permit a task to connect to itself.
    pub allow_self_loops: bool,
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Resolve configuration.
    ///
    /// An explicit path must exist. Otherwise the first of `./task-board.yaml`
    /// and `~/.task-board/config.yaml` that exists is used, falling back to
    /// defaults. Environment overrides are applied last.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => {
                if !path.exists() {
                    bail!("config file not found: {}", path.display());
                }
                Self::load(path)?
            }
            None => match Self::candidate_paths().into_iter().find(|p| p.exists()) {
                Some(path) => {
                    debug!(path = %path.display(), "using config file");
                    Self::load(&path)?
                }
                None => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Default config locations, highest priority first.
    pub fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(PROJECT_CONFIG)];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".task-board").join("config.yaml"));
        }
        paths
    }

    /// Apply `TASK_BOARD_*` overrides. Unparseable values are ignored with a
    /// warning.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(path) = var("TASK_BOARD_PATH") {
            self.storage.path = PathBuf::from(path);
        }

        if let Some(style) = var("TASK_BOARD_ID_STYLE") {
            match IdStyle::from_str(&style) {
                Some(style) => self.ids.style = style,
                None => warn!(value = %style, "ignoring unknown TASK_BOARD_ID_STYLE"),
            }
        }

        if let Some(ms) = var("TASK_BOARD_DEBOUNCE_MS") {
            match ms.parse() {
                Ok(ms) => {
                    self.storage.debounce_ms = ms;
                    self.storage.write_policy = WritePolicyKind::Debounced;
                }
                Err(_) => warn!(value = %ms, "ignoring invalid TASK_BOARD_DEBOUNCE_MS"),
            }
        }
    }

    pub fn write_policy(&self) -> WritePolicy {
        match self.storage.write_policy {
            WritePolicyKind::Immediate => WritePolicy::Immediate,
            WritePolicyKind::Debounced => {
                WritePolicy::Debounced(Duration::from_millis(self.storage.debounce_ms))
            }
        }
    }

    pub fn store_options(&self, clock: Clock) -> StoreOptions {
        StoreOptions {
            id_style: self.ids.style,
            allow_self_loops: self.connections.allow_self_loops,
            new_task_position: self.canvas.new_task_position,
            clock,
        }
    }

    pub fn board_options(&self) -> BoardOptions {
        BoardOptions {
            store: self.store_options(Clock::System),
            node_size: Size::new(self.canvas.node_width, self.canvas.node_height),
            arrow_size: self.canvas.arrow_size,
            write_policy: self.write_policy(),
            pretty: self.storage.pretty,
        }
    }
}
