// ============================================
// settings.rs - settings.json and tools.toml
// ============================================
// Two small files live next to the EXE:
//
//   settings.json  Written by us. Remembers executables the user located
//                  by hand so the file dialog only appears once, plus a few
//                  defaults (ADS stream name, timeout override).
//
//   tools.toml     Written by the user. Adds candidate paths for tools
//                  installed somewhere unusual:
//
//                    tools_dir = "D:/Stego/Tools"
//
//                    [[tool]]
//                    id = "steghide"
//                    candidates = ["C:/Program Files/steghide/steghide.exe"]
//
// Both files are optional; a missing or broken file means defaults.
// ============================================

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::stego::DEFAULT_STREAM_NAME;
use crate::tools::{ExeRole, ToolSpec};

pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const MANIFEST_FILE_NAME: &str = "tools.toml";

// ============================================
// settings.json
// ============================================

/// Persisted launcher settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Executables picked by hand, keyed by "<tool id>" or "<tool id>:extract"
    #[serde(default)]
    pub remembered: BTreeMap<String, PathBuf>,

    /// Stream name pre-filled on the ADS Streams tab
    #[serde(default = "default_stream_name")]
    pub ads_stream_name: String,

    /// Overrides every per-tool timeout when set
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_stream_name() -> String {
    DEFAULT_STREAM_NAME.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            remembered: BTreeMap::new(),
            ads_stream_name: default_stream_name(),
            timeout_secs: None,
        }
    }
}

fn remember_key(tool: &ToolSpec, role: ExeRole) -> String {
    format!("{}{}", tool.id, role.key_suffix())
}

impl Settings {
    /// Load settings, falling back to defaults on any problem
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(settings) => settings,
                Err(e) => {
                    warn!(path = %path.display(), err = %e, "settings file is invalid, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), err = %e, "could not read settings file");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;
        debug!(path = %path.display(), "settings saved");
        Ok(())
    }

    pub fn remembered_path(&self, tool: &ToolSpec, role: ExeRole) -> Option<&Path> {
        self.remembered
            .get(&remember_key(tool, role))
            .map(PathBuf::as_path)
    }

    pub fn remember(&mut self, tool: &ToolSpec, role: ExeRole, path: PathBuf) {
        self.remembered.insert(remember_key(tool, role), path);
    }

    pub fn forget(&mut self, tool: &ToolSpec, role: ExeRole) {
        self.remembered.remove(&remember_key(tool, role));
    }

    /// The timeout to use for a tool whose built-in limit is `default`
    pub fn timeout_or(&self, default: Duration) -> Duration {
        self.timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(default)
    }
}

// ============================================
// tools.toml
// ============================================

/// Extra candidates for one tool
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolOverride {
    pub id: String,
    #[serde(default)]
    pub candidates: Vec<PathBuf>,
    #[serde(default)]
    pub extract_candidates: Vec<PathBuf>,
}

/// The user's tools.toml
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolManifest {
    /// Replaces the default Tools folder
    #[serde(default)]
    pub tools_dir: Option<PathBuf>,

    #[serde(default, rename = "tool")]
    pub tools: Vec<ToolOverride>,
}

impl ToolManifest {
    /// Parse tools.toml; a missing file is an empty manifest
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// User-supplied candidates for a tool, tried after the built-in list
    pub fn extra_candidates(&self, tool: &ToolSpec, role: ExeRole) -> Vec<PathBuf> {
        self.tools
            .iter()
            .filter(|o| o.id == tool.id)
            .flat_map(|o| match role {
                ExeRole::Main => o.candidates.iter(),
                ExeRole::Extract => o.extract_candidates.iter(),
            })
            .cloned()
            .collect()
    }
}
