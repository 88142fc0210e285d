//! Configuration file loading and parsing.

use std::path::Path;
use std::{fs, io};

use anyhow::{Context, Result};
use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::core::{HookNames, is_valid_state_key};

pub const CONFIG_FILE_NAME: &str = ".variarc.json";

pub const TEST_FILE_PATTERNS: &[&str] = &[
    "**/*.test.tsx",
    "**/*.test.ts",
    "**/*.test.jsx",
    "**/*.test.js",
    "**/*.spec.tsx",
    "**/*.spec.ts",
    "**/*.spec.jsx",
    "**/*.spec.js",
    "**/__tests__/**",
];

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Paths or glob patterns to skip during discovery.
    #[serde(default)]
    pub ignores: Vec<String>,
    /// Directories to analyze, relative to `source_root`. Empty means the
    /// whole source root.
    #[serde(default = "default_includes")]
    pub includes: Vec<String>,
    #[serde(default = "default_source_root")]
    pub source_root: String,
    #[serde(default = "default_ignore_test_files")]
    pub ignore_test_files: bool,
    /// Names of the declaration hooks to recognize.
    #[serde(default)]
    pub hooks: HookNames,
    /// Keys to scan for even when no file declares them.
    #[serde(default)]
    pub extra_keys: Vec<String>,
}

fn default_includes() -> Vec<String> {
    ["src", "app", "components"].map(String::from).to_vec()
}

fn default_source_root() -> String {
    "./".to_string()
}

fn default_ignore_test_files() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ignores: Vec::new(),
            includes: default_includes(),
            source_root: default_source_root(),
            ignore_test_files: default_ignore_test_files(),
            hooks: HookNames::default(),
            extra_keys: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from `path`. A missing file yields the defaults;
    /// a present but malformed file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Returns an error for invalid glob patterns in `ignores`, non-kebab
    /// `extra_keys`, or empty hook names.
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.ignores {
            Pattern::new(pattern)
                .with_context(|| format!("Invalid glob pattern in 'ignores': \"{}\"", pattern))?;
        }
        for key in &self.extra_keys {
            if !is_valid_state_key(key) {
                anyhow::bail!("Invalid key in 'extraKeys': \"{}\" (expected kebab-case)", key);
            }
        }
        if self.hooks.global.is_empty() || self.hooks.scoped.is_empty() {
            anyhow::bail!("Hook names must not be empty");
        }
        Ok(())
    }
}
