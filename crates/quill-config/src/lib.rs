//! Configuration management for quill.
//!
//! Parses `quill.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! ```toml
//! [parser]
//! max_depth = 16
//! colon_fences = true
//! gfm = true
//! registered_only = false
//! ```
//!
//! Every key is optional; missing keys take the defaults shown above.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "quill.toml";

/// Upper bound for `parser.max_depth`.
const MAX_NESTING_DEPTH: usize = 256;

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Parser configuration.
    pub parser: ParserConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Settings consumed by the directive parser.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Maximum nesting depth of directives inside directive bodies.
    ///
    /// A directive found at this depth is replaced by an error node.
    pub max_depth: usize,
    /// Recognize `:::` colon fences in addition to backtick and tilde fences.
    pub colon_fences: bool,
    /// Enable GitHub Flavored Markdown (tables, strikethrough, task lists).
    pub gfm: bool,
    /// Only classify fences whose `{name}` has a registered handler.
    ///
    /// When disabled, every `{name}` fence becomes a directive and unknown
    /// names are left to the fallback renderer.
    pub registered_only: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_depth: 16,
            colon_fences: true,
            gfm: true,
            registered_only: false,
        }
    }
}

impl ParserConfig {
    /// Set the maximum directive nesting depth.
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Enable or disable colon fences.
    #[must_use]
    pub fn with_colon_fences(mut self, enabled: bool) -> Self {
        self.colon_fences = enabled;
        self
    }

    /// Enable or disable GitHub Flavored Markdown features.
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    /// Only classify registered directive names.
    #[must_use]
    pub fn with_registered_only(mut self, enabled: bool) -> Self {
        self.registered_only = enabled;
        self
    }

    /// Validate parser settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if `max_depth` is zero or exceeds the
    /// supported limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::Validation(
                "parser.max_depth must be greater than 0".to_owned(),
            ));
        }
        if self.max_depth > MAX_NESTING_DEPTH {
            return Err(ConfigError::Validation(format!(
                "parser.max_depth cannot exceed {MAX_NESTING_DEPTH}"
            )));
        }
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

impl Config {
    /// Load configuration from file.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `quill.toml` in current directory and parents,
    /// falling back to defaults when none is found.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or validation fails.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            return Self::load_from_file(path);
        }

        let discovered = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover_from(&cwd));
        match discovered {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Parse and validate configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parser.validate()
    }

    /// Search for a config file in `start` and its parents.
    fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }
}
