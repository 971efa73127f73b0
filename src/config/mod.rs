//! Configuration System for autodiag
//!
//! Provides:
//! - TOML configuration files
//! - Environment variable overrides
//! - Multiple config file locations
//!
//! # Configuration File Locations
//!
//! Configuration files are searched in order (first found wins):
//! 1. `./autodiag.toml` - Project-local configuration
//! 2. `~/.config/autodiag/config.toml` - User configuration (XDG)
//! 3. `~/.autodiag/config.toml` - User configuration (legacy)
//! 4. `/etc/autodiag/config.toml` - System-wide configuration
//!
//! An explicit `--config <FILE>` replaces the search entirely.
//!
//! # Environment Variables
//!
//! - `AUTODIAG_LOG_LEVEL` - Logging verbosity (quiet, normal, verbose, debug)
//! - `AUTODIAG_FORMAT` - Report format (text, json)
//! - `AUTODIAG_RULES` - Rule file path
//! - `AUTODIAG_VARIABLES` - Variable list path
//! - `AUTODIAG_ROOT` - Variable seeding forward propagation
//! - `AUTODIAG_STRICT` - Treat malformed input and missing variables as errors (true/false)
//! - `AUTODIAG_MAX_DEPTH` - Maximum goal nesting (0 = unlimited)
//! - `AUTODIAG_MAX_FACTS` - Maximum propagated facts (0 = unlimited)
//!
//! # Example Configuration
//!
//! ```toml
//! # autodiag.toml
//!
//! [general]
//! log_level = "normal"
//! format = "text"
//! show_kb = false
//!
//! [session]
//! rules_file = "data/knowledge_base.txt"
//! variables_file = "data/variables.csv"
//! root_variable = "has_issue"
//! default_goal = "repair"
//!
//! [reasoning]
//! strict = false
//! max_depth = 0
//! max_facts = 10000
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::reasoning::{ForwardConfig, ResolverConfig, DEFAULT_ROOT_VARIABLE};

// ============================================================================
// Configuration Schema
// ============================================================================

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DiagConfig {
    pub general: GeneralConfig,
    pub session: SessionConfig,
    pub reasoning: ReasoningConfig,
}

/// General configuration options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Logging level
    pub log_level: LogLevel,
    /// Report format
    pub format: OutputFormat,
    /// Print the knowledge base before diagnosing
    pub show_kb: bool,
}

/// Input files and goals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub rules_file: PathBuf,
    pub variables_file: PathBuf,
    /// Variable whose binding seeds forward propagation
    pub root_variable: String,
    /// Goal used when none is given on the command line
    pub default_goal: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rules_file: PathBuf::from("knowledge_base.txt"),
            variables_file: PathBuf::from("variables.csv"),
            root_variable: DEFAULT_ROOT_VARIABLE.to_string(),
            default_goal: None,
        }
    }
}

/// Reasoning limits and strictness
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ReasoningConfig {
    /// Reject the whole input on the first malformed line, and fail on missing variables
    pub strict: bool,
    /// Maximum goal nesting (0 = unlimited)
    pub max_depth: usize,
    /// Maximum propagated facts (0 = unlimited)
    pub max_facts: usize,
}

// ============================================================================
// Enums
// ============================================================================

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "plain" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

/// Logging verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Quiet,
    #[default]
    Normal,
    Verbose,
    Debug,
}

impl LogLevel {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "quiet" | "q" | "0" => Some(LogLevel::Quiet),
            "normal" | "n" | "1" => Some(LogLevel::Normal),
            "verbose" | "v" | "2" => Some(LogLevel::Verbose),
            "debug" | "d" | "3" => Some(LogLevel::Debug),
            _ => None,
        }
    }

    /// `tracing` filter directive for this level
    pub fn filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Quiet => "error",
            LogLevel::Normal => "warn",
            LogLevel::Verbose => "info",
            LogLevel::Debug => "debug",
        }
    }

    /// Raise by `steps` levels, saturating at `Debug`
    pub fn louder(self, steps: u8) -> Self {
        (0..steps).fold(self, |level, _| match level {
            LogLevel::Quiet => LogLevel::Normal,
            LogLevel::Normal => LogLevel::Verbose,
            LogLevel::Verbose | LogLevel::Debug => LogLevel::Debug,
        })
    }
}

fn parse_flag(val: &str) -> bool {
    matches!(val.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

// ============================================================================
// Configuration Loading
// ============================================================================

impl DiagConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from `explicit`, or from the first file found in the
    /// standard locations, then apply environment overrides
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::load_from_file(path)?,
            None => Self::config_paths()
                .into_iter()
                .find(|path| path.exists())
                .map(|path| Self::load_from_file(&path))
                .transpose()?
                .unwrap_or_default(),
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e.to_string()))?;

        let config: DiagConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;

        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Load configuration from a TOML string
    pub fn load_from_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::ParseError(PathBuf::from("<string>"), e.to_string()))
    }

    /// Standard configuration file locations, in search order
    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./autodiag.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("autodiag").join("config.toml"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".autodiag").join("config.toml"));
        }

        #[cfg(unix)]
        paths.push(PathBuf::from("/etc/autodiag/config.toml"));

        paths
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Apply `AUTODIAG_*` overrides looked up through `lookup`.
    /// Values that do not parse are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(level) = lookup("AUTODIAG_LOG_LEVEL").and_then(|v| LogLevel::from_str(&v)) {
            self.general.log_level = level;
        }

        if let Some(format) = lookup("AUTODIAG_FORMAT").and_then(|v| OutputFormat::from_str(&v)) {
            self.general.format = format;
        }

        if let Some(path) = lookup("AUTODIAG_RULES") {
            self.session.rules_file = PathBuf::from(path);
        }

        if let Some(path) = lookup("AUTODIAG_VARIABLES") {
            self.session.variables_file = PathBuf::from(path);
        }

        if let Some(root) = lookup("AUTODIAG_ROOT").filter(|v| !v.trim().is_empty()) {
            self.session.root_variable = root.trim().to_string();
        }

        if let Some(val) = lookup("AUTODIAG_STRICT") {
            self.reasoning.strict = parse_flag(&val);
        }

        if let Some(depth) = lookup("AUTODIAG_MAX_DEPTH").and_then(|v| v.parse().ok()) {
            self.reasoning.max_depth = depth;
        }

        if let Some(facts) = lookup("AUTODIAG_MAX_FACTS").and_then(|v| v.parse().ok()) {
            self.reasoning.max_facts = facts;
        }
    }

    /// Settings for the backward resolver
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            strict: self.reasoning.strict,
            max_depth: self.reasoning.max_depth,
        }
    }

    /// Settings for forward propagation
    pub fn forward_config(&self) -> ForwardConfig {
        ForwardConfig {
            root_variable: self.session.root_variable.clone(),
            max_facts: self.reasoning.max_facts,
        }
    }

    /// Generate a default configuration file content
    pub fn default_config_content() -> &'static str {
        r#"# autodiag configuration file

[general]
# Logging level: quiet, normal, verbose, debug
log_level = "normal"
# Report format: text, json
format = "text"
# Print the knowledge base before diagnosing
show_kb = false

[session]
# Rule file, one rule per line: a = x ^ b = y : c = z
rules_file = "knowledge_base.txt"
# Variable list, one record per line: name,prompt[,kind]
variables_file = "variables.csv"
# Variable whose value seeds forward propagation
root_variable = "has_issue"
# Goal to diagnose when none is given (optional)
# default_goal = "repair"

[reasoning]
# Fail on the first malformed line or missing variable
strict = false
# Maximum goal nesting (0 = unlimited)
max_depth = 0
# Maximum propagated facts (0 = unlimited)
max_facts = 0
"#
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// IO error reading a config file
    IoError(PathBuf, String),
    /// Parse error in config file
    ParseError(PathBuf, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, msg) => {
                write!(f, "IO error reading {}: {}", path.display(), msg)
            }
            ConfigError::ParseError(path, msg) => {
                write!(f, "Parse error in {}: {}", path.display(), msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Tests
// ============================================================================
