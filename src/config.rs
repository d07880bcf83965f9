//! Application configuration management.
//!
//! Settings are layered with figment, later layers overriding earlier ones:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. A TOML file: `--config <PATH>` if given, otherwise `config.toml` in
//!    the platform configuration directory (silently skipped if absent)
//! 3. Environment variables prefixed with `LINKDUPE_` (e.g.
//!    `LINKDUPE_LOG_FILE`, `LINKDUPE_ALGORITHM`)
//! 4. Command-line flags
//!
//! # Example
//!
//! ```toml
//! log_file = "/var/log/linkdupe.log"
//! algorithm = "sha256"
//! skip_hidden = true
//! min_size = 4096
//! ignore_patterns = ["*.tmp", "node_modules/"]
//! respect_gitignore = true
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::action_log::{DEFAULT_LOG_CAPACITY, DEFAULT_LOG_FILE};
use crate::cli::Cli;
use crate::dedupe::SessionConfig;
use crate::scanner::{FingerprintAlgorithm, WalkerConfig, DEFAULT_CHUNK_SIZE};

/// Prefix for configuration environment variables.
pub const ENV_PREFIX: &str = "LINKDUPE_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Action log file, appended to on every run.
    pub log_file: PathBuf,
    /// Maximum number of action log entries held in memory.
    pub log_capacity: usize,
    /// Fingerprint algorithm.
    pub algorithm: FingerprintAlgorithm,
    /// Read size used while fingerprinting, in bytes.
    pub chunk_size: usize,
    /// Skip hidden files and directories.
    pub skip_hidden: bool,
    /// Ignore files smaller than this many bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_size: Option<u64>,
    /// Gitignore-style patterns to skip.
    pub ignore_patterns: Vec<String>,
    /// Also skip what the root's `.gitignore` matches.
    pub respect_gitignore: bool,
    /// Report substitutions without performing them.
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            log_capacity: DEFAULT_LOG_CAPACITY,
            algorithm: FingerprintAlgorithm::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            skip_hidden: false,
            min_size: None,
            ignore_patterns: Vec::new(),
            respect_gitignore: false,
            dry_run: false,
        }
    }
}

impl Config {
    /// Load defaults, the config file and the environment, then apply the
    /// command-line flags in `cli`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file is malformed, if an explicitly
    /// given config file does not exist, or if an environment variable has
    /// the wrong type.
    pub fn load(cli: &Cli) -> Result<Self, figment::Error> {
        if let Some(path) = &cli.config {
            if !path.is_file() {
                return Err(figment::Error::from(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
        }
        let mut config: Self = Self::figment(cli.config.as_deref()).extract()?;
        config.apply_cli(cli);
        Ok(config)
    }

    /// Figment with every layer below the command line.
    #[must_use]
    pub fn figment(config_path: Option<&Path>) -> Figment {
        let figment = Figment::from(Serialized::defaults(Self::default()));

        let figment = match config_path {
            Some(path) => figment.merge(Toml::file(path)),
            None => match Self::default_path() {
                Some(path) => figment.merge(Toml::file(path)),
                None => figment,
            },
        };

        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Platform-specific location of `config.toml`, if one can be determined.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "linkdupe").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Override settings with flags given on the command line.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(path) = &cli.log_file {
            self.log_file.clone_from(path);
        }
        if let Some(capacity) = cli.log_capacity {
            self.log_capacity = capacity;
        }
        if let Some(algorithm) = cli.algorithm {
            self.algorithm = algorithm;
        }
        if cli.min_size.is_some() {
            self.min_size = cli.min_size;
        }
        if cli.skip_hidden {
            self.skip_hidden = true;
        }
        if cli.respect_gitignore {
            self.respect_gitignore = true;
        }
        if cli.dry_run {
            self.dry_run = true;
        }
        self.ignore_patterns.extend(cli.ignore_patterns.iter().cloned());
    }

    /// Walker filters described by this configuration.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig::default()
            .with_skip_hidden(self.skip_hidden)
            .with_min_size(self.min_size)
            .with_ignore_patterns(self.ignore_patterns.clone())
            .with_respect_gitignore(self.respect_gitignore)
    }

    /// Scan session settings described by this configuration.
    #[must_use]
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            walker: self.walker_config(),
            algorithm: self.algorithm,
            chunk_size: self.chunk_size,
            dry_run: self.dry_run,
        }
    }
}
