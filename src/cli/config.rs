// ABOUTME: Configuration management for redis-template
// ABOUTME: Merges defaults, config file, environment variables, and command line flags

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::Args;
use crate::notify::{DEFAULT_CAPACITY, DEFAULT_CHANNEL};
use crate::parser::{parse_descriptors, ParserError, TemplateSpec};

pub const LOG_LEVELS: [&str; 4] = ["debug", "info", "warn", "error"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub redis_addr: Option<String>,

    #[serde(default = "default_channel")]
    pub channel: String,

    #[serde(with = "humantime_serde", default)]
    pub splay: Duration,

    #[serde(default)]
    pub templates: Vec<String>,

    #[serde(default = "default_capacity")]
    pub notification_capacity: usize,

    #[serde(default = "default_shell")]
    pub shell: String,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

fn default_channel() -> String {
    DEFAULT_CHANNEL.to_string()
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_shell() -> String {
    "sh".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_addr: None,
            channel: default_channel(),
            splay: Duration::ZERO,
            templates: Vec::new(),
            notification_capacity: default_capacity(),
            shell: default_shell(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "error".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file path or default locations
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let explicit = path.is_some();
        let config_path = match path {
            Some(p) => p,
            None => Self::find_config_file(),
        };

        let mut config = if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("failed to read {}", config_path.display()))?;
            Self::from_yaml(&contents)
                .with_context(|| format!("invalid configuration in {}", config_path.display()))?
        } else if explicit {
            bail!("configuration file {} does not exist", config_path.display());
        } else {
            Config::default()
        };

        config.merge_env()?;
        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> PathBuf {
        let possible_paths = [
            PathBuf::from("redis-template.yaml"),
            PathBuf::from("redis-template.yml"),
            PathBuf::from(".redis-template.yaml"),
            PathBuf::from(".redis-template.yml"),
        ];

        for path in possible_paths {
            if path.exists() {
                return path;
            }
        }

        if let Some(home_dir) = dirs::home_dir() {
            let home_config = home_dir.join(".redis-template").join("config.yaml");
            if home_config.exists() {
                return home_config;
            }
        }

        // Default path (may not exist)
        PathBuf::from("redis-template.yaml")
    }

    fn merge_env(&mut self) -> Result<()> {
        self.merge_env_from(|key| std::env::var(key).ok())
    }

    /// Merge environment overrides supplied by `lookup`
    pub fn merge_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("REDIS_TEMPLATE_ADDR") {
            self.redis_addr = Some(addr);
        }
        if let Some(channel) = lookup("REDIS_TEMPLATE_CHANNEL") {
            self.channel = channel;
        }
        if let Some(splay) = lookup("REDIS_TEMPLATE_SPLAY") {
            self.splay = humantime::parse_duration(&splay)
                .with_context(|| format!("invalid REDIS_TEMPLATE_SPLAY '{}'", splay))?;
        }
        if let Some(level) = lookup("REDIS_TEMPLATE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("REDIS_TEMPLATE_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Apply command line flags on top of everything else
    pub fn merge_args(&mut self, args: &Args) {
        self.templates.extend(args.templates.iter().cloned());

        if let Some(ref addr) = args.redis_addr {
            self.redis_addr = Some(addr.clone());
        }
        if let Some(ref channel) = args.redis_chan {
            self.channel = channel.clone();
        }
        if let Some(splay) = args.splay {
            self.splay = splay;
        }
        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Normalized log level, or an error naming the accepted values
    pub fn log_level(&self) -> Result<String> {
        let level = self.logging.level.to_lowercase();
        if LOG_LEVELS.contains(&level.as_str()) {
            Ok(level)
        } else {
            bail!(
                "invalid log-level given: {} (expected one of {})",
                self.logging.level,
                LOG_LEVELS.join("|")
            )
        }
    }

    /// Redis address, required before the engine can start
    pub fn require_redis_addr(&self) -> Result<&str> {
        match self.redis_addr.as_deref() {
            Some(addr) if !addr.is_empty() => Ok(addr),
            _ => bail!("no redis address given"),
        }
    }

    /// Parsed template descriptors, in configured order
    pub fn template_specs(&self) -> std::result::Result<Vec<TemplateSpec>, ParserError> {
        parse_descriptors(&self.templates)
    }
}
