// ABOUTME: Main application orchestration for the redis-template CLI
// ABOUTME: Validates configuration, initializes logging, and wires the engine to Redis

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use super::{Args, Config};
use crate::action::ShellRunner;
use crate::engine::{Controller, EngineError};
use crate::notify::RedisBus;
use crate::parser::TemplateSpec;
use crate::store::{KeyValueStore, RedisStore};
use crate::template::TemplateSet;

pub struct App {
    config: Config,
}

/// Everything needed to start the engine, checked before any connection is made
#[derive(Debug)]
pub struct StartupPlan {
    pub redis_addr: String,
    pub templates: Vec<TemplateSpec>,
}

impl App {
    /// Create a new application instance
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Initialize logging based on configuration
    pub fn init_logging(&self, verbose: bool, no_color: bool) -> Result<()> {
        let log_level = if verbose {
            "debug".to_string()
        } else {
            self.config.log_level()?
        };

        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

        let result = match self.config.logging.format.as_str() {
            "compact" => tracing_subscriber::fmt()
                .compact()
                .with_env_filter(env_filter)
                .with_ansi(!no_color)
                .with_target(false)
                .try_init(),
            _ => tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_ansi(!no_color)
                .with_target(false)
                .try_init(),
        };
        result.map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

        debug!("Logging initialized with level: {}", log_level);
        Ok(())
    }

    /// Validate the merged configuration: a Redis address, at least one
    /// template, and well-formed descriptors.
    pub fn plan(&self) -> Result<StartupPlan> {
        let redis_addr = self.config.require_redis_addr()?.to_string();

        if self.config.templates.is_empty() {
            anyhow::bail!("no templates given");
        }

        let templates = self
            .config
            .template_specs()
            .map_err(EngineError::Configuration)?;

        Ok(StartupPlan {
            redis_addr,
            templates,
        })
    }

    /// Run the application with parsed arguments
    pub async fn run(&mut self, args: Args) -> Result<()> {
        self.config.merge_args(&args);

        // Usage problems are reported before logging or any connection exists
        self.config.log_level().map_err(with_usage)?;
        let plan = self.plan().map_err(with_usage)?;

        self.init_logging(args.verbose, args.no_color)?;

        info!("Starting redis-template v{}", crate::VERSION);
        debug!("Configuration loaded from: {:?}", args.config);

        let store = RedisStore::open(&plan.redis_addr)
            .and_then(|store| store.check().map(|_| store))
            .map_err(EngineError::StoreConnection)
            .with_context(|| format!("redis at {} is unreachable", plan.redis_addr))?;

        let templates =
            TemplateSet::compile(&plan.templates, Arc::new(store)).map_err(EngineError::Template)?;

        let bus = RedisBus::open(&plan.redis_addr)
            .map_err(|source| EngineError::BusConnection {
                channel: self.config.channel.clone(),
                source,
            })?
            .with_capacity(self.config.notification_capacity);

        let runner = ShellRunner::new().with_shell(self.config.shell.clone());

        let mut controller = Controller::new(templates, Arc::new(bus))
            .with_channel(self.config.channel.clone())
            .with_splay(self.config.splay)
            .with_action_runner(Arc::new(runner));

        controller
            .run()
            .await
            .context("failed to listen to redis")?;

        Ok(())
    }

    /// Create application from command line arguments
    pub fn from_args(args: &Args) -> Result<Self> {
        let config = Config::load(args.config.clone())?;
        Ok(Self::new(config))
    }
}

fn with_usage(err: anyhow::Error) -> anyhow::Error {
    err.context(format!("invalid invocation\n\n{}", Args::usage()))
}
