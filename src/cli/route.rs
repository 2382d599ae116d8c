//! CLI route: dispatch commands to the pipeline and build cache.

use crate::cache::BuildCache;
use crate::cli::output::{format_cache_json, format_cache_text, format_config, format_report};
use crate::cli::parse::{CacheCommands, Commands, ConfigCommands};
use crate::config::{AutogenConfig, ConfigLoader};
use crate::error::AutogenError;
use crate::generators::Generators;
use crate::pipeline::Orchestrator;
use std::path::PathBuf;
use tracing::info;

/// Loaded configuration for one CLI invocation
pub struct RunContext {
    config: AutogenConfig,
}

impl RunContext {
    /// Load configuration from `config_path`, or from the workspace when absent
    pub fn new(workspace: PathBuf, config_path: Option<PathBuf>) -> Result<Self, AutogenError> {
        let workspace = dunce::canonicalize(&workspace).unwrap_or(workspace);
        let config = match config_path {
            Some(path) => ConfigLoader::load_from_file(&path)?,
            None => ConfigLoader::load(&workspace)?,
        };
        Ok(Self { config })
    }

    pub fn from_config(config: AutogenConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AutogenConfig {
        &self.config
    }

    pub fn execute(&self, command: &Commands) -> Result<String, AutogenError> {
        match command {
            Commands::Generate => self.handle_generate(),
            Commands::Cache { command } => match command {
                CacheCommands::Show { format } => self.handle_cache_show(format),
                CacheCommands::Clear => self.handle_cache_clear(),
            },
            Commands::Config { command } => match command {
                ConfigCommands::Show => format_config(&self.config),
            },
        }
    }

    fn handle_generate(&self) -> Result<String, AutogenError> {
        self.config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            AutogenError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;

        let mut cache = BuildCache::open(self.config.cache_path());
        let generators = Generators::scripts(&self.config.tools.interpreter);
        let orchestrator = Orchestrator::new(self.config.clone(), generators);
        let report = orchestrator.run(&mut cache)?;
        Ok(format_report(&report))
    }

    fn handle_cache_show(&self, format: &str) -> Result<String, AutogenError> {
        let cache = BuildCache::open(self.config.cache_path());
        match format {
            "json" => format_cache_json(cache.records()),
            "text" => Ok(format_cache_text(cache.records())),
            other => Err(AutogenError::ConfigError(format!(
                "Invalid format: {} (must be 'text' or 'json')",
                other
            ))),
        }
    }

    fn handle_cache_clear(&self) -> Result<String, AutogenError> {
        let mut cache = BuildCache::open(self.config.cache_path());
        cache.clear()?;
        info!(cache = %cache.path().display(), "Build cache cleared");
        Ok(format!("Cleared {}", cache.path().display()))
    }
}
