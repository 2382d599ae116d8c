//! Configuration System
//!
//! Layered configuration for a CAM autogen run: built-in defaults, the workspace
//! `autogen.toml`, an optional explicit file, then `CAM_AUTOGEN__*` environment
//! overrides.

use crate::cache::BuildCache;
use crate::logging::LoggingConfig;
use crate::pipeline::PHYSICS_SUITES_KEY;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

mod facade;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutogenConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub registry: RegistrySettings,

    #[serde(default)]
    pub physics: PhysicsSettings,

    /// Case values looked up by name (`physics_suites`, `CAM_CPPDEFS`, `COMP_ATM`)
    #[serde(default)]
    pub case: BTreeMap<String, String>,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Filesystem locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root of generated output
    #[serde(default = "default_build_root")]
    pub build_root: PathBuf,

    /// CAM source tree root
    #[serde(default = "default_model_root")]
    pub model_root: PathBuf,

    /// User source overrides, searched before the model tree
    #[serde(default = "default_source_mods_dir")]
    pub source_mods_dir: PathBuf,

    /// Directories searched for generator tools and the registry file.
    /// Empty means `[source_mods_dir, model_root/src/data]`.
    #[serde(default)]
    pub data_search: Vec<PathBuf>,

    /// CCPP framework scripts directory holding the capability generator
    #[serde(default = "default_ccpp_scripts_path")]
    pub ccpp_scripts_path: PathBuf,

    /// Build cache file (default: `<build_root>/autogen_build_cache.bin`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_file: Option<PathBuf>,
}

fn default_build_root() -> PathBuf {
    PathBuf::from("bld")
}

fn default_model_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_source_mods_dir() -> PathBuf {
    PathBuf::from("SourceMods/src.cam")
}

fn default_ccpp_scripts_path() -> PathBuf {
    PathBuf::from("ccpp_framework/scripts")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            build_root: default_build_root(),
            model_root: default_model_root(),
            source_mods_dir: default_source_mods_dir(),
            data_search: Vec::new(),
            ccpp_scripts_path: default_ccpp_scripts_path(),
            cache_file: None,
        }
    }
}

/// Registry stage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySettings {
    #[serde(default = "default_dycore")]
    pub dycore: String,

    /// Fortran indentation passed to the registry and init generators
    #[serde(default = "default_fort_indent")]
    pub fort_indent: usize,

    /// Free-form registry configuration, fingerprinted as a whole
    #[serde(default)]
    pub config: BTreeMap<String, String>,
}

fn default_dycore() -> String {
    "se".to_string()
}

fn default_fort_indent() -> usize {
    3
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            dycore: default_dycore(),
            fort_indent: default_fort_indent(),
            config: BTreeMap::new(),
        }
    }
}

/// Physics-suite stage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsSettings {
    #[serde(default = "default_kind_phys")]
    pub kind_phys: String,

    /// Standard physics source directory, relative to `model_root`
    #[serde(default = "default_physics_source_subdir")]
    pub source_subdir: PathBuf,
}

fn default_kind_phys() -> String {
    "REAL64".to_string()
}

fn default_physics_source_subdir() -> PathBuf {
    PathBuf::from("src/physics/ncar_ccpp")
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            kind_phys: default_kind_phys(),
            source_subdir: default_physics_source_subdir(),
        }
    }
}

/// External tool settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
}

fn default_interpreter() -> String {
    "python3".to_string()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Paths(String),
    Registry(String),
    Physics(String),
    Case(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Paths(msg) => write!(f, "Paths: {}", msg),
            ValidationError::Registry(msg) => write!(f, "Registry: {}", msg),
            ValidationError::Physics(msg) => write!(f, "Physics: {}", msg),
            ValidationError::Case(msg) => write!(f, "Case: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl AutogenConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.paths.build_root.as_os_str().is_empty() {
            errors.push(ValidationError::Paths("build_root cannot be empty".to_string()));
        }
        if self.registry.dycore.trim().is_empty() {
            errors.push(ValidationError::Registry("dycore cannot be empty".to_string()));
        }
        if self.physics.kind_phys.trim().is_empty() {
            errors.push(ValidationError::Physics("kind_phys cannot be empty".to_string()));
        }
        if self.tools.interpreter.trim().is_empty() {
            errors.push(ValidationError::Paths("tools.interpreter cannot be empty".to_string()));
        }
        let has_suites = self
            .case
            .iter()
            .any(|(k, v)| k.eq_ignore_ascii_case(PHYSICS_SUITES_KEY) && !v.trim().is_empty());
        if !has_suites {
            errors.push(ValidationError::Case(format!(
                "'{}' must name at least one suite",
                PHYSICS_SUITES_KEY
            )));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Data search path in lookup order
    pub fn data_search(&self) -> Vec<PathBuf> {
        if self.paths.data_search.is_empty() {
            vec![
                self.paths.source_mods_dir.clone(),
                self.paths.model_root.join("src").join("data"),
            ]
        } else {
            self.paths.data_search.clone()
        }
    }

    /// Build cache location
    pub fn cache_path(&self) -> PathBuf {
        self.paths
            .cache_file
            .clone()
            .unwrap_or_else(|| BuildCache::persistence_path(&self.paths.build_root))
    }

    /// Anchor relative paths at `workspace_root`
    pub fn resolve_paths(&mut self, workspace_root: &Path) {
        let anchor = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = workspace_root.join(&*p);
            }
        };
        let paths = &mut self.paths;
        anchor(&mut paths.build_root);
        anchor(&mut paths.model_root);
        anchor(&mut paths.source_mods_dir);
        anchor(&mut paths.ccpp_scripts_path);
        paths.data_search.iter_mut().for_each(anchor);
        if let Some(cache_file) = paths.cache_file.as_mut() {
            anchor(cache_file);
        }
        anchor(&mut self.logging.file);
    }
}
