//! Config sources: defaults, workspace file, explicit file, environment.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use std::path::Path;

/// Workspace config file name
pub const WORKSPACE_CONFIG_FILE: &str = "autogen.toml";

/// Environment prefix; nested keys use `__`, e.g. `CAM_AUTOGEN__REGISTRY__DYCORE`
pub const ENV_PREFIX: &str = "CAM_AUTOGEN";

/// Create a Config builder with defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("registry.dycore", "se")?
        .set_default("registry.fort_indent", 3)?
        .set_default("physics.kind_phys", "REAL64")?
        .set_default("tools.interpreter", "python3")
}

/// Add a TOML file if it exists
pub fn add_file(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
    required: bool,
) -> ConfigBuilder<DefaultState> {
    builder.add_source(File::from(path).format(FileFormat::Toml).required(required))
}

/// Add `<workspace>/autogen.toml` if present
pub fn add_workspace_file(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> ConfigBuilder<DefaultState> {
    add_file(builder, &workspace_root.join(WORKSPACE_CONFIG_FILE), false)
}

/// Add `CAM_AUTOGEN__*` environment overrides
pub fn add_environment(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
}
