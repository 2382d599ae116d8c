//! Config loading facade.

use super::sources;
use super::AutogenConfig;
use config::ConfigError;
use std::path::Path;
use tracing::debug;

/// Loads `AutogenConfig` from layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load with the workspace `autogen.toml`.
    ///
    /// Precedence (highest last): defaults, workspace file, environment.
    /// Relative paths are anchored at `workspace_root`.
    pub fn load(workspace_root: &Path) -> Result<AutogenConfig, ConfigError> {
        let builder = sources::builder_with_defaults()?;
        let builder = sources::add_workspace_file(builder, workspace_root);
        let builder = sources::add_environment(builder);

        let mut config: AutogenConfig = builder.build()?.try_deserialize()?;
        config.resolve_paths(workspace_root);
        debug!(workspace = %workspace_root.display(), "Configuration loaded");
        Ok(config)
    }

    /// Load from an explicit file, which must exist.
    ///
    /// Relative paths are anchored at the file's directory.
    pub fn load_from_file(path: &Path) -> Result<AutogenConfig, ConfigError> {
        let builder = sources::builder_with_defaults()?;
        let builder = sources::add_file(builder, path, true);
        let builder = sources::add_environment(builder);

        let mut config: AutogenConfig = builder.build()?.try_deserialize()?;
        let anchor = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        config.resolve_paths(anchor);
        debug!(config = %path.display(), "Configuration loaded");
        Ok(config)
    }
}
