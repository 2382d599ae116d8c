use super::{assess, Orchestrator};
use crate::cache::FingerprintStore;
use crate::error::AutogenError;
use crate::generators::{RegistryRequest, REGISTRY_FILE, REGISTRY_SUCCESS, REGISTRY_TOOL};
use crate::types::{RegistryOutput, Stage, REGISTRY_DIR};
use tracing::{debug, info};

impl Orchestrator {
    /// Generate the CAM data source and metadata from the registry, if the
    /// output is new or the registry inputs changed.
    ///
    /// When the stage is unchanged the registered files are replayed from the
    /// last successful generation.
    pub fn generate_registry(
        &self,
        store: &mut dyn FingerprintStore,
    ) -> Result<RegistryOutput, AutogenError> {
        let generator = self.locator.require_tool(REGISTRY_TOOL)?;
        let registry = self.locator.require_file(REGISTRY_FILE)?;
        let registry_files = vec![registry.file];

        let paths = &self.config.paths;
        let settings = &self.config.registry;
        let genreg_dir = paths.build_root.join(REGISTRY_DIR);

        let staleness = assess(Stage::Registry, &genreg_dir, false, || {
            store.registry_mismatch(
                &generator.file,
                &registry_files,
                &settings.dycore,
                &settings.config,
            )
        })?;

        if !staleness.needs_regeneration() {
            return Ok(RegistryOutput {
                output_dir: genreg_dir,
                staleness,
                registered_files: store.registered_files(),
            });
        }

        let schema_paths = self.locator.search_dirs();
        let mut registered_files = Vec::new();
        for reg_file in &registry_files {
            let request = RegistryRequest {
                registry_file: reg_file,
                dycore: &settings.dycore,
                config: &settings.config,
                output_dir: &genreg_dir,
                indent: settings.fort_indent,
                source_mods_dir: &paths.source_mods_dir,
                model_root: &paths.model_root,
                schema_paths: &schema_paths,
                error_on_no_validate: true,
            };
            debug!(registry = %reg_file.display(), dycore = %settings.dycore, "Calling registry generator");

            let outcome = self.generators.registry.generate(&generator.file, &request)?;
            if outcome.return_code != REGISTRY_SUCCESS {
                return Err(AutogenError::RegistryFailed {
                    file: reg_file.clone(),
                    code: outcome.return_code,
                });
            }
            registered_files.extend(outcome.files);
        }

        store.update_registry(
            &generator.file,
            &registry_files,
            &settings.dycore,
            &settings.config,
            &registered_files,
        )?;
        info!(
            files = registered_files.len(),
            dir = %genreg_dir.display(),
            "Registry generated"
        );

        Ok(RegistryOutput {
            output_dir: genreg_dir,
            staleness,
            registered_files,
        })
    }
}
