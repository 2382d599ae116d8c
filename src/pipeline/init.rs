use super::{assess, Orchestrator};
use crate::cache::FingerprintStore;
use crate::error::AutogenError;
use crate::generators::{InitRequest, INIT_WRITER_TOOL};
use crate::types::{InitOutput, PhysicsOutput, RegistryOutput, Stage, INIT_DIR};
use tracing::{debug, info};

impl Orchestrator {
    /// Generate the host model initialization routines if the output is new,
    /// either earlier stage regenerated, or the init writer itself changed.
    pub fn generate_init_routines(
        &self,
        store: &mut dyn FingerprintStore,
        registry: &RegistryOutput,
        physics: &PhysicsOutput,
    ) -> Result<InitOutput, AutogenError> {
        let writer = self.locator.require_tool(INIT_WRITER_TOOL)?;
        let init_dir = self.config.paths.build_root.join(INIT_DIR);

        let forced =
            registry.staleness.needs_regeneration() || physics.staleness.needs_regeneration();
        let staleness = assess(Stage::InitWrite, &init_dir, forced, || {
            store.init_write_mismatch(&writer.file)
        })?;

        if staleness.needs_regeneration() {
            let request = InitRequest {
                registered_files: &registry.registered_files,
                output_dir: &init_dir,
                indent: self.config.registry.fort_indent,
                cap_datafile: &physics.cap_manifest,
            };
            debug!(
                registered = registry.registered_files.len(),
                cap_datafile = %physics.cap_manifest.display(),
                "Calling init file writer"
            );

            let message = self
                .generators
                .init_writer
                .write_init_files(&writer.file, &request)?;
            if !message.is_empty() {
                return Err(AutogenError::InitWriterFailed(message));
            }

            store.update_init_gen(&writer.file)?;
            info!(dir = %init_dir.display(), "Init routines generated");
        }

        Ok(InitOutput {
            output_dir: init_dir,
            staleness,
        })
    }
}
