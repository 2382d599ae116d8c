use super::{assess, Orchestrator, CPPDEFS_KEY, HOST_NAME_KEY, PHYSICS_SUITES_KEY};
use crate::cache::FingerprintStore;
use crate::error::AutogenError;
use crate::generators::{CapgenRequest, CAPGEN_TOOL};
use crate::schemes::{find_schemes_in_suite, SchemeIndex, METADATA_EXTENSION};
use crate::search::{find_file, update_file};
use crate::types::{
    PhysicsOutput, RegistryOutput, Stage, CAP_MANIFEST, CCPP_DIR, PHYSICS_DIR,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Suite definition files and the schemes they call, resolved
struct ResolvedSuites {
    suite_files: Vec<PathBuf>,
    scheme_files: Vec<PathBuf>,
    scheme_sources: Vec<PathBuf>,
}

impl Orchestrator {
    /// Generate the source for the configured physics suites, if the output is
    /// new, the suite inputs changed, or the registry regenerated.
    pub fn generate_physics_suites(
        &self,
        store: &mut dyn FingerprintStore,
        registry: &RegistryOutput,
    ) -> Result<PhysicsOutput, AutogenError> {
        let paths = &self.config.paths;
        let scripts_dir = &paths.ccpp_scripts_path;
        if !scripts_dir.join(CAPGEN_TOOL).is_file() {
            return Err(AutogenError::ToolNotFound {
                tool: CAPGEN_TOOL.to_string(),
                searched: vec![scripts_dir.clone()],
            });
        }

        let physics_blddir = paths.build_root.join(PHYSICS_DIR);
        fs::create_dir_all(&physics_blddir)?;

        let source_search = vec![
            paths.source_mods_dir.clone(),
            paths.model_root.join(&self.config.physics.source_subdir),
        ];
        let index = SchemeIndex::build(&source_search, self.scheme_finder.as_ref())?;
        debug!(schemes = index.len(), "Scheme index built");

        let suites = self.context.require(PHYSICS_SUITES_KEY)?;
        let resolved = self.resolve_suites(&suites, &source_search, &index)?;

        // Only copy once every scheme has resolved.
        for source in &resolved.scheme_sources {
            update_file(source, &physics_blddir)?;
        }

        let genccpp_dir = paths.build_root.join(CCPP_DIR);
        let cap_output_file = genccpp_dir.join(CAP_MANIFEST);
        let preproc_defs = self.context.get_value(CPPDEFS_KEY).unwrap_or_default();
        let kind_phys = self.config.physics.kind_phys.as_str();

        let forced = registry.staleness.needs_regeneration();
        let staleness = assess(Stage::Ccpp, &genccpp_dir, forced, || {
            store.ccpp_mismatch(
                &resolved.suite_files,
                &resolved.scheme_files,
                &preproc_defs,
                kind_phys,
            )
        })?;

        if staleness.needs_regeneration() {
            let host_files = host_files(&registry.output_dir, registry)?;
            let host_name = self.context.require(HOST_NAME_KEY)?;

            debug!("Calling capgen:");
            debug!("   host files: {}", join_paths(&host_files));
            debug!("   scheme files: {}", join_paths(&resolved.scheme_files));
            debug!("   suite definition files: {}", join_paths(&resolved.suite_files));
            debug!("   preproc defs: {}", preproc_defs);
            debug!("   output directory: '{}'", genccpp_dir.display());
            debug!("   kind_phys: '{}'", kind_phys);

            let request = CapgenRequest {
                host_files: &host_files,
                scheme_files: &resolved.scheme_files,
                suite_files: &resolved.suite_files,
                cap_output_file: &cap_output_file,
                preproc_defs: &preproc_defs,
                gen_hostcap: true,
                gen_docfiles: false,
                output_dir: &genccpp_dir,
                host_name: &host_name,
                kind_phys,
            };
            self.generators.capgen.generate(scripts_dir, &request)?;

            store.update_ccpp(
                &resolved.suite_files,
                &resolved.scheme_files,
                &preproc_defs,
                kind_phys,
            )?;
            info!(
                suites = resolved.suite_files.len(),
                schemes = resolved.scheme_files.len(),
                "Physics caps generated"
            );
        }

        Ok(PhysicsOutput {
            output_dirs: vec![physics_blddir, genccpp_dir],
            staleness,
            cap_manifest: cap_output_file,
            suite_files: resolved.suite_files,
            scheme_files: resolved.scheme_files,
        })
    }

    fn resolve_suites(
        &self,
        suites: &str,
        source_search: &[PathBuf],
        index: &SchemeIndex,
    ) -> Result<ResolvedSuites, AutogenError> {
        let mut resolved = ResolvedSuites {
            suite_files: Vec::new(),
            scheme_files: Vec::new(),
            scheme_sources: Vec::new(),
        };

        for suite in suites.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let sdf = find_file(&format!("suite_{}.xml", suite), source_search)
                .ok_or_else(|| AutogenError::SuiteNotFound(suite.to_string()))?;

            let tree = self.suite_reader.read_suite(&sdf.file)?;
            resolved.suite_files.push(sdf.file);

            for scheme in find_schemes_in_suite(&tree) {
                let entry = index.resolve(&scheme)?;
                if !resolved.scheme_files.contains(&entry.metadata) {
                    resolved.scheme_files.push(entry.metadata.clone());
                    resolved.scheme_sources.push(entry.source.clone());
                }
            }
        }

        Ok(resolved)
    }
}

/// Host-side files for capgen.
///
/// The registry directory's metadata comes first since the DDTs are defined
/// there, followed by every registered file's Fortran source.
fn host_files(reg_dir: &Path, registry: &RegistryOutput) -> Result<Vec<PathBuf>, AutogenError> {
    let mut metadata: Vec<PathBuf> = fs::read_dir(reg_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .map(|ext| ext == METADATA_EXTENSION)
                    .unwrap_or(false)
        })
        .collect();
    metadata.sort();

    metadata.extend(
        registry
            .registered_files
            .iter()
            .filter_map(|f| f.file_path.clone()),
    );
    Ok(metadata)
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
