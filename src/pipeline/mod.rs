//! Stage Orchestrator
//!
//! Runs the three generation stages in their fixed order:
//!
//! 1. registry: `cam_registry/` from the registry definition file
//! 2. physics suites: `ccpp_physics/` sources and `ccpp/` capability code
//! 3. init routines: `phys_init/`
//!
//! Each stage regenerates when its output directory is new, when its recorded
//! fingerprint no longer matches, or when an earlier stage regenerated on this
//! run. Fingerprints are updated only after a stage succeeds, so a failed or
//! interrupted run is retried from that stage next time.

mod init;
mod physics;
mod registry;

use crate::cache::FingerprintStore;
use crate::config::AutogenConfig;
use crate::error::AutogenError;
use crate::generators::Generators;
use crate::schemes::{CcppMetadataFinder, SchemeNameFinder, SuiteReader, XmlSuiteReader};
use crate::search::{SearchPathLocator, ToolLocator};
use crate::types::{PipelineReport, Stage, Staleness};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// Case key listing the physics suites, `;`-separated
pub const PHYSICS_SUITES_KEY: &str = "physics_suites";
/// Case key holding the preprocessor definitions
pub const CPPDEFS_KEY: &str = "CAM_CPPDEFS";
/// Case key naming the host atmosphere component
pub const HOST_NAME_KEY: &str = "COMP_ATM";

/// Named value lookups from the case/build configuration
pub trait BuildContext {
    fn get_value(&self, key: &str) -> Option<String>;

    fn require(&self, key: &str) -> Result<String, AutogenError> {
        self.get_value(key)
            .ok_or_else(|| AutogenError::MissingValue(key.to_string()))
    }
}

impl BuildContext for BTreeMap<String, String> {
    /// Exact key first, then a case-insensitive match
    fn get_value(&self, key: &str) -> Option<String> {
        self.get(key).cloned().or_else(|| {
            self.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v.clone())
        })
    }
}

/// Drives the registry → physics suites → init routines pipeline
pub struct Orchestrator {
    config: AutogenConfig,
    locator: Box<dyn ToolLocator>,
    context: Box<dyn BuildContext>,
    generators: Generators,
    scheme_finder: Box<dyn SchemeNameFinder>,
    suite_reader: Box<dyn SuiteReader>,
}

impl Orchestrator {
    /// Orchestrator searching the configured data search path, reading case values
    /// from `config.case`
    pub fn new(config: AutogenConfig, generators: Generators) -> Self {
        let locator = SearchPathLocator::new(config.data_search());
        let context = config.case.clone();
        Self {
            config,
            locator: Box::new(locator),
            context: Box::new(context),
            generators,
            scheme_finder: Box::new(CcppMetadataFinder),
            suite_reader: Box::new(XmlSuiteReader),
        }
    }

    pub fn with_locator(mut self, locator: Box<dyn ToolLocator>) -> Self {
        self.locator = locator;
        self
    }

    pub fn with_context(mut self, context: Box<dyn BuildContext>) -> Self {
        self.context = context;
        self
    }

    pub fn with_scheme_finder(mut self, finder: Box<dyn SchemeNameFinder>) -> Self {
        self.scheme_finder = finder;
        self
    }

    pub fn with_suite_reader(mut self, reader: Box<dyn SuiteReader>) -> Self {
        self.suite_reader = reader;
        self
    }

    pub fn config(&self) -> &AutogenConfig {
        &self.config
    }

    /// Run all three stages in order
    pub fn run(&self, store: &mut dyn FingerprintStore) -> Result<PipelineReport, AutogenError> {
        let registry = self.generate_registry(store)?;
        let physics = self.generate_physics_suites(store, &registry)?;
        let init = self.generate_init_routines(store, &registry, &physics)?;

        let report = PipelineReport {
            registry,
            physics,
            init,
        };
        info!(
            regenerated = report.regenerated_count(),
            "CAM autogen complete"
        );
        Ok(report)
    }
}

/// Staleness of a stage whose output directory is `dir`.
///
/// Creates the directory when missing. `check` is only consulted when nothing
/// upstream forced regeneration.
fn assess(
    stage: Stage,
    dir: &Path,
    forced: bool,
    check: impl FnOnce() -> bool,
) -> Result<Staleness, AutogenError> {
    let staleness = if !dir.exists() {
        fs::create_dir_all(dir)?;
        Staleness::OutputMissing
    } else if forced {
        Staleness::Forced
    } else if check() {
        Staleness::InputsChanged
    } else {
        Staleness::Unchanged
    };
    info!(stage = %stage, staleness = %staleness, dir = %dir.display(), "Stage assessed");
    Ok(staleness)
}
