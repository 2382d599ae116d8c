//! External generator interfaces
//!
//! The three code generators are collaborators: the orchestrator only decides
//! whether to call them and with what. Each is injected as a trait object so the
//! pipeline can run against the real tools or against test doubles.

pub mod script;

pub use script::{ScriptCapabilityGenerator, ScriptInitWriter, ScriptRegistryGenerator};

use crate::error::AutogenError;
use crate::types::RegisteredFile;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Registry generator tool, searched for in the data search path
pub const REGISTRY_TOOL: &str = "generate_registry_data.py";
/// Registry definition file, searched for in the data search path
pub const REGISTRY_FILE: &str = "registry.xml";
/// Capability generator tool, inside the CCPP scripts directory
pub const CAPGEN_TOOL: &str = "ccpp_capgen.py";
/// Init-file writer tool, searched for in the data search path
pub const INIT_WRITER_TOOL: &str = "write_init_files.py";

/// Return code the registry generator reports on success
pub const REGISTRY_SUCCESS: i32 = 0;

/// Arguments for one registry generation
#[derive(Debug, Clone, Serialize)]
pub struct RegistryRequest<'a> {
    pub registry_file: &'a Path,
    pub dycore: &'a str,
    pub config: &'a BTreeMap<String, String>,
    pub output_dir: &'a Path,
    pub indent: usize,
    pub source_mods_dir: &'a Path,
    pub model_root: &'a Path,
    pub schema_paths: &'a [PathBuf],
    pub error_on_no_validate: bool,
}

/// What the registry generator reported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryOutcome {
    pub return_code: i32,
    #[serde(default)]
    pub files: Vec<RegisteredFile>,
}

/// Generates data source and metadata from a registry file
pub trait RegistryGenerator {
    fn generate(
        &self,
        tool: &Path,
        request: &RegistryRequest<'_>,
    ) -> Result<RegistryOutcome, AutogenError>;
}

/// Arguments for capability generation
#[derive(Debug, Clone, Serialize)]
pub struct CapgenRequest<'a> {
    pub host_files: &'a [PathBuf],
    pub scheme_files: &'a [PathBuf],
    pub suite_files: &'a [PathBuf],
    pub cap_output_file: &'a Path,
    pub preproc_defs: &'a str,
    pub gen_hostcap: bool,
    pub gen_docfiles: bool,
    pub output_dir: &'a Path,
    pub host_name: &'a str,
    pub kind_phys: &'a str,
}

/// Generates CCPP capability code; failure is reported as an error
pub trait CapabilityGenerator {
    fn generate(&self, scripts_dir: &Path, request: &CapgenRequest<'_>)
        -> Result<(), AutogenError>;
}

/// Arguments for init-routine generation
#[derive(Debug, Clone, Serialize)]
pub struct InitRequest<'a> {
    pub registered_files: &'a [RegisteredFile],
    pub output_dir: &'a Path,
    pub indent: usize,
    pub cap_datafile: &'a Path,
}

/// Writes host-model init routines.
///
/// Returns an empty message on success, otherwise the diagnostic text.
pub trait InitWriter {
    fn write_init_files(&self, tool: &Path, request: &InitRequest<'_>)
        -> Result<String, AutogenError>;
}

/// The injected generator set
pub struct Generators {
    pub registry: Box<dyn RegistryGenerator>,
    pub capgen: Box<dyn CapabilityGenerator>,
    pub init_writer: Box<dyn InitWriter>,
}

impl Generators {
    /// Subprocess-backed generators run with `interpreter`
    pub fn scripts(interpreter: &str) -> Self {
        Self {
            registry: Box::new(ScriptRegistryGenerator::new(interpreter)),
            capgen: Box::new(ScriptCapabilityGenerator::new(interpreter)),
            init_writer: Box::new(ScriptInitWriter::new(interpreter)),
        }
    }
}
