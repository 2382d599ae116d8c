//! Shared types for the generation stages.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// BLAKE3 digest
pub type Hash = [u8; 32];

/// Build output directory for registry-generated source and metadata
pub const REGISTRY_DIR: &str = "cam_registry";
/// Build directory physics scheme sources are copied into
pub const PHYSICS_DIR: &str = "ccpp_physics";
/// Build output directory for CCPP capability code
pub const CCPP_DIR: &str = "ccpp";
/// Capability manifest written by the capability generator
pub const CAP_MANIFEST: &str = "capfiles.txt";
/// Build output directory for init routines
pub const INIT_DIR: &str = "phys_init";

/// The three generation stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    Registry,
    Ccpp,
    InitWrite,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Registry, Stage::Ccpp, Stage::InitWrite];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Registry => "registry",
            Stage::Ccpp => "ccpp",
            Stage::InitWrite => "init_write",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a stage did or did not regenerate on this run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Staleness {
    /// Output exists and the recorded fingerprint matches
    Unchanged,
    /// An upstream stage regenerated
    Forced,
    /// Inputs differ from the recorded fingerprint (or nothing was recorded)
    InputsChanged,
    /// The stage's output directory did not exist yet
    OutputMissing,
}

impl Staleness {
    pub fn needs_regeneration(&self) -> bool {
        !matches!(self, Staleness::Unchanged)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Staleness::Unchanged => "unchanged",
            Staleness::Forced => "forced",
            Staleness::InputsChanged => "inputs-changed",
            Staleness::OutputMissing => "output-missing",
        }
    }
}

impl fmt::Display for Staleness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file produced by the registry generator.
///
/// `file_path` is the associated Fortran source, when the registry entry has one;
/// the capability generator consumes it as a host file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredFile {
    pub name: String,
    #[serde(default)]
    pub file_path: Option<PathBuf>,
}

/// Result of the registry stage
#[derive(Debug, Clone)]
pub struct RegistryOutput {
    pub output_dir: PathBuf,
    pub staleness: Staleness,
    pub registered_files: Vec<RegisteredFile>,
}

/// Result of the physics-suite stage
#[derive(Debug, Clone)]
pub struct PhysicsOutput {
    /// `[ccpp_physics, ccpp]`
    pub output_dirs: Vec<PathBuf>,
    pub staleness: Staleness,
    pub cap_manifest: PathBuf,
    pub suite_files: Vec<PathBuf>,
    pub scheme_files: Vec<PathBuf>,
}

/// Result of the init-routine stage
#[derive(Debug, Clone)]
pub struct InitOutput {
    pub output_dir: PathBuf,
    pub staleness: Staleness,
}

/// Outcome of one orchestrator run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub registry: RegistryOutput,
    pub physics: PhysicsOutput,
    pub init: InitOutput,
}

impl PipelineReport {
    pub fn staleness(&self, stage: Stage) -> Staleness {
        match stage {
            Stage::Registry => self.registry.staleness,
            Stage::Ccpp => self.physics.staleness,
            Stage::InitWrite => self.init.staleness,
        }
    }

    /// Number of stages that regenerated on this run
    pub fn regenerated_count(&self) -> usize {
        Stage::ALL
            .iter()
            .filter(|s| self.staleness(**s).needs_regeneration())
            .count()
    }
}
