//! Build Cache
//!
//! Records the fingerprints of every input a stage consumed at its last successful
//! generation. A stage is stale when its current inputs differ from the record or
//! when no record exists. Records are only written after a stage succeeds.

pub mod hasher;
pub mod persistence;

pub use hasher::FileFingerprint;

use crate::error::StorageError;
use crate::types::{RegisteredFile, Stage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default cache file name under the build root
pub const CACHE_FILE_NAME: &str = "autogen_build_cache.bin";

/// Param holding the digest of the registry record a later stage was built against
pub const UPSTREAM_REGISTRY: &str = "upstream.registry";
/// Param holding the digest of the ccpp record the init stage was built against
pub const UPSTREAM_CCPP: &str = "upstream.ccpp";

/// Snapshot of a stage's inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageInputs {
    pub files: Vec<FileFingerprint>,
    pub params: BTreeMap<String, String>,
}

impl StageInputs {
    pub fn new(files: Vec<FileFingerprint>) -> Self {
        Self {
            files,
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    fn registry(
        generator_file: &Path,
        registry_files: &[PathBuf],
        dycore: &str,
        config: &BTreeMap<String, String>,
    ) -> Self {
        let mut files = vec![FileFingerprint::of(generator_file)];
        files.extend(hasher::fingerprint_files(registry_files));
        let mut inputs = StageInputs::new(files).with_param("dycore", dycore);
        for (key, value) in config {
            inputs.params.insert(format!("config.{}", key), value.clone());
        }
        inputs
    }

    fn ccpp(
        suite_files: &[PathBuf],
        scheme_files: &[PathBuf],
        preproc_defs: &str,
        kind_phys: &str,
        registry_digest: String,
    ) -> Self {
        let mut files = hasher::fingerprint_files(suite_files);
        files.extend(hasher::fingerprint_files(scheme_files));
        StageInputs::new(files)
            .with_param("preproc_defs", preproc_defs)
            .with_param("kind_phys", kind_phys)
            .with_param(UPSTREAM_REGISTRY, registry_digest)
    }

    fn init_write(generator_file: &Path, registry_digest: String, ccpp_digest: String) -> Self {
        StageInputs::new(vec![FileFingerprint::of(generator_file)])
            .with_param(UPSTREAM_REGISTRY, registry_digest)
            .with_param(UPSTREAM_CCPP, ccpp_digest)
    }
}

/// What a stage consumed at its last successful generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintRecord {
    pub files: Vec<FileFingerprint>,
    pub params: BTreeMap<String, String>,
    /// Registry stage only: the registered files the generator reported
    pub registered_files: Vec<RegisteredFile>,
    pub generated_at: DateTime<Utc>,
}

impl FingerprintRecord {
    fn from_inputs(inputs: StageInputs, registered_files: Vec<RegisteredFile>) -> Self {
        Self {
            files: inputs.files,
            params: inputs.params,
            registered_files,
            generated_at: Utc::now(),
        }
    }

    /// Hex digest of the recorded inputs.
    ///
    /// Later stages store their upstream digests, so a downstream record only
    /// matches while the upstream record it was built against is still current.
    /// `generated_at` is not part of the digest.
    pub fn digest(&self) -> String {
        let mut entries = self.params.clone();
        for file in &self.files {
            entries.insert(
                format!("file:{}", file.path.display()),
                file.hash.clone().unwrap_or_default(),
            );
        }
        hex::encode(hasher::compute_params_hash(&entries))
    }

    /// True if `inputs` are exactly what this record captured
    pub fn matches(&self, inputs: &StageInputs) -> bool {
        self.params == inputs.params
            && self.files.len() == inputs.files.len()
            && self
                .files
                .iter()
                .zip(inputs.files.iter())
                .all(|(recorded, current)| recorded.same_as(current))
    }
}

/// Fingerprint store interface.
///
/// Queries never fail: an absent record means "mismatch". Updates replace a
/// stage's record as a whole.
pub trait FingerprintStore {
    fn record(&self, stage: Stage) -> Option<&FingerprintRecord>;

    fn replace(&mut self, stage: Stage, record: FingerprintRecord) -> Result<(), StorageError>;

    fn mismatch(&self, stage: Stage, inputs: &StageInputs) -> bool {
        match self.record(stage) {
            Some(record) => !record.matches(inputs),
            None => {
                debug!(stage = %stage, "No recorded fingerprint");
                true
            }
        }
    }

    /// Digest of a stage's current record; empty when nothing is recorded
    fn upstream_digest(&self, stage: Stage) -> String {
        self.record(stage)
            .map(FingerprintRecord::digest)
            .unwrap_or_default()
    }

    fn registry_mismatch(
        &self,
        generator_file: &Path,
        registry_files: &[PathBuf],
        dycore: &str,
        config: &BTreeMap<String, String>,
    ) -> bool {
        let inputs = StageInputs::registry(generator_file, registry_files, dycore, config);
        self.mismatch(Stage::Registry, &inputs)
    }

    fn update_registry(
        &mut self,
        generator_file: &Path,
        registry_files: &[PathBuf],
        dycore: &str,
        config: &BTreeMap<String, String>,
        registered_files: &[RegisteredFile],
    ) -> Result<(), StorageError> {
        let inputs = StageInputs::registry(generator_file, registry_files, dycore, config);
        self.replace(
            Stage::Registry,
            FingerprintRecord::from_inputs(inputs, registered_files.to_vec()),
        )
    }

    /// Registered files recorded by the last successful registry generation
    fn registered_files(&self) -> Vec<RegisteredFile> {
        self.record(Stage::Registry)
            .map(|r| r.registered_files.clone())
            .unwrap_or_default()
    }

    fn ccpp_mismatch(
        &self,
        suite_files: &[PathBuf],
        scheme_files: &[PathBuf],
        preproc_defs: &str,
        kind_phys: &str,
    ) -> bool {
        let inputs = StageInputs::ccpp(
            suite_files,
            scheme_files,
            preproc_defs,
            kind_phys,
            self.upstream_digest(Stage::Registry),
        );
        self.mismatch(Stage::Ccpp, &inputs)
    }

    fn update_ccpp(
        &mut self,
        suite_files: &[PathBuf],
        scheme_files: &[PathBuf],
        preproc_defs: &str,
        kind_phys: &str,
    ) -> Result<(), StorageError> {
        let inputs = StageInputs::ccpp(
            suite_files,
            scheme_files,
            preproc_defs,
            kind_phys,
            self.upstream_digest(Stage::Registry),
        );
        self.replace(Stage::Ccpp, FingerprintRecord::from_inputs(inputs, Vec::new()))
    }

    fn init_write_mismatch(&self, generator_file: &Path) -> bool {
        let inputs = StageInputs::init_write(
            generator_file,
            self.upstream_digest(Stage::Registry),
            self.upstream_digest(Stage::Ccpp),
        );
        self.mismatch(Stage::InitWrite, &inputs)
    }

    fn update_init_gen(&mut self, generator_file: &Path) -> Result<(), StorageError> {
        let inputs = StageInputs::init_write(
            generator_file,
            self.upstream_digest(Stage::Registry),
            self.upstream_digest(Stage::Ccpp),
        );
        self.replace(
            Stage::InitWrite,
            FingerprintRecord::from_inputs(inputs, Vec::new()),
        )
    }
}

/// File-backed fingerprint store
pub struct BuildCache {
    path: PathBuf,
    records: BTreeMap<Stage, FingerprintRecord>,
}

impl BuildCache {
    /// Open the cache at `path`.
    ///
    /// A missing, unreadable, or corrupt file opens as an empty cache, which makes
    /// every stage stale.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let records = match persistence::load_from_disk(&path) {
            Ok(Some(records)) => records,
            Ok(None) => BTreeMap::new(),
            Err(e) => {
                warn!(cache = %path.display(), error = %e, "Discarding unreadable build cache");
                BTreeMap::new()
            }
        };
        Self { path, records }
    }

    /// Default cache location for a build root
    pub fn persistence_path(build_root: &Path) -> PathBuf {
        build_root.join(CACHE_FILE_NAME)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &BTreeMap<Stage, FingerprintRecord> {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every record and delete the cache file
    pub fn clear(&mut self) -> Result<(), StorageError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        self.records.clear();
        Ok(())
    }
}

impl FingerprintStore for BuildCache {
    fn record(&self, stage: Stage) -> Option<&FingerprintRecord> {
        self.records.get(&stage)
    }

    fn replace(&mut self, stage: Stage, record: FingerprintRecord) -> Result<(), StorageError> {
        let mut next = self.records.clone();
        next.insert(stage, record);
        persistence::save_to_disk(&self.path, &next)?;
        self.records = next;
        debug!(stage = %stage, cache = %self.path.display(), "Build cache updated");
        Ok(())
    }
}
