//! Integration tests for failed and interrupted runs

use super::test_utils::{suite_xml, CaseFixture};
use cam_autogen::cache::{BuildCache, FingerprintRecord, FingerprintStore};
use cam_autogen::error::{AutogenError, StorageError};
use cam_autogen::types::{Stage, Staleness, PHYSICS_DIR};
use std::fs;
use std::io;

/// Store that fails to persist one stage, as if the process died before the update
struct CrashingStore {
    inner: BuildCache,
    fail_on: Stage,
}

impl FingerprintStore for CrashingStore {
    fn record(&self, stage: Stage) -> Option<&FingerprintRecord> {
        self.inner.record(stage)
    }

    fn replace(&mut self, stage: Stage, record: FingerprintRecord) -> Result<(), StorageError> {
        if stage == self.fail_on {
            return Err(StorageError::IoError(io::Error::new(
                io::ErrorKind::Other,
                "killed",
            )));
        }
        self.inner.replace(stage, record)
    }
}

#[test]
fn test_registry_failure_records_nothing() {
    let case = CaseFixture::new();
    case.calls.registry_code.set(2);

    let err = case.run().unwrap_err();
    assert!(matches!(err, AutogenError::RegistryFailed { code: 2, .. }));
    assert!(case.cache().is_empty());
    assert_eq!(case.calls.counts(), (1, 0, 0));

    case.calls.registry_code.set(0);
    let report = case.run().unwrap();
    assert_eq!(report.registry.staleness, Staleness::InputsChanged);
    assert_eq!(report.physics.staleness, Staleness::OutputMissing);
    assert_eq!(case.calls.counts(), (2, 1, 1));
}

#[test]
fn test_capgen_failure_retries_physics() {
    let case = CaseFixture::new();
    case.calls.capgen_fails.set(true);

    let err = case.run().unwrap_err();
    assert!(matches!(err, AutogenError::GeneratorFailed { .. }));
    let cache = case.cache();
    assert!(cache.record(Stage::Registry).is_some());
    assert!(cache.record(Stage::Ccpp).is_none());

    case.calls.capgen_fails.set(false);
    let report = case.run().unwrap();
    assert_eq!(report.registry.staleness, Staleness::Unchanged);
    assert_eq!(report.physics.staleness, Staleness::InputsChanged);
    assert_eq!(report.init.staleness, Staleness::OutputMissing);
    assert_eq!(case.calls.counts(), (1, 2, 1));
}

#[test]
fn test_init_writer_message_is_an_error() {
    let case = CaseFixture::new();
    *case.calls.init_message.borrow_mut() = "phys_vars_init_check: bad standard name".to_string();

    let err = case.run().unwrap_err();
    match err {
        AutogenError::InitWriterFailed(message) => assert!(message.contains("bad standard name")),
        other => panic!("unexpected error: {}", other),
    }
    assert!(case.cache().record(Stage::InitWrite).is_none());

    case.calls.init_message.borrow_mut().clear();
    let report = case.run().unwrap();
    assert_eq!(report.physics.staleness, Staleness::Unchanged);
    assert_eq!(report.init.staleness, Staleness::InputsChanged);
}

/// A forced physics stage that fails is retried even though its own inputs match
#[test]
fn test_forced_capgen_failure_is_retried() {
    let mut case = CaseFixture::new();
    case.run().unwrap();

    case.config.registry.dycore = "fv3".to_string();
    case.calls.capgen_fails.set(true);
    assert!(case.run().is_err());
    assert_eq!(case.calls.counts(), (2, 2, 1));

    case.calls.capgen_fails.set(false);
    let report = case.run().unwrap();
    assert_eq!(report.registry.staleness, Staleness::Unchanged);
    assert_eq!(report.physics.staleness, Staleness::InputsChanged);
    assert_eq!(report.init.staleness, Staleness::Forced);
    assert_eq!(case.calls.counts(), (2, 3, 2));

    let report = case.run().unwrap();
    assert_eq!(report.regenerated_count(), 0);
}

/// A forced init stage that fails is retried on the next run
#[test]
fn test_forced_init_failure_is_retried() {
    let mut case = CaseFixture::new();
    case.run().unwrap();

    case.config.registry.dycore = "fv3".to_string();
    *case.calls.init_message.borrow_mut() = "init writer crashed".to_string();
    assert!(matches!(
        case.run().unwrap_err(),
        AutogenError::InitWriterFailed(_)
    ));
    assert_eq!(case.calls.counts(), (2, 2, 2));

    case.calls.init_message.borrow_mut().clear();
    let report = case.run().unwrap();
    assert_eq!(report.registry.staleness, Staleness::Unchanged);
    assert_eq!(report.physics.staleness, Staleness::Unchanged);
    assert_eq!(report.init.staleness, Staleness::InputsChanged);
    assert_eq!(case.calls.counts(), (2, 2, 3));
}

/// An interrupted update leaves the old record, so the stage reruns next time
#[test]
fn test_interrupted_update_regenerates_next_run() {
    let case = CaseFixture::new();
    let mut store = CrashingStore {
        inner: case.cache(),
        fail_on: Stage::Ccpp,
    };

    let err = case.orchestrator().run(&mut store).unwrap_err();
    assert!(matches!(err, AutogenError::StorageError(_)));
    assert_eq!(case.calls.counts(), (1, 1, 0));

    let report = case.run().unwrap();
    assert_eq!(report.registry.staleness, Staleness::Unchanged);
    assert_eq!(report.physics.staleness, Staleness::InputsChanged);
    assert_eq!(case.calls.counts(), (1, 2, 1));
}

#[test]
fn test_unresolved_scheme_copies_nothing() {
    let case = CaseFixture::new();
    fs::write(
        case.physics_dir().join("suite_kessler.xml"),
        suite_xml(&["kessler", "conv_scheme"]),
    )
    .unwrap();

    let err = case.run().unwrap_err();
    assert!(matches!(err, AutogenError::UnresolvedScheme(ref s) if s == "conv_scheme"));

    let copied = fs::read_dir(case.build_root().join(PHYSICS_DIR)).unwrap().count();
    assert_eq!(copied, 0);
    assert!(case.cache().record(Stage::Ccpp).is_none());
    assert_eq!(case.calls.counts(), (1, 0, 0));
}

#[test]
fn test_missing_suite_definition() {
    let mut case = CaseFixture::new();
    case.config
        .case
        .insert("physics_suites".to_string(), "kessler;held_suarez".to_string());

    let err = case.run().unwrap_err();
    assert!(matches!(err, AutogenError::SuiteNotFound(ref s) if s == "held_suarez"));
    assert!(err.is_configuration());
}

#[test]
fn test_missing_init_writer_tool() {
    let case = CaseFixture::new();
    fs::remove_file(case.data_dir().join("write_init_files.py")).unwrap();

    let err = case.run().unwrap_err();
    match err {
        AutogenError::ToolNotFound { tool, searched } => {
            assert_eq!(tool, "write_init_files.py");
            assert!(searched.contains(&case.data_dir()));
        }
        other => panic!("unexpected error: {}", other),
    }

    // Earlier stages still completed and were recorded.
    let cache = case.cache();
    assert!(cache.record(Stage::Registry).is_some());
    assert!(cache.record(Stage::Ccpp).is_some());
}

#[test]
fn test_missing_host_name_when_regenerating() {
    let mut case = CaseFixture::new();
    case.config.case.remove("COMP_ATM");

    let err = case.run().unwrap_err();
    assert!(matches!(err, AutogenError::MissingValue(ref k) if k == "COMP_ATM"));
}
