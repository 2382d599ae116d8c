//! Integration tests for scheme and suite lookup across SourceMods and the model tree

use super::test_utils::{scheme_meta, suite_xml, CaseFixture};
use cam_autogen::error::AutogenError;
use cam_autogen::types::{Staleness, PHYSICS_DIR};
use std::fs;

#[test]
fn test_source_mods_scheme_is_copied() {
    let case = CaseFixture::new();
    let mods = case.source_mods();
    fs::write(mods.join("kessler.meta"), scheme_meta("kessler")).unwrap();
    fs::write(mods.join("kessler.F90"), "module kessler ! modified\n").unwrap();

    let report = case.run().unwrap();

    assert!(report.physics.scheme_files.contains(&mods.join("kessler.meta")));
    assert!(report
        .physics
        .scheme_files
        .contains(&case.physics_dir().join("calc_exner.meta")));
    let copied = fs::read_to_string(case.build_root().join(PHYSICS_DIR).join("kessler.F90")).unwrap();
    assert_eq!(copied, "module kessler ! modified\n");
}

#[test]
fn test_source_mods_edit_replaces_copied_source() {
    let case = CaseFixture::new();
    case.run().unwrap();

    let mods = case.source_mods();
    fs::write(mods.join("kessler.meta"), scheme_meta("kessler")).unwrap();
    fs::write(mods.join("kessler.F90"), "module kessler ! v2\n").unwrap();
    let report = case.run().unwrap();

    // The metadata path moved, so the fingerprint no longer matches.
    assert_eq!(report.physics.staleness, Staleness::InputsChanged);
    let copied = fs::read_to_string(case.build_root().join(PHYSICS_DIR).join("kessler.F90")).unwrap();
    assert_eq!(copied, "module kessler ! v2\n");
}

/// A metadata file name in SourceMods hides the model file of the same name,
/// even when it declares different schemes
#[test]
fn test_metadata_basename_shadows_model_file() {
    let case = CaseFixture::new();
    let mods = case.source_mods();
    fs::write(mods.join("kessler.meta"), scheme_meta("kessler_v2")).unwrap();
    fs::write(mods.join("kessler.F90"), "module kessler_v2\n").unwrap();

    let err = case.run().unwrap_err();
    assert!(matches!(err, AutogenError::UnresolvedScheme(ref s) if s == "kessler"));
}

#[test]
fn test_source_mods_suite_shadows_model_suite() {
    let case = CaseFixture::new();
    let mods_suite = case.source_mods().join("suite_kessler.xml");
    fs::write(&mods_suite, suite_xml(&["calc_exner"])).unwrap();

    let report = case.run().unwrap();

    assert_eq!(report.physics.suite_files, vec![mods_suite]);
    assert_eq!(
        report.physics.scheme_files,
        vec![case.physics_dir().join("calc_exner.meta")]
    );
    assert!(!case.build_root().join(PHYSICS_DIR).join("kessler.F90").exists());
}

#[test]
fn test_nested_groups_and_subdirectories() {
    let case = CaseFixture::new();
    let micro = case.physics_dir().join("microphysics");
    fs::create_dir_all(&micro).unwrap();
    fs::write(micro.join("rk_stratiform.meta"), scheme_meta("rk_stratiform")).unwrap();
    fs::write(micro.join("rk_stratiform.f90"), "module rk_stratiform\n").unwrap();
    fs::write(
        case.physics_dir().join("suite_kessler.xml"),
        "<suite name=\"kessler\">\n\
         \x20 <group name=\"physics_before_coupler\">\n\
         \x20   <subcycle loop=\"1\">\n\
         \x20     <scheme>calc_exner</scheme>\n\
         \x20     <scheme> rk_stratiform </scheme>\n\
         \x20   </subcycle>\n\
         \x20   <scheme>kessler</scheme>\n\
         \x20   <scheme>calc_exner</scheme>\n\
         \x20 </group>\n\
         </suite>\n",
    )
    .unwrap();

    let report = case.run().unwrap();

    let physics = case.physics_dir();
    assert_eq!(
        report.physics.scheme_files,
        vec![
            physics.join("calc_exner.meta"),
            micro.join("rk_stratiform.meta"),
            physics.join("kessler.meta"),
        ]
    );
    assert!(case
        .build_root()
        .join(PHYSICS_DIR)
        .join("rk_stratiform.f90")
        .exists());
}

#[test]
fn test_git_directories_are_not_scanned() {
    let case = CaseFixture::new();
    let git = case.physics_dir().join(".git");
    fs::create_dir_all(&git).unwrap();
    fs::write(git.join("a_kessler.meta"), scheme_meta("kessler")).unwrap();
    fs::write(git.join("a_kessler.F90"), "stale\n").unwrap();

    let report = case.run().unwrap();

    assert!(report
        .physics
        .scheme_files
        .contains(&case.physics_dir().join("kessler.meta")));
}

/// Metadata with no Fortran source is only a warning unless a suite needs it
#[test]
fn test_metadata_without_source_is_tolerated() {
    let case = CaseFixture::new();
    fs::write(case.physics_dir().join("orphan.meta"), scheme_meta("orphan")).unwrap();

    assert!(case.run().is_ok());

    fs::write(
        case.physics_dir().join("suite_kessler.xml"),
        suite_xml(&["kessler", "orphan"]),
    )
    .unwrap();
    let err = case.run().unwrap_err();
    assert!(matches!(err, AutogenError::UnresolvedScheme(ref s) if s == "orphan"));
}

#[test]
fn test_malformed_suite_definition() {
    let case = CaseFixture::new();
    fs::write(case.physics_dir().join("suite_kessler.xml"), "<suite><group>").unwrap();

    let err = case.run().unwrap_err();
    assert!(matches!(err, AutogenError::InvalidSuite { .. }));
}
