//! Shared fixtures for integration tests
//!
//! `CaseFixture` lays out a miniature CAM case in a temp dir: model tree with the
//! generator tools, a kessler suite, an empty SourceMods directory, and the CCPP
//! scripts directory. Generators are in-process fakes that count their calls.

use cam_autogen::cache::BuildCache;
use cam_autogen::config::AutogenConfig;
use cam_autogen::error::AutogenError;
use cam_autogen::generators::{
    CapabilityGenerator, CapgenRequest, Generators, InitRequest, InitWriter, RegistryGenerator,
    RegistryOutcome, RegistryRequest, CAPGEN_TOOL,
};
use cam_autogen::pipeline::Orchestrator;
use cam_autogen::types::{PipelineReport, RegisteredFile};
use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

pub fn scheme_meta(name: &str) -> String {
    format!(
        "[ccpp-table-properties]\n  name = {name}\n  type = scheme\n\n\
         [ccpp-arg-table]\n  name = {name}_run\n  type = scheme\n"
    )
}

pub fn suite_xml(schemes: &[&str]) -> String {
    let body: String = schemes
        .iter()
        .map(|s| format!("    <scheme>{}</scheme>\n", s))
        .collect();
    format!(
        "<?xml version=\"1.0\"?>\n<suite name=\"test\">\n  <group name=\"physics\">\n{}  </group>\n</suite>\n",
        body
    )
}

/// Observable state shared with the fake generators
#[derive(Clone, Default)]
pub struct Calls {
    pub registry: Rc<Cell<usize>>,
    pub capgen: Rc<Cell<usize>>,
    pub init: Rc<Cell<usize>>,
    pub registry_code: Rc<Cell<i32>>,
    pub capgen_fails: Rc<Cell<bool>>,
    pub init_message: Rc<RefCell<String>>,
    pub last_registry_file: Rc<RefCell<Option<PathBuf>>>,
    pub last_host_files: Rc<RefCell<Vec<PathBuf>>>,
    pub last_init_registered: Rc<RefCell<Vec<RegisteredFile>>>,
}

impl Calls {
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.registry.get(), self.capgen.get(), self.init.get())
    }
}

struct FakeRegistry {
    calls: Calls,
    source: PathBuf,
}

impl RegistryGenerator for FakeRegistry {
    fn generate(
        &self,
        _tool: &Path,
        request: &RegistryRequest<'_>,
    ) -> Result<RegistryOutcome, AutogenError> {
        self.calls.registry.set(self.calls.registry.get() + 1);
        *self.calls.last_registry_file.borrow_mut() = Some(request.registry_file.to_path_buf());
        let code = self.calls.registry_code.get();
        if code != 0 {
            return Ok(RegistryOutcome {
                return_code: code,
                files: Vec::new(),
            });
        }
        fs::write(
            request.output_dir.join("physics_types.meta"),
            format!("dycore = {}\n", request.dycore),
        )?;
        Ok(RegistryOutcome {
            return_code: 0,
            files: vec![RegisteredFile {
                name: "physics_types".to_string(),
                file_path: Some(self.source.clone()),
            }],
        })
    }
}

struct FakeCapgen {
    calls: Calls,
}

impl CapabilityGenerator for FakeCapgen {
    fn generate(&self, _scripts_dir: &Path, request: &CapgenRequest<'_>) -> Result<(), AutogenError> {
        self.calls.capgen.set(self.calls.capgen.get() + 1);
        *self.calls.last_host_files.borrow_mut() = request.host_files.to_vec();
        if self.calls.capgen_fails.get() {
            return Err(AutogenError::GeneratorFailed {
                tool: CAPGEN_TOOL.to_string(),
                message: "unknown standard name".to_string(),
            });
        }
        fs::write(request.cap_output_file, "ccpp_kessler_cap.F90\n")?;
        Ok(())
    }
}

struct FakeInitWriter {
    calls: Calls,
}

impl InitWriter for FakeInitWriter {
    fn write_init_files(&self, _tool: &Path, request: &InitRequest<'_>) -> Result<String, AutogenError> {
        self.calls.init.set(self.calls.init.get() + 1);
        *self.calls.last_init_registered.borrow_mut() = request.registered_files.to_vec();
        let message = self.calls.init_message.borrow().clone();
        if message.is_empty() {
            fs::write(request.output_dir.join("phys_vars_init_check.F90"), "")?;
        }
        Ok(message)
    }
}

/// A miniature CAM case on disk
pub struct CaseFixture {
    pub dir: TempDir,
    pub config: AutogenConfig,
    pub calls: Calls,
}

impl CaseFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        let model_root = root.join("cam");
        let data = model_root.join("src").join("data");
        let physics = model_root.join("src").join("physics").join("ncar_ccpp");
        let source_mods = root.join("case").join("SourceMods").join("src.cam");
        let scripts = root.join("ccpp_framework").join("scripts");
        for d in [&data, &physics, &source_mods, &scripts] {
            fs::create_dir_all(d).unwrap();
        }

        fs::write(data.join("generate_registry_data.py"), "# registry generator v1\n").unwrap();
        fs::write(data.join("registry.xml"), "<registry version=\"1.0\"/>\n").unwrap();
        fs::write(data.join("write_init_files.py"), "# init writer v1\n").unwrap();
        fs::write(data.join("physics_types.F90"), "module physics_types\n").unwrap();
        fs::write(scripts.join(CAPGEN_TOOL), "# capgen\n").unwrap();

        for scheme in ["kessler", "calc_exner"] {
            fs::write(physics.join(format!("{}.meta", scheme)), scheme_meta(scheme)).unwrap();
            fs::write(
                physics.join(format!("{}.F90", scheme)),
                format!("module {}\n", scheme),
            )
            .unwrap();
        }
        fs::write(
            physics.join("suite_kessler.xml"),
            suite_xml(&["kessler", "calc_exner"]),
        )
        .unwrap();

        let mut config = AutogenConfig::default();
        config.paths.build_root = root.join("bld");
        config.paths.model_root = model_root;
        config.paths.source_mods_dir = source_mods;
        config.paths.ccpp_scripts_path = scripts;
        config.registry.dycore = "eul".to_string();
        config
            .case
            .insert("physics_suites".to_string(), "kessler".to_string());
        config
            .case
            .insert("CAM_CPPDEFS".to_string(), "-DPLON=128".to_string());
        config.case.insert("COMP_ATM".to_string(), "cam".to_string());

        Self {
            dir,
            config,
            calls: Calls::default(),
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.config.paths.model_root.join("src").join("data")
    }

    pub fn physics_dir(&self) -> PathBuf {
        self.config
            .paths
            .model_root
            .join(&self.config.physics.source_subdir)
    }

    pub fn source_mods(&self) -> PathBuf {
        self.config.paths.source_mods_dir.clone()
    }

    pub fn build_root(&self) -> PathBuf {
        self.config.paths.build_root.clone()
    }

    pub fn cache(&self) -> BuildCache {
        BuildCache::open(self.config.cache_path())
    }

    pub fn orchestrator(&self) -> Orchestrator {
        let generators = Generators {
            registry: Box::new(FakeRegistry {
                calls: self.calls.clone(),
                source: self.data_dir().join("physics_types.F90"),
            }),
            capgen: Box::new(FakeCapgen {
                calls: self.calls.clone(),
            }),
            init_writer: Box::new(FakeInitWriter {
                calls: self.calls.clone(),
            }),
        };
        Orchestrator::new(self.config.clone(), generators)
    }

    /// Run the whole pipeline against the on-disk cache
    pub fn run(&self) -> Result<PipelineReport, AutogenError> {
        let mut cache = self.cache();
        self.orchestrator().run(&mut cache)
    }
}
