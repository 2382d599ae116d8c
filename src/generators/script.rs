//! Generators backed by external scripts.
//!
//! Each tool is run as `<interpreter> <tool>` with the request serialized as JSON
//! on stdin. The registry tool replies with a JSON `RegistryOutcome` on stdout;
//! the init writer replies with its error message (empty on success); the
//! capability generator signals failure through its exit status.

use crate::error::AutogenError;
use crate::generators::{
    CapabilityGenerator, CapgenRequest, InitRequest, InitWriter, RegistryGenerator,
    RegistryOutcome, RegistryRequest, CAPGEN_TOOL,
};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tracing::debug;

/// Runs a tool script under an interpreter
#[derive(Debug, Clone)]
struct ScriptRunner {
    interpreter: String,
}

impl ScriptRunner {
    fn run<T: Serialize>(&self, tool: &Path, request: &T) -> Result<Output, AutogenError> {
        let payload = serde_json::to_vec(request).map_err(|e| {
            AutogenError::ConfigError(format!("Failed to encode request for {:?}: {}", tool, e))
        })?;

        let mut child = Command::new(&self.interpreter)
            .arg(tool)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                AutogenError::ConfigError(format!(
                    "Cannot launch {} {}: {}",
                    self.interpreter,
                    tool.display(),
                    e
                ))
            })?;

        // The child may exit without reading its request; reap it either way.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(&payload),
            None => Ok(()),
        };

        let output = child.wait_with_output()?;
        for line in String::from_utf8_lossy(&output.stderr).lines() {
            debug!(tool = %tool.display(), "{}", line);
        }

        if let Err(e) = written {
            return Err(AutogenError::GeneratorFailed {
                tool: tool_label(tool),
                message: format!("request not delivered ({}): {}", e, failure_message(&output)),
            });
        }
        Ok(output)
    }
}

fn tool_label(tool: &Path) -> String {
    tool.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| tool.display().to_string())
}

fn failure_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.is_empty() {
        format!("exited with {}", output.status)
    } else {
        stderr
    }
}

/// Registry generator run as a script
#[derive(Debug, Clone)]
pub struct ScriptRegistryGenerator {
    runner: ScriptRunner,
}

impl ScriptRegistryGenerator {
    pub fn new(interpreter: &str) -> Self {
        Self {
            runner: ScriptRunner {
                interpreter: interpreter.to_string(),
            },
        }
    }
}

impl RegistryGenerator for ScriptRegistryGenerator {
    fn generate(
        &self,
        tool: &Path,
        request: &RegistryRequest<'_>,
    ) -> Result<RegistryOutcome, AutogenError> {
        let output = self.runner.run(tool, request)?;
        match serde_json::from_slice::<RegistryOutcome>(&output.stdout) {
            Ok(outcome) => Ok(outcome),
            Err(_) if !output.status.success() => Ok(RegistryOutcome {
                return_code: output.status.code().unwrap_or(-1),
                files: Vec::new(),
            }),
            Err(e) => Err(AutogenError::GeneratorFailed {
                tool: tool_label(tool),
                message: format!("unreadable reply: {}", e),
            }),
        }
    }
}

/// Capability generator run as a script from the CCPP scripts directory
#[derive(Debug, Clone)]
pub struct ScriptCapabilityGenerator {
    runner: ScriptRunner,
}

impl ScriptCapabilityGenerator {
    pub fn new(interpreter: &str) -> Self {
        Self {
            runner: ScriptRunner {
                interpreter: interpreter.to_string(),
            },
        }
    }
}

impl CapabilityGenerator for ScriptCapabilityGenerator {
    fn generate(&self, scripts_dir: &Path, request: &CapgenRequest<'_>) -> Result<(), AutogenError> {
        let tool = scripts_dir.join(CAPGEN_TOOL);
        let output = self.runner.run(&tool, request)?;
        if output.status.success() {
            Ok(())
        } else {
            Err(AutogenError::GeneratorFailed {
                tool: CAPGEN_TOOL.to_string(),
                message: failure_message(&output),
            })
        }
    }
}

/// Init-file writer run as a script
#[derive(Debug, Clone)]
pub struct ScriptInitWriter {
    runner: ScriptRunner,
}

impl ScriptInitWriter {
    pub fn new(interpreter: &str) -> Self {
        Self {
            runner: ScriptRunner {
                interpreter: interpreter.to_string(),
            },
        }
    }
}

impl InitWriter for ScriptInitWriter {
    fn write_init_files(&self, tool: &Path, request: &InitRequest<'_>) -> Result<String, AutogenError> {
        let output = self.runner.run(tool, request)?;
        let message = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if message.is_empty() && !output.status.success() {
            return Ok(failure_message(&output));
        }
        Ok(message)
    }
}
