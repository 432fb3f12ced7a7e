//! Capabilities backed by an external analyzer program.
//!
//! The source text is written to a temporary file carrying the language's
//! suffix, the program is run with that path as its final argument, and
//! stdout is decoded per [`ToolOutputFormat`]. The temporary file is removed
//! on every path out of [`ToolCapability::analyze`].

use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;
use std::time::Duration;

use faultscan_core::config::{ToolConfig, ToolOutputFormat};
use faultscan_core::errors::{AnalyzerError, ProcessError};
use faultscan_core::process::run_with_timeout;
use faultscan_core::Language;

use super::tool_output::parse_output;
use super::{Capability, CapabilityOutput, Detection};

const STDERR_EXCERPT: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Readiness {
    Ready,
    Unavailable(String),
}

#[derive(Debug)]
pub struct ToolCapability {
    language: Language,
    tool: ToolConfig,
    timeout: Duration,
    readiness: OnceLock<Readiness>,
}

impl ToolCapability {
    pub fn new(language: Language, tool: ToolConfig, timeout: Duration) -> Self {
        Self {
            language,
            tool,
            timeout,
            readiness: OnceLock::new(),
        }
    }

    pub fn output_format(&self) -> ToolOutputFormat {
        self.tool.output
    }

    /// Probed on first use and remembered for the rest of the run.
    fn readiness(&self) -> &Readiness {
        self.readiness.get_or_init(|| {
            let readiness = probe(&self.tool);
            match &readiness {
                Readiness::Ready => {
                    tracing::debug!(language = %self.language, program = %self.tool.program, "delegated analyzer ready");
                }
                Readiness::Unavailable(reason) => {
                    tracing::warn!(
                        language = %self.language,
                        program = %self.tool.program,
                        %reason,
                        "delegated analyzer unavailable, files of this language are skipped for this run"
                    );
                }
            }
            readiness
        })
    }

    fn invoke(&self, source: &str) -> Result<Detection, AnalyzerError> {
        let io_error = |e: std::io::Error| AnalyzerError::Io {
            language: self.language,
            message: e.to_string(),
        };

        let mut file = tempfile::Builder::new()
            .prefix("faultscan-")
            .suffix(&format!(".{}", self.language.primary_extension()))
            .tempfile()
            .map_err(io_error)?;
        file.write_all(source.as_bytes()).map_err(io_error)?;
        file.flush().map_err(io_error)?;

        let mut cmd = Command::new(&self.tool.program);
        cmd.args(&self.tool.args).arg(file.path());

        let output = run_with_timeout(&mut cmd, self.timeout).map_err(|e| self.process_failure(e))?;
        if !output.success() {
            return Err(AnalyzerError::ToolFailed {
                language: self.language,
                status: output.status_label(),
                stderr: excerpt(&output.stderr),
            });
        }

        parse_output(self.tool.output, &output.stdout).map_err(|message| AnalyzerError::MalformedOutput {
            language: self.language,
            message,
        })
    }

    fn process_failure(&self, error: ProcessError) -> AnalyzerError {
        if error.is_not_found() {
            return AnalyzerError::ToolUnavailable {
                language: self.language,
                reason: error.to_string(),
            };
        }
        match error {
            ProcessError::TimedOut { .. } => AnalyzerError::ToolTimeout {
                language: self.language,
                timeout_ms: self.timeout.as_millis() as u64,
            },
            other => AnalyzerError::Io {
                language: self.language,
                message: other.to_string(),
            },
        }
    }
}

impl Capability for ToolCapability {
    fn language(&self) -> Language {
        self.language
    }

    fn analyze(&self, source: &str) -> CapabilityOutput {
        if let Readiness::Unavailable(reason) = self.readiness() {
            return CapabilityOutput::no_signal(AnalyzerError::ToolUnavailable {
                language: self.language,
                reason: reason.clone(),
            });
        }
        match self.invoke(source) {
            Ok(detection) => CapabilityOutput::signal(detection),
            Err(diagnostic) => CapabilityOutput::no_signal(diagnostic),
        }
    }

    fn is_ready(&self) -> bool {
        *self.readiness() == Readiness::Ready
    }
}

fn probe(tool: &ToolConfig) -> Readiness {
    if !tool.is_enabled() {
        return Readiness::Unavailable("disabled in configuration".to_string());
    }
    if resolve_program(&tool.program).is_none() {
        return Readiness::Unavailable(format!("`{}` not found", tool.program));
    }
    if let Some(missing) = tool.requires.iter().find(|p| !p.exists()) {
        return Readiness::Unavailable(format!("required file {} is missing", missing.display()));
    }
    Readiness::Ready
}

/// Locate `program` the way a shell would: as a path when it contains a
/// separator, otherwise through `PATH`.
fn resolve_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    let path = env::var_os("PATH")?;
    env::split_paths(&path).find_map(|dir| {
        let full = dir.join(program);
        if full.is_file() {
            return Some(full);
        }
        if cfg!(windows) {
            let exe = full.with_extension("exe");
            if exe.is_file() {
                return Some(exe);
            }
        }
        None
    })
}

fn excerpt(stderr: &str) -> String {
    let trimmed = stderr.trim();
    match trimmed.char_indices().nth(STDERR_EXCERPT) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
