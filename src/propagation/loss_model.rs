//! Boundary to the external basic transmission loss computation.
//!
//! The pipeline never computes propagation physics itself. A `LossModel` is
//! injected by the caller; `CommandLossModel` delegates to an external
//! executable (for example a wrapper around an ITU-R P.1812 implementation)
//! that reads one parameter set as JSON on stdin and answers
//! `{"Lb": <dB>, "Ep": <dBμV/m>}` on stdout.

use log::{debug, trace};
use serde::Serialize;
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::parameters::{LossParameterSet, LossResult};

/// Failure reported by a loss model.
#[derive(Debug)]
pub enum LossModelError {
    /// The external program could not be started or talked to.
    Spawn(String),
    /// The external program exited unsuccessfully.
    Failed { status: String, stderr: String },
    /// The answer could not be parsed.
    InvalidResponse(String),
    /// Model-specific failure.
    Model(String),
}

impl std::fmt::Display for LossModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LossModelError::Spawn(msg) => write!(f, "Failed to run loss model: {}", msg),
            LossModelError::Failed { status, stderr } => write!(f, "Loss model exited with {}: {}", status, stderr.trim()),
            LossModelError::InvalidResponse(msg) => write!(f, "Invalid loss model response: {}", msg),
            LossModelError::Model(msg) => write!(f, "Loss model error: {}", msg),
        }
    }
}

impl std::error::Error for LossModelError {}

/// Computes basic transmission loss and field strength for one profile.
pub trait LossModel {
    fn compute_loss(&self, parameters: &LossParameterSet) -> Result<LossResult, LossModelError>;
}

impl<F> LossModel for F
where
    F: Fn(&LossParameterSet) -> Result<LossResult, LossModelError>,
{
    fn compute_loss(&self, parameters: &LossParameterSet) -> Result<LossResult, LossModelError> {
        self(parameters)
    }
}

/// Request body written to the external program.
#[derive(Serialize)]
struct CommandRequest<'a> {
    #[serde(flatten)]
    parameters: &'a LossParameterSet,
    /// Same values in `bt_loss` argument order for wrappers that forward positionally.
    positional: Vec<serde_json::Value>,
}

/// Loss model backed by an external executable, run once per profile.
#[derive(Debug, Clone)]
pub struct CommandLossModel {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandLossModel {
    /// Resolve `program` to an executable.
    ///
    /// A program containing a path separator is checked directly; a bare name
    /// is searched for on `PATH`. Returns `None` when nothing is found.
    pub fn locate(program: &str) -> Option<Self> {
        let candidate = Path::new(program);
        let resolved = if candidate.components().count() > 1 || candidate.is_absolute() {
            candidate.is_file().then(|| candidate.to_path_buf())
        } else {
            search_path(program)
        }?;
        debug!("Using loss model command {}", resolved.display());
        Some(Self {
            program: resolved,
            args: Vec::new(),
        })
    }

    /// Extra arguments passed to the program on every call.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

fn search_path(program: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths).flat_map(|dir| executable_candidates(&dir, program)).find(|p| p.is_file())
}

fn executable_candidates(dir: &Path, program: &str) -> Vec<PathBuf> {
    let mut candidates = vec![dir.join(program)];
    if cfg!(windows) {
        candidates.push(dir.join(format!("{}.exe", program)));
    }
    candidates
}

impl LossModel for CommandLossModel {
    fn compute_loss(&self, parameters: &LossParameterSet) -> Result<LossResult, LossModelError> {
        let request = CommandRequest {
            parameters,
            positional: parameters.to_positional(),
        };
        let body = serde_json::to_vec(&request).map_err(|e| LossModelError::InvalidResponse(e.to_string()))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| LossModelError::Spawn(format!("{}: {}", self.program.display(), e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&body).map_err(|e| LossModelError::Spawn(e.to_string()))?;
        }

        let output = child.wait_with_output().map_err(|e| LossModelError::Spawn(e.to_string()))?;
        if !output.status.success() {
            return Err(LossModelError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        trace!("Loss model answered: {}", stdout.trim());
        parse_response(&stdout)
    }
}

/// Parse `{"Lb": .., "Ep": ..}` from the last non-empty line of the output.
fn parse_response(stdout: &str) -> Result<LossResult, LossModelError> {
    let line = stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| LossModelError::InvalidResponse("empty output".to_string()))?;
    serde_json::from_str(line).map_err(|e| LossModelError::InvalidResponse(format!("{}: {}", e, line)))
}
