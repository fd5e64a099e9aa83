//! GitHub Actions host contract: reading the triggering event and reporting
//! the step's outcome back through workflow outputs.

use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

use crate::error::{DeployError, Result};
use crate::webhook::EventEnvelope;

pub const SUCCESS_OUTPUT: &str = "success";

/// Build the envelope from the event name and the payload file written by the runner.
///
/// Without a path the payload is `{}`, mirroring what the Actions toolkit
/// hands to scripts when `GITHUB_EVENT_PATH` is unset.
pub fn load_envelope(name: &str, event_path: Option<&Path>) -> Result<EventEnvelope> {
    let Some(path) = event_path else {
        warn!("No event payload path supplied, using an empty payload");
        return Ok(EventEnvelope::empty(name));
    };

    let raw = fs::read_to_string(path).map_err(|e| DeployError::IoError {
        path: path.display().to_string(),
        source: e,
    })?;

    let payload: Value = serde_json::from_str(&raw).map_err(|e| DeployError::MalformedEvent {
        event: name.to_string(),
        message: format!("payload in '{}' is not valid JSON: {}", path.display(), e),
    })?;

    if !payload.is_object() {
        return Err(DeployError::MalformedEvent {
            event: name.to_string(),
            message: format!("payload in '{}' is not a JSON object", path.display()),
        });
    }

    Ok(EventEnvelope::new(name, payload))
}

/// Escape a message for use inside a workflow command
fn escape_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Writes step outputs and failure annotations for the runner
#[derive(Debug, Clone, Default)]
pub struct ActionOutputs {
    output_file: Option<PathBuf>,
}

impl ActionOutputs {
    /// `output_file` is the runner's `GITHUB_OUTPUT` file, when there is one.
    pub fn new(output_file: Option<PathBuf>) -> Self {
        Self { output_file }
    }

    pub fn set_output(&self, name: &str, value: &str) -> io::Result<()> {
        match &self.output_file {
            Some(path) => {
                let mut file = OpenOptions::new().create(true).append(true).open(path)?;
                writeln!(file, "{}={}", name, value)
            }
            None => {
                println!("::set-output name={}::{}", name, escape_data(value));
                Ok(())
            }
        }
    }

    pub fn set_failed(&self, message: &str) {
        println!("::error::{}", escape_data(message));
    }

    /// Map the step result onto the `success` output and the process exit code.
    pub fn report(&self, result: &Result<String>) -> ExitCode {
        let (success, code) = match result {
            Ok(res) => {
                info!("Deploy step finished: {}", res);
                ("true", ExitCode::SUCCESS)
            }
            Err(e) => {
                error!("Deploy step failed: {}", e);
                self.set_failed(&e.to_string());
                ("false", ExitCode::FAILURE)
            }
        };

        if let Err(e) = self.set_output(SUCCESS_OUTPUT, success) {
            error!("Failed to write step output: {}", e);
            return ExitCode::FAILURE;
        }
        code
    }
}
