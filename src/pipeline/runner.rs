//! External process invocation.

use std::ffi::OsString;
use std::io;
use std::process::{Command, Stdio};

use log::{debug, warn};
use serde::Serialize;

use crate::error::VizError;
use crate::toolchain::ToolCommand;

/// What one external invocation produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StageResult {
    /// Standard output.
    pub stdout: String,
    /// Standard error, or the reason the process could not start.
    pub diagnostics: String,
    /// `None` if the process never ran or was killed by a signal.
    pub exit_code: Option<i32>,
}

impl StageResult {
    fn failed_to_start(err: &VizError) -> Self {
        Self {
            stdout: String::new(),
            diagnostics: err.to_string(),
            exit_code: None,
        }
    }
}

/// Run `tool` with `args` appended and wait for it.
///
/// Never fails: a tool that cannot be started is reported through
/// [`StageResult::diagnostics`].
pub fn run_tool(tool: &ToolCommand, args: &[OsString]) -> StageResult {
    debug!("running: {} {}", tool, render_args(args));

    let output = Command::new(&tool.program)
        .args(&tool.args)
        .args(args)
        .stdin(Stdio::null())
        .output();

    match output {
        Ok(output) => {
            let result = StageResult {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                diagnostics: String::from_utf8_lossy(&output.stderr).into_owned(),
                exit_code: output.status.code(),
            };
            if !output.status.success() {
                debug!("{} exited with {}", tool.program, output.status);
            }
            result
        }
        Err(source) => {
            let program = tool.program.clone();
            let err = if source.kind() == io::ErrorKind::NotFound {
                VizError::CommandNotFound { program, source }
            } else {
                VizError::Spawn { program, source }
            };
            warn!("{}", err);
            StageResult::failed_to_start(&err)
        }
    }
}

fn render_args(args: &[OsString]) -> String {
    args.iter()
        .map(|a| a.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}
