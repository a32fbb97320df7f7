use std::io;
use std::path::Path;
use std::process::Command;

use crate::error::{Error, Result};

/// Exit status and captured output of a finished process
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Standard error, or standard output when stderr is empty
    pub fn diagnostics(&self) -> &str {
        if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        }
    }
}

/// Runs external programs to completion
pub trait ProcessRunner {
    /// Run `argv[0]` with the remaining arguments, optionally inside `cwd`
    fn run(&self, argv: &[String], cwd: Option<&Path>) -> Result<ProcessOutput>;
}

/// Runner backed by `std::process::Command`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, argv: &[String], cwd: Option<&Path>) -> Result<ProcessOutput> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| Error::Processing("empty command line".to_string()))?;

        let mut command = Command::new(program);
        command.args(args);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }
        log::debug!("Running {}", argv.join(" "));

        let output = command.output().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::MissingDependency(format!("{} not found on PATH", program)),
            _ => Error::Io(e),
        })?;

        Ok(ProcessOutput {
            // Killed by a signal
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Turn a non-zero exit into `Error::ExternalTool`
pub fn check_output(tool: &str, output: ProcessOutput) -> Result<ProcessOutput> {
    if output.success() {
        Ok(output)
    } else {
        Err(Error::ExternalTool {
            tool: tool.to_string(),
            code: output.code,
            stderr: output.diagnostics().to_string(),
        })
    }
}
