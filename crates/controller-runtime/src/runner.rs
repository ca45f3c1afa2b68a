//! Subprocess seam between the Docker CLI client and the operating system.

use std::process::{Command, Stdio};

use tracing::debug;

/// Captured result of a finished subprocess.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl CommandOutput {
    pub fn new(code: Option<i32>, stdout: &str, stderr: &str) -> Self {
        Self {
            code,
            stdout: split_lines(stdout),
            stderr: split_lines(stderr),
        }
    }

    /// Successful exit with the given stdout text.
    pub fn ok(stdout: &str) -> Self {
        Self::new(Some(0), stdout, "")
    }

    /// Failed exit with the given stderr text.
    pub fn failed(code: i32, stderr: &str) -> Self {
        Self::new(Some(code), "", stderr)
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Split output on newlines after trimming trailing whitespace.
/// Empty output gives an empty list, never a single empty line.
pub fn split_lines(output: &str) -> Vec<String> {
    let trimmed = output.trim_end();
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('\n').map(str::to_string).collect()
}

/// Runs a program to completion and captures its output.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutput>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutput> {
        (**self).run(program, args)
    }
}

/// Blocking runner backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutput> {
        debug!(%program, ?args, "Running command");
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()?;

        let result = CommandOutput::new(
            output.status.code(),
            &String::from_utf8_lossy(&output.stdout),
            &String::from_utf8_lossy(&output.stderr),
        );
        if !result.stderr.is_empty() {
            debug!(%program, code = ?result.code, stderr = ?result.stderr, "Command wrote to stderr");
        }
        Ok(result)
    }
}
