// src/exec/runner.rs

//! Blocking command execution against the host tools (`adb`, `fastboot`,
//! `unzip`, `lava-test-case`).

use std::fmt;
use std::fmt::Debug;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use tracing::{debug, error};

/// A single command line to run, plus the directory to run it from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory of the child process. `None` inherits ours.
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    /// Build an invocation from a tool prefix (e.g. `adb -s SERIAL`) and a
    /// command (e.g. `shell getprop`), split on whitespace.
    pub fn new(prefix: &str, command: &str) -> Self {
        let mut tokens = prefix
            .split_whitespace()
            .chain(command.split_whitespace())
            .map(str::to_string);
        let program = tokens.next().unwrap_or_default();
        Self {
            program,
            args: tokens.collect(),
            cwd: None,
        }
    }

    /// Append one argument verbatim (no splitting), for paths.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Arguments joined by spaces, without the program.
    pub fn args_line(&self) -> String {
        self.args.join(" ")
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in self.args.iter() {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Exit status and captured stdout of a finished command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub code: i32,
    pub lines: Vec<String>,
}

impl CommandOutput {
    pub fn new(code: i32, lines: Vec<String>) -> Self {
        Self { code, lines }
    }

    pub fn success(&self) -> bool {
        self.code == 0
    }

    pub fn joined(&self) -> String {
        self.lines.join("\n")
    }
}

/// Trait abstracting how host commands are executed.
///
/// Production code uses [`SystemRunner`]; tests provide an implementation
/// that simulates the device tools.
pub trait CommandRunner: Send + Sync + Debug {
    /// Run to completion. Never fails: a command that cannot be started
    /// reports exit code 1 with the error text as its only output line.
    fn run(&self, invocation: &Invocation) -> CommandOutput;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> CommandOutput {
        debug!(cmd = %invocation, cwd = ?invocation.cwd, "execute command");
        match run_inner(invocation) {
            Ok(output) => output,
            Err(err) => {
                error!(cmd = %invocation, error = %err, "command execution failed");
                CommandOutput::new(1, vec![format!("{err:#}")])
            }
        }
    }
}

fn run_inner(invocation: &Invocation) -> Result<CommandOutput> {
    let mut cmd = Command::new(&invocation.program);
    cmd.args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = invocation.cwd.as_ref() {
        cmd.current_dir(dir);
    }

    let output = cmd
        .output()
        .with_context(|| format!("spawning '{invocation}'"))?;

    // stderr is not part of the result; keep it visible at debug.
    for line in String::from_utf8_lossy(&output.stderr).lines() {
        debug!(cmd = %invocation.program, "stderr: {}", line);
    }

    Ok(CommandOutput {
        code: output.status.code().unwrap_or(-1),
        lines: split_output(&String::from_utf8_lossy(&output.stdout)),
    })
}

/// Split captured output into lines, dropping a single trailing empty line.
pub fn split_output(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect();
    if lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}
