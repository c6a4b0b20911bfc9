//! Subprocess execution with a time budget.

use std::ffi::OsStr;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::ValidateError;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Captured result of a finished tool run.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Exit code, `None` when killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Both streams, stdout first. Compilers disagree on which one carries
    /// diagnostics.
    pub fn combined(&self) -> String {
        let mut all = self.stdout.clone();
        if !all.is_empty() && !all.ends_with('\n') {
            all.push('\n');
        }
        all.push_str(&self.stderr);
        all
    }
}

/// Builder for a tool invocation.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().to_string_lossy().into_owned()));
        self
    }

    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Short tool name for messages.
    pub fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }

    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }

    /// Runs to completion, killing the child once `timeout` elapses.
    pub fn exec_with_timeout(&self, timeout: Duration) -> Result<ToolOutput, ValidateError> {
        let tool = self.tool_name();
        debug!(command = %self.display_command(), "spawning tool");

        let mut child = self
            .build_command()
            .spawn()
            .map_err(|source| ValidateError::Spawn {
                tool: tool.clone(),
                source,
            })?;

        // Drain both pipes while waiting so a chatty tool cannot block on a
        // full buffer.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if started.elapsed() >= timeout => {
                    kill(&mut child, &tool);
                    return Err(ValidateError::Timeout {
                        tool,
                        seconds: timeout.as_secs(),
                    });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(source) => {
                    kill(&mut child, &tool);
                    return Err(ValidateError::Spawn { tool, source });
                }
            }
        };

        let output = ToolOutput {
            code: status.code(),
            stdout: join(stdout),
            stderr: join(stderr),
        };
        debug!(tool = %tool, code = ?output.code, elapsed_ms = started.elapsed().as_millis() as u64, "tool finished");
        Ok(output)
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn join(handle: Option<JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

fn kill(child: &mut Child, tool: &str) {
    if let Err(err) = child.kill() {
        warn!(tool = %tool, "failed to kill: {}", err);
    }
    // Reap so the child does not linger as a zombie.
    let _ = child.wait();
}

/// Locates an executable by name or explicit path.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}
