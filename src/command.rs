use crate::error::{GitFlowError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Captured result of an external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs an external program inside the working copy.
///
/// Calls block until the process exits; there is no timeout.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    program: String,
    workdir: PathBuf,
    envs: Vec<(String, String)>,
}

impl CommandExecutor {
    pub fn new(program: impl Into<String>, workdir: impl AsRef<Path>) -> Self {
        CommandExecutor {
            program: program.into(),
            workdir: workdir.as_ref().to_path_buf(),
            envs: Vec::new(),
        }
    }

    /// Executor for the `git` binary with terminal prompts disabled and untranslated messages
    pub fn git(workdir: impl AsRef<Path>) -> Self {
        CommandExecutor::new("git", workdir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("LC_ALL", "C")
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Run the command and capture its output whatever the exit status
    ///
    /// # Returns
    /// * `Ok(CommandOutput)` once the process has exited
    /// * `Err` if the program could not be started
    pub fn output<S: AsRef<str>>(&self, args: &[S]) -> Result<CommandOutput> {
        let line = self.command_line(args);
        debug!("Running: {}", line);

        let mut cmd = Command::new(&self.program);
        cmd.current_dir(&self.workdir);
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        for arg in args {
            cmd.arg(arg.as_ref());
        }

        let output = cmd.output().map_err(|e| GitFlowError::ExternalFailure {
            command: line.clone(),
            code: None,
            stderr: e.to_string(),
        })?;

        let result = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };
        debug!("{} exited with {:?}", line, result.code);
        Ok(result)
    }

    /// Run the command and return its stdout
    ///
    /// # Returns
    /// * `Ok(String)` - stdout if the process exited with status 0
    /// * `Err(ExternalFailure)` - exit code and stderr otherwise
    pub fn execute<S: AsRef<str>>(&self, args: &[S]) -> Result<String> {
        let output = self.output(args)?;
        if output.success() {
            Ok(output.stdout)
        } else {
            Err(GitFlowError::ExternalFailure {
                command: self.command_line(args),
                code: output.code,
                stderr: if output.stderr.trim().is_empty() {
                    output.stdout
                } else {
                    output.stderr
                },
            })
        }
    }

    fn command_line<S: AsRef<str>>(&self, args: &[S]) -> String {
        let mut line = self.program.clone();
        for arg in args {
            line.push(' ');
            line.push_str(arg.as_ref());
        }
        line
    }
}
