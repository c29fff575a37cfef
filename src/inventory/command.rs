//! Package manager command execution

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

#[cfg(test)]
use mockall::automock;

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::config::CommandsConfig;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command `{command}` exited with status {code:?}")]
    NonZeroExit { command: String, code: Option<i32> },

    #[error("Command `{command}` timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },
}

/// Trait for running a command line and collecting its output
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `command_line` and returns stdout followed by stderr
    ///
    /// # Returns
    /// * `Ok(String)` - Combined output of a zero-exit run
    /// * `Err(CommandError)` - If the process could not run or exited non-zero
    async fn run(&self, command_line: &str) -> Result<String, CommandError>;
}

/// Runs commands through a shell (`<shell> -c <command>`)
pub struct ShellCommandRunner {
    shell: PathBuf,
    extra_path: Vec<PathBuf>,
    timeout: Duration,
}

impl ShellCommandRunner {
    pub fn new(shell: impl Into<PathBuf>, extra_path: Vec<PathBuf>, timeout: Duration) -> Self {
        Self {
            shell: shell.into(),
            extra_path,
            timeout,
        }
    }

    pub fn from_config(config: &CommandsConfig) -> Self {
        Self::new(&config.shell, config.extra_path.clone(), config.timeout())
    }

    /// Prefix `PATH` so the package manager is found even under a minimal
    /// launch environment.
    fn search_path(&self) -> Option<OsString> {
        if self.extra_path.is_empty() {
            return None;
        }
        let inherited = std::env::var_os("PATH").unwrap_or_default();
        let paths = self
            .extra_path
            .iter()
            .cloned()
            .chain(std::env::split_paths(&inherited));
        std::env::join_paths(paths).ok()
    }
}

#[async_trait::async_trait]
impl CommandRunner for ShellCommandRunner {
    async fn run(&self, command_line: &str) -> Result<String, CommandError> {
        let mut command = Command::new(&self.shell);
        command
            .arg("-c")
            .arg(command_line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(path) = self.search_path() {
            command.env("PATH", path);
        }

        debug!("Running `{}` via {:?}", command_line, self.shell);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| CommandError::Timeout {
                command: command_line.to_string(),
                timeout: self.timeout,
            })?
            .map_err(|source| CommandError::Spawn {
                command: command_line.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(CommandError::NonZeroExit {
                command: command_line.to_string(),
                code: output.status.code(),
            });
        }

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(combined)
    }
}
