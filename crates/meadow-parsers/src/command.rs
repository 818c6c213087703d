//! Command execution utilities for scheduler queries.

use thiserror::Error;
use tokio::process::Command;

/// Error type for command execution.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Failed to execute {command}: {error}")]
    Execution { command: String, error: String },
    #[error("Command {command} failed with exit code {}: {stderr}", render_code(.code))]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn render_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "none (killed by signal)".to_string(), |c| c.to_string())
}

impl CommandError {
    /// The rendered command line that failed.
    pub fn command(&self) -> &str {
        match self {
            Self::Execution { command, .. } | Self::Failed { command, .. } => command,
        }
    }

    /// Raw exit code, if the command ran and exited normally.
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Execution { .. } => None,
            Self::Failed { code, .. } => *code,
        }
    }
}

/// Quote a single word for a POSIX shell, leaving plain words untouched.
pub fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,%@+".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Render a command as a shell-quoted command line.
pub fn describe(cmd: &Command) -> String {
    let std_cmd = cmd.as_std();
    std::iter::once(std_cmd.get_program())
        .chain(std_cmd.get_args())
        .map(|word| shell_quote(&word.to_string_lossy()))
        .collect::<Vec<_>>()
        .join(" ")
}

async fn output(cmd: &mut Command) -> Result<std::process::Output, CommandError> {
    let command = describe(cmd);
    tracing::debug!(%command, "running scheduler command");
    cmd.output()
        .await
        .map_err(|e| CommandError::Execution {
            command,
            error: e.to_string(),
        })
}

/// Execute a command and return stdout as a string.
///
/// A non-zero exit is reported with the rendered command line, its raw
/// exit code and stderr.
pub async fn run_command(cmd: &mut Command) -> Result<String, CommandError> {
    let output = output(cmd).await?;

    if !output.status.success() {
        return Err(CommandError::Failed {
            command: describe(cmd),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Execute a command and return stdout, treating non-zero exit as OK.
///
/// Some commands (like squeue on a host without jobs) return non-zero but
/// are still valid.
pub async fn run_command_allow_failure(cmd: &mut Command) -> Result<String, CommandError> {
    let output = output(cmd).await?;
    if !output.status.success() {
        tracing::debug!(
            command = %describe(cmd),
            code = ?output.status.code(),
            "command exited unsuccessfully"
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Execute a command and return stdout followed by stderr, ignoring the exit code.
pub async fn run_command_combined(cmd: &mut Command) -> Result<String, CommandError> {
    let output = output(cmd).await?;
    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    if !combined.is_empty() && !combined.ends_with('\n') {
        combined.push('\n');
    }
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    Ok(combined)
}
