//! Submit worker arrays via sbatch.

use crate::config::SlurmConfig;
use camino::{Utf8Path, Utf8PathBuf};
use meadow_core::{JobArraySpec, JobNamer, SubmitRequest, SubmittedArray};
use meadow_parsers::{CommandError, describe, run_command};
use std::io::Write;
use thiserror::Error;
use tokio::process::Command;

#[derive(Error, Debug)]
pub enum SbatchError {
    #[error("Cannot submit an empty job array")]
    EmptyArray,
    #[error("{0}")]
    Failed(#[from] CommandError),
    #[error("Could not write submit script: {0}")]
    Script(#[from] std::io::Error),
    #[error("No job id in output of {command}: {output:?}")]
    UnexpectedOutput { command: String, output: String },
}

/// Where worker output goes when no log directory is configured.
const DISCARD: &str = "/dev/null";

fn output_path(log_dir: &Utf8Path, rc_name: &str, extension: &str) -> Utf8PathBuf {
    // %A: array job id, %a: array task index
    log_dir.join(format!("log_{}_%A_%a.{}", rc_name, extension))
}

/// Build the sbatch argument vector for `request`.
///
/// The worker command is always the final argument.
pub fn build_submit_args(
    request: &SubmitRequest,
    spec: &JobArraySpec,
    namer: &JobNamer,
) -> Vec<String> {
    let (stdout, stderr) = match &request.log_dir {
        Some(dir) => (
            output_path(dir, &request.rc_name, "out").into_string(),
            output_path(dir, &request.rc_name, "err").into_string(),
        ),
        None => (DISCARD.to_string(), DISCARD.to_string()),
    };

    let mut args = vec![
        "--parsable".to_string(),
        format!("--array={}", spec),
        format!(
            "--job-name={}",
            namer.array_name(&request.rc_name, request.iteration)
        ),
        "-o".to_string(),
        stdout,
        "-e".to_string(),
        stderr,
    ];
    args.extend(request.rc_args.iter().cloned());
    args.extend(request.meadow_args.iter().cloned());
    args.push("--wrap".to_string());
    args.push(request.worker_cmd.clone());
    args
}

/// Job id from `sbatch --parsable` output (`<id>` or `<id>;<cluster>`).
pub fn parse_submit_output(stdout: &str) -> Option<String> {
    let line = stdout.lines().map(str::trim).find(|l| !l.is_empty())?;
    let job_id = line.split(';').next()?.trim();
    (!job_id.is_empty()).then(|| job_id.to_string())
}

/// Keep a copy of the submission command line in `dir`.
///
/// The file is uniquely named and never removed, so it survives for
/// post-mortem inspection.
fn write_submit_script(dir: &Utf8Path, command_line: &str) -> std::io::Result<Utf8PathBuf> {
    let mut file = tempfile::Builder::new()
        .prefix("meadow_submit_")
        .suffix(".sh")
        .tempfile_in(dir)?;
    writeln!(file, "#!/bin/sh")?;
    writeln!(file, "{}", command_line)?;
    let (_, path) = file.keep().map_err(|e| e.error)?;
    Utf8PathBuf::from_path_buf(path).map_err(|p| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("non UTF-8 script path: {}", p.display()),
        )
    })
}

/// Submit `request.count` workers as a single job array.
pub async fn submit_array(
    config: &SlurmConfig,
    namer: &JobNamer,
    request: &SubmitRequest,
) -> Result<SubmittedArray, SbatchError> {
    let spec = JobArraySpec::new(request.count).ok_or(SbatchError::EmptyArray)?;

    let mut cmd = Command::new(&config.sbatch);
    cmd.args(build_submit_args(request, &spec, namer));
    let command = describe(&cmd);

    if let Some(dir) = config.submit_script_dir.clone() {
        let command_line = command.clone();
        let path = tokio::task::spawn_blocking(move || write_submit_script(&dir, &command_line))
            .await
            .map_err(std::io::Error::other)??;
        tracing::debug!("Submission command saved to {}", path);
    }

    let stdout = run_command(&mut cmd).await?;
    let array_job_id =
        parse_submit_output(&stdout).ok_or_else(|| SbatchError::UnexpectedOutput {
            command,
            output: stdout.clone(),
        })?;

    tracing::info!(
        "Submitted {} {} workers as job array {}",
        spec.count(),
        request.rc_name,
        array_job_id
    );
    Ok(SubmittedArray { array_job_id, spec })
}
