//! Liveness checks, cancellation and cluster identity.

use crate::config::SlurmConfig;
use meadow_parsers::{CommandError, run_command, run_command_combined};
use tokio::process::Command;

/// squeue answers for jobs that are gone or belong to someone else.
const NOT_ALIVE_MARKERS: [&str; 2] = ["Invalid job id", "Invalid user"];

/// Whether squeue output for a single job shows it alive.
///
/// Only the two markers above mean dead. Any other line, including errors
/// such as "Unable to contact slurm controller", counts as alive.
pub fn is_alive_output(output: &str) -> bool {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .any(|line| !NOT_ALIVE_MARKERS.iter().any(|m| line.contains(m)))
}

/// Whether `job_id` is queued or running and owned by `user`.
pub async fn check_alive(
    config: &SlurmConfig,
    job_id: &str,
    user: &str,
) -> Result<bool, CommandError> {
    let mut cmd = Command::new(&config.squeue);
    cmd.args(["-h", "-j", job_id, "-u", user, "-o", "%i"]);
    let output = run_command_combined(&mut cmd).await?;
    Ok(is_alive_output(&output))
}

/// Ask the scheduler to cancel `job_id`.
///
/// Best effort: a refusal is logged, and callers confirm by re-polling.
pub async fn terminate(config: &SlurmConfig, job_id: &str) -> Result<(), CommandError> {
    let mut cmd = Command::new(&config.scancel);
    cmd.arg(job_id);
    match run_command(&mut cmd).await {
        Ok(_) => {
            tracing::info!("Requested cancellation of job {}", job_id);
            Ok(())
        }
        Err(e @ CommandError::Failed { .. }) => {
            tracing::warn!("scancel did not accept job {}: {}", job_id, e);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Value of `ClusterName` in `scontrol show config` output.
pub fn parse_cluster_name(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let (key, value) = line.split_once('=')?;
        (key.trim() == "ClusterName")
            .then(|| value.trim().to_string())
            .filter(|v| !v.is_empty())
    })
}

/// Name of the cluster the SLURM tools talk to.
pub async fn cluster_name(config: &SlurmConfig) -> Result<Option<String>, CommandError> {
    let mut cmd = Command::new(&config.scontrol);
    cmd.args(["show", "config"]);
    let output = run_command(&mut cmd).await?;
    Ok(parse_cluster_name(&output))
}
