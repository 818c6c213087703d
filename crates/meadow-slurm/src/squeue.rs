//! Query active SLURM jobs via squeue.

use crate::config::SlurmConfig;
use crate::types::SlurmJobState;
use meadow_core::{JobNamer, ResourceClassCounts, StatusSnapshot};
use meadow_parsers::run_command;
use tokio::process::Command;

/// squeue output format for status polling:
/// %i - Job ID (`<arrayJobId>_<index>` for array tasks)
/// %T - State (extended)
const STATUS_FORMAT: &str = "%i|%T";

/// squeue output format for name-based counts:
/// %j - Job name
const NAME_FORMAT: &str = "%j";

/// Run squeue for one user and return its output.
///
/// A missing or failing squeue means no jobs: hosts without a scheduler
/// are a normal situation, not an error.
async fn query_user(config: &SlurmConfig, user: &str, args: &[&str]) -> String {
    let mut cmd = Command::new(&config.squeue);
    // -h: no header, -r: one line per array task
    cmd.args(["-h", "-r", "-u", user]).args(args);

    match run_command(&mut cmd).await {
        Ok(stdout) => stdout,
        Err(e) => {
            tracing::warn!("squeue query for {} failed, assuming no jobs: {}", user, e);
            String::new()
        }
    }
}

/// Parse a single `<jobId>|<state>` line.
fn parse_status_line(line: &str) -> Option<(&str, SlurmJobState)> {
    let (job_id, state) = line.split_once('|')?;
    let job_id = job_id.trim();
    if job_id.is_empty() || state.trim().is_empty() {
        return None;
    }
    Some((job_id, SlurmJobState::parse(state.trim())))
}

/// Add the live jobs of one squeue status listing to `snapshot`.
///
/// Terminal jobs are left out, and ids already present are kept.
pub fn merge_status_output(snapshot: &mut StatusSnapshot, output: &str) {
    for line in output.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let Some((job_id, state)) = parse_status_line(line) else {
            tracing::warn!("Skipping unparseable squeue line: {}", line);
            continue;
        };
        if let Some(status) = state.to_canonical() {
            snapshot.entry(job_id.to_string()).or_insert(status);
        }
    }
}

/// Live statuses of every job belonging to `users`.
pub async fn poll_all_statuses(config: &SlurmConfig, users: &[String]) -> StatusSnapshot {
    let mut snapshot = StatusSnapshot::new();
    for user in users {
        let output = query_user(config, user, &["-o", STATUS_FORMAT]).await;
        merge_status_output(&mut snapshot, &output);
    }
    snapshot
}

/// Count job names in an squeue name listing that carry the adapter prefix.
pub fn count_prefixed(output: &str, namer: &JobNamer) -> usize {
    output
        .lines()
        .map(str::trim)
        .filter(|name| namer.has_prefix(name))
        .count()
}

/// Group the job names of an squeue name listing by resource class.
///
/// Names that do not follow the adapter's naming convention are ignored.
pub fn count_resource_classes(output: &str, namer: &JobNamer) -> ResourceClassCounts {
    let mut counts = ResourceClassCounts::default();
    for name in output.lines().map(str::trim).filter(|n| !n.is_empty()) {
        match namer.resource_class(name) {
            Some(class) => counts.add(class),
            None => tracing::debug!("Ignoring pending job {}", name),
        }
    }
    counts
}

/// Running jobs of `users` submitted by this adapter.
pub async fn count_running(config: &SlurmConfig, namer: &JobNamer, users: &[String]) -> usize {
    let mut total = 0;
    for user in users {
        let output = query_user(config, user, &["-t", "RUNNING", "-o", NAME_FORMAT]).await;
        total += count_prefixed(&output, namer);
    }
    total
}

/// Pending jobs of `user`, grouped by resource class.
pub async fn count_pending_by_resource_class(
    config: &SlurmConfig,
    namer: &JobNamer,
    user: &str,
) -> ResourceClassCounts {
    let output = query_user(config, user, &["-t", "PENDING", "-o", NAME_FORMAT]).await;
    count_resource_classes(&output, namer)
}
