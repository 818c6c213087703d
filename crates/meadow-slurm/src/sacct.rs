//! Query SLURM job accounting via sacct.

use crate::cause::classify;
use crate::config::SlurmConfig;
use chrono::{DateTime, Local, TimeZone, Utc};
use meadow_core::{AccountingReport, JobId, ResourceUsageRecord};
use meadow_parsers::{
    CommandError, non_empty_string, parse_duration_secs, parse_memory_megabytes, run_command,
    split_delimited,
};
use thiserror::Error;
use tokio::process::Command;

#[derive(Error, Debug)]
pub enum SacctError {
    #[error("{0}")]
    Failed(#[from] CommandError),
    #[error("Failed to parse sacct output: {0}")]
    ParseError(String),
}

/// sacct output columns, in order (--parsable2 uses | delimiter)
const ACCOUNTING_FORMAT: &str = "JobName,JobID,ExitCode,MaxRSS,Reserved,MaxDiskRead,CPUTimeRAW,ElapsedRAW,State,DerivedExitCode";

const ACCOUNTING_FIELDS: usize = 10;

/// Header lines in front of a saved accounting export.
pub const ACCOUNTING_HEADER_LINES: usize = 2;

/// Suffix sacct gives to the batch step of a job.
const BATCH_STEP_SUFFIX: &str = ".batch";

/// Timestamp format accepted by --starttime/--endtime.
const SACCT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn parse_seconds(s: &str) -> Option<u64> {
    s.trim().parse().ok()
}

/// Parse one accounting row into its job id and record.
///
/// Returns Ok(None) for rows of steps other than the batch step.
fn parse_accounting_line(line: &str) -> Result<Option<(JobId, ResourceUsageRecord)>, SacctError> {
    let fields = split_delimited(line, ACCOUNTING_FIELDS).map_err(SacctError::ParseError)?;

    let job_name = fields[0];
    let job_id = fields[1].trim();
    let job_id = job_id.strip_suffix(BATCH_STEP_SUFFIX).unwrap_or(job_id);

    if !job_name.contains("batch") {
        return Ok(None);
    }

    let cause = classify(fields[8]);
    let record = ResourceUsageRecord {
        exit_status: fields[2].trim().to_string(),
        derived_exit_status: non_empty_string(fields[9]),
        cause_of_death: cause,
        exception_status: cause,
        mem_megabytes: parse_memory_megabytes(fields[3]),
        disk_read_megabytes: parse_memory_megabytes(fields[5]),
        pending_seconds: parse_duration_secs(fields[4].trim()),
        cpu_seconds: parse_seconds(fields[6]),
        lifespan_seconds: parse_seconds(fields[7]),
        when_died: None,
    };

    Ok(Some((job_id.to_string(), record)))
}

/// Parse headerless accounting rows into records keyed by job id.
///
/// Only batch step rows contribute; their `.batch` suffix is removed so
/// they land under the parent job id. A short row fails the whole parse.
pub fn parse_accounting_rows<'a>(
    lines: impl IntoIterator<Item = &'a str>,
) -> Result<AccountingReport, SacctError> {
    let mut report = AccountingReport::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        if let Some((job_id, record)) = parse_accounting_line(line)? {
            report.insert(job_id, record);
        }
    }
    Ok(report)
}

/// Parse a saved accounting export, discarding its two header lines.
pub fn parse_accounting_export(export: &str) -> Result<AccountingReport, SacctError> {
    parse_accounting_rows(export.lines().skip(ACCOUNTING_HEADER_LINES))
}

fn accounting_command(config: &SlurmConfig) -> Command {
    let mut cmd = Command::new(&config.sacct);
    cmd.args([
        "--noheader",
        "--parsable2",
        "--format",
        ACCOUNTING_FORMAT,
    ]);
    cmd
}

async fn run_accounting(cmd: &mut Command) -> Result<AccountingReport, SacctError> {
    let stdout = run_command(cmd).await?;
    parse_accounting_rows(stdout.lines())
}

/// Split job ids into comma-joined groups of at most `size` ids.
pub fn batch_job_ids(job_ids: &[JobId], size: usize) -> Vec<String> {
    job_ids
        .chunks(size.max(1))
        .map(|chunk| chunk.join(","))
        .collect()
}

/// Accounting records of specific jobs, queried in batches.
pub async fn accounting_for_jobs(
    config: &SlurmConfig,
    job_ids: &[JobId],
) -> Result<AccountingReport, SacctError> {
    let mut report = AccountingReport::new();
    for batch in batch_job_ids(job_ids, config.accounting_batch_size) {
        let mut cmd = accounting_command(config);
        cmd.args(["-j", &batch]);
        report.extend(run_accounting(&mut cmd).await?);
    }
    Ok(report)
}

/// sacct arguments selecting jobs between `from` and `to` (plus `buffer`).
///
/// sacct reads bare timestamps as the host's local time.
pub fn interval_args(
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    buffer: std::time::Duration,
    user: Option<&str>,
) -> Vec<String> {
    interval_args_in(&Local, from, to, buffer, user)
}

/// [`interval_args`] with timestamps rendered as wall-clock time in `tz`.
pub fn interval_args_in<Tz>(
    tz: &Tz,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    buffer: std::time::Duration,
    user: Option<&str>,
) -> Vec<String>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let buffer = chrono::Duration::from_std(buffer).unwrap_or_else(|_| chrono::Duration::zero());
    let wall_clock = |t: DateTime<Utc>| t.with_timezone(tz).format(SACCT_TIME_FORMAT).to_string();
    let mut args = vec![
        "--starttime".to_string(),
        wall_clock(from),
        "--endtime".to_string(),
        wall_clock(to + buffer),
    ];
    match user {
        Some(user) => args.extend(["--user".to_string(), user.to_string()]),
        None => args.push("--allusers".to_string()),
    }
    args
}

/// Accounting records of jobs active between `from` and `to`.
pub async fn accounting_for_interval(
    config: &SlurmConfig,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    user: Option<&str>,
) -> Result<AccountingReport, SacctError> {
    let mut cmd = accounting_command(config);
    cmd.args(interval_args(from, to, config.interval_buffer, user));
    run_accounting(&mut cmd).await
}
