//! SLURM adapter configuration.

use camino::Utf8PathBuf;
use std::time::Duration;

/// Configuration for the SLURM adapter.
#[derive(Debug, Clone)]
pub struct SlurmConfig {
    /// Program used for live queue queries.
    pub squeue: String,
    /// Program used for accounting exports.
    pub sacct: String,
    /// Program used for submissions.
    pub sbatch: String,
    /// Program used for cancellations.
    pub scancel: String,
    /// Program used for the capability probe.
    pub scontrol: String,
    /// Prefix of the names of jobs this adapter submits.
    pub job_name_prefix: String,
    /// Where to keep a copy of each submission command line, if anywhere.
    pub submit_script_dir: Option<Utf8PathBuf>,
    /// Maximum job ids per sacct invocation.
    pub accounting_batch_size: usize,
    /// Slack added past the end of an accounting interval.
    pub interval_buffer: Duration,
}

impl Default for SlurmConfig {
    fn default() -> Self {
        Self {
            squeue: "squeue".to_string(),
            sacct: "sacct".to_string(),
            sbatch: "sbatch".to_string(),
            scancel: "scancel".to_string(),
            scontrol: "scontrol".to_string(),
            job_name_prefix: "meadow-".to_string(),
            submit_script_dir: None,
            accounting_batch_size: 20,
            interval_buffer: Duration::from_secs(120),
        }
    }
}
