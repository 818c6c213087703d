//! Canonical job, status and accounting types.

use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU32;

/// Scheduler-assigned job identifier.
///
/// Array tasks are addressed as `<arrayJobId>_<taskIndex>`.
pub type JobId = String;

/// Live job states keyed by job id.
pub type StatusSnapshot = BTreeMap<JobId, CanonicalStatus>;

/// Accounting records keyed by job id.
pub type AccountingReport = BTreeMap<JobId, ResourceUsageRecord>;

/// Compose the id of one task of a job array.
pub fn array_task_id(array_job_id: &str, task_index: u32) -> JobId {
    format!("{}_{}", array_job_id, task_index)
}

/// The small status vocabulary the workflow engine understands.
///
/// Terminal states never appear here: a job that finished is simply
/// absent from a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CanonicalStatus {
    /// Queued, waiting for resources
    Pending,
    /// Running on a node
    Running,
    /// Suspended by the scheduler or an administrator
    Suspended,
    /// Any other state of a job the scheduler still tracks
    OtherActive,
}

impl fmt::Display for CanonicalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Suspended => "SUSPENDED",
            Self::OtherActive => "OTHER_ACTIVE",
        };
        f.write_str(s)
    }
}

/// Why a job stopped, as far as the scheduler can tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CauseOfDeath {
    /// Exceeded its memory limit
    #[serde(rename = "MEMLIMIT")]
    MemLimit,
    /// Exceeded its run time limit
    #[serde(rename = "RUNLIMIT")]
    RunLimit,
    /// Cancelled by its owner or an administrator
    #[serde(rename = "KILLED_BY_USER")]
    KilledByUser,
    #[default]
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl fmt::Display for CauseOfDeath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MemLimit => "MEMLIMIT",
            Self::RunLimit => "RUNLIMIT",
            Self::KilledByUser => "KILLED_BY_USER",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// Resource usage of one finished job, from the accounting subsystem.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceUsageRecord {
    /// Exit status as reported by the scheduler (e.g. "0:0")
    pub exit_status: String,

    /// Derived exit status (highest exit code of all job steps)
    pub derived_exit_status: Option<String>,

    /// Classified termination cause
    pub cause_of_death: CauseOfDeath,

    /// Same classification as `cause_of_death`; the two are not yet
    /// distinguished by any scheduler backend.
    pub exception_status: CauseOfDeath,

    /// Peak resident memory (MB)
    pub mem_megabytes: Option<f64>,

    /// Peak disk read (MB)
    pub disk_read_megabytes: Option<f64>,

    /// Time spent waiting in the queue (seconds)
    pub pending_seconds: Option<u64>,

    /// Total CPU time (seconds)
    pub cpu_seconds: Option<u64>,

    /// Wall-clock run time (seconds)
    pub lifespan_seconds: Option<u64>,

    /// When the job died; accounting exports do not provide it
    pub when_died: Option<DateTime<Utc>>,
}

/// Task range `[1, N]` of a submitted job array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobArraySpec {
    count: NonZeroU32,
}

impl JobArraySpec {
    /// Array of `count` tasks; None for an empty array.
    pub fn new(count: u32) -> Option<Self> {
        NonZeroU32::new(count).map(|count| Self { count })
    }

    /// Number of tasks.
    pub fn count(&self) -> u32 {
        self.count.get()
    }

    /// Task indices, starting at 1.
    pub fn indices(&self) -> impl Iterator<Item = u32> + use<> {
        1..=self.count.get()
    }

    /// Ids of every task once the array has been assigned `array_job_id`.
    pub fn task_ids<'a>(&self, array_job_id: &'a str) -> impl Iterator<Item = JobId> + use<'a> {
        self.indices()
            .map(move |index| array_task_id(array_job_id, index))
    }
}

impl fmt::Display for JobArraySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1-{}", self.count)
    }
}

/// Per resource class job counts, with their total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceClassCounts {
    pub by_class: BTreeMap<String, usize>,
    pub total: usize,
}

impl ResourceClassCounts {
    /// Count one more job of `class`.
    pub fn add(&mut self, class: &str) {
        *self.by_class.entry(class.to_string()).or_default() += 1;
        self.total += 1;
    }

    /// Jobs counted for `class`.
    pub fn get(&self, class: &str) -> usize {
        self.by_class.get(class).copied().unwrap_or(0)
    }
}

/// Everything needed to submit one array of workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    /// Command line each worker runs
    pub worker_cmd: String,
    /// Number of workers (array tasks)
    pub count: u32,
    /// Submission round, folded into the job name
    pub iteration: u64,
    /// Resource class of the workers
    pub rc_name: String,
    /// Extra scheduler arguments of the resource class
    pub rc_args: Vec<String>,
    /// Extra scheduler arguments of this meadow
    pub meadow_args: Vec<String>,
    /// Directory for worker stdout/stderr; output is discarded when None
    pub log_dir: Option<Utf8PathBuf>,
}

/// A job array accepted by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmittedArray {
    pub array_job_id: JobId,
    pub spec: JobArraySpec,
}

impl SubmittedArray {
    /// Ids of the individual workers.
    pub fn task_ids(&self) -> impl Iterator<Item = JobId> + '_ {
        self.spec.task_ids(&self.array_job_id)
    }
}
