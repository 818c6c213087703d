//! The contract every scheduler backend implements.

use crate::identity::IdentityError;
use crate::types::{
    AccountingReport, JobId, ResourceClassCounts, StatusSnapshot, SubmitRequest, SubmittedArray,
};
use chrono::{DateTime, Utc};
use meadow_parsers::CommandError;
use std::future::Future;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MeadowError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Job submission failed: {0}")]
    Submission(#[source] CommandError),
    #[error("Job submission returned no job id: {command} printed {output:?}")]
    UnexpectedSubmitOutput { command: String, output: String },
    #[error("Accounting export failed: {0}")]
    Accounting(#[source] CommandError),
    #[error("Malformed accounting export: {0}")]
    MalformedAccounting(String),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MeadowError {
    /// Whether the orchestrating loop must stop rather than carry on.
    ///
    /// Configuration, submission and accounting failures are fatal; a
    /// scheduler command that merely could not be run is not.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_)
                | Self::Submission(_)
                | Self::UnexpectedSubmitOutput { .. }
                | Self::Accounting(_)
                | Self::MalformedAccounting(_)
        )
    }
}

impl From<IdentityError> for MeadowError {
    fn from(e: IdentityError) -> Self {
        Self::Configuration(e.to_string())
    }
}

/// Uniform operations of a scheduler backend.
///
/// Each call runs one scheduler query (or one per user / per batch, in
/// sequence) and completes when it returns. A status snapshot may lag
/// behind submissions that raced with it; callers re-poll.
pub trait Meadow {
    /// Short backend name, e.g. "SLURM".
    fn name(&self) -> &'static str;

    /// Whether this backend's tools answer on the current host.
    fn is_available(&self) -> impl Future<Output = bool> + Send;

    /// Submit `request.count` workers as one job array.
    fn submit(
        &self,
        request: &SubmitRequest,
    ) -> impl Future<Output = Result<SubmittedArray, MeadowError>> + Send;

    /// Live, non-terminal jobs of `users` (the current user when empty).
    fn poll_statuses(
        &self,
        users: &[String],
    ) -> impl Future<Output = Result<StatusSnapshot, MeadowError>> + Send;

    /// Pending jobs of the current user, grouped by resource class.
    fn count_pending_by_resource_class(
        &self,
    ) -> impl Future<Output = Result<ResourceClassCounts, MeadowError>> + Send;

    /// Running jobs of `users` that this adapter submitted.
    fn count_running(
        &self,
        users: &[String],
    ) -> impl Future<Output = Result<usize, MeadowError>> + Send;

    /// Whether `job_id` is alive and owned by the current user.
    fn check_alive(&self, job_id: &str) -> impl Future<Output = Result<bool, MeadowError>> + Send;

    /// Ask the scheduler to cancel `job_id`. Does not wait for it to die.
    fn terminate(&self, job_id: &str) -> impl Future<Output = Result<(), MeadowError>> + Send;

    /// Accounting records of specific jobs.
    fn accounting_for_jobs(
        &self,
        job_ids: &[JobId],
    ) -> impl Future<Output = Result<AccountingReport, MeadowError>> + Send;

    /// Accounting records of jobs that ran between `from` and `to`.
    fn accounting_for_interval(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        user: Option<&str>,
    ) -> impl Future<Output = Result<AccountingReport, MeadowError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        let failed = || CommandError::Failed {
            command: "sbatch --array=1-2".into(),
            code: Some(1),
            stderr: "invalid partition".into(),
        };
        assert!(MeadowError::Submission(failed()).is_fatal());
        assert!(MeadowError::Accounting(failed()).is_fatal());
        assert!(MeadowError::MalformedAccounting("short row".into()).is_fatal());
        let silent = MeadowError::UnexpectedSubmitOutput {
            command: "sbatch --array=1-2".into(),
            output: String::new(),
        };
        assert!(silent.is_fatal());
        assert!(MeadowError::from(IdentityError::MissingVariable("SLURM_JOB_ID")).is_fatal());

        let err = MeadowError::Command(CommandError::Execution {
            command: "squeue".into(),
            error: "not found".into(),
        });
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_fatal_errors_name_command_and_code() {
        let err = MeadowError::Submission(CommandError::Failed {
            command: "sbatch --array=1-2".into(),
            code: Some(1),
            stderr: "invalid partition".into(),
        });
        let message = err.to_string();
        assert!(message.contains("sbatch --array=1-2"));
        assert!(message.contains("exit code 1"));
    }
}
