//! SLURM backend for the meadow adapter.
//!
//! Submits worker arrays with sbatch, polls them with squeue, cancels them
//! with scancel and reads their resource usage back from sacct.

pub mod cause;
pub mod config;
pub mod control;
pub mod sacct;
pub mod sbatch;
pub mod squeue;
pub mod types;

#[cfg(all(test, unix))]
mod testing;

pub use cause::classify;
pub use config::SlurmConfig;
pub use sacct::{SacctError, parse_accounting_export, parse_accounting_rows};
pub use sbatch::SbatchError;
pub use types::SlurmJobState;

use chrono::{DateTime, Utc};
use meadow_core::{
    AccountingReport, EnvSnapshot, IdentityError, IdentityVars, JobId, JobNamer, Meadow,
    MeadowError, ResourceClassCounts, StatusSnapshot, SubmitRequest, SubmittedArray,
    current_user, resolve_process_id,
};

/// Variables SLURM sets inside a running job.
pub const SLURM_IDENTITY: IdentityVars = IdentityVars {
    job_id: "SLURM_JOB_ID",
    array_job_id: "SLURM_ARRAY_JOB_ID",
    array_task_id: "SLURM_ARRAY_TASK_ID",
};

/// Job id of the SLURM job a worker runs in.
pub fn worker_process_id(env: &EnvSnapshot) -> Result<JobId, IdentityError> {
    resolve_process_id(env, &SLURM_IDENTITY)
}

impl From<SacctError> for MeadowError {
    fn from(e: SacctError) -> Self {
        match e {
            SacctError::Failed(e) => Self::Accounting(e),
            SacctError::ParseError(msg) => Self::MalformedAccounting(msg),
        }
    }
}

impl From<SbatchError> for MeadowError {
    fn from(e: SbatchError) -> Self {
        match e {
            SbatchError::EmptyArray => Self::Configuration(SbatchError::EmptyArray.to_string()),
            SbatchError::Failed(e) => Self::Submission(e),
            SbatchError::Script(e) => Self::Io(e),
            SbatchError::UnexpectedOutput { command, output } => {
                Self::UnexpectedSubmitOutput { command, output }
            }
        }
    }
}

/// The SLURM implementation of [`Meadow`].
#[derive(Debug, Clone)]
pub struct SlurmMeadow {
    config: SlurmConfig,
    namer: JobNamer,
    user: String,
}

impl SlurmMeadow {
    /// Adapter acting on behalf of the user running this process.
    pub fn new(config: SlurmConfig) -> Result<Self, MeadowError> {
        Self::for_user(config, current_user())
    }

    /// Adapter acting on behalf of `user`.
    pub fn for_user(config: SlurmConfig, user: String) -> Result<Self, MeadowError> {
        let namer = JobNamer::new(&config.job_name_prefix).map_err(|e| {
            MeadowError::Configuration(format!(
                "invalid job name prefix {:?}: {}",
                config.job_name_prefix, e
            ))
        })?;
        Ok(Self {
            config,
            namer,
            user,
        })
    }

    pub fn config(&self) -> &SlurmConfig {
        &self.config
    }

    /// The user whose jobs "my jobs" queries cover.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Name of the cluster, from scontrol.
    pub async fn cluster_name(&self) -> Result<Option<String>, MeadowError> {
        Ok(control::cluster_name(&self.config).await?)
    }

    fn users_or_self(&self, users: &[String]) -> Vec<String> {
        if users.is_empty() {
            vec![self.user.clone()]
        } else {
            users.to_vec()
        }
    }
}

impl Meadow for SlurmMeadow {
    fn name(&self) -> &'static str {
        "SLURM"
    }

    async fn is_available(&self) -> bool {
        match self.cluster_name().await {
            Ok(name) => {
                tracing::debug!("SLURM cluster {:?} is reachable", name);
                true
            }
            Err(e) => {
                tracing::debug!("SLURM is not available: {}", e);
                false
            }
        }
    }

    async fn submit(&self, request: &SubmitRequest) -> Result<SubmittedArray, MeadowError> {
        Ok(sbatch::submit_array(&self.config, &self.namer, request).await?)
    }

    async fn poll_statuses(&self, users: &[String]) -> Result<StatusSnapshot, MeadowError> {
        Ok(squeue::poll_all_statuses(&self.config, &self.users_or_self(users)).await)
    }

    async fn count_pending_by_resource_class(&self) -> Result<ResourceClassCounts, MeadowError> {
        Ok(squeue::count_pending_by_resource_class(&self.config, &self.namer, &self.user).await)
    }

    async fn count_running(&self, users: &[String]) -> Result<usize, MeadowError> {
        Ok(squeue::count_running(&self.config, &self.namer, &self.users_or_self(users)).await)
    }

    async fn check_alive(&self, job_id: &str) -> Result<bool, MeadowError> {
        Ok(control::check_alive(&self.config, job_id, &self.user).await?)
    }

    async fn terminate(&self, job_id: &str) -> Result<(), MeadowError> {
        Ok(control::terminate(&self.config, job_id).await?)
    }

    async fn accounting_for_jobs(&self, job_ids: &[JobId]) -> Result<AccountingReport, MeadowError> {
        Ok(sacct::accounting_for_jobs(&self.config, job_ids).await?)
    }

    async fn accounting_for_interval(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        user: Option<&str>,
    ) -> Result<AccountingReport, MeadowError> {
        Ok(sacct::accounting_for_interval(&self.config, from, to, user).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_process_id() {
        let env: EnvSnapshot = [
            ("SLURM_JOB_ID", "5001"),
            ("SLURM_ARRAY_JOB_ID", "5000"),
            ("SLURM_ARRAY_TASK_ID", "2"),
        ]
        .into_iter()
        .collect();
        assert_eq!(worker_process_id(&env).unwrap(), "5000_2");

        let env: EnvSnapshot = [("SLURM_ARRAY_TASK_ID", "2")].into_iter().collect();
        assert!(MeadowError::from(worker_process_id(&env).unwrap_err()).is_fatal());
    }

    #[test]
    fn test_empty_array_is_a_configuration_error() {
        assert!(matches!(
            MeadowError::from(SbatchError::EmptyArray),
            MeadowError::Configuration(_)
        ));
    }

    #[test]
    fn test_users_default_to_self() {
        let meadow = SlurmMeadow::for_user(SlurmConfig::default(), "alice".to_string()).unwrap();
        assert_eq!(meadow.users_or_self(&[]), vec!["alice".to_string()]);
        assert_eq!(
            meadow.users_or_self(&["bob".to_string()]),
            vec!["bob".to_string()]
        );
    }

    #[cfg(unix)]
    mod fake_slurm {
        use super::*;
        use crate::testing::fake_program;
        use meadow_core::CanonicalStatus;

        #[tokio::test]
        async fn test_poll_statuses_across_users() {
            let dir = tempfile::tempdir().unwrap();
            let body = "\
case \"$*\" in
*'-u alice'*) printf '10_1|RUNNING\\n10_2|COMPLETED\\n11|PENDING\\n' ;;
*'-u bob'*) printf '11|RUNNING\\n12|FAILED\\n13|PREEMPTED\\n' ;;
esac";
            let config = SlurmConfig {
                squeue: fake_program(dir.path(), "squeue", body),
                ..SlurmConfig::default()
            };
            let meadow = SlurmMeadow::for_user(config, "alice".to_string()).unwrap();

            let users = vec!["alice".to_string(), "bob".to_string()];
            let snapshot = meadow.poll_statuses(&users).await.unwrap();

            assert_eq!(snapshot.len(), 3);
            assert_eq!(snapshot["10_1"], CanonicalStatus::Running);
            assert_eq!(snapshot["11"], CanonicalStatus::Pending);
            assert_eq!(snapshot["13"], CanonicalStatus::OtherActive);
        }

        #[tokio::test]
        async fn test_missing_squeue_means_no_jobs() {
            let config = SlurmConfig {
                squeue: "nonexistent_squeue_12345".to_string(),
                ..SlurmConfig::default()
            };
            let meadow = SlurmMeadow::for_user(config, "alice".to_string()).unwrap();

            assert!(meadow.poll_statuses(&[]).await.unwrap().is_empty());
            assert_eq!(meadow.count_running(&[]).await.unwrap(), 0);
            assert_eq!(
                meadow.count_pending_by_resource_class().await.unwrap().total,
                0
            );
        }

        #[tokio::test]
        async fn test_count_pending_by_resource_class() {
            let dir = tempfile::tempdir().unwrap();
            let body = "printf 'meadow-default-1\\nmeadow-default-1\\nmeadow-himem-2\\nsomething-else\\n'";
            let config = SlurmConfig {
                squeue: fake_program(dir.path(), "squeue", body),
                ..SlurmConfig::default()
            };
            let meadow = SlurmMeadow::for_user(config, "alice".to_string()).unwrap();

            let counts = meadow.count_pending_by_resource_class().await.unwrap();
            assert_eq!(counts.get("default"), 2);
            assert_eq!(counts.get("himem"), 1);
            assert_eq!(counts.total, 3);
        }

        #[tokio::test]
        async fn test_probe() {
            let dir = tempfile::tempdir().unwrap();
            let config = SlurmConfig {
                scontrol: fake_program(dir.path(), "scontrol", "echo 'ClusterName = codon'"),
                ..SlurmConfig::default()
            };
            let meadow = SlurmMeadow::for_user(config, "alice".to_string()).unwrap();
            assert!(meadow.is_available().await);
            assert_eq!(
                meadow.cluster_name().await.unwrap(),
                Some("codon".to_string())
            );

            let config = SlurmConfig {
                scontrol: "nonexistent_scontrol_12345".to_string(),
                ..SlurmConfig::default()
            };
            let meadow = SlurmMeadow::for_user(config, "alice".to_string()).unwrap();
            assert!(!meadow.is_available().await);
        }
    }
}
