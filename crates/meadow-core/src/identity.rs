//! Worker self-identification and user lookup.

use crate::types::{JobId, array_task_id};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum IdentityError {
    #[error("{0} is not set; not running inside a scheduler job")]
    MissingVariable(&'static str),
    #[error("{name} has a non-numeric value: {value}")]
    InvalidVariable { name: &'static str, value: String },
}

/// A captured copy of environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the environment of the current process.
    pub fn from_process() -> Self {
        std::env::vars().collect()
    }

    /// Value of `name`, treating empty values as unset.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Names of the variables a scheduler sets inside a running job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityVars {
    pub job_id: &'static str,
    pub array_job_id: &'static str,
    pub array_task_id: &'static str,
}

/// Resolve the job id of the worker running in `env`.
///
/// Array tasks resolve to `<arrayJobId>_<taskIndex>`; anything else to the
/// plain job id. A missing job id is a configuration error.
pub fn resolve_process_id(env: &EnvSnapshot, vars: &IdentityVars) -> Result<JobId, IdentityError> {
    let job_id = env
        .get(vars.job_id)
        .ok_or(IdentityError::MissingVariable(vars.job_id))?;

    match (env.get(vars.array_job_id), env.get(vars.array_task_id)) {
        (Some(array_id), Some(task)) => {
            let index = task.parse().map_err(|_| IdentityError::InvalidVariable {
                name: vars.array_task_id,
                value: task.to_string(),
            })?;
            Ok(array_task_id(array_id, index))
        }
        _ => Ok(job_id.to_string()),
    }
}

/// Name of the user running this process.
pub fn current_user() -> String {
    whoami::username()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: IdentityVars = IdentityVars {
        job_id: "JOB",
        array_job_id: "ARRAY_JOB",
        array_task_id: "ARRAY_TASK",
    };

    #[test]
    fn test_plain_job() {
        let env: EnvSnapshot = [("JOB", "12345")].into_iter().collect();
        assert_eq!(resolve_process_id(&env, &VARS).unwrap(), "12345");
    }

    #[test]
    fn test_array_task() {
        let env: EnvSnapshot = [("JOB", "12350"), ("ARRAY_JOB", "12345"), ("ARRAY_TASK", "6")]
            .into_iter()
            .collect();
        assert_eq!(resolve_process_id(&env, &VARS).unwrap(), "12345_6");
    }

    #[test]
    fn test_partial_array_vars_fall_back_to_job_id() {
        let env: EnvSnapshot = [("JOB", "12350"), ("ARRAY_JOB", "12345")]
            .into_iter()
            .collect();
        assert_eq!(resolve_process_id(&env, &VARS).unwrap(), "12350");
    }

    #[test]
    fn test_missing_job_id() {
        let env: EnvSnapshot = [("ARRAY_JOB", "12345"), ("ARRAY_TASK", "6"), ("JOB", "")]
            .into_iter()
            .collect();
        assert_eq!(
            resolve_process_id(&env, &VARS),
            Err(IdentityError::MissingVariable("JOB"))
        );
    }

    #[test]
    fn test_invalid_task_index() {
        let env: EnvSnapshot = [("JOB", "1"), ("ARRAY_JOB", "1"), ("ARRAY_TASK", "x")]
            .into_iter()
            .collect();
        assert!(matches!(
            resolve_process_id(&env, &VARS),
            Err(IdentityError::InvalidVariable { .. })
        ));
    }
}
