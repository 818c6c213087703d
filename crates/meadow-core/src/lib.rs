//! Scheduler-independent model for driving a batch resource manager.
//!
//! A meadow is one scheduler backend. This crate holds the canonical job
//! states and accounting records every backend reports in, and the
//! [`Meadow`] contract that backends implement.

pub mod identity;
pub mod job_name;
pub mod meadow;
pub mod types;

pub use identity::{EnvSnapshot, IdentityError, IdentityVars, current_user, resolve_process_id};
pub use job_name::JobNamer;
pub use meadow::{Meadow, MeadowError};
pub use types::{
    AccountingReport, CanonicalStatus, CauseOfDeath, JobArraySpec, JobId, ResourceClassCounts,
    ResourceUsageRecord, StatusSnapshot, SubmitRequest, SubmittedArray, array_task_id,
};
