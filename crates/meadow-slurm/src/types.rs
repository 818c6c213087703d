//! SLURM job states.

use meadow_core::CanonicalStatus;

/// SLURM job status, as printed by squeue and sacct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlurmJobState {
    Pending,
    Running,
    Suspended,
    Cancelled,
    Completing,
    Completed,
    Configuring,
    Failed,
    Timeout,
    Preempted,
    NodeFail,
    Revoked,
    SpecialExit,
    OutOfMemory,
    Unknown(String),
}

impl SlurmJobState {
    /// Parse a long state name or its squeue short code.
    ///
    /// sacct may qualify states, as in "CANCELLED by 12345"; only the first
    /// word is considered.
    pub fn parse(s: &str) -> Self {
        let base = s.split_whitespace().next().unwrap_or(s);
        match base.to_uppercase().as_str() {
            "PENDING" | "PD" => Self::Pending,
            "RUNNING" | "R" => Self::Running,
            "SUSPENDED" | "S" => Self::Suspended,
            "CANCELLED" | "CA" => Self::Cancelled,
            "COMPLETING" | "CG" => Self::Completing,
            "COMPLETED" | "CD" => Self::Completed,
            "CONFIGURING" | "CF" => Self::Configuring,
            "FAILED" | "F" => Self::Failed,
            "TIMEOUT" | "TO" => Self::Timeout,
            "PREEMPTED" | "PR" => Self::Preempted,
            "NODE_FAIL" | "NF" => Self::NodeFail,
            "REVOKED" | "RV" => Self::Revoked,
            "SPECIAL_EXIT" | "SE" => Self::SpecialExit,
            "OUT_OF_MEMORY" | "OOM" => Self::OutOfMemory,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Whether the job is over and should no longer be reported as live.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Collapse into the canonical vocabulary; None for terminal states.
    pub fn to_canonical(&self) -> Option<CanonicalStatus> {
        if self.is_terminal() {
            return None;
        }
        match self {
            Self::Pending => Some(CanonicalStatus::Pending),
            Self::Running => Some(CanonicalStatus::Running),
            Self::Suspended => Some(CanonicalStatus::Suspended),
            _ => Some(CanonicalStatus::OtherActive),
        }
    }
}
