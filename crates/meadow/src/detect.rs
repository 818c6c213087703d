//! Backend selection by capability probing.

use meadow_core::{Meadow, MeadowError};
use meadow_slurm::{SlurmConfig, SlurmMeadow};

/// Find a scheduler backend that answers on this host.
///
/// Returns Ok(None) when no backend is available; an invalid configuration
/// is an error.
pub async fn detect_meadow(config: SlurmConfig) -> Result<Option<SlurmMeadow>, MeadowError> {
    let slurm = SlurmMeadow::new(config)?;
    if slurm.is_available().await {
        tracing::debug!("Using {} backend as user {}", slurm.name(), slurm.user());
        return Ok(Some(slurm));
    }
    Ok(None)
}
