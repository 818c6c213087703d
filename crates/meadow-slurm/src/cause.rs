//! Termination cause classification.

use meadow_core::CauseOfDeath;

/// Map a scheduler termination state to a cause of death.
///
/// Any state mentioning CANCELLED counts as killed by the user, whatever
/// qualifiers surround it ("CANCELLED by 1001", "CANCELLED+").
pub fn classify(state: &str) -> CauseOfDeath {
    let state = state.trim();
    if state.contains("CANCELLED") {
        return CauseOfDeath::KilledByUser;
    }
    match state {
        "TERM_MEMLIMIT" | "OUT_OF_MEMORY" => CauseOfDeath::MemLimit,
        "TERM_RUNLIMIT" | "TIMEOUT" => CauseOfDeath::RunLimit,
        "TERM_FORCE_OWNER" => CauseOfDeath::KilledByUser,
        _ => CauseOfDeath::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify("CANCELLED by 1001"), CauseOfDeath::KilledByUser);
        assert_eq!(classify("CANCELLED+"), CauseOfDeath::KilledByUser);
        assert_eq!(classify("TERM_FORCE_OWNER"), CauseOfDeath::KilledByUser);
        assert_eq!(classify("TERM_MEMLIMIT"), CauseOfDeath::MemLimit);
        assert_eq!(classify("OUT_OF_MEMORY"), CauseOfDeath::MemLimit);
        assert_eq!(classify("TERM_RUNLIMIT"), CauseOfDeath::RunLimit);
        assert_eq!(classify("TIMEOUT"), CauseOfDeath::RunLimit);
        assert_eq!(classify("RUNNING"), CauseOfDeath::Unknown);
        assert_eq!(classify("COMPLETED"), CauseOfDeath::Unknown);
        assert_eq!(classify(""), CauseOfDeath::Unknown);
    }
}
