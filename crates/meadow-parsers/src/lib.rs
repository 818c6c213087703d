//! Shared parsing utilities for scheduler command output.
//!
//! Unit conversion, timestamp handling and command execution helpers used
//! by the scheduler adapters.

pub mod command;
pub mod memory;
pub mod time;

pub use command::{
    CommandError, describe, run_command, run_command_allow_failure, run_command_combined,
    shell_quote,
};
pub use memory::{normalize_memory, parse_memory_megabytes};
pub use time::{
    DateError, format_duration, parse_duration, parse_duration_secs, parse_slurm_timestamp,
    recover_date_time, recover_date_time_from, recovered_date_time,
};

/// Filter helper for optional string fields.
/// Returns None if the string is empty or a placeholder value.
pub fn non_empty_string(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed == "-" || trimmed == "N/A" || trimmed == "Unknown" {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Split a pipe-delimited line and validate field count.
pub fn split_delimited(line: &str, min_fields: usize) -> Result<Vec<&str>, String> {
    let fields: Vec<&str> = line.split('|').collect();
    if fields.len() < min_fields {
        return Err(format!(
            "Expected {} fields, got {}: {}",
            min_fields,
            fields.len(),
            line
        ));
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_string() {
        assert_eq!(non_empty_string("hello"), Some("hello".to_string()));
        assert_eq!(non_empty_string("  hello  "), Some("hello".to_string()));
        assert_eq!(non_empty_string(""), None);
        assert_eq!(non_empty_string("-"), None);
        assert_eq!(non_empty_string("N/A"), None);
        assert_eq!(non_empty_string("Unknown"), None);
    }

    #[test]
    fn test_split_delimited() {
        let line = "a|b|c|d";
        assert_eq!(split_delimited(line, 4).unwrap(), vec!["a", "b", "c", "d"]);
        assert!(split_delimited(line, 5).is_err());
        // Empty trailing columns still count as fields
        assert_eq!(split_delimited("a||", 3).unwrap(), vec!["a", "", ""]);
    }
}
