//! Terminal and JSON output.

use meadow_core::{AccountingReport, ResourceClassCounts, StatusSnapshot, SubmittedArray};
use meadow_parsers::format_duration;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}

fn or_dash<T>(value: Option<T>, f: impl FnOnce(T) -> String) -> String {
    value.map(f).unwrap_or_else(|| "-".to_string())
}

pub fn statuses(snapshot: &StatusSnapshot, json: bool) -> Result<()> {
    if json {
        return print_json(snapshot);
    }
    for (job_id, status) in snapshot {
        println!("{}\t{}", job_id, status);
    }
    Ok(())
}

pub fn pending_counts(counts: &ResourceClassCounts, json: bool) -> Result<()> {
    if json {
        return print_json(counts);
    }
    for (class, count) in &counts.by_class {
        println!("{}\t{}", class, count);
    }
    println!("total\t{}", counts.total);
    Ok(())
}

pub fn submitted(array: &SubmittedArray, json: bool) -> Result<()> {
    if json {
        return print_json(array);
    }
    println!("{}\t{}", array.array_job_id, array.spec);
    Ok(())
}

pub fn accounting(report: &AccountingReport, json: bool) -> Result<()> {
    if json {
        return print_json(report);
    }
    println!(
        "{:<16} {:<8} {:<15} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "JOB_ID", "EXIT", "CAUSE", "MEM_MB", "READ_MB", "PENDING", "CPU", "LIFESPAN"
    );
    for (job_id, record) in report {
        println!(
            "{:<16} {:<8} {:<15} {:>10} {:>10} {:>10} {:>10} {:>10}",
            job_id,
            record.exit_status,
            record.cause_of_death,
            or_dash(record.mem_megabytes, |m| format!("{:.1}", m)),
            or_dash(record.disk_read_megabytes, |m| format!("{:.1}", m)),
            or_dash(record.pending_seconds, format_duration),
            or_dash(record.cpu_seconds, format_duration),
            or_dash(record.lifespan_seconds, format_duration),
        );
    }
    Ok(())
}
