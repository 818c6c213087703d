//! Meadow - SLURM adapter for distributed workflow engines.

mod detect;
mod report;

use chrono::Utc;
use clap::Parser;
use detect::detect_meadow;
use meadow_cli::{AccountingCommand, Args, Command};
use meadow_core::{EnvSnapshot, Meadow, SubmitRequest};
use meadow_slurm::worker_process_id;
use miette::{IntoDiagnostic, Result, WrapErr, miette};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.log_level());

    // Runs inside a worker job, no scheduler query needed.
    if let Command::Whoami = args.command {
        return whoami();
    }

    let meadow = detect_meadow(args.slurm_config())
        .await
        .into_diagnostic()?
        .ok_or_else(|| miette!("No supported scheduler answers on this host"))?;

    run(&meadow, args.command, args.json).await
}

/// Print the job id of the worker running in this process.
fn whoami() -> Result<ExitCode> {
    let process_id = worker_process_id(&EnvSnapshot::from_process())
        .into_diagnostic()
        .wrap_err("Cannot identify this worker")?;
    println!("{}", process_id);
    Ok(ExitCode::SUCCESS)
}

/// Dispatch one subcommand against `meadow`.
async fn run<M: Meadow>(meadow: &M, command: Command, json: bool) -> Result<ExitCode> {
    match command {
        Command::Probe => {
            println!("{}", meadow.name());
        }
        Command::Status { users } => {
            let snapshot = meadow.poll_statuses(&users).await.into_diagnostic()?;
            report::statuses(&snapshot, json)?;
        }
        Command::CountRunning { users } => {
            println!("{}", meadow.count_running(&users).await.into_diagnostic()?);
        }
        Command::CountPending => {
            let counts = meadow
                .count_pending_by_resource_class()
                .await
                .into_diagnostic()?;
            report::pending_counts(&counts, json)?;
        }
        Command::Alive { job_id } => {
            let alive = meadow.check_alive(&job_id).await.into_diagnostic()?;
            println!("{}", if alive { "alive" } else { "not alive" });
            if !alive {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Kill { job_id } => {
            meadow.terminate(&job_id).await.into_diagnostic()?;
        }
        Command::Submit(submit) => {
            let request = SubmitRequest::from(submit);
            let array = meadow
                .submit(&request)
                .await
                .into_diagnostic()
                .wrap_err("Worker submission failed; not retrying")?;
            report::submitted(&array, json)?;
        }
        Command::Accounting(AccountingCommand::Jobs { job_ids }) => {
            let records = meadow
                .accounting_for_jobs(&job_ids)
                .await
                .into_diagnostic()
                .wrap_err("Could not read job accounting")?;
            report::accounting(&records, json)?;
        }
        Command::Accounting(AccountingCommand::Interval { from, to, user }) => {
            let to = to.unwrap_or_else(Utc::now);
            let records = meadow
                .accounting_for_interval(from, to, user.as_deref())
                .await
                .into_diagnostic()
                .wrap_err("Could not read job accounting")?;
            report::accounting(&records, json)?;
        }
        Command::Whoami => return whoami(),
    }
    Ok(ExitCode::SUCCESS)
}
