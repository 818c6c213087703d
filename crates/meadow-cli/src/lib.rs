//! CLI argument parsing for meadow.

use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use clap::{Args as ClapArgs, Parser, Subcommand};
use meadow_core::SubmitRequest;
use meadow_parsers::parse_slurm_timestamp;
use meadow_slurm::SlurmConfig;

#[derive(Parser, Debug)]
#[command(name = "meadow")]
#[command(about = "Drive SLURM worker arrays for a workflow engine")]
pub struct Args {
    /// Prefix of the names of jobs submitted by this adapter
    #[arg(long, env = "MEADOW_JOB_NAME_PREFIX", default_value = "meadow-")]
    pub job_name_prefix: String,

    /// Keep a copy of every submission command line in this directory
    #[arg(long, env = "MEADOW_SUBMIT_SCRIPT_DIR")]
    pub submit_script_dir: Option<Utf8PathBuf>,

    /// Maximum job ids per accounting query
    #[arg(long, default_value = "20")]
    pub accounting_batch_size: usize,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Log scheduler commands (-v) and more (-vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    /// Adapter configuration selected by these arguments.
    pub fn slurm_config(&self) -> SlurmConfig {
        SlurmConfig {
            job_name_prefix: self.job_name_prefix.clone(),
            submit_script_dir: self.submit_script_dir.clone(),
            accounting_batch_size: self.accounting_batch_size,
            ..SlurmConfig::default()
        }
    }

    /// Log filter directive for the chosen verbosity.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that the scheduler answers on this host
    Probe,
    /// Show live jobs and their canonical status
    Status {
        /// Users whose jobs to show (defaults to the current user)
        #[arg(short, long = "user")]
        users: Vec<String>,
    },
    /// Count running jobs submitted by this adapter
    CountRunning {
        /// Users whose jobs to count (defaults to the current user)
        #[arg(short, long = "user")]
        users: Vec<String>,
    },
    /// Count my pending jobs by resource class
    CountPending,
    /// Exit 0 if the job is alive and mine, 1 otherwise
    Alive { job_id: String },
    /// Request cancellation of a job
    Kill { job_id: String },
    /// Submit an array of workers
    Submit(SubmitArgs),
    /// Show resource usage of finished jobs
    #[command(subcommand)]
    Accounting(AccountingCommand),
    /// Print the job id of the worker running in this environment
    Whoami,
}

#[derive(ClapArgs, Debug)]
pub struct SubmitArgs {
    /// Number of workers
    #[arg(long)]
    pub count: u32,

    /// Submission round
    #[arg(long, default_value = "1")]
    pub iteration: u64,

    /// Resource class of the workers
    #[arg(long, default_value = "default")]
    pub rc_name: String,

    /// Extra sbatch argument of the resource class (repeatable)
    #[arg(long = "rc-arg", allow_hyphen_values = true)]
    pub rc_args: Vec<String>,

    /// Extra sbatch argument of this meadow (repeatable)
    #[arg(long = "meadow-arg", allow_hyphen_values = true)]
    pub meadow_args: Vec<String>,

    /// Directory for worker stdout/stderr (discarded when omitted)
    #[arg(long)]
    pub log_dir: Option<Utf8PathBuf>,

    /// Command each worker runs
    pub worker_cmd: String,
}

impl From<SubmitArgs> for SubmitRequest {
    fn from(args: SubmitArgs) -> Self {
        SubmitRequest {
            worker_cmd: args.worker_cmd,
            count: args.count,
            iteration: args.iteration,
            rc_name: args.rc_name,
            rc_args: args.rc_args,
            meadow_args: args.meadow_args,
            log_dir: args.log_dir,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum AccountingCommand {
    /// Records of specific jobs
    Jobs {
        #[arg(required = true)]
        job_ids: Vec<String>,
    },
    /// Records of jobs that ran in a time window
    Interval {
        /// Start, as YYYY-MM-DDTHH:MM:SS (UTC)
        #[arg(long, value_parser = parse_timestamp)]
        from: DateTime<Utc>,

        /// End, as YYYY-MM-DDTHH:MM:SS (UTC); defaults to now
        #[arg(long, value_parser = parse_timestamp)]
        to: Option<DateTime<Utc>>,

        /// Only this user's jobs (all users when omitted)
        #[arg(long)]
        user: Option<String>,
    },
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    parse_slurm_timestamp(s).ok_or_else(|| format!("expected YYYY-MM-DDTHH:MM:SS, got {:?}", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_args() {
        let args = Args::try_parse_from([
            "meadow",
            "submit",
            "--count",
            "1000",
            "--rc-name",
            "himem",
            "--rc-arg",
            "--mem=16G",
            "--log-dir",
            "/scratch/logs",
            "runWorker.pl -url x",
        ])
        .unwrap();

        let Command::Submit(submit) = args.command else {
            panic!("expected submit");
        };
        let request = SubmitRequest::from(submit);
        assert_eq!(request.count, 1000);
        assert_eq!(request.rc_args, vec!["--mem=16G"]);
        assert_eq!(request.worker_cmd, "runWorker.pl -url x");
        assert_eq!(request.log_dir, Some(Utf8PathBuf::from("/scratch/logs")));
    }

    #[test]
    fn test_slurm_config_from_args() {
        let args = Args::try_parse_from([
            "meadow",
            "--job-name-prefix",
            "pipe-Hive-",
            "--accounting-batch-size",
            "5",
            "status",
        ])
        .unwrap();
        let config = args.slurm_config();
        assert_eq!(config.job_name_prefix, "pipe-Hive-");
        assert_eq!(config.accounting_batch_size, 5);
        assert_eq!(config.sacct, "sacct");
    }

    #[test]
    fn test_accounting_interval_args() {
        let args = Args::try_parse_from([
            "meadow",
            "accounting",
            "interval",
            "--from",
            "2024-05-01T10:00:00",
        ])
        .unwrap();
        let Command::Accounting(AccountingCommand::Interval { from, to, user }) = args.command
        else {
            panic!("expected accounting interval");
        };
        assert_eq!(from.format("%H:%M").to_string(), "10:00");
        assert!(to.is_none());
        assert!(user.is_none());

        assert!(
            Args::try_parse_from(["meadow", "accounting", "interval", "--from", "yesterday"])
                .is_err()
        );
    }
}
