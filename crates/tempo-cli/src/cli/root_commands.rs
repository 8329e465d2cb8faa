use std::path::PathBuf;

use clap::{ArgGroup, Args, Subcommand};
use tempo_core::enums::CanonicalStatus;

use crate::cli::subcommands::{CatalogCommands, QueueCommands};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Resolve every student's status in a session document file.
    Resolve(ResolveArgs),
    /// Classes a teacher must account for on a date.
    Day(DayArgs),
    /// Attendance report over a date range.
    Report(ReportArgs),
    /// Record one attendance change.
    Record(RecordArgs),
    /// Replay the offline queue against the store.
    Replay,
    /// Class catalog management.
    Catalog {
        #[command(subcommand)]
        action: CatalogCommands,
    },
    /// Inspect or prune the offline queue.
    Queue {
        #[command(subcommand)]
        action: QueueCommands,
    },
}

#[derive(Clone, Debug, Args)]
pub struct ResolveArgs {
    /// JSON session document.
    pub file: PathBuf,
}

#[derive(Clone, Debug, Args)]
pub struct DayArgs {
    /// Date (YYYY-MM-DD or YYYYMMDD).
    #[arg(long)]
    pub date: String,
    #[arg(long)]
    pub teacher: String,
}

#[derive(Clone, Debug, Args)]
pub struct ReportArgs {
    /// First day, inclusive.
    #[arg(long)]
    pub from: String,
    /// Last day, inclusive.
    #[arg(long)]
    pub to: String,
    #[arg(long)]
    pub teacher: Option<String>,
}

#[derive(Clone, Debug, Args)]
#[command(group(
    ArgGroup::new("intent")
        .required(true)
        .args(["status", "justify", "note"])
))]
pub struct RecordArgs {
    #[arg(long)]
    pub class: String,
    /// Session date (YYYY-MM-DD or YYYYMMDD).
    #[arg(long)]
    pub date: String,
    #[arg(long)]
    pub student: Option<String>,
    /// present, absent, late, or justified.
    #[arg(long, requires = "student")]
    pub status: Option<CanonicalStatus>,
    /// Record an approved justification with this reason.
    #[arg(long, requires = "student", conflicts_with = "status")]
    pub justify: Option<String>,
    /// Replace the session's observations.
    #[arg(long, conflicts_with_all = ["status", "justify"])]
    pub note: Option<String>,
    /// Create the session for this teacher first if it does not exist.
    #[arg(long)]
    pub teacher: Option<String>,
    /// Comma-separated roster for a newly created session.
    #[arg(long, value_delimiter = ',', requires = "teacher")]
    pub roster: Vec<String>,
}
