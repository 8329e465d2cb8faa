use std::path::PathBuf;

use clap::Subcommand;

/// Class catalog commands.
#[derive(Clone, Debug, Subcommand)]
pub enum CatalogCommands {
    /// Import a JSON array of class entries. Malformed entries are skipped.
    Import {
        file: PathBuf,
    },
    /// List stored classes.
    List,
}

/// Offline queue commands.
#[derive(Clone, Debug, Subcommand)]
pub enum QueueCommands {
    /// List queued mutations in order.
    List,
    /// Drop one queued mutation.
    Discard {
        #[arg(long)]
        class: String,
        #[arg(long)]
        date: String,
        /// Mutation ID (`mut-...`).
        id: String,
    },
}
