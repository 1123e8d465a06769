use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "clipkeep")]
#[command(version, about = "Clipboard history with pinning, kept in the background", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the clipboard daemon (default if no command given)
    Run,
    /// List history entries, most recent first
    List {
        /// Only show entries containing this text (case-insensitive)
        #[arg(short, long)]
        query: Option<String>,

        /// Only show pinned entries
        #[arg(short, long)]
        pinned: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Show at most this many entries
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Put an entry back on the clipboard
    Copy {
        /// Entry id or unique prefix
        id: String,
    },
    /// Pin an entry so it is never evicted
    Pin { id: String },
    /// Unpin an entry
    Unpin { id: String },
    /// Delete an entry
    Delete { id: String },
    /// Stop recording clipboard changes
    Pause,
    /// Resume recording clipboard changes
    Resume,
    /// Set how many unpinned entries are kept
    Capacity { capacity: usize },
    /// Set the clipboard polling interval in milliseconds
    Interval { interval_ms: u64 },
    /// Remove unpinned entries
    Clear {
        /// Remove pinned entries as well
        #[arg(long)]
        all: bool,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Write the history to a JSON file
    Export { path: PathBuf },
    /// Show daemon and history status
    Status,
    /// Ask the running daemon to show itself
    Show,
}
