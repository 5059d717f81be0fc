use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "drive-shell")]
#[command(about = "A terminal client for drive-style cloud storage: folders, breadcrumbs, search")]
pub struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the interactive shell (default)
    Run,
    /// Execute a command against a session snapshot and output the result
    Execute {
        /// Path to the JSON session snapshot
        #[arg(short, long)]
        snapshot: String,
        /// Command to execute (e.g. "open:A:Docs", "query:report", "sequence:[...]")
        #[arg(short = 'x', long)]
        command: String,
        /// Output file for the resulting snapshot (defaults to stdout)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Save a fresh session state to JSON without entering the shell
    SaveState {
        /// Output file for the snapshot (defaults to stdout)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Run a headless test script against a live session
    Test {
        /// Path to the script file
        script: String,
        /// Optional snapshot to seed the session from
        #[arg(short, long)]
        snapshot: Option<String>,
        /// Maximum seconds to wait for background tasks to settle
        #[arg(long, default_value = "5")]
        settle_timeout: u64,
        /// Enable debug logging to stderr
        #[arg(short, long)]
        verbose: bool,
    },
}
