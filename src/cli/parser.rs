use crate::export::ExportFormat;
use clap::{Parser, Subcommand};

/// Command-line interface definition for rTimeSync
/// Attendance entries with an offline-aware status cache and background sync
#[derive(Parser)]
#[command(
    name = "rtimesync",
    version = env!("CARGO_PKG_VERSION"),
    about = "Record daily attendance and keep an offline-aware entry cache in sync",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Show the effective configuration
    Config {
        #[arg(long = "print", help = "Print the effective configuration")]
        print_config: bool,
    },

    /// Print the internal log table
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },

    /// Add or update the entry of one day
    Add {
        /// Date of the entry (YYYY-MM-DD)
        date: String,

        /// Clock-in time (HH:MM); empty string clears it
        #[arg(long = "in", help = "Clock-in time (HH:MM)")]
        start: Option<String>,

        /// Clock-out time (HH:MM); empty string clears it
        #[arg(long = "out", help = "Clock-out time (HH:MM)")]
        end: Option<String>,

        /// Break as minutes or HH:MM
        #[arg(long = "break", help = "Break duration (minutes or HH:MM)")]
        break_time: Option<String>,

        #[arg(long = "location", help = "Work location")]
        location: Option<String>,
    },

    /// Run one sync attempt for a month
    Sync {
        #[arg(long, value_name = "YYYY-MM", help = "Month to sync (default: current)")]
        month: Option<String>,
    },

    /// Ask the entry cache whether a date has an entry
    Status {
        /// Date to check (YYYY-MM-DD)
        date: String,
    },

    /// Monthly summary
    Month {
        /// Month (YYYY-MM, default: current)
        month: Option<String>,
    },

    /// Export the monthly summary
    Export {
        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,

        #[arg(long, value_name = "FILE")]
        file: String,

        #[arg(long, value_name = "YYYY-MM", help = "Month to export (default: current)")]
        month: Option<String>,

        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Inspect or clear the persisted entry cache
    Cache {
        #[arg(long, help = "Show cache statistics")]
        info: bool,

        #[arg(long, help = "Clear the cache (one month with --month, else all)")]
        clear: bool,

        #[arg(long, value_name = "YYYY-MM")]
        month: Option<String>,
    },

    /// Run background sync until Ctrl-C
    Daemon,
}
