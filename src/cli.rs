use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "careers-jobs", version, about = "Careers page job listing service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve {
        /// Serve from a process-local store instead of PostgreSQL
        #[arg(long)]
        in_memory: bool,
    },
    /// Apply pending database migrations and exit
    Migrate,
    /// Bulk insert jobs from a JSON file (array or {"jobs": [...]})
    Seed {
        file: PathBuf,
    },
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve { in_memory: false })
    }
}
