//! Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::logging::Verbosity;

/// traffic-watch - live traffic map and commute times for Harare
#[derive(Debug, Parser)]
#[command(name = "traffic-watch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Defaults to `serve`
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the web server with the embedded dashboard
    Serve {
        /// Override the configured bind address
        #[arg(long)]
        host: Option<String>,

        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Fetch every commute time once, print them and exit
    Check,
}

impl Cli {
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }

    #[must_use]
    pub fn command(&self) -> Command {
        match &self.command {
            Some(Command::Serve { host, port }) => Command::Serve {
                host: host.clone(),
                port: *port,
            },
            Some(Command::Check) => Command::Check,
            None => Command::Serve {
                host: None,
                port: None,
            },
        }
    }
}
