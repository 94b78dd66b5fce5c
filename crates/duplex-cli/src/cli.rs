//! Command-line interface definitions and parsing

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Relay messages between a control network and a field network", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "DUPLEX_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the relay until interrupted
    Run,
    /// Manage the contact directory file
    ///
    /// A running relay keeps these edits but only sees them after its next
    /// own directory change; restart it to apply them at once.
    Contacts {
        #[command(subcommand)]
        action: ContactsAction,
    },
    /// Manage blacklisted addresses in the directory file
    ///
    /// Same caveat as `contacts` for a relay that is already running.
    Blacklist {
        #[command(subcommand)]
        action: BlacklistAction,
    },
    /// Load and validate the configuration, then print it
    CheckConfig,
    /// Print an example configuration file
    ExampleConfig,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ContactsAction {
    /// List contacts and their group bindings
    List,
    /// Add a contact
    Add { name: String, address: String },
    /// Remove a contact
    Rm { name: String },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum BlacklistAction {
    /// List blacklisted addresses
    List,
    /// Blacklist an address
    Add { address: String },
    /// Remove an address from the blacklist
    Rm { address: String },
}
