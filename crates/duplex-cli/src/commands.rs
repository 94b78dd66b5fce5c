//! Command handlers for the Duplex CLI

use std::path::Path;

use duplex_core::{format, types::normalize_name, ContactDirectory};
use duplex_gateway::{GatewayControlAdapter, GatewayFieldAdapter};
use duplex_runtime::RuntimeBuilder;
use tracing::info;

use crate::cli::{BlacklistAction, Cli, Commands, ContactsAction};
use crate::config::{AppConfig, DEFAULT_CONFIG_FILE};
use crate::error::Result;

/// Command dispatcher for handling CLI commands
pub struct CommandDispatcher;

impl CommandDispatcher {
    /// Execute a CLI command
    pub async fn execute(cli: Cli) -> Result<()> {
        if cli.command == Commands::ExampleConfig {
            print!("{}", AppConfig::example_config());
            return Ok(());
        }

        let config = load_configuration(cli.config.as_deref())?;

        match cli.command {
            Commands::Run => Self::handle_run_command(config).await,
            Commands::Contacts { action } => {
                let directory = open_directory(&config)?;
                println!("{}", contacts_command(&directory, action)?);
                Ok(())
            }
            Commands::Blacklist { action } => {
                let directory = open_directory(&config)?;
                println!("{}", blacklist_command(&directory, action)?);
                Ok(())
            }
            Commands::CheckConfig => {
                config.validate()?;
                print!("{}", config.to_redacted_toml()?);
                Ok(())
            }
            Commands::ExampleConfig => Ok(()),
        }
    }

    /// Run both supervisors until Ctrl+C
    async fn handle_run_command(config: AppConfig) -> Result<()> {
        config.validate()?;

        let directory = open_directory(&config)?;
        let control = GatewayControlAdapter::new(config.control_gateway()?);
        let field = GatewayFieldAdapter::new(config.field_gateway()?);

        let runtime = RuntimeBuilder::new(config.router_config(), directory)
            .retry_policy(config.retry_policy())
            .build_and_start(control, field);

        info!("Relay running. Press Ctrl+C to stop");
        tokio::signal::ctrl_c().await?;

        runtime.shutdown().await?;
        Ok(())
    }
}

/// Load configuration from file or use defaults
pub fn load_configuration(path: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = path {
        info!("Loading configuration from: {}", path.display());
        return Ok(AppConfig::load_from_file(path)?);
    }

    let default_path = Path::new(DEFAULT_CONFIG_FILE);
    if default_path.exists() {
        info!("Loading configuration from: {}", default_path.display());
        Ok(AppConfig::load_from_file(default_path)?)
    } else {
        info!("Using default configuration");
        Ok(AppConfig::default())
    }
}

fn open_directory(config: &AppConfig) -> Result<ContactDirectory> {
    let directory = ContactDirectory::open_file(&config.directory.path)?;
    info!(
        "Opened directory {} ({} contacts)",
        config.directory.path.display(),
        directory.list_contacts().len()
    );
    Ok(directory)
}

// ----------------------------------------------------------------------------
// Offline Directory Administration
// ----------------------------------------------------------------------------

/// Apply a contacts subcommand and describe the outcome
pub fn contacts_command(directory: &ContactDirectory, action: ContactsAction) -> Result<String> {
    let message = match action {
        ContactsAction::List => format::render_contacts(&directory.list_contacts()),
        ContactsAction::Add { name, address } => {
            directory.add_contact(&name, &address)?;
            format!("Contact {} added", normalize_name(&name))
        }
        ContactsAction::Rm { name } => {
            directory.remove_contact(&name)?;
            "Contact removed".to_string()
        }
    };
    Ok(message)
}

/// Apply a blacklist subcommand and describe the outcome
pub fn blacklist_command(directory: &ContactDirectory, action: BlacklistAction) -> Result<String> {
    let message = match action {
        BlacklistAction::List => format::render_blacklist(&directory.list_blacklist()),
        BlacklistAction::Add { address } => {
            directory.add_blacklist(&address)?;
            format!("{} has been blacklisted", address)
        }
        BlacklistAction::Rm { address } => {
            directory.remove_blacklist(&address)?;
            format!("{} has been unblacklisted", address)
        }
    };
    Ok(message)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
