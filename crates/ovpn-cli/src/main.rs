//! ovpn-admin binary entrypoint.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use ovpn_pki::{ClientManager, ManagerConfig};
use tracing_subscriber::EnvFilter;

use ovpn_cli::cli::{Cli, Commands};
use ovpn_cli::commands::{ClientCommand, InfoCommand, SessionsCommand};
use ovpn_cli::output::OutputFormat;
use ovpn_cli::CliError;

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<ManagerConfig, CliError> {
    match &cli.config {
        Some(path) => {
            tracing::debug!(config = %path.display(), "loading configuration");
            Ok(ManagerConfig::from_file(path)?)
        }
        None => Ok(ManagerConfig::default()),
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let format = OutputFormat::new(cli.format);
    let config = load_config(&cli)?;
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Sessions { log } => {
            let log = log.unwrap_or_else(|| config.status_log.clone());
            SessionsCommand::new(log).execute(&mut stdout, &format).await?;
        }
        Commands::Info => {
            let manager = ClientManager::from_config(&config)?;
            let installation = manager.installation()?;
            InfoCommand::new(&config.status_log).execute(&mut stdout, &format, installation)?;
        }
        command => {
            let cmd = ClientCommand::new(ClientManager::from_config(&config)?);
            match command {
                Commands::List => cmd.list(&mut stdout, &format).await?,
                Commands::Create { name } => cmd.create(&mut stdout, &format, &name).await?,
                Commands::Remove { name } => cmd.remove(&mut stdout, &format, &name).await?,
                Commands::RefreshCrl => cmd.refresh_crl(&mut stdout, &format).await?,
                Commands::Config { name, output } => {
                    cmd.config(&mut stdout, &format, &name, output.as_deref())
                        .await?;
                }
                Commands::Sessions { .. } | Commands::Info => {}
            }
        }
    }

    Ok(())
}
