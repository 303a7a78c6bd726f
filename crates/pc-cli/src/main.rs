use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pc_cli::commands::{holidays, login, logout, status, summarize, today, watch};
use pc_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so JSON output on stdout stays parseable
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let mut stdout = std::io::stdout().lock();
    match &cli.command {
        Some(Commands::Login(args)) => login::run(&mut stdout, args, &config)?,
        Some(Commands::Logout) => logout::run(&mut stdout, &config)?,
        Some(Commands::Today(args)) => today::run(&mut stdout, args, &config)?,
        Some(Commands::Watch(args)) => watch::run(&mut stdout, args, &config)?,
        Some(Commands::Holidays(args)) => holidays::run(&mut stdout, args, &config)?,
        Some(Commands::Summarize(args)) => summarize::run(&mut stdout, args, &config)?,
        Some(Commands::Status) => status::run(&mut stdout, &config, cli.config.as_deref())?,
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
