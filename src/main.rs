use anyhow::Result;
use clap::Parser;
use sounder::cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool, quiet: bool) {
    let default = if verbose {
        "sounder=debug"
    } else if quiet {
        "sounder=warn"
    } else {
        "sounder=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let config = cli.load_config()?;

    match &cli.command {
        Commands::Scan(cmd) => cmd.execute(config, cli.verbose, cli.quiet).await?,
        Commands::Attack(cmd) => cmd.execute(config, cli.verbose, cli.quiet).await?,
    }

    Ok(())
}
