use clap::Parser;
use depute_cli::{cmd, parse_level, Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let config = match cli.config.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let level = if cli.command.is_service() {
        parse_level(&config.log_level)
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Run => cmd::run::run(&config),
        Commands::Refresh { skip_actors } => cmd::refresh::run(&config, skip_actors, cli.json),
        Commands::Next => cmd::next::run(&config, cli.json),
        Commands::Config => cmd::config::run(&config, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
