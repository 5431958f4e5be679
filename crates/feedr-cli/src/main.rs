use clap::Parser;
use feedr_cli::{load_config, Cli, Commands};
use tracing::error;
use tracing_subscriber::FmtSubscriber;

mod commands;

fn run(cli: &Cli, config: &feedr_cli::FeedrConfig) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Convert {
            tables,
            out,
            strict,
            canvas,
        } => {
            let options = canvas.apply(config.convert.clone());
            commands::convert::handle(tables, out.as_deref(), *strict, &options)
        }
        Commands::Inspect { tables, canvas } => {
            let options = canvas.apply(config.convert.clone());
            commands::inspect::handle(tables, &options)
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level.unwrap_or_else(|| config.log_level()))
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("warning: a tracing subscriber was already installed");
    }

    if let Err(e) = run(&cli, &config) {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
