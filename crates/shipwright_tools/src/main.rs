//! Shipwright - Development Tools

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use shipwright_tools::report::{to_json, ShipReport};
use shipwright_tools::validate::{
    assemble_checked, load_blueprint, load_data_directory, validate_data_directory,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "shipwright-tools")]
#[command(about = "Development tools for Shipwright ship data")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the block catalog and every blueprint in a data directory
    Validate {
        /// Path to data directory
        #[arg(default_value = "assets/data")]
        path: PathBuf,
    },
    /// Assemble one blueprint and print its stats
    Stats {
        /// Blueprint file
        blueprint: PathBuf,
        /// Data directory holding the block catalog
        #[arg(long, default_value = "assets/data")]
        data: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
}

fn run(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Validate { path } => {
            tracing::info!("Validating data files in: {}", path.display());
            let reports = validate_data_directory(&path)?;
            tracing::info!("Validation passed for {} ships", reports.len());
        }
        Commands::Stats {
            blueprint,
            data,
            format,
        } => {
            let loaded = load_data_directory(&data)?;
            let parsed = load_blueprint(&blueprint)?;
            let mut ship = assemble_checked(&blueprint, &parsed, &loaded.registry, loaded.config)?;
            let report = ShipReport::new(&mut ship);
            match format {
                Format::Text => print!("{}", report.to_text()),
                Format::Json => println!("{}", to_json(&[report])?),
            }
        }
    }
    Ok(())
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli.command) {
        tracing::error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
