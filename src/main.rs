// src/main.rs - CLI: machine config + NC programs in, JSON plot out
use std::path::PathBuf;

use clap::Parser;

use ncplot_rs::{load_config, parse_program, Machine, PlotResponse};

#[derive(Debug, Parser)]
#[command(name = "ncplot", about = "Interpret NC programs into tool-path geometry and timing")]
struct Cli {
    /// Machine-topology configuration file (TOML)
    #[arg(short, long, default_value = "machine.toml")]
    config: PathBuf,

    /// NC program files, one per canal in configuration order
    #[arg(required = true)]
    programs: Vec<PathBuf>,

    /// Pretty-print the JSON response
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    tracing::info!("Loading machine configuration from: {}", cli.config.display());
    let config = load_config(&cli.config).map_err(|e| {
        tracing::error!("Failed to load config from '{}': {}", cli.config.display(), e);
        e
    })?;

    tracing::info!(
        "Machine: {} ({} canal(s), arc step {} units)",
        config.machine.name,
        config.canals.len(),
        config.interpolation.max_segment
    );

    let machine = Machine::from_config(&config)?;

    let mut programs = Vec::with_capacity(cli.programs.len());
    for (canal, path) in cli.programs.iter().enumerate() {
        let text = std::fs::read_to_string(path).map_err(|e| {
            tracing::error!("Failed to read program '{}': {}", path.display(), e);
            e
        })?;
        let nodes = parse_program(&text, canal)?;
        tracing::info!("Parsed {} command(s) from {}", nodes.len(), path.display());
        programs.push(nodes);
    }

    let results = machine.run_programs(programs);
    let response = PlotResponse::from_results(results);

    let json = if cli.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{json}");

    Ok(())
}
