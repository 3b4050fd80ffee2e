use anyhow::Result;
use clap::{Parser, Subcommand};
use scionsim::{AlgorithmKind, Simulation, SimulationOpts};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "scionsim",
    about = "Discrete-event simulator for SCION-style inter-domain path selection"
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a simulation from a topology file and a traffic scenario
    Run {
        /// Path to the topology file (JSON, keyed by AS id)
        #[arg(long)]
        topology: PathBuf,

        /// Path to the traffic scenario file (JSON)
        #[arg(long)]
        traffic: PathBuf,

        /// Path selection algorithm: sapex or shortest-path
        #[arg(long, default_value = "sapex")]
        algorithm: String,

        /// Disable the periodic probing task
        #[arg(long)]
        no_probing: bool,

        /// Disable shared-bottleneck suppression in sapex
        #[arg(long)]
        no_umcc: bool,

        /// Discover all simple paths by graph traversal before the run
        #[arg(long)]
        graph_discovery: bool,
    },
}

fn parse_algorithm(raw: &str) -> Result<AlgorithmKind> {
    match raw {
        "sapex" => Ok(AlgorithmKind::Sapex),
        "shortest-path" => Ok(AlgorithmKind::ShortestPath),
        other => anyhow::bail!("unknown algorithm {other:?} (expected sapex or shortest-path)"),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();
    match args.command {
        Command::Run {
            topology,
            traffic,
            algorithm,
            no_probing,
            no_umcc,
            graph_discovery,
        } => {
            let opts = SimulationOpts {
                algorithm: parse_algorithm(&algorithm)?,
                probing: !no_probing,
                umcc: !no_umcc,
                graph_discovery,
            };
            let mut simulation = Simulation::from_files(&topology, &traffic, opts)?;
            let results = simulation.run();
            println!("{}", results.render());
        }
    }
    Ok(())
}
