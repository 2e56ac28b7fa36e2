//! murmur - opinion diffusion over a dynamic social graph
//!
//! Command-line front end: run a configured network, print generated
//! topologies, track statistics, or drive a network interactively.

use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};

use murmur_core::NetworkConfig;
use murmur_logging::{FileConfig, LogConfig, MurmurSubscriberBuilder};
use murmur_simulation::{Console, Simulation, Statistic, scenarios, stats};

#[derive(Parser)]
#[command(
    name = "murmur",
    about = "Opinion diffusion over a dynamic social graph",
    version
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines instead of human-readable text
    #[arg(long, global = true)]
    json_logs: bool,

    /// Also write JSON logs to daily files in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Where a network comes from: a saved state, a config file, or flags
#[derive(Args)]
struct NetworkArgs {
    /// Load a saved JSON state instead of building a new network
    #[arg(long, conflicts_with = "config")]
    load: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of nodes
    #[arg(short, long)]
    nodes: Option<usize>,

    /// Topology: complete, cycle, random, scale-free, small-world, star
    #[arg(short, long)]
    topology: Option<String>,

    /// Opinion dimensions
    #[arg(short, long)]
    dimensions: Option<usize>,

    /// Random seed
    #[arg(short, long)]
    seed: Option<u64>,
}

impl NetworkArgs {
    fn build(&self) -> anyhow::Result<Simulation> {
        if let Some(path) = &self.load {
            return Simulation::load_json(path)
                .with_context(|| format!("loading state from {}", path.display()));
        }

        let mut config = match &self.config {
            Some(path) => NetworkConfig::from_file(path)?,
            None => NetworkConfig {
                n: 20,
                topology: "small world".into(),
                ..Default::default()
            },
        };
        if let Some(n) = self.nodes {
            config.n = n;
        }
        if let Some(topology) = &self.topology {
            config.topology = topology.clone();
        }
        if let Some(dimensions) = self.dimensions {
            config.dimensions = dimensions;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        Ok(Simulation::new(config))
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Scenario {
    Consensus,
    Polarization,
    Unfriend,
    Hidden,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a network and run it
    Run {
        #[command(flatten)]
        network: NetworkArgs,

        /// Steps to run
        #[arg(long, default_value = "100")]
        steps: usize,

        /// Save the final state as JSON
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Generate a topology and print its edges
    Topology {
        #[command(flatten)]
        network: NetworkArgs,
    },

    /// Print a statistic after every step
    Track {
        #[command(flatten)]
        network: NetworkArgs,

        /// attributes, degree, closeness, betweenness, eigenvector
        #[arg(long, default_value = "attributes")]
        stat: Statistic,

        #[arg(long, default_value = "20")]
        steps: usize,
    },

    /// Inspect and mutate a network interactively
    Console {
        #[command(flatten)]
        network: NetworkArgs,
    },

    /// Run a canned scenario
    Scenario {
        #[arg(value_enum)]
        name: Scenario,

        #[arg(short, long, default_value = "7")]
        seed: u64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut log_config = if cli.json_logs {
        LogConfig::default()
    } else {
        LogConfig::development()
    };
    log_config.default_level = if cli.verbose { "debug" } else { "info" }.to_string();

    let mut builder = MurmurSubscriberBuilder::new().with_config(log_config);
    if let Some(directory) = cli.log_dir {
        builder = builder.with_file_output(FileConfig {
            directory,
            ..Default::default()
        });
    }
    let _guard = builder.try_init()?;

    match cli.command {
        Commands::Run {
            network,
            steps,
            save,
        } => {
            let mut sim = network.build()?;
            println!("{}", sim.state_summary());
            sim.run(steps);
            println!("{}", sim.state_summary());
            if let Some(path) = save {
                sim.save_json(&path)
                    .with_context(|| format!("saving state to {}", path.display()))?;
                println!("Saved state to {}", path.display());
            }
        }
        Commands::Topology { network } => {
            let sim = network.build()?;
            let graph = sim.graph();
            println!(
                "{} nodes, {} edges, density {:.4}",
                graph.node_count(),
                graph.edge_count(),
                graph.density()
            );
            let arrow = if graph.is_directed() { "->" } else { "--" };
            for (a, b) in graph.edges() {
                println!("  {a} {arrow} {b}");
            }
        }
        Commands::Track {
            network,
            stat,
            steps,
        } => {
            let mut sim = network.build()?;
            let series = stats::track(&mut sim, stat, steps);
            println!("{stat} over {steps} steps");
            for (index, values) in series.iter().enumerate() {
                let formatted: Vec<String> = values.iter().map(|v| format!("{v:.3}")).collect();
                println!("  {index:>3}: {}", formatted.join(" "));
            }
        }
        Commands::Console { network } => {
            let mut sim = network.build()?;
            println!("murmur console. Type 'help' for commands, 'quit' to exit.");
            println!("{}", sim.state_summary());
            let stdin = io::stdin();
            Console::new(&mut sim).run(stdin.lock(), io::stdout())?;
        }
        Commands::Scenario { name, seed } => {
            match name {
                Scenario::Consensus => scenarios::run_consensus_scenario(seed),
                Scenario::Polarization => scenarios::run_polarization_scenario(seed),
                Scenario::Unfriend => scenarios::run_unfriend_scenario(seed),
                Scenario::Hidden => scenarios::run_hidden_opinions_scenario(seed),
            };
        }
    }

    Ok(())
}
