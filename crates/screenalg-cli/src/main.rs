mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "screenalg",
    version,
    about = "Sensitivity and specificity of multi-test screening algorithms"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enumerate every algorithm of one or more topologies over a test feed
    Run {
        /// Path to the JSON test feed
        feed: PathBuf,

        /// Topology library: a preset (paths, deployment) or a JSON file
        #[arg(short, long, default_value = "paths")]
        library: String,

        /// Topology name(s) to run (default: every topology in the library)
        #[arg(short, long = "topology", value_name = "NAME")]
        topology: Vec<String>,

        /// Bound of the test estimates: lower, mean, upper or all
        #[arg(short, long, default_value = "mean")]
        bound: String,

        /// Node-involvement scenario: optimistic, pessimistic or both
        #[arg(short, long, default_value = "optimistic")]
        mood: String,

        /// Pessimistic node prevalence as DISEASE,NON_DISEASE (default 0.5,0.1)
        #[arg(long, value_name = "D,ND")]
        pessimistic_nodes: Option<String>,

        /// Optimistic node prevalence as DISEASE,NON_DISEASE (default 0.74,0.1)
        #[arg(long, value_name = "D,ND")]
        optimistic_nodes: Option<String>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Debug logging and per-row operator traces
        #[arg(long)]
        verbose: bool,
    },
    /// Inspect topology libraries
    Topologies {
        #[command(subcommand)]
        action: TopologiesAction,
    },
}

#[derive(Subcommand)]
enum TopologiesAction {
    /// List predefined libraries and their topologies
    List,
    /// Show the slots and formula of a topology
    Explain {
        /// Topology name (e.g., "extra-path-2")
        name: String,

        /// Library to look in: a preset or a JSON file (default: every preset)
        #[arg(short, long)]
        library: Option<String>,
    },
    /// Print the JSON library schema with field descriptions and an example
    Schema,
    /// Validate a custom topology library file
    Validate {
        /// Path to JSON library file
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Commands::Run { verbose: true, .. });
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let result = match cli.command {
        Commands::Run {
            feed,
            library,
            topology,
            bound,
            mood,
            pessimistic_nodes,
            optimistic_nodes,
            output,
            verbose,
        } => commands::run::run(commands::run::RunArgs {
            feed,
            library,
            topologies: topology,
            bound,
            mood,
            pessimistic_nodes,
            optimistic_nodes,
            output,
            verbose,
        }),
        Commands::Topologies { action } => match action {
            TopologiesAction::List => commands::topologies::list(),
            TopologiesAction::Explain { name, library } => {
                commands::topologies::explain(&name, library.as_deref())
            }
            TopologiesAction::Schema => commands::topologies::schema(),
            TopologiesAction::Validate { file } => commands::topologies::validate(&file),
        },
    };

    if let Err(e) = result {
        log::debug!("command failed: {e:?}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
