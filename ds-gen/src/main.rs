#![deny(clippy::nursery, clippy::pedantic)]
//! Data simulator command line interface.
//!
//! Loads a data dictionary from a JSON or YAML file and either validates it, writes the order
//! in which its entity types can be submitted, or synthesizes records for every entity type.
//! See binary --help for more information.

use std::path::PathBuf;

use clap::{
    Args,
    Parser,
    Subcommand,
};
use ds_core::errors::*;
use ds_gen::utils::{
    load_dictionary,
    load_instance_counts,
    write_batch_file,
    write_run_metadata,
    write_submission_order,
};
use ds_gen::{
    Container,
    DependencyGraph,
    FailurePolicy,
    InstanceCounts,
    SynthesisOptions,
};
use tracing::{
    info,
    warn,
};

/// Generate synthetic records for a graph-shaped data dictionary.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    action: Action,

    /// Logging verbosity level (`trace`, `debug`, `info`, `warn`, `error`).
    #[arg(short, long, default_value = "info", global = true)]
    verbosity: String,
}

#[derive(Subcommand)]
enum Action {
    /// Synthesize records for every entity type and write one JSON file per type.
    Simulate(SimulateArgs),

    /// Report every required-property and required-link defect in the dictionary.
    Validate {
        #[command(flatten)]
        dictionary: DictionaryArgs,

        /// What to do on a defect (`log` reports all, `raise` stops at the first).
        #[arg(long, default_value = "log")]
        policy: FailurePolicy,
    },

    /// Write the order in which entity types can be submitted.
    SubmissionOrder {
        #[command(flatten)]
        dictionary: DictionaryArgs,

        /// Directory to write `DataImportOrderPath.txt` into.
        #[arg(long)]
        path: PathBuf,

        /// Only include this entity type and the types it requires.
        #[arg(long)]
        node_name: Option<String>,
    },
}

#[derive(Args)]
struct DictionaryArgs {
    /// Dictionary file (JSON, or YAML with a `.yaml`/`.yml` extension).
    #[arg(short, long)]
    dictionary: PathBuf,

    /// Entity type acting as the externally supplied root container.
    #[arg(long, default_value = "project")]
    container_type: String,

    /// Project code attached to links to the container.
    #[arg(long, default_value = "test")]
    project: String,
}

impl DictionaryArgs {
    fn build_graph(&self, seed: Option<u64>) -> Result<DependencyGraph> {
        let dictionary = load_dictionary(&self.dictionary)?;
        let container = Container::new(&self.container_type, &self.project);
        Ok(DependencyGraph::from_dictionary(&dictionary, container, seed)?)
    }
}

#[derive(Args)]
struct SimulateArgs {
    #[command(flatten)]
    dictionary: DictionaryArgs,

    /// Directory to write generated records into.
    #[arg(long)]
    path: PathBuf,

    /// Number of records requested for each entity type.
    #[arg(long, default_value_t = 1)]
    max_samples: usize,

    /// JSON object mapping entity type names to requested counts, overriding --max-samples.
    #[arg(long)]
    node_num_instances_file: Option<PathBuf>,

    /// Link many-to-one/many-to-many records to randomly chosen parents.
    #[arg(long)]
    random: bool,

    /// Only generate required properties.
    #[arg(long)]
    required_only: bool,

    /// What to do on a synthesis defect (`log` or `raise`).
    #[arg(long, default_value = "log")]
    policy: FailurePolicy,

    /// Seed for reproducible output.
    #[arg(long)]
    seed: Option<u64>,
}

fn simulate(args: &SimulateArgs) -> EmptyResult {
    let mut graph = args.dictionary.build_graph(args.seed)?;

    // Diagnostics only: generation proceeds whether or not the dictionary is clean.
    let defects = graph.validate_all(FailurePolicy::Log)?;
    if !defects.is_empty() {
        warn!("dictionary has {} defects, generating anyway", defects.len());
    }

    let counts = match &args.node_num_instances_file {
        Some(path) => InstanceCounts::with_overrides(args.max_samples, load_instance_counts(path)?),
        None => InstanceCounts::uniform(args.max_samples),
    };
    let options = SynthesisOptions::default()
        .random_linking(args.random)
        .required_only(args.required_only);

    info!("Generating data...");
    std::fs::create_dir_all(&args.path)?;
    for (entity_type, batch) in graph.synthesize_all(&counts, &options, args.policy)? {
        write_batch_file(&args.path, &entity_type, &batch)?;
    }
    write_run_metadata(&args.path)?;
    Ok(())
}

fn main() -> EmptyResult {
    let args = Cli::parse();

    // Conform to crate-standard logging.
    ds_core::logging::setup(&args.verbosity);
    info!("Data simulator initialization...");

    match &args.action {
        Action::Simulate(simulate_args) => simulate(simulate_args)?,
        Action::Validate { dictionary, policy } => {
            let graph = dictionary.build_graph(None)?;
            info!("Validating...");
            let defects = graph.validate_all(*policy)?;
            info!("{} defects found", defects.len());
        },
        Action::SubmissionOrder { dictionary, path, node_name } => {
            let graph = dictionary.build_graph(None)?;
            info!("Generating data submission order...");
            let order = match node_name {
                Some(name) => graph.ordered_path_to(name)?,
                None => graph.topological_order()?,
            };
            std::fs::create_dir_all(path)?;
            write_submission_order(path, &order)?;
        },
    }

    info!("Done!");
    Ok(())
}
