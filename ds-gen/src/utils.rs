//! File helpers for the `ds-gen` binary: loading dictionaries and count overrides, and writing
//! generated batches and submission orders.
use std::collections::HashMap;
use std::fs::File;
use std::io::{
    BufWriter,
    Write,
};
use std::path::{
    Path,
    PathBuf,
};

use chrono::Utc;
use ds_core::errors::*;
use serde_json::{
    json,
    Map,
    Value,
};
use tracing::{
    debug,
    info,
    instrument,
};

use crate::model::{
    EntityDefinition,
    SynthesizedRecord,
};

/// Name of the submission order file.
pub const SUBMISSION_ORDER_FILE: &str = "DataImportOrderPath.txt";

/// Load a dictionary (entity type name → schema object) from a JSON or YAML file.
///
/// The file's key order is kept since it is the tie-break order for generation.
#[instrument]
pub fn load_dictionary(path: &Path) -> Result<Map<String, Value>> {
    let contents = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let is_yaml = path.extension().is_some_and(|ext| ext == "yaml" || ext == "yml");

    let value: Value = if is_yaml {
        serde_yaml::from_str(&contents).with_context(|| format!("parsing {} as YAML", path.display()))?
    } else {
        serde_json::from_str(&contents).with_context(|| format!("parsing {} as JSON", path.display()))?
    };

    match value {
        Value::Object(map) => {
            info!(entries = map.len(), "dictionary loaded");
            Ok(map)
        },
        other => bail!("dictionary in {} must be a mapping, found {}", path.display(), ds_core::jsonutils::type_name(&other)),
    }
}

/// Load per-entity-type requested counts from a JSON object of `name: count` pairs.
#[instrument]
pub fn load_instance_counts(path: &Path) -> Result<HashMap<String, usize>> {
    let file = File::open(path).with_context(|| format!("file {} does not exist", path.display()))?;
    serde_json::from_reader(file).with_context(|| format!("cannot load instance counts from {}", path.display()))
}

/// Write one batch as a pretty-printed JSON array to `<output_dir>/<entity_type>.json`.
#[instrument(skip(records), fields(records = records.len()))]
pub fn write_batch_file(output_dir: &Path, entity_type: &str, records: &[SynthesizedRecord]) -> Result<PathBuf> {
    let path = output_dir.join(format!("{entity_type}.json"));
    let file = File::create(&path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), records)?;

    debug!("Batch written to: {}", path.display());
    Ok(path)
}

/// Write `name<TAB>category` lines for each entity type in `order`.
#[instrument(skip(order), fields(entity_types = order.len()))]
pub fn write_submission_order(output_dir: &Path, order: &[&EntityDefinition]) -> Result<PathBuf> {
    let path = output_dir.join(SUBMISSION_ORDER_FILE);
    let mut file = BufWriter::new(File::create(&path)?);
    for definition in order {
        writeln!(file, "{}\t{}", definition.name, definition.category)?;
    }
    file.flush()?;

    info!("Submission order written to: {}", path.display());
    Ok(path)
}

/// Write a `metadata.json` describing the run into `output_dir`.
#[instrument]
pub fn write_run_metadata(output_dir: &Path) -> Result<PathBuf> {
    let metadata = json!({
        "timestamp": Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "command_args": std::env::args().collect::<Vec<_>>()
    });

    let path = output_dir.join("metadata.json");
    let mut file = File::create(&path)?;
    file.write_all(serde_json::to_string_pretty(&metadata)?.as_bytes())?;
    Ok(path)
}
