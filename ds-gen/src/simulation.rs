//! Record synthesis over the dependency graph.
//!
//! Entity types are synthesized one at a time in dependency order:
//! 1. Count reconciliation - cap the requested count at the size of every parent dataset
//!    reached through a `one_to_one`/`one_to_many` required link
//! 2. Property synthesis - fill every eligible property of each new record
//! 3. Link resolution - attach a reference for every required link
//! 4. Accumulation - append the batch to the entity type's dataset, where descendants read it
//!
//! [`DependencyGraph::synthesize_all`] drives a whole dictionary through these steps.
use std::collections::HashMap;

use derive_setters::Setters;
use rand::Rng;
use tracing::{
    debug,
    error,
    info,
    instrument,
};

use crate::errors::{
    SimError,
    SimResult,
};
use crate::graph::DependencyGraph;
use crate::model::{
    EntityDefinition,
    SynthesizedRecord,
};
use crate::policy::FailurePolicy;
use crate::property::{
    self,
    random_token,
    Outcome,
};

/// Bookkeeping fields owned by the system that accepts the records.
pub const EXCLUDED_FIELDS: &[&str] = &[
    "type",
    "error_type",
    "state",
    "id",
    "file_state",
    "state_comment",
    "project_id",
    "submitter_id",
    "object_id",
];

/// Length of the random token in a generated `submitter_id`.
const SUBMITTER_TOKEN_LEN: usize = 10;

/// Knobs for one synthesis call.
#[derive(Clone, Copy, Debug, Default, Setters)]
pub struct SynthesisOptions {
    /// Pick parents of shared links uniformly at random instead of by position.
    pub random_linking: bool,
    /// Only fill properties listed as required.
    pub required_only: bool,
}

/// How many records to request per entity type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstanceCounts {
    /// Count for entity types without an override.
    pub default: usize,
    /// Per-type counts.
    pub overrides: HashMap<String, usize>,
}

impl InstanceCounts {
    /// The same count for every entity type.
    pub fn uniform(default: usize) -> Self {
        Self { default, overrides: HashMap::new() }
    }

    /// `default` for every entity type except those listed in `overrides`.
    pub fn with_overrides(default: usize, overrides: HashMap<String, usize>) -> Self {
        Self { default, overrides }
    }

    /// Requested count for `entity_type`.
    pub fn for_type(&self, entity_type: &str) -> usize {
        self.overrides.get(entity_type).copied().unwrap_or(self.default)
    }
}

impl DependencyGraph {
    /// Synthesize up to `requested` new records of `entity_type`.
    ///
    /// Types without required links (the container included) are supplied externally and
    /// yield an empty batch. Property and link defects go through `policy`; under `Log` the
    /// affected record simply lacks the property or reference. The new batch is appended to
    /// the type's dataset and also returned.
    #[instrument(skip(self, options), fields(random = options.random_linking, required_only = options.required_only))]
    pub fn synthesize(
        &mut self,
        entity_type: &str,
        requested: usize,
        options: &SynthesisOptions,
        policy: FailurePolicy,
    ) -> SimResult<Vec<SynthesizedRecord>> {
        let idx = self.index_of(entity_type)?;
        let links: Vec<_> = self
            .required_edges(idx)
            .into_iter()
            .map(|(parent, link)| (parent, link.clone()))
            .collect();
        if links.is_empty() || entity_type == self.container.entity_type {
            debug!("no required links, records are supplied externally");
            return Ok(vec![]);
        }

        let count = links
            .iter()
            .filter(|(_, link)| link.bounds_count())
            .map(|(parent, _)| self.graph[*parent].dataset.len())
            .fold(requested, usize::min);
        if count < requested {
            info!(requested, count, "record count capped by one-to-one/one-to-many parents");
        }

        let Self { graph, container, rng, .. } = self;
        let definition = &graph[idx].definition;

        let mut batch = Vec::with_capacity(count);
        for _ in 0..count {
            batch.push(synthesize_record(definition, options, policy, rng)?);
        }

        for (parent, link) in &links {
            let parents = &graph[*parent].dataset;
            for (i, record) in batch.iter_mut().enumerate() {
                match link.reference(i, parents, options.random_linking, container, rng) {
                    Some(reference) => {
                        record.links.insert(link.name().into(), reference);
                    },
                    None => {
                        policy.report(SimError::UnlinkableRecord {
                            entity: entity_type.into(),
                            target: link.target().into(),
                        })?;
                        break;
                    },
                }
            }
        }

        graph[idx].dataset.extend(batch.iter().cloned());
        info!(synthesized = batch.len(), total = graph[idx].dataset.len(), "records synthesized");
        Ok(batch)
    }

    /// Synthesize every entity type in dependency order.
    ///
    /// Returns `(entity type, batch)` pairs in that order, leaving out types whose records
    /// are supplied externally.
    #[instrument(skip(self, counts, options))]
    pub fn synthesize_all(
        &mut self,
        counts: &InstanceCounts,
        options: &SynthesisOptions,
        policy: FailurePolicy,
    ) -> SimResult<Vec<(String, Vec<SynthesizedRecord>)>> {
        let order: Vec<String> = self.topological_order()?.into_iter().map(|d| d.name.clone()).collect();

        let mut batches = vec![];
        for name in order {
            if self.required_edges(self.index_of(&name)?).is_empty() || name == self.container.entity_type {
                continue;
            }
            let batch = self.synthesize(&name, counts.for_type(&name), options, policy)?;
            batches.push((name, batch));
        }
        Ok(batches)
    }
}

/// Build one record of `definition` with every eligible property filled in.
///
/// Link references are attached afterwards by the caller.
fn synthesize_record<R: Rng + ?Sized>(
    definition: &EntityDefinition,
    options: &SynthesisOptions,
    policy: FailurePolicy,
    rng: &mut R,
) -> SimResult<SynthesizedRecord> {
    let entity = definition.name.as_str();
    let submitter_id = format!("{entity}_{}", random_token(rng, SUBMITTER_TOKEN_LEN).to_lowercase());
    let mut record = SynthesizedRecord::new(entity, submitter_id);

    for (name, schema) in &definition.property_schemas {
        if definition.is_link_name(name) || definition.is_system_property(name) || EXCLUDED_FIELDS.contains(&name.as_str())
        {
            continue;
        }
        let required = definition.is_required(name);
        if options.required_only && !required {
            continue;
        }

        match property::synthesize(entity, name, schema, rng) {
            Outcome::Value(value) => {
                record.properties.insert(name.clone(), value);
            },
            Outcome::Defect(err) if required => policy.report(err)?,
            Outcome::Defect(err) => error!("{err}"),
            Outcome::Unsynthesizable if required => policy.report(SimError::schema(
                entity,
                format!("cannot synthesize required property `{name}`: schema does not provide enough info"),
            ))?,
            Outcome::Unsynthesizable => debug!(property = name.as_str(), "cannot synthesize optional property, omitting"),
        }
    }

    Ok(record)
}
