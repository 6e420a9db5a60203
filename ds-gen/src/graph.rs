//! The dependency graph of entity types.
//!
//! Nodes are entity types (each owning the dataset synthesized for it during a run); edges run
//! from a child type to the parent type named by one of its declared relationships. Only
//! required edges constrain generation order, but optional ones are kept so the graph mirrors
//! the dictionary.
use std::collections::{
    BTreeSet,
    HashMap,
    HashSet,
};

use itertools::Itertools;
use petgraph::algo::tarjan_scc;
use petgraph::prelude::*;
use petgraph::visit::{
    Dfs,
    EdgeFiltered,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{
    Map,
    Value,
};
use tracing::{
    debug,
    info,
    instrument,
};

use crate::errors::{
    SimError,
    SimResult,
};
use crate::links::{
    Container,
    ResolvedLink,
};
use crate::model::{
    EntityDefinition,
    SynthesizedRecord,
};
use crate::policy::FailurePolicy;

/// Dictionary entries that describe the dictionary itself rather than an entity type.
const METASCHEMA_KEY: &str = "metaschema";

/// An entity type together with the records synthesized for it so far.
#[derive(Clone, Debug)]
pub struct EntityNode {
    /// The parsed definition.
    pub definition: EntityDefinition,
    /// Records accumulated across synthesis calls; never pruned during a run.
    pub dataset: Vec<SynthesizedRecord>,
}

/// Entity types, their relationships and their datasets for one run.
pub struct DependencyGraph {
    pub(crate) graph: DiGraph<EntityNode, ResolvedLink>,
    pub(crate) by_name: HashMap<String, NodeIndex>,
    pub(crate) container: Container,
    pub(crate) rng: StdRng,
}

impl DependencyGraph {
    /// An empty graph whose randomness is seeded from the OS.
    pub fn new(container: Container) -> Self {
        Self::with_rng(container, StdRng::from_entropy())
    }

    /// An empty graph with a reproducible random stream.
    pub fn with_seed(container: Container, seed: u64) -> Self {
        Self::with_rng(container, StdRng::seed_from_u64(seed))
    }

    fn with_rng(container: Container, rng: StdRng) -> Self {
        Self {
            graph: DiGraph::new(),
            by_name: HashMap::new(),
            container,
            rng,
        }
    }

    /// Build a graph from a parsed dictionary and derive its edges.
    ///
    /// Keys beginning with `_` and the `metaschema` entry hold shared definitions, not entity
    /// types, and are skipped. Entity types are registered in the dictionary's order, which is
    /// the tie-break order for [`topological_order`](Self::topological_order).
    #[instrument(skip(dictionary, container), fields(entries = dictionary.len()))]
    pub fn from_dictionary(dictionary: &Map<String, Value>, container: Container, seed: Option<u64>) -> SimResult<Self> {
        let mut graph = match seed {
            Some(seed) => Self::with_seed(container, seed),
            None => Self::new(container),
        };

        for (name, schema) in dictionary {
            if name.starts_with('_') || name == METASCHEMA_KEY {
                debug!(name, "skipping non-entity dictionary entry");
                continue;
            }
            graph.add_entity_type(EntityDefinition::from_schema(name, schema)?)?;
        }
        graph.derive_edges()?;

        info!(entity_types = graph.len(), "dependency graph constructed");
        Ok(graph)
    }

    /// Register one entity type.
    pub fn add_entity_type(&mut self, definition: EntityDefinition) -> SimResult<()> {
        if self.by_name.contains_key(&definition.name) {
            return Err(SimError::schema(&definition.name, "entity type is defined more than once"));
        }
        let name = definition.name.clone();
        let idx = self.graph.add_node(EntityNode { definition, dataset: vec![] });
        self.by_name.insert(name, idx);
        Ok(())
    }

    /// Resolve every declared relationship against the registered entity types.
    ///
    /// Any previously derived edges are replaced. Fails on the first relationship whose target
    /// is not registered.
    #[instrument(skip(self), fields(entity_types = self.graph.node_count()))]
    pub fn derive_edges(&mut self) -> SimResult<()> {
        self.graph.clear_edges();

        let mut edges = vec![];
        for child in self.graph.node_indices() {
            let definition = &self.graph[child].definition;
            for relationship in &definition.relationships {
                let parent = *self.by_name.get(&relationship.target_type).ok_or_else(|| {
                    SimError::UnknownEntityType {
                        target: relationship.target_type.clone(),
                        referrer: Some(definition.name.clone()),
                    }
                })?;
                let link = ResolvedLink::resolve(definition, relationship, &self.graph[parent].definition, &self.container);
                edges.push((child, parent, link));
            }
        }

        for (child, parent, link) in edges {
            self.graph.add_edge(child, parent, link);
        }
        debug!(edges = self.graph.edge_count(), "edges derived");
        Ok(())
    }

    /// Number of registered entity types.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether no entity types are registered.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// The configured container.
    pub const fn container(&self) -> &Container {
        &self.container
    }

    /// Definition of `name`, if registered.
    pub fn entity(&self, name: &str) -> Option<&EntityDefinition> {
        self.by_name.get(name).map(|&idx| &self.graph[idx].definition)
    }

    /// Records synthesized so far for `name`.
    pub fn dataset(&self, name: &str) -> SimResult<&[SynthesizedRecord]> {
        Ok(&self.graph[self.index_of(name)?].dataset)
    }

    /// Required relationships of `name`, in declaration order.
    pub fn required_links(&self, name: &str) -> SimResult<Vec<&ResolvedLink>> {
        let idx = self.index_of(name)?;
        Ok(self.required_edges(idx).into_iter().map(|(_, link)| link).collect())
    }

    /// Entity types ordered so that every type follows all types it requires.
    ///
    /// Kahn's algorithm; among types that are ready at the same time the one declared first
    /// wins, so the result is deterministic for a given dictionary.
    #[instrument(skip(self), fields(entity_types = self.graph.node_count()))]
    pub fn topological_order(&self) -> SimResult<Vec<&EntityDefinition>> {
        let mut unresolved: Vec<usize> = self
            .graph
            .node_indices()
            .map(|idx| self.required_edges(idx).len())
            .collect();
        let mut ready: BTreeSet<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|idx| unresolved[idx.index()] == 0)
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(parent) = ready.pop_first() {
            order.push(parent);
            for edge in self.graph.edges_directed(parent, Incoming) {
                if !edge.weight().is_required() {
                    continue;
                }
                let child = edge.source();
                unresolved[child.index()] -= 1;
                if unresolved[child.index()] == 0 {
                    ready.insert(child);
                }
            }
        }

        if order.len() < self.graph.node_count() {
            return Err(SimError::CyclicDependency(self.cycle_members()));
        }
        Ok(order.into_iter().map(|idx| &self.graph[idx].definition).collect())
    }

    /// The smallest prefix of the generation order needed to populate `target`: the type
    /// itself and everything it transitively requires, in dependency order.
    #[instrument(skip(self))]
    pub fn ordered_path_to(&self, target: &str) -> SimResult<Vec<&EntityDefinition>> {
        let start = self.index_of(target)?;
        let required_only = EdgeFiltered::from_fn(&self.graph, |edge| edge.weight().is_required());

        let mut ancestors = HashSet::new();
        let mut dfs = Dfs::new(&required_only, start);
        while let Some(idx) = dfs.next(&required_only) {
            ancestors.insert(self.graph[idx].definition.name.as_str());
        }

        Ok(self
            .topological_order()?
            .into_iter()
            .filter(|definition| ancestors.contains(definition.name.as_str()))
            .collect())
    }

    /// Check the required-property and required-link invariants of `name`.
    ///
    /// Every defect is passed to `policy`; under `Log` they are all returned, under `Raise`
    /// the first one is.
    pub fn validate(&self, name: &str, policy: FailurePolicy) -> SimResult<Vec<SimError>> {
        let idx = self.index_of(name)?;
        let definition = &self.graph[idx].definition;

        let mut defects = vec![];
        for property in &definition.required_properties {
            if !definition.property_schemas.contains_key(property) {
                defects.push(SimError::schema(
                    name,
                    format!("required property `{property}` is not in the property list"),
                ));
            }
        }
        if name != self.container.entity_type && self.required_edges(idx).is_empty() {
            defects.push(SimError::schema(name, "entity type does not have any required link"));
        }

        for defect in &defects {
            policy.report(defect.clone())?;
        }
        Ok(defects)
    }

    /// Validate every entity type in declaration order.
    #[instrument(skip(self))]
    pub fn validate_all(&self, policy: FailurePolicy) -> SimResult<Vec<SimError>> {
        let mut defects = vec![];
        for idx in self.graph.node_indices() {
            defects.extend(self.validate(&self.graph[idx].definition.name, policy)?);
        }
        info!(defects = defects.len(), "validation finished");
        Ok(defects)
    }

    pub(crate) fn index_of(&self, name: &str) -> SimResult<NodeIndex> {
        self.by_name.get(name).copied().ok_or_else(|| SimError::unknown(name))
    }

    // petgraph walks adjacency lists newest-first; sort to get declaration order back.
    pub(crate) fn required_edges(&self, idx: NodeIndex) -> Vec<(NodeIndex, &ResolvedLink)> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(idx, Outgoing)
            .filter(|edge| edge.weight().is_required())
            .map(|edge| (edge.id(), edge.target(), edge.weight()))
            .collect();
        edges.sort_by_key(|(id, ..)| *id);
        edges.into_iter().map(|(_, target, link)| (target, link)).collect()
    }

    // Entity types sitting on a required cycle (including self-links), in declaration order.
    fn cycle_members(&self) -> Vec<String> {
        let required = self
            .graph
            .filter_map(|_, node| Some(node.definition.name.as_str()), |_, link| link.is_required().then_some(()));

        tarjan_scc(&required)
            .into_iter()
            .filter(|scc| scc.len() > 1 || required.contains_edge(scc[0], scc[0]))
            .flatten()
            .sorted()
            .map(|idx| required[idx].to_string())
            .collect()
    }
}
