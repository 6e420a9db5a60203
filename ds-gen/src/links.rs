//! Relationship resolution: classifying declared links and picking the parent record each new
//! child record points at.
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::model::{
    Cardinality,
    EntityDefinition,
    LinkReference,
    Relationship,
    SynthesizedRecord,
};

/// The externally supplied root of every dictionary.
///
/// Records of the container type are never synthesized; links to it carry a fixed project
/// code instead of a record identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Container {
    /// Entity type name of the container.
    pub entity_type: String,
    /// Code attached to every reference to the container.
    pub project_code: String,
}

impl Container {
    /// Container of type `entity_type` identified by `project_code`.
    pub fn new(entity_type: impl Into<String>, project_code: impl Into<String>) -> Self {
        Self { entity_type: entity_type.into(), project_code: project_code.into() }
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new("project", "test")
    }
}

/// What a link means for synthesis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum LinkKind {
    /// Points at the container; filled with the project code.
    Container,
    /// `one_to_one`/`one_to_many`: every child gets a parent of its own, so the parent count
    /// caps the child count.
    Bounded,
    /// `many_to_one`/`many_to_many`: children may share parents.
    Shared,
}

/// A declared relationship whose target has been found in the dictionary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedLink {
    /// The declaration as written on the child.
    pub relationship: Relationship,
    /// How the link behaves at synthesis time.
    pub kind: LinkKind,
}

impl ResolvedLink {
    /// Determine the semantics of `relationship`, declared on `child`, pointing at `parent`.
    pub fn resolve(child: &EntityDefinition, relationship: &Relationship, parent: &EntityDefinition, container: &Container) -> Self {
        debug_assert!(child.relationships.contains(relationship));
        debug_assert_eq!(relationship.target_type, parent.name);

        let kind = if parent.name == container.entity_type {
            LinkKind::Container
        } else if relationship.cardinality.bounds_count() {
            LinkKind::Bounded
        } else {
            LinkKind::Shared
        };
        Self { relationship: relationship.clone(), kind }
    }

    /// Reference slot name on child records.
    pub fn name(&self) -> &str {
        &self.relationship.name
    }

    /// Parent entity type.
    pub fn target(&self) -> &str {
        &self.relationship.target_type
    }

    /// Cardinality class of the underlying declaration.
    pub const fn cardinality(&self) -> Cardinality {
        self.relationship.cardinality
    }

    /// Whether this link drives ordering and must be filled on every record.
    pub const fn is_required(&self) -> bool {
        self.relationship.required
    }

    /// Whether the number of `parents` limits how many children can be made.
    pub const fn bounds_count(&self) -> bool {
        matches!(self.kind, LinkKind::Bounded)
    }

    /// Build the reference for the child at `index` of the batch being synthesized.
    ///
    /// Bounded links take the parent at the same position, which always exists because the
    /// batch size was capped at the parent count. Shared links pick uniformly at random when
    /// `random` is set and otherwise wrap the index around the parent dataset. Returns `None`
    /// when there is no parent to point at.
    pub fn reference<R: Rng + ?Sized>(
        &self,
        index: usize,
        parents: &[SynthesizedRecord],
        random: bool,
        container: &Container,
        rng: &mut R,
    ) -> Option<LinkReference> {
        let parent = match self.kind {
            LinkKind::Container => return Some(LinkReference::Project { code: container.project_code.clone() }),
            LinkKind::Bounded => parents.get(index),
            LinkKind::Shared if random => parents.choose(rng),
            LinkKind::Shared => (!parents.is_empty()).then(|| &parents[index % parents.len()]),
        }?;
        Some(LinkReference::Record { submitter_id: parent.submitter_id.clone() })
    }
}
