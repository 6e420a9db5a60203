//! Data models for entity definitions and the records synthesized from them.
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{
    Deserialize,
    Serialize,
};
use serde_json::{
    Map,
    Value,
};

use crate::errors::{
    SimError,
    SimResult,
};

/// How many records on each side of a relationship may relate to one another.
///
/// The wire vocabulary is case-sensitive and matches the serde names exactly.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// Each child references a distinct parent, and each parent has at most one child.
    OneToOne,
    /// Each child references a distinct parent.
    OneToMany,
    /// Many children may share one parent.
    ManyToOne,
    /// Many children may share many parents.
    ManyToMany,
}

impl Cardinality {
    /// Whether each child needs a parent of its own, which caps the child count at the
    /// parent count.
    pub const fn bounds_count(self) -> bool {
        matches!(self, Self::OneToOne | Self::OneToMany)
    }

    /// Wire name of the cardinality class.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneToOne => "one_to_one",
            Self::OneToMany => "one_to_many",
            Self::ManyToOne => "many_to_one",
            Self::ManyToMany => "many_to_many",
        }
    }
}

impl FromStr for Cardinality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "one_to_one" => Ok(Self::OneToOne),
            "one_to_many" => Ok(Self::OneToMany),
            "many_to_one" => Ok(Self::ManyToOne),
            "many_to_many" => Ok(Self::ManyToMany),
            other => Err(format!("unknown cardinality `{other}`")),
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A link declared by a child entity type, pointing at its parent type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Relationship {
    /// Name of the reference property carried on child records.
    pub name: String,
    /// Parent entity type.
    pub target_type: String,
    /// Cardinality class of the link.
    pub cardinality: Cardinality,
    /// Whether every child record must carry the reference.
    pub required: bool,
}

impl Relationship {
    /// Parse one link declaration.
    ///
    /// `target_type` and `multiplicity` (or its alias `cardinality`) are mandatory; `name`
    /// defaults to the target type. `group_required` is false when the link sits in an
    /// optional link group.
    fn from_declaration(entity: &str, decl: &Value, group_required: bool) -> SimResult<Self> {
        let target_type = decl
            .get("target_type")
            .and_then(Value::as_str)
            .ok_or_else(|| SimError::schema(entity, format!("link {decl} does not declare a `target_type`")))?;

        let cardinality = decl
            .get("multiplicity")
            .or_else(|| decl.get("cardinality"))
            .and_then(Value::as_str)
            .ok_or_else(|| SimError::schema(entity, format!("link to `{target_type}` does not declare a multiplicity")))?
            .parse::<Cardinality>()
            .map_err(|reason| SimError::schema(entity, reason))?;

        let name = decl.get("name").and_then(Value::as_str).unwrap_or(target_type);
        let required = group_required && decl.get("required").and_then(Value::as_bool).unwrap_or(false);

        Ok(Self {
            name: name.into(),
            target_type: target_type.into(),
            cardinality,
            required,
        })
    }
}

/// Structured view of one node type from the dictionary.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EntityDefinition {
    /// Unique entity type name.
    pub name: String,
    /// Reporting tag; not used by any generation logic.
    pub category: String,
    /// Properties every synthesized record must carry.
    pub required_properties: Vec<String>,
    /// Property name to schema fragment, in declaration order.
    pub property_schemas: Map<String, Value>,
    /// Properties filled in by the target system rather than the simulator.
    pub system_properties: Vec<String>,
    /// Declared links to parent types, in declaration order, with link groups flattened.
    pub relationships: Vec<Relationship>,
}

impl EntityDefinition {
    /// Build a definition from a parsed per-type schema object.
    ///
    /// Only the structural keys (`category`, `properties`, `links`) are checked here; the
    /// required-property and required-link invariants belong to validation, which can be run
    /// in a non-fatal mode.
    pub fn from_schema(name: &str, schema: &Value) -> SimResult<Self> {
        let category = required_key(name, schema, "category")?
            .as_str()
            .ok_or_else(|| SimError::schema(name, "`category` must be a string"))?;
        let property_schemas = required_key(name, schema, "properties")?
            .as_object()
            .ok_or_else(|| SimError::schema(name, "`properties` must be a mapping"))?;
        let links = required_key(name, schema, "links")?
            .as_array()
            .ok_or_else(|| SimError::schema(name, "`links` must be a list"))?;

        let mut relationships = vec![];
        flatten_links(name, links, true, &mut relationships)?;

        Ok(Self {
            name: name.into(),
            category: category.into(),
            required_properties: string_list(name, schema, "required")?,
            property_schemas: property_schemas.clone(),
            system_properties: string_list(name, schema, "systemProperties")?,
            relationships,
        })
    }

    /// Whether `property` must be present on every record.
    pub fn is_required(&self, property: &str) -> bool {
        self.required_properties.iter().any(|p| p == property)
    }

    /// Whether `property` is owned by the target system.
    pub fn is_system_property(&self, property: &str) -> bool {
        self.system_properties.iter().any(|p| p == property)
    }

    /// Whether `property` is the reference slot of a declared link.
    pub fn is_link_name(&self, property: &str) -> bool {
        self.relationships.iter().any(|r| r.name == property)
    }
}

fn required_key<'a>(entity: &str, schema: &'a Value, key: &str) -> SimResult<&'a Value> {
    schema
        .get(key)
        .ok_or_else(|| SimError::schema(entity, format!("schema does not have key `{key}`")))
}

fn string_list(entity: &str, schema: &Value, key: &str) -> SimResult<Vec<String>> {
    let Some(value) = schema.get(key) else { return Ok(vec![]) };
    value
        .as_array()
        .and_then(|items| items.iter().map(|v| v.as_str().map(String::from)).collect())
        .ok_or_else(|| SimError::schema(entity, format!("`{key}` must be a list of strings")))
}

// Link groups (`{"required": .., "subgroup": [..]}`) nest arbitrarily; a member is only
// required when every enclosing group is.
fn flatten_links(entity: &str, links: &[Value], group_required: bool, out: &mut Vec<Relationship>) -> SimResult<()> {
    for decl in links {
        if let Some(subgroup) = decl.get("subgroup") {
            let members = subgroup
                .as_array()
                .ok_or_else(|| SimError::schema(entity, "link `subgroup` must be a list"))?;
            let required = group_required && decl.get("required").and_then(Value::as_bool).unwrap_or(false);
            flatten_links(entity, members, required, out)?;
        } else {
            out.push(Relationship::from_declaration(entity, decl, group_required)?);
        }
    }
    Ok(())
}

/// Reference from a child record to its parent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LinkReference {
    /// Points at an already-synthesized record.
    Record {
        /// Identifier of the parent record.
        submitter_id: String,
    },
    /// Points at the externally supplied project container.
    Project {
        /// Project code.
        code: String,
    },
}

/// One generated record, serialized as a flat JSON object.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SynthesizedRecord {
    /// Unique human-readable identifier, `<entity type>_<random token>`.
    pub submitter_id: String,
    /// Entity type name.
    #[serde(rename = "type")]
    pub entity_type: String,
    /// Synthesized property values.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
    /// Relationship references keyed by link name.
    #[serde(flatten)]
    pub links: BTreeMap<String, LinkReference>,
}

impl SynthesizedRecord {
    /// An empty record of `entity_type` with the given identifier.
    pub fn new(entity_type: &str, submitter_id: String) -> Self {
        Self {
            submitter_id,
            entity_type: entity_type.into(),
            properties: Map::new(),
            links: BTreeMap::new(),
        }
    }

    /// The reference stored under link `name`, if any.
    pub fn link(&self, name: &str) -> Option<&LinkReference> {
        self.links.get(name)
    }
}
