mod model_test;
mod policy_test;
mod utils_test;

use rstest::*;
use serde_json::{
    json,
    Map,
    Value,
};

use crate::graph::DependencyGraph;
use crate::links::Container;

pub const TEST_SEED: u64 = 1234;

/// A link declaration in dictionary form.
pub fn link(name: &str, target: &str, multiplicity: &str, required: bool) -> Value {
    json!({"name": name, "target_type": target, "multiplicity": multiplicity, "required": required})
}

/// Schema whose only relationship-shaped property is the reference slot for `links`.
pub fn entity(category: &str, links: Vec<Value>, required: &[&str], properties: Value) -> Value {
    let mut properties = properties.as_object().cloned().unwrap_or_default();
    for decl in &links {
        let name = decl["name"].as_str().unwrap();
        properties.insert(name.into(), link_property());
    }
    json!({
        "category": category,
        "properties": properties,
        "links": links,
        "required": required,
        "systemProperties": ["created_datetime"],
    })
}

/// Shape used by dictionaries for reference properties.
pub fn link_property() -> Value {
    json!({
        "anyOf": [
            {"type": "object", "properties": {"id": {"pattern": "^[a-f0-9]{8}$", "term": {"description": "A UUID"}}}},
            {"type": "array", "items": {"type": "object", "properties": {"id": {"pattern": "^[a-f0-9]{8}$", "term": {}}}}},
        ]
    })
}

pub fn dictionary_from(entries: Vec<(&str, Value)>) -> Map<String, Value> {
    entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

pub fn graph_from(entries: Vec<(&str, Value)>) -> DependencyGraph {
    DependencyGraph::from_dictionary(&dictionary_from(entries), Container::default(), Some(TEST_SEED)).unwrap()
}

/// project <- subject <- sample, both links many_to_one and required.
#[fixture]
pub fn clinical_dictionary() -> Map<String, Value> {
    dictionary_from(vec![
        (
            "project",
            entity("administrative", vec![], &["code"], json!({"code": {"type": "string"}, "name": {"type": "string"}})),
        ),
        (
            "subject",
            entity(
                "clinical",
                vec![link("projects", "project", "many_to_one", true)],
                &["age"],
                json!({
                    "age": {"type": "integer", "minimum": 0, "maximum": 90},
                    "gender": {"enum": ["male", "female", null]},
                    "state": {"type": "string"},
                    "id": {"type": "string"},
                    "created_datetime": {"type": "string"},
                }),
            ),
        ),
        (
            "sample",
            entity(
                "biospecimen",
                vec![link("subjects", "subject", "many_to_one", true)],
                &["sample_type"],
                json!({
                    "sample_type": {"enum": ["blood", "tissue", "saliva"]},
                    "md5sum": {"type": "string"},
                    "collected_at": {"description": "The date and time of day the sample was taken"},
                    "notes": {"type": "string"},
                }),
            ),
        ),
    ])
}

#[fixture]
pub fn clinical_graph(clinical_dictionary: Map<String, Value>) -> DependencyGraph {
    DependencyGraph::from_dictionary(&clinical_dictionary, Container::default(), Some(TEST_SEED)).unwrap()
}
