use rstest::*;
use serde_json::json;

use super::*;
use crate::errors::SimError;
use crate::model::{
    Cardinality,
    EntityDefinition,
    LinkReference,
    SynthesizedRecord,
};

#[rstest]
#[case::category("category")]
#[case::properties("properties")]
#[case::links("links")]
fn test_from_schema_missing_key(#[case] key: &str) {
    let mut schema = entity("clinical", vec![], &[], json!({"age": {"type": "integer"}}));
    schema.as_object_mut().unwrap().remove(key);

    match EntityDefinition::from_schema("subject", &schema).unwrap_err() {
        SimError::Schema { entity, reason } => {
            assert_eq!(entity, "subject");
            assert!(reason.contains(&format!("`{key}`")), "{reason}");
        },
        other => panic!("unexpected error {other:?}"),
    }
}

#[rstest]
fn test_from_schema_does_not_enforce_required_properties() {
    let schema = entity("clinical", vec![], &["age", "weight"], json!({}));
    let definition = EntityDefinition::from_schema("subject", &schema).unwrap();
    assert_eq!(definition.required_properties, vec!["age", "weight"]);
    assert!(definition.property_schemas.is_empty());
}

#[rstest]
fn test_from_schema_fields(clinical_dictionary: serde_json::Map<String, serde_json::Value>) {
    let definition = EntityDefinition::from_schema("sample", &clinical_dictionary["sample"]).unwrap();

    assert_eq!(definition.category, "biospecimen");
    assert_eq!(definition.system_properties, vec!["created_datetime"]);
    assert!(definition.is_required("sample_type"));
    assert!(!definition.is_required("notes"));
    assert!(definition.is_link_name("subjects"));
    assert_eq!(
        definition.property_schemas.keys().collect::<Vec<_>>(),
        vec!["sample_type", "md5sum", "collected_at", "notes", "subjects"]
    );
    assert_eq!(definition.relationships.len(), 1);
    assert_eq!(definition.relationships[0].cardinality, Cardinality::ManyToOne);
}

#[rstest]
fn test_from_schema_link_groups() {
    let schema = json!({
        "category": "clinical",
        "properties": {},
        "links": [
            {"target_type": "project", "multiplicity": "many_to_one", "required": true},
            {
                "exclusive": true,
                "required": true,
                "subgroup": [
                    {"name": "subjects", "target_type": "subject", "multiplicity": "many_to_one", "required": true},
                    {"name": "samples", "target_type": "sample", "cardinality": "one_to_one", "required": false},
                ],
            },
            {
                "required": false,
                "subgroup": [
                    {"name": "studies", "target_type": "study", "multiplicity": "many_to_many", "required": true},
                ],
            },
        ],
    });

    let definition = EntityDefinition::from_schema("observation", &schema).unwrap();
    let flattened: Vec<_> = definition
        .relationships
        .iter()
        .map(|r| (r.name.as_str(), r.target_type.as_str(), r.cardinality, r.required))
        .collect();
    assert_eq!(
        flattened,
        vec![
            ("project", "project", Cardinality::ManyToOne, true),
            ("subjects", "subject", Cardinality::ManyToOne, true),
            ("samples", "sample", Cardinality::OneToOne, false),
            ("studies", "study", Cardinality::ManyToMany, false),
        ]
    );
}

#[rstest]
#[case::bad_cardinality(json!({"target_type": "project", "multiplicity": "One_To_One"}))]
#[case::no_cardinality(json!({"target_type": "project"}))]
#[case::no_target(json!({"name": "projects", "multiplicity": "many_to_one"}))]
fn test_from_schema_bad_link(#[case] decl: serde_json::Value) {
    let schema = json!({"category": "clinical", "properties": {}, "links": [decl]});
    assert!(matches!(EntityDefinition::from_schema("subject", &schema), Err(SimError::Schema { .. })));
}

#[rstest]
fn test_cardinality_vocabulary() {
    for c in [Cardinality::OneToOne, Cardinality::OneToMany, Cardinality::ManyToOne, Cardinality::ManyToMany] {
        assert_eq!(c.as_str().parse::<Cardinality>().unwrap(), c);
        assert_eq!(serde_json::to_value(c).unwrap(), json!(c.as_str()));
    }
    assert!("ONE_TO_ONE".parse::<Cardinality>().is_err());
}

#[rstest]
fn test_record_serializes_flat() {
    let mut record = SynthesizedRecord::new("sample", "sample_abc".into());
    record.properties.insert("sample_type".into(), json!("blood"));
    record.links.insert("subjects".into(), LinkReference::Record { submitter_id: "subject_xyz".into() });
    record.links.insert("projects".into(), LinkReference::Project { code: "test".into() });

    assert_eq!(
        serde_json::to_value(&record).unwrap(),
        json!({
            "submitter_id": "sample_abc",
            "type": "sample",
            "sample_type": "blood",
            "subjects": {"submitter_id": "subject_xyz"},
            "projects": {"code": "test"},
        })
    );
}
