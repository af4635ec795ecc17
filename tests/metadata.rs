#![allow(missing_docs)]

mod support;

use graphsketch::query::catalog;
use graphsketch::{
    retrieve_metadata, GraphDatabase, Identified, Record, ReplayDatabase,
};
use support::{empty_catalog, social_catalog};

#[test]
fn catalog_is_assembled_from_the_fixed_queries() {
    let db = social_catalog();
    let meta = retrieve_metadata(&db).expect("metadata");

    assert_eq!(meta.node_labels().collect::<Vec<_>>(), vec!["Company", "Person"]);
    assert_eq!(meta.relation_types().collect::<Vec<_>>(), vec!["KNOWS", "WORKS_AT"]);
    assert_eq!(meta.node_counts_by_label["Person"], 3);
    assert_eq!(meta.relation_counts_by_label["WORKS_AT"], 3);
    assert_eq!((meta.total_nodes, meta.total_relations), (4, 5));
    assert_eq!(
        meta.relation_properties_by_label["KNOWS"]["since"],
        "Long"
    );

    let schema = meta.schema_graph.as_ref().expect("schema");
    assert_eq!(schema.node_count(), 2);
    assert_eq!(schema.relation_count(), 2);
    assert!(schema.nodes().all(|node| node.properties().is_empty()));
    assert!(schema.relations().all(|rel| rel.is_directed()));

    assert_eq!(db.open_sessions(), 0);
    assert_eq!(db.sessions_opened(), 1);
}

#[test]
fn first_reported_property_type_wins() {
    let meta = retrieve_metadata(&social_catalog()).expect("metadata");
    let person = &meta.node_properties_by_label["Person"];
    assert_eq!(person["age"], "Long");
    assert_eq!(person["name"], "String");
    assert_eq!(person.len(), 2);
}

#[test]
fn retrieval_is_idempotent() {
    let db = social_catalog();
    let first = retrieve_metadata(&db).expect("first");
    let second = retrieve_metadata(&db).expect("second");
    assert_eq!(first, second);
    assert_eq!(first.to_string(), second.to_string());
}

#[test]
fn empty_database_has_no_schema_graph() {
    let meta = retrieve_metadata(&empty_catalog()).expect("metadata");
    assert!(meta.schema_graph.is_none());
    assert_eq!(meta.total_nodes, 0);
    assert!(!meta.is_redundant_node_label("Person"));
}

#[test]
fn missing_catalog_response_aborts_and_releases_the_session() {
    let db = ReplayDatabase::new().with_response(
        catalog::LABELS_QUERY,
        vec![Record::new().with("label", "Person")],
    );
    let err = retrieve_metadata(&db).unwrap_err();
    assert_eq!(err.code(), "Database");
    assert_eq!(db.open_sessions(), 0);
}

#[test]
fn mistyped_count_is_a_decode_error() {
    let db = social_catalog().with_response(
        catalog::TOTAL_NODES_QUERY,
        vec![Record::new().with("count", "four")],
    );
    let err = retrieve_metadata(&db).unwrap_err();
    assert_eq!(err.code(), "Decode");
}

#[test]
fn unreachable_database_fails_before_any_read() {
    let db = social_catalog().unreachable();
    assert!(db.verify_connectivity().is_err());
    assert!(retrieve_metadata(&db).is_err());
    assert_eq!(db.sessions_opened(), 0);
}

#[test]
fn fixture_files_replay_the_same_catalog() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("catalog.json");
    std::fs::write(&path, social_catalog().to_json().expect("json")).expect("write");

    let from_file = ReplayDatabase::from_path(&path).expect("fixture");
    assert_eq!(
        retrieve_metadata(&from_file).expect("metadata"),
        retrieve_metadata(&social_catalog()).expect("metadata")
    );
}
