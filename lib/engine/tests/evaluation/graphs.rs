use crate::{evaluator, ex, rows, run, select, sorted_rows, PREFIX};
use rdf_eval_common::QueryEvaluationError;
use rdf_eval_engine::QueryOptions;

#[test]
fn graph_variable_ranges_over_named_graphs() {
    let results = select("SELECT ?g ?p WHERE { GRAPH ?g { ?p ex:email ?e } }");
    insta::assert_debug_snapshot!(sorted_rows(&results), @r#"
    [
        "?g=ex:g1 ?p=ex:alice",
        "?g=ex:g2 ?p=ex:bob",
        "?g=ex:g2 ?p=ex:carol",
    ]
    "#);
}

#[test]
fn graph_constant_restricts_active_graph() {
    let results = select("SELECT ?p WHERE { GRAPH ex:g2 { ?p ex:email ?e } }");
    assert_eq!(sorted_rows(&results), vec!["?p=ex:bob", "?p=ex:carol"]);
}

#[test]
fn default_graph_excludes_named_graphs() {
    let results = select("SELECT ?e WHERE { ?p ex:email ?e }");
    assert!(results.is_empty());
}

#[test]
fn default_graph_as_union_includes_named_graphs() {
    let results = run(
        &evaluator(),
        "SELECT ?e WHERE { ?p ex:email ?e }",
        &QueryOptions::default().with_default_graph_as_union(),
    );
    assert_eq!(results.len(), 3);
}

#[test]
fn from_replaces_default_graph() {
    let results = select("SELECT ?p FROM ex:g1 WHERE { ?p ex:email ?e }");
    assert_eq!(rows(&results), vec!["?p=ex:alice"]);
}

#[test]
fn from_without_from_named_has_no_named_graphs() {
    let results = select("SELECT ?g FROM ex:g1 WHERE { GRAPH ?g { ?s ?p ?o } }");
    assert!(results.is_empty());
}

#[test]
fn from_named_restricts_named_graphs() {
    let results = select("SELECT ?g ?p FROM NAMED ex:g2 WHERE { GRAPH ?g { ?p ex:email ?e } }");
    assert_eq!(
        sorted_rows(&results),
        vec!["?g=ex:g2 ?p=ex:bob", "?g=ex:g2 ?p=ex:carol"]
    );
}

#[test]
fn unknown_dataset_graph_fails() {
    let result = evaluator().evaluate_str(
        &format!("{PREFIX}SELECT * FROM ex:missing WHERE {{ ?s ?p ?o }}"),
        &QueryOptions::default(),
    );
    assert!(
        matches!(result, Err(QueryEvaluationError::GraphDoesNotExist(name)) if name == ex("missing"))
    );
}

#[test]
fn empty_pattern_in_missing_graph_has_no_solutions() {
    assert!(select("SELECT * WHERE { GRAPH ex:missing {} }").is_empty());
    assert_eq!(select("SELECT * WHERE { GRAPH ex:g1 {} }").len(), 1);
}
