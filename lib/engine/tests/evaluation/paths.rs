use crate::{evaluator, run, select, sorted_rows};
use rdf_eval_engine::results::QueryResults;
use rdf_eval_engine::QueryOptions;

fn ask(query: &str) -> bool {
    match run(&evaluator(), query, &QueryOptions::default()) {
        QueryResults::Boolean(value) => value,
        _ => panic!("expected a boolean"),
    }
}

#[test]
fn one_or_more_follows_cycles_once() {
    let results = select("SELECT ?x WHERE { ex:alice ex:knows+ ?x }");
    assert_eq!(
        sorted_rows(&results),
        vec!["?x=ex:alice", "?x=ex:bob", "?x=ex:carol"]
    );
}

#[test]
fn zero_or_more_reaches_unknown_start() {
    let results = select("SELECT ?x WHERE { ex:zoe ex:knows* ?x }");
    assert_eq!(sorted_rows(&results), vec!["?x=ex:zoe"]);
}

#[test]
fn zero_length_paths_connect_a_node_to_itself() {
    assert!(ask("ASK { ex:dave ex:knows* ex:dave }"));
    assert!(!ask("ASK { ex:dave ex:knows+ ex:dave }"));
}

#[test]
fn sequence_and_inverse_paths() {
    let results = select("SELECT ?x WHERE { ex:alice ex:knows/ex:knows ?x }");
    assert_eq!(sorted_rows(&results), vec!["?x=ex:carol"]);

    let results = select("SELECT ?x WHERE { ex:alice ^ex:knows ?x }");
    assert_eq!(sorted_rows(&results), vec!["?x=ex:carol"]);
}

#[test]
fn negated_property_set_excludes_predicates() {
    let results = select("SELECT ?x WHERE { ex:dave !(ex:name) ?x }");
    assert_eq!(sorted_rows(&results), vec!["?x=ex:Person"]);
}

#[test]
fn alternative_paths_union_predicates() {
    let results = select("SELECT ?x WHERE { ex:alice (ex:name|ex:age) ?x }");
    assert_eq!(sorted_rows(&results), vec!["?x=30", "?x=Alice"]);
}
