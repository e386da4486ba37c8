use crate::{ex, init_tracing, rows, run, select, sorted_rows, PREFIX};
use rdf_eval_engine::results::QueryResults;
use rdf_eval_engine::{QueryEvaluator, QueryOptions};
use rdf_eval_model::{vocab::rdf, GraphName, Literal, Quad};
use rdf_eval_storage::MemDataset;
use std::sync::Arc;

/// `ex:a` is a car with a speed, `ex:b` is a plane.
fn vehicles() -> QueryEvaluator {
    init_tracing();
    let quads = vec![
        Quad::new(ex("a"), rdf::TYPE, ex("Car"), GraphName::DefaultGraph),
        Quad::new(ex("a"), ex("speed"), Literal::from("100"), GraphName::DefaultGraph),
        Quad::new(ex("b"), rdf::TYPE, ex("Plane"), GraphName::DefaultGraph),
    ];
    QueryEvaluator::new(Arc::new(MemDataset::from_quads(quads)))
}

#[test]
fn vehicles_optional_speed_of_cars() {
    let results = run(
        &vehicles(),
        "SELECT ?s ?speed WHERE { ?s a ex:Car . OPTIONAL { ?s ex:speed ?speed } }",
        &QueryOptions::default(),
    );
    assert_eq!(rows(&results), vec!["?s=ex:a ?speed=100"]);
}

#[test]
fn vehicles_minus_planes() {
    let results = run(
        &vehicles(),
        "SELECT ?s ?t WHERE { ?s a ?t MINUS { ?s a ex:Plane } }",
        &QueryOptions::default(),
    );
    assert_eq!(rows(&results), vec!["?s=ex:a ?t=ex:Car"]);
}

#[test]
fn vehicles_ask_for_plane() {
    let (results, explanation) = vehicles()
        .evaluate_str(
            &format!("{PREFIX}ASK WHERE {{ ?s a ex:Plane }}"),
            &QueryOptions::default().with_statistics(),
        )
        .expect("query succeeds");
    assert_eq!(results, QueryResults::Boolean(true));
    let statistics = explanation.statistics.expect("statistics are collected");
    assert!(statistics
        .iter()
        .filter(|node| node.name == "Bgp")
        .all(|node| node.solutions <= 1));
}

#[test]
fn vehicles_limit_is_prefix_of_eager_result() {
    let evaluator = vehicles();
    let options = QueryOptions::default();
    let all = rows(&run(&evaluator, "SELECT ?s ?t WHERE { ?s a ?t }", &options));
    let limited = rows(&run(
        &evaluator,
        "SELECT ?s ?t WHERE { ?s a ?t } LIMIT 1",
        &options,
    ));
    assert_eq!(all, vec!["?s=ex:a ?t=ex:Car", "?s=ex:b ?t=ex:Plane"]);
    assert_eq!(limited, all[..1]);
}

#[test]
fn optional_keeps_solutions_without_match() {
    let results = select(
        "SELECT ?name ?age WHERE {
            ?p a ex:Person ; ex:name ?name .
            OPTIONAL { ?p ex:age ?age }
        } ORDER BY ?name",
    );
    insta::assert_debug_snapshot!(rows(&results), @r#"
    [
        "?name=Alice ?age=30",
        "?name=Bob ?age=25",
        "?name=Carol",
        "?name=Dave",
    ]
    "#);
}

#[test]
fn optional_filter_only_restricts_the_optional_part() {
    let results = select(
        "SELECT ?name ?age WHERE {
            ?p ex:name ?name .
            OPTIONAL { ?p ex:age ?age FILTER(?age > 26) }
        } ORDER BY ?name",
    );
    insta::assert_debug_snapshot!(rows(&results), @r#"
    [
        "?name=Alice ?age=30",
        "?name=Bob",
        "?name=Carol",
        "?name=Dave",
    ]
    "#);
}

#[test]
fn minus_removes_compatible_solutions() {
    let results = select(
        "SELECT ?name WHERE {
            ?p ex:name ?name .
            MINUS { ?p ex:age ?age }
        } ORDER BY ?name",
    );
    assert_eq!(rows(&results), vec!["?name=Carol", "?name=Dave"]);
}

#[test]
fn minus_without_shared_variables_removes_nothing() {
    let results = select(
        "SELECT ?name WHERE {
            ?p ex:name ?name .
            MINUS { ?x ex:age ?age }
        }",
    );
    assert_eq!(results.len(), 4);
}

#[test]
fn union_concatenates_in_order() {
    let results = select(
        "SELECT ?x WHERE {
            { ex:alice ex:knows ?x }
            UNION
            { ?x ex:knows ex:alice }
        }",
    );
    assert_eq!(rows(&results), vec!["?x=ex:bob", "?x=ex:carol"]);
}

#[test]
fn filter_errors_count_as_false() {
    let results = select(
        "SELECT ?name WHERE {
            ?p ex:name ?name .
            OPTIONAL { ?p ex:age ?age }
            FILTER(?age > 20)
        }",
    );
    assert_eq!(sorted_rows(&results), vec!["?name=Alice", "?name=Bob"]);
}

#[test]
fn bind_extends_solutions() {
    let results = select(
        "SELECT ?name ?next WHERE {
            ?p ex:name ?name ; ex:age ?age .
            BIND(?age + 1 AS ?next)
            FILTER(?next > 30)
        }",
    );
    assert_eq!(rows(&results), vec!["?name=Alice ?next=31"]);
}

#[test]
fn group_by_counts_per_group() {
    let results = select(
        "SELECT ?p (COUNT(?f) AS ?friends) WHERE {
            ?p a ex:Person .
            OPTIONAL { ?p ex:knows ?f }
        } GROUP BY ?p ORDER BY ?p",
    );
    insta::assert_debug_snapshot!(rows(&results), @r#"
    [
        "?p=ex:alice ?friends=1",
        "?p=ex:bob ?friends=1",
        "?p=ex:carol ?friends=1",
        "?p=ex:dave ?friends=0",
    ]
    "#);
}

#[test]
fn having_filters_groups() {
    let results = select(
        "SELECT (SUM(?age) AS ?total) WHERE {
            ?p ex:age ?age .
        } GROUP BY ?p HAVING (SUM(?age) > 26)",
    );
    assert_eq!(rows(&results), vec!["?total=30"]);
}

#[test]
fn values_restrict_the_pattern() {
    let results = select(
        "SELECT ?name WHERE {
            VALUES ?p { ex:bob ex:dave }
            ?p ex:name ?name .
        }",
    );
    assert_eq!(sorted_rows(&results), vec!["?name=Bob", "?name=Dave"]);
}

#[test]
fn distinct_removes_duplicates() {
    let results = select("SELECT DISTINCT ?type WHERE { ?s a ?type }");
    assert_eq!(rows(&results), vec!["?type=ex:Person"]);
}

#[test]
fn order_by_descending_with_offset() {
    let results = select(
        "SELECT ?name WHERE { ?p ex:name ?name } ORDER BY DESC(?name) OFFSET 1 LIMIT 2",
    );
    assert_eq!(rows(&results), vec!["?name=Carol", "?name=Bob"]);
}

#[test]
fn filter_exists_uses_outer_solution() {
    let results = select(
        "SELECT ?name WHERE {
            ?p ex:name ?name .
            FILTER NOT EXISTS { ?p ex:knows ?other }
        }",
    );
    assert_eq!(rows(&results), vec!["?name=Dave"]);
}
