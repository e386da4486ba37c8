use crate::{evaluator, rows, run, sorted_rows, PREFIX};
use rdf_eval_engine::results::QueryResults;
use rdf_eval_engine::sparql::OptimizationLevel;
use rdf_eval_engine::QueryOptions;

#[test]
fn ask_stops_after_first_solution() {
    let (results, explanation) = evaluator()
        .evaluate_str(
            &format!("{PREFIX}ASK {{ ?p a ex:Person }}"),
            &QueryOptions::default().with_statistics(),
        )
        .expect("query succeeds");

    assert_eq!(results, QueryResults::Boolean(true));
    let statistics = explanation.statistics.expect("statistics are collected");
    let bgp = statistics
        .iter()
        .find(|node| node.name == "Bgp")
        .expect("bgp is evaluated");
    assert_eq!(bgp.solutions, 1);
}

#[test]
fn limit_returns_prefix_of_unlimited_results() {
    let evaluator = evaluator();
    let options = QueryOptions::default();
    let all = rows(&run(
        &evaluator,
        "SELECT ?s ?o WHERE { ?s ex:knows ?o }",
        &options,
    ));

    for limit in 0..=all.len() {
        let limited = rows(&run(
            &evaluator,
            &format!("SELECT ?s ?o WHERE {{ ?s ex:knows ?o }} LIMIT {limit}"),
            &options,
        ));
        assert_eq!(limited, all[..limit]);
    }
}

#[test]
fn offset_and_limit_slice_results() {
    let evaluator = evaluator();
    let options = QueryOptions::default();
    let all = rows(&run(
        &evaluator,
        "SELECT ?p ?name WHERE { ?p ex:name ?name }",
        &options,
    ));
    let sliced = rows(&run(
        &evaluator,
        "SELECT ?p ?name WHERE { ?p ex:name ?name } OFFSET 1 LIMIT 2",
        &options,
    ));
    assert_eq!(sliced, all[1..3]);
}

const LEVELS: [OptimizationLevel; 3] = [
    OptimizationLevel::None,
    OptimizationLevel::Default,
    OptimizationLevel::Full,
];

#[test]
fn optimization_levels_agree() {
    let evaluator = evaluator();
    let queries = [
        "SELECT ?name ?friend WHERE {
            ?p ex:name ?name .
            ?p a ex:Person .
            OPTIONAL { ?p ex:knows ?f . ?f ex:name ?friend }
            FILTER(?name != \"Bob\")
        }",
        "SELECT ?s ?c WHERE { ?s ex:knows ?o BIND(1 AS ?c) ?s ex:name ?n }",
        "SELECT ?name ?next WHERE {
            ?p ex:name ?name .
            OPTIONAL { ?p ex:age ?age }
            BIND(COALESCE(?age + 1, 0) AS ?next)
        }",
        "SELECT ?p ?friends WHERE {
            ?p a ex:Person .
            { SELECT ?p (COUNT(?f) AS ?friends) WHERE { ?p ex:knows ?f } GROUP BY ?p }
        }",
        "SELECT ?x ?n WHERE { ?x ex:knows+ ?y . ?y ex:name ?n }",
    ];

    for query in queries {
        let results = LEVELS.map(|level| {
            sorted_rows(&run(
                &evaluator,
                query,
                &QueryOptions::default().with_optimization_level(level),
            ))
        });
        assert!(!results[0].is_empty(), "{query}");
        assert_eq!(results[0], results[1], "{query}");
        assert_eq!(results[1], results[2], "{query}");
    }
}

#[test]
fn bind_without_variables_runs_per_solution() {
    let evaluator = evaluator();
    for level in LEVELS {
        let results = run(
            &evaluator,
            "SELECT DISTINCT ?b WHERE { ?s ex:knows ?o BIND(BNODE() AS ?b) }",
            &QueryOptions::default().with_optimization_level(level),
        );
        assert_eq!(results.len(), 3);
    }
}

#[test]
fn failing_bind_after_empty_pattern_is_not_evaluated() {
    let evaluator = evaluator();
    for level in LEVELS {
        let results = run(
            &evaluator,
            "SELECT * WHERE { ?s ex:missing ?o BIND(1/0 AS ?x) }",
            &QueryOptions::default().with_optimization_level(level),
        );
        assert!(results.is_empty());
    }
}
