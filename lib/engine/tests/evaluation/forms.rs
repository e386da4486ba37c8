use crate::{evaluator, ex, run, PREFIX};
use rdf_eval_engine::results::QueryResults;
use rdf_eval_engine::QueryOptions;
use rdf_eval_model::{Subject, Triple};

fn triples(results: QueryResults) -> Vec<Triple> {
    let QueryResults::Graph(triples) = results else {
        panic!("expected triples");
    };
    triples
}

#[test]
fn construct_instantiates_template_per_solution() {
    let results = run(
        &evaluator(),
        "CONSTRUCT { ?p ex:label ?name ; ex:years ?age } WHERE {
            ?p ex:name ?name .
            OPTIONAL { ?p ex:age ?age }
        }",
        &QueryOptions::default(),
    );
    let triples = triples(results);
    assert_eq!(triples.len(), 6);
    assert_eq!(
        triples
            .iter()
            .filter(|triple| triple.predicate == ex("years"))
            .count(),
        2
    );
}

#[test]
fn describe_returns_description_of_resources() {
    let results = run(
        &evaluator(),
        "DESCRIBE ?p WHERE { ?p ex:name \"Dave\" }",
        &QueryOptions::default(),
    );
    let triples = triples(results);
    assert_eq!(triples.len(), 2);
    assert!(triples
        .iter()
        .all(|triple| triple.subject == Subject::from(ex("dave"))));
}

#[test]
fn ask_reports_whether_a_solution_exists() {
    let evaluator = evaluator();
    let options = QueryOptions::default();
    assert_eq!(
        run(&evaluator, "ASK { ex:alice ex:knows ex:bob }", &options),
        QueryResults::Boolean(true)
    );
    assert_eq!(
        run(&evaluator, "ASK { ex:dave ex:knows ?someone }", &options),
        QueryResults::Boolean(false)
    );
}

#[test]
fn explanation_contains_both_plans() {
    let (_, explanation) = evaluator()
        .evaluate_str(
            &format!("{PREFIX}SELECT ?name WHERE {{ ?p a ex:Person ; ex:name ?name }}"),
            &QueryOptions::default(),
        )
        .expect("query succeeds");

    let rendered = explanation.to_string();
    assert!(rendered.contains("Initial plan"));
    assert!(rendered.contains("Optimized plan"));
    assert!(explanation.statistics.is_none());
}
