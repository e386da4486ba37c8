mod basic;
mod errors;
mod extensions;
mod forms;
mod graphs;
mod lazy;
mod paths;

use rdf_eval_engine::results::QueryResults;
use rdf_eval_engine::{QueryEvaluator, QueryOptions};
use rdf_eval_model::{GraphName, Literal, NamedNode, Quad, Term};
use rdf_eval_storage::MemDataset;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const PREFIX: &str = "PREFIX ex: <http://example.com/>\n";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn ex(name: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("http://example.com/{name}"))
}

/// A small social graph. Alice, Bob, and Carol know each other in a cycle, Dave knows nobody.
/// Carol and Dave have no age. The e-mail addresses are stored in the named graphs `ex:g1` and
/// `ex:g2`.
fn dataset() -> Arc<MemDataset> {
    let rdf_type = NamedNode::new_unchecked("http://www.w3.org/1999/02/22-rdf-syntax-ns#type");
    let mut quads = Vec::new();
    for (person, name, age, knows) in [
        ("alice", "Alice", Some(30), Some("bob")),
        ("bob", "Bob", Some(25), Some("carol")),
        ("carol", "Carol", None, Some("alice")),
        ("dave", "Dave", None, None),
    ] {
        let graph = GraphName::DefaultGraph;
        quads.push(Quad::new(
            ex(person),
            rdf_type.clone(),
            ex("Person"),
            graph.clone(),
        ));
        quads.push(Quad::new(
            ex(person),
            ex("name"),
            Literal::from(name),
            graph.clone(),
        ));
        if let Some(age) = age {
            quads.push(Quad::new(
                ex(person),
                ex("age"),
                Literal::from(age),
                graph.clone(),
            ));
        }
        if let Some(knows) = knows {
            quads.push(Quad::new(ex(person), ex("knows"), ex(knows), graph));
        }
    }
    for (person, graph) in [("alice", "g1"), ("bob", "g2"), ("carol", "g2")] {
        quads.push(Quad::new(
            ex(person),
            ex("email"),
            Literal::from(format!("{person}@example.com")),
            ex(graph),
        ));
    }
    Arc::new(MemDataset::from_quads(quads))
}

fn evaluator() -> QueryEvaluator {
    init_tracing();
    QueryEvaluator::new(dataset())
}

/// Evaluates `query` (with the `ex:` prefix declared) and panics on errors.
fn run(evaluator: &QueryEvaluator, query: &str, options: &QueryOptions) -> QueryResults {
    evaluator
        .evaluate_str(&format!("{PREFIX}{query}"), options)
        .expect("query succeeds")
        .0
}

fn select(query: &str) -> QueryResults {
    run(&evaluator(), query, &QueryOptions::default())
}

/// A compact rendering of terms: `ex:` IRIs are abbreviated and literals are reduced to their
/// lexical value.
fn render(term: &Term) -> String {
    match term {
        Term::NamedNode(node) => node.as_str().replace("http://example.com/", "ex:"),
        Term::BlankNode(node) => format!("_:{}", node.as_str()),
        Term::Literal(literal) => literal.value().to_owned(),
    }
}

/// Renders every solution as a line of `?variable=value` pairs in the order of the variables.
fn rows(results: &QueryResults) -> Vec<String> {
    let QueryResults::Solutions(solutions) = results else {
        panic!("expected solutions");
    };
    solutions
        .iter()
        .map(|binding| {
            solutions
                .variables()
                .iter()
                .filter_map(|variable| {
                    binding
                        .get(variable)
                        .map(|term| format!("{variable}={}", render(term)))
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

fn sorted_rows(results: &QueryResults) -> Vec<String> {
    let mut rows = rows(results);
    rows.sort();
    rows
}
