use crate::{dataset, ex, init_tracing, rows, run, PREFIX};
use rdf_eval_common::QueryEvaluationError;
use rdf_eval_engine::{QueryEvaluator, QueryOptions, ServiceHandler};
use rdf_eval_functions::{DefaultFunctionRegistry, FunctionContext, FunctionName, ScalarSparqlOp};
use rdf_eval_model::{Binding, Literal, Multiset, NamedNode, Term, ThinError, ThinResult, Variable};
use spargebra::algebra::GraphPattern;
use std::error::Error;
use std::sync::Arc;

#[derive(Debug)]
struct Double {
    name: FunctionName,
}

impl ScalarSparqlOp for Double {
    fn name(&self) -> &FunctionName {
        &self.name
    }

    fn invoke(&self, args: &[Term], _: &FunctionContext) -> ThinResult<Term> {
        let [Term::Literal(literal)] = args else {
            return ThinError::expected();
        };
        let value = literal.value().parse::<i64>()?;
        Ok(Literal::from(value * 2).into())
    }
}

/// Answers every request with the nickname of Alice.
#[derive(Debug)]
struct Nicknames;

impl ServiceHandler for Nicknames {
    fn handle(
        &self,
        _: &NamedNode,
        _: &GraphPattern,
        _: Option<&str>,
    ) -> Result<Multiset, Box<dyn Error + Send + Sync>> {
        let p = Variable::new_unchecked("p");
        let nick = Variable::new_unchecked("nick");
        let binding = [
            (p.clone(), Term::from(ex("alice"))),
            (nick.clone(), Literal::from("Ally").into()),
        ]
        .into_iter()
        .collect::<Binding>();
        Ok(Multiset::new(vec![p, nick], vec![binding]))
    }
}

#[derive(Debug)]
struct Unreachable;

impl ServiceHandler for Unreachable {
    fn handle(
        &self,
        service_name: &NamedNode,
        _: &GraphPattern,
        _: Option<&str>,
    ) -> Result<Multiset, Box<dyn Error + Send + Sync>> {
        Err(format!("{service_name} is unreachable").into())
    }
}

#[test]
fn custom_functions_can_be_registered() {
    init_tracing();
    let mut registry = DefaultFunctionRegistry::new();
    registry.register_function(Arc::new(Double {
        name: FunctionName::Custom(ex("double")),
    }));
    let evaluator = QueryEvaluator::new(dataset()).with_function_registry(Arc::new(registry));

    let results = run(
        &evaluator,
        "SELECT ?doubled WHERE { ex:alice ex:age ?age BIND(ex:double(?age) AS ?doubled) }",
        &QueryOptions::default(),
    );
    assert_eq!(rows(&results), vec!["?doubled=60"]);
}

#[test]
fn service_solutions_are_joined() {
    init_tracing();
    let evaluator = QueryEvaluator::new(dataset()).with_service_handler(Arc::new(Nicknames));

    let results = run(
        &evaluator,
        "SELECT ?name ?nick WHERE {
            ?p ex:name ?name .
            SERVICE ex:nicknames { ?p ex:nick ?nick }
        }",
        &QueryOptions::default(),
    );
    assert_eq!(rows(&results), vec!["?name=Alice ?nick=Ally"]);
}

#[test]
fn silent_service_failures_yield_no_solutions() {
    init_tracing();
    let evaluator = QueryEvaluator::new(dataset()).with_service_handler(Arc::new(Unreachable));

    let results = run(
        &evaluator,
        "SELECT ?name WHERE {
            ?p ex:name ?name .
            SERVICE SILENT ex:remote { ?p ex:nick ?nick }
        }",
        &QueryOptions::default(),
    );
    assert!(results.is_empty());
}

#[test]
fn service_failures_are_reported() {
    init_tracing();
    let evaluator = QueryEvaluator::new(dataset()).with_service_handler(Arc::new(Unreachable));

    let result = evaluator.evaluate_str(
        &format!("{PREFIX}SELECT * WHERE {{ SERVICE ex:remote {{ ?s ?p ?o }} }}"),
        &QueryOptions::default(),
    );
    assert!(matches!(result, Err(QueryEvaluationError::Service(_))));
}

#[test]
fn services_without_handler_are_unsupported() {
    init_tracing();
    let evaluator = QueryEvaluator::new(dataset());

    let result = evaluator.evaluate_str(
        &format!("{PREFIX}SELECT * WHERE {{ SERVICE ex:remote {{ ?s ?p ?o }} }}"),
        &QueryOptions::default(),
    );
    assert!(
        matches!(result, Err(QueryEvaluationError::UnsupportedService(name)) if name == ex("remote"))
    );
}
