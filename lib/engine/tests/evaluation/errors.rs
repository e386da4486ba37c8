use crate::{evaluator, ex, select, PREFIX};
use rdf_eval_common::QueryEvaluationError;
use rdf_eval_engine::QueryOptions;
use rdf_eval_logical::{AlgebraNode, AlgebraQuery, Expr, PatternElement, QueryForm, TriplePattern};
use rdf_eval_model::{Literal, Variable};
use std::time::Duration;

fn evaluate_err(query: &str) -> QueryEvaluationError {
    evaluator()
        .evaluate_str(&format!("{PREFIX}{query}"), &QueryOptions::default())
        .expect_err("query fails")
}

#[test]
fn exceeded_timeout_discards_results() {
    let options = QueryOptions::default().with_timeout(Duration::ZERO);
    let result = evaluator().evaluate_str(
        &format!("{PREFIX}SELECT * WHERE {{ ?s ?p ?o }}"),
        &options,
    );
    assert!(matches!(result, Err(QueryEvaluationError::Timeout(_))));
}

#[test]
fn binding_a_bound_variable_fails() {
    let x = Variable::new_unchecked("x");
    let root = AlgebraNode::Extend {
        inner: Box::new(AlgebraNode::Bgp(vec![PatternElement::Triple(
            TriplePattern::new(Variable::new_unchecked("p"), ex("name"), x.clone()),
        )])),
        variable: x.clone(),
        expression: Expr::Constant(Literal::from(1).into()),
    };
    let query = AlgebraQuery {
        root,
        form: QueryForm::Select,
        dataset: None,
        base_iri: None,
    };

    let result = evaluator().evaluate_algebra_query(query, &QueryOptions::default());
    assert!(
        matches!(result, Err(QueryEvaluationError::VariableAlreadyBound(variable)) if variable == x)
    );
}

#[test]
fn bind_propagates_expression_errors() {
    let error = evaluate_err("SELECT ?x WHERE { ?p ex:name ?name BIND(?name + 1 AS ?x) }");
    assert!(matches!(error, QueryEvaluationError::Expression(_)));
}

#[test]
fn bind_of_unbound_variable_leaves_target_unbound() {
    let results = select("SELECT ?name ?x WHERE { ?p ex:name ?name BIND(?missing AS ?x) }");
    assert_eq!(results.len(), 4);
}

#[test]
fn syntax_errors_are_reported() {
    let error = evaluate_err("SELECT ?x WHERE { ?x ");
    assert!(matches!(error, QueryEvaluationError::Parsing(_)));
}

#[test]
fn unknown_function_in_filter_is_absorbed() {
    let results = select("SELECT ?p WHERE { ?p ex:name ?name FILTER(ex:unknown(?name)) }");
    assert!(results.is_empty());
}

#[test]
fn unknown_function_in_bind_fails() {
    let error = evaluate_err("SELECT ?x WHERE { ?p ex:name ?name BIND(ex:unknown(?name) AS ?x) }");
    assert!(
        matches!(error, QueryEvaluationError::UnknownFunction(name) if name == ex("unknown"))
    );
}
