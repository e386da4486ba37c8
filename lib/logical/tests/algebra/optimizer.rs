use rdf_eval_logical::{AlgebraBuilder, AlgebraNode, AlgebraOptimizer, OptimizationLevel};
use spargebra::Query;

fn optimize(query: &str, level: OptimizationLevel) -> AlgebraNode {
    let query = Query::parse(query, None).expect("query is valid");
    let query = AlgebraBuilder::new()
        .build_query(&query)
        .expect("query can be lowered");
    let (node, _) = AlgebraOptimizer::new(level, None)
        .optimize(query.root)
        .expect("optimization succeeds");
    node
}

#[test]
fn full_optimization_reorders_and_limits() {
    let node = optimize(
        "PREFIX ex: <http://example.com/>
        SELECT ?s ?o WHERE {
            ?s ?p ?o .
            ?s a ex:Car .
        } LIMIT 10",
        OptimizationLevel::Full,
    );
    insta::assert_snapshot!(node, @r"
    Slice: offset=0, limit=10
      Limit: 10
        Project: ?s ?o
          Bgp
            ?s <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://example.com/Car>
            ?s ?p ?o
    ");
}

#[test]
fn no_optimization_keeps_the_tree() {
    let node = optimize(
        "PREFIX ex: <http://example.com/>
        ASK { ?s ?p ?o . ?s a ex:Car . }",
        OptimizationLevel::None,
    );
    insta::assert_snapshot!(node, @r"
    Ask
      Bgp
        ?s ?p ?o
        ?s <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://example.com/Car>
    ");
}

#[test]
fn report_lists_rules_and_cross_products() {
    let query = Query::parse(
        "PREFIX ex: <http://example.com/>
        SELECT * WHERE { ?a ex:p ?b . ?c ex:q ?d }",
        None,
    )
    .expect("query is valid");
    let query = AlgebraBuilder::new().build_query(&query).expect("query can be lowered");
    let (_, report) = AlgebraOptimizer::new(OptimizationLevel::Full, None)
        .optimize(query.root)
        .expect("optimization succeeds");
    assert_eq!(
        report.applied_rules,
        vec![
            "bgp-reordering",
            "cross-product-detection",
            "ask-specialization",
            "limit-specialization"
        ]
    );
    assert_eq!(report.cross_products.len(), 1);
}
