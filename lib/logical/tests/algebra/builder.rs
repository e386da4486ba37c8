use rdf_eval_logical::{AlgebraBuilder, AlgebraNode, AlgebraQuery};
use spargebra::Query;

fn build(query: &str) -> AlgebraQuery {
    let query = Query::parse(query, None).expect("query is valid");
    AlgebraBuilder::new()
        .build_query(&query)
        .expect("query can be lowered")
}

#[test]
fn optional_becomes_left_join() {
    let query = build(
        "PREFIX ex: <http://example.com/>
        SELECT ?s ?speed WHERE {
            ?s a ex:Car .
            OPTIONAL { ?s ex:speed ?speed }
        }",
    );
    insta::assert_snapshot!(query.root, @r"
    Project: ?s ?speed
      LeftJoin
        Bgp
          ?s <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://example.com/Car>
        Bgp
          ?s <http://example.com/speed> ?speed
    ");
}

#[test]
fn filters_and_binds_are_folded_into_bgp() {
    let query = build(
        "PREFIX ex: <http://example.com/>
        SELECT ?s ?double WHERE {
            ?s ex:value ?v .
            FILTER(?v > 2)
            BIND(?v * 2 AS ?double)
        }",
    );
    let AlgebraNode::Project { inner, .. } = query.root else {
        panic!("expected a projection");
    };
    assert!(matches!(*inner, AlgebraNode::Bgp(_) | AlgebraNode::Filter { .. }));
}

#[test]
fn closures_have_dedicated_nodes() {
    let query = build(
        "PREFIX ex: <http://example.com/>
        SELECT * WHERE { ex:a ex:knows* ?o }",
    );
    insta::assert_snapshot!(query.root, @r"
    Project: ?o
      ZeroOrMorePath: <http://example.com/a> <http://example.com/knows> ?o
    ");
}

#[test]
fn inverse_predicate_becomes_triple_pattern() {
    let query = build(
        "PREFIX ex: <http://example.com/>
        SELECT ?a ?b WHERE { ?a ^ex:knows ?b }",
    );
    insta::assert_snapshot!(query.root, @r"
    Project: ?a ?b
      Bgp
        ?b <http://example.com/knows> ?a
    ");
}

#[test]
fn aggregation_with_having() {
    let query = build(
        "PREFIX ex: <http://example.com/>
        SELECT ?s (COUNT(?o) AS ?count) WHERE { ?s ex:p ?o }
        GROUP BY ?s
        HAVING (COUNT(?o) > 1)",
    );
    let root = query.root.to_string();
    assert!(root.contains("Having"), "{root}");
    assert!(root.contains("Group: [?s]"), "{root}");
}
