use rdf_eval_common::Dataset;
use rdf_eval_model::{GraphName, GraphNameRef, Literal, NamedNode, NamedOrBlankNode, Quad, TermRef};
use rdf_eval_storage::MemDataset;

fn ex(name: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("http://example.com/{name}"))
}

fn quad(s: &str, p: &str, o: &str, g: Option<&str>) -> Quad {
    Quad::new(
        ex(s),
        ex(p),
        ex(o),
        g.map_or(GraphName::DefaultGraph, |g| GraphName::from(ex(g))),
    )
}

#[test]
fn insert_is_idempotent() {
    let dataset = MemDataset::new();
    assert!(dataset.insert(quad("a", "p", "b", None).as_ref()).unwrap());
    assert!(!dataset.insert(quad("a", "p", "b", None).as_ref()).unwrap());
    assert_eq!(dataset.len().unwrap(), 1);
}

#[test]
fn scan_keeps_insertion_order() {
    let dataset = MemDataset::from_quads([
        quad("c", "p", "x", None),
        quad("a", "p", "y", None),
        quad("b", "q", "z", None),
        quad("b", "p", "w", None),
    ]);

    let objects = dataset
        .quads_for_pattern(None, None, Some(ex("p").as_ref()), None)
        .unwrap()
        .into_iter()
        .map(|quad| quad.object.to_string())
        .collect::<Vec<_>>();
    insta::assert_debug_snapshot!(objects, @r#"
    [
        "<http://example.com/x>",
        "<http://example.com/y>",
        "<http://example.com/w>",
    ]
    "#);
}

#[test]
fn scan_with_all_positions_bound() {
    let dataset = MemDataset::from_quads([quad("a", "p", "b", Some("g")), quad("a", "p", "b", None)]);

    let quads = dataset
        .quads_for_pattern(
            Some(GraphNameRef::DefaultGraph),
            Some(TermRef::from(ex("a").as_ref())),
            Some(ex("p").as_ref()),
            Some(TermRef::from(ex("b").as_ref())),
        )
        .unwrap();
    assert_eq!(quads, vec![quad("a", "p", "b", None)]);
}

#[test]
fn scan_unknown_term_is_empty() {
    let dataset = MemDataset::from_quads([quad("a", "p", "b", None)]);
    let literal = Literal::new_simple_literal("b");
    let quads = dataset
        .quads_for_pattern(None, None, None, Some(TermRef::from(literal.as_ref())))
        .unwrap();
    assert!(quads.is_empty());
}

#[test]
fn removed_quads_are_not_returned() {
    let dataset = MemDataset::from_quads([quad("a", "p", "b", None), quad("a", "p", "c", None)]);
    assert!(dataset.remove(quad("a", "p", "b", None).as_ref()).unwrap());
    assert!(!dataset.remove(quad("a", "p", "b", None).as_ref()).unwrap());

    let quads = dataset.quads_for_pattern(None, None, None, None).unwrap();
    assert_eq!(quads, vec![quad("a", "p", "c", None)]);
}

#[test]
fn named_graphs_are_tracked() {
    let dataset = MemDataset::from_quads([quad("a", "p", "b", Some("g2")), quad("a", "p", "b", Some("g1"))]);
    dataset.insert_named_graph(ex("empty")).unwrap();

    assert_eq!(
        dataset.named_graphs().unwrap(),
        vec![
            NamedOrBlankNode::from(ex("g2")),
            NamedOrBlankNode::from(ex("g1")),
            NamedOrBlankNode::from(ex("empty")),
        ]
    );
    assert!(dataset.contains_named_graph(ex("empty").as_ref().into()).unwrap());
    assert!(!dataset.contains_named_graph(ex("other").as_ref().into()).unwrap());
}

#[test]
fn writers_wait_for_readers() {
    let dataset = MemDataset::from_quads([quad("a", "p", "b", None)]);
    let guard = dataset.lock().read().unwrap();
    assert!(dataset.lock().try_write().is_err());
    drop(guard);
    assert!(dataset.insert(quad("a", "p", "c", None).as_ref()).unwrap());
}
