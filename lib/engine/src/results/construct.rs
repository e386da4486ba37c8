use rdf_eval_logical::{TermOrVariable, TriplePattern};
use rdf_eval_model::{BlankNode, Binding, Multiset, Subject, Term, Triple};
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt::Debug;

/// Turns the solutions of a `CONSTRUCT` query into triples.
pub trait ConstructTemplate: Debug + Send + Sync {
    /// Appends the triples for a single solution to `output`.
    ///
    /// Triples that cannot be instantiated (e.g., because a variable is unbound or a literal ends
    /// up in the subject position) are skipped.
    fn instantiate(&self, binding: &Binding, output: &mut Vec<Triple>);
}

/// Instantiates a list of triple patterns for every solution.
///
/// Blank nodes of the template are replaced with fresh blank nodes for every solution, while
/// the same blank node label refers to the same fresh blank node within one solution.
#[derive(Debug, Clone)]
pub struct TemplateConstructor {
    template: Vec<TriplePattern>,
}

impl TemplateConstructor {
    pub fn new(template: Vec<TriplePattern>) -> Self {
        Self { template }
    }
}

impl ConstructTemplate for TemplateConstructor {
    fn instantiate(&self, binding: &Binding, output: &mut Vec<Triple>) {
        let mut blank_nodes = FxHashMap::default();
        for pattern in &self.template {
            match instantiate_pattern(pattern, binding, &mut blank_nodes) {
                Some(triple) => output.push(triple),
                None => tracing::debug!(%pattern, "Skipping template triple"),
            }
        }
    }
}

fn instantiate_pattern(
    pattern: &TriplePattern,
    binding: &Binding,
    blank_nodes: &mut FxHashMap<BlankNode, BlankNode>,
) -> Option<Triple> {
    let subject = match instantiate_term(&pattern.subject, binding, blank_nodes)? {
        Term::NamedNode(node) => Subject::from(node),
        Term::BlankNode(node) => Subject::from(node),
        _ => return None,
    };
    let Term::NamedNode(predicate) = instantiate_term(&pattern.predicate, binding, blank_nodes)?
    else {
        return None;
    };
    let object = instantiate_term(&pattern.object, binding, blank_nodes)?;
    Some(Triple::new(subject, predicate, object))
}

fn instantiate_term(
    position: &TermOrVariable,
    binding: &Binding,
    blank_nodes: &mut FxHashMap<BlankNode, BlankNode>,
) -> Option<Term> {
    match position {
        TermOrVariable::Term(Term::BlankNode(node)) => {
            Some(blank_nodes.entry(node.clone()).or_default().clone().into())
        }
        TermOrVariable::Term(term) => Some(term.clone()),
        TermOrVariable::Variable(variable) => binding.get(variable).cloned(),
    }
}

/// Instantiates `template` for all `solutions`. Each triple is only returned once.
pub fn construct_triples(template: &dyn ConstructTemplate, solutions: &Multiset) -> Vec<Triple> {
    let mut triples = Vec::new();
    for binding in solutions {
        template.instantiate(binding, &mut triples);
    }

    let mut seen = FxHashSet::default();
    triples.retain(|triple| seen.insert(triple.clone()));
    triples
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdf_eval_model::{Literal, NamedNode, Variable};

    fn ex(name: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("http://example.com/{name}"))
    }

    fn var(name: &str) -> Variable {
        Variable::new_unchecked(name)
    }

    #[test]
    fn blank_nodes_are_fresh_per_solution() {
        let node = BlankNode::new_unchecked("n");
        let template = TemplateConstructor::new(vec![
            TriplePattern::new(var("s"), ex("p"), Term::from(node.clone())),
            TriplePattern::new(Term::from(node), ex("q"), var("o")),
        ]);
        let solutions = Multiset::new(
            vec![var("s"), var("o")],
            vec![
                Binding::new()
                    .with(var("s"), ex("a").into())
                    .with(var("o"), Literal::from(1).into()),
                Binding::new()
                    .with(var("s"), ex("b").into())
                    .with(var("o"), Literal::from(2).into()),
            ],
        );

        let triples = construct_triples(&template, &solutions);
        assert_eq!(triples.len(), 4);
        assert_eq!(triples[0].object, Term::from(triples[1].subject.clone()));
        assert_eq!(triples[2].object, Term::from(triples[3].subject.clone()));
        assert_ne!(triples[0].object, triples[2].object);
    }

    #[test]
    fn invalid_triples_are_skipped() {
        let template = TemplateConstructor::new(vec![
            TriplePattern::new(var("o"), ex("p"), var("s")),
            TriplePattern::new(var("s"), ex("p"), var("unbound")),
            TriplePattern::new(var("s"), ex("p"), var("o")),
        ]);
        let solutions = Multiset::from_binding(
            Binding::new()
                .with(var("s"), ex("a").into())
                .with(var("o"), Literal::from(1).into()),
        );

        let triples = construct_triples(&template, &solutions);
        assert_eq!(triples, vec![Triple::new(ex("a"), ex("p"), Literal::from(1))]);
    }

    #[test]
    fn duplicate_triples_are_removed() {
        let template =
            TemplateConstructor::new(vec![TriplePattern::new(ex("a"), ex("p"), var("o"))]);
        let binding = Binding::new().with(var("o"), ex("b").into());
        let solutions = Multiset::new(vec![var("o")], vec![binding.clone(), binding]);
        assert_eq!(construct_triples(&template, &solutions).len(), 1);
    }
}
