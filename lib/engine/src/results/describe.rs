use crate::context::EvaluationContext;
use rdf_eval_common::QueryResult;
use rdf_eval_model::{Multiset, Term, Triple};
use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use std::fmt::Debug;

/// Computes the triples that a `DESCRIBE` query returns for its solutions.
pub trait DescribeAlgorithm: Debug + Send + Sync {
    /// Describes every IRI and blank node that is bound in `solutions`.
    fn describe(
        &self,
        context: &EvaluationContext<'_>,
        solutions: &Multiset,
    ) -> QueryResult<Vec<Triple>>;
}

/// The [Concise Bounded Description](https://www.w3.org/submission/CBD/) of a resource without
/// reifications.
///
/// The description of a resource contains all triples that have the resource as subject. If the
/// object of such a triple is a blank node, the description of the blank node is included as well.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConciseBoundedDescription;

impl DescribeAlgorithm for ConciseBoundedDescription {
    fn describe(
        &self,
        context: &EvaluationContext<'_>,
        solutions: &Multiset,
    ) -> QueryResult<Vec<Triple>> {
        let mut visited = FxHashSet::default();
        let mut queue = VecDeque::new();
        for binding in solutions {
            for (_, term) in binding.iter() {
                if matches!(term, Term::NamedNode(_) | Term::BlankNode(_))
                    && visited.insert(term.clone())
                {
                    queue.push_back(term.clone());
                }
            }
        }

        let mut result = Vec::new();
        while let Some(resource) = queue.pop_front() {
            for triple in context.triples_for_pattern(Some(resource.as_ref()), None, None)? {
                if let Term::BlankNode(node) = &triple.object {
                    let node = Term::from(node.clone());
                    if visited.insert(node.clone()) {
                        queue.push_back(node);
                    }
                }
                result.push(triple);
            }
        }
        Ok(result)
    }
}
