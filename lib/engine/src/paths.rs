//! Evaluation of [property paths](https://www.w3.org/TR/sparql11-query/#propertypaths).

use crate::context::EvaluationContext;
use rdf_eval_common::QueryResult;
use rdf_eval_logical::{PathExpression, TermOrVariable};
use rdf_eval_model::{Binding, Multiset, NamedNode, Term, Variable};
use rustc_hash::FxHashSet;
use std::collections::VecDeque;

/// Evaluates a property path between two endpoints.
///
/// Each endpoint is either a fixed term or a variable. The solutions only bind the endpoint
/// variables. If both endpoints are fixed, the result is either [Multiset::Identity] (the
/// endpoints are connected) or [Multiset::Null].
///
/// Closures (`*` and `+`) are computed with a breadth-first search per start node that keeps track
/// of the visited nodes. Hence, they terminate on cyclic graphs and yield every pair of connected
/// nodes only once.
pub struct PathEvaluator<'c, 'a> {
    context: &'c mut EvaluationContext<'a>,
}

impl<'c, 'a> PathEvaluator<'c, 'a> {
    pub fn new(context: &'c mut EvaluationContext<'a>) -> Self {
        Self { context }
    }

    pub fn evaluate(
        &mut self,
        subject: &TermOrVariable,
        path: &PathExpression,
        object: &TermOrVariable,
    ) -> QueryResult<Multiset> {
        let bindings = self.evaluate_bindings(subject, path, object)?;
        Ok(Multiset::new(endpoint_variables(subject, object), bindings))
    }

    /// Evaluates `ZeroLengthPath`, which relates every node to itself.
    pub fn evaluate_zero_length(
        &mut self,
        subject: &TermOrVariable,
        object: &TermOrVariable,
    ) -> QueryResult<Multiset> {
        let bindings = self.zero_length(subject, object)?;
        Ok(Multiset::new(endpoint_variables(subject, object), bindings))
    }

    fn evaluate_bindings(
        &mut self,
        subject: &TermOrVariable,
        path: &PathExpression,
        object: &TermOrVariable,
    ) -> QueryResult<Vec<Binding>> {
        match path {
            PathExpression::Property { predicate, inverse } => {
                if *inverse {
                    self.match_edges(object, predicate, subject)
                } else {
                    self.match_edges(subject, predicate, object)
                }
            }
            PathExpression::Inverse(inner) => self.evaluate_bindings(object, inner, subject),
            PathExpression::Sequence(lhs, rhs) => self.sequence(subject, lhs, rhs, object),
            PathExpression::Alternative(lhs, rhs) => {
                let mut result = self.evaluate_bindings(subject, lhs, object)?;
                result.extend(self.evaluate_bindings(subject, rhs, object)?);
                Ok(result)
            }
            PathExpression::ZeroOrOne(inner) => {
                let mut result = self.zero_length(subject, object)?;
                result.extend(self.evaluate_bindings(subject, inner, object)?);
                let mut seen = FxHashSet::default();
                result.retain(|binding| seen.insert(binding.clone()));
                Ok(result)
            }
            PathExpression::ZeroOrMore(inner) => self.closure(subject, inner, object, true),
            PathExpression::OneOrMore(inner) => self.closure(subject, inner, object, false),
            PathExpression::NegatedSet { forward, inverse } => {
                self.negated_set(subject, forward, inverse, object)
            }
            PathExpression::FixedLength(inner, length) => {
                if *length == 0 {
                    return self.zero_length(subject, object);
                }
                let mut unrolled = inner.as_ref().clone();
                for _ in 1..*length {
                    unrolled = PathExpression::Sequence(Box::new(unrolled), inner.clone());
                }
                self.evaluate_bindings(subject, &unrolled, object)
            }
        }
    }

    /// Evaluates `subject predicate object` as a triple pattern.
    fn match_edges(
        &mut self,
        subject: &TermOrVariable,
        predicate: &NamedNode,
        object: &TermOrVariable,
    ) -> QueryResult<Vec<Binding>> {
        let triples = self.context.triples_for_pattern(
            subject.as_term().map(Term::as_ref),
            Some(predicate.as_ref()),
            object.as_term().map(Term::as_ref),
        )?;

        let mut result = Vec::new();
        for triple in triples {
            self.context.tick()?;
            if let Some(binding) = unify(subject, triple.subject.into(), object, triple.object) {
                result.push(binding);
            }
        }
        Ok(result)
    }

    /// Joins both halves of the sequence over a fresh intermediate variable that is projected
    /// away afterward.
    fn sequence(
        &mut self,
        subject: &TermOrVariable,
        lhs: &PathExpression,
        rhs: &PathExpression,
        object: &TermOrVariable,
    ) -> QueryResult<Vec<Binding>> {
        let middle = self.context.fresh_variable();
        let variables = endpoint_variables(subject, object);

        let mut result = Vec::new();
        let middle_endpoint = TermOrVariable::Variable(middle.clone());
        for left in self.evaluate_bindings(subject, lhs, &middle_endpoint)? {
            let Some(middle_term) = left.get(&middle).cloned() else {
                continue;
            };
            let object = object.substitute(&left);
            for right in self.evaluate_bindings(&TermOrVariable::Term(middle_term), rhs, &object)? {
                if let Some(merged) = left.merge(&right) {
                    result.push(merged.project(&variables));
                }
            }
        }
        Ok(result)
    }

    fn negated_set(
        &mut self,
        subject: &TermOrVariable,
        forward: &[NamedNode],
        inverse: &[NamedNode],
        object: &TermOrVariable,
    ) -> QueryResult<Vec<Binding>> {
        let mut result = Vec::new();
        if !forward.is_empty() {
            let triples = self.context.triples_for_pattern(
                subject.as_term().map(Term::as_ref),
                None,
                object.as_term().map(Term::as_ref),
            )?;
            for triple in triples {
                self.context.tick()?;
                if forward.contains(&triple.predicate) {
                    continue;
                }
                if let Some(binding) = unify(subject, triple.subject.into(), object, triple.object)
                {
                    result.push(binding);
                }
            }
        }
        if !inverse.is_empty() {
            let triples = self.context.triples_for_pattern(
                object.as_term().map(Term::as_ref),
                None,
                subject.as_term().map(Term::as_ref),
            )?;
            for triple in triples {
                self.context.tick()?;
                if inverse.contains(&triple.predicate) {
                    continue;
                }
                if let Some(binding) = unify(subject, triple.object, object, triple.subject.into())
                {
                    result.push(binding);
                }
            }
        }
        Ok(result)
    }

    /// Relates every node to itself.
    ///
    /// If both endpoints are variables, the nodes are the subjects and objects of the active
    /// graph. A fixed endpoint is always related to itself, even if it does not occur in the
    /// active graph.
    fn zero_length(
        &mut self,
        subject: &TermOrVariable,
        object: &TermOrVariable,
    ) -> QueryResult<Vec<Binding>> {
        match (subject, object) {
            (TermOrVariable::Term(subject), TermOrVariable::Term(object)) => {
                Ok(if subject == object {
                    vec![Binding::new()]
                } else {
                    Vec::new()
                })
            }
            (TermOrVariable::Term(term), TermOrVariable::Variable(variable))
            | (TermOrVariable::Variable(variable), TermOrVariable::Term(term)) => {
                Ok(vec![Binding::new().with(variable.clone(), term.clone())])
            }
            (TermOrVariable::Variable(subject), TermOrVariable::Variable(object)) => Ok(self
                .context
                .graph_nodes()?
                .into_iter()
                .map(|node| {
                    Binding::new()
                        .with(subject.clone(), node.clone())
                        .with(object.clone(), node)
                })
                .collect()),
        }
    }

    fn closure(
        &mut self,
        subject: &TermOrVariable,
        path: &PathExpression,
        object: &TermOrVariable,
        reflexive: bool,
    ) -> QueryResult<Vec<Binding>> {
        match (subject, object) {
            (TermOrVariable::Term(start), object) => {
                let reached = self.reachable(start, path, true, reflexive)?;
                Ok(match object {
                    TermOrVariable::Term(end) => {
                        if reached.contains(end) {
                            vec![Binding::new()]
                        } else {
                            Vec::new()
                        }
                    }
                    TermOrVariable::Variable(variable) => reached
                        .into_iter()
                        .map(|term| Binding::new().with(variable.clone(), term))
                        .collect(),
                })
            }
            (TermOrVariable::Variable(variable), TermOrVariable::Term(end)) => Ok(self
                .reachable(end, path, false, reflexive)?
                .into_iter()
                .map(|term| Binding::new().with(variable.clone(), term))
                .collect()),
            (TermOrVariable::Variable(subject), TermOrVariable::Variable(object)) => {
                let starts = if reflexive {
                    self.context.graph_nodes()?
                } else {
                    self.path_starts(path)?
                };

                let mut result = Vec::new();
                for start in starts {
                    let reached = self.reachable(&start, path, true, reflexive)?;
                    if subject == object {
                        if reached.contains(&start) {
                            result.push(Binding::new().with(subject.clone(), start));
                        }
                        continue;
                    }
                    for end in reached {
                        result.push(
                            Binding::new()
                                .with(subject.clone(), start.clone())
                                .with(object.clone(), end),
                        );
                    }
                }
                Ok(result)
            }
        }
    }

    /// Returns the distinct nodes that have an outgoing `path`.
    fn path_starts(&mut self, path: &PathExpression) -> QueryResult<Vec<Term>> {
        let start = self.context.fresh_variable();
        let end = self.context.fresh_variable();
        let bindings = self.evaluate_bindings(
            &TermOrVariable::Variable(start.clone()),
            path,
            &TermOrVariable::Variable(end),
        )?;
        Ok(distinct_values(bindings, &start))
    }

    /// Breadth-first search from `start` along `path` (or along its inverse if `forward` is
    /// `false`). The start node is only part of the result if `reflexive` is set or a cycle leads
    /// back to it.
    fn reachable(
        &mut self,
        start: &Term,
        path: &PathExpression,
        forward: bool,
        reflexive: bool,
    ) -> QueryResult<Vec<Term>> {
        let next = TermOrVariable::Variable(self.context.fresh_variable());
        let mut visited = FxHashSet::default();
        let mut result = Vec::new();
        let mut queue = VecDeque::new();

        if reflexive {
            visited.insert(start.clone());
            result.push(start.clone());
        }
        queue.push_back(start.clone());

        while let Some(current) = queue.pop_front() {
            self.context.tick()?;
            let current = TermOrVariable::Term(current);
            let bindings = if forward {
                self.evaluate_bindings(&current, path, &next)?
            } else {
                self.evaluate_bindings(&next, path, &current)?
            };

            let TermOrVariable::Variable(next_variable) = &next else {
                continue;
            };
            for term in distinct_values(bindings, next_variable) {
                if visited.insert(term.clone()) {
                    result.push(term.clone());
                    queue.push_back(term);
                }
            }
        }
        Ok(result)
    }
}

/// The distinct variables of both endpoints, subject first.
pub(crate) fn endpoint_variables(subject: &TermOrVariable, object: &TermOrVariable) -> Vec<Variable> {
    let mut result = Vec::new();
    for endpoint in [subject, object] {
        if let Some(variable) = endpoint.as_variable() {
            if !result.contains(variable) {
                result.push(variable.clone());
            }
        }
    }
    result
}

/// Binds the endpoint variables to the values of a matched edge. Fails if an endpoint is fixed to
/// a different term or the same variable would be bound to two different terms.
fn unify(
    subject: &TermOrVariable,
    subject_value: Term,
    object: &TermOrVariable,
    object_value: Term,
) -> Option<Binding> {
    let mut binding = Binding::new();
    for (endpoint, value) in [(subject, subject_value), (object, object_value)] {
        match endpoint {
            TermOrVariable::Term(term) => {
                if term != &value {
                    return None;
                }
            }
            TermOrVariable::Variable(variable) => match binding.get(variable) {
                Some(existing) if existing != &value => return None,
                Some(_) => {}
                None => {
                    binding.insert(variable.clone(), value);
                }
            },
        }
    }
    Some(binding)
}

fn distinct_values(bindings: Vec<Binding>, variable: &Variable) -> Vec<Term> {
    let mut seen = FxHashSet::default();
    bindings
        .into_iter()
        .filter_map(|mut binding| binding.remove(variable))
        .filter(|term| seen.insert(term.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExecutionTimer;
    use rdf_eval_common::{Dataset, StorageError};
    use rdf_eval_model::{
        GraphName, GraphNameRef, NamedNodeRef, NamedOrBlankNode, NamedOrBlankNodeRef, Quad,
        TermRef,
    };

    /// A dataset that answers every pattern by filtering a list of default graph quads.
    #[derive(Debug)]
    struct ListDataset(Vec<Quad>);

    impl Dataset for ListDataset {
        fn quads_for_pattern(
            &self,
            _graph_name: Option<GraphNameRef<'_>>,
            subject: Option<TermRef<'_>>,
            predicate: Option<NamedNodeRef<'_>>,
            object: Option<TermRef<'_>>,
        ) -> Result<Vec<Quad>, StorageError> {
            Ok(self
                .0
                .iter()
                .filter(|quad| {
                    subject.map_or(true, |s| TermRef::from(quad.subject.as_ref()) == s)
                        && predicate.map_or(true, |p| quad.predicate.as_ref() == p)
                        && object.map_or(true, |o| quad.object.as_ref() == o)
                })
                .cloned()
                .collect())
        }

        fn named_graphs(&self) -> Result<Vec<NamedOrBlankNode>, StorageError> {
            Ok(Vec::new())
        }

        fn contains_named_graph(
            &self,
            _graph_name: NamedOrBlankNodeRef<'_>,
        ) -> Result<bool, StorageError> {
            Ok(false)
        }
    }

    fn ex(name: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("http://example.com/{name}"))
    }

    fn term(name: &str) -> TermOrVariable {
        TermOrVariable::Term(ex(name).into())
    }

    fn var(name: &str) -> TermOrVariable {
        TermOrVariable::Variable(Variable::new_unchecked(name))
    }

    /// a -p-> b -p-> c -p-> a, c -q-> d
    fn cycle() -> ListDataset {
        ListDataset(
            [("a", "p", "b"), ("b", "p", "c"), ("c", "p", "a"), ("c", "q", "d")]
                .into_iter()
                .map(|(s, p, o)| Quad::new(ex(s), ex(p), ex(o), GraphName::DefaultGraph))
                .collect(),
        )
    }

    fn evaluate(
        dataset: &ListDataset,
        subject: TermOrVariable,
        path: PathExpression,
        object: TermOrVariable,
    ) -> Multiset {
        let mut context =
            EvaluationContext::try_new(dataset, None, false, ExecutionTimer::start(None, 16))
                .unwrap();
        PathEvaluator::new(&mut context)
            .evaluate(&subject, &path, &object)
            .unwrap()
    }

    fn values(multiset: &Multiset, variable: &str) -> Vec<String> {
        let variable = Variable::new_unchecked(variable);
        multiset
            .iter()
            .map(|binding| binding.get(&variable).map(ToString::to_string).unwrap_or_default())
            .collect()
    }

    #[test]
    fn one_or_more_terminates_on_cycles() {
        let dataset = cycle();
        let result = evaluate(
            &dataset,
            term("a"),
            PathExpression::OneOrMore(Box::new(PathExpression::property(ex("p")))),
            var("x"),
        );
        assert_eq!(
            values(&result, "x"),
            vec![
                "<http://example.com/b>",
                "<http://example.com/c>",
                "<http://example.com/a>"
            ]
        );
    }

    #[test]
    fn one_or_more_excludes_start_without_cycle() {
        let dataset = cycle();
        let result = evaluate(
            &dataset,
            term("c"),
            PathExpression::OneOrMore(Box::new(PathExpression::property(ex("q")))),
            var("x"),
        );
        assert_eq!(values(&result, "x"), vec!["<http://example.com/d>"]);
    }

    #[test]
    fn zero_or_more_contains_start() {
        let dataset = cycle();
        let result = evaluate(
            &dataset,
            term("d"),
            PathExpression::ZeroOrMore(Box::new(PathExpression::property(ex("p")))),
            var("x"),
        );
        assert_eq!(values(&result, "x"), vec!["<http://example.com/d>"]);
    }

    #[test]
    fn zero_or_more_of_unknown_term_is_itself() {
        let dataset = cycle();
        let result = evaluate(
            &dataset,
            term("unknown"),
            PathExpression::ZeroOrMore(Box::new(PathExpression::property(ex("p")))),
            term("unknown"),
        );
        assert_eq!(result, Multiset::Identity);
    }

    #[test]
    fn both_endpoints_bound_is_reachability() {
        let dataset = cycle();
        let path = PathExpression::OneOrMore(Box::new(PathExpression::property(ex("p"))));
        assert_eq!(
            evaluate(&dataset, term("a"), path.clone(), term("c")),
            Multiset::Identity
        );
        assert_eq!(
            evaluate(&dataset, term("a"), path, term("d")),
            Multiset::Null
        );
    }

    #[test]
    fn free_zero_or_more_ranges_over_graph_nodes() {
        let dataset = cycle();
        let result = evaluate(
            &dataset,
            var("x"),
            PathExpression::ZeroOrMore(Box::new(PathExpression::property(ex("q")))),
            var("y"),
        );
        assert_eq!(
            values(&result, "x"),
            vec![
                "<http://example.com/a>",
                "<http://example.com/b>",
                "<http://example.com/c>",
                "<http://example.com/c>",
                "<http://example.com/d>"
            ]
        );
        assert_eq!(
            values(&result, "y"),
            vec![
                "<http://example.com/a>",
                "<http://example.com/b>",
                "<http://example.com/c>",
                "<http://example.com/d>",
                "<http://example.com/d>"
            ]
        );
    }

    #[test]
    fn sequence_hides_intermediate_variable() {
        let dataset = cycle();
        let result = evaluate(
            &dataset,
            term("b"),
            PathExpression::Sequence(
                Box::new(PathExpression::property(ex("p"))),
                Box::new(PathExpression::property(ex("q"))),
            ),
            var("x"),
        );
        assert_eq!(result.variables(), &[Variable::new_unchecked("x")]);
        assert_eq!(values(&result, "x"), vec!["<http://example.com/d>"]);
    }

    #[test]
    fn negated_set_skips_excluded_predicates() {
        let dataset = cycle();
        let result = evaluate(
            &dataset,
            term("c"),
            PathExpression::NegatedSet {
                forward: vec![ex("p")],
                inverse: Vec::new(),
            },
            var("x"),
        );
        assert_eq!(values(&result, "x"), vec!["<http://example.com/d>"]);
    }

    #[test]
    fn inverse_negated_set_follows_incoming_edges() {
        let dataset = cycle();
        let result = evaluate(
            &dataset,
            term("a"),
            PathExpression::NegatedSet {
                forward: Vec::new(),
                inverse: vec![ex("q")],
            },
            var("x"),
        );
        assert_eq!(values(&result, "x"), vec!["<http://example.com/c>"]);
    }

    #[test]
    fn fixed_length_unrolls() {
        let dataset = cycle();
        let path = PathExpression::property(ex("p"));
        let result = evaluate(
            &dataset,
            term("a"),
            PathExpression::FixedLength(Box::new(path.clone()), 2),
            var("x"),
        );
        assert_eq!(values(&result, "x"), vec!["<http://example.com/c>"]);

        let result = evaluate(
            &dataset,
            term("a"),
            PathExpression::FixedLength(Box::new(path), 0),
            var("x"),
        );
        assert_eq!(values(&result, "x"), vec!["<http://example.com/a>"]);
    }

    #[test]
    fn closure_respects_timeout() {
        let dataset = cycle();
        let mut context = EvaluationContext::try_new(
            &dataset,
            None,
            false,
            ExecutionTimer::start(Some(std::time::Duration::ZERO), 1),
        )
        .unwrap();
        let result = PathEvaluator::new(&mut context).evaluate(
            &var("x"),
            &PathExpression::OneOrMore(Box::new(PathExpression::property(ex("p")))),
            &var("y"),
        );
        assert!(matches!(
            result,
            Err(rdf_eval_common::QueryEvaluationError::Timeout(_))
        ));
    }
}
