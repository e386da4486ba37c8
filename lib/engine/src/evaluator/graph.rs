use crate::evaluator::Evaluator;
use rdf_eval_common::{ActiveGraph, QueryEvaluationError, QueryResult};
use rdf_eval_logical::AlgebraNode;
use rdf_eval_model::{
    merge_variables, Binding, Multiset, NamedNode, NamedNodePattern, NamedOrBlankNode, Term,
    Variable,
};
use spargebra::algebra::GraphPattern;
use std::ops::{Deref, DerefMut};

/// Makes a graph the active graph of an [Evaluator] while the scope is alive.
///
/// The previous active graph is restored when the scope is dropped, including when the evaluation
/// of the scoped pattern fails.
pub struct GraphScope<'e, 'a> {
    evaluator: &'e mut Evaluator<'a>,
}

impl<'e, 'a> GraphScope<'e, 'a> {
    pub fn new(evaluator: &'e mut Evaluator<'a>, graph: ActiveGraph) -> Self {
        evaluator.context.push_graph(graph);
        Self { evaluator }
    }
}

impl<'a> Deref for GraphScope<'_, 'a> {
    type Target = Evaluator<'a>;

    fn deref(&self) -> &Self::Target {
        self.evaluator
    }
}

impl DerefMut for GraphScope<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.evaluator
    }
}

impl Drop for GraphScope<'_, '_> {
    fn drop(&mut self) {
        self.evaluator.context.pop_graph();
    }
}

/// Evaluates `GRAPH name { inner }`.
///
/// A variable name ranges over the available named graphs. The graphs are visited in the order of
/// [EvaluationContext::named_graphs](crate::EvaluationContext::named_graphs), and the evaluation
/// stops as soon as the demand is met.
pub(super) fn evaluate_graph(
    evaluator: &mut Evaluator<'_>,
    inner: &AlgebraNode,
    name: &NamedNodePattern,
    demand: Option<usize>,
) -> QueryResult<Multiset> {
    let variable = match name {
        NamedNodePattern::NamedNode(name) => {
            let graph = NamedOrBlankNode::NamedNode(name.clone());
            if !evaluator.is_simulation()
                && !evaluator.context.is_available_named_graph(graph.as_ref())?
            {
                return Ok(Multiset::Null);
            }
            let mut scope = GraphScope::new(evaluator, ActiveGraph::NamedGraph(graph));
            return scope.evaluate_node(inner, demand);
        }
        NamedNodePattern::Variable(variable) => variable,
    };

    let variables = merge_variables(&inner.variables(), std::slice::from_ref(variable));
    if evaluator.is_simulation() {
        return Ok(Multiset::Singleton(variables));
    }

    let bound = evaluator
        .seed
        .as_ref()
        .and_then(|seed| seed.get(variable).cloned());
    let graphs = match bound {
        Some(Term::NamedNode(graph)) => {
            let graph = NamedOrBlankNode::NamedNode(graph);
            if evaluator.context.is_available_named_graph(graph.as_ref())? {
                vec![graph]
            } else {
                Vec::new()
            }
        }
        Some(Term::BlankNode(graph)) => {
            let graph = NamedOrBlankNode::BlankNode(graph);
            if evaluator.context.is_available_named_graph(graph.as_ref())? {
                vec![graph]
            } else {
                Vec::new()
            }
        }
        Some(_) => Vec::new(),
        None => evaluator.context.named_graphs()?,
    };

    let mut result = Vec::new();
    for graph in graphs {
        let remaining = demand.map(|demand| demand.saturating_sub(result.len()));
        let graph_term = Term::from(graph.clone());
        let solutions = {
            let mut scope = GraphScope::new(evaluator, ActiveGraph::NamedGraph(graph));
            scope.evaluate_node(inner, remaining)?
        };
        result.extend(bind_graph(solutions, variable, &graph_term));
        if demand.is_some_and(|demand| result.len() >= demand) {
            break;
        }
    }
    Ok(Multiset::new(variables, result))
}

/// Adds the graph name to the solutions of a graph. Solutions that already bind `variable` to
/// another term are dropped.
fn bind_graph(solutions: Multiset, variable: &Variable, graph: &Term) -> Vec<Binding> {
    solutions
        .into_bindings()
        .into_iter()
        .filter(|binding| binding.get(variable).map_or(true, |existing| existing == graph))
        .map(|binding| {
            if binding.contains(variable) {
                binding
            } else {
                binding.with(variable.clone(), graph.clone())
            }
        })
        .collect()
}

/// Evaluates `SERVICE name { pattern }` through the registered service handler.
pub(super) fn evaluate_service(
    evaluator: &mut Evaluator<'_>,
    name: &NamedNodePattern,
    pattern: &GraphPattern,
    variables: &[Variable],
    silent: bool,
) -> QueryResult<Multiset> {
    if evaluator.is_simulation() {
        return Ok(Multiset::Singleton(variables.to_vec()));
    }

    let name = resolve_service_name(evaluator, name)?;
    let Some(handler) = evaluator.service_handler.as_ref() else {
        if silent {
            return Ok(Multiset::Null);
        }
        return Err(QueryEvaluationError::UnsupportedService(name));
    };

    match handler.handle(&name, pattern, evaluator.base_iri.as_deref()) {
        Ok(solutions) => Ok(evaluator.join_seed(solutions)),
        Err(error) if silent => {
            tracing::debug!(service = %name, %error, "Ignoring failure of silent service");
            Ok(Multiset::Null)
        }
        Err(error) => Err(QueryEvaluationError::Service(error)),
    }
}

fn resolve_service_name(
    evaluator: &Evaluator<'_>,
    name: &NamedNodePattern,
) -> QueryResult<NamedNode> {
    match name {
        NamedNodePattern::NamedNode(name) => Ok(name.clone()),
        NamedNodePattern::Variable(variable) => {
            match evaluator.seed.as_ref().and_then(|seed| seed.get(variable)) {
                Some(Term::NamedNode(name)) => Ok(name.clone()),
                _ => Err(QueryEvaluationError::UnboundService),
            }
        }
    }
}
