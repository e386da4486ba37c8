//! Recursive evaluation of [AlgebraNode] trees.
//!
//! Every node is evaluated through [Evaluator::evaluate_node], which checks the timeout, notifies
//! the registered [EvaluationHook]s, and dispatches to the algorithm of the node kind.
//!
//! # Demand
//!
//! Nodes are evaluated with an optional *demand*. A node that is evaluated with a demand of `n`
//! may stop as soon as it knows its first `n` solutions. The returned solutions are always a prefix
//! of the solutions that an evaluation without demand returns (or all of them, if there are fewer
//! than `n`). Operators whose output order follows the order of their (left) input re-evaluate the
//! input with a growing demand until enough output solutions are known. Blocking operators (e.g.,
//! ordering and grouping) ignore the demand.
//!
//! # Seeding
//!
//! `EXISTS` patterns are evaluated with the solution of the outer pattern as *seed*. Leaves start
//! from the seed instead of the empty solution, which restricts the pattern to solutions that are
//! compatible with the seed.

mod aggregate;
mod bgp;
mod expression;
mod graph;

use crate::context::EvaluationContext;
use crate::hooks::EvaluationHook;
use crate::paths::PathEvaluator;
use crate::service::ServiceHandler;
use rdf_eval_common::{QueryEvaluationError, QueryResult};
use rdf_eval_functions::FunctionRegistryRef;
use rdf_eval_logical::{AlgebraNode, Expr, PathExpression, SubtreeEvaluator, TermOrVariable};
use rdf_eval_model::{merge_variables, Binding, Multiset, Term, Variable};
use std::sync::Arc;
use std::time::Instant;

pub use expression::EvaluableExpression;
pub use graph::GraphScope;

/// Whether nodes access the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EvaluationMode {
    Normal,
    /// Leaves produce [Multiset::Singleton]s without accessing the dataset.
    Simulation,
}

/// Evaluates algebra trees within an [EvaluationContext].
pub struct Evaluator<'a> {
    context: EvaluationContext<'a>,
    registry: FunctionRegistryRef,
    service_handler: Option<Arc<dyn ServiceHandler>>,
    base_iri: Option<String>,
    hooks: Vec<&'a mut dyn EvaluationHook>,
    mode: EvaluationMode,
    depth: usize,
    seed: Option<Binding>,
}

impl<'a> Evaluator<'a> {
    pub fn new(context: EvaluationContext<'a>, registry: FunctionRegistryRef) -> Self {
        Self {
            context,
            registry,
            service_handler: None,
            base_iri: None,
            hooks: Vec::new(),
            mode: EvaluationMode::Normal,
            depth: 0,
            seed: None,
        }
    }

    /// Registers a hook that observes every node evaluation.
    #[must_use]
    pub fn with_hook(mut self, hook: &'a mut dyn EvaluationHook) -> Self {
        self.hooks.push(hook);
        self
    }

    #[must_use]
    pub fn with_service_handler(mut self, handler: Arc<dyn ServiceHandler>) -> Self {
        self.service_handler = Some(handler);
        self
    }

    /// The base IRI that is passed to the service handler.
    #[must_use]
    pub fn with_base_iri(mut self, base_iri: Option<String>) -> Self {
        self.base_iri = base_iri;
        self
    }

    /// Switches to simulated evaluation.
    ///
    /// Leaves yield a [Multiset::Singleton] over their variables instead of accessing the dataset.
    /// The result shows which variables a tree produces without paying for its evaluation.
    #[must_use]
    pub fn simulate(mut self) -> Self {
        self.mode = EvaluationMode::Simulation;
        self
    }

    pub fn is_simulation(&self) -> bool {
        self.mode == EvaluationMode::Simulation
    }

    pub fn context(&self) -> &EvaluationContext<'a> {
        &self.context
    }

    /// Evaluates `node`. See the module documentation for the meaning of `demand`.
    pub fn evaluate_node(
        &mut self,
        node: &AlgebraNode,
        demand: Option<usize>,
    ) -> QueryResult<Multiset> {
        self.context.check_timeout()?;

        let depth = self.depth;
        for hook in &mut self.hooks {
            hook.before(node, depth);
        }

        let start = Instant::now();
        self.depth += 1;
        let result = self.dispatch(node, demand);
        self.depth -= 1;
        let result = result?;

        let elapsed = start.elapsed();
        for hook in &mut self.hooks {
            hook.after(node, depth, &result, elapsed);
        }
        Ok(result)
    }

    fn dispatch(&mut self, node: &AlgebraNode, demand: Option<usize>) -> QueryResult<Multiset> {
        match node {
            AlgebraNode::Bgp(elements) => bgp::evaluate_bgp(self, node, elements, demand),
            AlgebraNode::Join { left, right } => {
                let mut right_solutions = None;
                self.evaluate_prefix(left, demand, |this, left| {
                    if left.is_empty() {
                        return Ok(Multiset::Null);
                    }
                    let right = this.evaluate_cached(right, &mut right_solutions)?;
                    Ok(left.join(right))
                })
            }
            AlgebraNode::LeftJoin {
                left,
                right,
                expression,
            } => {
                let mut right_solutions = None;
                self.evaluate_prefix(left, demand, |this, left| {
                    if left.is_empty() {
                        return Ok(Multiset::Null);
                    }
                    let right = this.evaluate_cached(right, &mut right_solutions)?;
                    left.left_join(right, |binding| match expression {
                        Some(expression) => this.condition(expression, binding),
                        None => Ok(true),
                    })
                })
            }
            AlgebraNode::Union { left, right } => {
                let left_solutions = self.evaluate_node(left, demand)?;
                let remaining = demand.map(|demand| demand.saturating_sub(left_solutions.len()));
                if remaining == Some(0) && !left_solutions.is_singleton() {
                    return Ok(left_solutions.extend_variables(&right.variables()));
                }
                let right_solutions = self.evaluate_node(right, remaining)?;
                Ok(left_solutions.union(right_solutions))
            }
            AlgebraNode::Minus { left, right } => {
                let mut right_solutions = None;
                self.evaluate_prefix(left, demand, |this, left| {
                    if left.is_empty() {
                        return Ok(Multiset::Null);
                    }
                    let right = this.with_seed(None, |this| {
                        this.evaluate_cached(right, &mut right_solutions)
                    })?;
                    Ok(left.minus(right))
                })
            }
            AlgebraNode::ExistsJoin {
                left,
                right,
                negated,
            } => self.evaluate_prefix(left, demand, |this, left| {
                left.retain(|binding| Ok(this.exists(right, binding)? != *negated))
            }),
            AlgebraNode::Filter { inner, expression }
            | AlgebraNode::Having { inner, expression } => {
                self.evaluate_prefix(inner, demand, |this, solutions| {
                    solutions.retain(|binding| this.condition(expression, binding))
                })
            }
            AlgebraNode::Extend {
                inner,
                variable,
                expression,
            } => self.evaluate_extend(inner, variable, expression, demand),
            AlgebraNode::Group {
                inner,
                variables,
                aggregates,
            } => aggregate::evaluate_group(self, inner, variables, aggregates),
            AlgebraNode::OrderBy { inner, keys } => aggregate::evaluate_order_by(self, inner, keys),
            AlgebraNode::Distinct { inner } => {
                self.evaluate_prefix(inner, demand, |_, solutions| Ok(solutions.distinct()))
            }
            AlgebraNode::Reduced { inner } => self.evaluate_node(inner, demand),
            AlgebraNode::Project { inner, variables } => {
                let seed = self.seed.as_ref().map(|seed| seed.project(variables));
                let solutions = self.with_seed(seed, |this| this.evaluate_node(inner, demand))?;
                Ok(self.join_seed(solutions.project(variables)))
            }
            AlgebraNode::Slice {
                inner,
                offset,
                limit,
            } => {
                let inner_demand = demand.map(|demand| {
                    let length = limit.map_or(demand, |limit| limit.min(demand));
                    offset.saturating_add(length)
                });
                let solutions = self.evaluate_node(inner, inner_demand)?;
                Ok(solutions.slice(*offset, *limit))
            }
            AlgebraNode::Limit { inner, limit } => {
                let inner_demand = demand.map_or(*limit, |demand| demand.min(*limit));
                let solutions = self.evaluate_node(inner, Some(inner_demand))?;
                Ok(solutions.truncate(*limit))
            }
            AlgebraNode::Graph { inner, name } => {
                graph::evaluate_graph(self, inner, name, demand)
            }
            AlgebraNode::Service {
                name,
                pattern,
                variables,
                silent,
            } => graph::evaluate_service(self, name, pattern, variables, *silent),
            AlgebraNode::Ask { inner } => {
                if self.is_simulation() {
                    return Ok(Multiset::Identity);
                }
                let solutions = self.evaluate_node(inner, Some(1))?;
                Ok(if solutions.is_empty() {
                    Multiset::Null
                } else {
                    Multiset::Identity
                })
            }
            AlgebraNode::Values {
                variables,
                bindings,
            } => {
                if self.is_simulation() {
                    return Ok(Multiset::Singleton(variables.clone()));
                }
                let bindings = bindings
                    .iter()
                    .map(|row| {
                        variables
                            .iter()
                            .zip(row)
                            .filter_map(|(variable, value)| {
                                value.clone().map(|value| (variable.clone(), value))
                            })
                            .collect()
                    })
                    .collect();
                Ok(self.join_seed(Multiset::new(variables.clone(), bindings)))
            }
            AlgebraNode::ZeroLengthPath { subject, object } => {
                self.evaluate_path(node, subject, None, object)
            }
            AlgebraNode::ZeroOrMorePath {
                subject,
                path,
                object,
            } => {
                let path = PathExpression::ZeroOrMore(Box::new(path.clone()));
                self.evaluate_path(node, subject, Some(&path), object)
            }
            AlgebraNode::OneOrMorePath {
                subject,
                path,
                object,
            } => {
                let path = PathExpression::OneOrMore(Box::new(path.clone()));
                self.evaluate_path(node, subject, Some(&path), object)
            }
            AlgebraNode::NegatedPropertySet {
                subject,
                forward,
                inverse,
                object,
            } => {
                let path = PathExpression::NegatedSet {
                    forward: forward.clone(),
                    inverse: inverse.clone(),
                };
                self.evaluate_path(node, subject, Some(&path), object)
            }
            AlgebraNode::Custom(custom) => custom.evaluate(self),
        }
    }

    /// Evaluates `input` with a growing demand until `combine` produces at least `demand`
    /// solutions or `input` is exhausted.
    ///
    /// `combine` must preserve the order of `input` such that a prefix of the input yields a prefix
    /// of the output.
    fn evaluate_prefix(
        &mut self,
        input: &AlgebraNode,
        demand: Option<usize>,
        mut combine: impl FnMut(&mut Self, Multiset) -> QueryResult<Multiset>,
    ) -> QueryResult<Multiset> {
        let Some(demand) = demand else {
            let solutions = self.evaluate_node(input, None)?;
            return combine(self, solutions);
        };

        let mut input_demand = demand.max(1);
        loop {
            let solutions = self.evaluate_node(input, Some(input_demand))?;
            let exhausted = solutions.is_singleton() || solutions.len() < input_demand;
            let output = combine(self, solutions)?;
            if exhausted || output.len() >= demand {
                return Ok(output);
            }
            input_demand = input_demand.saturating_mul(2);
        }
    }

    /// Evaluates `node` without demand on the first call and returns a copy of the cached
    /// solutions afterward.
    fn evaluate_cached(
        &mut self,
        node: &AlgebraNode,
        cache: &mut Option<Multiset>,
    ) -> QueryResult<Multiset> {
        if let Some(solutions) = cache {
            return Ok(solutions.clone());
        }
        let solutions = self.evaluate_node(node, None)?;
        *cache = Some(solutions.clone());
        Ok(solutions)
    }

    fn evaluate_extend(
        &mut self,
        inner: &AlgebraNode,
        variable: &Variable,
        expression: &Expr,
        demand: Option<usize>,
    ) -> QueryResult<Multiset> {
        let seed = self.seed.as_ref().map(|seed| {
            let mut seed = seed.clone();
            seed.remove(variable);
            seed
        });
        let solutions = self.with_seed(seed, |this| this.evaluate_node(inner, demand))?;
        if solutions.is_singleton() {
            return Ok(solutions.extend_variables(std::slice::from_ref(variable)));
        }

        let (variables, bindings) = solutions.into_parts();
        let mut result = Vec::with_capacity(bindings.len());
        for mut binding in bindings {
            if binding.contains(variable) {
                return Err(QueryEvaluationError::VariableAlreadyBound(variable.clone()));
            }
            if let Some(value) = self.assignment(expression, &binding)? {
                binding.insert(variable.clone(), value);
            }
            result.push(binding);
        }
        Ok(Multiset::new(
            merge_variables(&variables, std::slice::from_ref(variable)),
            result,
        ))
    }

    /// Computes the value that `BIND` assigns. Errors are errors of the query, except that binding
    /// an unbound variable leaves the target unbound.
    fn assignment(&mut self, expression: &Expr, binding: &Binding) -> QueryResult<Option<Term>> {
        let binding_id = self.context.next_binding_id();
        match expression.value(self, binding, binding_id) {
            Ok(value) => Ok(Some(value)),
            Err(QueryEvaluationError::UnboundVariable(_))
                if matches!(expression, Expr::Variable(_)) =>
            {
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    /// Evaluates a filter condition. Expression errors count as `false`.
    fn condition(&mut self, expression: &Expr, binding: &Binding) -> QueryResult<bool> {
        let binding_id = self.context.next_binding_id();
        match expression.effective_boolean_value(self, binding, binding_id) {
            Ok(value) => Ok(value),
            Err(error) if error.is_absorbable() => Ok(false),
            Err(error) => Err(error),
        }
    }

    /// Returns whether `pattern`, evaluated with `binding` as seed, has a solution that is
    /// compatible with `binding`.
    fn exists(&mut self, pattern: &AlgebraNode, binding: &Binding) -> QueryResult<bool> {
        self.with_seed(Some(binding.clone()), |this| {
            let mut demand = 1_usize;
            loop {
                let solutions = this.evaluate_node(pattern, Some(demand))?;
                if solutions.is_singleton()
                    || solutions
                        .iter()
                        .any(|solution| solution.is_compatible(binding))
                {
                    return Ok(true);
                }
                if solutions.len() < demand {
                    return Ok(false);
                }
                demand = demand.saturating_mul(2);
            }
        })
    }

    fn evaluate_path(
        &mut self,
        node: &AlgebraNode,
        subject: &TermOrVariable,
        path: Option<&PathExpression>,
        object: &TermOrVariable,
    ) -> QueryResult<Multiset> {
        if self.is_simulation() {
            return Ok(Multiset::Singleton(node.variables()));
        }

        let (subject, object) = match &self.seed {
            Some(seed) => (subject.substitute(seed), object.substitute(seed)),
            None => (subject.clone(), object.clone()),
        };
        let mut paths = PathEvaluator::new(&mut self.context);
        let solutions = match path {
            Some(path) => paths.evaluate(&subject, path, &object)?,
            None => paths.evaluate_zero_length(&subject, &object)?,
        };
        Ok(self.join_seed(solutions))
    }

    /// Runs `f` with `seed` as seed and restores the previous seed afterward.
    fn with_seed<T>(
        &mut self,
        seed: Option<Binding>,
        f: impl FnOnce(&mut Self) -> QueryResult<T>,
    ) -> QueryResult<T> {
        let previous = std::mem::replace(&mut self.seed, seed);
        let result = f(self);
        self.seed = previous;
        result
    }

    /// Adds the bindings of the seed to every solution.
    fn join_seed(&self, solutions: Multiset) -> Multiset {
        match &self.seed {
            Some(seed) if !seed.is_empty() => {
                solutions.join(Multiset::from_binding(seed.clone()))
            }
            _ => solutions,
        }
    }
}

impl SubtreeEvaluator for Evaluator<'_> {
    fn evaluate(&mut self, node: &AlgebraNode) -> QueryResult<Multiset> {
        self.evaluate_node(node, None)
    }
}
