use crate::evaluator::Evaluator;
use crate::paths::PathEvaluator;
use rdf_eval_common::{QueryEvaluationError, QueryResult};
use rdf_eval_logical::{AlgebraNode, PatternElement, TermOrVariable, TriplePattern};
use rdf_eval_model::{merge_variables, Binding, Multiset, Term, Variable};
use std::rc::Rc;

/// The state of a single [AlgebraNode::Bgp] evaluation.
struct BgpState {
    solutions: Vec<Binding>,
    demand: Option<usize>,
    /// The solutions of sub-queries, indexed by the position of the element.
    sub_queries: Vec<Option<Rc<Multiset>>>,
}

impl BgpState {
    fn is_satisfied(&self) -> bool {
        self.demand.is_some_and(|demand| self.solutions.len() >= demand)
    }
}

/// Evaluates the elements of a basic graph pattern with nested loops.
///
/// Each element is matched with the bindings of the preceding elements substituted. The evaluation
/// starts from the seed (or the empty solution) and stops as soon as the demand is met.
pub(super) fn evaluate_bgp(
    evaluator: &mut Evaluator<'_>,
    node: &AlgebraNode,
    elements: &[PatternElement],
    demand: Option<usize>,
) -> QueryResult<Multiset> {
    let seed = evaluator.seed.clone().unwrap_or_default();
    let seed_variables: Vec<Variable> = seed.variables().cloned().collect();
    let variables = merge_variables(&seed_variables, &node.variables());
    if evaluator.is_simulation() {
        return Ok(Multiset::Singleton(variables));
    }

    let mut state = BgpState {
        solutions: Vec::new(),
        demand,
        sub_queries: vec![None; elements.len()],
    };
    match_elements(evaluator, elements, 0, seed, &mut state)?;
    Ok(Multiset::new(variables, state.solutions))
}

fn match_elements(
    evaluator: &mut Evaluator<'_>,
    elements: &[PatternElement],
    position: usize,
    binding: Binding,
    state: &mut BgpState,
) -> QueryResult<()> {
    let Some(element) = elements.get(position) else {
        state.solutions.push(binding);
        return Ok(());
    };
    evaluator.context.tick()?;

    match element {
        PatternElement::Triple(pattern) => {
            for candidate in match_triple(evaluator, pattern, &binding)? {
                match_elements(evaluator, elements, position + 1, candidate, state)?;
                if state.is_satisfied() {
                    break;
                }
            }
        }
        PatternElement::Path {
            subject,
            path,
            object,
        } => {
            let subject = subject.substitute(&binding);
            let object = object.substitute(&binding);
            let paths =
                PathEvaluator::new(&mut evaluator.context).evaluate(&subject, path, &object)?;
            for solution in &paths {
                if let Some(candidate) = binding.merge(solution) {
                    match_elements(evaluator, elements, position + 1, candidate, state)?;
                    if state.is_satisfied() {
                        break;
                    }
                }
            }
        }
        PatternElement::Assign {
            variable,
            expression,
        } => {
            if binding.contains(variable) {
                return Err(QueryEvaluationError::VariableAlreadyBound(variable.clone()));
            }
            let mut binding = binding;
            if let Some(value) = evaluator.assignment(expression, &binding)? {
                binding.insert(variable.clone(), value);
            }
            match_elements(evaluator, elements, position + 1, binding, state)?;
        }
        PatternElement::SubQuery(node) => {
            let solutions = match &state.sub_queries[position] {
                Some(solutions) => Rc::clone(solutions),
                None => {
                    let solutions = Rc::new(evaluator.evaluate_node(node, None)?);
                    state.sub_queries[position] = Some(Rc::clone(&solutions));
                    solutions
                }
            };
            for solution in solutions.iter() {
                if let Some(candidate) = binding.merge(solution) {
                    match_elements(evaluator, elements, position + 1, candidate, state)?;
                    if state.is_satisfied() {
                        break;
                    }
                }
            }
        }
        PatternElement::Filter(expression) => {
            if evaluator.condition(expression, &binding)? {
                match_elements(evaluator, elements, position + 1, binding, state)?;
            }
        }
    }
    Ok(())
}

/// Returns the extensions of `binding` that match `pattern` in the active graph.
fn match_triple(
    evaluator: &mut Evaluator<'_>,
    pattern: &TriplePattern,
    binding: &Binding,
) -> QueryResult<Vec<Binding>> {
    let subject = pattern.subject.resolve(binding);
    let predicate = match pattern.predicate.resolve(binding) {
        Some(Term::NamedNode(predicate)) => Some(predicate.as_ref()),
        Some(_) => return Ok(Vec::new()),
        None => None,
    };
    let object = pattern.object.resolve(binding);
    let triples = evaluator.context.triples_for_pattern(
        subject.map(Term::as_ref),
        predicate,
        object.map(Term::as_ref),
    )?;

    let mut result = Vec::new();
    'triples: for triple in triples {
        let mut candidate = binding.clone();
        let values: [(&TermOrVariable, Term); 3] = [
            (&pattern.subject, triple.subject.into()),
            (&pattern.predicate, triple.predicate.into()),
            (&pattern.object, triple.object),
        ];
        for (position, value) in values {
            let TermOrVariable::Variable(variable) = position else {
                continue;
            };
            match candidate.get(variable) {
                Some(existing) if existing != &value => continue 'triples,
                Some(_) => {}
                None => {
                    candidate.insert(variable.clone(), value);
                }
            }
        }
        result.push(candidate);
    }
    Ok(result)
}
