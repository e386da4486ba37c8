use crate::solution::{Binding, Multiset};
use oxrdf::{Term, Variable};
use rustc_hash::{FxHashMap, FxHashSet};

/// Returns the variables of `lhs` followed by the variables of `rhs` that are not part of `lhs`.
pub fn merge_variables(lhs: &[Variable], rhs: &[Variable]) -> Vec<Variable> {
    let mut result = lhs.to_vec();
    for variable in rhs {
        if !result.contains(variable) {
            result.push(variable.clone());
        }
    }
    result
}

impl Multiset {
    /// Joins two multisets by merging every pair of compatible bindings.
    ///
    /// The result is ordered by the bindings of `self` and, for each of them, by the order of the
    /// compatible bindings in `other`. Multisets with disjoint variables produce a cross product.
    #[must_use]
    pub fn join(self, other: Multiset) -> Multiset {
        match (self, other) {
            (Multiset::Null, _) | (_, Multiset::Null) => Multiset::Null,
            (Multiset::Identity, other) | (other, Multiset::Identity) => other,
            (lhs, rhs) if lhs.is_singleton() || rhs.is_singleton() => {
                Multiset::Singleton(merge_variables(lhs.variables(), rhs.variables()))
            }
            (lhs, rhs) => {
                let variables = merge_variables(lhs.variables(), rhs.variables());
                let candidates = JoinCandidates::new(&lhs, &rhs);
                let mut bindings = Vec::new();
                for left in lhs.iter() {
                    for right in candidates.for_binding(left) {
                        if let Some(merged) = left.merge(right) {
                            bindings.push(merged);
                        }
                    }
                }
                Multiset::new(variables, bindings)
            }
        }
    }

    /// Left-outer joins two multisets.
    ///
    /// Each binding of `self` is merged with every compatible binding of `other` for which
    /// `condition` holds. Bindings of `self` without any such partner are kept unchanged.
    pub fn left_join<E>(
        self,
        other: Multiset,
        mut condition: impl FnMut(&Binding) -> Result<bool, E>,
    ) -> Result<Multiset, E> {
        match (self, other) {
            (Multiset::Null, _) => Ok(Multiset::Null),
            (lhs, Multiset::Null) => Ok(lhs),
            (lhs, rhs) if lhs.is_singleton() || rhs.is_singleton() => Ok(Multiset::Singleton(
                merge_variables(lhs.variables(), rhs.variables()),
            )),
            (lhs, rhs) => {
                let variables = merge_variables(lhs.variables(), rhs.variables());
                let candidates = JoinCandidates::new(&lhs, &rhs);
                let mut bindings = Vec::new();
                for left in lhs.iter() {
                    let mut matched = false;
                    for right in candidates.for_binding(left) {
                        if let Some(merged) = left.merge(right) {
                            if condition(&merged)? {
                                matched = true;
                                bindings.push(merged);
                            }
                        }
                    }
                    if !matched {
                        bindings.push(left.clone());
                    }
                }
                Ok(Multiset::new(variables, bindings))
            }
        }
    }

    /// Removes every binding of `self` that is compatible with, and shares at least one bound
    /// variable with, a binding of `other`.
    #[must_use]
    pub fn minus(self, other: Multiset) -> Multiset {
        match (self, other) {
            (Multiset::Null, _) => Multiset::Null,
            (lhs, Multiset::Null | Multiset::Identity) => lhs,
            (Multiset::Singleton(variables), _) => Multiset::Singleton(variables),
            (lhs, Multiset::Singleton(_)) => lhs,
            (lhs, rhs) => {
                if lhs
                    .variables()
                    .iter()
                    .all(|v| !rhs.variables().contains(v))
                {
                    return lhs;
                }

                let (variables, bindings) = lhs.into_parts();
                let bindings = bindings
                    .into_iter()
                    .filter(|left| {
                        !rhs.iter().any(|right| {
                            left.shares_variable_with(right) && left.is_compatible(right)
                        })
                    })
                    .collect();
                Multiset::new(variables, bindings)
            }
        }
    }

    /// Concatenates two multisets.
    #[must_use]
    pub fn union(self, other: Multiset) -> Multiset {
        match (self, other) {
            (Multiset::Null, other) | (other, Multiset::Null) => other,
            (lhs, rhs) if lhs.is_singleton() || rhs.is_singleton() => {
                Multiset::Singleton(merge_variables(lhs.variables(), rhs.variables()))
            }
            (lhs, rhs) => {
                let variables = merge_variables(lhs.variables(), rhs.variables());
                let mut bindings = lhs.into_bindings();
                bindings.extend(rhs.into_bindings());
                Multiset::new(variables, bindings)
            }
        }
    }

    /// Keeps the bindings for which `predicate` holds.
    pub fn retain<E>(
        self,
        mut predicate: impl FnMut(&Binding) -> Result<bool, E>,
    ) -> Result<Multiset, E> {
        match self {
            Multiset::Singleton(variables) => Ok(Multiset::Singleton(variables)),
            multiset => {
                let (variables, bindings) = multiset.into_parts();
                let mut result = Vec::with_capacity(bindings.len());
                for binding in bindings {
                    if predicate(&binding)? {
                        result.push(binding);
                    }
                }
                Ok(Multiset::new(variables, result))
            }
        }
    }

    /// Removes duplicate bindings. The first occurrence of each binding is kept in place.
    #[must_use]
    pub fn distinct(self) -> Multiset {
        match self {
            Multiset::Solutions {
                variables,
                bindings,
            } => {
                let mut seen = FxHashSet::default();
                let bindings = bindings
                    .into_iter()
                    .filter(|binding| seen.insert(binding.clone()))
                    .collect();
                Multiset::new(variables, bindings)
            }
            other => other,
        }
    }

    /// Restricts the multiset to the given variables.
    #[must_use]
    pub fn project(self, variables: &[Variable]) -> Multiset {
        match self {
            Multiset::Null => Multiset::Null,
            Multiset::Singleton(_) => Multiset::Singleton(variables.to_vec()),
            multiset => {
                let bindings = multiset
                    .into_bindings()
                    .iter()
                    .map(|binding| binding.project(variables))
                    .collect();
                Multiset::new(variables.to_vec(), bindings)
            }
        }
    }

    /// Declares additional variables without binding them.
    #[must_use]
    pub fn extend_variables(self, variables: &[Variable]) -> Multiset {
        match self {
            Multiset::Null => Multiset::Null,
            Multiset::Singleton(existing) => {
                Multiset::Singleton(merge_variables(&existing, variables))
            }
            multiset => {
                let (existing, bindings) = multiset.into_parts();
                Multiset::new(merge_variables(&existing, variables), bindings)
            }
        }
    }

    /// Skips the first `offset` bindings and keeps at most `limit` of the remaining ones.
    #[must_use]
    pub fn slice(self, offset: usize, limit: Option<usize>) -> Multiset {
        match self {
            Multiset::Singleton(variables) => Multiset::Singleton(variables),
            multiset => {
                let (variables, bindings) = multiset.into_parts();
                let bindings = bindings
                    .into_iter()
                    .skip(offset)
                    .take(limit.unwrap_or(usize::MAX))
                    .collect();
                Multiset::new(variables, bindings)
            }
        }
    }

    /// Keeps at most the first `limit` bindings.
    #[must_use]
    pub fn truncate(self, limit: usize) -> Multiset {
        if self.len() <= limit {
            return self;
        }
        self.slice(0, Some(limit))
    }
}

/// Finds the bindings of the right-hand side of a join that may be compatible with a left binding.
///
/// Right bindings that bind every shared variable are indexed by their values for these variables.
/// The remaining right bindings are candidates for every left binding. Candidates are always
/// returned in their original order.
struct JoinCandidates<'a> {
    shared: Vec<Variable>,
    rhs: &'a [Binding],
    index: FxHashMap<Vec<&'a Term>, Vec<usize>>,
    partial: Vec<usize>,
}

impl<'a> JoinCandidates<'a> {
    fn new(lhs: &Multiset, rhs: &'a Multiset) -> Self {
        let shared: Vec<Variable> = lhs
            .variables()
            .iter()
            .filter(|v| rhs.variables().contains(v))
            .cloned()
            .collect();

        let mut index: FxHashMap<Vec<&'a Term>, Vec<usize>> = FxHashMap::default();
        let mut partial = Vec::new();
        if !shared.is_empty() {
            for (i, binding) in rhs.iter().enumerate() {
                match key(&shared, binding) {
                    Some(key) => index.entry(key).or_default().push(i),
                    None => partial.push(i),
                }
            }
        }

        Self {
            shared,
            rhs: rhs.bindings(),
            index,
            partial,
        }
    }

    fn for_binding<'b>(&'b self, binding: &Binding) -> Box<dyn Iterator<Item = &'a Binding> + 'b> {
        if self.shared.is_empty() {
            return Box::new(self.rhs.iter());
        }

        match key(&self.shared, binding) {
            Some(key) => {
                let indexed = self.index.get(&key).map(Vec::as_slice).unwrap_or_default();
                let mut positions = Vec::with_capacity(indexed.len() + self.partial.len());
                positions.extend_from_slice(indexed);
                positions.extend_from_slice(&self.partial);
                if !self.partial.is_empty() {
                    positions.sort_unstable();
                }
                Box::new(positions.into_iter().map(move |i| &self.rhs[i]))
            }
            None => Box::new(self.rhs.iter()),
        }
    }
}

fn key<'a>(variables: &[Variable], binding: &'a Binding) -> Option<Vec<&'a Term>> {
    variables.iter().map(|v| binding.get(v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::{Literal, NamedNode};

    fn var(name: &str) -> Variable {
        Variable::new_unchecked(name)
    }

    fn iri(value: &str) -> Term {
        NamedNode::new_unchecked(format!("http://example.com/{value}")).into()
    }

    fn multiset(variables: &[&str], rows: &[&[(&str, &str)]]) -> Multiset {
        Multiset::new(
            variables.iter().map(|v| var(v)).collect(),
            rows.iter()
                .map(|row| row.iter().map(|(v, t)| (var(v), iri(t))).collect())
                .collect(),
        )
    }

    #[test]
    fn join_with_sentinels() {
        let solutions = multiset(&["s"], &[&[("s", "a")], &[("s", "b")]]);
        assert_eq!(Multiset::Identity.join(solutions.clone()), solutions);
        assert_eq!(solutions.clone().join(Multiset::Identity), solutions);
        assert_eq!(Multiset::Null.join(solutions.clone()), Multiset::Null);
        assert_eq!(solutions.clone().join(Multiset::Null), Multiset::Null);
        assert_eq!(Multiset::Null.union(solutions.clone()), solutions);
    }

    #[test]
    fn join_preserves_left_order() {
        let lhs = multiset(&["s"], &[&[("s", "b")], &[("s", "a")]]);
        let rhs = multiset(
            &["s", "o"],
            &[
                &[("s", "a"), ("o", "1")],
                &[("s", "b"), ("o", "2")],
                &[("s", "b"), ("o", "3")],
            ],
        );
        let result = lhs.join(rhs);
        insta::assert_snapshot!(result, @r"
        Solutions [?s, ?o]
          {?o -> <http://example.com/2>, ?s -> <http://example.com/b>}
          {?o -> <http://example.com/3>, ?s -> <http://example.com/b>}
          {?o -> <http://example.com/1>, ?s -> <http://example.com/a>}
        ");
    }

    #[test]
    fn join_with_partially_bound_right_side() {
        let lhs = multiset(&["s"], &[&[("s", "a")]]);
        let rhs = multiset(
            &["s", "o"],
            &[&[("o", "1")], &[("s", "a"), ("o", "2")], &[("s", "b")]],
        );
        let result = lhs.join(rhs);
        assert_eq!(result.len(), 2);
        assert_eq!(result.bindings()[0].get(&var("o")), Some(&iri("1")));
        assert_eq!(result.bindings()[1].get(&var("o")), Some(&iri("2")));
    }

    #[test]
    fn join_results_restrict_to_operands() {
        let lhs = multiset(&["s", "t"], &[&[("s", "a"), ("t", "x")], &[("s", "b"), ("t", "y")]]);
        let rhs = multiset(&["t", "u"], &[&[("t", "x"), ("u", "1")], &[("t", "z"), ("u", "2")]]);
        let result = lhs.clone().join(rhs.clone());
        for binding in &result {
            assert!(lhs.iter().any(|b| *b == binding.project(lhs.variables())));
            assert!(rhs.iter().any(|b| *b == binding.project(rhs.variables())));
        }
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn join_disjoint_is_cross_product() {
        let lhs = multiset(&["a"], &[&[("a", "1")], &[("a", "2")]]);
        let rhs = multiset(&["b"], &[&[("b", "1")], &[("b", "2")], &[("b", "3")]]);
        assert_eq!(lhs.join(rhs).len(), 6);
    }

    #[test]
    fn left_join_keeps_unmatched() {
        let lhs = multiset(&["s"], &[&[("s", "a")], &[("s", "b")]]);
        let rhs = Multiset::new(
            vec![var("s"), var("speed")],
            vec![[
                (var("s"), iri("a")),
                (var("speed"), Literal::new_simple_literal("100").into()),
            ]
            .into_iter()
            .collect()],
        );
        let result = lhs
            .left_join(rhs, |_| Ok::<_, ()>(true))
            .unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.bindings()[0].contains(&var("speed")));
        assert!(!result.bindings()[1].contains(&var("speed")));
    }

    #[test]
    fn left_join_rejected_by_condition() {
        let lhs = multiset(&["s"], &[&[("s", "a")], &[("s", "b")]]);
        let rhs = multiset(&["s", "o"], &[&[("s", "a"), ("o", "1")]]);
        let result = lhs
            .clone()
            .left_join(rhs, |_| Ok::<_, ()>(false))
            .unwrap();
        assert_eq!(result.bindings(), lhs.bindings());
    }

    #[test]
    fn left_join_propagates_condition_errors() {
        let lhs = multiset(&["s"], &[&[("s", "a")]]);
        let rhs = multiset(&["s"], &[&[("s", "a")]]);
        assert_eq!(lhs.left_join(rhs, |_| Err("abort")), Err("abort"));
    }

    #[test]
    fn minus_removes_compatible() {
        let lhs = multiset(&["s", "t"], &[&[("s", "a"), ("t", "Car")], &[("s", "b"), ("t", "Plane")]]);
        let rhs = multiset(&["s"], &[&[("s", "b")]]);
        let result = lhs.minus(rhs);
        assert_eq!(result.len(), 1);
        assert_eq!(result.bindings()[0].get(&var("s")), Some(&iri("a")));
    }

    #[test]
    fn minus_without_shared_variables_is_identity() {
        let lhs = multiset(&["s"], &[&[("s", "a")], &[("s", "b")]]);
        let rhs = multiset(&["o"], &[&[("o", "a")]]);
        assert_eq!(lhs.clone().minus(rhs), lhs);
    }

    #[test]
    fn minus_ignores_bindings_without_shared_bound_variable() {
        let lhs = multiset(&["s", "o"], &[&[("o", "1")]]);
        let rhs = multiset(&["s"], &[&[("s", "a")]]);
        assert_eq!(lhs.clone().minus(rhs).len(), 1);
    }

    #[test]
    fn union_concatenates() {
        let lhs = multiset(&["a"], &[&[("a", "1")]]);
        let rhs = multiset(&["b"], &[&[("b", "2")]]);
        let result = lhs.union(rhs);
        assert_eq!(result.variables(), &[var("a"), var("b")]);
        assert_eq!(result.len(), 2);
        assert!(!result.bindings()[0].contains(&var("b")));
    }

    #[test]
    fn distinct_keeps_first_occurrence() {
        let input = multiset(&["a"], &[&[("a", "2")], &[("a", "1")], &[("a", "2")]]);
        let result = input.distinct();
        assert_eq!(result, multiset(&["a"], &[&[("a", "2")], &[("a", "1")]]));
    }

    #[test]
    fn slice_after_offset() {
        let input = multiset(&["a"], &[&[("a", "1")], &[("a", "2")], &[("a", "3")]]);
        assert_eq!(
            input.clone().slice(1, Some(1)),
            multiset(&["a"], &[&[("a", "2")]])
        );
        assert_eq!(input.slice(5, None).len(), 0);
        assert_eq!(Multiset::Identity.slice(1, None), Multiset::Null);
    }

    #[test]
    fn singleton_propagates() {
        let singleton = Multiset::Singleton(vec![var("s")]);
        let solutions = multiset(&["o"], &[&[("o", "1")]]);
        assert_eq!(
            singleton.join(solutions),
            Multiset::Singleton(vec![var("s"), var("o")])
        );
    }

    #[test]
    fn extend_variables_keeps_bindings() {
        let result = Multiset::Identity.extend_variables(&[var("x")]);
        assert_eq!(result.variables(), &[var("x")]);
        assert_eq!(result.len(), 1);
        assert!(result.bindings()[0].is_empty());
        assert_eq!(Multiset::Null.extend_variables(&[var("x")]), Multiset::Null);
    }
}
