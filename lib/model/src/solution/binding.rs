use oxrdf::{Term, Variable};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// A single solution: a mapping from variables to terms.
///
/// Entries are kept sorted by variable name. Hence, two bindings with the same entries are equal
/// (and hash equally) regardless of the order in which the entries were inserted. Variables that
/// have no entry are unbound.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Binding {
    entries: Vec<(Variable, Term)>,
}

impl Binding {
    /// The binding without any bound variable.
    pub const EMPTY: Binding = Binding {
        entries: Vec::new(),
    };

    /// Creates an empty binding.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, variable: &Variable) -> Result<usize, usize> {
        self.entries
            .binary_search_by(|(v, _)| v.as_str().cmp(variable.as_str()))
    }

    /// Returns the term bound to `variable`.
    pub fn get(&self, variable: &Variable) -> Option<&Term> {
        self.position(variable)
            .ok()
            .map(|index| &self.entries[index].1)
    }

    /// Returns whether `variable` is bound.
    pub fn contains(&self, variable: &Variable) -> bool {
        self.position(variable).is_ok()
    }

    /// Binds `variable` to `term`, returning the previously bound term.
    pub fn insert(&mut self, variable: Variable, term: Term) -> Option<Term> {
        match self.position(&variable) {
            Ok(index) => Some(std::mem::replace(&mut self.entries[index].1, term)),
            Err(index) => {
                self.entries.insert(index, (variable, term));
                None
            }
        }
    }

    /// Unbinds `variable`, returning the previously bound term.
    pub fn remove(&mut self, variable: &Variable) -> Option<Term> {
        self.position(variable)
            .ok()
            .map(|index| self.entries.remove(index).1)
    }

    /// Returns a copy of this binding with `variable` bound to `term`.
    #[must_use]
    pub fn with(&self, variable: Variable, term: Term) -> Self {
        let mut result = self.clone();
        result.insert(variable, term);
        result
    }

    /// Iterates over the bound variables in the order of their names.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.entries.iter().map(|(v, _)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Term)> {
        self.entries.iter().map(|(v, t)| (v, t))
    }

    /// Two bindings are compatible if every variable bound in both is bound to the same term.
    pub fn is_compatible(&self, other: &Binding) -> bool {
        self.walk(other, |_| ()).is_some()
    }

    /// Returns whether at least one variable is bound in both bindings.
    pub fn shares_variable_with(&self, other: &Binding) -> bool {
        let mut lhs = self.entries.iter().peekable();
        let mut rhs = other.entries.iter().peekable();
        while let (Some((l, _)), Some((r, _))) = (lhs.peek(), rhs.peek()) {
            match l.as_str().cmp(r.as_str()) {
                Ordering::Less => {
                    lhs.next();
                }
                Ordering::Greater => {
                    rhs.next();
                }
                Ordering::Equal => return true,
            }
        }
        false
    }

    /// Merges two compatible bindings. Returns [None] if the bindings are not compatible.
    pub fn merge(&self, other: &Binding) -> Option<Binding> {
        if other.is_empty() {
            return Some(self.clone());
        }
        if self.is_empty() {
            return Some(other.clone());
        }

        let mut entries = Vec::with_capacity(self.len() + other.len());
        self.walk(other, |entry| entries.push(entry.clone()))?;
        Some(Binding { entries })
    }

    /// Restricts the binding to the given variables.
    #[must_use]
    pub fn project(&self, variables: &[Variable]) -> Binding {
        Binding {
            entries: self
                .entries
                .iter()
                .filter(|(v, _)| variables.contains(v))
                .cloned()
                .collect(),
        }
    }

    /// Walks both sorted entry lists at once, calling `emit` for every entry of the merged binding
    /// in order. Aborts with [None] on the first conflicting entry.
    fn walk<'a>(
        &'a self,
        other: &'a Binding,
        mut emit: impl FnMut(&'a (Variable, Term)),
    ) -> Option<()> {
        let mut lhs = self.entries.iter().peekable();
        let mut rhs = other.entries.iter().peekable();
        loop {
            match (lhs.peek().copied(), rhs.peek().copied()) {
                (Some(l), Some(r)) => match l.0.as_str().cmp(r.0.as_str()) {
                    Ordering::Less => {
                        emit(l);
                        lhs.next();
                    }
                    Ordering::Greater => {
                        emit(r);
                        rhs.next();
                    }
                    Ordering::Equal => {
                        if l.1 != r.1 {
                            return None;
                        }
                        emit(l);
                        lhs.next();
                        rhs.next();
                    }
                },
                (Some(l), None) => {
                    emit(l);
                    lhs.next();
                }
                (None, Some(r)) => {
                    emit(r);
                    rhs.next();
                }
                (None, None) => return Some(()),
            }
        }
    }
}

impl FromIterator<(Variable, Term)> for Binding {
    fn from_iter<T: IntoIterator<Item = (Variable, Term)>>(iter: T) -> Self {
        let mut result = Binding::new();
        for (variable, term) in iter {
            result.insert(variable, term);
        }
        result
    }
}

impl Display for Binding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("{")?;
        for (i, (variable, term)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{variable} -> {term}")?;
        }
        f.write_str("}")
    }
}
