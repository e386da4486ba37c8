use crate::solution::Binding;
use oxrdf::Variable;
use std::fmt::{Display, Formatter};

static EMPTY_BINDING: [Binding; 1] = [Binding::EMPTY];

/// An ordered collection of [Binding]s together with the variables they may bind.
///
/// The sentinels are dedicated variants instead of regular collections so that operators can
/// recognize them without inspecting the bindings:
/// - [Multiset::Identity] has no variables and exactly one empty binding. It is the neutral element
///   of joins.
/// - [Multiset::Null] has no variables and no bindings. It absorbs joins and is the neutral element
///   of unions.
/// - [Multiset::Singleton] is only produced by simulated evaluation. It declares variables but
///   carries a single placeholder binding without values.
///
/// Every binding of [Multiset::Solutions] only binds variables from `variables`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Multiset {
    Identity,
    Null,
    Singleton(Vec<Variable>),
    Solutions {
        variables: Vec<Variable>,
        bindings: Vec<Binding>,
    },
}

impl Multiset {
    /// Creates a new multiset.
    ///
    /// Multisets without variables are normalized to [Multiset::Null] (no bindings) or
    /// [Multiset::Identity] (one binding).
    pub fn new(variables: Vec<Variable>, bindings: Vec<Binding>) -> Self {
        debug_assert!(
            bindings
                .iter()
                .all(|b| b.variables().all(|v| variables.contains(v))),
            "Bindings must only bind declared variables"
        );

        if variables.is_empty() {
            match bindings.len() {
                0 => return Multiset::Null,
                1 => return Multiset::Identity,
                _ => {}
            }
        }
        Multiset::Solutions {
            variables,
            bindings,
        }
    }

    /// Creates a multiset that only contains `binding`.
    pub fn from_binding(binding: Binding) -> Self {
        let variables = binding.variables().cloned().collect();
        Self::new(variables, vec![binding])
    }

    pub fn variables(&self) -> &[Variable] {
        match self {
            Multiset::Identity | Multiset::Null => &[],
            Multiset::Singleton(variables) | Multiset::Solutions { variables, .. } => variables,
        }
    }

    /// The bindings of the multiset. [Multiset::Identity] and [Multiset::Singleton] yield one empty
    /// binding.
    pub fn bindings(&self) -> &[Binding] {
        match self {
            Multiset::Identity | Multiset::Singleton(_) => &EMPTY_BINDING,
            Multiset::Null => &[],
            Multiset::Solutions { bindings, .. } => bindings,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Binding> {
        self.bindings().iter()
    }

    pub fn len(&self) -> usize {
        self.bindings().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings().is_empty()
    }

    /// Returns whether this multiset stems from simulated evaluation.
    pub fn is_singleton(&self) -> bool {
        matches!(self, Multiset::Singleton(_))
    }

    /// Splits the multiset into its variables and bindings.
    pub fn into_parts(self) -> (Vec<Variable>, Vec<Binding>) {
        match self {
            Multiset::Identity => (Vec::new(), vec![Binding::EMPTY]),
            Multiset::Null => (Vec::new(), Vec::new()),
            Multiset::Singleton(variables) => (variables, vec![Binding::EMPTY]),
            Multiset::Solutions {
                variables,
                bindings,
            } => (variables, bindings),
        }
    }

    pub fn into_bindings(self) -> Vec<Binding> {
        self.into_parts().1
    }
}

impl<'a> IntoIterator for &'a Multiset {
    type Item = &'a Binding;
    type IntoIter = std::slice::Iter<'a, Binding>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Display for Multiset {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Multiset::Identity => f.write_str("Identity"),
            Multiset::Null => f.write_str("Null"),
            Multiset::Singleton(variables) => {
                write!(f, "Singleton [")?;
                write_variables(f, variables)?;
                f.write_str("]")
            }
            Multiset::Solutions {
                variables,
                bindings,
            } => {
                write!(f, "Solutions [")?;
                write_variables(f, variables)?;
                f.write_str("]")?;
                for binding in bindings {
                    write!(f, "\n  {binding}")?;
                }
                Ok(())
            }
        }
    }
}

fn write_variables(f: &mut Formatter<'_>, variables: &[Variable]) -> std::fmt::Result {
    for (i, variable) in variables.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{variable}")?;
    }
    Ok(())
}
