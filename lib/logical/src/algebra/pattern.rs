use crate::{AlgebraNode, Expr, PathExpression};
use rdf_eval_model::{Binding, Literal, NamedNode, Term, Variable};
use std::fmt::{Display, Formatter};

/// A position of a pattern that is either fixed or a variable.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TermOrVariable {
    Term(Term),
    Variable(Variable),
}

impl TermOrVariable {
    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            TermOrVariable::Variable(variable) => Some(variable),
            TermOrVariable::Term(_) => None,
        }
    }

    pub fn as_term(&self) -> Option<&Term> {
        match self {
            TermOrVariable::Term(term) => Some(term),
            TermOrVariable::Variable(_) => None,
        }
    }

    /// Returns the fixed term or the value of the variable in `binding`.
    pub fn resolve<'a>(&'a self, binding: &'a Binding) -> Option<&'a Term> {
        match self {
            TermOrVariable::Term(term) => Some(term),
            TermOrVariable::Variable(variable) => binding.get(variable),
        }
    }

    /// Replaces the variable with its value in `binding`, if it is bound.
    #[must_use]
    pub fn substitute(&self, binding: &Binding) -> TermOrVariable {
        match self.resolve(binding) {
            Some(term) => TermOrVariable::Term(term.clone()),
            None => self.clone(),
        }
    }
}

impl From<Variable> for TermOrVariable {
    fn from(value: Variable) -> Self {
        TermOrVariable::Variable(value)
    }
}

impl From<Term> for TermOrVariable {
    fn from(value: Term) -> Self {
        TermOrVariable::Term(value)
    }
}

impl From<NamedNode> for TermOrVariable {
    fn from(value: NamedNode) -> Self {
        TermOrVariable::Term(value.into())
    }
}

impl From<Literal> for TermOrVariable {
    fn from(value: Literal) -> Self {
        TermOrVariable::Term(value.into())
    }
}

impl Display for TermOrVariable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TermOrVariable::Term(term) => write!(f, "{term}"),
            TermOrVariable::Variable(variable) => write!(f, "{variable}"),
        }
    }
}

/// A triple pattern. Blank nodes of the query are represented as variables.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TriplePattern {
    pub subject: TermOrVariable,
    pub predicate: TermOrVariable,
    pub object: TermOrVariable,
}

impl TriplePattern {
    pub fn new(
        subject: impl Into<TermOrVariable>,
        predicate: impl Into<TermOrVariable>,
        object: impl Into<TermOrVariable>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    /// The distinct variables of the pattern in subject, predicate, object order.
    pub fn variables(&self) -> Vec<Variable> {
        let mut result = Vec::new();
        for position in [&self.subject, &self.predicate, &self.object] {
            if let Some(variable) = position.as_variable() {
                if !result.contains(variable) {
                    result.push(variable.clone());
                }
            }
        }
        result
    }
}

impl Display for TriplePattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)
    }
}

/// An element of a [AlgebraNode::Bgp].
#[derive(Clone, Debug)]
pub enum PatternElement {
    Triple(TriplePattern),
    Path {
        subject: TermOrVariable,
        path: PathExpression,
        object: TermOrVariable,
    },
    /// Binds the value of `expression` to `variable`. Fails if `variable` is already bound.
    Assign { variable: Variable, expression: Expr },
    /// A nested query whose solutions are joined with the other elements.
    SubQuery(Box<AlgebraNode>),
    /// Discards bindings for which the expression is not true.
    Filter(Expr),
}

impl PatternElement {
    /// The variables that are bound by this element.
    pub fn bound_variables(&self) -> Vec<Variable> {
        match self {
            PatternElement::Triple(pattern) => pattern.variables(),
            PatternElement::Path {
                subject, object, ..
            } => {
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
            PatternElement::Assign { variable, .. } => vec![variable.clone()],
            PatternElement::SubQuery(node) => node.variables(),
            PatternElement::Filter(_) => Vec::new(),
        }
    }

    /// The variables that must be bound before this element can be placed.
    pub fn required_variables(&self) -> Vec<Variable> {
        match self {
            PatternElement::Assign {
                variable,
                expression,
            } => {
                let mut result = expression.variables();
                if !result.contains(variable) {
                    result.push(variable.clone());
                }
                result
            }
            PatternElement::Filter(expression) => expression.variables(),
            _ => Vec::new(),
        }
    }
}

impl Display for PatternElement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternElement::Triple(pattern) => write!(f, "{pattern}"),
            PatternElement::Path {
                subject,
                path,
                object,
            } => write!(f, "Path: {subject} {path} {object}"),
            PatternElement::Assign {
                variable,
                expression,
            } => write!(f, "Bind: {variable} := {expression}"),
            PatternElement::SubQuery(node) => write!(f, "SubQuery: {}", node.name()),
            PatternElement::Filter(expression) => write!(f, "Filter: {expression}"),
        }
    }
}
