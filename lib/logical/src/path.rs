use rdf_eval_model::NamedNode;
use std::fmt::{Display, Formatter};

/// A [property path](https://www.w3.org/TR/sparql11-query/#propertypaths) expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathExpression {
    /// A single predicate that is either traversed forward or, if `inverse` is set, backward.
    Property { predicate: NamedNode, inverse: bool },
    /// Traverses the inner path backward.
    Inverse(Box<PathExpression>),
    /// `lhs / rhs`
    Sequence(Box<PathExpression>, Box<PathExpression>),
    /// `lhs | rhs`
    Alternative(Box<PathExpression>, Box<PathExpression>),
    ZeroOrOne(Box<PathExpression>),
    ZeroOrMore(Box<PathExpression>),
    OneOrMore(Box<PathExpression>),
    /// A negated property set `!(p1 | ^p2)`.
    ///
    /// Forward edges are only traversed if `forward` is not empty and backward edges are only
    /// traversed if `inverse` is not empty. An edge matches if its predicate is not part of the
    /// set for its direction.
    NegatedSet {
        forward: Vec<NamedNode>,
        inverse: Vec<NamedNode>,
    },
    /// The inner path repeated exactly `n` times. A length of zero relates every node to itself.
    FixedLength(Box<PathExpression>, usize),
}

impl PathExpression {
    /// Creates a forward [PathExpression::Property].
    pub fn property(predicate: impl Into<NamedNode>) -> Self {
        Self::Property {
            predicate: predicate.into(),
            inverse: false,
        }
    }

    /// Creates a backward [PathExpression::Property].
    pub fn inverse_property(predicate: impl Into<NamedNode>) -> Self {
        Self::Property {
            predicate: predicate.into(),
            inverse: true,
        }
    }

    /// Returns the path that matches the same pairs as `self` but with swapped endpoints.
    ///
    /// Single predicates are flipped directly. Everything else is wrapped in
    /// [PathExpression::Inverse].
    pub fn inverted(self) -> Self {
        match self {
            Self::Property { predicate, inverse } => Self::Property {
                predicate,
                inverse: !inverse,
            },
            Self::Inverse(inner) => *inner,
            Self::NegatedSet { forward, inverse } => Self::NegatedSet {
                forward: inverse,
                inverse: forward,
            },
            other => Self::Inverse(Box::new(other)),
        }
    }

    /// Returns the predicate if this path is a simple forward predicate.
    pub fn as_forward_property(&self) -> Option<&NamedNode> {
        match self {
            Self::Property {
                predicate,
                inverse: false,
            } => Some(predicate),
            _ => None,
        }
    }

    /// Whether this path can relate a node to itself without traversing an edge.
    pub fn matches_zero_length(&self) -> bool {
        match self {
            Self::Property { .. } | Self::NegatedSet { .. } | Self::OneOrMore(_) => false,
            Self::ZeroOrOne(_) | Self::ZeroOrMore(_) => true,
            Self::FixedLength(inner, n) => *n == 0 || inner.matches_zero_length(),
            Self::Inverse(inner) => inner.matches_zero_length(),
            Self::Sequence(lhs, rhs) => lhs.matches_zero_length() && rhs.matches_zero_length(),
            Self::Alternative(lhs, rhs) => lhs.matches_zero_length() || rhs.matches_zero_length(),
        }
    }
}

impl Display for PathExpression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Property { predicate, inverse } => {
                if *inverse {
                    write!(f, "^{predicate}")
                } else {
                    write!(f, "{predicate}")
                }
            }
            Self::Inverse(inner) => write!(f, "^({inner})"),
            Self::Sequence(lhs, rhs) => write!(f, "({lhs} / {rhs})"),
            Self::Alternative(lhs, rhs) => write!(f, "({lhs} | {rhs})"),
            Self::ZeroOrOne(inner) => write!(f, "({inner})?"),
            Self::ZeroOrMore(inner) => write!(f, "({inner})*"),
            Self::OneOrMore(inner) => write!(f, "({inner})+"),
            Self::NegatedSet { forward, inverse } => {
                f.write_str("!(")?;
                let mut first = true;
                for predicate in forward {
                    if !first {
                        f.write_str(" | ")?;
                    }
                    first = false;
                    write!(f, "{predicate}")?;
                }
                for predicate in inverse {
                    if !first {
                        f.write_str(" | ")?;
                    }
                    first = false;
                    write!(f, "^{predicate}")?;
                }
                f.write_str(")")
            }
            Self::FixedLength(inner, n) => write!(f, "({inner}){{{n}}}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ex(name: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("http://example.com/{name}"))
    }

    #[test]
    fn inverted_flips_simple_predicates() {
        let path = PathExpression::property(ex("p")).inverted();
        assert_eq!(path, PathExpression::inverse_property(ex("p")));
        assert_eq!(path.inverted(), PathExpression::property(ex("p")));
    }

    #[test]
    fn inverted_wraps_complex_paths() {
        let path = PathExpression::OneOrMore(Box::new(PathExpression::property(ex("p"))));
        let inverted = path.clone().inverted();
        assert_eq!(inverted, PathExpression::Inverse(Box::new(path.clone())));
        assert_eq!(inverted.inverted(), path);
    }

    #[test]
    fn zero_length_matching() {
        let p = PathExpression::property(ex("p"));
        assert!(!p.matches_zero_length());
        assert!(PathExpression::ZeroOrMore(Box::new(p.clone())).matches_zero_length());
        assert!(PathExpression::FixedLength(Box::new(p.clone()), 0).matches_zero_length());
        assert!(!PathExpression::FixedLength(Box::new(p.clone()), 2).matches_zero_length());
        assert!(PathExpression::Alternative(
            Box::new(p.clone()),
            Box::new(PathExpression::ZeroOrOne(Box::new(p)))
        )
        .matches_zero_length());
    }

    #[test]
    fn display_negated_set() {
        let path = PathExpression::NegatedSet {
            forward: vec![ex("a")],
            inverse: vec![ex("b")],
        };
        insta::assert_snapshot!(path, @"!(<http://example.com/a> | ^<http://example.com/b>)");
    }
}
