use crate::{AlgebraNode, PatternElement};
use itertools::Itertools;
use std::fmt::{Display, Formatter};

impl Display for AlgebraNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.fmt_indent(f, 0)
    }
}

impl AlgebraNode {
    fn fmt_indent(&self, f: &mut Formatter<'_>, indent: usize) -> std::fmt::Result {
        write!(f, "{:indent$}", "")?;
        self.fmt_line(f)?;
        writeln!(f)?;

        if let AlgebraNode::Bgp(elements) = self {
            for element in elements {
                match element {
                    PatternElement::SubQuery(node) => {
                        writeln!(f, "{:width$}SubQuery", "", width = indent + 2)?;
                        node.fmt_indent(f, indent + 4)?;
                    }
                    element => writeln!(f, "{:width$}{element}", "", width = indent + 2)?,
                }
            }
            return Ok(());
        }

        for child in self.children() {
            child.fmt_indent(f, indent + 2)?;
        }
        Ok(())
    }

    fn fmt_line(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AlgebraNode::LeftJoin {
                expression: Some(expression),
                ..
            } => write!(f, "LeftJoin: {expression}"),
            AlgebraNode::Filter { expression, .. } => write!(f, "Filter: {expression}"),
            AlgebraNode::Extend {
                variable,
                expression,
                ..
            } => write!(f, "Extend: {variable} := {expression}"),
            AlgebraNode::Group {
                variables,
                aggregates,
                ..
            } => {
                write!(f, "Group: [{}]", variables.iter().join(" "))?;
                for (variable, aggregate) in aggregates {
                    write!(f, ", {variable} := {aggregate}")?;
                }
                Ok(())
            }
            AlgebraNode::Having { expression, .. } => write!(f, "Having: {expression}"),
            AlgebraNode::OrderBy { keys, .. } => write!(f, "OrderBy: {}", keys.iter().join(", ")),
            AlgebraNode::Project { variables, .. } => {
                write!(f, "Project: {}", variables.iter().join(" "))
            }
            AlgebraNode::Slice { offset, limit, .. } => match limit {
                Some(limit) => write!(f, "Slice: offset={offset}, limit={limit}"),
                None => write!(f, "Slice: offset={offset}"),
            },
            AlgebraNode::Graph { name, .. } => write!(f, "Graph: {name}"),
            AlgebraNode::Service {
                name,
                variables,
                silent,
                ..
            } => {
                write!(f, "Service: {name} [{}]", variables.iter().join(" "))?;
                if *silent {
                    f.write_str(" SILENT")?;
                }
                Ok(())
            }
            AlgebraNode::Values {
                variables,
                bindings,
            } => write!(
                f,
                "Values: [{}] ({} rows)",
                variables.iter().join(" "),
                bindings.len()
            ),
            AlgebraNode::ZeroLengthPath { subject, object } => {
                write!(f, "ZeroLengthPath: {subject} {object}")
            }
            AlgebraNode::ZeroOrMorePath {
                subject,
                path,
                object,
            }
            | AlgebraNode::OneOrMorePath {
                subject,
                path,
                object,
            } => write!(f, "{}: {subject} {path} {object}", self.name()),
            AlgebraNode::NegatedPropertySet {
                subject,
                forward,
                inverse,
                object,
            } => {
                let predicates = forward
                    .iter()
                    .map(ToString::to_string)
                    .chain(inverse.iter().map(|p| format!("^{p}")))
                    .join(" | ");
                write!(f, "NegatedPropertySet: {subject} !({predicates}) {object}")
            }
            AlgebraNode::Limit { limit, .. } => write!(f, "Limit: {limit}"),
            _ => f.write_str(self.name()),
        }
    }
}

