use crate::{
    AggregateExpr, AlgebraNode, Expr, OrderKey, PathExpression, PatternElement, TermOrVariable,
    TriplePattern,
};
use rdf_eval_common::{QueryEvaluationError, QueryResult};
use rdf_eval_functions::aggregates::AggregateFunction;
use rdf_eval_functions::{BuiltinName, FunctionName};
use rdf_eval_model::{BlankNode, GroundTerm, NamedNode, NamedNodePattern, Term, Variable};
use spargebra::algebra::{
    AggregateExpression, Expression, Function, GraphPattern, OrderExpression,
    PropertyPathExpression, QueryDataset,
};
use spargebra::term::TermPattern;
use spargebra::Query;

/// The form of a query, i.e., what is produced from its solutions.
#[derive(Clone, Debug)]
pub enum QueryForm {
    Select,
    Ask,
    /// Instantiates the template for every solution. Blank nodes of the template are kept as
    /// terms and replaced with fresh blank nodes per solution.
    Construct { template: Vec<TriplePattern> },
    Describe,
}

/// The RDF dataset of a query as given by `FROM` and `FROM NAMED`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetSpec {
    /// The graphs whose union is the default graph.
    pub default: Vec<NamedNode>,
    /// The graphs that are available to `GRAPH`. If [None], no named graph is available.
    pub named: Option<Vec<NamedNode>>,
}

impl From<&QueryDataset> for DatasetSpec {
    fn from(value: &QueryDataset) -> Self {
        Self {
            default: value.default.clone(),
            named: value.named.clone(),
        }
    }
}

/// A query that has been lowered into the algebra.
#[derive(Clone, Debug)]
pub struct AlgebraQuery {
    pub root: AlgebraNode,
    pub form: QueryForm,
    pub dataset: Option<DatasetSpec>,
    pub base_iri: Option<String>,
}

/// Lowers `spargebra` queries into [AlgebraNode] trees.
///
/// Apart from the one-to-one mapping of the operators, the builder:
/// - represents blank nodes of patterns as variables that are never projected,
/// - folds triple patterns, simple paths, filters, and binds of a group into a single
///   [AlgebraNode::Bgp],
/// - turns `FILTER EXISTS` and `FILTER NOT EXISTS` into an [AlgebraNode::ExistsJoin],
/// - turns filters over aggregations into an [AlgebraNode::Having],
/// - maps top-level closures and negated property sets to their dedicated nodes.
#[derive(Debug, Default)]
pub struct AlgebraBuilder;

impl AlgebraBuilder {
    /// Creates a new [AlgebraBuilder].
    pub fn new() -> Self {
        Self
    }

    /// Lowers a parsed query.
    pub fn build_query(&self, query: &Query) -> QueryResult<AlgebraQuery> {
        let (pattern, dataset, base_iri, form) = match query {
            Query::Select {
                dataset,
                pattern,
                base_iri,
            } => (pattern, dataset, base_iri, QueryForm::Select),
            Query::Ask {
                dataset,
                pattern,
                base_iri,
            } => (pattern, dataset, base_iri, QueryForm::Ask),
            Query::Construct {
                template,
                dataset,
                pattern,
                base_iri,
            } => {
                let template = template
                    .iter()
                    .map(|pattern| self.template_pattern(pattern))
                    .collect();
                (pattern, dataset, base_iri, QueryForm::Construct { template })
            }
            Query::Describe {
                dataset,
                pattern,
                base_iri,
            } => (pattern, dataset, base_iri, QueryForm::Describe),
        };

        let inner = self.build_pattern(pattern)?;
        let root = match form {
            QueryForm::Ask => AlgebraNode::Ask {
                inner: Box::new(inner),
            },
            _ => inner,
        };

        Ok(AlgebraQuery {
            root,
            form,
            dataset: dataset.as_ref().map(DatasetSpec::from),
            base_iri: base_iri.as_ref().map(|iri| iri.as_str().to_owned()),
        })
    }

    /// Lowers a graph pattern.
    pub fn build_pattern(&self, pattern: &GraphPattern) -> QueryResult<AlgebraNode> {
        Ok(match pattern {
            GraphPattern::Bgp { patterns } => AlgebraNode::Bgp(
                patterns
                    .iter()
                    .map(|pattern| PatternElement::Triple(self.triple_pattern(pattern)))
                    .collect(),
            ),
            GraphPattern::Path {
                subject,
                path,
                object,
            } => self.build_path_pattern(subject, path, object),
            GraphPattern::Join { left, right } => {
                join(self.build_pattern(left)?, self.build_pattern(right)?)
            }
            GraphPattern::LeftJoin {
                left,
                right,
                expression,
            } => AlgebraNode::LeftJoin {
                left: Box::new(self.build_pattern(left)?),
                right: Box::new(self.build_pattern(right)?),
                expression: expression
                    .as_ref()
                    .map(|expression| self.build_expression(expression))
                    .transpose()?,
            },
            GraphPattern::Filter { expr, inner } => self.build_filter(expr, inner)?,
            GraphPattern::Union { left, right } => AlgebraNode::Union {
                left: Box::new(self.build_pattern(left)?),
                right: Box::new(self.build_pattern(right)?),
            },
            GraphPattern::Graph { name, inner } => AlgebraNode::Graph {
                inner: Box::new(self.build_pattern(inner)?),
                name: name.clone(),
            },
            GraphPattern::Extend {
                inner,
                variable,
                expression,
            } => {
                let inner = self.build_pattern(inner)?;
                let expression = self.build_expression(expression)?;
                match inner {
                    AlgebraNode::Bgp(mut elements) => {
                        elements.push(PatternElement::Assign {
                            variable: variable.clone(),
                            expression,
                        });
                        AlgebraNode::Bgp(elements)
                    }
                    inner => AlgebraNode::Extend {
                        inner: Box::new(inner),
                        variable: variable.clone(),
                        expression,
                    },
                }
            }
            GraphPattern::Minus { left, right } => AlgebraNode::Minus {
                left: Box::new(self.build_pattern(left)?),
                right: Box::new(self.build_pattern(right)?),
            },
            GraphPattern::Values {
                variables,
                bindings,
            } => AlgebraNode::Values {
                variables: variables.clone(),
                bindings: bindings
                    .iter()
                    .map(|row| {
                        row.iter()
                            .map(|value| value.as_ref().map(ground_term))
                            .collect()
                    })
                    .collect(),
            },
            GraphPattern::OrderBy { inner, expression } => AlgebraNode::OrderBy {
                inner: Box::new(self.build_pattern(inner)?),
                keys: expression
                    .iter()
                    .map(|key| {
                        Ok(match key {
                            OrderExpression::Asc(expression) => {
                                OrderKey::asc(self.build_expression(expression)?)
                            }
                            OrderExpression::Desc(expression) => {
                                OrderKey::desc(self.build_expression(expression)?)
                            }
                        })
                    })
                    .collect::<QueryResult<_>>()?,
            },
            GraphPattern::Project { inner, variables } => AlgebraNode::Project {
                inner: Box::new(self.build_pattern(inner)?),
                variables: variables.clone(),
            },
            GraphPattern::Distinct { inner } => AlgebraNode::Distinct {
                inner: Box::new(self.build_pattern(inner)?),
            },
            GraphPattern::Reduced { inner } => AlgebraNode::Reduced {
                inner: Box::new(self.build_pattern(inner)?),
            },
            GraphPattern::Slice {
                inner,
                start,
                length,
            } => AlgebraNode::Slice {
                inner: Box::new(self.build_pattern(inner)?),
                offset: *start,
                limit: *length,
            },
            GraphPattern::Group {
                inner,
                variables,
                aggregates,
            } => AlgebraNode::Group {
                inner: Box::new(self.build_pattern(inner)?),
                variables: variables.clone(),
                aggregates: aggregates
                    .iter()
                    .map(|(variable, aggregate)| {
                        Ok((variable.clone(), self.build_aggregate(aggregate)?))
                    })
                    .collect::<QueryResult<_>>()?,
            },
            GraphPattern::Service {
                name,
                inner,
                silent,
            } => AlgebraNode::Service {
                name: name.clone(),
                variables: self.build_pattern(inner)?.variables(),
                pattern: inner.clone(),
                silent: *silent,
            },
        })
    }

    fn build_filter(&self, expr: &Expression, inner: &GraphPattern) -> QueryResult<AlgebraNode> {
        let inner = self.build_pattern(inner)?;
        match expr {
            Expression::Exists(pattern) => {
                return Ok(AlgebraNode::ExistsJoin {
                    left: Box::new(inner),
                    right: Box::new(self.build_pattern(pattern)?),
                    negated: false,
                })
            }
            Expression::Not(negated) => {
                if let Expression::Exists(pattern) = negated.as_ref() {
                    return Ok(AlgebraNode::ExistsJoin {
                        left: Box::new(inner),
                        right: Box::new(self.build_pattern(pattern)?),
                        negated: true,
                    });
                }
            }
            _ => {}
        }

        let expression = self.build_expression(expr)?;
        Ok(match inner {
            AlgebraNode::Bgp(mut elements) => {
                elements.push(PatternElement::Filter(expression));
                AlgebraNode::Bgp(elements)
            }
            inner if is_aggregation(&inner) => AlgebraNode::Having {
                inner: Box::new(inner),
                expression,
            },
            inner => AlgebraNode::Filter {
                inner: Box::new(inner),
                expression,
            },
        })
    }

    fn build_path_pattern(
        &self,
        subject: &TermPattern,
        path: &PropertyPathExpression,
        object: &TermPattern,
    ) -> AlgebraNode {
        let subject = self.term_pattern(subject);
        let object = self.term_pattern(object);
        match path {
            PropertyPathExpression::ZeroOrMore(inner) => AlgebraNode::ZeroOrMorePath {
                subject,
                path: self.build_path(inner),
                object,
            },
            PropertyPathExpression::OneOrMore(inner) => AlgebraNode::OneOrMorePath {
                subject,
                path: self.build_path(inner),
                object,
            },
            PropertyPathExpression::NegatedPropertySet(predicates) => {
                AlgebraNode::NegatedPropertySet {
                    subject,
                    forward: predicates.clone(),
                    inverse: Vec::new(),
                    object,
                }
            }
            path => {
                let element = match self.build_path(path) {
                    PathExpression::Property {
                        predicate,
                        inverse: false,
                    } => PatternElement::Triple(TriplePattern::new(subject, predicate, object)),
                    PathExpression::Property {
                        predicate,
                        inverse: true,
                    } => PatternElement::Triple(TriplePattern::new(object, predicate, subject)),
                    path => PatternElement::Path {
                        subject,
                        path,
                        object,
                    },
                };
                AlgebraNode::Bgp(vec![element])
            }
        }
    }

    /// Lowers a property path expression.
    pub fn build_path(&self, path: &PropertyPathExpression) -> PathExpression {
        match path {
            PropertyPathExpression::NamedNode(predicate) => PathExpression::property(predicate.clone()),
            PropertyPathExpression::Reverse(inner) => self.build_path(inner).inverted(),
            PropertyPathExpression::Sequence(lhs, rhs) => PathExpression::Sequence(
                Box::new(self.build_path(lhs)),
                Box::new(self.build_path(rhs)),
            ),
            PropertyPathExpression::Alternative(lhs, rhs) => {
                match (self.build_path(lhs), self.build_path(rhs)) {
                    // !(a | ^b) is parsed as an alternative of two negated sets.
                    (
                        PathExpression::NegatedSet {
                            forward,
                            inverse: lhs_inverse,
                        },
                        PathExpression::NegatedSet {
                            forward: rhs_forward,
                            inverse,
                        },
                    ) if lhs_inverse.is_empty() && rhs_forward.is_empty() => {
                        PathExpression::NegatedSet { forward, inverse }
                    }
                    (lhs, rhs) => PathExpression::Alternative(Box::new(lhs), Box::new(rhs)),
                }
            }
            PropertyPathExpression::ZeroOrMore(inner) => {
                PathExpression::ZeroOrMore(Box::new(self.build_path(inner)))
            }
            PropertyPathExpression::OneOrMore(inner) => {
                PathExpression::OneOrMore(Box::new(self.build_path(inner)))
            }
            PropertyPathExpression::ZeroOrOne(inner) => {
                PathExpression::ZeroOrOne(Box::new(self.build_path(inner)))
            }
            PropertyPathExpression::NegatedPropertySet(predicates) => PathExpression::NegatedSet {
                forward: predicates.clone(),
                inverse: Vec::new(),
            },
        }
    }

    /// Lowers an expression.
    pub fn build_expression(&self, expression: &Expression) -> QueryResult<Expr> {
        let build = |expression: &Expression| self.build_expression(expression).map(Box::new);
        Ok(match expression {
            Expression::NamedNode(node) => Expr::Constant(node.clone().into()),
            Expression::Literal(literal) => Expr::Constant(literal.clone().into()),
            Expression::Variable(variable) => Expr::Variable(variable.clone()),
            Expression::Or(lhs, rhs) => Expr::Or(build(lhs)?, build(rhs)?),
            Expression::And(lhs, rhs) => Expr::And(build(lhs)?, build(rhs)?),
            Expression::Equal(lhs, rhs) => Expr::Equal(build(lhs)?, build(rhs)?),
            Expression::SameTerm(lhs, rhs) => Expr::SameTerm(build(lhs)?, build(rhs)?),
            Expression::Greater(lhs, rhs) => Expr::Greater(build(lhs)?, build(rhs)?),
            Expression::GreaterOrEqual(lhs, rhs) => {
                Expr::GreaterOrEqual(build(lhs)?, build(rhs)?)
            }
            Expression::Less(lhs, rhs) => Expr::Less(build(lhs)?, build(rhs)?),
            Expression::LessOrEqual(lhs, rhs) => Expr::LessOrEqual(build(lhs)?, build(rhs)?),
            Expression::In(lhs, list) => Expr::In(
                build(lhs)?,
                list.iter()
                    .map(|expression| self.build_expression(expression))
                    .collect::<QueryResult<_>>()?,
            ),
            Expression::Add(lhs, rhs) => Expr::Add(build(lhs)?, build(rhs)?),
            Expression::Subtract(lhs, rhs) => Expr::Subtract(build(lhs)?, build(rhs)?),
            Expression::Multiply(lhs, rhs) => Expr::Multiply(build(lhs)?, build(rhs)?),
            Expression::Divide(lhs, rhs) => Expr::Divide(build(lhs)?, build(rhs)?),
            Expression::UnaryPlus(inner) => Expr::UnaryPlus(build(inner)?),
            Expression::UnaryMinus(inner) => Expr::UnaryMinus(build(inner)?),
            Expression::Not(inner) => Expr::Not(build(inner)?),
            Expression::Exists(pattern) => Expr::Exists(Box::new(self.build_pattern(pattern)?)),
            Expression::Bound(variable) => Expr::Bound(variable.clone()),
            Expression::If(condition, then, otherwise) => {
                Expr::If(build(condition)?, build(then)?, build(otherwise)?)
            }
            Expression::Coalesce(args) => Expr::Coalesce(
                args.iter()
                    .map(|expression| self.build_expression(expression))
                    .collect::<QueryResult<_>>()?,
            ),
            Expression::FunctionCall(function, args) => Expr::FunctionCall(
                function_name(function)?,
                args.iter()
                    .map(|expression| self.build_expression(expression))
                    .collect::<QueryResult<_>>()?,
            ),
        })
    }

    fn build_aggregate(&self, aggregate: &AggregateExpression) -> QueryResult<AggregateExpr> {
        Ok(match aggregate {
            AggregateExpression::CountSolutions { distinct } => AggregateExpr::CountSolutions {
                distinct: *distinct,
            },
            AggregateExpression::FunctionCall {
                name,
                expr,
                distinct,
            } => {
                let function = match name {
                    spargebra::algebra::AggregateFunction::Count => AggregateFunction::Count,
                    spargebra::algebra::AggregateFunction::Sum => AggregateFunction::Sum,
                    spargebra::algebra::AggregateFunction::Avg => AggregateFunction::Avg,
                    spargebra::algebra::AggregateFunction::Min => AggregateFunction::Min,
                    spargebra::algebra::AggregateFunction::Max => AggregateFunction::Max,
                    spargebra::algebra::AggregateFunction::Sample => AggregateFunction::Sample,
                    spargebra::algebra::AggregateFunction::GroupConcat { separator } => {
                        AggregateFunction::GroupConcat {
                            separator: separator.clone(),
                        }
                    }
                    spargebra::algebra::AggregateFunction::Custom(name) => {
                        AggregateFunction::Custom(name.clone())
                    }
                };
                AggregateExpr::Function {
                    function,
                    expr: Box::new(self.build_expression(expr)?),
                    distinct: *distinct,
                }
            }
        })
    }

    fn triple_pattern(&self, pattern: &spargebra::term::TriplePattern) -> TriplePattern {
        TriplePattern {
            subject: self.term_pattern(&pattern.subject),
            predicate: named_node_pattern(&pattern.predicate),
            object: self.term_pattern(&pattern.object),
        }
    }

    fn term_pattern(&self, pattern: &TermPattern) -> TermOrVariable {
        match pattern {
            TermPattern::NamedNode(node) => TermOrVariable::Term(node.clone().into()),
            TermPattern::BlankNode(node) => TermOrVariable::Variable(blank_node_variable(node)),
            TermPattern::Literal(literal) => TermOrVariable::Term(literal.clone().into()),
            TermPattern::Variable(variable) => TermOrVariable::Variable(variable.clone()),
        }
    }

    fn template_pattern(&self, pattern: &spargebra::term::TriplePattern) -> TriplePattern {
        let term = |pattern: &TermPattern| match pattern {
            TermPattern::BlankNode(node) => TermOrVariable::Term(node.clone().into()),
            pattern => self.term_pattern(pattern),
        };
        TriplePattern {
            subject: term(&pattern.subject),
            predicate: named_node_pattern(&pattern.predicate),
            object: term(&pattern.object),
        }
    }
}

/// The variable that represents a blank node of a query pattern.
pub(crate) fn blank_node_variable(node: &BlankNode) -> Variable {
    Variable::new_unchecked(format!("__bnode_{}", node.as_str()))
}

fn named_node_pattern(pattern: &NamedNodePattern) -> TermOrVariable {
    match pattern {
        NamedNodePattern::NamedNode(node) => TermOrVariable::Term(node.clone().into()),
        NamedNodePattern::Variable(variable) => TermOrVariable::Variable(variable.clone()),
    }
}

fn ground_term(term: &GroundTerm) -> Term {
    match term {
        GroundTerm::NamedNode(node) => node.clone().into(),
        GroundTerm::Literal(literal) => literal.clone().into(),
    }
}

/// Joins two nodes, merging them into a single [AlgebraNode::Bgp] where possible.
fn join(left: AlgebraNode, right: AlgebraNode) -> AlgebraNode {
    match (left, right) {
        (AlgebraNode::Bgp(mut left), AlgebraNode::Bgp(right))
            if filters_are_closed(&left) && filters_are_closed(&right) =>
        {
            left.extend(right);
            AlgebraNode::Bgp(left)
        }
        (AlgebraNode::Bgp(mut left), right) if filters_are_closed(&left) && is_sub_query(&right) => {
            left.push(PatternElement::SubQuery(Box::new(right)));
            AlgebraNode::Bgp(left)
        }
        (left, right) => AlgebraNode::Join {
            left: Box::new(left),
            right: Box::new(right),
        },
    }
}

/// Whether all filters of the elements only reference variables that the elements bind.
///
/// A filter of a nested group must not see the variables of its siblings. Merging such a group
/// with its siblings would change the result of the filter.
fn filters_are_closed(elements: &[PatternElement]) -> bool {
    let bound = elements
        .iter()
        .flat_map(PatternElement::bound_variables)
        .collect::<Vec<_>>();
    elements.iter().all(|element| match element {
        PatternElement::Filter(expression) => expression
            .variables()
            .iter()
            .all(|variable| bound.contains(variable)),
        _ => true,
    })
}

/// Whether the solutions of `node` are groups of an aggregation.
fn is_aggregation(node: &AlgebraNode) -> bool {
    match node {
        AlgebraNode::Group { .. } | AlgebraNode::Having { .. } => true,
        AlgebraNode::Extend { inner, .. } => is_aggregation(inner),
        _ => false,
    }
}

fn is_sub_query(node: &AlgebraNode) -> bool {
    matches!(
        node,
        AlgebraNode::Project { .. }
            | AlgebraNode::Distinct { .. }
            | AlgebraNode::Reduced { .. }
            | AlgebraNode::Slice { .. }
    )
}

fn function_name(function: &Function) -> QueryResult<FunctionName> {
    let builtin = match function {
        Function::Str => BuiltinName::Str,
        Function::Lang => BuiltinName::Lang,
        Function::LangMatches => BuiltinName::LangMatches,
        Function::Datatype => BuiltinName::Datatype,
        Function::Iri => BuiltinName::Iri,
        Function::BNode => BuiltinName::BNode,
        Function::Rand => BuiltinName::Rand,
        Function::Abs => BuiltinName::Abs,
        Function::Ceil => BuiltinName::Ceil,
        Function::Floor => BuiltinName::Floor,
        Function::Round => BuiltinName::Round,
        Function::Concat => BuiltinName::Concat,
        Function::SubStr => BuiltinName::SubStr,
        Function::StrLen => BuiltinName::StrLen,
        Function::Replace => BuiltinName::Replace,
        Function::UCase => BuiltinName::UCase,
        Function::LCase => BuiltinName::LCase,
        Function::EncodeForUri => BuiltinName::EncodeForUri,
        Function::Contains => BuiltinName::Contains,
        Function::StrStarts => BuiltinName::StrStarts,
        Function::StrEnds => BuiltinName::StrEnds,
        Function::StrBefore => BuiltinName::StrBefore,
        Function::StrAfter => BuiltinName::StrAfter,
        Function::Uuid => BuiltinName::Uuid,
        Function::StrUuid => BuiltinName::StrUuid,
        Function::Md5 => BuiltinName::Md5,
        Function::Sha1 => BuiltinName::Sha1,
        Function::Sha256 => BuiltinName::Sha256,
        Function::Sha384 => BuiltinName::Sha384,
        Function::Sha512 => BuiltinName::Sha512,
        Function::StrLang => BuiltinName::StrLang,
        Function::StrDt => BuiltinName::StrDt,
        Function::IsIri => BuiltinName::IsIri,
        Function::IsBlank => BuiltinName::IsBlank,
        Function::IsLiteral => BuiltinName::IsLiteral,
        Function::IsNumeric => BuiltinName::IsNumeric,
        Function::Regex => BuiltinName::Regex,
        Function::Custom(name) => {
            return Ok(match BuiltinName::from_cast_function(name.as_ref()) {
                Some(builtin) => FunctionName::Builtin(builtin),
                None => FunctionName::Custom(name.clone()),
            })
        }
        Function::Year
        | Function::Month
        | Function::Day
        | Function::Hours
        | Function::Minutes
        | Function::Seconds
        | Function::Timezone
        | Function::Tz
        | Function::Now => {
            return Err(QueryEvaluationError::NotImplemented(format!(
                "The date and time function {function} is not supported."
            )))
        }
    };
    Ok(FunctionName::Builtin(builtin))
}
