use crate::AlgebraNode;
use rdf_eval_common::QueryResult;
use rdf_eval_functions::aggregates::AggregateFunction;
use rdf_eval_functions::FunctionName;
use rdf_eval_model::{Term, Variable};
use std::fmt::{Display, Formatter};

/// An expression that is evaluated against a single solution.
#[derive(Clone, Debug)]
pub enum Expr {
    Constant(Term),
    Variable(Variable),
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Equal(Box<Expr>, Box<Expr>),
    SameTerm(Box<Expr>, Box<Expr>),
    Greater(Box<Expr>, Box<Expr>),
    GreaterOrEqual(Box<Expr>, Box<Expr>),
    Less(Box<Expr>, Box<Expr>),
    LessOrEqual(Box<Expr>, Box<Expr>),
    In(Box<Expr>, Vec<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Subtract(Box<Expr>, Box<Expr>),
    Multiply(Box<Expr>, Box<Expr>),
    Divide(Box<Expr>, Box<Expr>),
    UnaryPlus(Box<Expr>),
    UnaryMinus(Box<Expr>),
    Bound(Variable),
    If(Box<Expr>, Box<Expr>, Box<Expr>),
    Coalesce(Vec<Expr>),
    /// Whether the pattern has at least one solution that is compatible with the current one.
    Exists(Box<AlgebraNode>),
    FunctionCall(FunctionName, Vec<Expr>),
}

impl Expr {
    /// Shorthand for creating an [Expr::Variable].
    pub fn variable(variable: &Variable) -> Self {
        Self::Variable(variable.clone())
    }

    /// Shorthand for creating an [Expr::Constant].
    pub fn constant(term: impl Into<Term>) -> Self {
        Self::Constant(term.into())
    }

    /// Returns all variables that influence the result of this expression.
    ///
    /// For `EXISTS`, the variables of the inner pattern are included, as the current solution is
    /// substituted into the pattern.
    pub fn variables(&self) -> Vec<Variable> {
        let mut result = Vec::new();
        self.collect_variables(&mut result);
        result
    }

    pub(crate) fn collect_variables(&self, result: &mut Vec<Variable>) {
        match self {
            Expr::Constant(_) => {}
            Expr::Variable(variable) | Expr::Bound(variable) => push_unique(result, variable),
            Expr::Not(inner) | Expr::UnaryPlus(inner) | Expr::UnaryMinus(inner) => {
                inner.collect_variables(result);
            }
            Expr::Or(lhs, rhs)
            | Expr::And(lhs, rhs)
            | Expr::Equal(lhs, rhs)
            | Expr::SameTerm(lhs, rhs)
            | Expr::Greater(lhs, rhs)
            | Expr::GreaterOrEqual(lhs, rhs)
            | Expr::Less(lhs, rhs)
            | Expr::LessOrEqual(lhs, rhs)
            | Expr::Add(lhs, rhs)
            | Expr::Subtract(lhs, rhs)
            | Expr::Multiply(lhs, rhs)
            | Expr::Divide(lhs, rhs) => {
                lhs.collect_variables(result);
                rhs.collect_variables(result);
            }
            Expr::In(lhs, list) => {
                lhs.collect_variables(result);
                for expr in list {
                    expr.collect_variables(result);
                }
            }
            Expr::If(condition, then, otherwise) => {
                condition.collect_variables(result);
                then.collect_variables(result);
                otherwise.collect_variables(result);
            }
            Expr::Coalesce(args) | Expr::FunctionCall(_, args) => {
                for expr in args {
                    expr.collect_variables(result);
                }
            }
            Expr::Exists(pattern) => {
                for variable in pattern.mentioned_variables() {
                    push_unique(result, &variable);
                }
            }
        }
    }

    /// Whether this expression contains an `EXISTS`.
    pub fn contains_exists(&self) -> bool {
        let mut found = false;
        self.visit(&mut |expr| {
            if matches!(expr, Expr::Exists(_)) {
                found = true;
            }
        });
        found
    }

    /// Calls `f` on this expression and all sub-expressions (pre-order). Does not descend into
    /// the patterns of `EXISTS`.
    pub fn visit(&self, f: &mut dyn FnMut(&Expr)) {
        f(self);
        match self {
            Expr::Constant(_) | Expr::Variable(_) | Expr::Bound(_) | Expr::Exists(_) => {}
            Expr::Not(inner) | Expr::UnaryPlus(inner) | Expr::UnaryMinus(inner) => inner.visit(f),
            Expr::Or(lhs, rhs)
            | Expr::And(lhs, rhs)
            | Expr::Equal(lhs, rhs)
            | Expr::SameTerm(lhs, rhs)
            | Expr::Greater(lhs, rhs)
            | Expr::GreaterOrEqual(lhs, rhs)
            | Expr::Less(lhs, rhs)
            | Expr::LessOrEqual(lhs, rhs)
            | Expr::Add(lhs, rhs)
            | Expr::Subtract(lhs, rhs)
            | Expr::Multiply(lhs, rhs)
            | Expr::Divide(lhs, rhs) => {
                lhs.visit(f);
                rhs.visit(f);
            }
            Expr::In(lhs, list) => {
                lhs.visit(f);
                list.iter().for_each(|expr| expr.visit(f));
            }
            Expr::If(condition, then, otherwise) => {
                condition.visit(f);
                then.visit(f);
                otherwise.visit(f);
            }
            Expr::Coalesce(args) | Expr::FunctionCall(_, args) => {
                args.iter().for_each(|expr| expr.visit(f));
            }
        }
    }

    /// Rewrites the patterns of all `EXISTS` within this expression.
    pub fn try_map_exists(
        self,
        f: &mut dyn FnMut(AlgebraNode) -> QueryResult<AlgebraNode>,
    ) -> QueryResult<Expr> {
        fn map(
            expr: Box<Expr>,
            f: &mut dyn FnMut(AlgebraNode) -> QueryResult<AlgebraNode>,
        ) -> QueryResult<Box<Expr>> {
            expr.try_map_exists(f).map(Box::new)
        }

        Ok(match self {
            Expr::Constant(_) | Expr::Variable(_) | Expr::Bound(_) => self,
            Expr::Exists(pattern) => Expr::Exists(Box::new(f(*pattern)?)),
            Expr::Not(inner) => Expr::Not(map(inner, f)?),
            Expr::UnaryPlus(inner) => Expr::UnaryPlus(map(inner, f)?),
            Expr::UnaryMinus(inner) => Expr::UnaryMinus(map(inner, f)?),
            Expr::Or(lhs, rhs) => Expr::Or(map(lhs, f)?, map(rhs, f)?),
            Expr::And(lhs, rhs) => Expr::And(map(lhs, f)?, map(rhs, f)?),
            Expr::Equal(lhs, rhs) => Expr::Equal(map(lhs, f)?, map(rhs, f)?),
            Expr::SameTerm(lhs, rhs) => Expr::SameTerm(map(lhs, f)?, map(rhs, f)?),
            Expr::Greater(lhs, rhs) => Expr::Greater(map(lhs, f)?, map(rhs, f)?),
            Expr::GreaterOrEqual(lhs, rhs) => Expr::GreaterOrEqual(map(lhs, f)?, map(rhs, f)?),
            Expr::Less(lhs, rhs) => Expr::Less(map(lhs, f)?, map(rhs, f)?),
            Expr::LessOrEqual(lhs, rhs) => Expr::LessOrEqual(map(lhs, f)?, map(rhs, f)?),
            Expr::Add(lhs, rhs) => Expr::Add(map(lhs, f)?, map(rhs, f)?),
            Expr::Subtract(lhs, rhs) => Expr::Subtract(map(lhs, f)?, map(rhs, f)?),
            Expr::Multiply(lhs, rhs) => Expr::Multiply(map(lhs, f)?, map(rhs, f)?),
            Expr::Divide(lhs, rhs) => Expr::Divide(map(lhs, f)?, map(rhs, f)?),
            Expr::In(lhs, list) => Expr::In(
                map(lhs, f)?,
                list.into_iter()
                    .map(|expr| expr.try_map_exists(f))
                    .collect::<QueryResult<_>>()?,
            ),
            Expr::If(condition, then, otherwise) => {
                Expr::If(map(condition, f)?, map(then, f)?, map(otherwise, f)?)
            }
            Expr::Coalesce(args) => Expr::Coalesce(
                args.into_iter()
                    .map(|expr| expr.try_map_exists(f))
                    .collect::<QueryResult<_>>()?,
            ),
            Expr::FunctionCall(name, args) => Expr::FunctionCall(
                name,
                args.into_iter()
                    .map(|expr| expr.try_map_exists(f))
                    .collect::<QueryResult<_>>()?,
            ),
        })
    }
}

fn push_unique(result: &mut Vec<Variable>, variable: &Variable) {
    if !result.contains(variable) {
        result.push(variable.clone());
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Constant(term) => write!(f, "{term}"),
            Expr::Variable(variable) => write!(f, "{variable}"),
            Expr::Or(lhs, rhs) => write!(f, "({lhs} || {rhs})"),
            Expr::And(lhs, rhs) => write!(f, "({lhs} && {rhs})"),
            Expr::Not(inner) => write!(f, "!{inner}"),
            Expr::Equal(lhs, rhs) => write!(f, "({lhs} = {rhs})"),
            Expr::SameTerm(lhs, rhs) => write!(f, "sameTerm({lhs}, {rhs})"),
            Expr::Greater(lhs, rhs) => write!(f, "({lhs} > {rhs})"),
            Expr::GreaterOrEqual(lhs, rhs) => write!(f, "({lhs} >= {rhs})"),
            Expr::Less(lhs, rhs) => write!(f, "({lhs} < {rhs})"),
            Expr::LessOrEqual(lhs, rhs) => write!(f, "({lhs} <= {rhs})"),
            Expr::In(lhs, list) => {
                write!(f, "({lhs} IN (")?;
                write_list(f, list)?;
                f.write_str("))")
            }
            Expr::Add(lhs, rhs) => write!(f, "({lhs} + {rhs})"),
            Expr::Subtract(lhs, rhs) => write!(f, "({lhs} - {rhs})"),
            Expr::Multiply(lhs, rhs) => write!(f, "({lhs} * {rhs})"),
            Expr::Divide(lhs, rhs) => write!(f, "({lhs} / {rhs})"),
            Expr::UnaryPlus(inner) => write!(f, "+{inner}"),
            Expr::UnaryMinus(inner) => write!(f, "-{inner}"),
            Expr::Bound(variable) => write!(f, "BOUND({variable})"),
            Expr::If(condition, then, otherwise) => {
                write!(f, "IF({condition}, {then}, {otherwise})")
            }
            Expr::Coalesce(args) => {
                f.write_str("COALESCE(")?;
                write_list(f, args)?;
                f.write_str(")")
            }
            Expr::Exists(pattern) => write!(f, "EXISTS({})", pattern.name()),
            Expr::FunctionCall(name, args) => {
                write!(f, "{name}(")?;
                write_list(f, args)?;
                f.write_str(")")
            }
        }
    }
}

fn write_list(f: &mut Formatter<'_>, list: &[Expr]) -> std::fmt::Result {
    for (i, expr) in list.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{expr}")?;
    }
    Ok(())
}

/// An aggregate that is computed for each group of a [AlgebraNode::Group].
#[derive(Clone, Debug)]
pub enum AggregateExpr {
    /// `COUNT(*)`
    CountSolutions { distinct: bool },
    /// An aggregate function applied to the value of `expr` for each solution of a group.
    Function {
        function: AggregateFunction,
        expr: Box<Expr>,
        distinct: bool,
    },
}

impl AggregateExpr {
    pub(crate) fn collect_variables(&self, result: &mut Vec<Variable>) {
        if let AggregateExpr::Function { expr, .. } = self {
            expr.collect_variables(result);
        }
    }
}

impl Display for AggregateExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let distinct = |distinct: bool| if distinct { "DISTINCT " } else { "" };
        match self {
            AggregateExpr::CountSolutions { distinct: d } => write!(f, "COUNT({}*)", distinct(*d)),
            AggregateExpr::Function {
                function,
                expr,
                distinct: d,
            } => write!(f, "{function}({}{expr})", distinct(*d)),
        }
    }
}

/// A sort key of an [AlgebraNode::OrderBy].
#[derive(Clone, Debug)]
pub struct OrderKey {
    pub expression: Expr,
    pub descending: bool,
}

impl OrderKey {
    pub fn asc(expression: Expr) -> Self {
        Self {
            expression,
            descending: false,
        }
    }

    pub fn desc(expression: Expr) -> Self {
        Self {
            expression,
            descending: true,
        }
    }
}

impl Display for OrderKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.descending {
            write!(f, "DESC({})", self.expression)
        } else {
            write!(f, "ASC({})", self.expression)
        }
    }
}
