use rdf_eval_model::vocab::{rdf, xsd};
use rdf_eval_model::{
    Boolean, DateTime, Decimal, Double, Float, Integer, Literal, NamedNodeRef, Term, ThinError,
    ThinResult,
};
use std::cmp::Ordering;

/// A numeric value of one of the XSD numeric types.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Numeric {
    Integer(Integer),
    Decimal(Decimal),
    Float(Float),
    Double(Double),
}

/// Two numeric operands promoted to a common type.
enum NumericPair {
    Integer(Integer, Integer),
    Decimal(Decimal, Decimal),
    Float(Float, Float),
    Double(Double, Double),
}

impl Numeric {
    /// Returns the numeric value of `term`. Fails for non-numeric terms and invalid lexical forms.
    pub fn from_term(term: &Term) -> ThinResult<Self> {
        match term {
            Term::Literal(literal) => Self::from_literal(literal),
            _ => ThinError::expected(),
        }
    }

    pub fn from_literal(literal: &Literal) -> ThinResult<Self> {
        let value = literal.value();
        let datatype = literal.datatype();
        Ok(match datatype {
            xsd::DECIMAL => Numeric::Decimal(value.parse()?),
            xsd::FLOAT => Numeric::Float(value.parse()?),
            xsd::DOUBLE => Numeric::Double(value.parse()?),
            _ if is_integer_datatype(datatype) => Numeric::Integer(value.parse()?),
            _ => return ThinError::expected(),
        })
    }

    pub fn into_term(self) -> Term {
        let (value, datatype) = match self {
            Numeric::Integer(value) => (value.to_string(), xsd::INTEGER),
            Numeric::Decimal(value) => (value.to_string(), xsd::DECIMAL),
            Numeric::Float(value) => (value.to_string(), xsd::FLOAT),
            Numeric::Double(value) => (value.to_string(), xsd::DOUBLE),
        };
        Literal::new_typed_literal(value, datatype).into()
    }

    fn to_float(self) -> Float {
        match self {
            Numeric::Integer(value) => value.into(),
            Numeric::Decimal(value) => value.into(),
            Numeric::Float(value) => value,
            Numeric::Double(value) => Float::from(f64::from(value) as f32),
        }
    }

    fn to_double(self) -> Double {
        match self {
            Numeric::Integer(value) => value.into(),
            Numeric::Decimal(value) => value.into(),
            Numeric::Float(value) => value.into(),
            Numeric::Double(value) => value,
        }
    }

    fn promote(self, rhs: Numeric) -> NumericPair {
        match (self, rhs) {
            (Numeric::Integer(lhs), Numeric::Integer(rhs)) => NumericPair::Integer(lhs, rhs),
            (Numeric::Integer(lhs), Numeric::Decimal(rhs)) => {
                NumericPair::Decimal(lhs.into(), rhs)
            }
            (Numeric::Decimal(lhs), Numeric::Integer(rhs)) => {
                NumericPair::Decimal(lhs, rhs.into())
            }
            (Numeric::Decimal(lhs), Numeric::Decimal(rhs)) => NumericPair::Decimal(lhs, rhs),
            (Numeric::Double(_), _) | (_, Numeric::Double(_)) => {
                NumericPair::Double(self.to_double(), rhs.to_double())
            }
            (Numeric::Float(_), _) | (_, Numeric::Float(_)) => {
                NumericPair::Float(self.to_float(), rhs.to_float())
            }
        }
    }

    /// [op:numeric-add](https://www.w3.org/TR/xpath-functions-31/#func-numeric-add)
    pub fn checked_add(self, rhs: Numeric) -> ThinResult<Numeric> {
        Ok(match self.promote(rhs) {
            NumericPair::Integer(lhs, rhs) => Numeric::Integer(lhs.checked_add(rhs).ok_or(ThinError {})?),
            NumericPair::Decimal(lhs, rhs) => Numeric::Decimal(lhs.checked_add(rhs).ok_or(ThinError {})?),
            NumericPair::Float(lhs, rhs) => Numeric::Float(lhs + rhs),
            NumericPair::Double(lhs, rhs) => Numeric::Double(lhs + rhs),
        })
    }

    /// [op:numeric-subtract](https://www.w3.org/TR/xpath-functions-31/#func-numeric-subtract)
    pub fn checked_sub(self, rhs: Numeric) -> ThinResult<Numeric> {
        Ok(match self.promote(rhs) {
            NumericPair::Integer(lhs, rhs) => Numeric::Integer(lhs.checked_sub(rhs).ok_or(ThinError {})?),
            NumericPair::Decimal(lhs, rhs) => Numeric::Decimal(lhs.checked_sub(rhs).ok_or(ThinError {})?),
            NumericPair::Float(lhs, rhs) => Numeric::Float(lhs - rhs),
            NumericPair::Double(lhs, rhs) => Numeric::Double(lhs - rhs),
        })
    }

    /// [op:numeric-multiply](https://www.w3.org/TR/xpath-functions-31/#func-numeric-multiply)
    pub fn checked_mul(self, rhs: Numeric) -> ThinResult<Numeric> {
        Ok(match self.promote(rhs) {
            NumericPair::Integer(lhs, rhs) => Numeric::Integer(lhs.checked_mul(rhs).ok_or(ThinError {})?),
            NumericPair::Decimal(lhs, rhs) => Numeric::Decimal(lhs.checked_mul(rhs).ok_or(ThinError {})?),
            NumericPair::Float(lhs, rhs) => Numeric::Float(lhs * rhs),
            NumericPair::Double(lhs, rhs) => Numeric::Double(lhs * rhs),
        })
    }

    /// [op:numeric-divide](https://www.w3.org/TR/xpath-functions-31/#func-numeric-divide)
    ///
    /// Dividing two integers yields a decimal.
    pub fn checked_div(self, rhs: Numeric) -> ThinResult<Numeric> {
        Ok(match self.promote(rhs) {
            NumericPair::Integer(lhs, rhs) => Numeric::Decimal(
                Decimal::from(lhs)
                    .checked_div(rhs)
                    .ok_or(ThinError {})?,
            ),
            NumericPair::Decimal(lhs, rhs) => Numeric::Decimal(lhs.checked_div(rhs).ok_or(ThinError {})?),
            NumericPair::Float(lhs, rhs) => Numeric::Float(lhs / rhs),
            NumericPair::Double(lhs, rhs) => Numeric::Double(lhs / rhs),
        })
    }

    /// [op:numeric-unary-minus](https://www.w3.org/TR/xpath-functions-31/#func-numeric-unary-minus)
    pub fn checked_neg(self) -> ThinResult<Numeric> {
        Ok(match self {
            Numeric::Integer(value) => Numeric::Integer(value.checked_neg().ok_or(ThinError {})?),
            Numeric::Decimal(value) => Numeric::Decimal(value.checked_neg().ok_or(ThinError {})?),
            Numeric::Float(value) => Numeric::Float(-value),
            Numeric::Double(value) => Numeric::Double(-value),
        })
    }

    /// [fn:abs](https://www.w3.org/TR/xpath-functions-31/#func-abs)
    pub fn checked_abs(self) -> ThinResult<Numeric> {
        Ok(match self {
            Numeric::Integer(value) => Numeric::Integer(value.checked_abs().ok_or(ThinError {})?),
            Numeric::Decimal(value) => Numeric::Decimal(value.checked_abs().ok_or(ThinError {})?),
            Numeric::Float(value) => Numeric::Float(value.abs()),
            Numeric::Double(value) => Numeric::Double(value.abs()),
        })
    }

    /// [fn:round](https://www.w3.org/TR/xpath-functions-31/#func-round)
    pub fn checked_round(self) -> ThinResult<Numeric> {
        Ok(match self {
            Numeric::Integer(value) => Numeric::Integer(value),
            Numeric::Decimal(value) => Numeric::Decimal(value.checked_round().ok_or(ThinError {})?),
            Numeric::Float(value) => Numeric::Float(value.round()),
            Numeric::Double(value) => Numeric::Double(value.round()),
        })
    }

    /// [fn:ceiling](https://www.w3.org/TR/xpath-functions-31/#func-ceiling)
    pub fn checked_ceil(self) -> ThinResult<Numeric> {
        Ok(match self {
            Numeric::Integer(value) => Numeric::Integer(value),
            Numeric::Decimal(value) => Numeric::Decimal(value.checked_ceil().ok_or(ThinError {})?),
            Numeric::Float(value) => Numeric::Float(value.ceil()),
            Numeric::Double(value) => Numeric::Double(value.ceil()),
        })
    }

    /// [fn:floor](https://www.w3.org/TR/xpath-functions-31/#func-floor)
    pub fn checked_floor(self) -> ThinResult<Numeric> {
        Ok(match self {
            Numeric::Integer(value) => Numeric::Integer(value),
            Numeric::Decimal(value) => Numeric::Decimal(value.checked_floor().ok_or(ThinError {})?),
            Numeric::Float(value) => Numeric::Float(value.floor()),
            Numeric::Double(value) => Numeric::Double(value.floor()),
        })
    }

    /// Compares two numerics after promoting them to a common type. Returns [None] if one of them
    /// is `NaN`.
    pub fn partial_cmp(self, rhs: Numeric) -> Option<Ordering> {
        match self.promote(rhs) {
            NumericPair::Integer(lhs, rhs) => lhs.partial_cmp(&rhs),
            NumericPair::Decimal(lhs, rhs) => lhs.partial_cmp(&rhs),
            NumericPair::Float(lhs, rhs) => lhs.partial_cmp(&rhs),
            NumericPair::Double(lhs, rhs) => lhs.partial_cmp(&rhs),
        }
    }

    /// Returns `false` for zero and `NaN`.
    fn is_truthy(self) -> bool {
        match self {
            Numeric::Integer(value) => value != Integer::from(0),
            Numeric::Decimal(value) => value != Decimal::from(0),
            Numeric::Float(value) => {
                let value = f32::from(value);
                value != 0.0 && !value.is_nan()
            }
            Numeric::Double(value) => {
                let value = f64::from(value);
                value != 0.0 && !value.is_nan()
            }
        }
    }
}

/// Returns whether `datatype` is `xsd:integer` or one of its derived types.
pub fn is_integer_datatype(datatype: NamedNodeRef<'_>) -> bool {
    static INTEGER_DATATYPES: &[NamedNodeRef<'_>; 13] = &[
        xsd::INTEGER,
        xsd::BYTE,
        xsd::SHORT,
        xsd::INT,
        xsd::LONG,
        xsd::UNSIGNED_BYTE,
        xsd::UNSIGNED_SHORT,
        xsd::UNSIGNED_INT,
        xsd::UNSIGNED_LONG,
        xsd::POSITIVE_INTEGER,
        xsd::NEGATIVE_INTEGER,
        xsd::NON_POSITIVE_INTEGER,
        xsd::NON_NEGATIVE_INTEGER,
    ];
    INTEGER_DATATYPES.contains(&datatype)
}

/// Returns whether `datatype` is a numeric XSD datatype.
pub fn is_numeric_datatype(datatype: NamedNodeRef<'_>) -> bool {
    matches!(datatype, xsd::DECIMAL | xsd::FLOAT | xsd::DOUBLE) || is_integer_datatype(datatype)
}

/// A reference to a string literal in RDF, consisting of a value and an optional language tag.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct StringLiteralRef<'value>(pub &'value str, pub Option<&'value str>);

impl<'value> StringLiteralRef<'value> {
    /// Extracts a string literal from a term. Fails for all other terms.
    pub fn try_from_term(term: &'value Term) -> ThinResult<Self> {
        match term {
            Term::Literal(literal) if literal.datatype() == xsd::STRING => {
                Ok(Self(literal.value(), None))
            }
            Term::Literal(literal) if literal.datatype() == rdf::LANG_STRING => {
                Ok(Self(literal.value(), literal.language()))
            }
            _ => ThinError::expected(),
        }
    }

    /// Extracts a simple literal (or `xsd:string`) from a term.
    pub fn try_simple_from_term(term: &'value Term) -> ThinResult<&'value str> {
        match Self::try_from_term(term)? {
            StringLiteralRef(value, None) => Ok(value),
            StringLiteralRef(_, Some(_)) => ThinError::expected(),
        }
    }

    /// Creates a term with the same language tag as this literal.
    pub fn with_value(&self, value: impl Into<String>) -> Term {
        string_term(value, self.1)
    }
}

/// Creates a simple literal or a language-tagged string.
pub(crate) fn string_term(value: impl Into<String>, language: Option<&str>) -> Term {
    match language {
        Some(language) => {
            Literal::new_language_tagged_literal_unchecked(value, language.to_ascii_lowercase())
                .into()
        }
        None => Literal::new_simple_literal(value).into(),
    }
}

/// Two string arguments that satisfy the
/// [argument compatibility rules](https://www.w3.org/TR/sparql11-query/#func-arg-compatibility).
pub struct CompatibleStringArgs<'data> {
    pub lhs: &'data str,
    pub rhs: &'data str,
    pub language: Option<&'data str>,
}

impl<'data> CompatibleStringArgs<'data> {
    /// Checks whether two [StringLiteralRef] are compatible and if they are return a new
    /// [CompatibleStringArgs].
    pub fn try_from(
        lhs: StringLiteralRef<'data>,
        rhs: StringLiteralRef<'data>,
    ) -> ThinResult<CompatibleStringArgs<'data>> {
        let is_compatible = rhs.1.is_none() || lhs.1 == rhs.1;

        if !is_compatible {
            return ThinError::expected();
        }

        Ok(CompatibleStringArgs {
            lhs: lhs.0,
            rhs: rhs.0,
            language: lhs.1,
        })
    }

    pub fn try_from_terms(lhs: &'data Term, rhs: &'data Term) -> ThinResult<Self> {
        Self::try_from(
            StringLiteralRef::try_from_term(lhs)?,
            StringLiteralRef::try_from_term(rhs)?,
        )
    }
}

/// The value of a literal with a datatype known to the engine.
#[derive(Clone, Debug, PartialEq)]
pub enum TypedValue<'a> {
    Numeric(Numeric),
    String(StringLiteralRef<'a>),
    Boolean(bool),
    DateTime(DateTime),
}

impl<'a> TypedValue<'a> {
    /// Returns the value of `literal`. Fails for unknown datatypes and invalid lexical forms.
    pub fn try_from_literal(literal: &'a Literal) -> ThinResult<Self> {
        Ok(match literal.datatype() {
            xsd::STRING => TypedValue::String(StringLiteralRef(literal.value(), None)),
            rdf::LANG_STRING => {
                TypedValue::String(StringLiteralRef(literal.value(), literal.language()))
            }
            xsd::BOOLEAN => TypedValue::Boolean(literal.value().parse::<Boolean>()?.into()),
            xsd::DATE_TIME => TypedValue::DateTime(literal.value().parse()?),
            _ => TypedValue::Numeric(Numeric::from_literal(literal)?),
        })
    }
}

/// Computes the [effective boolean value](https://www.w3.org/TR/sparql11-query/#ebv) of a term.
pub fn effective_boolean_value(term: &Term) -> ThinResult<bool> {
    let Term::Literal(literal) = term else {
        return ThinError::expected();
    };

    match literal.datatype() {
        xsd::BOOLEAN => Ok(literal
            .value()
            .parse::<Boolean>()
            .is_ok_and(bool::from)),
        xsd::STRING => Ok(!literal.value().is_empty()),
        datatype if is_numeric_datatype(datatype) => {
            Ok(Numeric::from_literal(literal).is_ok_and(Numeric::is_truthy))
        }
        _ => ThinError::expected(),
    }
}

/// The SPARQL `=` operator.
///
/// Literals with known datatypes are compared by value. Literals with unknown datatypes are only
/// equal if they are the same term and raise an error otherwise.
pub fn sparql_equals(lhs: &Term, rhs: &Term) -> ThinResult<bool> {
    let (Term::Literal(lhs_literal), Term::Literal(rhs_literal)) = (lhs, rhs) else {
        return Ok(lhs == rhs);
    };

    match (
        TypedValue::try_from_literal(lhs_literal),
        TypedValue::try_from_literal(rhs_literal),
    ) {
        (Ok(TypedValue::Numeric(l)), Ok(TypedValue::Numeric(r))) => {
            Ok(l.partial_cmp(r) == Some(Ordering::Equal))
        }
        (Ok(TypedValue::DateTime(l)), Ok(TypedValue::DateTime(r))) => Ok(l == r),
        (Ok(l), Ok(r)) => Ok(l == r),
        _ if lhs_literal == rhs_literal => Ok(true),
        _ => ThinError::expected(),
    }
}

/// The SPARQL ordering operators (`<`, `>`, ...). Fails for values that cannot be compared.
pub fn sparql_compare(lhs: &Term, rhs: &Term) -> ThinResult<Ordering> {
    let (Term::Literal(lhs), Term::Literal(rhs)) = (lhs, rhs) else {
        return ThinError::expected();
    };

    match (
        TypedValue::try_from_literal(lhs)?,
        TypedValue::try_from_literal(rhs)?,
    ) {
        (TypedValue::Numeric(l), TypedValue::Numeric(r)) => l.partial_cmp(r).ok_or(ThinError {}),
        (TypedValue::String(l), TypedValue::String(r)) if l.1 == r.1 => Ok(l.0.cmp(r.0)),
        (TypedValue::Boolean(l), TypedValue::Boolean(r)) => Ok(l.cmp(&r)),
        (TypedValue::DateTime(l), TypedValue::DateTime(r)) => l.partial_cmp(&r).ok_or(ThinError {}),
        _ => ThinError::expected(),
    }
}

/// The total order used by `ORDER BY`.
///
/// Unbound values come first, followed by blank nodes, IRIs, and literals. Literals that can be
/// compared with [sparql_compare] are ordered by value, all other literals by their lexical form,
/// datatype, and language tag.
pub fn order_by_cmp(lhs: Option<&Term>, rhs: Option<&Term>) -> Ordering {
    fn rank(term: &Term) -> u8 {
        match term {
            Term::BlankNode(_) => 0,
            Term::NamedNode(_) => 1,
            Term::Literal(_) => 2,
        }
    }

    match (lhs, rhs) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(lhs), Some(rhs)) => match (lhs, rhs) {
            (Term::BlankNode(l), Term::BlankNode(r)) => l.as_str().cmp(r.as_str()),
            (Term::NamedNode(l), Term::NamedNode(r)) => l.as_str().cmp(r.as_str()),
            (Term::Literal(l), Term::Literal(r)) => {
                sparql_compare(lhs, rhs).unwrap_or_else(|_| {
                    l.value()
                        .cmp(r.value())
                        .then_with(|| l.datatype().as_str().cmp(r.datatype().as_str()))
                        .then_with(|| l.language().cmp(&r.language()))
                })
            }
            _ => rank(lhs).cmp(&rank(rhs)),
        },
    }
}
