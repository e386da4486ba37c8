//! [XPath constructor functions](https://www.w3.org/TR/sparql11-query/#FunctionMapping) for the
//! XSD types.

use crate::value::is_integer_datatype;
use crate::Numeric;
use rdf_eval_model::vocab::xsd;
use rdf_eval_model::{
    Boolean, DateTime, Decimal, Double, Float, Integer, Literal, Term, ThinError, ThinResult,
};

pub(super) fn cast_string(arg: &Term) -> ThinResult<Term> {
    let value = match arg {
        Term::NamedNode(node) => node.as_str(),
        Term::Literal(literal) => literal.value(),
        Term::BlankNode(_) => return ThinError::expected(),
    };
    Ok(Literal::new_simple_literal(value).into())
}

pub(super) fn cast_boolean(arg: &Term) -> ThinResult<Term> {
    let value = match source(arg)? {
        Source::String(value) => value.parse::<Boolean>()?.into(),
        Source::Boolean(value) => value,
        Source::Numeric(value) => match value {
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
        },
        Source::DateTime(_) => return ThinError::expected(),
    };
    Ok(Literal::from(value).into())
}

pub(super) fn cast_integer(arg: &Term) -> ThinResult<Term> {
    let value = match source(arg)? {
        Source::String(value) => value.parse()?,
        Source::Boolean(value) => Integer::from(i64::from(value)),
        Source::Numeric(Numeric::Integer(value)) => value,
        Source::Numeric(Numeric::Decimal(value)) => Integer::try_from(value)?,
        Source::Numeric(Numeric::Float(value)) => Integer::try_from(value)?,
        Source::Numeric(Numeric::Double(value)) => Integer::try_from(value)?,
        Source::DateTime(_) => return ThinError::expected(),
    };
    Ok(Numeric::Integer(value).into_term())
}

pub(super) fn cast_decimal(arg: &Term) -> ThinResult<Term> {
    let value = match source(arg)? {
        Source::String(value) => value.parse()?,
        Source::Boolean(value) => Decimal::from(i64::from(value)),
        Source::Numeric(Numeric::Integer(value)) => Decimal::from(value),
        Source::Numeric(Numeric::Decimal(value)) => value,
        Source::Numeric(Numeric::Float(value)) => Decimal::try_from(value)?,
        Source::Numeric(Numeric::Double(value)) => Decimal::try_from(value)?,
        Source::DateTime(_) => return ThinError::expected(),
    };
    Ok(Numeric::Decimal(value).into_term())
}

pub(super) fn cast_float(arg: &Term) -> ThinResult<Term> {
    let value = match source(arg)? {
        Source::String(value) => value.parse()?,
        Source::Boolean(value) => Float::from(if value { 1.0 } else { 0.0 }),
        Source::Numeric(Numeric::Integer(value)) => Float::from(value),
        Source::Numeric(Numeric::Decimal(value)) => Float::from(value),
        Source::Numeric(Numeric::Float(value)) => value,
        #[allow(clippy::cast_possible_truncation, reason = "Casting to xsd:float is lossy")]
        Source::Numeric(Numeric::Double(value)) => Float::from(f64::from(value) as f32),
        Source::DateTime(_) => return ThinError::expected(),
    };
    Ok(Numeric::Float(value).into_term())
}

pub(super) fn cast_double(arg: &Term) -> ThinResult<Term> {
    let value = match source(arg)? {
        Source::String(value) => value.parse()?,
        Source::Boolean(value) => Double::from(if value { 1.0 } else { 0.0 }),
        Source::Numeric(Numeric::Integer(value)) => Double::from(value),
        Source::Numeric(Numeric::Decimal(value)) => Double::from(value),
        Source::Numeric(Numeric::Float(value)) => Double::from(value),
        Source::Numeric(Numeric::Double(value)) => value,
        Source::DateTime(_) => return ThinError::expected(),
    };
    Ok(Numeric::Double(value).into_term())
}

pub(super) fn cast_date_time(arg: &Term) -> ThinResult<Term> {
    let value: DateTime = match source(arg)? {
        Source::String(value) => value.parse()?,
        Source::DateTime(value) => value,
        Source::Boolean(_) | Source::Numeric(_) => return ThinError::expected(),
    };
    Ok(Literal::new_typed_literal(value.to_string(), xsd::DATE_TIME).into())
}

/// The source value of a cast.
enum Source<'a> {
    String(&'a str),
    Boolean(bool),
    Numeric(Numeric),
    DateTime(DateTime),
}

fn source(arg: &Term) -> ThinResult<Source<'_>> {
    let Term::Literal(literal) = arg else {
        return ThinError::expected();
    };
    let datatype = literal.datatype();
    Ok(match datatype {
        xsd::STRING => Source::String(literal.value()),
        xsd::BOOLEAN => Source::Boolean(literal.value().parse::<Boolean>()?.into()),
        xsd::DATE_TIME => Source::DateTime(literal.value().parse()?),
        xsd::DECIMAL | xsd::FLOAT | xsd::DOUBLE => Source::Numeric(Numeric::from_literal(literal)?),
        _ if is_integer_datatype(datatype) => Source::Numeric(Numeric::from_literal(literal)?),
        _ => return ThinError::expected(),
    })
}
