use crate::Numeric;
use rdf_eval_model::{Double, Term, ThinResult};

pub(super) fn abs(arg: &Term) -> ThinResult<Term> {
    Ok(Numeric::from_term(arg)?.checked_abs()?.into_term())
}

pub(super) fn round(arg: &Term) -> ThinResult<Term> {
    Ok(Numeric::from_term(arg)?.checked_round()?.into_term())
}

pub(super) fn ceil(arg: &Term) -> ThinResult<Term> {
    Ok(Numeric::from_term(arg)?.checked_ceil()?.into_term())
}

pub(super) fn floor(arg: &Term) -> ThinResult<Term> {
    Ok(Numeric::from_term(arg)?.checked_floor()?.into_term())
}

pub(super) fn rand() -> Term {
    Numeric::Double(Double::from(rand::random::<f64>())).into_term()
}
