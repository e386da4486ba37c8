use crate::value::StringLiteralRef;
use md5::Md5;
use rdf_eval_model::{Literal, Term, ThinResult};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};

pub(super) fn md5(arg: &Term) -> ThinResult<Term> {
    hash::<Md5>(arg)
}

pub(super) fn sha1(arg: &Term) -> ThinResult<Term> {
    hash::<Sha1>(arg)
}

pub(super) fn sha256(arg: &Term) -> ThinResult<Term> {
    hash::<Sha256>(arg)
}

pub(super) fn sha384(arg: &Term) -> ThinResult<Term> {
    hash::<Sha384>(arg)
}

pub(super) fn sha512(arg: &Term) -> ThinResult<Term> {
    hash::<Sha512>(arg)
}

fn hash<D: Digest>(arg: &Term) -> ThinResult<Term> {
    let value = StringLiteralRef::try_simple_from_term(arg)?;
    let digest = D::digest(value.as_bytes());
    Ok(Literal::new_simple_literal(hex::encode(digest)).into())
}
