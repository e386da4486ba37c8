use crate::scalar::boolean;
use crate::value::{is_numeric_datatype, StringLiteralRef};
use crate::FunctionContext;
use rdf_eval_model::{BlankNode, Literal, NamedNode, Term, ThinError, ThinResult};
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

pub(super) fn str(arg: &Term) -> ThinResult<Term> {
    let value = match arg {
        Term::NamedNode(node) => node.as_str(),
        Term::Literal(literal) => literal.value(),
        Term::BlankNode(_) => return ThinError::expected(),
    };
    Ok(Literal::new_simple_literal(value).into())
}

pub(super) fn lang(arg: &Term) -> ThinResult<Term> {
    match arg {
        Term::Literal(literal) => {
            Ok(Literal::new_simple_literal(literal.language().unwrap_or_default()).into())
        }
        _ => ThinError::expected(),
    }
}

/// [langMatches](https://www.w3.org/TR/sparql11-query/#func-langMatches) with basic filtering.
pub(super) fn lang_matches(tag: &Term, range: &Term) -> ThinResult<Term> {
    let tag = StringLiteralRef::try_simple_from_term(tag)?;
    let range = StringLiteralRef::try_simple_from_term(range)?;

    let matches = if range == "*" {
        !tag.is_empty()
    } else {
        let tag = tag.to_ascii_lowercase();
        let range = range.to_ascii_lowercase();
        tag == range
            || (tag.starts_with(&range) && tag.as_bytes().get(range.len()) == Some(&b'-'))
    };
    Ok(boolean(matches))
}

pub(super) fn datatype(arg: &Term) -> ThinResult<Term> {
    match arg {
        Term::Literal(literal) => Ok(literal.datatype().into_owned().into()),
        _ => ThinError::expected(),
    }
}

pub(super) fn iri(arg: &Term) -> ThinResult<Term> {
    match arg {
        Term::NamedNode(_) => Ok(arg.clone()),
        Term::Literal(_) => {
            let value = StringLiteralRef::try_simple_from_term(arg)?;
            Ok(NamedNode::new(value)?.into())
        }
        Term::BlankNode(_) => ThinError::expected(),
    }
}

pub(super) fn bnode() -> Term {
    BlankNode::default().into()
}

/// Returns the same blank node for the same label within one solution.
pub(super) fn bnode_with_label(label: &Term, context: &FunctionContext) -> ThinResult<Term> {
    let label = StringLiteralRef::try_simple_from_term(label)?;
    let mut hasher = FxHasher::default();
    label.hash(&mut hasher);
    let id = format!(
        "q{:x}x{:x}x{:x}",
        context.query_id(),
        context.binding_id(),
        hasher.finish()
    );
    Ok(BlankNode::new_unchecked(id).into())
}

pub(super) fn str_dt(value: &Term, datatype: &Term) -> ThinResult<Term> {
    let value = StringLiteralRef::try_simple_from_term(value)?;
    let Term::NamedNode(datatype) = datatype else {
        return ThinError::expected();
    };
    Ok(Literal::new_typed_literal(value, datatype.clone()).into())
}

pub(super) fn str_lang(value: &Term, language: &Term) -> ThinResult<Term> {
    let value = StringLiteralRef::try_simple_from_term(value)?;
    let language = StringLiteralRef::try_simple_from_term(language)?;
    Ok(Literal::new_language_tagged_literal(value, language)
        .map_err(|_| ThinError::default())?
        .into())
}

pub(super) fn uuid() -> Term {
    NamedNode::new_unchecked(format!("urn:uuid:{}", uuid::Uuid::new_v4())).into()
}

pub(super) fn str_uuid() -> Term {
    Literal::new_simple_literal(uuid::Uuid::new_v4().to_string()).into()
}

pub(super) fn is_iri(arg: &Term) -> Term {
    boolean(matches!(arg, Term::NamedNode(_)))
}

pub(super) fn is_blank(arg: &Term) -> Term {
    boolean(matches!(arg, Term::BlankNode(_)))
}

pub(super) fn is_literal(arg: &Term) -> Term {
    boolean(matches!(arg, Term::Literal(_)))
}

pub(super) fn is_numeric(arg: &Term) -> Term {
    let is_numeric = match arg {
        Term::Literal(literal) => {
            is_numeric_datatype(literal.datatype())
                && crate::Numeric::from_literal(literal).is_ok()
        }
        _ => false,
    };
    boolean(is_numeric)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdf_eval_model::vocab::xsd;

    #[test]
    fn bnode_is_stable_within_solution() {
        let label: Term = Literal::new_simple_literal("x").into();
        let first = bnode_with_label(&label, &FunctionContext::new(1, 1)).unwrap();
        let second = bnode_with_label(&label, &FunctionContext::new(1, 1)).unwrap();
        let other = bnode_with_label(&label, &FunctionContext::new(1, 2)).unwrap();
        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[test]
    fn lang_matches_ranges() {
        let tag: Term = Literal::new_simple_literal("en-US").into();
        let range: Term = Literal::new_simple_literal("en").into();
        assert_eq!(lang_matches(&tag, &range), Ok(boolean(true)));
        let range: Term = Literal::new_simple_literal("*").into();
        assert_eq!(lang_matches(&tag, &range), Ok(boolean(true)));
        let range: Term = Literal::new_simple_literal("e").into();
        assert_eq!(lang_matches(&tag, &range), Ok(boolean(false)));
    }

    #[test]
    fn str_of_blank_node_fails() {
        assert!(str(&BlankNode::default().into()).is_err());
        assert_eq!(
            datatype(&Literal::new_simple_literal("a").into()),
            Ok(xsd::STRING.into_owned().into())
        );
    }
}
