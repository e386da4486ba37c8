use crate::scalar::boolean;
use crate::value::{string_term, CompatibleStringArgs, StringLiteralRef};
use crate::Numeric;
use rdf_eval_model::{Integer, Literal, Term, ThinError, ThinResult};
use regex::{Regex, RegexBuilder};
use std::borrow::Cow;

/// Bound on the compiled size of user-supplied regular expressions.
const REGEX_SIZE_LIMIT: usize = 1_000_000;

pub(super) fn str_len(arg: &Term) -> ThinResult<Term> {
    let StringLiteralRef(value, _) = StringLiteralRef::try_from_term(arg)?;
    let length = i64::try_from(value.chars().count())?;
    Ok(Numeric::Integer(Integer::from(length)).into_term())
}

/// [fn:substring](https://www.w3.org/TR/xpath-functions-31/#func-substring) with 1-based,
/// rounded character positions.
pub(super) fn sub_str(arg: &Term, start: &Term, length: Option<&Term>) -> ThinResult<Term> {
    let literal = StringLiteralRef::try_from_term(arg)?;
    let start = character_position(start)?;
    let end = match length {
        Some(length) => Some(start.saturating_add(character_position(length)?)),
        None => None,
    };

    let result: String = literal
        .0
        .chars()
        .enumerate()
        .filter(|(i, _)| {
            let position = i64::try_from(*i).unwrap_or(i64::MAX).saturating_add(1);
            position >= start && end.map_or(true, |end| position < end)
        })
        .map(|(_, c)| c)
        .collect();
    Ok(literal.with_value(result))
}

fn character_position(term: &Term) -> ThinResult<i64> {
    let position = match Numeric::from_term(term)?.checked_round()? {
        Numeric::Integer(value) => value,
        Numeric::Decimal(value) => Integer::try_from(value)?,
        Numeric::Float(value) => Integer::try_from(value)?,
        Numeric::Double(value) => Integer::try_from(value)?,
    };
    Ok(position.to_string().parse()?)
}

pub(super) fn ucase(arg: &Term) -> ThinResult<Term> {
    let literal = StringLiteralRef::try_from_term(arg)?;
    Ok(literal.with_value(literal.0.to_uppercase()))
}

pub(super) fn lcase(arg: &Term) -> ThinResult<Term> {
    let literal = StringLiteralRef::try_from_term(arg)?;
    Ok(literal.with_value(literal.0.to_lowercase()))
}

pub(super) fn str_starts(lhs: &Term, rhs: &Term) -> ThinResult<Term> {
    let args = CompatibleStringArgs::try_from_terms(lhs, rhs)?;
    Ok(boolean(args.lhs.starts_with(args.rhs)))
}

pub(super) fn str_ends(lhs: &Term, rhs: &Term) -> ThinResult<Term> {
    let args = CompatibleStringArgs::try_from_terms(lhs, rhs)?;
    Ok(boolean(args.lhs.ends_with(args.rhs)))
}

pub(super) fn contains(lhs: &Term, rhs: &Term) -> ThinResult<Term> {
    let args = CompatibleStringArgs::try_from_terms(lhs, rhs)?;
    Ok(boolean(args.lhs.contains(args.rhs)))
}

pub(super) fn str_before(lhs: &Term, rhs: &Term) -> ThinResult<Term> {
    let args = CompatibleStringArgs::try_from_terms(lhs, rhs)?;
    Ok(match args.lhs.find(args.rhs) {
        Some(position) => string_term(&args.lhs[..position], args.language),
        None => Literal::new_simple_literal("").into(),
    })
}

pub(super) fn str_after(lhs: &Term, rhs: &Term) -> ThinResult<Term> {
    let args = CompatibleStringArgs::try_from_terms(lhs, rhs)?;
    Ok(match args.lhs.find(args.rhs) {
        Some(position) => string_term(&args.lhs[position + args.rhs.len()..], args.language),
        None => Literal::new_simple_literal("").into(),
    })
}

pub(super) fn encode_for_uri(arg: &Term) -> ThinResult<Term> {
    let StringLiteralRef(value, _) = StringLiteralRef::try_from_term(arg)?;
    let mut result = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            result.push(char::from(byte));
        } else {
            result.push_str(&format!("%{byte:02X}"));
        }
    }
    Ok(Literal::new_simple_literal(result).into())
}

/// Concatenates all arguments. The language tag is kept if all arguments share it.
pub(super) fn concat(args: &[Term]) -> ThinResult<Term> {
    let mut result = String::new();
    let mut language: Option<Option<&str>> = None;
    for arg in args {
        let StringLiteralRef(value, arg_language) = StringLiteralRef::try_from_term(arg)?;
        result.push_str(value);
        language = match language {
            None => Some(arg_language),
            Some(current) if current == arg_language => Some(current),
            Some(_) => Some(None),
        };
    }
    Ok(string_term(result, language.flatten()))
}

pub(super) fn replace(
    arg: &Term,
    pattern: &Term,
    replacement: &Term,
    flags: Option<&Term>,
) -> ThinResult<Term> {
    let literal = StringLiteralRef::try_from_term(arg)?;
    let regex = compile_regex(pattern, flags)?;
    let replacement = StringLiteralRef::try_simple_from_term(replacement)?;
    if regex.is_match("") {
        // A pattern matching the empty string is an error (FORX0003).
        return ThinError::expected();
    }
    let result = regex.replace_all(literal.0, replacement).into_owned();
    Ok(literal.with_value(result))
}

pub(super) fn regex(arg: &Term, pattern: &Term, flags: Option<&Term>) -> ThinResult<Term> {
    let StringLiteralRef(value, _) = StringLiteralRef::try_from_term(arg)?;
    let regex = compile_regex(pattern, flags)?;
    Ok(boolean(regex.is_match(value)))
}

fn compile_regex(pattern: &Term, flags: Option<&Term>) -> ThinResult<Regex> {
    let pattern = StringLiteralRef::try_simple_from_term(pattern)?;
    let flags = match flags {
        Some(flags) => StringLiteralRef::try_simple_from_term(flags)?,
        None => "",
    };

    let mut pattern = Cow::Borrowed(pattern);
    let mut builder_flags = RegexFlags::default();
    for flag in flags.chars() {
        match flag {
            's' => builder_flags.dot_matches_new_line = true,
            'm' => builder_flags.multi_line = true,
            'i' => builder_flags.case_insensitive = true,
            'x' => builder_flags.ignore_whitespace = true,
            'q' => pattern = Cow::Owned(regex::escape(&pattern)),
            _ => return ThinError::expected(),
        }
    }

    RegexBuilder::new(&pattern)
        .size_limit(REGEX_SIZE_LIMIT)
        .case_insensitive(builder_flags.case_insensitive)
        .multi_line(builder_flags.multi_line)
        .dot_matches_new_line(builder_flags.dot_matches_new_line)
        .ignore_whitespace(builder_flags.ignore_whitespace)
        .build()
        .map_err(|_| ThinError::default())
}

#[derive(Default)]
#[allow(clippy::struct_excessive_bools, reason = "Mirrors the regex flags")]
struct RegexFlags {
    case_insensitive: bool,
    multi_line: bool,
    dot_matches_new_line: bool,
    ignore_whitespace: bool,
}
