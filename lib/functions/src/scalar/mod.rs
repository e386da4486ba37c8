//! Builtin scalar functions.

mod conversion;
mod hash;
mod numeric;
mod strings;
mod terms;

use crate::{BuiltinName, FunctionContext};
use rdf_eval_model::{Term, ThinError, ThinResult};

/// Invokes the builtin function `name` on the given arguments.
pub fn invoke_builtin(
    name: BuiltinName,
    args: &[Term],
    context: &FunctionContext,
) -> ThinResult<Term> {
    match name {
        BuiltinName::Str => unary(args, terms::str),
        BuiltinName::Lang => unary(args, terms::lang),
        BuiltinName::LangMatches => binary(args, terms::lang_matches),
        BuiltinName::Datatype => unary(args, terms::datatype),
        BuiltinName::Iri => unary(args, terms::iri),
        BuiltinName::BNode => match args {
            [] => Ok(terms::bnode()),
            [arg] => terms::bnode_with_label(arg, context),
            _ => ThinError::expected(),
        },
        BuiltinName::StrDt => binary(args, terms::str_dt),
        BuiltinName::StrLang => binary(args, terms::str_lang),
        BuiltinName::Uuid => nullary(args, terms::uuid),
        BuiltinName::StrUuid => nullary(args, terms::str_uuid),
        BuiltinName::IsIri => unary(args, |arg| Ok(terms::is_iri(arg))),
        BuiltinName::IsBlank => unary(args, |arg| Ok(terms::is_blank(arg))),
        BuiltinName::IsLiteral => unary(args, |arg| Ok(terms::is_literal(arg))),
        BuiltinName::IsNumeric => unary(args, |arg| Ok(terms::is_numeric(arg))),
        BuiltinName::StrLen => unary(args, strings::str_len),
        BuiltinName::SubStr => match args {
            [arg, start] => strings::sub_str(arg, start, None),
            [arg, start, length] => strings::sub_str(arg, start, Some(length)),
            _ => ThinError::expected(),
        },
        BuiltinName::UCase => unary(args, strings::ucase),
        BuiltinName::LCase => unary(args, strings::lcase),
        BuiltinName::StrStarts => binary(args, strings::str_starts),
        BuiltinName::StrEnds => binary(args, strings::str_ends),
        BuiltinName::Contains => binary(args, strings::contains),
        BuiltinName::StrBefore => binary(args, strings::str_before),
        BuiltinName::StrAfter => binary(args, strings::str_after),
        BuiltinName::EncodeForUri => unary(args, strings::encode_for_uri),
        BuiltinName::Concat => strings::concat(args),
        BuiltinName::Replace => match args {
            [arg, pattern, replacement] => strings::replace(arg, pattern, replacement, None),
            [arg, pattern, replacement, flags] => {
                strings::replace(arg, pattern, replacement, Some(flags))
            }
            _ => ThinError::expected(),
        },
        BuiltinName::Regex => match args {
            [arg, pattern] => strings::regex(arg, pattern, None),
            [arg, pattern, flags] => strings::regex(arg, pattern, Some(flags)),
            _ => ThinError::expected(),
        },
        BuiltinName::Abs => unary(args, numeric::abs),
        BuiltinName::Round => unary(args, numeric::round),
        BuiltinName::Ceil => unary(args, numeric::ceil),
        BuiltinName::Floor => unary(args, numeric::floor),
        BuiltinName::Rand => nullary(args, numeric::rand),
        BuiltinName::Md5 => unary(args, hash::md5),
        BuiltinName::Sha1 => unary(args, hash::sha1),
        BuiltinName::Sha256 => unary(args, hash::sha256),
        BuiltinName::Sha384 => unary(args, hash::sha384),
        BuiltinName::Sha512 => unary(args, hash::sha512),
        BuiltinName::CastString => unary(args, conversion::cast_string),
        BuiltinName::CastBoolean => unary(args, conversion::cast_boolean),
        BuiltinName::CastInteger => unary(args, conversion::cast_integer),
        BuiltinName::CastDecimal => unary(args, conversion::cast_decimal),
        BuiltinName::CastFloat => unary(args, conversion::cast_float),
        BuiltinName::CastDouble => unary(args, conversion::cast_double),
        BuiltinName::CastDateTime => unary(args, conversion::cast_date_time),
    }
}

fn nullary(args: &[Term], function: impl FnOnce() -> Term) -> ThinResult<Term> {
    match args {
        [] => Ok(function()),
        _ => ThinError::expected(),
    }
}

fn unary(args: &[Term], function: impl FnOnce(&Term) -> ThinResult<Term>) -> ThinResult<Term> {
    match args {
        [arg] => function(arg),
        _ => ThinError::expected(),
    }
}

fn binary(
    args: &[Term],
    function: impl FnOnce(&Term, &Term) -> ThinResult<Term>,
) -> ThinResult<Term> {
    match args {
        [lhs, rhs] => function(lhs, rhs),
        _ => ThinError::expected(),
    }
}

fn boolean(value: bool) -> Term {
    rdf_eval_model::Literal::from(value).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdf_eval_model::Literal;

    fn render(name: BuiltinName, args: &[Term]) -> String {
        let args_text = args
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        match invoke_builtin(name, args, &FunctionContext::new(0, 0)) {
            Ok(result) => format!("{name}({args_text}) = {result}"),
            Err(_) => format!("{name}({args_text}) = error"),
        }
    }

    fn string(value: &str) -> Term {
        Literal::new_simple_literal(value).into()
    }

    fn integer(value: i64) -> Term {
        Literal::from(value).into()
    }

    #[test]
    fn builtin_results() {
        let calls = [
            render(BuiltinName::UCase, &[string("abc")]),
            render(BuiltinName::UCase, &[integer(1)]),
            render(BuiltinName::StrLen, &[string("hello")]),
            render(BuiltinName::SubStr, &[string("hello"), integer(2), integer(3)]),
            render(BuiltinName::Concat, &[string("a"), string("b")]),
            render(BuiltinName::StrBefore, &[string("abc"), string("b")]),
            render(BuiltinName::Abs, &[integer(-3)]),
            render(BuiltinName::LangMatches, &[string("en-US"), string("en")]),
            render(BuiltinName::Md5, &[string("abc")]),
            render(BuiltinName::Str, &[]),
        ];
        insta::assert_snapshot!(calls.join("\n"), @r#"
        UCASE("abc") = "ABC"
        UCASE("1"^^<http://www.w3.org/2001/XMLSchema#integer>) = error
        STRLEN("hello") = "5"^^<http://www.w3.org/2001/XMLSchema#integer>
        SUBSTR("hello", "2"^^<http://www.w3.org/2001/XMLSchema#integer>, "3"^^<http://www.w3.org/2001/XMLSchema#integer>) = "ell"
        CONCAT("a", "b") = "ab"
        STRBEFORE("abc", "b") = "a"
        ABS("-3"^^<http://www.w3.org/2001/XMLSchema#integer>) = "3"^^<http://www.w3.org/2001/XMLSchema#integer>
        LANGMATCHES("en-US", "en") = "true"^^<http://www.w3.org/2001/XMLSchema#boolean>
        MD5("abc") = "900150983cd24fb0d6963f7d28e17f72"
        STR() = error
        "#);
    }
}
