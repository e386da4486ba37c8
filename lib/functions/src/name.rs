use rdf_eval_model::vocab::xsd;
use rdf_eval_model::{NamedNode, NamedNodeRef};
use std::fmt::{Display, Formatter};

/// Identifier for a function. Either it is a builtin (e.g., a SPARQL function) or a custom
/// function.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum FunctionName {
    /// A builtin function.
    Builtin(BuiltinName),
    /// A custom function.
    Custom(NamedNode),
}

impl Display for FunctionName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FunctionName::Builtin(builtin) => builtin.fmt(f),
            FunctionName::Custom(name) => name.fmt(f),
        }
    }
}

/// The builtin SPARQL functions that are evaluated on terms.
///
/// Functional forms that require lazy evaluation of their arguments (e.g., `IF`, `COALESCE`,
/// `BOUND`, `EXISTS`, or the logical connectives) are not functions and handled by the expression
/// evaluator.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum BuiltinName {
    // Terms
    Str,
    Lang,
    LangMatches,
    Datatype,
    Iri,
    BNode,
    StrDt,
    StrLang,
    Uuid,
    StrUuid,
    IsIri,
    IsBlank,
    IsLiteral,
    IsNumeric,

    // Strings
    StrLen,
    SubStr,
    UCase,
    LCase,
    StrStarts,
    StrEnds,
    Contains,
    StrBefore,
    StrAfter,
    EncodeForUri,
    Concat,
    Replace,
    Regex,

    // Numeric
    Abs,
    Round,
    Ceil,
    Floor,
    Rand,

    // Hashing
    Md5,
    Sha1,
    Sha256,
    Sha384,
    Sha512,

    // Conversion
    CastString,
    CastBoolean,
    CastInteger,
    CastDecimal,
    CastFloat,
    CastDouble,
    CastDateTime,
}

impl BuiltinName {
    /// Returns the cast function that corresponds to the XSD constructor function `name`.
    pub fn from_cast_function(name: NamedNodeRef<'_>) -> Option<Self> {
        let builtin = match name {
            xsd::STRING => BuiltinName::CastString,
            xsd::BOOLEAN => BuiltinName::CastBoolean,
            xsd::INTEGER => BuiltinName::CastInteger,
            xsd::DECIMAL => BuiltinName::CastDecimal,
            xsd::FLOAT => BuiltinName::CastFloat,
            xsd::DOUBLE => BuiltinName::CastDouble,
            xsd::DATE_TIME => BuiltinName::CastDateTime,
            _ => return None,
        };
        Some(builtin)
    }
}

impl Display for BuiltinName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BuiltinName::Str => "STR",
            BuiltinName::Lang => "LANG",
            BuiltinName::LangMatches => "LANGMATCHES",
            BuiltinName::Datatype => "DATATYPE",
            BuiltinName::Iri => "IRI",
            BuiltinName::BNode => "BNODE",
            BuiltinName::StrDt => "STRDT",
            BuiltinName::StrLang => "STRLANG",
            BuiltinName::Uuid => "UUID",
            BuiltinName::StrUuid => "STRUUID",
            BuiltinName::IsIri => "isIRI",
            BuiltinName::IsBlank => "isBLANK",
            BuiltinName::IsLiteral => "isLITERAL",
            BuiltinName::IsNumeric => "isNUMERIC",
            BuiltinName::StrLen => "STRLEN",
            BuiltinName::SubStr => "SUBSTR",
            BuiltinName::UCase => "UCASE",
            BuiltinName::LCase => "LCASE",
            BuiltinName::StrStarts => "STRSTARTS",
            BuiltinName::StrEnds => "STRENDS",
            BuiltinName::Contains => "CONTAINS",
            BuiltinName::StrBefore => "STRBEFORE",
            BuiltinName::StrAfter => "STRAFTER",
            BuiltinName::EncodeForUri => "ENCODE_FOR_URI",
            BuiltinName::Concat => "CONCAT",
            BuiltinName::Replace => "REPLACE",
            BuiltinName::Regex => "REGEX",
            BuiltinName::Abs => "ABS",
            BuiltinName::Round => "ROUND",
            BuiltinName::Ceil => "CEIL",
            BuiltinName::Floor => "FLOOR",
            BuiltinName::Rand => "RAND",
            BuiltinName::Md5 => "MD5",
            BuiltinName::Sha1 => "SHA1",
            BuiltinName::Sha256 => "SHA256",
            BuiltinName::Sha384 => "SHA384",
            BuiltinName::Sha512 => "SHA512",
            BuiltinName::CastString => "xsd:string",
            BuiltinName::CastBoolean => "xsd:boolean",
            BuiltinName::CastInteger => "xsd:integer",
            BuiltinName::CastDecimal => "xsd:decimal",
            BuiltinName::CastFloat => "xsd:float",
            BuiltinName::CastDouble => "xsd:double",
            BuiltinName::CastDateTime => "xsd:dateTime",
        };
        f.write_str(name)
    }
}
