use crate::scalar::invoke_builtin;
use crate::{BuiltinName, FunctionName};
use rdf_eval_model::{Term, ThinResult};
use rustc_hash::FxHashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// A reference-counted pointer to an implementation of the [FunctionRegistry] trait.
pub type FunctionRegistryRef = Arc<dyn FunctionRegistry>;

/// Per-invocation information for stateful functions.
///
/// Functions like `BNODE(?x)` must return the same term for the same argument within one
/// solution but a fresh term for every other solution. The `binding_id` identifies the solution
/// and is unique within a query, while `query_id` separates different query executions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionContext {
    query_id: u64,
    binding_id: u64,
}

impl FunctionContext {
    pub fn new(query_id: u64, binding_id: u64) -> Self {
        Self {
            query_id,
            binding_id,
        }
    }

    pub fn query_id(&self) -> u64 {
        self.query_id
    }

    pub fn binding_id(&self) -> u64 {
        self.binding_id
    }
}

/// A scalar function that can be called from SPARQL expressions.
///
/// An invocation fails with a [ThinError](rdf_eval_model::ThinError) if the function is not
/// defined for the given arguments.
pub trait ScalarSparqlOp: Debug + Send + Sync {
    /// Returns the name of the function.
    fn name(&self) -> &FunctionName;

    /// Invokes the function on already evaluated arguments.
    fn invoke(&self, args: &[Term], context: &FunctionContext) -> ThinResult<Term>;
}

/// A registry for SPARQL functions.
pub trait FunctionRegistry: Debug + Send + Sync {
    /// Returns the implementation of `function_name`, if it is known.
    fn scalar_function(&self, function_name: &FunctionName) -> Option<Arc<dyn ScalarSparqlOp>>;
}

/// The default implementation of the [FunctionRegistry] trait.
///
/// This registry provides all builtin functions and allows registering additional custom functions.
///
/// # Additional Resources
/// - [SPARQL 1.1 Query Language - Function Library](https://www.w3.org/TR/sparql11-query/#SparqlOps)
#[derive(Debug)]
pub struct DefaultFunctionRegistry {
    scalar_mapping: FxHashMap<FunctionName, Arc<dyn ScalarSparqlOp>>,
}

impl DefaultFunctionRegistry {
    /// Create a new [DefaultFunctionRegistry] with all builtin functions.
    pub fn new() -> Self {
        let mut registry = Self {
            scalar_mapping: FxHashMap::default(),
        };
        for builtin in ALL_BUILTINS {
            registry.register_function(Arc::new(BuiltinSparqlOp::new(*builtin)));
        }
        registry
    }

    /// Registers a function. An existing function with the same name is replaced.
    pub fn register_function(&mut self, function: Arc<dyn ScalarSparqlOp>) {
        self.scalar_mapping.insert(function.name().clone(), function);
    }
}

impl Default for DefaultFunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionRegistry for DefaultFunctionRegistry {
    fn scalar_function(&self, function_name: &FunctionName) -> Option<Arc<dyn ScalarSparqlOp>> {
        self.scalar_mapping.get(function_name).cloned()
    }
}

/// Adapts a [BuiltinName] to the [ScalarSparqlOp] trait.
#[derive(Debug)]
struct BuiltinSparqlOp {
    name: FunctionName,
    builtin: BuiltinName,
}

impl BuiltinSparqlOp {
    fn new(builtin: BuiltinName) -> Self {
        Self {
            name: FunctionName::Builtin(builtin),
            builtin,
        }
    }
}

impl ScalarSparqlOp for BuiltinSparqlOp {
    fn name(&self) -> &FunctionName {
        &self.name
    }

    fn invoke(&self, args: &[Term], context: &FunctionContext) -> ThinResult<Term> {
        invoke_builtin(self.builtin, args, context)
    }
}

const ALL_BUILTINS: &[BuiltinName] = &[
    BuiltinName::Str,
    BuiltinName::Lang,
    BuiltinName::LangMatches,
    BuiltinName::Datatype,
    BuiltinName::Iri,
    BuiltinName::BNode,
    BuiltinName::StrDt,
    BuiltinName::StrLang,
    BuiltinName::Uuid,
    BuiltinName::StrUuid,
    BuiltinName::IsIri,
    BuiltinName::IsBlank,
    BuiltinName::IsLiteral,
    BuiltinName::IsNumeric,
    BuiltinName::StrLen,
    BuiltinName::SubStr,
    BuiltinName::UCase,
    BuiltinName::LCase,
    BuiltinName::StrStarts,
    BuiltinName::StrEnds,
    BuiltinName::Contains,
    BuiltinName::StrBefore,
    BuiltinName::StrAfter,
    BuiltinName::EncodeForUri,
    BuiltinName::Concat,
    BuiltinName::Replace,
    BuiltinName::Regex,
    BuiltinName::Abs,
    BuiltinName::Round,
    BuiltinName::Ceil,
    BuiltinName::Floor,
    BuiltinName::Rand,
    BuiltinName::Md5,
    BuiltinName::Sha1,
    BuiltinName::Sha256,
    BuiltinName::Sha384,
    BuiltinName::Sha512,
    BuiltinName::CastString,
    BuiltinName::CastBoolean,
    BuiltinName::CastInteger,
    BuiltinName::CastDecimal,
    BuiltinName::CastFloat,
    BuiltinName::CastDouble,
    BuiltinName::CastDateTime,
];
