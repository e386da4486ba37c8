//! The SPARQL function library.
//!
//! This crate contains the value semantics of SPARQL (effective boolean value, comparisons,
//! numeric promotion), the builtin scalar functions, and the aggregate accumulators. Custom
//! functions can be added via the [FunctionRegistry].

pub mod aggregates;
mod name;
mod registry;
pub mod scalar;
mod value;

pub use name::{BuiltinName, FunctionName};
pub use registry::{
    DefaultFunctionRegistry, FunctionContext, FunctionRegistry, FunctionRegistryRef,
    ScalarSparqlOp,
};
pub use value::{
    effective_boolean_value, order_by_cmp, sparql_compare, sparql_equals, CompatibleStringArgs,
    Numeric, StringLiteralRef, TypedValue,
};
