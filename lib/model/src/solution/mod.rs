//! Solution sets flowing between the operators of an algebra tree.

mod binding;
mod multiset;
mod ops;

pub use binding::Binding;
pub use multiset::Multiset;
pub use ops::merge_variables;
