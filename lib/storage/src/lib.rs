//! Contains storage layer implementations for the query evaluator.

pub mod memory;

pub use memory::MemDataset;
