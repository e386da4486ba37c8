mod dataset;
mod index;

pub use dataset::MemDataset;
