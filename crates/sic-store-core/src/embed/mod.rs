//! Hash-embedding implementation of the index capability.
//!
//! A deterministic stand-in for a neural embedding engine: good enough to
//! serve lexical nearest-neighbour lookups over the SIC reference data
//! without model downloads.

pub mod builder;
pub mod hasher;
pub mod reference;
pub mod vector_index;

pub use builder::HashIndexBuilder;
pub use hasher::HashEmbedder;
pub use reference::SicEntry;
pub use vector_index::VectorIndex;
