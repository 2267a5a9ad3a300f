//! oncokin-dataset — Link resolution and temporal, leakage-aware dataset
//! assembly for kinase/cancer association learning.

pub mod assembler;
pub mod features;
pub mod resolver;
pub mod sampler;

pub use assembler::{DatasetAssembler, LabelSets, PhaseFilter};
pub use features::EmbeddingTable;
pub use resolver::{LinkResolver, ResolvedLink};
pub use sampler::{CycleSource, RandomSource, ThreadRngSource};
