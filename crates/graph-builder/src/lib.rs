//! Batched heterogeneous graph construction from basic blocks
//!
//! This crate turns sequences of structured instructions into a typed,
//! heterogeneous directed multigraph laid out as flat parallel arrays, the
//! form consumed by graph neural networks that predict code properties such
//! as throughput. Blocks are appended to a shared batch one at a time:
//!
//! - each instruction becomes an instruction node, chained to its
//!   predecessor by a structural dependency edge
//! - registers become nodes shared by all reads since the last write in the
//!   block; a write creates a fresh node (per-block SSA-style renaming)
//! - address operands are decomposed into base/index/segment/displacement
//!   sub-edges; memory operands are deduplicated by alias group
//!
//! Appends are transactional: a failed [`add_block`] leaves the batch
//! bit-identical to its pre-call state.
//!
//! # Modules
//!
//! - [`vocabulary`]: token string → dense index mapping
//! - [`oov`]: policy for tokens outside the vocabulary
//! - [`graph`]: node/edge type enums and the flat array storage
//! - [`transaction`]: all-or-nothing append support
//! - [`builder`]: the translator, [`BasicBlockGraphBuilder`]
//!
//! [`add_block`]: BasicBlockGraphBuilder::add_block

pub mod builder;
pub mod graph;
pub mod oov;
pub mod transaction;
pub mod vocabulary;

pub use builder::{BasicBlockGraphBuilder, BuilderError, BuilderResult};
pub use graph::{EdgeType, NodeIndex, NodeType};
pub use oov::OovPolicy;
pub use vocabulary::{TokenIndex, Vocabulary};
