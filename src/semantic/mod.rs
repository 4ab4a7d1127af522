//! Semantic analysis for Runik
//!
//! The passes between parsing and command generation: node id assignment,
//! structural checks, declaration indexing, reference resolution, cycle
//! detection and constant folding. Each pass is a plain recursive walk
//! with its context threaded explicitly; shared results accumulate in the
//! [`Index`] side tables.

pub mod callgraph;
pub mod eval;
pub mod frame;
pub mod ids;
pub mod index;
pub mod indexer;
pub mod post_index;
pub mod pre_index;

pub use callgraph::{CallGraph, CallGraphNode, StronglyConnectedComponents};
pub use eval::Value;
pub use frame::{Frame, Local};
pub use ids::IdGen;
pub use index::{FunctionKey, Index, TypeEntry};
