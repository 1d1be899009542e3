//! Inference core for an interactive grammatical-inference tool.
//!
//! This crate provides:
//! - Dense storage for binary CNF grammars
//! - A CYK recognizer with full and chunked execution, suitable for
//!   driving a responsive UI
//! - A colorizer assigning every span a best-scoring segmentation into
//!   maximal non-terminal spans, also runnable incrementally
//! - Per-example constraint graphs with pairwise intersection, dead-node
//!   pruning, and shortest-path extraction
//!
//! The host environment (tokenization, grammar construction, redraw loop,
//! bindings) is an external collaborator; everything here is plain Rust
//! data driven through a programmatic API.

pub mod color;
pub mod colorizer;
pub mod constraint;
pub mod cyk;
pub mod diag;
pub mod grammar;
pub mod graph;
pub mod intersect;
pub mod solve;

// Re-exports for convenience
pub use color::{Color, ColorSet, Score};
pub use colorizer::Colorizer;
pub use constraint::{ConstraintState, EdgeInfo, Provenance, ProvenanceElement, VertexInfo};
pub use cyk::{Cyk, CHUNK_LEN};
pub use grammar::{Grammar, GrammarError, Pos, Production, Sym};
pub use intersect::intersect;
pub use solve::{Solution, PATH_ITERATION_LIMIT};
