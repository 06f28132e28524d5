//! Node power spec — reads power-management intent from node annotations.
//!
//! A `NodeAnnotationSpecFetcher` asks a `NodeFetcher` for the current node,
//! reads four annotations under its configured prefix and decodes them into
//! a `PowerSpec`, or fails without returning a partial spec.

pub mod fetcher;
pub mod node;
pub mod types;

pub use fetcher::{AnnotationKeys, NodeAnnotationSpecFetcher, SpecFetcher};
pub use node::{Node, NodeFetcher, StaticNodeFetcher};
pub use types::*;
