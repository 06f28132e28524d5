//! Node snapshot capability.
//!
//! The `NodeFetcher` trait abstracts over however the current node object is
//! retrieved (API server watch cache, local file, test fixture). Implementations:
//! - `StaticNodeFetcher`: in-memory snapshot that can be swapped atomically

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use poweraware_core::BoxError;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Point-in-time view of a node's metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct NodeManifest {
    metadata: Node,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotations: BTreeMap::new(),
        }
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn annotations(&self) -> &BTreeMap<String, String> {
        &self.annotations
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }

    /// Decode a Kubernetes node manifest, keeping `metadata.name` and
    /// `metadata.annotations`.
    pub fn from_manifest_json(raw: &str) -> poweraware_core::Result<Self> {
        let manifest: NodeManifest = serde_json::from_str(raw)?;
        Ok(manifest.metadata)
    }
}

/// Capability that yields the current node object.
///
/// Implementations must return promptly once `cancel` fires.
#[async_trait]
pub trait NodeFetcher: Send + Sync {
    async fn get_node(&self, cancel: &CancellationToken) -> Result<Node, BoxError>;
}

/// In-memory node fetcher. Every call returns a clone of the current snapshot.
#[derive(Debug, Default)]
pub struct StaticNodeFetcher {
    node: RwLock<Node>,
}

impl StaticNodeFetcher {
    pub fn new(node: Node) -> Self {
        Self {
            node: RwLock::new(node),
        }
    }

    /// Replace the whole annotation map.
    pub fn set_annotations(&self, annotations: BTreeMap<String, String>) {
        self.node.write().annotations = annotations;
    }

    /// Apply an in-place change to the snapshot under the write lock.
    pub fn update(&self, f: impl FnOnce(&mut Node)) {
        let mut node = self.node.write();
        f(&mut node);
    }

    pub fn snapshot(&self) -> Node {
        self.node.read().clone()
    }
}

#[async_trait]
impl NodeFetcher for StaticNodeFetcher {
    async fn get_node(&self, cancel: &CancellationToken) -> Result<Node, BoxError> {
        if cancel.is_cancelled() {
            return Err("node fetch cancelled".into());
        }
        Ok(self.snapshot())
    }
}
