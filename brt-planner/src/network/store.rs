//! Shared, reloadable handle to the transit graph.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use super::error::NetworkError;
use super::graph::TransitGraph;

/// Thread-safe holder of the current transit graph.
///
/// Readers take an `Arc` snapshot and plan against it without holding the
/// lock. Reloading builds a complete new graph first and then swaps it in,
/// so a reader never observes a half-updated network.
#[derive(Clone)]
pub struct NetworkStore {
    inner: Arc<RwLock<Arc<TransitGraph>>>,
    source: Option<PathBuf>,
}

impl NetworkStore {
    /// Wrap an already-built graph (no file to reload from).
    pub fn new(graph: TransitGraph) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(graph))),
            source: None,
        }
    }

    /// Load the graph from a JSON dataset, remembering the path for reloads.
    ///
    /// This will fail if the dataset is unreadable or inconsistent.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, NetworkError> {
        let path = path.into();
        let graph = TransitGraph::load_path(&path)?;
        info!(
            path = %path.display(),
            stops = graph.stop_count(),
            routes = graph.route_count(),
            "Loaded transit network"
        );
        Ok(Self {
            inner: Arc::new(RwLock::new(Arc::new(graph))),
            source: Some(path),
        })
    }

    /// Current graph snapshot.
    pub async fn snapshot(&self) -> Arc<TransitGraph> {
        self.inner.read().await.clone()
    }

    /// Path the graph was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Replace the current graph wholesale.
    pub async fn replace(&self, graph: TransitGraph) {
        let mut guard = self.inner.write().await;
        *guard = Arc::new(graph);
    }

    /// Reload the graph from its source file.
    ///
    /// On success, replaces the current graph and returns its stop count.
    /// On failure, the existing graph is preserved and the error is returned.
    /// A store without a source file reloads to itself.
    pub async fn reload(&self) -> Result<usize, NetworkError> {
        let Some(path) = &self.source else {
            return Ok(self.snapshot().await.stop_count());
        };

        let graph = TransitGraph::load_path(path)?;
        let count = graph.stop_count();
        self.replace(graph).await;
        Ok(count)
    }
}
