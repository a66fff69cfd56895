//! Storage of the catalog graph between process runs.
//!
//! The [`ModelPersistence`] trait is the only thing the catalog store knows
//! about storage. [`SqliteModelPersistence`](crate::sqlite_persistence::SqliteModelPersistence)
//! is the production backend; [`InMemoryPersistence`] serves tests and dry
//! runs.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::RwLock;

use crate::graph::Graph;

#[async_trait]
pub trait ModelPersistence: Send + Sync {
    /// Load the stored graph, or `None` if nothing was stored yet.
    async fn read(&self) -> Result<Option<Graph>>;

    /// Replace the stored graph.
    async fn write(&self, graph: &Graph) -> Result<()>;
}

/// Keeps the last written graph in memory.
pub struct InMemoryPersistence {
    graph: RwLock<Option<Graph>>,
    writes: RwLock<u64>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self {
            graph: RwLock::new(None),
            writes: RwLock::new(0),
        }
    }

    /// Start from an already stored graph.
    pub fn with_graph(graph: Graph) -> Self {
        Self {
            graph: RwLock::new(Some(graph)),
            writes: RwLock::new(0),
        }
    }

    /// Number of successful writes.
    pub fn writes(&self) -> u64 {
        *self.writes.read().unwrap()
    }

    pub fn stored(&self) -> Option<Graph> {
        self.graph.read().unwrap().clone()
    }
}

impl Default for InMemoryPersistence {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelPersistence for InMemoryPersistence {
    async fn read(&self) -> Result<Option<Graph>> {
        Ok(self.graph.read().unwrap().clone())
    }

    async fn write(&self, graph: &Graph) -> Result<()> {
        *self.graph.write().unwrap() = Some(graph.clone());
        *self.writes.write().unwrap() += 1;
        Ok(())
    }
}
