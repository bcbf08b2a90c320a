//! The loaded transit network and its hot-swappable handle.
//!
//! A [`Network`] is the compiled graph plus the stop name index built from
//! the same timetable snapshot. It is immutable once built; reloading the
//! timetable builds a new one and swaps it into the [`NetworkHandle`], so
//! queries already running keep the version they started with.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::graph::{CompileError, NetworkGraph};
use crate::stops::StopNameIndex;
use crate::timetable::{TimetableError, TimetableSnapshot, load_dir};

/// Errors from building a network.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("failed to load timetable: {0}")]
    Timetable(#[from] TimetableError),

    #[error("failed to compile network: {0}")]
    Compile(#[from] CompileError),

    #[error("network load task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A compiled network ready for queries.
pub struct Network {
    graph: NetworkGraph,
    names: StopNameIndex,
}

impl Network {
    /// Compile a network from a timetable snapshot.
    pub fn build(snapshot: TimetableSnapshot) -> Result<Self, CompileError> {
        let names = StopNameIndex::build(&snapshot);
        let graph = NetworkGraph::compile(Arc::new(snapshot))?;
        Ok(Self { graph, names })
    }

    /// Load and compile a GTFS directory.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, NetworkError> {
        let snapshot = load_dir(dir)?;
        Ok(Self::build(snapshot)?)
    }

    pub fn graph(&self) -> &NetworkGraph {
        &self.graph
    }

    pub fn names(&self) -> &StopNameIndex {
        &self.names
    }
}

/// Shared handle to the current network.
///
/// Cloning the handle shares the same underlying slot.
#[derive(Clone)]
pub struct NetworkHandle {
    current: Arc<RwLock<Arc<Network>>>,
}

impl NetworkHandle {
    pub fn new(network: Network) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(network))),
        }
    }

    /// The network to run a query against.
    pub async fn current(&self) -> Arc<Network> {
        self.current.read().await.clone()
    }

    /// Swap in a new network, returning the previous one.
    pub async fn replace(&self, network: Network) -> Arc<Network> {
        let mut guard = self.current.write().await;
        std::mem::replace(&mut *guard, Arc::new(network))
    }

    /// Reload the timetable from a GTFS directory.
    ///
    /// Loading and compiling run on the blocking pool. On failure the
    /// current network is kept and the error is returned.
    pub async fn reload(&self, dir: impl AsRef<Path>) -> Result<usize, NetworkError> {
        let dir = dir.as_ref().to_path_buf();
        let network = tokio::task::spawn_blocking(move || Network::load(dir)).await??;
        let stops = network.graph().stop_count();
        self.replace(network).await;
        info!(stops, "network reloaded");
        Ok(stops)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timetable::fixtures::three_stop_line;

    #[test]
    fn build_indexes_names_and_graph() {
        let network = Network::build(three_stop_line()).unwrap();
        assert_eq!(network.graph().stop_count(), 3);
        assert_eq!(
            network.names().find_exact("footscray").unwrap().stop_id.as_str(),
            "S2"
        );
    }

    #[tokio::test]
    async fn replace_keeps_old_version_alive() {
        let handle = NetworkHandle::new(Network::build(three_stop_line()).unwrap());
        let before = handle.current().await;

        let empty = TimetableSnapshot::new(vec![], vec![], vec![], vec![]).unwrap();
        let previous = handle.replace(Network::build(empty).unwrap()).await;

        assert!(Arc::ptr_eq(&before, &previous));
        assert_eq!(before.graph().stop_count(), 3);
        assert_eq!(handle.current().await.graph().stop_count(), 0);
    }

    #[tokio::test]
    async fn failed_reload_keeps_current() {
        let handle = NetworkHandle::new(Network::build(three_stop_line()).unwrap());
        let dir = tempfile::tempdir().unwrap();

        let result = handle.reload(dir.path()).await;
        assert!(matches!(result, Err(NetworkError::Timetable(_))));
        assert_eq!(handle.current().await.graph().stop_count(), 3);
    }
}
