//! Shared application state for the server.
//!
//! `AppState` owns the update coordinator that `POST /api/query` feeds, and
//! the [`GraphView`] it publishes into. Handlers share it via `Arc`.

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use ctegraph_core::Edge;
use ctegraph_view::{
    CoordinatorConfig, CoordinatorHandle, LayeredLayout, LayoutEngine, PositionedNode,
    RebuildError, RenderSurface, Snapshot, UpdateCoordinator,
};
use serde::Serialize;
use tracing::debug;

/// Server configuration derived from CLI arguments.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Dialect and layout settings for every rebuild
    pub coordinator: CoordinatorConfig,
    /// Port to listen on
    pub port: u16,
    /// SQL to render before the first request arrives
    pub initial_sql: Option<String>,
    /// File whose changes are fed to the coordinator
    pub watch_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            coordinator: CoordinatorConfig::default(),
            port: 3000,
            initial_sql: None,
            watch_file: None,
        }
    }
}

/// What `GET /api/graph` reports.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphState {
    /// Bumped on every publish; zero until the first graph arrives.
    pub revision: u64,
    /// Revision the view was last fitted to.
    pub fitted_revision: u64,
    #[serde(flatten)]
    pub snapshot: Snapshot,
    /// Message of the most recent failed rebuild, cleared by the next publish.
    pub last_error: Option<String>,
}

/// The server's rendering surface: the latest published graph.
#[derive(Debug, Default)]
pub struct GraphView {
    state: RwLock<GraphState>,
}

impl GraphView {
    pub fn current(&self) -> GraphState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update(&self, apply: impl FnOnce(&mut GraphState)) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        apply(&mut state);
    }
}

impl RenderSurface for GraphView {
    fn publish(&self, nodes: Vec<PositionedNode>, edges: Vec<Edge>) {
        self.update(|state| {
            state.revision += 1;
            state.snapshot = Snapshot { nodes, edges };
            state.last_error = None;
            debug!(revision = state.revision, "graph published");
        });
    }

    fn fit_view(&self) {
        self.update(|state| state.fitted_revision = state.revision);
    }

    fn rebuild_failed(&self, error: &RebuildError) {
        let message = error.to_string();
        self.update(|state| state.last_error = Some(message));
    }
}

/// Shared application state.
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,
    /// Engine shared by the coordinator and one-shot requests
    pub engine: Arc<dyn LayoutEngine>,
    /// Latest published graph
    pub view: Arc<GraphView>,
    /// Coordinator fed by `POST /api/query` and the file watcher
    pub coordinator: CoordinatorHandle,
}

impl AppState {
    /// Create the state and start its coordinator on the current runtime.
    ///
    /// `config.initial_sql`, when set, is submitted straight away.
    pub fn start(config: ServerConfig) -> Self {
        let engine: Arc<dyn LayoutEngine> = Arc::new(LayeredLayout::new());
        let view = Arc::new(GraphView::default());
        let coordinator = UpdateCoordinator::spawn(
            config.coordinator.clone(),
            Arc::clone(&engine),
            Arc::clone(&view) as Arc<dyn RenderSurface>,
        );

        if let Some(sql) = &config.initial_sql {
            coordinator.submit(sql.clone());
        }

        Self {
            config,
            engine,
            view,
            coordinator,
        }
    }
}
