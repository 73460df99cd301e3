//! Keeps a rendering surface in step with incoming query text.
//!
//! Each submitted text runs the whole pipeline (parse, build, layout) and the
//! result replaces whatever the surface showed. Only one pipeline runs at a
//! time. Text that arrives while one is in flight waits in a single slot where
//! newer text overwrites older, so a burst of edits costs at most one extra
//! rebuild and results are always published in submission order.

use std::sync::Arc;

use ctegraph_core::{build_lineage_from_sql, Dialect, Edge, LineageError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info_span, warn, Instrument};

use crate::layout::{layout_graph, LayoutEngine, LayoutError, LayoutOptions, PositionedNode};

/// Where laid-out graphs end up.
pub trait RenderSurface: Send + Sync {
    /// Replace the displayed graph.
    fn publish(&self, nodes: Vec<PositionedNode>, edges: Vec<Edge>);

    /// Re-fit the view to the extent of the current nodes.
    fn fit_view(&self);

    /// A rebuild failed; whatever was displayed before stays.
    fn rebuild_failed(&self, _error: &RebuildError) {}
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RebuildError {
    #[error(transparent)]
    Lineage(#[from] LineageError),

    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Positioned nodes plus the edges between them, ready to draw.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoordinatorConfig {
    pub dialect: Dialect,
    pub layout: LayoutOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinatorState {
    #[default]
    Idle,
    Rebuilding,
}

/// Runs the pipeline once: build the lineage graph, then lay it out.
///
/// The build is synchronous; awaiting the engine is the only suspension point.
pub async fn rebuild(
    sql: &str,
    config: &CoordinatorConfig,
    engine: &dyn LayoutEngine,
) -> Result<Snapshot, RebuildError> {
    let graph = build_lineage_from_sql(sql, config.dialect)?;
    let nodes = layout_graph(engine, &graph, &config.layout).await?;
    Ok(Snapshot {
        nodes,
        edges: graph.edges,
    })
}

pub struct UpdateCoordinator;

impl UpdateCoordinator {
    /// Starts the coordinator task on the current Tokio runtime.
    ///
    /// `engine` is shared by every rebuild. The task lives until the returned
    /// handle is dropped or shut down.
    pub fn spawn(
        config: CoordinatorConfig,
        engine: Arc<dyn LayoutEngine>,
        surface: Arc<dyn RenderSurface>,
    ) -> CoordinatorHandle {
        let (text_tx, text_rx) = watch::channel(String::new());
        let (state_tx, state_rx) = watch::channel(CoordinatorState::Idle);

        let worker = Worker {
            config,
            engine,
            surface,
            state: state_tx,
        };
        let task = tokio::spawn(worker.run(text_rx));

        CoordinatorHandle {
            text: text_tx,
            state: state_rx,
            task,
        }
    }
}

/// Host-side handle: submit text, observe state, shut down.
pub struct CoordinatorHandle {
    text: watch::Sender<String>,
    state: watch::Receiver<CoordinatorState>,
    task: JoinHandle<()>,
}

impl CoordinatorHandle {
    /// Queues `sql` as the next text to render, replacing any text still
    /// waiting behind the rebuild in flight.
    pub fn submit(&self, sql: impl Into<String>) {
        self.text.send_replace(sql.into());
    }

    pub fn state(&self) -> CoordinatorState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<CoordinatorState> {
        self.state.clone()
    }

    /// Stops accepting text and waits for the pipeline in flight (and any
    /// text already queued) to finish.
    pub async fn shutdown(self) {
        drop(self.text);
        if let Err(err) = self.task.await {
            warn!(error = %err, "coordinator task ended abnormally");
        }
    }
}

struct Worker {
    config: CoordinatorConfig,
    engine: Arc<dyn LayoutEngine>,
    surface: Arc<dyn RenderSurface>,
    state: watch::Sender<CoordinatorState>,
}

impl Worker {
    async fn run(self, mut text: watch::Receiver<String>) {
        while text.changed().await.is_ok() {
            let sql = text.borrow_and_update().clone();
            self.state.send_replace(CoordinatorState::Rebuilding);

            let span = info_span!("rebuild", sql_len = sql.len());
            match rebuild(&sql, &self.config, self.engine.as_ref())
                .instrument(span)
                .await
            {
                Ok(snapshot) => {
                    debug!(
                        nodes = snapshot.nodes.len(),
                        edges = snapshot.edges.len(),
                        "publishing lineage graph"
                    );
                    self.surface.publish(snapshot.nodes, snapshot.edges);
                    // Let the surface take the new nodes in before fitting to them.
                    tokio::task::yield_now().await;
                    self.surface.fit_view();
                }
                Err(err) => {
                    warn!(error = %err, "rebuild failed; keeping previous graph");
                    self.surface.rebuild_failed(&err);
                }
            }

            if !text.has_changed().unwrap_or(false) {
                self.state.send_replace(CoordinatorState::Idle);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayeredLayout;

    #[tokio::test]
    async fn test_rebuild_positions_every_node() {
        let config = CoordinatorConfig::default();
        let snapshot = rebuild(
            "WITH b AS (SELECT * FROM a) SELECT * FROM b",
            &config,
            &LayeredLayout::new(),
        )
        .await
        .unwrap();

        assert_eq!(snapshot.nodes.len(), 3);
        assert_eq!(snapshot.edges.len(), 2);
        assert!(snapshot.nodes.iter().all(|node| node.width.is_some()));
    }

    #[tokio::test]
    async fn test_rebuild_surfaces_lineage_errors() {
        let err = rebuild("SELECT * FROM", &CoordinatorConfig::default(), &LayeredLayout::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RebuildError::Lineage(LineageError::Parse(_))));
    }
}
