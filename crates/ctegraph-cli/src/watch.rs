//! File watching for `--watch`.
//!
//! Watches one SQL file and hands its text to an update coordinator on every
//! debounced change. In plain watch mode the terminal is the rendering
//! surface; with `--serve` the server state is.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use ctegraph_core::Edge;
use ctegraph_view::{
    CoordinatorConfig, CoordinatorHandle, LayeredLayout, PositionedNode, RebuildError,
    RenderSurface, Snapshot, UpdateCoordinator,
};
use notify_debouncer_mini::notify::{RecursiveMode, Watcher};
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use tracing::{debug, warn};

use crate::{input, output};

/// Debounce duration for file system events.
///
/// Groups the bursts editors produce on save (write, rename, chmod) into a
/// single rebuild.
const DEBOUNCE_DURATION: Duration = Duration::from_millis(100);

/// Prints each published graph to stdout and each failure to stderr.
pub struct TerminalSurface {
    quiet: bool,
}

impl TerminalSurface {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl RenderSurface for TerminalSurface {
    fn publish(&self, nodes: Vec<PositionedNode>, edges: Vec<Edge>) {
        let snapshot = Snapshot { nodes, edges };
        println!("{}\n", output::format_snapshot(&snapshot, true));
    }

    // The table always shows the whole graph.
    fn fit_view(&self) {}

    fn rebuild_failed(&self, error: &RebuildError) {
        eprintln!("ctegraph: error: {error}");
        if !self.quiet {
            eprintln!("ctegraph: keeping the previous graph");
        }
    }
}

/// Run `--watch` without a server: render to the terminal until Ctrl+C.
pub async fn run_watch(path: PathBuf, config: CoordinatorConfig, quiet: bool) -> Result<()> {
    let sql = input::read_file(&path)?;
    let coordinator = UpdateCoordinator::spawn(
        config,
        Arc::new(LayeredLayout::new()),
        Arc::new(TerminalSurface::new(quiet)),
    );
    coordinator.submit(sql);

    if !quiet {
        eprintln!("ctegraph: watching {} (Ctrl+C to stop)", path.display());
    }

    let result = tokio::select! {
        result = watch_file(&path, &coordinator) => result,
        _ = tokio::signal::ctrl_c() => Ok(()),
    };

    coordinator.shutdown().await;
    result
}

/// Submit the contents of `path` to `coordinator` every time it changes.
///
/// Watches the parent directory rather than the file itself so editors that
/// save by replacing the file keep being tracked. Runs until the watcher
/// shuts down.
pub async fn watch_file(path: &Path, coordinator: &CoordinatorHandle) -> Result<()> {
    let target = path
        .canonicalize()
        .map_err(|e| anyhow::anyhow!("Failed to resolve {}: {e}", path.display()))?;
    let dir = target
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("/"));

    let (tx, mut rx) = tokio::sync::mpsc::channel(16);

    let mut debouncer = new_debouncer(DEBOUNCE_DURATION, move |result| {
        if let Err(e) = tx.blocking_send(result) {
            warn!(error = %e, "failed to forward file event");
        }
    })
    .map_err(|e| anyhow::anyhow!("Failed to create file watcher: {e}"))?;

    debouncer
        .watcher()
        .watch(&dir, RecursiveMode::NonRecursive)
        .map_err(|e| anyhow::anyhow!("Failed to watch {}: {e}", dir.display()))?;

    while let Some(result) = rx.recv().await {
        match result {
            Ok(events) => {
                let changed = events.iter().any(|event| {
                    event.path == target
                        && matches!(
                            event.kind,
                            DebouncedEventKind::Any | DebouncedEventKind::AnyContinuous
                        )
                });
                if !changed {
                    continue;
                }

                match input::read_file(&target) {
                    Ok(sql) => {
                        debug!(path = %target.display(), "file changed");
                        coordinator.submit(sql);
                    }
                    // Mid-save the file may briefly be missing; the next event picks it up.
                    Err(e) => warn!(error = %e, "failed to re-read watched file"),
                }
            }
            Err(error) => {
                warn!(error = %error, "watcher error");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tokio::sync::mpsc;

    struct ChannelSurface(mpsc::UnboundedSender<Vec<String>>);

    impl RenderSurface for ChannelSurface {
        fn publish(&self, nodes: Vec<PositionedNode>, _edges: Vec<Edge>) {
            let _ = self.0.send(nodes.into_iter().map(|node| node.id).collect());
        }

        fn fit_view(&self) {}
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_file_change_is_submitted() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "SELECT * FROM first").unwrap();
        file.flush().unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let coordinator = UpdateCoordinator::spawn(
            CoordinatorConfig::default(),
            Arc::new(LayeredLayout::new()),
            Arc::new(ChannelSurface(tx)),
        );

        let path = file.path().to_path_buf();
        let watcher = {
            let coordinator = &coordinator;
            async move { watch_file(&path, coordinator).await }
        };

        let check = async {
            // Let the watcher register before touching the file.
            tokio::time::sleep(Duration::from_millis(300)).await;
            std::fs::write(file.path(), "SELECT * FROM second").unwrap();
            rx.recv().await
        };

        let published = tokio::time::timeout(Duration::from_secs(10), async {
            tokio::select! {
                result = watcher => panic!("watcher exited early: {result:?}"),
                published = check => published,
            }
        })
        .await
        .expect("no rebuild after file change");

        assert_eq!(
            published,
            Some(vec!["second".to_string(), "(main)".to_string()])
        );
    }
}
