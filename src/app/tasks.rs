use eframe::egui;
use std::future::Future;
use std::path::PathBuf;
use tokio::sync::mpsc;

use tourmap::StoreResult;
use tourmap::engine::Snapshot;
use tourmap::model::{EntityId, Review};
use tourmap::store::DocumentStore;

/// Results of background store calls, applied on the UI thread between frames.
pub(super) enum TaskResult {
    StoreOpened {
        path: PathBuf,
        result: StoreResult<(DocumentStore, Snapshot)>,
    },
    /// A mutation followed by a reload of every collection.
    Mutated {
        message: String,
        result: StoreResult<Snapshot>,
    },
    Reloaded(StoreResult<Snapshot>),
    Reviews {
        target_id: EntityId,
        result: StoreResult<Vec<Review>>,
    },
    Exported {
        path: PathBuf,
        result: StoreResult<()>,
    },
}

pub(super) struct TaskRunner {
    runtime: tokio::runtime::Handle,
    ctx: egui::Context,
    tx: mpsc::UnboundedSender<TaskResult>,
    rx: mpsc::UnboundedReceiver<TaskResult>,
    in_flight: usize,
}

impl TaskRunner {
    pub fn new(runtime: tokio::runtime::Handle, ctx: egui::Context) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            runtime,
            ctx,
            tx,
            rx,
            in_flight: 0,
        }
    }

    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = TaskResult> + Send + 'static,
    {
        let tx = self.tx.clone();
        let ctx = self.ctx.clone();
        self.in_flight += 1;
        self.runtime.spawn(async move {
            let result = task.await;
            // The receiver only goes away when the app is closing.
            let _ = tx.send(result);
            ctx.request_repaint();
        });
    }

    /// Finished results in completion order.
    pub fn drain(&mut self) -> Vec<TaskResult> {
        let mut out = Vec::new();
        while let Ok(result) = self.rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            out.push(result);
        }
        out
    }

    pub fn busy(&self) -> bool {
        self.in_flight > 0
    }
}
