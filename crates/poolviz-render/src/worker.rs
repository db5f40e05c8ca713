//! Off-thread blending.
//!
//! A [`BlendJob`] carries owned copies of everything a render needs: the
//! surface with the unchanged masks already drawn, the bare photo surface,
//! and the masks above it.
//! The job runs on tokio's blocking pool and reports one [`BlendResult`] per
//! mask over a channel. Results are merged into the [`CompositeCache`] on the
//! owner's thread, where stale ones are dropped.

use std::collections::HashSet;
use std::sync::Arc;

use poolviz_core::CompositingSettings;
use poolviz_editor::Mask;
use tiny_skia::Pixmap;
use tokio::sync::mpsc;
use tracing::debug;

use crate::composite_cache::{BlendResult, CompositeCache};
use crate::pattern_cache::MaterialPattern;
use crate::pipeline::{render_mask_over, RenderView};

/// One mask of a job, with the signature it is expected to have.
#[derive(Debug, Clone)]
pub struct BlendTask {
    pub mask: Mask,
    pub pattern: Option<Arc<MaterialPattern>>,
    pub signature: u64,
}

#[derive(Debug, Clone)]
pub struct BlendJob {
    pub base: Pixmap,
    /// Same view of the photo with no masks drawn.
    pub photo: Pixmap,
    pub tasks: Vec<BlendTask>,
    pub view: RenderView,
    pub settings: CompositingSettings,
}

impl BlendJob {
    /// Signature of the topmost mask; identifies the job.
    pub fn key(&self) -> Option<u64> {
        self.tasks.last().map(|t| t.signature)
    }

    /// Renders every task in order, drawing each onto a private copy of the base.
    pub fn run(self, mut emit: impl FnMut(BlendResult) -> bool) {
        let mut surface = self.base;
        for task in self.tasks {
            let composite = render_mask_over(
                &surface,
                &self.photo,
                &task.mask,
                task.pattern.as_deref(),
                &self.view,
                &self.settings,
            );
            if let Some(composite) = &composite {
                composite.draw_onto(&mut surface);
            }
            let keep_going = emit(BlendResult {
                mask_id: task.mask.id,
                signature: task.signature,
                composite,
            });
            if !keep_going {
                break;
            }
        }
    }
}

/// Runs blend jobs on the blocking pool.
pub struct BlendWorker {
    tx: mpsc::UnboundedSender<BlendResult>,
    rx: mpsc::UnboundedReceiver<BlendResult>,
    in_flight: HashSet<u64>,
}

impl BlendWorker {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx,
            in_flight: HashSet::new(),
        }
    }

    /// Number of submitted jobs whose last result has not been received.
    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    /// Queues `job` unless an identical one is already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&mut self, job: BlendJob) -> bool {
        let Some(key) = job.key() else {
            return false;
        };
        if !self.in_flight.insert(key) {
            return false;
        }
        debug!("Submitting blend job for {} masks", job.tasks.len());
        let tx = self.tx.clone();
        tokio::task::spawn_blocking(move || {
            job.run(|result| tx.send(result).is_ok());
        });
        true
    }

    /// Waits for the next result.
    pub async fn recv(&mut self) -> Option<BlendResult> {
        let result = self.rx.recv().await?;
        self.in_flight.remove(&result.signature);
        Some(result)
    }

    /// Merges every result received so far. `current` maps a mask id to its
    /// signature now, or `None` if the mask no longer exists.
    ///
    /// Returns the number of results kept.
    pub fn drain(&mut self, cache: &CompositeCache, current: impl Fn(&str) -> Option<u64>) -> usize {
        let mut kept = 0;
        while let Ok(result) = self.rx.try_recv() {
            self.in_flight.remove(&result.signature);
            let signature = current(&result.mask_id);
            if cache.merge(result, signature) {
                kept += 1;
            }
        }
        kept
    }
}

impl Default for BlendWorker {
    fn default() -> Self {
        Self::new()
    }
}
