//! Per-class pass workers.
//!
//! ```text
//! Idle → Triggered → Cleaning → Rebuilding → Injecting → Reloading → Idle
//! ```
//!
//! Triggers that arrive while a pass runs stay queued in the channel and are
//! coalesced into one rerun once the pass finishes. Passes of all classes
//! share one build lock.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Mutex, mpsc};

use crate::config::SiteConfig;
use crate::core::{AssetClass, RenderMode};
use crate::logger::{status_error, status_success};
use crate::pipeline::{Context, Pipeline, PipelineError, Task};
use crate::reload::Reloader;
use crate::{debug, log};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchPhase {
    Idle,
    Triggered,
    Cleaning,
    Rebuilding,
    Injecting,
    Reloading,
}

impl WatchPhase {
    /// Phase a class is in while `task` runs.
    pub fn of_task(task: Task) -> Self {
        match task {
            Task::Clean(_) => Self::Cleaning,
            Task::Bundle(_) | Task::Images(_) | Task::Favicons => Self::Rebuilding,
            Task::Render(RenderMode::Compile) => Self::Rebuilding,
            Task::Render(RenderMode::Refresh) => Self::Injecting,
            Task::Reload => Self::Reloading,
        }
    }
}

impl fmt::Display for WatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Triggered => "triggered",
            Self::Cleaning => "cleaning",
            Self::Rebuilding => "rebuilding",
            Self::Injecting => "injecting",
            Self::Reloading => "reloading",
        })
    }
}

/// Receives every phase transition of every worker.
pub type PhaseObserver = Arc<dyn Fn(AssetClass, WatchPhase) + Send + Sync>;

/// Shared between all workers; held for the whole pass.
pub type BuildLock = Arc<Mutex<()>>;

/// Runs the pass of one class. Called on the blocking pool.
pub trait PassRunner: Send + Sync + 'static {
    fn run_pass(&self, class: AssetClass, on_task: &(dyn Fn(Task) + Sync)) -> Result<(), PipelineError>;

    /// Surface a failed pass. The worker returns to idle afterwards.
    fn report_failure(&self, class: AssetClass, error: &PipelineError);
}

/// Runs the class pipelines against the real site, reloading through
/// `reloader`.
pub struct PipelineRunner {
    config: Arc<SiteConfig>,
    reloader: Reloader,
}

impl PipelineRunner {
    pub fn new(config: Arc<SiteConfig>, reloader: Reloader) -> Self {
        Self { config, reloader }
    }
}

impl PassRunner for PipelineRunner {
    fn run_pass(&self, class: AssetClass, on_task: &(dyn Fn(Task) + Sync)) -> Result<(), PipelineError> {
        let Some(pipeline) = Pipeline::for_class(class) else {
            return Ok(());
        };
        pipeline.run_observed(Context::new(&self.config, Some(&self.reloader)), on_task)
    }

    fn report_failure(&self, class: AssetClass, error: &PipelineError) {
        let summary = format!("{class} pass failed: {error}");
        let detail = format!("{:#}", error.source);
        status_error(&summary, &detail);
        self.reloader.error(&summary, &detail);
    }
}

pub struct Worker<R: PassRunner> {
    class: AssetClass,
    runner: Arc<R>,
    lock: BuildLock,
    observer: PhaseObserver,
    triggers: mpsc::UnboundedReceiver<()>,
}

impl<R: PassRunner> Worker<R> {
    pub fn new(
        class: AssetClass,
        runner: Arc<R>,
        lock: BuildLock,
        observer: PhaseObserver,
        triggers: mpsc::UnboundedReceiver<()>,
    ) -> Self {
        Self {
            class,
            runner,
            lock,
            observer,
            triggers,
        }
    }

    /// Process triggers until every sender is dropped.
    pub async fn run(mut self) {
        (self.observer)(self.class, WatchPhase::Idle);
        while self.triggers.recv().await.is_some() {
            let mut coalesced = 0;
            while self.triggers.try_recv().is_ok() {
                coalesced += 1;
            }
            if coalesced > 0 {
                debug!("watch"; "{}: coalesced {} trigger(s)", self.class, coalesced);
            }

            (self.observer)(self.class, WatchPhase::Triggered);
            self.run_pass().await;
            (self.observer)(self.class, WatchPhase::Idle);
        }
    }

    async fn run_pass(&self) {
        let _guard = self.lock.lock().await;
        let started = Instant::now();

        let class = self.class;
        let runner = Arc::clone(&self.runner);
        let observer = Arc::clone(&self.observer);
        let result = tokio::task::spawn_blocking(move || {
            let on_task = |task: Task| observer(class, WatchPhase::of_task(task));
            let result = runner.run_pass(class, &on_task);
            if let Err(e) = &result {
                runner.report_failure(class, e);
            }
            result
        })
        .await;

        match result {
            Ok(Ok(())) => {
                status_success(&format!("{class} rebuilt in {}ms", started.elapsed().as_millis()));
            }
            Ok(Err(e)) => debug!("watch"; "{class}: {e}"),
            Err(e) => log!("error"; "{class} pass panicked: {e}"),
        }
    }
}
