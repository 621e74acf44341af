//! Watch orchestrator.
//!
//! ```text
//! notify ──(thread)──► event loop ──► Router ──► Debouncer ──► Worker per class
//!                                                               │ build lock
//!                                                               ▼
//!                                                        Pipeline::for_class
//! ```
//!
//! Runs on its own tokio runtime until Ctrl+C.

mod debouncer;
mod roots;
mod router;
mod worker;

#[cfg(test)]
mod tests;

pub use worker::{BuildLock, PassRunner, PhaseObserver, PipelineRunner, WatchPhase, Worker};

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use notify::RecommendedWatcher;
use rustc_hash::FxHashMap;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::SiteConfig;
use crate::core::AssetClass;
use crate::reload::Reloader;
use crate::{debug, log};
use debouncer::Debouncer;
use roots::WatchRoots;
use router::Router;

/// How often missing watch roots are looked for again.
const ROOT_CHECK_INTERVAL: Duration = Duration::from_secs(2);

/// Watch sources and run class passes until `shutdown` fires.
pub fn run(
    config: Arc<SiteConfig>,
    reloader: Reloader,
    shutdown: crossbeam::channel::Receiver<()>,
) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("watch")
        .enable_all()
        .build()
        .context("Failed to create watch runtime")?;

    let runner = Arc::new(PipelineRunner::new(Arc::clone(&config), reloader));
    let observer: PhaseObserver = Arc::new(|class: AssetClass, phase: WatchPhase| {
        debug!("watch"; "{class}: {phase}");
    });
    runtime.block_on(watch(&config, runner, observer, shutdown))
}

/// One worker per watched class, sharing a build lock.
pub fn spawn_workers<R: PassRunner>(
    runner: &Arc<R>,
    observer: &PhaseObserver,
) -> (FxHashMap<AssetClass, mpsc::UnboundedSender<()>>, Vec<JoinHandle<()>>) {
    let lock: BuildLock = Arc::default();
    let mut senders = FxHashMap::default();
    let mut handles = Vec::new();

    for class in AssetClass::WATCHED {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = Worker::new(
            class,
            Arc::clone(runner),
            Arc::clone(&lock),
            Arc::clone(observer),
            rx,
        );
        senders.insert(class, tx);
        handles.push(tokio::spawn(worker.run()));
    }
    (senders, handles)
}

async fn watch<R: PassRunner>(
    config: &SiteConfig,
    runner: Arc<R>,
    observer: PhaseObserver,
    shutdown: crossbeam::channel::Receiver<()>,
) -> Result<()> {
    let router = Router::from_config(config)?;

    // notify delivers on its own thread; forward into the runtime
    let (event_tx, mut event_rx) = mpsc::channel::<notify::Event>(256);
    let mut watcher: RecommendedWatcher = notify::recommended_watcher(
        move |result: notify::Result<notify::Event>| match result {
            Ok(event) => {
                let _ = event_tx.blocking_send(event);
            }
            Err(e) => log!("watch"; "notify error: {}", e),
        },
    )
    .context("Failed to create file watcher")?;

    let mut roots = WatchRoots::new(router.roots());
    roots
        .attach_existing(&mut watcher)
        .context("Failed to watch source directories")?;
    log!("watch"; "watching {} source root(s)", roots.attached_count());

    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
    std::thread::spawn(move || {
        let _ = shutdown.recv();
        let _ = stop_tx.send(());
    });

    let (senders, handles) = spawn_workers(&runner, &observer);
    let mut debouncer = Debouncer::new(config.watch.delay());
    let mut maintain = tokio::time::interval(ROOT_CHECK_INTERVAL);

    loop {
        tokio::select! {
            biased;
            _ = &mut stop_rx => break,
            event = event_rx.recv() => {
                let Some(event) = event else { break };
                for class in router.route(&event) {
                    debouncer.add(class);
                }
            }
            _ = tokio::time::sleep(debouncer.sleep_duration()) => {
                for class in debouncer.take_ready() {
                    if let Some(tx) = senders.get(&class) {
                        let _ = tx.send(());
                    }
                }
            }
            _ = maintain.tick() => roots.maintain(&mut watcher),
        }
    }

    debug!("watch"; "stopping");
    drop(senders);
    for handle in handles {
        let _ = handle.await;
    }
    Ok(())
}
