use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tempfile::TempDir;
use tokio::sync::mpsc;

use super::router::Router;
use super::*;
use crate::pipeline::{Context as PipelineContext, Pipeline, PipelineError, Task};

const WAIT: Duration = Duration::from_secs(20);

// ============================================================================
// Fixtures
// ============================================================================

/// Records passes; can be slowed down and made to fail.
#[derive(Default)]
struct FakeRunner {
    passes: Mutex<Vec<AssetClass>>,
    failures: AtomicUsize,
    /// Fail this many passes before succeeding.
    fail_first: AtomicUsize,
    delay: Duration,
    running: AtomicUsize,
    max_running: AtomicUsize,
}

impl FakeRunner {
    fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    fn passes(&self) -> Vec<AssetClass> {
        self.passes.lock().clone()
    }
}

impl PassRunner for FakeRunner {
    fn run_pass(&self, class: AssetClass, on_task: &(dyn Fn(Task) + Sync)) -> Result<(), PipelineError> {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(now, Ordering::SeqCst);

        let pipeline = Pipeline::for_class(class).unwrap();
        for task in pipeline.tasks() {
            on_task(task);
        }
        std::thread::sleep(self.delay);
        self.passes.lock().push(class);
        self.running.fetch_sub(1, Ordering::SeqCst);

        let fail = self
            .fail_first
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail {
            return Err(PipelineError {
                task: pipeline.tasks().nth(1).unwrap(),
                source: anyhow::anyhow!("broken source"),
            });
        }
        Ok(())
    }

    fn report_failure(&self, _class: AssetClass, _error: &PipelineError) {
        self.failures.fetch_add(1, Ordering::SeqCst);
    }
}

/// Observer that forwards every transition into a channel.
fn recording_observer() -> (PhaseObserver, mpsc::UnboundedReceiver<(AssetClass, WatchPhase)>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let observer: PhaseObserver = Arc::new(move |class: AssetClass, phase: WatchPhase| {
        let _ = tx.send((class, phase));
    });
    (observer, rx)
}

/// Wait until `class` has returned to idle `count` times after its start.
async fn wait_idle(
    rx: &mut mpsc::UnboundedReceiver<(AssetClass, WatchPhase)>,
    class: AssetClass,
    count: usize,
) -> Vec<WatchPhase> {
    let mut phases = Vec::new();
    let mut idle = 0;
    tokio::time::timeout(WAIT, async {
        while let Some((c, phase)) = rx.recv().await {
            if c != class {
                continue;
            }
            phases.push(phase);
            // the first idle is the worker starting up
            if phase == WatchPhase::Idle {
                idle += 1;
                if idle == count + 1 {
                    break;
                }
            }
        }
    })
    .await
    .expect("worker did not settle");
    phases
}

fn site() -> (TempDir, SiteConfig) {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    for sub in ["src/assets/pug", "src/assets/styles", "src/assets/scripts", "src/assets/images"] {
        fs::create_dir_all(root.join(sub)).unwrap();
    }
    fs::write(root.join("src/assets/pug/index.pug"), "h1 Hello\n").unwrap();
    fs::write(root.join("src/assets/styles/style.scss"), "body{color:red}").unwrap();
    fs::write(root.join("src/assets/scripts/index.js"), "console.log(1);\n").unwrap();
    fs::write(
        root.join("src/assets/images/dot.svg"),
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="2" height="2"><rect width="2" height="2"/></svg>"#,
    )
    .unwrap();
    let config = SiteConfig::with_root(root);
    (dir, config)
}

fn snapshot(dir: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut files: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .filter_map(Result::ok)
        .map(|e| (e.path(), fs::read(e.path()).unwrap()))
        .collect();
    files.sort();
    files
}

fn event(kind: notify::EventKind, path: PathBuf) -> notify::Event {
    notify::Event {
        kind,
        paths: vec![path],
        attrs: Default::default(),
    }
}

fn modify_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Data(notify::event::DataChange::Any))
}

// ============================================================================
// Worker
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_phase_sequence() {
    let runner = Arc::new(FakeRunner::default());
    let (observer, mut rx) = recording_observer();
    let (senders, _handles) = spawn_workers(&runner, &observer);

    senders[&AssetClass::Styles].send(()).unwrap();
    let phases = wait_idle(&mut rx, AssetClass::Styles, 1).await;

    assert_eq!(
        phases,
        vec![
            WatchPhase::Idle,
            WatchPhase::Triggered,
            WatchPhase::Cleaning,
            WatchPhase::Rebuilding,
            WatchPhase::Injecting,
            WatchPhase::Reloading,
            WatchPhase::Idle,
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_triggers_during_pass_coalesce_into_one_rerun() {
    let runner = Arc::new(FakeRunner::slow(Duration::from_millis(300)));
    let (observer, mut rx) = recording_observer();
    let (senders, _handles) = spawn_workers(&runner, &observer);
    let scripts = &senders[&AssetClass::Scripts];

    scripts.send(()).unwrap();
    // wait until the first pass is running
    tokio::time::timeout(WAIT, async {
        while let Some((class, phase)) = rx.recv().await {
            if class == AssetClass::Scripts && phase == WatchPhase::Cleaning {
                break;
            }
        }
    })
    .await
    .unwrap();

    for _ in 0..3 {
        scripts.send(()).unwrap();
    }
    wait_idle(&mut rx, AssetClass::Scripts, 2).await;

    // give a wrongly scheduled third pass the chance to show up
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(runner.passes(), vec![AssetClass::Scripts, AssetClass::Scripts]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failed_pass_recovers() {
    let runner = Arc::new(FakeRunner::default());
    runner.fail_first.store(1, Ordering::SeqCst);
    let (observer, mut rx) = recording_observer();
    let (senders, _handles) = spawn_workers(&runner, &observer);

    senders[&AssetClass::Templates].send(()).unwrap();
    let phases = wait_idle(&mut rx, AssetClass::Templates, 1).await;
    assert_eq!(phases.last(), Some(&WatchPhase::Idle));
    assert_eq!(runner.failures.load(Ordering::SeqCst), 1);

    senders[&AssetClass::Templates].send(()).unwrap();
    tokio::time::timeout(WAIT, async {
        while let Some((class, phase)) = rx.recv().await {
            if class == AssetClass::Templates && phase == WatchPhase::Idle {
                break;
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(runner.passes().len(), 2);
    assert_eq!(runner.failures.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_classes_never_build_concurrently() {
    let runner = Arc::new(FakeRunner::slow(Duration::from_millis(100)));
    let (observer, mut rx) = recording_observer();
    let (senders, _handles) = spawn_workers(&runner, &observer);

    for class in AssetClass::WATCHED {
        senders[&class].send(()).unwrap();
    }

    let mut settled = 0;
    tokio::time::timeout(WAIT, async {
        while let Some((_, phase)) = rx.recv().await {
            if phase == WatchPhase::Idle {
                settled += 1;
                // four start-up idles plus one per pass
                if settled == 8 {
                    break;
                }
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(runner.passes().len(), 4);
    assert_eq!(runner.max_running.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_workers_stop_when_senders_drop() {
    let runner = Arc::new(FakeRunner::default());
    let (observer, _rx) = recording_observer();
    let (senders, handles) = spawn_workers(&runner, &observer);
    drop(senders);
    for handle in handles {
        tokio::time::timeout(WAIT, handle).await.unwrap().unwrap();
    }
    assert!(runner.passes().is_empty());
}

// ============================================================================
// Router
// ============================================================================

#[test]
fn test_router_maps_paths_to_classes() {
    let (dir, config) = site();
    let router = Router::from_config(&config).unwrap();
    let root = dir.path();

    let cases = [
        ("src/assets/styles/partials/_vars.scss", vec![AssetClass::Styles]),
        ("src/assets/scripts/lib/util.js", vec![AssetClass::Scripts]),
        ("src/assets/pug/_layout.pug", vec![AssetClass::Templates]),
        ("src/assets/images/photos/a.jpg", vec![AssetClass::Images]),
        ("src/assets/styles/readme.md", vec![]),
        ("src/assets/scripts/.index.js.swp", vec![]),
        ("src/assets/scripts/index.js~", vec![]),
    ];
    for (path, expected) in cases {
        assert_eq!(
            router.route(&event(modify_kind(), root.join(path))),
            expected,
            "{path}"
        );
    }
}

#[test]
fn test_router_ignores_noise() {
    let (dir, config) = site();
    let router = Router::from_config(&config).unwrap();
    let path = dir.path().join("src/assets/styles/style.scss");

    let metadata = notify::EventKind::Modify(notify::event::ModifyKind::Metadata(
        notify::event::MetadataKind::WriteTime,
    ));
    assert!(router.route(&event(metadata, path.clone())).is_empty());

    let access = notify::EventKind::Access(notify::event::AccessKind::Read);
    assert!(router.route(&event(access, path.clone())).is_empty());

    let created = notify::EventKind::Create(notify::event::CreateKind::File);
    assert_eq!(router.route(&event(created, path)), vec![AssetClass::Styles]);

    // outputs never retrigger a pass
    let output = config.serve_root().join("assets/styles/bundle-style-00000000.css");
    assert!(router.route(&event(modify_kind(), output)).is_empty());
}

#[test]
fn test_router_roots() {
    let (dir, config) = site();
    let router = Router::from_config(&config).unwrap();
    let root = dir.path();
    assert_eq!(
        router.roots(),
        vec![
            root.join("src/assets/images"),
            root.join("src/assets/pug"),
            root.join("src/assets/scripts"),
            root.join("src/assets/styles"),
        ]
    );
}

// ============================================================================
// End to end (real pipelines, triggers sent directly)
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_script_edit_rebuilds_only_scripts() {
    let (dir, config) = site();
    let config = Arc::new(config);
    let reloader = Reloader::detached();

    Pipeline::full_build()
        .run(PipelineContext::new(&config, Some(&reloader)))
        .unwrap();
    let styles = snapshot(&config.output_dir(AssetClass::Styles));
    let images = snapshot(&config.output_dir(AssetClass::Images));
    let old_script = snapshot(&config.output_dir(AssetClass::Scripts))[0].0.clone();

    let runner = Arc::new(PipelineRunner::new(Arc::clone(&config), reloader.clone()));
    let (observer, mut rx) = recording_observer();
    let (senders, _handles) = spawn_workers(&runner, &observer);

    fs::write(dir.path().join("src/assets/scripts/index.js"), "console.log(2);\n").unwrap();
    senders[&AssetClass::Scripts].send(()).unwrap();
    wait_idle(&mut rx, AssetClass::Scripts, 1).await;

    let scripts = snapshot(&config.output_dir(AssetClass::Scripts));
    assert_eq!(scripts.len(), 1);
    assert!(!old_script.exists());
    let new_name = scripts[0].0.file_name().unwrap().to_string_lossy().into_owned();

    let html = fs::read_to_string(config.serve_root().join("index.html")).unwrap();
    assert!(html.contains(&new_name));
    assert_eq!(reloader.reload_count(), 1);

    assert_eq!(snapshot(&config.output_dir(AssetClass::Styles)), styles);
    assert_eq!(snapshot(&config.output_dir(AssetClass::Images)), images);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_broken_style_reports_error_then_recovers() {
    let (dir, config) = site();
    let config = Arc::new(config);
    let reloader = Reloader::detached();
    Pipeline::full_build()
        .run(PipelineContext::new(&config, None))
        .unwrap();

    let runner = Arc::new(PipelineRunner::new(Arc::clone(&config), reloader.clone()));
    let (observer, mut rx) = recording_observer();
    let (senders, _handles) = spawn_workers(&runner, &observer);
    let styles = &senders[&AssetClass::Styles];
    let scss = dir.path().join("src/assets/styles/style.scss");

    fs::write(&scss, "body { color: ").unwrap();
    styles.send(()).unwrap();
    wait_idle(&mut rx, AssetClass::Styles, 1).await;
    assert!(reloader.has_error());
    assert_eq!(reloader.reload_count(), 0);

    fs::write(&scss, "body{color:green}").unwrap();
    styles.send(()).unwrap();
    tokio::time::timeout(WAIT, async {
        while let Some((class, phase)) = rx.recv().await {
            if class == AssetClass::Styles && phase == WatchPhase::Idle {
                break;
            }
        }
    })
    .await
    .unwrap();

    assert!(!reloader.has_error());
    assert_eq!(reloader.reload_count(), 1);
    let html = fs::read_to_string(config.serve_root().join("index.html")).unwrap();
    assert!(html.contains("/assets/styles/bundle-style-"));
}

// ============================================================================
// Event loop
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_edits_within_window_run_one_scripts_pass() {
    let (dir, mut config) = site();
    config.watch.delay_ms = 300;
    let runner = Arc::new(FakeRunner::default());
    let (observer, mut rx) = recording_observer();
    let (shutdown_tx, shutdown_rx) = crossbeam::channel::unbounded();

    let loop_runner = Arc::clone(&runner);
    let handle = tokio::spawn(async move {
        watch(&config, loop_runner, observer, shutdown_rx).await
    });

    // workers start after the source roots are attached
    tokio::time::timeout(WAIT, async {
        while let Some((class, phase)) = rx.recv().await {
            if class == AssetClass::Scripts && phase == WatchPhase::Idle {
                break;
            }
        }
    })
    .await
    .unwrap();

    let script = dir.path().join("src/assets/scripts/index.js");
    fs::write(&script, "console.log(2);\n").unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    fs::write(&script, "console.log(3);\n").unwrap();

    // startup idle was already consumed above
    wait_idle(&mut rx, AssetClass::Scripts, 0).await;
    // a second window would have closed by now
    tokio::time::sleep(Duration::from_millis(900)).await;
    assert_eq!(runner.passes(), vec![AssetClass::Scripts]);

    shutdown_tx.send(()).unwrap();
    tokio::time::timeout(WAIT, handle)
        .await
        .expect("event loop did not stop")
        .unwrap()
        .unwrap();
}
