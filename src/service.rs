//! # Sync Loop
//!
//! [`SchemaService`] owns the synchronization state and a single background
//! worker thread that repeats, until stopped:
//!
//! 1.  **Reinitialize** the registry and freshness from disk if requested.
//! 2.  **Clone** the tracking repository if there is no working copy.
//! 3.  **Fetch** every app's schema, and its client schema when the
//!     `items_game_url` changed.
//! 4.  **Commit** recognized changes and push them.
//! 5.  **Sleep** for the configured interval.
//!
//! Apps are processed sequentially and all fetches finish before the
//! working copy is inspected, so a half-written file is never committed.
//! Cycles never overlap.
//!
//! ## Shared state
//!
//! The caller's thread and the worker share only the fatal flag, the reinit
//! flag (atomics, acquire/release) and the cancellation flag (a mutex paired
//! with a condvar so `stop` can cut the sleep short). Cancellation is
//! observed between cycles only; an in-flight request or git command is
//! never interrupted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::Duration;

use log::{error, info, warn};

use crate::app::EconApp;
use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetch::{fetch_outcome, HttpSchemaSource, SchemaSource};
use crate::freshness::FreshnessTracker;
use crate::generator::{ArtifactGenerator, RustTypeGenerator};
use crate::git::{GitCli, VersionControl};
use crate::processor::ResponseProcessor;
use crate::registry::{Registry, SharedRegistry};
use crate::synchronizer::VcsSynchronizer;

/// Lifecycle of the background worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Stopping,
}

/// External systems the service talks to
#[derive(Clone)]
pub struct Collaborators {
    pub source: Arc<dyn SchemaSource>,
    pub vcs: Arc<dyn VersionControl>,
    pub generator: Arc<dyn ArtifactGenerator>,
}

impl Collaborators {
    /// HTTP fetching, the system `git` binary and the Rust type generator
    pub fn system() -> Result<Self> {
        Ok(Self {
            source: Arc::new(HttpSchemaSource::new()?),
            vcs: Arc::new(GitCli),
            generator: Arc::new(RustTypeGenerator),
        })
    }
}

/// What one cycle did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Whether a working copy was available
    pub cloned: bool,
    /// Apps whose schema was written to the cache
    pub schemas_updated: Vec<u32>,
    /// Apps whose client schema was written to the cache
    pub client_schemas_updated: Vec<u32>,
    /// Whether a commit was pushed
    pub committed: bool,
}

/// Everything the worker needs for one cycle
struct Engine {
    config: Config,
    apps: Vec<EconApp>,
    cache: CacheStore,
    source: Arc<dyn SchemaSource>,
    processor: ResponseProcessor,
    synchronizer: VcsSynchronizer,
    registry: SharedRegistry,
    freshness: Mutex<FreshnessTracker>,
    fatal: AtomicBool,
    needs_reinit: AtomicBool,
    cancelled: Mutex<bool>,
    wake: Condvar,
    state: Mutex<LoopState>,
}

fn poisoned(context: &str) -> Error {
    Error::LockPoisoned {
        context: context.to_string(),
    }
}

impl Engine {
    fn freshness(&self) -> Result<MutexGuard<'_, FreshnessTracker>> {
        self.freshness.lock().map_err(|_| poisoned("freshness"))
    }

    fn set_state(&self, state: LoopState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }

    fn state(&self) -> LoopState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_cancelled(&self) -> bool {
        *self.cancelled.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_cancelled(&self, value: bool) {
        *self.cancelled.lock().unwrap_or_else(|e| e.into_inner()) = value;
        self.wake.notify_all();
    }

    /// Sleep for `interval`, waking early if cancelled.
    fn sleep(&self, interval: Duration) {
        let guard = self.cancelled.lock().unwrap_or_else(|e| e.into_inner());
        let _ = self
            .wake
            .wait_timeout_while(guard, interval, |cancelled| !*cancelled);
    }

    /// Rebuild the registry and freshness from disk and publish them.
    ///
    /// Any failure sets the fatal flag.
    fn reinitialize(&self) -> Result<()> {
        let built = Registry::build(&self.apps)
            .and_then(|registry| Ok((registry, FreshnessTracker::load(&self.apps, &self.cache)?)));
        let (registry, freshness) = match built {
            Ok(built) => built,
            Err(e) => {
                error!("{}", e);
                self.fatal.store(true, Ordering::Release);
                return Err(e);
            }
        };

        *self.freshness()? = freshness;
        self.registry.publish(registry)?;
        self.fatal.store(false, Ordering::Release);
        self.needs_reinit.store(false, Ordering::Release);
        Ok(())
    }

    fn run_cycle(&self) -> Result<CycleReport> {
        let mut report = CycleReport::default();
        let registry = self.registry.load()?;

        report.cloned = self.synchronizer.ensure_cloned();
        if !report.cloned {
            warn!("No working copy, skipping this cycle");
            return Ok(report);
        }
        if let Err(e) = self.ensure_dirs() {
            error!("Couldn't create directories: {}", e);
            return Ok(report);
        }

        for app in registry.apps() {
            self.download(app, &mut report)?;
        }

        report.committed = self.synchronizer.commit_any_changes(&registry);
        Ok(report)
    }

    fn ensure_dirs(&self) -> Result<()> {
        self.cache.ensure_dir()?;
        std::fs::create_dir_all(self.config.artifact_dir())?;
        Ok(())
    }

    /// Fetch and process one app. Only lock poisoning is returned as an
    /// error; everything else is logged.
    fn download(&self, app: &EconApp, report: &mut CycleReport) -> Result<()> {
        let url = match app.schema_url(&self.config.api_key, &self.config.language) {
            Ok(url) => url,
            Err(e) => {
                error!("Bad schema URL for {}: {}", app, e);
                return Ok(());
            }
        };
        let since = self.freshness()?.last_modified_of(app.id);

        let Some(body) = fetch_outcome(self.source.as_ref(), url.as_str(), since, &app.name).into_body()
        else {
            return Ok(());
        };

        let client_schema_url = {
            let mut freshness = self.freshness()?;
            let changed = self.processor.process_primary(app, &body, &mut freshness);
            if freshness.last_modified_of(app.id) != since {
                report.schemas_updated.push(app.id);
            }
            if !changed {
                return Ok(());
            }
            freshness.client_schema_url_of(app.id).map(str::to_string)
        };

        let Some(client_schema_url) = client_schema_url else {
            return Ok(());
        };
        info!("Client schema for {} moved to {}", app.name, client_schema_url);
        if let Some(body) =
            fetch_outcome(self.source.as_ref(), &client_schema_url, None, &app.name).into_body()
        {
            if self.processor.process_secondary(app, &body) {
                report.client_schemas_updated.push(app.id);
            }
        }
        Ok(())
    }
}

/// Sent by the worker when it exits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerExit {
    /// The worker unwound from a panic
    pub panicked: bool,
    /// Always set: the next start rebuilds from disk
    pub needs_reinit: bool,
}

/// Marks the worker finished on every exit path, panics included.
struct CompletionGuard {
    engine: Arc<Engine>,
    done: Sender<WorkerExit>,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        let panicked = std::thread::panicking();
        self.engine.needs_reinit.store(true, Ordering::Release);
        self.engine.set_state(LoopState::Idle);
        if panicked {
            error!("Worker faulted");
        } else {
            info!("Worker finished");
        }
        let _ = self.done.send(WorkerExit {
            panicked,
            needs_reinit: true,
        });
    }
}

struct Worker {
    handle: JoinHandle<()>,
    done: Receiver<WorkerExit>,
}

fn worker_loop(engine: Arc<Engine>, done: Sender<WorkerExit>) {
    let _guard = CompletionGuard {
        engine: Arc::clone(&engine),
        done,
    };
    let interval = engine.config.check_interval();
    info!("Worker running");

    while !engine.is_cancelled() {
        if engine.needs_reinit.load(Ordering::Acquire) {
            info!("Reinitializing apps");
            if engine.reinitialize().is_err() {
                break;
            }
        }
        match engine.run_cycle() {
            Ok(report) => info!(
                "Cycle done: {} schema(s), {} client schema(s) updated, committed: {}",
                report.schemas_updated.len(),
                report.client_schemas_updated.len(),
                report.committed
            ),
            Err(e) => error!("Cycle aborted: {}", e),
        }
        engine.needs_reinit.store(true, Ordering::Release);

        if engine.is_cancelled() {
            break;
        }
        info!("Waiting for next check");
        engine.sleep(interval);
    }
}

/// Schema synchronization service with one background worker
pub struct SchemaService {
    engine: Arc<Engine>,
    worker: Mutex<Option<Worker>>,
}

impl SchemaService {
    /// Create a service using the system collaborators.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_collaborators(config, Collaborators::system()?)
    }

    /// Create a service with explicit collaborators.
    ///
    /// Fails on configuration errors. A corrupt cache does not fail
    /// construction; it leaves the service fatal so `start` refuses to run.
    pub fn with_collaborators(config: Config, collaborators: Collaborators) -> Result<Self> {
        if let Err(e) = config.validate() {
            warn!("{}", e);
            return Err(e);
        }

        let apps = config.tracked_apps();
        let cache = CacheStore::new(config.cache_dir());
        let processor = ResponseProcessor::new(
            cache.clone(),
            config.artifact_dir(),
            Arc::clone(&collaborators.generator),
        );
        let synchronizer = VcsSynchronizer::new(
            Arc::clone(&collaborators.vcs),
            config.repo_dir(),
            config.remote(),
            config.identity(),
        );

        let engine = Arc::new(Engine {
            config,
            apps,
            cache,
            source: collaborators.source,
            processor,
            synchronizer,
            registry: SharedRegistry::default(),
            freshness: Mutex::new(FreshnessTracker::new()),
            fatal: AtomicBool::new(false),
            needs_reinit: AtomicBool::new(false),
            cancelled: Mutex::new(false),
            wake: Condvar::new(),
            state: Mutex::new(LoopState::Idle),
        });
        // Failure is recorded in the fatal flag
        let _ = engine.reinitialize();

        Ok(Self {
            engine,
            worker: Mutex::new(None),
        })
    }

    /// Start the background worker.
    ///
    /// Refuses with [`Error::Fatal`] when initialization failed. Starting a
    /// running service is a no-op.
    pub fn start(&self) -> Result<()> {
        if self.is_fatal() {
            warn!("Worker can not be started");
            return Err(Error::Fatal {
                message: "registry initialization failed; repair the cache and restart".to_string(),
            });
        }

        let mut worker = self.worker.lock().map_err(|_| poisoned("worker"))?;
        if let Some(running) = worker.as_ref() {
            if !running.handle.is_finished() {
                return Ok(());
            }
        }
        if let Some(finished) = worker.take() {
            let _ = finished.handle.join();
        }

        info!("Worker starting");
        if self.needs_reinit() {
            info!("Reinitializing apps");
            self.engine.reinitialize()?;
        }

        self.engine.set_cancelled(false);
        self.engine.set_state(LoopState::Running);
        let engine = Arc::clone(&self.engine);
        let (tx, done) = mpsc::channel();
        let handle = std::thread::Builder::new()
            .name("schema-tracker".to_string())
            .spawn(move || worker_loop(engine, tx));
        match handle {
            Ok(handle) => {
                *worker = Some(Worker { handle, done });
                Ok(())
            }
            Err(e) => {
                self.engine.set_state(LoopState::Idle);
                Err(e.into())
            }
        }
    }

    /// Request cancellation and wait for the worker to exit.
    ///
    /// The worker finishes its current cycle first.
    pub fn stop(&self) -> Result<()> {
        info!("Worker stopping");
        {
            let mut state = self.engine.state.lock().unwrap_or_else(|e| e.into_inner());
            if *state == LoopState::Running {
                *state = LoopState::Stopping;
            }
        }
        self.engine.set_cancelled(true);
        self.wait().map(|_| ())
    }

    /// Block until the worker exits.
    ///
    /// Returns `None` when no worker was started.
    pub fn wait(&self) -> Result<Option<WorkerExit>> {
        let worker = self.worker.lock().map_err(|_| poisoned("worker"))?.take();
        let Some(worker) = worker else {
            return Ok(None);
        };
        let exit = worker.done.recv().unwrap_or(WorkerExit {
            panicked: true,
            needs_reinit: true,
        });
        let _ = worker.handle.join();
        Ok(Some(exit))
    }

    /// Run one cycle on the calling thread.
    ///
    /// Used for one-shot runs; must not be mixed with a running worker.
    pub fn run_cycle(&self) -> Result<CycleReport> {
        if self.is_fatal() {
            return Err(Error::Fatal {
                message: "registry initialization failed".to_string(),
            });
        }
        if self.needs_reinit() {
            self.engine.reinitialize()?;
        }
        let report = self.engine.run_cycle();
        self.engine.needs_reinit.store(true, Ordering::Release);
        report
    }

    /// Bootstrap the tracking repository from the configured template.
    pub fn new_repo(&self) -> Result<()> {
        self.engine
            .synchronizer
            .new_repo(&self.engine.config.template_url)
    }

    pub fn state(&self) -> LoopState {
        self.engine.state()
    }

    pub fn is_fatal(&self) -> bool {
        self.engine.fatal.load(Ordering::Acquire)
    }

    pub fn needs_reinit(&self) -> bool {
        self.engine.needs_reinit.load(Ordering::Acquire)
    }

    /// Current registry snapshot
    pub fn registry(&self) -> Result<Arc<Registry>> {
        self.engine.registry.load()
    }

    /// Copy of the current freshness table
    pub fn freshness(&self) -> Result<FreshnessTracker> {
        Ok(self.engine.freshness()?.clone())
    }

    pub fn config(&self) -> &Config {
        &self.engine.config
    }
}

impl Drop for SchemaService {
    fn drop(&mut self) {
        self.engine.set_cancelled(true);
    }
}
