//! Run orchestration and observable state.
//!
//! A [`Processor`] owns one image backend and at most one *current* run. Each
//! [`submit`](Processor::submit) starts a fresh run on its own thread and
//! the run walks through the stages:
//!
//! ```text
//!            submit                  entries found            all pages done
//!   Idle ──────────────▶ Extracting ───────────────▶ Processing ─────────────▶ Compressing
//!    ▲                       │                           │                         │
//!    │ reset                 │ corrupt / empty           │ decode / encode         │ write ok
//!    │                       ▼                           ▼                         ▼
//!    └──────────────────── Error ◀──────────────────────────────────────────    Done
//! ```
//!
//! `reset` returns to `Idle` from any stage. `Done` and `Error` are terminal
//! until the next `submit` or `reset`.
//!
//! ## Generations
//!
//! Every `submit` and `reset` bumps a generation counter stored under the
//! same lock as the state. A run thread only applies an update while its
//! generation is still current, so a superseded run can never overwrite the
//! state of a newer one. Its next progress report tells the pipeline to stop,
//! and whatever it produced is dropped.
//!
//! ## Observing
//!
//! [`snapshot`](Processor::snapshot) returns the current state,
//! [`wait`](Processor::wait) blocks until the stage is no longer active, and
//! [`subscribe`](Processor::subscribe) yields every state change in order.

use crate::config::AppConfig;
use crate::imaging::{ImageBackend, RustBackend};
use crate::naming::output_archive_name;
use crate::pipeline::{PipelineError, PipelineEvent, PipelineOptions, PipelineOutput, run_pipeline};
use serde::Serialize;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

/// Pipeline stage as seen by observers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    #[default]
    Idle,
    Extracting,
    Processing,
    Compressing,
    Done,
    Error,
}

impl Stage {
    /// A run is in flight.
    pub fn is_active(self) -> bool {
        matches!(self, Stage::Extracting | Stage::Processing | Stage::Compressing)
    }
}

/// Observable state of the processor.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    /// Generation this state belongs to.
    pub generation: u64,
    pub stage: Stage,
    /// 0–100, non-decreasing within a run.
    pub progress: u8,
    pub processed_count: usize,
    pub total_count: usize,
    /// Basename of the page being worked on.
    pub current_file: String,
    /// Output archive filename for the current run.
    pub file_name: String,
    /// Human-readable failure, set only in [`Stage::Error`].
    pub error: Option<String>,
    /// Finished archive, set only in [`Stage::Done`].
    #[serde(skip)]
    pub output: Option<Arc<PipelineOutput>>,
}

impl Snapshot {
    fn apply(&mut self, event: &PipelineEvent) {
        match event {
            PipelineEvent::Extracting { file_name } => {
                self.stage = Stage::Extracting;
                self.file_name = file_name.clone();
            }
            PipelineEvent::Processing { total } => {
                self.stage = Stage::Processing;
                self.total_count = *total;
                self.processed_count = 0;
                self.progress = 0;
            }
            PipelineEvent::EntryStarted { name, .. } => {
                self.current_file = name.clone();
            }
            PipelineEvent::EntryFinished {
                processed,
                progress,
                ..
            } => {
                debug_assert!(*processed >= self.processed_count);
                self.processed_count = *processed;
                self.progress = self.progress.max(*progress);
            }
            PipelineEvent::Compressing { .. } => {
                self.stage = Stage::Compressing;
            }
        }
    }

    fn finish(&mut self, result: Result<PipelineOutput, PipelineError>) {
        match result {
            Ok(output) => {
                self.stage = Stage::Done;
                self.error = None;
                self.output = Some(Arc::new(output));
            }
            Err(err) => {
                self.stage = Stage::Error;
                self.error = Some(err.to_string());
                self.output = None;
            }
        }
    }
}

#[derive(Default)]
struct Inner {
    state: Snapshot,
    subscribers: Vec<Sender<Snapshot>>,
}

#[derive(Default)]
struct Shared {
    inner: Mutex<Inner>,
    changed: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, inner: &mut Inner) {
        let snapshot = inner.state.clone();
        inner
            .subscribers
            .retain(|tx| tx.send(snapshot.clone()).is_ok());
        self.changed.notify_all();
    }

    /// Apply `update` if `generation` is still current. Returns whether the
    /// run that owns `generation` should keep going.
    fn update(&self, generation: u64, update: impl FnOnce(&mut Snapshot)) -> bool {
        let mut inner = self.lock();
        if inner.state.generation != generation {
            return false;
        }
        update(&mut inner.state);
        self.publish(&mut inner);
        true
    }

    /// Replace the state with a fresh one under a new generation.
    fn restart(&self, fill: impl FnOnce(&mut Snapshot)) -> u64 {
        let mut inner = self.lock();
        let generation = inner.state.generation + 1;
        inner.state = Snapshot {
            generation,
            ..Snapshot::default()
        };
        fill(&mut inner.state);
        self.publish(&mut inner);
        generation
    }
}

/// Handle to a submitted run.
#[derive(Debug)]
pub struct RunTicket {
    pub generation: u64,
    handle: JoinHandle<()>,
}

impl RunTicket {
    /// Block until the run's thread exits, whether it finished or was
    /// superseded.
    pub fn join(self) {
        if self.handle.join().is_err() {
            warn!(generation = self.generation, "run thread panicked");
        }
    }
}

/// Stateful front end over [`run_pipeline`].
pub struct Processor<B = RustBackend> {
    backend: Arc<B>,
    shared: Arc<Shared>,
}

impl Processor<RustBackend> {
    pub fn new() -> Self {
        Self::with_backend(RustBackend::new())
    }
}

impl<B: ImageBackend + Send + 'static> Processor<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
            shared: Arc::new(Shared::default()),
        }
    }

    /// Start a new run over `source`, superseding any run in flight.
    ///
    /// `input_name` is the original filename and only determines the output
    /// name. An invalid `config` is rejected here and the state is left
    /// untouched.
    pub fn submit(
        &self,
        source: Vec<u8>,
        input_name: &str,
        config: &AppConfig,
    ) -> Result<RunTicket, PipelineError> {
        config.validate()?;

        let file_name = output_archive_name(input_name);
        let generation = self.shared.restart(|state| {
            state.stage = Stage::Extracting;
            state.file_name = file_name;
        });
        info!(generation, input = input_name, "run submitted");

        let options = PipelineOptions::from_config(config);
        let input_name = input_name.to_string();
        let backend = Arc::clone(&self.backend);
        let shared = Arc::clone(&self.shared);

        let spawned = std::thread::Builder::new()
            .name(format!("comic-shrink-run-{generation}"))
            .spawn(move || {
                let result = run_pipeline(&*backend, &source, &input_name, &options, |event| {
                    shared.update(generation, |state| state.apply(&event))
                });
                if let Err(PipelineError::Cancelled) = result {
                    debug!(generation, "superseded run stopped");
                    return;
                }
                if let Err(err) = &result {
                    warn!(generation, error = %err, "run failed");
                }
                if !shared.update(generation, |state| state.finish(result)) {
                    debug!(generation, "discarding result of superseded run");
                }
            });

        match spawned {
            Ok(handle) => Ok(RunTicket { generation, handle }),
            Err(err) => {
                let message = err.to_string();
                self.shared.update(generation, |state| {
                    state.finish(Err(PipelineError::Io(message.clone())))
                });
                Err(PipelineError::Io(message))
            }
        }
    }

    /// Abandon any run in flight and return to [`Stage::Idle`].
    pub fn reset(&self) {
        let generation = self.shared.restart(|_| {});
        debug!(generation, "processor reset");
    }

    /// Current state.
    pub fn snapshot(&self) -> Snapshot {
        self.shared.lock().state.clone()
    }

    /// Block until no run is active, then return the state.
    pub fn wait(&self) -> Snapshot {
        let mut inner = self.shared.lock();
        while inner.state.stage.is_active() {
            inner = self
                .shared
                .changed
                .wait(inner)
                .unwrap_or_else(PoisonError::into_inner);
        }
        inner.state.clone()
    }

    /// Receive every state change from now on, in order.
    pub fn subscribe(&self) -> Receiver<Snapshot> {
        let (tx, rx) = channel();
        self.shared.lock().subscribers.push(tx);
        rx
    }
}
