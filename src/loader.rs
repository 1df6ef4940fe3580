//! Background decoding.
//!
//! A [`LoaderPool`] owns a fixed set of worker threads fed through a shared
//! job queue. Each [`LoadJob`] decodes outside the gate, then enters its
//! source's gate once to publish the result. Submitting never blocks.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use web_time::Instant;

use crate::constants::LOADER_THREAD_NAME;
use crate::decode::Decoder;
use crate::error::LoaderError;
use crate::gate::Gate;
use crate::image_file::{AlphaMode, ImageFile};
use crate::probe::FileStamp;
use crate::state::{PublishOutcome, Staging};

/// Snapshot of what a source wanted loaded at the moment of the request.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub path: String,
    pub persistent: bool,
    pub alpha_mode: AlphaMode,
    /// Modification time observed when the request was made
    pub timestamp: FileStamp,
    /// Freshness marker; only the newest generation may publish
    pub generation: u64,
}

impl LoadRequest {
    pub fn linear_alpha(&self) -> bool {
        self.alpha_mode == AlphaMode::PremultiplySrgb
    }
}

/// One unit of background work: decode a request and publish it.
pub struct LoadJob {
    request: LoadRequest,
    decoder: Arc<dyn Decoder>,
    target: Arc<Gate<Staging>>,
}

impl LoadJob {
    pub fn new(request: LoadRequest, decoder: Arc<dyn Decoder>, target: Arc<Gate<Staging>>) -> Self {
        Self {
            request,
            decoder,
            target,
        }
    }

    pub fn request(&self) -> &LoadRequest {
        &self.request
    }

    /// Decode, then publish under the gate.
    pub fn run(self) -> PublishOutcome {
        let LoadJob {
            request,
            decoder,
            target,
        } = self;

        log::debug!("Loading texture {:?}", request.path);
        let started = Instant::now();
        let image = decode_guarded(decoder.as_ref(), &request);
        let elapsed_ms = started.elapsed().as_millis();

        let loaded = image.loaded();
        let outcome = target.with(|staging| staging.publish(&request, image));

        if outcome != PublishOutcome::Stale {
            if loaded {
                log::debug!("Loaded texture {:?} ({} ms)", request.path, elapsed_ms);
            } else {
                log::warn!("Failed to load texture {:?}", request.path);
            }
        }
        outcome
    }
}

/// Run the decoder, turning a panic into a failed decode.
fn decode_guarded(decoder: &dyn Decoder, request: &LoadRequest) -> ImageFile {
    let path = Path::new(&request.path);
    panic::catch_unwind(AssertUnwindSafe(|| decoder.decode(path, request.alpha_mode)))
        .unwrap_or_else(|_| {
            log::error!("Decoder panicked on {:?}", request.path);
            ImageFile::failed(path)
        })
}

/// Message sent to the worker threads.
enum WorkerMessage {
    /// Decode and publish
    Load(LoadJob),
    /// Exit the worker loop
    Shutdown,
}

/// Fixed-size pool of decode workers.
pub struct LoaderPool {
    job_tx: Sender<WorkerMessage>,
    workers: Vec<JoinHandle<()>>,
}

impl LoaderPool {
    /// Spawn `worker_count` workers (at least one).
    pub fn spawn(worker_count: usize) -> Result<Self, LoaderError> {
        let (job_tx, job_rx) = crossbeam_channel::unbounded::<WorkerMessage>();
        let mut pool = Self {
            job_tx,
            workers: Vec::with_capacity(worker_count.max(1)),
        };

        for index in 0..worker_count.max(1) {
            let job_rx = job_rx.clone();
            let handle = thread::Builder::new()
                .name(format!("{LOADER_THREAD_NAME}-{index}"))
                .spawn(move || {
                    log::info!("Loader worker {} started", index);
                    Self::worker_loop(job_rx);
                    log::info!("Loader worker {} exiting", index);
                })
                .map_err(LoaderError::Spawn)?;
            pool.workers.push(handle);
        }

        log::info!("Loader pool spawned with {} workers", pool.workers.len());
        Ok(pool)
    }

    fn worker_loop(job_rx: Receiver<WorkerMessage>) {
        loop {
            match job_rx.recv() {
                Ok(WorkerMessage::Load(job)) => {
                    let outcome = job.run();
                    log::trace!("Load job finished: {:?}", outcome);
                }
                Ok(WorkerMessage::Shutdown) => {
                    log::debug!("Received shutdown signal");
                    break;
                }
                Err(_) => {
                    log::debug!("Job channel closed, loader worker exiting");
                    break;
                }
            }
        }
    }

    /// Queue a job. Returns immediately.
    pub fn submit(&self, job: LoadJob) -> Result<(), LoaderError> {
        self.job_tx
            .send(WorkerMessage::Load(job))
            .map_err(|_| LoaderError::Closed)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Jobs queued and not yet picked up by a worker.
    pub fn queued(&self) -> usize {
        self.job_tx.len()
    }
}

impl Drop for LoaderPool {
    fn drop(&mut self) {
        log::debug!("Shutting down loader pool");

        // Queued jobs ahead of the shutdown messages still run
        for _ in &self.workers {
            let _ = self.job_tx.send(WorkerMessage::Shutdown);
        }

        for handle in self.workers.drain(..) {
            if let Err(e) = handle.join() {
                log::warn!("Loader worker panicked: {:?}", e);
            }
        }
    }
}

impl std::fmt::Debug for LoaderPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderPool")
            .field("workers", &self.workers.len())
            .field("queued", &self.job_tx.len())
            .finish()
    }
}
