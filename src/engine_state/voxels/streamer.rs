//! # Chunk Streamer
//!
//! Asynchronous chunk generation. The simulation thread files requests; a
//! dedicated dispatcher thread owns the [`TaskManager`] and feeds the worker
//! pool; workers generate terrain; the dispatcher inserts finished chunks into
//! the shared [`ChunkStore`].
//!
//! ## Request lifecycle
//!
//! ```text
//! Unrequested -> Queued -> Generating -> Resident
//!      ^                        |            |
//!      +------ failure ---------+            |
//!      +------------- eviction --------------+
//! ```
//!
//! A coordinate that is queued or generating is never requested twice. A
//! generation failure (including a panicking worker) is logged and the
//! coordinate returns to `Unrequested`. Eviction is the store's business; an
//! evicted coordinate simply reads as `Unrequested` again.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use cgmath::Point3;
use crossbeam_channel::{select, unbounded, Receiver, Sender};

use crate::core::MtResource;
use crate::engine_state::task_management::{
    task::{Task, TaskResult},
    TaskManager,
};
use crate::engine_state::voxels::chunk_store::ChunkStore;
use crate::engine_state::voxels::generation::TerrainGenerator;
use crate::engine_state::voxels::tasks::chunk_generation_task::{
    ChunkGenerationTask, PendingRequests,
};

/// How long the dispatcher waits for work before rechecking the shutdown flag.
pub const REQUEST_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Where a chunk coordinate is in its load lifecycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChunkLoadState {
    /// Not resident and not requested.
    Unrequested,
    /// Requested and waiting for a worker.
    Queued,
    /// A worker is generating it.
    Generating,
    /// In the chunk store.
    Resident,
}

/// Default worker count: one less than the available parallelism, at least one.
pub fn default_worker_count() -> usize {
    thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1))
        .unwrap_or(1)
        .max(1)
}

/// Background chunk generation for one chunk store.
pub struct ChunkStreamer {
    store: MtResource<ChunkStore>,
    generator: Arc<TerrainGenerator>,
    pending: PendingRequests,
    requests: Option<Sender<Box<dyn Task + Send>>>,
    shutdown: Arc<AtomicBool>,
    dispatcher: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for ChunkStreamer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkStreamer")
            .field("pending", &self.pending_count())
            .field("running", &self.is_running())
            .finish()
    }
}

impl ChunkStreamer {
    /// Starts the dispatcher thread and a pool of `workers` generation threads.
    ///
    /// `shutdown_grace` bounds how long [`ChunkStreamer::shutdown`] waits for
    /// in-flight generation. If the dispatcher cannot be spawned, requests are
    /// generated synchronously on the caller's thread instead.
    pub fn new(
        store: MtResource<ChunkStore>,
        generator: Arc<TerrainGenerator>,
        workers: usize,
        shutdown_grace: Duration,
    ) -> Self {
        let (sender, receiver) = unbounded::<Box<dyn Task + Send>>();
        let shutdown = Arc::new(AtomicBool::new(false));
        let pending: PendingRequests = MtResource::new(HashMap::new());

        let flag = shutdown.clone();
        let spawned = thread::Builder::new()
            .name("chunk-dispatcher".to_string())
            .spawn(move || dispatch(receiver, flag, workers, shutdown_grace));

        let (requests, dispatcher) = match spawned {
            Ok(handle) => (Some(sender), Some(handle)),
            Err(error) => {
                log::error!(
                    "Failed to spawn chunk dispatcher, generating synchronously: {}",
                    error
                );
                (None, None)
            }
        };

        ChunkStreamer {
            store,
            generator,
            pending,
            requests,
            shutdown,
            dispatcher,
        }
    }

    /// Whether the dispatcher is accepting requests.
    pub fn is_running(&self) -> bool {
        self.requests.is_some() && !self.shutdown.load(Ordering::Acquire)
    }

    /// Requests generation of the chunk at `coordinate`.
    ///
    /// Residency is not checked here. The caller filters resident chunks
    /// first, and a late duplicate is dropped at insertion.
    ///
    /// # Arguments
    /// * `coordinate` - Chunk coordinate to generate
    ///
    /// # Returns
    /// `true` if a new request was filed. `false` if the coordinate was
    /// already queued or generating, or if the streamer is shut down.
    ///
    /// # Performance
    /// Only takes the request table lock. If the dispatcher thread could not
    /// be spawned, the chunk is generated inline before this returns.
    pub fn request(&self, coordinate: Point3<i32>) -> bool {
        if self.shutdown.load(Ordering::Acquire) {
            return false;
        }

        let newly_queued = self.pending.with_mut(|pending| {
            if pending.contains_key(&coordinate) {
                false
            } else {
                pending.insert(coordinate, ChunkLoadState::Queued);
                true
            }
        });
        if !newly_queued {
            return false;
        }

        let task = ChunkGenerationTask::new(
            self.generator.clone(),
            self.store.clone(),
            self.pending.clone(),
            coordinate,
        );

        match &self.requests {
            Some(sender) => {
                if sender.send(Box::new(task)).is_err() {
                    log::warn!("Chunk dispatcher is gone, dropping request {:?}", coordinate);
                    self.pending.with_mut(|pending| pending.remove(&coordinate));
                    return false;
                }
            }
            None => {
                let result = task.process();
                drop(result.handle_result());
            }
        }
        true
    }

    /// Current lifecycle state of a coordinate.
    pub fn state_of(&self, coordinate: Point3<i32>) -> ChunkLoadState {
        if self.store.get().contains_chunk(coordinate) {
            return ChunkLoadState::Resident;
        }
        self.pending
            .get()
            .get(&coordinate)
            .copied()
            .unwrap_or(ChunkLoadState::Unrequested)
    }

    /// Number of requests that are queued or generating.
    pub fn pending_count(&self) -> usize {
        self.pending.get().len()
    }

    /// `true` when no request is outstanding.
    pub fn is_idle(&self) -> bool {
        self.pending_count() == 0
    }

    /// Blocks until every outstanding request has finished or `timeout`
    /// elapses. Returns whether the streamer went idle.
    pub fn wait_until_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.is_idle() {
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(2));
        }
        true
    }

    /// Stops accepting requests and shuts the worker pool down.
    ///
    /// Returns after the dispatcher has exited, which is at most the grace
    /// period plus one poll interval. Calling it again is a no-op.
    pub fn shutdown(&mut self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        self.requests = None;
        if let Some(dispatcher) = self.dispatcher.take() {
            if dispatcher.join().is_err() {
                log::error!("Chunk dispatcher panicked");
            }
        }
        self.pending.with_mut(|pending| pending.clear());
    }
}

impl Drop for ChunkStreamer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn dispatch(
    requests: Receiver<Box<dyn Task + Send>>,
    shutdown: Arc<AtomicBool>,
    workers: usize,
    shutdown_grace: Duration,
) {
    let mut manager = TaskManager::new(workers);
    let results = manager.results().clone();

    while !shutdown.load(Ordering::Acquire) {
        select! {
            recv(requests) -> task => match task {
                Ok(task) => {
                    manager.publish_task(task);
                }
                Err(_) => break,
            },
            recv(results) -> completion => {
                if let Ok(completion) = completion {
                    manager.complete(completion);
                }
            },
            default(REQUEST_POLL_INTERVAL) => {}
        }
        manager.process_queued_tasks();
    }

    let abandoned = requests.try_iter().count() + manager.queued();
    if abandoned > 0 {
        log::debug!("Abandoning {} chunk requests at shutdown", abandoned);
    }
    drop(results);
    if manager.shutdown(shutdown_grace) {
        log::info!("Chunk workers stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn streamer(workers: usize) -> (MtResource<ChunkStore>, ChunkStreamer) {
        let store = MtResource::new(ChunkStore::new());
        let streamer = ChunkStreamer::new(
            store.clone(),
            Arc::new(TerrainGenerator::new(42)),
            workers,
            Duration::from_secs(2),
        );
        (store, streamer)
    }

    #[test]
    fn requested_chunks_become_resident() {
        let (store, mut streamer) = streamer(2);
        for x in -1..=1 {
            assert!(streamer.request(Point3::new(x, 0, 0)));
        }
        assert!(streamer.wait_until_idle(Duration::from_secs(10)));
        assert_eq!(store.get().len(), 3);
        assert_eq!(streamer.state_of(Point3::new(1, 0, 0)), ChunkLoadState::Resident);
        assert_eq!(streamer.state_of(Point3::new(5, 0, 0)), ChunkLoadState::Unrequested);
        streamer.shutdown();
    }

    #[test]
    fn duplicate_requests_are_ignored() {
        let (store, mut streamer) = streamer(1);
        let coordinate = Point3::new(0, 1, 0);
        let first = streamer.request(coordinate);
        let second = streamer.request(coordinate);
        assert!(first);
        // The second request only succeeds if the first already finished.
        assert!(!second || store.get().contains_chunk(coordinate));
        assert!(streamer.wait_until_idle(Duration::from_secs(10)));
        assert_eq!(store.get().len(), 1);
        streamer.shutdown();
    }

    #[test]
    fn failed_generation_returns_to_unrequested() {
        let (store, mut streamer) = streamer(1);
        let overflowing = Point3::new(i32::MAX, 0, 0);
        assert!(streamer.request(overflowing));
        assert!(streamer.wait_until_idle(Duration::from_secs(10)));
        assert_eq!(streamer.state_of(overflowing), ChunkLoadState::Unrequested);
        assert!(store.get().is_empty());
        streamer.shutdown();
    }

    #[test]
    fn shutdown_is_bounded_and_rejects_requests() {
        let (_store, mut streamer) = streamer(1);
        for z in 0..50 {
            streamer.request(Point3::new(0, 0, z));
        }
        let started = Instant::now();
        streamer.shutdown();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(!streamer.request(Point3::new(9, 9, 9)));
        assert!(streamer.is_idle());
    }

    #[test]
    fn default_worker_count_is_positive() {
        assert!(default_worker_count() >= 1);
    }
}
