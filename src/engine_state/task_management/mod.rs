//! # Task Management System
//!
//! This module runs background work on a fixed pool of worker threads.
//!
//! ## Architecture Overview
//!
//! - `TaskManager`: Distributes tasks to workers and collects their results
//! - `Task`: A unit of work executed on a worker thread
//! - `TaskResult`: The result of a completed task, which can spawn additional tasks
//! - `TaskChannel`: The sending half of one worker's task queue
//!
//! Every worker owns a dedicated task channel and shares a single result
//! channel with the other workers. The manager itself is driven by one owning
//! thread (the chunk streamer's dispatcher) which publishes tasks, waits on
//! [`TaskManager::results`] and feeds completions back through
//! [`TaskManager::complete`].
//!
//! ## Task Lifecycle
//! 1. Tasks are published via `TaskManager::publish_task()`
//! 2. The manager hands them to idle workers round-robin, or queues them
//! 3. Workers process tasks and send back a `Completion`
//! 4. The owning thread handles completions, which may spawn new tasks
//! 5. Queued tasks move to workers as they become idle
//!
//! ## Panics
//!
//! A panic inside `Task::process` is caught on the worker. The task is asked
//! for a recovery result, so the owning thread always hears back and the
//! worker stays alive for the next task.
//!
//! ## Shutdown
//!
//! [`TaskManager::shutdown`] closes every task channel and gives the workers
//! a grace period to finish what they are running. Workers still busy after
//! the grace period are detached.

pub mod task;

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use log::info;
use task::{Task, TaskResult};

/// Maximum number of tasks that can be in flight per worker channel.
///
/// Set to 1 so that an idle worker is always the one that receives the next
/// task, which keeps the nearest-first request order intact.
pub const MAX_TASKS_IN_FLIGHT: usize = 1;

/// How often shutdown checks whether workers have finished.
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A finished task, tagged with the worker that ran it.
pub struct Completion {
    worker: usize,
    result: Box<dyn TaskResult + Send>,
}

/// The sending half of one worker's task queue.
#[derive(Debug)]
pub struct TaskChannel {
    task_sender: Sender<Box<dyn Task + Send>>,
    num_tasks_in_flight: usize,
    worker: JoinHandle<()>,
}

/// Manages a pool of worker threads and coordinates task execution.
///
/// The `TaskManager` is responsible for:
/// - Creating the worker threads
/// - Distributing tasks across idle workers
/// - Handling results and scheduling the tasks they spawn
/// - Queueing tasks while every worker is busy
/// - Stopping the workers with a bounded wait
pub struct TaskManager {
    channels: Vec<TaskChannel>,
    queued_tasks: VecDeque<Box<dyn Task + Send>>,
    current_channel: usize,
    result_sender: Sender<Completion>,
    result_receiver: Receiver<Completion>,
}

/// Turns a panic payload into a loggable message.
fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn worker_loop(index: usize, tasks: Receiver<Box<dyn Task + Send>>, results: Sender<Completion>) {
    while let Ok(task) = tasks.recv() {
        let result = match panic::catch_unwind(AssertUnwindSafe(|| task.process())) {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload);
                log::warn!("Worker {} panicked on {}: {}", index, task.describe(), message);
                task.recover(message)
            }
        };
        if results.send(Completion { worker: index, result }).is_err() {
            break;
        }
    }
}

impl TaskManager {
    /// Creates a new `TaskManager` with `num_workers` worker threads.
    ///
    /// A worker whose thread cannot be spawned is logged and skipped. With no
    /// workers at all, published tasks run inline on the calling thread.
    pub fn new(num_workers: usize) -> Self {
        let (result_sender, result_receiver) = unbounded::<Completion>();
        let mut channels = Vec::with_capacity(num_workers);

        info!(
            "Available parallelism: {:?}, spawning {} workers",
            thread::available_parallelism(),
            num_workers
        );

        for _ in 0..num_workers {
            let index = channels.len();
            let (task_tx, task_rx) = unbounded::<Box<dyn Task + Send>>();
            let results = result_sender.clone();

            let spawned = thread::Builder::new()
                .name(format!("chunk-worker-{}", index))
                .spawn(move || worker_loop(index, task_rx, results));

            match spawned {
                Ok(worker) => channels.push(TaskChannel {
                    task_sender: task_tx,
                    num_tasks_in_flight: 0,
                    worker,
                }),
                Err(error) => log::error!("Failed to spawn worker thread: {}", error),
            }
        }

        TaskManager {
            channels,
            queued_tasks: VecDeque::new(),
            current_channel: 0,
            result_sender,
            result_receiver,
        }
    }

    /// Number of running workers.
    pub fn worker_count(&self) -> usize {
        self.channels.len()
    }

    /// Tasks currently being processed by workers.
    pub fn in_flight(&self) -> usize {
        self.channels.iter().map(|c| c.num_tasks_in_flight).sum()
    }

    /// Tasks waiting for an idle worker.
    pub fn queued(&self) -> usize {
        self.queued_tasks.len()
    }

    /// The channel completions arrive on, for use with `select!`.
    pub fn results(&self) -> &Receiver<Completion> {
        &self.result_receiver
    }

    /// Attempts to send a task to a specific worker channel.
    ///
    /// Returns the task on failure so it can be requeued.
    fn try_send_task(
        &mut self,
        task: Box<dyn Task + Send>,
        channel_idx: usize,
    ) -> Result<(), Box<dyn Task + Send>> {
        match self.channels[channel_idx].task_sender.send(task) {
            Ok(_) => {
                self.channels[channel_idx].num_tasks_in_flight += 1;
                Ok(())
            }
            Err(task) => Err(task.0),
        }
    }

    /// Finds an idle worker channel, round-robin from the last one used.
    fn find_available_channel(&self) -> Option<usize> {
        if self.channels.is_empty() {
            return None;
        }

        let start_channel = self.current_channel % self.channels.len();
        let mut current = start_channel;
        loop {
            if self.channels[current].num_tasks_in_flight < MAX_TASKS_IN_FLIGHT {
                return Some(current);
            }
            current = (current + 1) % self.channels.len();
            if current == start_channel {
                return None;
            }
        }
    }

    /// Publishes a new task for execution.
    ///
    /// Returns `true` if the task went straight to a worker (or ran inline
    /// because there are none) and `false` if it was queued.
    pub fn publish_task(&mut self, task: Box<dyn Task + Send>) -> bool {
        if self.channels.is_empty() {
            self.run_inline(task);
            return true;
        }

        match self.find_available_channel() {
            Some(channel_idx) => match self.try_send_task(task, channel_idx) {
                Ok(_) => {
                    self.current_channel = (channel_idx + 1) % self.channels.len();
                    true
                }
                Err(task) => {
                    self.queued_tasks.push_back(task);
                    false
                }
            },
            None => {
                self.queued_tasks.push_back(task);
                false
            }
        }
    }

    fn run_inline(&mut self, task: Box<dyn Task + Send>) {
        let result = match panic::catch_unwind(AssertUnwindSafe(|| task.process())) {
            Ok(result) => result,
            Err(payload) => task.recover(panic_message(payload)),
        };
        for follow_up in result.handle_result() {
            self.queued_tasks.push_back(follow_up);
        }
    }

    /// Moves queued tasks to idle workers, oldest first.
    pub fn process_queued_tasks(&mut self) {
        if self.channels.is_empty() {
            while let Some(task) = self.queued_tasks.pop_front() {
                self.run_inline(task);
            }
            return;
        }

        while let Some(channel_idx) = self.find_available_channel() {
            let Some(task) = self.queued_tasks.pop_front() else {
                break;
            };
            match self.try_send_task(task, channel_idx) {
                Ok(_) => self.current_channel = (channel_idx + 1) % self.channels.len(),
                Err(task) => {
                    // Channel is disconnected, put task back and stop processing
                    self.queued_tasks.push_front(task);
                    break;
                }
            }
        }
    }

    /// Handles one completion and publishes the tasks it spawns.
    pub fn complete(&mut self, completion: Completion) {
        if let Some(channel) = self.channels.get_mut(completion.worker) {
            channel.num_tasks_in_flight = channel.num_tasks_in_flight.saturating_sub(1);
        }
        for task in completion.result.handle_result() {
            self.publish_task(task);
        }
    }

    /// Handles every completion that has already arrived.
    pub fn process_completed_tasks(&mut self) {
        while let Ok(completion) = self.result_receiver.try_recv() {
            self.complete(completion);
        }
    }

    /// Stops the pool.
    ///
    /// Queued tasks are dropped. Workers finish the task they are running and
    /// results arriving during the grace period are still handled. Returns
    /// `true` if every worker exited in time; otherwise the stragglers are
    /// detached and `false` is returned.
    pub fn shutdown(mut self, grace: Duration) -> bool {
        if !self.queued_tasks.is_empty() {
            log::debug!("Dropping {} queued tasks at shutdown", self.queued_tasks.len());
            self.queued_tasks.clear();
        }

        let workers: Vec<JoinHandle<()>> = self
            .channels
            .drain(..)
            .map(|channel| channel.worker)
            .collect();
        // Dropping the senders above lets idle workers fall out of `recv`.
        drop(self.result_sender);

        let deadline = Instant::now() + grace;
        loop {
            loop {
                match self.result_receiver.try_recv() {
                    // Follow-up tasks have no worker left to run on.
                    Ok(completion) => drop(completion.result.handle_result()),
                    Err(_) => break,
                }
            }

            if workers.iter().all(JoinHandle::is_finished) {
                for worker in workers {
                    if worker.join().is_err() {
                        log::warn!("Worker thread exited with a panic");
                    }
                }
                return true;
            }

            let now = Instant::now();
            if now >= deadline {
                let busy = workers.iter().filter(|w| !w.is_finished()).count();
                log::warn!(
                    "Detaching {} worker(s) still busy after {:?} grace period",
                    busy,
                    grace
                );
                return false;
            }

            match self
                .result_receiver
                .recv_timeout(SHUTDOWN_POLL_INTERVAL.min(deadline - now))
            {
                Ok(completion) => drop(completion.result.handle_result()),
                Err(RecvTimeoutError::Timeout) => {}
                // Every worker has exited its loop and is about to finish.
                Err(RecvTimeoutError::Disconnected) => thread::sleep(Duration::from_millis(1)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingTask {
        handled: Arc<AtomicUsize>,
        recovered: Arc<AtomicUsize>,
        explode: bool,
        sleep: Duration,
    }

    struct CountingResult {
        handled: Arc<AtomicUsize>,
    }

    impl TaskResult for CountingResult {
        fn handle_result(self: Box<Self>) -> Vec<Box<dyn Task + Send>> {
            self.handled.fetch_add(1, Ordering::SeqCst);
            Vec::new()
        }
    }

    impl Task for CountingTask {
        fn process(&self) -> Box<dyn TaskResult + Send> {
            thread::sleep(self.sleep);
            if self.explode {
                panic!("boom");
            }
            Box::new(CountingResult {
                handled: self.handled.clone(),
            })
        }

        fn recover(&self, message: String) -> Box<dyn TaskResult + Send> {
            assert_eq!(message, "boom");
            self.recovered.fetch_add(1, Ordering::SeqCst);
            Box::new(CountingResult {
                handled: self.handled.clone(),
            })
        }

        fn describe(&self) -> String {
            "counting task".to_string()
        }
    }

    fn drain(manager: &mut TaskManager, expected: usize, handled: &AtomicUsize) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while handled.load(Ordering::SeqCst) < expected && Instant::now() < deadline {
            if let Ok(completion) = manager.results().recv_timeout(Duration::from_millis(50)) {
                manager.complete(completion);
            }
            manager.process_queued_tasks();
        }
    }

    #[test]
    fn every_task_is_handled_once() {
        let handled = Arc::new(AtomicUsize::new(0));
        let recovered = Arc::new(AtomicUsize::new(0));
        let mut manager = TaskManager::new(2);
        for _ in 0..10 {
            manager.publish_task(Box::new(CountingTask {
                handled: handled.clone(),
                recovered: recovered.clone(),
                explode: false,
                sleep: Duration::ZERO,
            }));
        }
        assert!(manager.in_flight() <= 2);
        drain(&mut manager, 10, &handled);
        assert_eq!(handled.load(Ordering::SeqCst), 10);
        assert_eq!(manager.in_flight() + manager.queued(), 0);
        assert!(manager.shutdown(Duration::from_secs(2)));
    }

    #[test]
    fn panicking_task_is_recovered_and_worker_survives() {
        let handled = Arc::new(AtomicUsize::new(0));
        let recovered = Arc::new(AtomicUsize::new(0));
        let mut manager = TaskManager::new(1);
        for explode in [true, false] {
            manager.publish_task(Box::new(CountingTask {
                handled: handled.clone(),
                recovered: recovered.clone(),
                explode,
                sleep: Duration::ZERO,
            }));
        }
        drain(&mut manager, 2, &handled);
        assert_eq!(handled.load(Ordering::SeqCst), 2);
        assert_eq!(recovered.load(Ordering::SeqCst), 1);
        assert!(manager.shutdown(Duration::from_secs(2)));
    }

    #[test]
    fn shutdown_detaches_slow_workers() {
        let handled = Arc::new(AtomicUsize::new(0));
        let recovered = Arc::new(AtomicUsize::new(0));
        let mut manager = TaskManager::new(1);
        manager.publish_task(Box::new(CountingTask {
            handled,
            recovered,
            explode: false,
            sleep: Duration::from_millis(500),
        }));
        assert!(!manager.shutdown(Duration::from_millis(20)));
    }

    #[test]
    fn no_workers_runs_inline() {
        let handled = Arc::new(AtomicUsize::new(0));
        let recovered = Arc::new(AtomicUsize::new(0));
        let mut manager = TaskManager::new(0);
        assert!(manager.publish_task(Box::new(CountingTask {
            handled: handled.clone(),
            recovered,
            explode: false,
            sleep: Duration::ZERO,
        })));
        assert_eq!(handled.load(Ordering::SeqCst), 1);
    }
}
