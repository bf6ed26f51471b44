//! # Task System Core Traits
//!
//! This module defines the building blocks of the task system, which runs
//! work on a pool of background threads.
//!
//! ## Core Components
//! - `Task`: A unit of work executed on a worker thread
//! - `TaskResult`: The outcome of a task, handled back on the dispatcher
//!
//! ## Task Lifecycle
//! 1. A `Task` is scheduled via `TaskManager::publish_task()`
//! 2. The task's `process()` method runs on a worker thread
//! 3. If `process()` panics, the worker asks the task to `recover()` instead
//! 4. The resulting `TaskResult` travels back to the dispatcher thread
//! 5. The result's `handle_result()` applies it and may spawn follow-up tasks
//!
//! ## Thread Safety
//! - `Task` must be `Send` to be transferred to a worker
//! - `TaskResult` must be `Send` to be transferred back
//! - Shared state reached from either side goes through an `MtResource`

/// A unit of work that can be executed on a worker thread.
///
/// Tasks own everything they need. A task holding shared state must only
/// touch it through a lock.
pub trait Task: Send {
    /// Performs the work and returns its result.
    ///
    /// Runs on a worker thread. Errors are reported through the returned
    /// result rather than by panicking.
    fn process(&self) -> Box<dyn TaskResult + Send>;

    /// Produces the result for a task whose `process()` panicked.
    ///
    /// `message` is the panic payload when it was a string.
    fn recover(&self, message: String) -> Box<dyn TaskResult + Send>;

    /// Short human-readable description used in logs.
    fn describe(&self) -> String;
}

/// The outcome of processing a [`Task`].
pub trait TaskResult: Send {
    /// Applies the result.
    ///
    /// Called on the dispatcher thread, one result at a time. Returns any
    /// follow-up tasks to schedule.
    fn handle_result(self: Box<Self>) -> Vec<Box<dyn Task + Send>>;
}
