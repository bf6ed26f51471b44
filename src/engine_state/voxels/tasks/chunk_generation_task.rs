//! # Chunk Generation Task
//!
//! This module defines the `ChunkGenerationTask` which generates one chunk's
//! terrain on a worker thread. The result is inserted into the chunk store by
//! the streamer's dispatcher thread.

use std::collections::HashMap;
use std::sync::Arc;

use cgmath::Point3;

use crate::{
    core::MtResource,
    engine_state::{
        task_management::task::{Task, TaskResult},
        voxels::{
            chunk::Chunk, chunk_store::ChunkStore, generation::TerrainGenerator,
            streamer::ChunkLoadState,
        },
    },
    error::GenerationError,
};

/// Requests that are queued or generating, keyed by chunk coordinate.
pub type PendingRequests = MtResource<HashMap<Point3<i32>, ChunkLoadState>>;

/// A task that generates chunk data on a worker thread.
///
/// This task is responsible for:
/// 1. Marking its request as generating
/// 2. Generating the chunk at the specified position
/// 3. Handing the chunk back for insertion into the store
pub struct ChunkGenerationTask {
    generator: Arc<TerrainGenerator>,
    store: MtResource<ChunkStore>,
    pending: PendingRequests,
    /// The position of the chunk to generate (in chunk coordinates)
    position: Point3<i32>,
}

impl ChunkGenerationTask {
    /// Creates a new chunk generation task.
    pub fn new(
        generator: Arc<TerrainGenerator>,
        store: MtResource<ChunkStore>,
        pending: PendingRequests,
        position: Point3<i32>,
    ) -> Self {
        ChunkGenerationTask {
            generator,
            store,
            pending,
            position,
        }
    }

    fn result(&self, outcome: Result<Chunk, GenerationError>) -> Box<dyn TaskResult + Send> {
        Box::new(ChunkGenerationTaskResult {
            store: self.store.clone(),
            pending: self.pending.clone(),
            position: self.position,
            outcome,
        })
    }
}

impl Task for ChunkGenerationTask {
    fn process(&self) -> Box<dyn TaskResult + Send> {
        self.pending.with_mut(|pending| {
            if let Some(state) = pending.get_mut(&self.position) {
                *state = ChunkLoadState::Generating;
            }
        });
        self.result(self.generator.generate(self.position))
    }

    fn recover(&self, message: String) -> Box<dyn TaskResult + Send> {
        self.result(Err(GenerationError::WorkerPanic(self.position, message)))
    }

    fn describe(&self) -> String {
        format!("chunk {:?}", self.position)
    }
}

/// The result of a chunk generation task.
pub struct ChunkGenerationTaskResult {
    store: MtResource<ChunkStore>,
    pending: PendingRequests,
    position: Point3<i32>,
    outcome: Result<Chunk, GenerationError>,
}

impl TaskResult for ChunkGenerationTaskResult {
    /// Inserts the chunk, then clears the request.
    ///
    /// The store is checked before inserting: a chunk that became resident in
    /// the meantime (through a blocking load) is dropped. A failed generation
    /// only clears the request, so the coordinate can be requested again.
    fn handle_result(self: Box<Self>) -> Vec<Box<dyn Task + Send>> {
        match self.outcome {
            Ok(chunk) => {
                let inserted = self.store.with_mut(|store| {
                    !store.contains_chunk(self.position) && store.insert_chunk(chunk)
                });
                if inserted {
                    log::trace!("Chunk {:?} resident", self.position);
                } else {
                    log::debug!("Dropped duplicate chunk {:?}", self.position);
                }
            }
            Err(error) => log::warn!("Chunk generation failed: {}", error),
        }

        self.pending.with_mut(|pending| pending.remove(&self.position));
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: Point3<i32> = Point3 { x: 0, y: 0, z: 0 };

    fn queued(position: Point3<i32>) -> PendingRequests {
        let mut pending = HashMap::new();
        pending.insert(position, ChunkLoadState::Queued);
        MtResource::new(pending)
    }

    #[test]
    fn late_completion_keeps_edits_of_a_blocking_load() {
        let generator = Arc::new(TerrainGenerator::new(42));
        let store = MtResource::new(ChunkStore::new());
        let pending = queued(ORIGIN);

        // The chunk arrives through a blocking load and is edited before
        // the streamed generation for the same coordinate completes.
        let task = ChunkGenerationTask::new(generator.clone(), store.clone(), pending.clone(), ORIGIN);
        let loaded = generator.generate(ORIGIN).unwrap();
        store.with_mut(|store| {
            assert!(store.insert_chunk(loaded));
            store.remove_block(ORIGIN).unwrap();
        });

        let follow_up = task.process().handle_result();
        assert!(follow_up.is_empty());

        let store = store.get();
        assert_eq!(store.len(), 1);
        assert!(store.get_block(ORIGIN).is_none());
        assert!(store.diff().get(ORIGIN).is_some());
        assert!(pending.get().is_empty());
    }

    #[test]
    fn completion_inserts_a_missing_chunk() {
        let generator = Arc::new(TerrainGenerator::new(42));
        let store = MtResource::new(ChunkStore::new());
        let pending = queued(ORIGIN);

        ChunkGenerationTask::new(generator, store.clone(), pending.clone(), ORIGIN)
            .process()
            .handle_result();

        assert!(store.get().contains_chunk(ORIGIN));
        assert!(pending.get().is_empty());
    }

    #[test]
    fn failed_generation_clears_the_request() {
        let generator = Arc::new(TerrainGenerator::new(42));
        let store = MtResource::new(ChunkStore::new());
        let pending = queued(ORIGIN);

        ChunkGenerationTask::new(generator, store.clone(), pending.clone(), ORIGIN)
            .recover("worker died".to_string())
            .handle_result();

        assert!(store.get().is_empty());
        assert!(pending.get().is_empty());
    }
}
