//! # Voxel World Core
//!
//! This module contains the voxel world: block and chunk representation,
//! terrain generation, the shared chunk store, and background streaming.
//!
//! ## Architecture
//!
//! * **Block**: Block kinds, their properties, and face bookkeeping
//! * **Chunk**: Fixed-size 16x16x16 sparse block containers and coordinate math
//! * **Generation**: Seeded noise and the deterministic terrain generator
//! * **Chunk Store**: Resident chunks plus the player's modification diff
//! * **Streamer** and **Tasks**: Asynchronous chunk generation on a worker pool
//! * **World**: The facade tying the pieces together for the simulation
//!
//! ## Data Flow
//!
//! 1. The world reconciles residency around the observer
//! 2. Missing chunks are requested from the streamer, nearest first
//! 3. Workers generate terrain; the dispatcher inserts it into the store
//! 4. Insertion replays recorded modifications and marks neighbors dirty
//! 5. The visibility pass recomputes face masks for dirty chunks
//!
//! ## Thread Safety
//!
//! The chunk store is the only state shared with worker threads, and it is
//! always accessed through its `MtResource` lock.

pub mod block;
pub mod chunk;
pub mod chunk_store;
pub mod generation;
pub mod streamer;
pub mod tasks;
pub mod world;
