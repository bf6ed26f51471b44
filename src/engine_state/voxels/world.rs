//! # World Module
//!
//! This module provides the `World` struct, the facade the simulation uses
//! for everything voxel related: block queries, block edits, and keeping the
//! set of resident chunks centered on the observer.
//!
//! ## Architecture
//!
//! The world owns the shared [`ChunkStore`] and the [`ChunkStreamer`] that
//! fills it. Terrain is regenerated on demand from the seed, so only player
//! modifications are authoritative state; they live in the store's diff and
//! are replayed whenever their chunk is generated again.
//!
//! ## Residency
//!
//! Residency is reconciled against the observer's chunk coordinate:
//! - when the observer crosses into another chunk
//! - every [`RECONCILE_INTERVAL_STEPS`] updates otherwise, to pick up chunks
//!   whose earlier requests failed
//!
//! A reconciliation evicts every chunk farther than the render distance
//! (Chebyshev distance in chunk coordinates, vertical axis included) and
//! requests every missing chunk inside it, nearest first.

use std::sync::Arc;
use std::time::Duration;

use cgmath::Point3;

use crate::core::MtResource;
use crate::engine_state::voxels::block::{block_type::BlockType, Block};
use crate::engine_state::voxels::chunk::{block_coord_of, chebyshev_distance, chunk_coord_of};
use crate::engine_state::voxels::chunk_store::{ChunkStore, Modification};
use crate::engine_state::voxels::generation::TerrainGenerator;
use crate::engine_state::voxels::streamer::{default_worker_count, ChunkStreamer};
use crate::error::{GenerationError, WorldError};

/// Updates between reconciliations while the observer stays in one chunk.
pub const RECONCILE_INTERVAL_STEPS: u32 = 20;

/// Construction parameters for a [`World`].
#[derive(Clone, Debug, PartialEq)]
pub struct WorldConfig {
    /// World seed.
    pub seed: u64,
    /// Chebyshev radius, in chunks, kept resident around the observer.
    pub render_distance: i32,
    /// Generation worker threads.
    pub workers: usize,
    /// How long shutdown waits for in-flight generation.
    pub shutdown_grace: Duration,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            seed: 0,
            render_distance: 4,
            workers: default_worker_count(),
            shutdown_grace: Duration::from_secs(2),
        }
    }
}

/// Chunks added and removed by one reconciliation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Newly filed generation requests.
    pub requested: usize,
    /// Coordinates evicted from the store.
    pub evicted: Vec<Point3<i32>>,
}

/// Every chunk coordinate within `radius` of `center`, nearest first.
///
/// Ties on Chebyshev distance are broken by squared Euclidean distance so the
/// chunks directly around the observer come before the corners.
pub fn chunks_around(center: Point3<i32>, radius: i32) -> Vec<Point3<i32>> {
    let radius = radius.max(0);
    let mut wanted = Vec::new();
    for dz in -radius..=radius {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let coordinate = (|| {
                    Some(Point3::new(
                        center.x.checked_add(dx)?,
                        center.y.checked_add(dy)?,
                        center.z.checked_add(dz)?,
                    ))
                })();
                if let Some(coordinate) = coordinate {
                    wanted.push(coordinate);
                }
            }
        }
    }
    wanted.sort_by_key(|c| {
        let (dx, dy, dz) = (
            (c.x as i64 - center.x as i64),
            (c.y as i64 - center.y as i64),
            (c.z as i64 - center.z as i64),
        );
        (chebyshev_distance(*c, center), dx * dx + dy * dy + dz * dz)
    });
    wanted
}

/// Represents the voxel world: resident chunks, player edits, and streaming.
#[derive(Debug)]
pub struct World {
    store: MtResource<ChunkStore>,
    streamer: ChunkStreamer,
    generator: Arc<TerrainGenerator>,
    render_distance: i32,
    observer_chunk: Option<Point3<i32>>,
    steps_since_reconcile: u32,
}

impl World {
    /// Creates an empty world and starts its streamer.
    pub fn new(config: WorldConfig) -> Self {
        let store = MtResource::new(ChunkStore::new());
        let generator = Arc::new(TerrainGenerator::new(config.seed));
        let streamer = ChunkStreamer::new(
            store.clone(),
            generator.clone(),
            config.workers,
            config.shutdown_grace,
        );
        log::info!(
            "World seed {} with render distance {}",
            config.seed,
            config.render_distance
        );
        World {
            store,
            streamer,
            generator,
            render_distance: config.render_distance.max(0),
            observer_chunk: None,
            steps_since_reconcile: 0,
        }
    }

    /// The shared chunk store.
    pub fn store(&self) -> &MtResource<ChunkStore> {
        &self.store
    }

    /// The background streamer.
    pub fn streamer(&self) -> &ChunkStreamer {
        &self.streamer
    }

    /// The terrain generator.
    pub fn generator(&self) -> &TerrainGenerator {
        &self.generator
    }

    /// Chebyshev radius kept resident around the observer.
    pub fn render_distance(&self) -> i32 {
        self.render_distance
    }

    /// The chunk the last reconciliation was centered on.
    pub fn observer_chunk(&self) -> Option<Point3<i32>> {
        self.observer_chunk
    }

    /// A copy of the block at a world position, or `None` for air and
    /// unloaded chunks.
    pub fn get_block(&self, position: Point3<i32>) -> Option<Block> {
        self.store.get().get_block(position).copied()
    }

    /// Places a block at `position`.
    ///
    /// The placement is recorded in the modification diff, and the chunk and
    /// its neighbors are marked for occlusion refresh.
    ///
    /// # Arguments
    /// * `position` - World block coordinate of the empty cell to fill
    /// * `block_type` - Type of the new block
    ///
    /// # Errors
    /// [`WorldError::ChunkNotResident`] if the chunk is not loaded, or
    /// [`WorldError::Occupied`] if the cell already holds a block.
    pub fn place_block(&self, position: Point3<i32>, block_type: BlockType) -> Result<(), WorldError> {
        self.store.get_mut().place_block(position, block_type)?;
        log::debug!("Placed {:?} at {:?}", block_type, position);
        Ok(())
    }

    /// Destroys the block at `position`.
    ///
    /// # Arguments
    /// * `position` - World block coordinate of the block to remove
    ///
    /// # Returns
    /// The removed block. Its removal is recorded in the modification diff.
    ///
    /// # Errors
    /// [`WorldError::ChunkNotResident`], [`WorldError::NoBlock`], or
    /// [`WorldError::Unbreakable`] for blocks with an infinite break time.
    pub fn destroy_block(&self, position: Point3<i32>) -> Result<Block, WorldError> {
        let mut store = self.store.get_mut();
        let coordinate = chunk_coord_of(position);
        if !store.contains_chunk(coordinate) {
            return Err(WorldError::ChunkNotResident(coordinate));
        }
        match store.get_block(position) {
            None => return Err(WorldError::NoBlock(position)),
            Some(block) if !block.is_breakable() => return Err(WorldError::Unbreakable(position)),
            Some(_) => {}
        }
        let removed = store.remove_block(position)?;
        log::debug!("Destroyed {:?} at {:?}", removed.block_type, position);
        Ok(removed)
    }

    /// Advances residency bookkeeping for an observer at `position`.
    ///
    /// # Arguments
    /// * `position` - Observer position in world space
    ///
    /// # Returns
    /// The report of the reconciliation, if one ran. One runs when the
    /// observer changed chunk or every [`RECONCILE_INTERVAL_STEPS`] calls.
    ///
    /// # Performance
    /// Cheap between reconciliations: one coordinate conversion and a compare.
    pub fn update(&mut self, position: Point3<f32>) -> Option<ReconcileReport> {
        let chunk = chunk_coord_of(block_coord_of(position));
        self.steps_since_reconcile += 1;
        if self.observer_chunk != Some(chunk) || self.steps_since_reconcile >= RECONCILE_INTERVAL_STEPS {
            Some(self.reconcile(chunk))
        } else {
            None
        }
    }

    /// Evicts chunks outside the render distance of `center` and requests the
    /// missing ones inside it, nearest first.
    ///
    /// # Arguments
    /// * `center` - Chunk coordinate of the observer
    ///
    /// # Returns
    /// How many requests were newly filed and which coordinates were evicted.
    /// Coordinates already queued or generating are not requested again.
    ///
    /// # Performance
    /// Never generates on the calling thread. The store lock is held only for
    /// eviction and the residency filter.
    pub fn reconcile(&mut self, center: Point3<i32>) -> ReconcileReport {
        self.observer_chunk = Some(center);
        self.steps_since_reconcile = 0;

        let wanted = chunks_around(center, self.render_distance);
        let (evicted, missing) = {
            let mut store = self.store.get_mut();
            let evicted = store.evict_outside(center, self.render_distance);
            let missing: Vec<_> = wanted
                .into_iter()
                .filter(|coordinate| !store.contains_chunk(*coordinate))
                .collect();
            (evicted, missing)
        };

        // The store lock is released before touching the request table.
        let requested = missing
            .into_iter()
            .filter(|coordinate| self.streamer.request(*coordinate))
            .count();

        if requested > 0 || !evicted.is_empty() {
            log::debug!(
                "Reconciled around {:?}: {} requested, {} evicted",
                center,
                requested,
                evicted.len()
            );
        }
        ReconcileReport { requested, evicted }
    }

    /// Generates and inserts a chunk on the calling thread.
    ///
    /// # Returns
    /// `Ok(true)` if the chunk was inserted, `Ok(false)` if it was already
    /// resident. A streamed completion arriving later for the same coordinate
    /// is dropped, so edits made in between are kept.
    ///
    /// # Performance
    /// Generation runs outside the store lock.
    ///
    /// # Errors
    /// Propagates the [`GenerationError`] if the coordinate cannot be generated.
    pub fn load_chunk_blocking(&self, coordinate: Point3<i32>) -> Result<bool, GenerationError> {
        if self.store.get().contains_chunk(coordinate) {
            return Ok(false);
        }
        let chunk = self.generator.generate(coordinate)?;
        let mut store = self.store.get_mut();
        Ok(!store.contains_chunk(coordinate) && store.insert_chunk(chunk))
    }

    /// Blocking load of every chunk within `radius` of `center`.
    ///
    /// # Errors
    /// Stops at the first chunk that fails to generate.
    pub fn load_area_blocking(&self, center: Point3<i32>, radius: i32) -> Result<usize, GenerationError> {
        let mut loaded = 0;
        for coordinate in chunks_around(center, radius) {
            if self.load_chunk_blocking(coordinate)? {
                loaded += 1;
            }
        }
        Ok(loaded)
    }

    /// All player modifications in the order they were made.
    pub fn modifications(&self) -> Vec<(Point3<i32>, Modification)> {
        self.store.get().diff().iter().collect()
    }

    /// Replays saved modifications, in order, over the current world.
    pub fn apply_modifications(&self, modifications: impl IntoIterator<Item = (Point3<i32>, Modification)>) {
        let mut store = self.store.get_mut();
        for (position, modification) in modifications {
            store.apply_modification(position, modification);
        }
    }

    /// Stops chunk streaming. Outstanding requests are abandoned.
    pub fn shutdown(&mut self) {
        self.streamer.shutdown();
    }
}
