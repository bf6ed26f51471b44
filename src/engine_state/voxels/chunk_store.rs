//! # Chunk Store
//!
//! The authoritative spatial state: every resident chunk, the modification
//! diff recording player edits, and the set of chunks whose face masks are
//! stale.
//!
//! The store itself is plain data. It is shared between the simulation
//! thread and the streamer's dispatcher behind one [`MtResource`] lock, and
//! every read or write goes through that lock.
//!
//! [`MtResource`]: crate::core::MtResource

use std::collections::{HashMap, HashSet};

use cgmath::Point3;
use serde::{Deserialize, Serialize};

use crate::engine_state::voxels::block::{block_type::BlockType, Block};
use crate::engine_state::voxels::chunk::{chebyshev_distance, chunk_coord_of, Chunk};
use crate::error::WorldError;

/// A player-caused change at one world position.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modification {
    /// A block of this type was placed.
    Placed(BlockType),
    /// Whatever was there (terrain or a placed block) was removed.
    Removed,
}

/// Player edits in the order they were first made.
///
/// Recording a second change at the same position overwrites the first one
/// in place, so replaying the diff in order applies each position's latest
/// change exactly once.
#[derive(Debug, Clone, Default)]
pub struct ModificationDiff {
    entries: Vec<(Point3<i32>, Modification)>,
    index: HashMap<Point3<i32>, usize>,
}

impl ModificationDiff {
    /// Records `modification` at `position`.
    pub fn record(&mut self, position: Point3<i32>, modification: Modification) {
        match self.index.get(&position) {
            Some(&slot) => self.entries[slot].1 = modification,
            None => {
                self.index.insert(position, self.entries.len());
                self.entries.push((position, modification));
            }
        }
    }

    /// The latest change recorded at `position`.
    pub fn get(&self, position: Point3<i32>) -> Option<Modification> {
        self.index.get(&position).map(|&slot| self.entries[slot].1)
    }

    /// All entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Point3<i32>, Modification)> + '_ {
        self.entries.iter().copied()
    }

    /// Entries that fall inside one chunk, in insertion order.
    pub fn in_chunk(&self, chunk: Point3<i32>) -> impl Iterator<Item = (Point3<i32>, Modification)> + '_ {
        self.iter()
            .filter(move |(position, _)| chunk_coord_of(*position) == chunk)
    }

    /// Number of modified positions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when the player has not changed anything.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Applies one modification to a chunk that contains its position.
fn apply_to_chunk(chunk: &mut Chunk, position: Point3<i32>, modification: Modification) {
    match modification {
        Modification::Placed(block_type) => {
            chunk.set_block(Block::new(block_type, position));
        }
        Modification::Removed => {
            chunk.remove_block(position);
        }
    }
}

/// Offsets of a chunk and its 26 neighbors.
fn neighborhood(center: Point3<i32>) -> impl Iterator<Item = Point3<i32>> {
    (-1..=1).flat_map(move |dz| {
        (-1..=1).flat_map(move |dy| {
            (-1..=1).filter_map(move |dx| {
                Some(Point3::new(
                    center.x.checked_add(dx)?,
                    center.y.checked_add(dy)?,
                    center.z.checked_add(dz)?,
                ))
            })
        })
    })
}

/// Resident chunks, the modification diff, and stale-occlusion bookkeeping.
#[derive(Debug, Default)]
pub struct ChunkStore {
    chunks: HashMap<Point3<i32>, Chunk>,
    diff: ModificationDiff,
    dirty: HashSet<Point3<i32>>,
}

impl ChunkStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of resident chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// `true` when no chunk is resident.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Whether a chunk is resident at `coordinate`.
    pub fn contains_chunk(&self, coordinate: Point3<i32>) -> bool {
        self.chunks.contains_key(&coordinate)
    }

    /// The resident chunk at `coordinate`.
    pub fn chunk(&self, coordinate: Point3<i32>) -> Option<&Chunk> {
        self.chunks.get(&coordinate)
    }

    /// Mutable access to the resident chunk at `coordinate`.
    pub fn chunk_mut(&mut self, coordinate: Point3<i32>) -> Option<&mut Chunk> {
        self.chunks.get_mut(&coordinate)
    }

    /// Coordinates of every resident chunk, in no particular order.
    pub fn chunk_coordinates(&self) -> impl Iterator<Item = Point3<i32>> + '_ {
        self.chunks.keys().copied()
    }

    /// Every resident chunk, in no particular order.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    /// Makes a freshly generated chunk resident.
    ///
    /// Recorded modifications inside the chunk are replayed over the generated
    /// terrain, and the chunk and its 26 neighbors are marked dirty. Returns
    /// `false` without touching the store if the coordinate is already
    /// resident; callers are expected to check first, so that is asserted in
    /// debug builds.
    pub fn insert_chunk(&mut self, mut chunk: Chunk) -> bool {
        let coordinate = chunk.position;
        debug_assert!(
            !self.chunks.contains_key(&coordinate),
            "chunk {:?} inserted twice",
            coordinate
        );
        if self.chunks.contains_key(&coordinate) {
            log::error!("Rejected duplicate chunk {:?}", coordinate);
            return false;
        }

        for (position, modification) in self.diff.in_chunk(coordinate) {
            apply_to_chunk(&mut chunk, position, modification);
        }

        self.chunks.insert(coordinate, chunk);
        self.mark_dirty_around(coordinate);
        true
    }

    /// Removes a resident chunk. Its neighbors are marked dirty because their
    /// boundary faces are exposed again.
    pub fn remove_chunk(&mut self, coordinate: Point3<i32>) -> Option<Chunk> {
        let removed = self.chunks.remove(&coordinate)?;
        self.dirty.remove(&coordinate);
        self.mark_dirty_around(coordinate);
        Some(removed)
    }

    /// Removes every chunk farther than `distance` (Chebyshev, in chunks) from
    /// `center` and returns their coordinates.
    pub fn evict_outside(&mut self, center: Point3<i32>, distance: i32) -> Vec<Point3<i32>> {
        let evicted: Vec<_> = self
            .chunks
            .keys()
            .copied()
            .filter(|coordinate| chebyshev_distance(*coordinate, center) > distance as i64)
            .collect();
        for coordinate in &evicted {
            self.remove_chunk(*coordinate);
        }
        evicted
    }

    /// The block at a world position. Unloaded chunks read as air.
    pub fn get_block(&self, position: Point3<i32>) -> Option<&Block> {
        self.chunks.get(&chunk_coord_of(position))?.get_block(position)
    }

    /// Mutable variant of [`ChunkStore::get_block`].
    pub fn get_block_mut(&mut self, position: Point3<i32>) -> Option<&mut Block> {
        self.chunks
            .get_mut(&chunk_coord_of(position))?
            .get_block_mut(position)
    }

    /// Whether a block occupies the position. Unloaded chunks are never solid.
    pub fn is_solid(&self, position: Point3<i32>) -> bool {
        self.get_block(position).is_some()
    }

    /// Whether an opaque block occupies the position.
    pub fn is_opaque(&self, position: Point3<i32>) -> bool {
        self.get_block(position).is_some_and(Block::is_opaque)
    }

    /// Places a block of `block_type` and records it in the diff.
    ///
    /// # Errors
    /// [`WorldError::ChunkNotResident`] if the chunk is not loaded and
    /// [`WorldError::Occupied`] if a block is already there.
    pub fn place_block(&mut self, position: Point3<i32>, block_type: BlockType) -> Result<(), WorldError> {
        let coordinate = chunk_coord_of(position);
        let chunk = self
            .chunks
            .get_mut(&coordinate)
            .ok_or(WorldError::ChunkNotResident(coordinate))?;
        if chunk.get_block(position).is_some() {
            return Err(WorldError::Occupied(position));
        }
        chunk.set_block(Block::new(block_type, position));
        self.diff.record(position, Modification::Placed(block_type));
        self.mark_dirty_around(coordinate);
        Ok(())
    }

    /// Removes the block at `position` and records the removal in the diff.
    ///
    /// Breakability is not checked here.
    ///
    /// # Errors
    /// [`WorldError::ChunkNotResident`] if the chunk is not loaded and
    /// [`WorldError::NoBlock`] if the cell is already air.
    pub fn remove_block(&mut self, position: Point3<i32>) -> Result<Block, WorldError> {
        let coordinate = chunk_coord_of(position);
        let chunk = self
            .chunks
            .get_mut(&coordinate)
            .ok_or(WorldError::ChunkNotResident(coordinate))?;
        let removed = chunk
            .remove_block(position)
            .ok_or(WorldError::NoBlock(position))?;
        self.diff.record(position, Modification::Removed);
        self.mark_dirty_around(coordinate);
        Ok(removed)
    }

    /// Records a modification and applies it to the resident chunk, if any.
    ///
    /// Used when replaying a save: unlike [`ChunkStore::place_block`] it
    /// overwrites whatever the terrain put there.
    pub fn apply_modification(&mut self, position: Point3<i32>, modification: Modification) {
        self.diff.record(position, modification);
        let coordinate = chunk_coord_of(position);
        if let Some(chunk) = self.chunks.get_mut(&coordinate) {
            apply_to_chunk(chunk, position, modification);
            self.mark_dirty_around(coordinate);
        }
    }

    /// The modification diff.
    pub fn diff(&self) -> &ModificationDiff {
        &self.diff
    }

    /// Marks a chunk and its 26 neighbors as needing occlusion recomputation.
    pub fn mark_dirty_around(&mut self, coordinate: Point3<i32>) {
        self.dirty.extend(neighborhood(coordinate));
    }

    /// Whether the chunk at `coordinate` is waiting for occlusion recomputation.
    pub fn is_dirty(&self, coordinate: Point3<i32>) -> bool {
        self.dirty.contains(&coordinate)
    }

    /// Drains the dirty set, returning only coordinates that are resident.
    pub fn take_dirty(&mut self) -> Vec<Point3<i32>> {
        let chunks = &self.chunks;
        self.dirty
            .drain()
            .filter(|coordinate| chunks.contains_key(coordinate))
            .collect()
    }
}
