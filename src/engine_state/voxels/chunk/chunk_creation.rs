//! # Chunk Creation Module
//!
//! This module provides a builder that composes a whole chunk cell by cell
//! before it is handed to the chunk store. Cells are pushed in storage order
//! (x fastest, then y, then z), so the builder always knows which world
//! position the next pushed block belongs to.

use cgmath::Point3;

use crate::engine_state::voxels::block::{block_type::BlockType, Block};
use crate::error::GenerationError;

use super::{chunk_origin, Chunk, CHUNK_DIMENSION};

/// A builder for creating and populating a chunk in storage order.
pub struct ChunkCreationIterator {
    /// The chunk under construction
    chunk: Chunk,
    /// World position of local (0, 0, 0)
    origin: Point3<i32>,
    /// Current X position within the chunk
    local_x: i32,
    /// Current Y position within the chunk
    local_y: i32,
    /// Current Z position within the chunk
    local_z: i32,
}

impl ChunkCreationIterator {
    /// Creates a new `ChunkCreationIterator` for building a chunk at the given position.
    ///
    /// # Errors
    /// Returns [`GenerationError::CoordinateOverflow`] when the chunk's blocks
    /// cannot be addressed with 32-bit world coordinates.
    pub fn new(position: Point3<i32>) -> Result<Self, GenerationError> {
        let origin = chunk_origin(position).ok_or(GenerationError::CoordinateOverflow(position))?;
        Ok(ChunkCreationIterator {
            chunk: Chunk::empty(position),
            origin,
            local_x: 0,
            local_y: 0,
            local_z: 0,
        })
    }

    /// World position of the cell the next push will fill, or `None` once
    /// every cell has been pushed.
    pub fn current_world_position(&self) -> Option<Point3<i32>> {
        if self.local_z == CHUNK_DIMENSION {
            return None;
        }
        Some(Point3::new(
            self.origin.x + self.local_x,
            self.origin.y + self.local_y,
            self.origin.z + self.local_z,
        ))
    }

    /// Fills the current cell (`None` is air) and advances to the next one.
    ///
    /// Pushes past the last cell are ignored.
    pub fn push_block_type(&mut self, block_type: Option<BlockType>) {
        let Some(position) = self.current_world_position() else {
            return;
        };

        if let Some(block_type) = block_type {
            self.chunk.set_block(Block::new(block_type, position));
        }

        // Move to the next position
        self.local_x += 1;
        if self.local_x == CHUNK_DIMENSION {
            self.local_x = 0;
            self.local_y += 1;
            if self.local_y == CHUNK_DIMENSION {
                self.local_y = 0;
                self.local_z += 1;
            }
        }
    }

    /// Finalizes the chunk creation and returns the constructed `Chunk`.
    pub fn return_chunk(self) -> Chunk {
        self.chunk
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::chunk::CHUNK_SIZE;

    #[test]
    fn walks_every_cell_in_storage_order() {
        let mut cci = ChunkCreationIterator::new(Point3::new(1, 0, -1)).unwrap();
        assert_eq!(cci.current_world_position(), Some(Point3::new(16, 0, -16)));
        cci.push_block_type(Some(BlockType::STONE));
        assert_eq!(cci.current_world_position(), Some(Point3::new(17, 0, -16)));

        for _ in 1..CHUNK_SIZE {
            cci.push_block_type(None);
        }
        assert_eq!(cci.current_world_position(), None);
        cci.push_block_type(Some(BlockType::DIRT));

        let chunk = cci.return_chunk();
        assert_eq!(chunk.len(), 1);
        assert!(chunk.get_block(Point3::new(16, 0, -16)).is_some());
    }

    #[test]
    fn overflowing_coordinates_are_rejected() {
        assert!(matches!(
            ChunkCreationIterator::new(Point3::new(0, i32::MIN, 0)),
            Err(GenerationError::CoordinateOverflow(_))
        ));
    }
}
