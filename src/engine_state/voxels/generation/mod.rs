//! # Terrain Generation
//!
//! Fills chunks from the world seed. A 2D height field decides where the
//! surface is, 3D density carves caves below it, and the remaining solid cells
//! are typed by depth: bedrock at the floor, grass on top, a few layers of
//! dirt, then stone.
//!
//! Generation is a pure function of `(seed, chunk coordinate)`. Terrain is
//! never saved, so every regeneration must reproduce the same blocks.

use cgmath::Point3;

use crate::engine_state::voxels::block::block_type::BlockType;
use crate::engine_state::voxels::chunk::{
    chunk_creation::ChunkCreationIterator, chunk_origin, Chunk, CHUNK_DIMENSION,
};
use crate::error::GenerationError;

pub mod gradient_noise;

use gradient_noise::GradientNoise;

/// World X/Z are divided by this before sampling the height field.
pub const HEIGHT_SCALE: f64 = 64.0;
/// Height noise is multiplied by this before flooring.
pub const HEIGHT_AMPLITUDE: f64 = 32.0;
/// Surface height where the height noise is zero.
pub const BASE_HEIGHT: i32 = 32;
/// World coordinates are multiplied by this before sampling cave density.
pub const CAVE_FREQUENCY: f64 = 1.0 / 16.0;
/// Cells whose cave density exceeds this are carved out.
pub const CAVE_THRESHOLD: f64 = 0.3;
/// Caves never reach this layer or anything below it.
pub const CAVE_MIN_Y: i32 = 4;
/// Number of dirt layers under the grass.
pub const DIRT_DEPTH: i32 = 3;

/// Deterministic terrain generator for one world seed.
#[derive(Clone, Debug)]
pub struct TerrainGenerator {
    noise: GradientNoise,
}

impl TerrainGenerator {
    /// Creates a generator for `seed`.
    pub fn new(seed: u64) -> Self {
        TerrainGenerator {
            noise: GradientNoise::new(seed),
        }
    }

    /// The world seed.
    pub fn seed(&self) -> u64 {
        self.noise.seed()
    }

    /// The underlying noise source.
    pub fn noise(&self) -> &GradientNoise {
        &self.noise
    }

    /// Y of the topmost terrain block (the grass layer) in a column.
    pub fn surface_height(&self, x: i32, z: i32) -> i32 {
        let sample = self
            .noise
            .noise2d(x as f64 / HEIGHT_SCALE, z as f64 / HEIGHT_SCALE);
        (sample * HEIGHT_AMPLITUDE).floor() as i32 + BASE_HEIGHT
    }

    /// Whether the cave density carves out the cell at a world position.
    pub fn is_cave(&self, position: Point3<i32>, surface_height: i32) -> bool {
        if position.y <= CAVE_MIN_Y || position.y >= surface_height - 1 {
            return false;
        }
        let density = self.noise.noise3d(
            position.x as f64 * CAVE_FREQUENCY,
            position.y as f64 * CAVE_FREQUENCY,
            position.z as f64 * CAVE_FREQUENCY,
        );
        density > CAVE_THRESHOLD
    }

    /// The block type at a world position given its column's surface height,
    /// or `None` for air.
    pub fn block_type_at(&self, position: Point3<i32>, surface_height: i32) -> Option<BlockType> {
        let y = position.y;
        if y < 0 || y > surface_height {
            return None;
        }
        if y == 0 {
            return Some(BlockType::BEDROCK);
        }
        if self.is_cave(position, surface_height) {
            return None;
        }
        if y == surface_height {
            Some(BlockType::GRASS)
        } else if y >= surface_height - DIRT_DEPTH {
            Some(BlockType::DIRT)
        } else {
            Some(BlockType::STONE)
        }
    }

    /// Generates the complete chunk at `position`.
    ///
    /// # Errors
    /// Returns [`GenerationError::CoordinateOverflow`] when the chunk cannot be
    /// addressed with 32-bit world coordinates.
    pub fn generate(&self, position: Point3<i32>) -> Result<Chunk, GenerationError> {
        let origin = chunk_origin(position).ok_or(GenerationError::CoordinateOverflow(position))?;
        let mut cci = ChunkCreationIterator::new(position)?;

        // Column heights depend only on x and z
        let dimension = CHUNK_DIMENSION as usize;
        let mut heights = vec![0; dimension * dimension];
        for k in 0..CHUNK_DIMENSION {
            for i in 0..CHUNK_DIMENSION {
                heights[(k * CHUNK_DIMENSION + i) as usize] =
                    self.surface_height(origin.x + i, origin.z + k);
            }
        }

        // Highest block in the chunk, to skip noise for all-air chunks
        let top = heights.iter().copied().max().unwrap_or(i32::MIN);
        let all_air = origin.y > top || origin.y + CHUNK_DIMENSION - 1 < 0;

        for k in 0..CHUNK_DIMENSION {
            for _j in 0..CHUNK_DIMENSION {
                for i in 0..CHUNK_DIMENSION {
                    let block_type = match cci.current_world_position() {
                        Some(bposition) if !all_air => {
                            let height = heights[(k * CHUNK_DIMENSION + i) as usize];
                            self.block_type_at(bposition, height)
                        }
                        _ => None,
                    };
                    cci.push_block_type(block_type);
                }
            }
        }

        Ok(cci.return_chunk())
    }
}
