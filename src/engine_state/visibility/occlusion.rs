//! Face occlusion.
//!
//! A face is drawable unless the neighboring cell holds an opaque block.
//! Neighbors in chunks that are not resident count as empty, so chunk
//! boundaries toward unloaded space stay drawable until the neighbor arrives
//! and marks this chunk dirty.

use cgmath::Point3;

use crate::engine_state::voxels::block::{
    block_side::{BlockSide, FaceMask},
    Block,
};
use crate::engine_state::voxels::chunk_store::ChunkStore;

/// Drawable faces of `block` given its current neighbors.
pub fn compute_face_mask(store: &ChunkStore, block: &Block) -> FaceMask {
    let mut mask = FaceMask::NONE;
    for side in BlockSide::all() {
        let normal = side.normal();
        let neighbor = (|| {
            Some(Point3::new(
                block.position.x.checked_add(normal.x)?,
                block.position.y.checked_add(normal.y)?,
                block.position.z.checked_add(normal.z)?,
            ))
        })();
        let hidden = neighbor.is_some_and(|neighbor| store.is_opaque(neighbor));
        if !hidden {
            mask.insert(side);
        }
    }
    mask
}

/// Recomputes face masks for every block of one chunk. Returns how many
/// blocks were visited.
pub fn recompute_chunk(store: &mut ChunkStore, coordinate: Point3<i32>) -> usize {
    let Some(chunk) = store.chunk(coordinate) else {
        return 0;
    };
    let masks: Vec<(Point3<i32>, FaceMask)> = chunk
        .blocks()
        .map(|block| (block.position, compute_face_mask(store, block)))
        .collect();

    let Some(chunk) = store.chunk_mut(coordinate) else {
        return 0;
    };
    for (position, mask) in &masks {
        if let Some(block) = chunk.get_block_mut(*position) {
            block.faces = *mask;
        }
    }
    masks.len()
}

/// Recomputes every dirty chunk. Returns the number of chunks processed.
pub fn recompute_dirty(store: &mut ChunkStore) -> usize {
    let dirty = store.take_dirty();
    for coordinate in &dirty {
        recompute_chunk(store, *coordinate);
    }
    if !dirty.is_empty() {
        log::trace!("Recomputed occlusion for {} chunks", dirty.len());
    }
    dirty.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::block_type::BlockType;
    use crate::engine_state::voxels::chunk::Chunk;

    #[test]
    fn buried_block_is_fully_occluded() {
        let mut store = ChunkStore::new();
        store.insert_chunk(Chunk::empty(Point3::new(0, 0, 0)));
        for x in 1..=3 {
            for y in 1..=3 {
                for z in 1..=3 {
                    store.place_block(Point3::new(x, y, z), BlockType::STONE).unwrap();
                }
            }
        }
        recompute_dirty(&mut store);

        let center = store.get_block(Point3::new(2, 2, 2)).unwrap();
        assert!(center.is_occluded());
        let corner = store.get_block(Point3::new(1, 1, 1)).unwrap();
        assert_eq!(corner.faces.count(), 3);
        assert!(corner.faces.contains(BlockSide::LEFT));
        assert!(corner.faces.contains(BlockSide::BOTTOM));
        assert!(corner.faces.contains(BlockSide::BACK));
    }

    #[test]
    fn transparent_neighbors_do_not_hide_faces() {
        let mut store = ChunkStore::new();
        store.insert_chunk(Chunk::empty(Point3::new(0, 0, 0)));
        store.place_block(Point3::new(4, 4, 4), BlockType::STONE).unwrap();
        store.place_block(Point3::new(5, 4, 4), BlockType::GLASS).unwrap();
        recompute_dirty(&mut store);
        let stone = store.get_block(Point3::new(4, 4, 4)).unwrap();
        assert!(stone.faces.contains(BlockSide::RIGHT));
        let glass = store.get_block(Point3::new(5, 4, 4)).unwrap();
        assert!(!glass.faces.contains(BlockSide::LEFT));
    }

    #[test]
    fn unloaded_neighbors_leave_boundary_faces_drawable() {
        let mut store = ChunkStore::new();
        store.insert_chunk(Chunk::empty(Point3::new(0, 0, 0)));
        store.place_block(Point3::new(15, 0, 0), BlockType::STONE).unwrap();
        recompute_dirty(&mut store);
        assert!(store
            .get_block(Point3::new(15, 0, 0))
            .unwrap()
            .faces
            .contains(BlockSide::RIGHT));

        let mut neighbor = Chunk::empty(Point3::new(1, 0, 0));
        neighbor.set_block(Block::new(BlockType::STONE, Point3::new(16, 0, 0)));
        store.insert_chunk(neighbor);
        recompute_dirty(&mut store);
        assert!(!store
            .get_block(Point3::new(15, 0, 0))
            .unwrap()
            .faces
            .contains(BlockSide::RIGHT));
    }
}
