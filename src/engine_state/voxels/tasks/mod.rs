//! # Voxel Task System
//!
//! Tasks related to voxel world generation, run on the chunk worker pool.

pub mod chunk_generation_task;
