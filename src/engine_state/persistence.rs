//! # Save Payloads
//!
//! A save holds what cannot be regenerated: the player's block modifications
//! in the order they were made, and the player's pose. Terrain is rebuilt
//! from the seed, so it is never written.
//!
//! Payloads are JSON through `serde_json`.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use cgmath::Point3;
use serde::{Deserialize, Serialize};

use crate::engine_state::voxels::chunk_store::Modification;
use crate::error::PersistenceError;

/// One modified position.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModificationRecord {
    /// World block coordinate
    pub position: [i32; 3],
    /// What happened there
    pub modification: Modification,
}

impl ModificationRecord {
    /// Builds a record from a diff entry.
    pub fn new(position: Point3<i32>, modification: Modification) -> Self {
        ModificationRecord {
            position: [position.x, position.y, position.z],
            modification,
        }
    }

    /// Back to a diff entry.
    pub fn entry(&self) -> (Point3<i32>, Modification) {
        (Point3::from(self.position), self.modification)
    }
}

/// Player position and look direction.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerPose {
    /// Center of the player's collision box
    pub position: [f32; 3],
    /// Degrees
    pub yaw: f32,
    /// Degrees, positive looks down
    pub pitch: f32,
}

/// Everything written to a save.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavePayload {
    /// World seed the modifications apply to
    pub seed: u64,
    /// Modifications in insertion order
    pub modifications: Vec<ModificationRecord>,
    /// Player pose at save time
    pub player: PlayerPose,
}

/// Writes a payload as JSON.
pub fn write_save<W: Write>(writer: W, payload: &SavePayload) -> Result<(), PersistenceError> {
    serde_json::to_writer_pretty(writer, payload)?;
    Ok(())
}

/// Reads a JSON payload.
pub fn read_save<R: Read>(reader: R) -> Result<SavePayload, PersistenceError> {
    Ok(serde_json::from_reader(reader)?)
}

/// Writes a payload to a file, replacing it.
pub fn save_to_path(path: &Path, payload: &SavePayload) -> Result<(), PersistenceError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_save(&mut writer, payload)?;
    writer.flush()?;
    log::info!(
        "Saved {} modifications to {}",
        payload.modifications.len(),
        path.display()
    );
    Ok(())
}

/// Reads a payload from a file.
pub fn load_from_path(path: &Path) -> Result<SavePayload, PersistenceError> {
    let payload = read_save(BufReader::new(File::open(path)?))?;
    log::info!(
        "Loaded {} modifications from {}",
        payload.modifications.len(),
        path.display()
    );
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::block_type::BlockType;

    #[test]
    fn payload_survives_a_round_trip() {
        let payload = SavePayload {
            seed: 42,
            modifications: vec![
                ModificationRecord::new(Point3::new(3, 5, 3), Modification::Removed),
                ModificationRecord::new(Point3::new(-1, 7, 2), Modification::Placed(BlockType::WOOD)),
            ],
            player: PlayerPose {
                position: [0.5, 40.0, -2.25],
                yaw: 270.0,
                pitch: -12.5,
            },
        };
        let mut bytes = Vec::new();
        write_save(&mut bytes, &payload).unwrap();
        assert_eq!(read_save(bytes.as_slice()).unwrap(), payload);
    }

    #[test]
    fn malformed_payload_is_an_error() {
        let result = read_save("{\"seed\": 1}".as_bytes());
        assert!(matches!(result, Err(PersistenceError::Json(_))));
    }

    #[test]
    fn records_convert_back_to_entries() {
        let record = ModificationRecord::new(Point3::new(1, 2, 3), Modification::Removed);
        assert_eq!(record.entry(), (Point3::new(1, 2, 3), Modification::Removed));
    }
}
