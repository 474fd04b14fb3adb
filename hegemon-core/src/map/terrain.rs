//! Terrain types and the raster-index mapping.

use crate::modifier::ModifierId;
use crate::registry::{HasIdentifier, Registry};
use crate::types::colour::Colour;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TerrainTypeId(pub u16);

/// A terrain class with its map colour and terrain modifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainType {
    identifier: String,
    colour: Colour,
    /// The TERRAIN-type modifier applied to provinces with this terrain.
    modifier: Option<ModifierId>,
}

impl TerrainType {
    pub fn new(identifier: impl Into<String>, colour: Colour, modifier: Option<ModifierId>) -> Self {
        Self {
            identifier: identifier.into(),
            colour,
            modifier,
        }
    }

    pub fn colour(&self) -> Colour {
        self.colour
    }

    pub fn modifier(&self) -> Option<ModifierId> {
        self.modifier
    }
}

impl HasIdentifier for TerrainType {
    fn identifier(&self) -> &str {
        &self.identifier
    }
}

/// Terrain type registry plus the 8-bit raster index → terrain table used
/// by the shape-image import.
#[derive(Debug)]
pub struct TerrainTypeManager {
    terrain_types: Registry<TerrainType>,
    index_mapping: Vec<Option<TerrainTypeId>>,
    mappings_locked: bool,
}

impl Default for TerrainTypeManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TerrainTypeManager {
    pub fn new() -> Self {
        Self {
            terrain_types: Registry::new("terrain types"),
            index_mapping: vec![None; u8::MAX as usize + 1],
            mappings_locked: false,
        }
    }

    pub fn add_terrain_type(&mut self, terrain_type: TerrainType) -> bool {
        self.terrain_types.add(terrain_type)
    }

    pub fn lock_terrain_types(&mut self) {
        self.terrain_types.lock();
    }

    /// Map a raster palette index onto a terrain type.
    pub fn add_terrain_type_mapping(&mut self, index: u8, terrain: TerrainTypeId) -> bool {
        if self.mappings_locked {
            log::error!("terrain type mappings are locked");
            return false;
        }
        if self.terrain_types.by_index(terrain.0 as usize).is_none() {
            log::error!("terrain mapping for index {} references unknown terrain", index);
            return false;
        }
        if self.index_mapping[index as usize].is_some() {
            log::error!("duplicate terrain mapping for raster index {}", index);
            return false;
        }
        self.index_mapping[index as usize] = Some(terrain);
        true
    }

    pub fn lock_terrain_type_mappings(&mut self) {
        if self.mappings_locked {
            log::error!("terrain type mappings are already locked");
        } else {
            self.mappings_locked = true;
        }
    }

    pub fn terrain_type_mappings_are_locked(&self) -> bool {
        self.mappings_locked
    }

    pub fn terrain_for_index(&self, index: u8) -> Option<TerrainTypeId> {
        self.index_mapping[index as usize]
    }

    pub fn terrain_types(&self) -> &Registry<TerrainType> {
        &self.terrain_types
    }

    pub fn terrain_type(&self, id: TerrainTypeId) -> Option<&TerrainType> {
        self.terrain_types.by_index(id.0 as usize)
    }

    pub fn terrain_type_id(&self, identifier: &str) -> Option<TerrainTypeId> {
        self.terrain_types
            .index_of(identifier)
            .map(|i| TerrainTypeId(i as u16))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_requires_known_terrain() {
        let mut manager = TerrainTypeManager::new();
        assert!(!manager.add_terrain_type_mapping(0, TerrainTypeId(0)));
        assert!(manager.add_terrain_type(TerrainType::new(
            "plains",
            Colour::new(120, 180, 80),
            None
        )));
        assert!(manager.add_terrain_type_mapping(0, TerrainTypeId(0)));
        assert!(!manager.add_terrain_type_mapping(0, TerrainTypeId(0)));
        manager.lock_terrain_type_mappings();
        assert!(!manager.add_terrain_type_mapping(1, TerrainTypeId(0)));
        assert_eq!(manager.terrain_for_index(0), Some(TerrainTypeId(0)));
        assert_eq!(manager.terrain_for_index(1), None);
    }
}
