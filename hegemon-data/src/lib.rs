//! # Hegemon data ingestion
//!
//! The thin shell between files on disk and the simulation core: decodes
//! the province and terrain bitmaps into raw pixel buffers and parses the
//! semicolon-delimited tabular sources into typed records. The core never
//! opens files; everything it consumes arrives through this crate (or an
//! equivalent collaborator).

pub mod bitmap;
pub mod tabular;

pub use bitmap::{
    load_map_rasters, load_province_bitmap, load_terrain_bitmap, ProvinceRaster, RasterError,
    TerrainRaster,
};
pub use tabular::{
    load_adjacencies_csv, load_definition_csv, parse_adjacency_records, parse_definition_records,
};

use anyhow::{bail, Result};
use hegemon_core::MapDefinition;
use std::path::Path;

/// Build a [`MapDefinition`]'s provinces, shape image and adjacencies from
/// the four standard map files plus the water province list. Terrain types
/// and their raster mappings must already be configured on the definition.
pub fn load_map(
    map: &mut MapDefinition,
    definition_csv: &Path,
    water_provinces: &[&str],
    province_bmp: &Path,
    terrain_bmp: &Path,
    adjacencies_csv: &Path,
) -> Result<()> {
    let records = load_definition_csv(definition_csv)?;
    if !map.load_province_definitions(&records) {
        bail!("province definition table had fatal errors");
    }
    if !map.set_water_province_list(water_provinces) {
        bail!("water province list had fatal errors");
    }

    let (province, terrain) = load_map_rasters(province_bmp, terrain_bmp)?;
    if !map.import_raster(
        &province.bgr,
        &terrain.indices,
        province.width,
        province.height,
        false,
    ) {
        bail!("raster import failed");
    }
    map.generate_standard_adjacencies();

    let adjacency_records = load_adjacencies_csv(adjacencies_csv)?;
    if !map.load_adjacency_records(&adjacency_records) {
        bail!("adjacency table had fatal errors");
    }
    Ok(())
}
