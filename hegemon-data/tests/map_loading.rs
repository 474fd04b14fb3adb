//! End-to-end map loading: CSV and BMP files on disk through to a built
//! map definition.

use hegemon_core::map::{AdjacencyKind, ProvinceIndex, TerrainType, TerrainTypeId};
use hegemon_core::{Colour, Fixed, MapDefinition};
use image::codecs::bmp::BmpEncoder;
use image::ExtendedColorType;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;

const RED: Colour = Colour { r: 255, g: 0, b: 0 };
const GREEN: Colour = Colour { r: 0, g: 255, b: 0 };
const BLUE: Colour = Colour { r: 0, g: 0, b: 255 };

fn write_bmp(path: &Path, pixels: &[u8], width: u32, height: u32, colour: ExtendedColorType) {
    let mut file = File::create(path).unwrap();
    BmpEncoder::new(&mut file)
        .encode(pixels, width, height, colour)
        .unwrap();
}

fn rgb_row(colours: &[Colour]) -> Vec<u8> {
    colours.iter().flat_map(|c| [c.r, c.g, c.b]).collect()
}

#[test]
fn load_map_from_files() {
    let dir = tempdir().unwrap();

    let definition_csv = dir.path().join("definition.csv");
    File::create(&definition_csv)
        .unwrap()
        .write_all(b"province;red;green;blue\nheartland;255;0;0\nmarches;0;255;0\ndeep_sea;0;0;255\n")
        .unwrap();

    // 4x2 world: a 2x2 heartland, a 1x2 marches column, a 1x2 sea column.
    let province_bmp = dir.path().join("provinces.bmp");
    let mut pixels = rgb_row(&[RED, RED, GREEN, BLUE]);
    pixels.extend(rgb_row(&[RED, RED, GREEN, BLUE]));
    write_bmp(&province_bmp, &pixels, 4, 2, ExtendedColorType::Rgb8);

    let terrain_bmp = dir.path().join("terrain.bmp");
    write_bmp(&terrain_bmp, &[0u8; 8], 4, 2, ExtendedColorType::L8);

    // Convert the heartland-marches land border into a strait through the
    // sea province.
    let adjacencies_csv = dir.path().join("adjacencies.csv");
    File::create(&adjacencies_csv)
        .unwrap()
        .write_all(b"From;To;Type;Through;Data\nheartland;marches;sea;deep_sea;0\n-1;-1;;;\n")
        .unwrap();

    let mut map = MapDefinition::new();
    let terrain_manager = map.terrain_type_manager_mut();
    assert!(terrain_manager.add_terrain_type(TerrainType::new(
        "plains",
        Colour::new(120, 180, 80),
        None
    )));
    assert!(terrain_manager.add_terrain_type_mapping(0, TerrainTypeId(0)));
    terrain_manager.lock_terrain_types();
    terrain_manager.lock_terrain_type_mappings();

    hegemon_data::load_map(
        &mut map,
        &definition_csv,
        &["deep_sea"],
        &province_bmp,
        &terrain_bmp,
        &adjacencies_csv,
    )
    .unwrap();

    assert_eq!(map.province_count(), 3);
    let heartland = map.province_index("heartland").unwrap();
    let marches = map.province_index("marches").unwrap();
    let deep_sea = map.province_index("deep_sea").unwrap();
    assert_eq!(heartland, ProvinceIndex(1));

    // Raster-derived geometry.
    let heartland_def = map.province(heartland).unwrap();
    assert!(heartland_def.is_on_map());
    assert_eq!(heartland_def.pixel_count(), 4);
    assert_eq!(heartland_def.centre().x, Fixed::HALF);
    assert_eq!(heartland_def.terrain(), Some(TerrainTypeId(0)));
    assert!(map.province(deep_sea).unwrap().is_water());

    // The tabular strait replaced the pixel-derived land border, in both
    // directions, with the sea province as its through.
    let strait = map
        .adjacencies_of(heartland)
        .iter()
        .find(|adjacency| adjacency.to == marches)
        .copied()
        .unwrap();
    assert_eq!(strait.kind, AdjacencyKind::Strait);
    assert_eq!(strait.through, Some(deep_sea));
    let reverse = map
        .adjacencies_of(marches)
        .iter()
        .find(|adjacency| adjacency.to == heartland)
        .copied()
        .unwrap();
    assert_eq!(reverse.kind, AdjacencyKind::Strait);

    // The sea column still borders both land columns coastally (the wrap
    // connects it to the heartland's west edge).
    assert!(map
        .adjacencies_of(deep_sea)
        .iter()
        .any(|adjacency| adjacency.to == heartland && adjacency.kind == AdjacencyKind::Coastal));
}
