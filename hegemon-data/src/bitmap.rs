//! BMP decoding into the raw buffers the core's raster import consumes.
//!
//! The province bitmap is 24-bit colour; the terrain bitmap is 8-bit
//! indexed, and the palette *indices* are the data, so it is decoded
//! without palette expansion.

use image::ImageDecoder;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("failed to open bitmap {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to decode bitmap {path}: {source}")]
    Decode {
        path: String,
        source: image::ImageError,
    },
    #[error("mismatched province and terrain dimensions: {province_width}x{province_height} vs {terrain_width}x{terrain_height}")]
    DimensionMismatch {
        province_width: u32,
        province_height: u32,
        terrain_width: u32,
        terrain_height: u32,
    },
}

/// A decoded province-colour raster: top-down BGR byte triplets.
#[derive(Debug, Clone)]
pub struct ProvinceRaster {
    pub width: u32,
    pub height: u32,
    pub bgr: Vec<u8>,
}

/// A decoded terrain raster: top-down raw palette indices.
#[derive(Debug, Clone)]
pub struct TerrainRaster {
    pub width: u32,
    pub height: u32,
    pub indices: Vec<u8>,
}

fn open(path: &Path) -> Result<BufReader<File>, RasterError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| RasterError::Io {
            path: path.display().to_string(),
            source,
        })
}

fn decode_error(path: &Path) -> impl FnOnce(image::ImageError) -> RasterError + '_ {
    move |source| RasterError::Decode {
        path: path.display().to_string(),
        source,
    }
}

/// Load the 24-bit province bitmap and convert it to the BGR layout the
/// core's raster import expects.
pub fn load_province_bitmap(path: &Path) -> Result<ProvinceRaster, RasterError> {
    let decoder =
        image::codecs::bmp::BmpDecoder::new(open(path)?).map_err(decode_error(path))?;
    let (width, height) = decoder.dimensions();
    let rgb = image::DynamicImage::from_decoder(decoder)
        .map_err(decode_error(path))?
        .to_rgb8();

    let mut bgr = Vec::with_capacity(rgb.as_raw().len());
    for pixel in rgb.pixels() {
        bgr.extend_from_slice(&[pixel[2], pixel[1], pixel[0]]);
    }
    log::info!("loaded {}x{} province bitmap from {}", width, height, path.display());
    Ok(ProvinceRaster { width, height, bgr })
}

/// Load the 8-bit indexed terrain bitmap, keeping the raw palette indices.
pub fn load_terrain_bitmap(path: &Path) -> Result<TerrainRaster, RasterError> {
    let mut decoder =
        image::codecs::bmp::BmpDecoder::new(open(path)?).map_err(decode_error(path))?;
    decoder.set_indexed_color(true);
    let (width, height) = decoder.dimensions();
    let mut indices = vec![0u8; decoder.total_bytes() as usize];
    decoder
        .read_image(&mut indices)
        .map_err(decode_error(path))?;
    log::info!("loaded {}x{} terrain bitmap from {}", width, height, path.display());
    Ok(TerrainRaster {
        width,
        height,
        indices,
    })
}

/// Load both map rasters and cross-check their dimensions.
pub fn load_map_rasters(
    province_path: &Path,
    terrain_path: &Path,
) -> Result<(ProvinceRaster, TerrainRaster), RasterError> {
    let province = load_province_bitmap(province_path)?;
    let terrain = load_terrain_bitmap(terrain_path)?;
    if province.width != terrain.width || province.height != terrain.height {
        return Err(RasterError::DimensionMismatch {
            province_width: province.width,
            province_height: province.height,
            terrain_width: terrain.width,
            terrain_height: terrain.height,
        });
    }
    Ok((province, terrain))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::bmp::BmpEncoder;
    use image::ExtendedColorType;
    use tempfile::tempdir;

    fn write_bmp(path: &Path, pixels: &[u8], width: u32, height: u32, colour: ExtendedColorType) {
        let mut file = File::create(path).unwrap();
        BmpEncoder::new(&mut file)
            .encode(pixels, width, height, colour)
            .unwrap();
    }

    #[test]
    fn province_bitmap_roundtrips_to_bgr() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("provinces.bmp");
        // 2x1 RGB: red then blue.
        let rgb = [255u8, 0, 0, 0, 0, 255];
        write_bmp(&path, &rgb, 2, 1, ExtendedColorType::Rgb8);

        let raster = load_province_bitmap(&path).unwrap();
        assert_eq!((raster.width, raster.height), (2, 1));
        // Core expects BGR triplets.
        assert_eq!(raster.bgr, vec![0, 0, 255, 255, 0, 0]);
    }

    #[test]
    fn terrain_bitmap_keeps_palette_indices() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("terrain.bmp");
        let indices = [0u8, 3, 7, 3];
        write_bmp(&path, &indices, 4, 1, ExtendedColorType::L8);

        let raster = load_terrain_bitmap(&path).unwrap();
        assert_eq!((raster.width, raster.height), (4, 1));
        assert_eq!(raster.indices, vec![0, 3, 7, 3]);
    }

    #[test]
    fn mismatched_dimensions_rejected() {
        let dir = tempdir().unwrap();
        let province_path = dir.path().join("provinces.bmp");
        let terrain_path = dir.path().join("terrain.bmp");
        write_bmp(&province_path, &[255u8, 0, 0], 1, 1, ExtendedColorType::Rgb8);
        write_bmp(&terrain_path, &[0u8, 1], 2, 1, ExtendedColorType::L8);

        let result = load_map_rasters(&province_path, &terrain_path);
        assert!(matches!(result, Err(RasterError::DimensionMismatch { .. })));
    }
}
