use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use image::codecs::png::PngEncoder;
use image::{ImageEncoder, ImageError, RgbaImage};

use crate::canvas::TEXTURE_SIZE;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug)]
pub enum AssetError {
    Io(std::io::Error),
    /// The data is not an image format we can decode.
    UnsupportedType(String),
    Decode(ImageError),
    Encode(ImageError),
}

impl std::fmt::Display for AssetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetError::Io(e) => write!(f, "I/O error: {}", e),
            AssetError::UnsupportedType(what) => write!(f, "Not an image file: {}", what),
            AssetError::Decode(e) => write!(f, "Could not decode image: {}", e),
            AssetError::Encode(e) => write!(f, "Could not encode PNG: {}", e),
        }
    }
}

impl std::error::Error for AssetError {}

impl From<std::io::Error> for AssetError {
    fn from(e: std::io::Error) -> Self {
        AssetError::Io(e)
    }
}

// ============================================================================
// LOADING
// ============================================================================

/// A decoded base image plus a user-facing warning when it is not skin-sized.
#[derive(Clone, Debug)]
pub struct LoadedImage {
    pub image: RgbaImage,
    pub warning: Option<String>,
}

/// Decode an in-memory image.  Anything `image` cannot recognise is rejected
/// outright; wrong dimensions only produce a warning.
pub fn load_image_bytes(bytes: &[u8]) -> Result<LoadedImage, AssetError> {
    let format = image::guess_format(bytes)
        .map_err(|_| AssetError::UnsupportedType(format!("{} bytes of unknown data", bytes.len())))?;
    let image = image::load_from_memory_with_format(bytes, format)
        .map_err(AssetError::Decode)?
        .to_rgba8();

    let warning = if image.dimensions() != (TEXTURE_SIZE, TEXTURE_SIZE) {
        let msg = format!(
            "Image is {}x{}; skins are {}x{} and it will be resized",
            image.width(),
            image.height(),
            TEXTURE_SIZE,
            TEXTURE_SIZE
        );
        log_warn!("{}", msg);
        Some(msg)
    } else {
        None
    };

    Ok(LoadedImage { image, warning })
}

pub fn load_image_file(path: &Path) -> Result<LoadedImage, AssetError> {
    let bytes = std::fs::read(path)?;
    load_image_bytes(&bytes).map_err(|e| match e {
        AssetError::UnsupportedType(_) => AssetError::UnsupportedType(path.display().to_string()),
        other => other,
    })
}

// ============================================================================
// EXPORT
// ============================================================================

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, AssetError> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ColorType::Rgba8,
        )
        .map_err(AssetError::Encode)?;
    Ok(buf)
}

pub fn export_png(image: &RgbaImage, path: &Path) -> Result<(), AssetError> {
    let bytes = encode_png(image)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(&bytes)?;
    writer.flush()?;
    log_info!("Exported {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// `HytaleSkin_<unix millis>.png`
pub fn export_file_name(unix_millis: u128) -> String {
    format!("HytaleSkin_{}.png", unix_millis)
}

pub fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// Export into `dir` under a timestamped file name; returns the full path.
pub fn export_png_to_dir(image: &RgbaImage, dir: &Path) -> Result<PathBuf, AssetError> {
    let path = dir.join(export_file_name(unix_millis()));
    export_png(image, &path)?;
    Ok(path)
}
