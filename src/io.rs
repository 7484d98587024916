//! Narrow load/store interface for arrays kept outside the process.
//!
//! The core never parses file formats itself. Readers and writers implement
//! [`ArrayReader`] / [`ArrayWriter`]; with the `image-io` feature,
//! [`GrayImageIo`] handles 8-bit grayscale images through the `image` crate.

use crate::data::Data;
use crate::util::{GalError, GalResult};
use std::collections::HashMap;
use std::path::Path;

/// Loads an array from a named source.
pub trait ArrayReader {
    /// Reads the array at `path`; `selector` picks an extension or member
    /// where the format has several.
    fn load(&self, path: &Path, selector: Option<&str>) -> GalResult<Data>;
}

/// Stores an array under a name.
pub trait ArrayWriter {
    fn store(&mut self, data: &Data, path: &Path) -> GalResult<()>;
}

/// In-memory array store keyed by path and selector.
#[derive(Debug, Default)]
pub struct MemoryArrays {
    arrays: HashMap<(String, Option<String>), Data>,
}

impl MemoryArrays {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    /// Stores `data` under `path` with an explicit selector.
    pub fn insert(&mut self, path: &Path, selector: Option<&str>, data: Data) {
        let key = (path.display().to_string(), selector.map(str::to_owned));
        self.arrays.insert(key, data);
    }
}

impl ArrayReader for MemoryArrays {
    fn load(&self, path: &Path, selector: Option<&str>) -> GalResult<Data> {
        let key = (path.display().to_string(), selector.map(str::to_owned));
        self.arrays
            .get(&key)
            .ok_or_else(|| GalError::Io {
                reason: format!("no array stored at {}", path.display()),
            })?
            .copy()
    }
}

impl ArrayWriter for MemoryArrays {
    fn store(&mut self, data: &Data, path: &Path) -> GalResult<()> {
        self.insert(path, None, data.copy()?);
        Ok(())
    }
}

#[cfg(feature = "image-io")]
pub use image_io::{data_from_gray_image, gray_image_from_data, load_gray_image, GrayImageIo};

#[cfg(feature = "image-io")]
mod image_io {
    use super::{ArrayReader, ArrayWriter};
    use crate::data::{Data, DataType};
    use crate::util::{GalError, GalResult};
    use std::path::Path;

    fn io_error(err: image::ImageError) -> GalError {
        GalError::Io {
            reason: err.to_string(),
        }
    }

    /// Copies a grayscale image into a `Float32` array of extents
    /// `[height, width]`.
    ///
    /// Image pixels have no blank value, so they are not stored as `UInt8`
    /// where 255 is the blank sentinel; every pixel, saturated ones included,
    /// stays a valid value.
    pub fn data_from_gray_image(img: &image::GrayImage) -> GalResult<Data> {
        let width = img.width() as usize;
        let height = img.height() as usize;
        let pixels: Vec<f32> = img.as_raw().iter().map(|&v| f32::from(v)).collect();
        Data::from_vec(pixels, &[height, width])
    }

    /// Builds a grayscale image from a 2D `UInt8` array.
    pub fn gray_image_from_data(data: &Data) -> GalResult<image::GrayImage> {
        data.require_type(DataType::UInt8, "grayscale image")?;
        let &[height, width] = data.dsize() else {
            return Err(GalError::NdimMismatch {
                expected: 2,
                got: data.ndim(),
            });
        };
        let pixels = data.as_slice::<u8>()?.to_vec();
        image::GrayImage::from_raw(width as u32, height as u32, pixels).ok_or(GalError::InvalidShape {
            reason: "image extents exceed the pixel buffer",
        })
    }

    /// Loads an image from disk as a grayscale `Float32` array.
    pub fn load_gray_image<P: AsRef<Path>>(path: P) -> GalResult<Data> {
        let img = image::open(path).map_err(io_error)?;
        data_from_gray_image(&img.to_luma8())
    }

    /// Reads and writes 8-bit grayscale images; the format follows the
    /// file extension. Stored arrays are converted to `UInt8`, so blank or
    /// out-of-range elements are written as 255.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct GrayImageIo;

    impl ArrayReader for GrayImageIo {
        fn load(&self, path: &Path, _selector: Option<&str>) -> GalResult<Data> {
            load_gray_image(path)
        }
    }

    impl ArrayWriter for GrayImageIo {
        fn store(&mut self, data: &Data, path: &Path) -> GalResult<()> {
            let converted;
            let data = if data.dtype() == DataType::UInt8 {
                data
            } else {
                converted = data.copy_to_type(DataType::UInt8)?;
                &converted
            };
            gray_image_from_data(data)?.save(path).map_err(io_error)
        }
    }
}
