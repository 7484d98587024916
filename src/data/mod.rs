//! Typed N-dimensional arrays.
//!
//! [`Data`] owns a buffer whose element type is only known at runtime
//! ([`DataType`]). Algorithms are written once, generic over [`Element`], and
//! reached through a single type switch at the array boundary. Zero-copy
//! views into a block are [`DataView`]s; they borrow the block, so a block
//! can never be dropped while a view into it is alive.

pub mod convert;
pub mod storage;
pub mod types;
pub mod view;
pub mod wcs;

pub use storage::{MappedBuffer, Storage};
pub use types::{DataType, Element, BLANK_STRING};
pub use view::{DataView, Tile, TileIndices};
pub use wcs::Wcs;

use crate::dimension;
use crate::trace::trace_event;
use crate::util::{GalError, GalResult};
use std::fmt;
use types::{with_buffer, with_dtype};

/// Type-tagged element buffer.
pub enum Buffer {
    UInt8(Storage<u8>),
    Int8(Storage<i8>),
    UInt16(Storage<u16>),
    Int16(Storage<i16>),
    UInt32(Storage<u32>),
    Int32(Storage<i32>),
    UInt64(Storage<u64>),
    Int64(Storage<i64>),
    Float32(Storage<f32>),
    Float64(Storage<f64>),
    String(Vec<String>),
}

impl Buffer {
    pub fn dtype(&self) -> DataType {
        match self {
            Buffer::UInt8(_) => DataType::UInt8,
            Buffer::Int8(_) => DataType::Int8,
            Buffer::UInt16(_) => DataType::UInt16,
            Buffer::Int16(_) => DataType::Int16,
            Buffer::UInt32(_) => DataType::UInt32,
            Buffer::Int32(_) => DataType::Int32,
            Buffer::UInt64(_) => DataType::UInt64,
            Buffer::Int64(_) => DataType::Int64,
            Buffer::Float32(_) => DataType::Float32,
            Buffer::Float64(_) => DataType::Float64,
            Buffer::String(_) => DataType::String,
        }
    }

    /// Number of allocated elements (may exceed the logical size).
    fn capacity(&self) -> usize {
        with_buffer!(self, s => s.len(), string(v) => v.len())
    }

    fn is_mapped(&self) -> bool {
        with_buffer!(self, s => s.is_mapped(), string(_v) => false)
    }
}

/// Initial contents of a freshly allocated array.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Init {
    /// Every element is zero (empty strings for string arrays).
    #[default]
    Zeros,
    /// Every element is the type's blank value.
    Blank,
}

/// Allocation options shared by every constructor that allocates.
#[derive(Clone, Debug)]
pub struct AllocOptions {
    /// Initial contents.
    pub init: Init,
    /// Payloads larger than this many bytes are placed in a memory-mapped
    /// temporary file instead of RAM.
    pub minmapsize: usize,
    /// Do not announce creation/removal of memory-mapped files.
    pub quietmmap: bool,
}

impl Default for AllocOptions {
    fn default() -> Self {
        Self {
            init: Init::Zeros,
            minmapsize: usize::MAX,
            quietmmap: true,
        }
    }
}

impl AllocOptions {
    /// Options with blank-filled contents.
    pub fn blank() -> Self {
        Self {
            init: Init::Blank,
            ..Self::default()
        }
    }
}

/// Typed N-dimensional array with optional metadata.
pub struct Data {
    buffer: Buffer,
    dsize: Vec<usize>,
    size: usize,
    minmapsize: usize,
    quietmmap: bool,
    /// World-coordinate metadata, carried structurally.
    pub wcs: Option<Wcs>,
    pub name: Option<String>,
    pub unit: Option<String>,
    pub comment: Option<String>,
}

impl Data {
    /// Allocates an array of `dtype` with extents `dsize` (slowest first).
    pub fn alloc(dtype: DataType, dsize: &[usize], opts: &AllocOptions) -> GalResult<Self> {
        let size = dimension::total_size(dsize)?;
        size.checked_mul(dtype.size_of())
            .ok_or_else(|| GalError::SizeOverflow {
                dsize: dsize.to_vec(),
            })?;
        let buffer = with_dtype!(dtype, T => {
            let fill = match opts.init {
                Init::Zeros => <T as Element>::ZERO,
                Init::Blank => <T as Element>::BLANK,
            };
            T::into_buffer(Storage::alloc(size, fill, opts.minmapsize, opts.quietmmap)?)
        }, string => {
            let fill = match opts.init {
                Init::Zeros => String::new(),
                Init::Blank => BLANK_STRING.to_string(),
            };
            Buffer::String(vec![fill; size])
        });
        if buffer.is_mapped() {
            trace_event!("alloc_mapped", size = size, bytes = size * dtype.size_of());
        }
        Ok(Self::from_parts(buffer, dsize.to_vec(), size, opts))
    }

    /// Wraps caller-provided values without copying.
    pub fn from_vec<T: Element>(values: Vec<T>, dsize: &[usize]) -> GalResult<Self> {
        let size = dimension::total_size(dsize)?;
        if values.len() != size {
            return Err(GalError::SizeMismatch {
                expected: size,
                got: values.len(),
                context: "from_vec",
            });
        }
        let buffer = T::into_buffer(Storage::Ram(values));
        Ok(Self::from_parts(
            buffer,
            dsize.to_vec(),
            size,
            &AllocOptions::default(),
        ))
    }

    /// Wraps caller-provided strings without copying.
    pub fn from_strings(values: Vec<String>, dsize: &[usize]) -> GalResult<Self> {
        let size = dimension::total_size(dsize)?;
        if values.len() != size {
            return Err(GalError::SizeMismatch {
                expected: size,
                got: values.len(),
                context: "from_strings",
            });
        }
        Ok(Self::from_parts(
            Buffer::String(values),
            dsize.to_vec(),
            size,
            &AllocOptions::default(),
        ))
    }

    /// Builds a single-element array holding `value`.
    pub fn scalar<T: Element>(value: T) -> Self {
        Self::from_parts(
            T::into_buffer(Storage::Ram(vec![value])),
            vec![1],
            1,
            &AllocOptions::default(),
        )
    }

    pub(crate) fn from_parts(
        buffer: Buffer,
        dsize: Vec<usize>,
        size: usize,
        opts: &AllocOptions,
    ) -> Self {
        debug_assert!(buffer.capacity() >= size);
        Self {
            buffer,
            dsize,
            size,
            minmapsize: opts.minmapsize,
            quietmmap: opts.quietmmap,
            wcs: None,
            name: None,
            unit: None,
            comment: None,
        }
    }

    /// Options that reproduce this array's storage policy.
    pub fn alloc_options(&self, init: Init) -> AllocOptions {
        AllocOptions {
            init,
            minmapsize: self.minmapsize,
            quietmmap: self.quietmmap,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_wcs(mut self, wcs: Wcs) -> Self {
        self.wcs = Some(wcs);
        self
    }

    pub fn dtype(&self) -> DataType {
        self.buffer.dtype()
    }

    pub fn ndim(&self) -> usize {
        self.dsize.len()
    }

    /// Extents per dimension, slowest-varying first.
    pub fn dsize(&self) -> &[usize] {
        &self.dsize
    }

    /// Logical number of elements.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of elements the buffer can hold without reallocating.
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn minmapsize(&self) -> usize {
        self.minmapsize
    }

    /// Returns true when the elements live in a memory-mapped file.
    pub fn is_mapped(&self) -> bool {
        self.buffer.is_mapped()
    }

    /// Path of the backing file for disk-mapped arrays.
    pub fn mmap_path(&self) -> Option<&std::path::Path> {
        with_buffer!(&self.buffer, s => match s {
            Storage::Mapped(m) => Some(m.path()),
            Storage::Ram(_) => None,
        }, string(_v) => None)
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// Borrows the elements as `T`, failing if the array holds another type.
    pub fn as_slice<T: Element>(&self) -> GalResult<&[T]> {
        T::storage(&self.buffer)
            .map(|s| &s[..self.size])
            .ok_or(GalError::TypeMismatch {
                expected: T::DTYPE,
                got: self.dtype(),
                context: "as_slice",
            })
    }

    /// Mutably borrows the elements as `T`.
    pub fn as_mut_slice<T: Element>(&mut self) -> GalResult<&mut [T]> {
        let size = self.size;
        let got = self.dtype();
        T::storage_mut(&mut self.buffer)
            .map(|s| &mut s[..size])
            .ok_or(GalError::TypeMismatch {
                expected: T::DTYPE,
                got,
                context: "as_mut_slice",
            })
    }

    /// Borrows the elements of a string array.
    pub fn strings(&self) -> GalResult<&[String]> {
        match &self.buffer {
            Buffer::String(v) => Ok(&v[..self.size]),
            other => Err(GalError::TypeMismatch {
                expected: DataType::String,
                got: other.dtype(),
                context: "strings",
            }),
        }
    }

    /// Fails with `TypeMismatch` unless the array holds `expected`.
    pub fn require_type(&self, expected: DataType, context: &'static str) -> GalResult<()> {
        if self.dtype() == expected {
            Ok(())
        } else {
            Err(GalError::TypeMismatch {
                expected,
                got: self.dtype(),
                context,
            })
        }
    }

    /// Number of blank elements.
    pub fn count_blank(&self) -> usize {
        with_buffer!(&self.buffer,
            s => s[..self.size].iter().filter(|v| v.is_blank()).count(),
            string(v) => v[..self.size].iter().filter(|s| s.as_str() == BLANK_STRING).count())
    }

    pub fn has_blank(&self) -> bool {
        self.count_blank() > 0
    }

    /// Changes the logical shape within the allocated capacity.
    ///
    /// Used to grow an array back after [`Data::copy_into`] shrank it.
    pub fn reshape(&mut self, dsize: &[usize]) -> GalResult<()> {
        let size = dimension::total_size(dsize)?;
        if size > self.capacity() {
            return Err(GalError::SizeMismatch {
                expected: self.capacity(),
                got: size,
                context: "reshape beyond capacity",
            });
        }
        self.dsize = dsize.to_vec();
        self.size = size;
        Ok(())
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut Buffer {
        &mut self.buffer
    }

    /// Copies metadata (names, WCS) from another array.
    pub(crate) fn copy_meta_from(&mut self, other: &Data) {
        self.wcs = other.wcs.clone();
        self.name = other.name.clone();
        self.unit = other.unit.clone();
        self.comment = other.comment.clone();
    }
}

impl fmt::Debug for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Data")
            .field("dtype", &self.dtype())
            .field("dsize", &self.dsize)
            .field("size", &self.size)
            .field("mapped", &self.is_mapped())
            .field("name", &self.name)
            .finish()
    }
}
