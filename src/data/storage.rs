//! Element storage: RAM vectors or memory-mapped temporary files.
//!
//! A buffer whose payload exceeds the caller's `minmapsize` threshold is
//! placed in a temporary file and mapped into memory. Each mapping gets its
//! own uniquely named file, so arrays never contend over the filesystem. The
//! file is unlinked when the storage is dropped.

use crate::trace::trace_event;
use crate::util::{GalError, GalResult};
use memmap2::MmapMut;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use tempfile::TempPath;

/// Typed element storage owned by a [`crate::Data`].
pub enum Storage<T> {
    Ram(Vec<T>),
    Mapped(MappedBuffer<T>),
}

impl<T: bytemuck::Pod> Storage<T> {
    /// Allocates `len` elements filled with `fill`, on disk when the payload
    /// exceeds `minmapsize` bytes.
    pub(crate) fn alloc(len: usize, fill: T, minmapsize: usize, quiet: bool) -> GalResult<Self> {
        let bytes = len
            .checked_mul(std::mem::size_of::<T>())
            .ok_or_else(|| GalError::SizeOverflow { dsize: vec![len] })?;
        if bytes > minmapsize {
            let mut mapped = MappedBuffer::create(len, quiet)?;
            if bytemuck::bytes_of(&fill).iter().any(|&b| b != 0) {
                mapped.fill(fill);
            }
            return Ok(Storage::Mapped(mapped));
        }
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|err| GalError::Allocation {
                reason: err.to_string(),
            })?;
        data.resize(len, fill);
        Ok(Storage::Ram(data))
    }

    /// Copies `values` into fresh storage, honouring `minmapsize`.
    pub(crate) fn from_slice(values: &[T], minmapsize: usize, quiet: bool) -> GalResult<Self> {
        let bytes = std::mem::size_of_val(values);
        if bytes > minmapsize {
            let mut mapped = MappedBuffer::create(values.len(), quiet)?;
            mapped.copy_from_slice(values);
            return Ok(Storage::Mapped(mapped));
        }
        Ok(Storage::Ram(values.to_vec()))
    }

    /// Takes ownership of `values`, moving them to disk when they exceed
    /// `minmapsize` bytes.
    pub(crate) fn from_vec(values: Vec<T>, minmapsize: usize, quiet: bool) -> GalResult<Self> {
        if std::mem::size_of_val(values.as_slice()) > minmapsize {
            return Self::from_slice(&values, minmapsize, quiet);
        }
        Ok(Storage::Ram(values))
    }

    /// Returns true when the elements live in a mapped temporary file.
    pub fn is_mapped(&self) -> bool {
        matches!(self, Storage::Mapped(_))
    }
}

impl<T: bytemuck::Pod> Deref for Storage<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        match self {
            Storage::Ram(v) => v,
            Storage::Mapped(m) => m,
        }
    }
}

impl<T: bytemuck::Pod> DerefMut for Storage<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        match self {
            Storage::Ram(v) => v,
            Storage::Mapped(m) => m,
        }
    }
}

/// Elements backed by a memory-mapped temporary file.
pub struct MappedBuffer<T> {
    // Field order matters: the map is released before the file is removed.
    map: MmapMut,
    path: TempPath,
    len: usize,
    quiet: bool,
    _marker: PhantomData<T>,
}

impl<T: bytemuck::Pod> MappedBuffer<T> {
    fn create(len: usize, quiet: bool) -> GalResult<Self> {
        let bytes = len * std::mem::size_of::<T>();
        let io_err = |err: std::io::Error| GalError::Allocation {
            reason: err.to_string(),
        };
        let file = tempfile::Builder::new()
            .prefix("galdata-mmap-")
            .tempfile()
            .map_err(io_err)?;
        file.as_file().set_len(bytes as u64).map_err(io_err)?;
        // SAFETY: the file was just created by us and is only reachable
        // through this mapping for its whole lifetime.
        let map = unsafe { MmapMut::map_mut(file.as_file()) }.map_err(io_err)?;
        let (_file, path) = file.into_parts();
        if !quiet {
            let name = path.to_string_lossy().into_owned();
            trace_event!("mmap_created", path = name.as_str(), bytes = bytes);
        }
        Ok(Self {
            map,
            path,
            len,
            quiet,
            _marker: PhantomData,
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl<T: bytemuck::Pod> Deref for MappedBuffer<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        let bytes = self.len * std::mem::size_of::<T>();
        bytemuck::cast_slice(&self.map[..bytes])
    }
}

impl<T: bytemuck::Pod> DerefMut for MappedBuffer<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        let bytes = self.len * std::mem::size_of::<T>();
        bytemuck::cast_slice_mut(&mut self.map[..bytes])
    }
}

impl<T> Drop for MappedBuffer<T> {
    fn drop(&mut self) {
        if !self.quiet {
            let name = self.path.to_string_lossy().into_owned();
            trace_event!("mmap_removed", path = name.as_str());
        }
    }
}
