//! Copies and element-type conversion.
//!
//! Blank elements always convert to the destination type's blank instead of
//! being cast numerically. Copying a view yields a contiguous array holding
//! only the viewed region.

use crate::data::types::{with_buffer, with_dtype};
use crate::data::{AllocOptions, Buffer, Data, DataType, Element, Init, Storage, BLANK_STRING};
use crate::util::{GalError, GalResult};

fn convert_values<S: Element, D: Element>(src: &[S], indices: Option<&[usize]>) -> Vec<D> {
    match indices {
        Some(idx) => idx.iter().map(|&i| D::convert_from(src[i])).collect(),
        None => src.iter().map(|&v| D::convert_from(v)).collect(),
    }
}

fn format_value<S: Element>(value: S) -> String {
    if value.is_blank() {
        BLANK_STRING.to_string()
    } else {
        format!("{value:?}")
    }
}

fn parse_value<D: Element>(text: &str) -> D {
    text.trim()
        .parse::<f64>()
        .map(D::convert_from)
        .unwrap_or(D::BLANK)
}

fn pick<'a, T>(src: &'a [T], indices: Option<&'a [usize]>) -> Box<dyn Iterator<Item = &'a T> + 'a> {
    match indices {
        Some(idx) => Box::new(idx.iter().map(move |&i| &src[i])),
        None => Box::new(src.iter()),
    }
}

/// Builds a buffer of `dtype` from `src`, optionally restricted to `indices`.
fn convert_buffer(
    src: &Data,
    indices: Option<&[usize]>,
    dtype: DataType,
    opts: &AllocOptions,
) -> GalResult<Buffer> {
    let size = src.size();
    let buffer = with_buffer!(src.buffer(), s => {
        let values = &s[..size];
        with_dtype!(dtype, D => {
            let out: Vec<D> = convert_values(values, indices);
            D::into_buffer(Storage::from_vec(out, opts.minmapsize, opts.quietmmap)?)
        }, string => {
            Buffer::String(pick(values, indices).map(|&v| format_value(v)).collect())
        })
    }, string(strs) => {
        let values = &strs[..size];
        with_dtype!(dtype, D => {
            let out: Vec<D> = pick(values, indices).map(|t| parse_value::<D>(t)).collect();
            D::into_buffer(Storage::from_vec(out, opts.minmapsize, opts.quietmmap)?)
        }, string => {
            Buffer::String(pick(values, indices).cloned().collect())
        })
    });
    Ok(buffer)
}

/// Gathers the elements at `indices` of `src` into a new 1-D array.
pub(crate) fn gather(src: &Data, indices: &[usize], dtype: DataType) -> GalResult<Data> {
    if indices.is_empty() {
        return Err(GalError::ZeroDimension { dim: 0 });
    }
    let opts = src.alloc_options(Init::Zeros);
    let buffer = convert_buffer(src, Some(indices), dtype, &opts)?;
    Ok(Data::from_parts(
        buffer,
        vec![indices.len()],
        indices.len(),
        &opts,
    ))
}

impl Data {
    /// Deep copy preserving type, shape and metadata.
    pub fn copy(&self) -> GalResult<Data> {
        self.copy_to_type(self.dtype())
    }

    /// Deep copy converted element-wise to `dtype`.
    pub fn copy_to_type(&self, dtype: DataType) -> GalResult<Data> {
        let opts = self.alloc_options(Init::Zeros);
        let buffer = convert_buffer(self, None, dtype, &opts)?;
        let mut out = Data::from_parts(buffer, self.dsize().to_vec(), self.size(), &opts);
        out.copy_meta_from(self);
        Ok(out)
    }

    /// Converts to `dtype`, reusing `self` when it already has that type.
    pub fn into_type(self, dtype: DataType) -> GalResult<Data> {
        if self.dtype() == dtype {
            Ok(self)
        } else {
            self.copy_to_type(dtype)
        }
    }

    /// Copies into a pre-allocated array, converting to its type.
    ///
    /// `dst` must have the same dimensionality and at least as many elements.
    /// Its logical shape is overwritten with `self`'s, so a large allocation
    /// can be reused for smaller inputs; call [`Data::reshape`] before
    /// reusing it for a larger one.
    pub fn copy_into(&self, dst: &mut Data) -> GalResult<()> {
        if dst.ndim() != self.ndim() {
            return Err(GalError::NdimMismatch {
                expected: dst.ndim(),
                got: self.ndim(),
            });
        }
        if dst.size() < self.size() {
            return Err(GalError::SizeMismatch {
                expected: dst.size(),
                got: self.size(),
                context: "copy_into destination too small",
            });
        }
        let size = self.size();
        let dst_type = dst.dtype();
        with_buffer!(dst.buffer_mut(), out => {
            copy_numeric_into(self, &mut out[..size])?;
        }, string(out) => {
            let converted = convert_buffer(self, None, DataType::String, &AllocOptions::default())?;
            match converted {
                Buffer::String(v) => out[..size].clone_from_slice(&v),
                _ => unreachable!("string conversion produced {dst_type}"),
            }
        });
        dst.reshape(self.dsize())
    }

    /// Values as `f64`, with blanks mapped to NaN.
    pub fn to_f64_vec(&self) -> GalResult<Vec<f64>> {
        let size = self.size();
        with_buffer!(self.buffer(),
            s => Ok(s[..size].iter().map(|v| v.to_f64_or_nan()).collect()),
            string(_v) => Err(GalError::TypeMismatch {
                expected: DataType::Float64,
                got: DataType::String,
                context: "to_f64_vec",
            }))
    }
}

fn copy_numeric_into<D: Element>(src: &Data, out: &mut [D]) -> GalResult<()> {
    let size = src.size();
    with_buffer!(src.buffer(), s => {
        for (o, &v) in out.iter_mut().zip(&s[..size]) {
            *o = D::convert_from(v);
        }
    }, string(strs) => {
        for (o, t) in out.iter_mut().zip(&strs[..size]) {
            *o = parse_value(t);
        }
    });
    Ok(())
}
