//! Runtime-typed arithmetic over [`Data`] operands.
//!
//! Every operator is written once as a generic kernel over [`Element`] and
//! reached through one type switch per call. Operands are either of equal
//! size or one of them is a single element broadcast against the other.
//! Comparison and logical operators produce `UInt8`; arithmetic produces the
//! wider of the two operand types ([`DataType::wider`]), so mixing signed and
//! unsigned integers never loses unsigned values.

use crate::data::types::with_dtype;
use crate::data::{Data, DataType, Element, Init, Storage};
use crate::util::{GalError, GalResult};

mod multi;

pub use multi::{multioperand, MultiOperand};

/// Two-operand operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Plus,
    Minus,
    Multiply,
    Divide,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinaryOp {
    /// Returns true for operators whose output is a `UInt8` flag array.
    pub fn is_flag(self) -> bool {
        !matches!(
            self,
            BinaryOp::Plus | BinaryOp::Minus | BinaryOp::Multiply | BinaryOp::Divide
        )
    }

    /// Output type for operands of type `left` and `right`.
    pub fn output_type(self, left: DataType, right: DataType) -> DataType {
        if self.is_flag() {
            DataType::UInt8
        } else {
            left.wider(right)
        }
    }
}

/// Single-operand operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    /// Logical negation into a `UInt8` flag array.
    Not,
    /// Absolute value in the operand's type.
    Abs,
}

#[inline]
fn arith<T: Element>(op: BinaryOp, a: T, b: T) -> T {
    if a.is_blank() || b.is_blank() {
        return T::BLANK;
    }
    match op {
        BinaryOp::Plus => a.add(b),
        BinaryOp::Minus => a.sub(b),
        BinaryOp::Multiply => a.mul(b),
        BinaryOp::Divide => a.div(b),
        _ => unreachable!("{op:?} is not an arithmetic operator"),
    }
}

#[inline]
fn flag<T: Element>(op: BinaryOp, a: T, b: T) -> u8 {
    if a.is_blank() || b.is_blank() {
        return u8::BLANK;
    }
    let out = match op {
        BinaryOp::Lt => a < b,
        BinaryOp::Le => a <= b,
        BinaryOp::Gt => a > b,
        BinaryOp::Ge => a >= b,
        BinaryOp::Eq => a == b,
        BinaryOp::Ne => a != b,
        BinaryOp::And => a != T::ZERO && b != T::ZERO,
        BinaryOp::Or => a != T::ZERO || b != T::ZERO,
        _ => unreachable!("{op:?} is not a flag operator"),
    };
    u8::from(out)
}

fn check_sizes(left: &Data, right: &Data) -> GalResult<()> {
    if left.size() == 1 || right.size() == 1 || left.size() == right.size() {
        Ok(())
    } else {
        Err(GalError::SizeMismatch {
            expected: left.size(),
            got: right.size(),
            context: "binary operands",
        })
    }
}

/// Applies `op` to two operands.
///
/// With `inplace`, an operand that already has the output type and size
/// becomes the output buffer and no allocation takes place.
pub fn binary(op: BinaryOp, left: Data, right: Data, inplace: bool) -> GalResult<Data> {
    if !left.dtype().is_numeric() || !right.dtype().is_numeric() {
        return Err(GalError::TypeMismatch {
            expected: DataType::Float64,
            got: DataType::String,
            context: "binary operator",
        });
    }
    check_sizes(&left, &right)?;
    let out_type = op.output_type(left.dtype(), right.dtype());
    let work_type = left.dtype().wider(right.dtype());
    let out_size = left.size().max(right.size());

    if op.is_flag() {
        let left = left.into_type(work_type)?;
        let right = right.into_type(work_type)?;
        let reuse_left = inplace && left.dtype() == DataType::UInt8 && left.size() == out_size;
        let reuse_right = inplace && right.dtype() == DataType::UInt8 && right.size() == out_size;
        return with_dtype!(work_type, T => {
            let flags: Vec<u8> = {
                let l = left.as_slice::<T>()?;
                let r = right.as_slice::<T>()?;
                (0..out_size)
                    .map(|i| flag(op, pick(l, i), pick(r, i)))
                    .collect()
            };
            let mut out = if reuse_left {
                left
            } else if reuse_right {
                right
            } else {
                let shape = if left.size() == out_size { &left } else { &right };
                let mut fresh = Data::alloc(DataType::UInt8, shape.dsize(), &shape.alloc_options(Init::Zeros))?;
                fresh.wcs = shape.wcs.clone();
                fresh
            };
            out.as_mut_slice::<u8>()?.copy_from_slice(&flags);
            Ok(out)
        }, string => unreachable!("string operands were rejected"));
    }

    debug_assert_eq!(out_type, work_type);
    let reuse_left = inplace && left.dtype() == out_type && left.size() == out_size;
    let reuse_right = !reuse_left && inplace && right.dtype() == out_type && right.size() == out_size;
    // The operand holding the output is converted (or reused), the other one
    // is only read.
    let (mut out, other, out_is_left) = if reuse_left {
        (left, right.into_type(out_type)?, true)
    } else if reuse_right {
        (right, left.into_type(out_type)?, false)
    } else if left.size() == out_size {
        (left.copy_to_type(out_type)?, right.into_type(out_type)?, true)
    } else {
        (right.copy_to_type(out_type)?, left.into_type(out_type)?, false)
    };
    with_dtype!(out_type, T => {
        let b = other.as_slice::<T>()?;
        let a = out.as_mut_slice::<T>()?;
        for (i, slot) in a.iter_mut().enumerate() {
            let o = pick(b, i);
            *slot = if out_is_left { arith(op, *slot, o) } else { arith(op, o, *slot) };
        }
    }, string => unreachable!("string operands were rejected"));
    Ok(out)
}

#[inline]
fn pick<T: Copy>(values: &[T], i: usize) -> T {
    if values.len() == 1 {
        values[0]
    } else {
        values[i]
    }
}

/// Applies a single-operand operator.
pub fn unary(op: UnaryOp, input: Data, inplace: bool) -> GalResult<Data> {
    let dtype = input.dtype();
    with_dtype!(dtype, T => {
        match op {
            UnaryOp::Abs => {
                let mut out = if inplace { input } else { input.copy()? };
                for v in out.as_mut_slice::<T>()? {
                    if !v.is_blank() {
                        *v = v.abs();
                    }
                }
                Ok(out)
            }
            UnaryOp::Not => {
                let flags: Vec<u8> = input
                    .as_slice::<T>()?
                    .iter()
                    .map(|&v| if v.is_blank() { u8::BLANK } else { u8::from(v == T::ZERO) })
                    .collect();
                let opts = input.alloc_options(Init::Zeros);
                let storage = Storage::from_vec(flags, opts.minmapsize, opts.quietmmap)?;
                let mut out = Data::from_parts(
                    u8::into_buffer(storage),
                    input.dsize().to_vec(),
                    input.size(),
                    &opts,
                );
                out.wcs = input.wcs.clone();
                Ok(out)
            }
        }
    }, string => Err(GalError::TypeMismatch {
        expected: DataType::Float64,
        got: DataType::String,
        context: "unary operator",
    }))
}
