//! Element-wise reductions over many equally-shaped operands.

use crate::data::types::with_dtype;
use crate::data::{Data, DataType, Element, Init, Storage};
use crate::util::{GalError, GalResult};

/// Reduction applied across operands at every element position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MultiOperand {
    /// Sum of non-blank values (`Float64`).
    Sum,
    /// Mean of non-blank values (`Float64`).
    Mean,
    /// Smallest non-blank value, in the widest operand type.
    Min,
    /// Largest non-blank value, in the widest operand type.
    Max,
    /// Count of non-blank values (`UInt32`).
    Number,
}

/// Reduces `operands` element-wise. All operands must share one shape;
/// positions where every operand is blank give blank (zero for `Number`).
pub fn multioperand(op: MultiOperand, operands: &[Data]) -> GalResult<Data> {
    let first = operands
        .first()
        .ok_or(GalError::InvalidInput("no operands to reduce"))?;
    let mut widest = first.dtype();
    for operand in operands {
        if operand.dsize() != first.dsize() {
            return Err(GalError::SizeMismatch {
                expected: first.size(),
                got: operand.size(),
                context: "multi-operand shapes",
            });
        }
        if !operand.dtype().is_numeric() {
            return Err(GalError::TypeMismatch {
                expected: DataType::Float64,
                got: operand.dtype(),
                context: "multi-operand",
            });
        }
        widest = widest.wider(operand.dtype());
    }
    let columns = operands
        .iter()
        .map(Data::to_f64_vec)
        .collect::<GalResult<Vec<_>>>()?;

    let mut out = match op {
        MultiOperand::Sum => finish(reduce_sum(&columns, false), first)?,
        MultiOperand::Mean => finish(reduce_sum(&columns, true), first)?,
        MultiOperand::Number => finish(reduce_number(&columns), first)?,
        MultiOperand::Min => reduce_extremum(&columns, widest, false, first)?,
        MultiOperand::Max => reduce_extremum(&columns, widest, true, first)?,
    };
    out.wcs = first.wcs.clone();
    Ok(out)
}

fn reduce_sum(columns: &[Vec<f64>], mean: bool) -> Vec<f64> {
    let size = columns[0].len();
    (0..size)
        .map(|i| {
            let (sum, n) = columns
                .iter()
                .map(|c| c[i])
                .filter(|v| !v.is_nan())
                .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
            match (n, mean) {
                (0, _) => f64::NAN,
                (_, true) => sum / n as f64,
                (_, false) => sum,
            }
        })
        .collect()
}

fn reduce_number(columns: &[Vec<f64>]) -> Vec<u32> {
    let size = columns[0].len();
    (0..size)
        .map(|i| columns.iter().filter(|c| !c[i].is_nan()).count() as u32)
        .collect()
}

fn reduce_extremum(
    columns: &[Vec<f64>],
    dtype: DataType,
    want_max: bool,
    shape: &Data,
) -> GalResult<Data> {
    let size = columns[0].len();
    let best: Vec<f64> = (0..size)
        .map(|i| {
            columns
                .iter()
                .map(|c| c[i])
                .filter(|v| !v.is_nan())
                .fold(f64::NAN, |acc, v| {
                    if acc.is_nan() || (want_max && v > acc) || (!want_max && v < acc) {
                        v
                    } else {
                        acc
                    }
                })
        })
        .collect();
    with_dtype!(dtype, T => {
        let typed: Vec<T> = best.into_iter().map(T::convert_from).collect();
        finish(typed, shape)
    }, string => unreachable!("string operands were rejected"))
}

fn finish<T: Element>(values: Vec<T>, shape: &Data) -> GalResult<Data> {
    let opts = shape.alloc_options(Init::Zeros);
    let storage = Storage::from_vec(values, opts.minmapsize, opts.quietmmap)?;
    Ok(Data::from_parts(
        T::into_buffer(storage),
        shape.dsize().to_vec(),
        shape.size(),
        &opts,
    ))
}
