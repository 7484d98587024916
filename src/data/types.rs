//! Element types and their blank sentinels.

use crate::data::storage::Storage;
use crate::data::Buffer;
use num_traits::{NumCast, ToPrimitive};
use std::fmt;

/// Runtime tag naming the element type of a [`crate::Data`] buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    UInt8,
    Int8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    UInt64,
    Int64,
    Float32,
    Float64,
    String,
}

impl DataType {
    /// All numeric types in promotion order (narrowest first).
    pub const NUMERIC: [DataType; 10] = [
        DataType::UInt8,
        DataType::Int8,
        DataType::UInt16,
        DataType::Int16,
        DataType::UInt32,
        DataType::Int32,
        DataType::UInt64,
        DataType::Int64,
        DataType::Float32,
        DataType::Float64,
    ];

    /// Size of one element in bytes (a pointer-sized slot for strings).
    pub fn size_of(self) -> usize {
        match self {
            DataType::UInt8 | DataType::Int8 => 1,
            DataType::UInt16 | DataType::Int16 => 2,
            DataType::UInt32 | DataType::Int32 | DataType::Float32 => 4,
            DataType::UInt64 | DataType::Int64 | DataType::Float64 => 8,
            DataType::String => std::mem::size_of::<String>(),
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, DataType::Float32 | DataType::Float64)
    }

    pub fn is_integer(self) -> bool {
        !self.is_float() && self != DataType::String
    }

    pub fn is_numeric(self) -> bool {
        self != DataType::String
    }

    /// Position in the promotion order; strings rank above everything.
    fn rank(self) -> usize {
        Self::NUMERIC
            .iter()
            .position(|&t| t == self)
            .unwrap_or(Self::NUMERIC.len())
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64
        )
    }

    /// Returns the wider of two types, promoting toward floating point.
    ///
    /// A signed and an unsigned integer promote to a signed type that holds
    /// every value of both: `uint8` with `int8` gives `int16`, and `uint64`
    /// with any signed integer gives `float64`.
    pub fn wider(self, other: DataType) -> DataType {
        if self.is_integer() && other.is_integer() && self.is_unsigned() != other.is_unsigned() {
            let (unsigned, signed) = if self.is_unsigned() {
                (self, other)
            } else {
                (other, self)
            };
            if signed.size_of() > unsigned.size_of() {
                return signed;
            }
            return match unsigned {
                DataType::UInt8 => DataType::Int16,
                DataType::UInt16 => DataType::Int32,
                DataType::UInt32 => DataType::Int64,
                _ => DataType::Float64,
            };
        }
        if self.rank() >= other.rank() {
            self
        } else {
            other
        }
    }

    /// Short lowercase name, as printed in error messages.
    pub fn name(self) -> &'static str {
        match self {
            DataType::UInt8 => "uint8",
            DataType::Int8 => "int8",
            DataType::UInt16 => "uint16",
            DataType::Int16 => "int16",
            DataType::UInt32 => "uint32",
            DataType::Int32 => "int32",
            DataType::UInt64 => "uint64",
            DataType::Int64 => "int64",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
            DataType::String => "string",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Blank marker used by string arrays.
pub const BLANK_STRING: &str = "n/a";

/// Numeric element stored in a [`crate::Data`] buffer.
///
/// Every implementor has a reserved blank value: NaN for floats, the minimum
/// for signed integers and the maximum for unsigned integers.
pub trait Element:
    Copy
    + PartialOrd
    + NumCast
    + ToPrimitive
    + bytemuck::Pod
    + Send
    + Sync
    + fmt::Debug
    + 'static
{
    const DTYPE: DataType;
    const BLANK: Self;
    const ZERO: Self;
    const ONE: Self;

    fn is_blank(self) -> bool;

    /// Addition; wraps for integers.
    fn add(self, other: Self) -> Self;
    /// Subtraction; wraps for integers.
    fn sub(self, other: Self) -> Self;
    /// Multiplication; wraps for integers.
    fn mul(self, other: Self) -> Self;
    /// Division; integer division by zero yields blank.
    fn div(self, other: Self) -> Self;
    fn abs(self) -> Self;

    #[doc(hidden)]
    fn storage(buffer: &Buffer) -> Option<&Storage<Self>>;
    #[doc(hidden)]
    fn storage_mut(buffer: &mut Buffer) -> Option<&mut Storage<Self>>;
    #[doc(hidden)]
    fn into_buffer(storage: Storage<Self>) -> Buffer;

    /// Converts to `f64`, mapping blank to NaN.
    #[inline]
    fn to_f64_or_nan(self) -> f64 {
        if self.is_blank() {
            f64::NAN
        } else {
            self.to_f64().unwrap_or(f64::NAN)
        }
    }

    /// Converts from another element type, mapping blank (or anything not
    /// representable) to this type's blank.
    #[inline]
    fn convert_from<S: Element>(value: S) -> Self {
        if value.is_blank() {
            return Self::BLANK;
        }
        <Self as NumCast>::from(value).unwrap_or(Self::BLANK)
    }
}

macro_rules! int_abs {
    ($v:expr, true) => {
        $v.wrapping_abs()
    };
    ($v:expr, false) => {
        $v
    };
}

macro_rules! impl_int_element {
    ($t:ty, $variant:ident, $blank:expr, signed = $signed:tt) => {
        impl Element for $t {
            const DTYPE: DataType = DataType::$variant;
            const BLANK: Self = $blank;
            const ZERO: Self = 0;
            const ONE: Self = 1;

            #[inline]
            fn is_blank(self) -> bool {
                self == $blank
            }
            #[inline]
            fn add(self, other: Self) -> Self {
                self.wrapping_add(other)
            }
            #[inline]
            fn sub(self, other: Self) -> Self {
                self.wrapping_sub(other)
            }
            #[inline]
            fn mul(self, other: Self) -> Self {
                self.wrapping_mul(other)
            }
            #[inline]
            fn div(self, other: Self) -> Self {
                if other == 0 {
                    $blank
                } else {
                    self.wrapping_div(other)
                }
            }
            #[inline]
            fn abs(self) -> Self {
                int_abs!(self, $signed)
            }
            fn storage(buffer: &Buffer) -> Option<&Storage<Self>> {
                match buffer {
                    Buffer::$variant(s) => Some(s),
                    _ => None,
                }
            }
            fn storage_mut(buffer: &mut Buffer) -> Option<&mut Storage<Self>> {
                match buffer {
                    Buffer::$variant(s) => Some(s),
                    _ => None,
                }
            }
            fn into_buffer(storage: Storage<Self>) -> Buffer {
                Buffer::$variant(storage)
            }
        }
    };
}

macro_rules! impl_float_element {
    ($t:ty, $variant:ident) => {
        impl Element for $t {
            const DTYPE: DataType = DataType::$variant;
            const BLANK: Self = <$t>::NAN;
            const ZERO: Self = 0.0;
            const ONE: Self = 1.0;

            #[inline]
            fn is_blank(self) -> bool {
                self.is_nan()
            }
            #[inline]
            fn add(self, other: Self) -> Self {
                self + other
            }
            #[inline]
            fn sub(self, other: Self) -> Self {
                self - other
            }
            #[inline]
            fn mul(self, other: Self) -> Self {
                self * other
            }
            #[inline]
            fn div(self, other: Self) -> Self {
                self / other
            }
            #[inline]
            fn abs(self) -> Self {
                <$t>::abs(self)
            }
            fn storage(buffer: &Buffer) -> Option<&Storage<Self>> {
                match buffer {
                    Buffer::$variant(s) => Some(s),
                    _ => None,
                }
            }
            fn storage_mut(buffer: &mut Buffer) -> Option<&mut Storage<Self>> {
                match buffer {
                    Buffer::$variant(s) => Some(s),
                    _ => None,
                }
            }
            fn into_buffer(storage: Storage<Self>) -> Buffer {
                Buffer::$variant(storage)
            }
        }
    };
}

impl_int_element!(u8, UInt8, u8::MAX, signed = false);
impl_int_element!(i8, Int8, i8::MIN, signed = true);
impl_int_element!(u16, UInt16, u16::MAX, signed = false);
impl_int_element!(i16, Int16, i16::MIN, signed = true);
impl_int_element!(u32, UInt32, u32::MAX, signed = false);
impl_int_element!(i32, Int32, i32::MIN, signed = true);
impl_int_element!(u64, UInt64, u64::MAX, signed = false);
impl_int_element!(i64, Int64, i64::MIN, signed = true);
impl_float_element!(f32, Float32);
impl_float_element!(f64, Float64);

/// Runs `$body` with `$t` bound to the Rust type of a numeric [`DataType`].
///
/// The `String` arm is supplied by the caller.
macro_rules! with_dtype {
    ($dtype:expr, $t:ident => $body:expr, string => $other:expr) => {
        match $dtype {
            $crate::data::DataType::UInt8 => {
                type $t = u8;
                $body
            }
            $crate::data::DataType::Int8 => {
                type $t = i8;
                $body
            }
            $crate::data::DataType::UInt16 => {
                type $t = u16;
                $body
            }
            $crate::data::DataType::Int16 => {
                type $t = i16;
                $body
            }
            $crate::data::DataType::UInt32 => {
                type $t = u32;
                $body
            }
            $crate::data::DataType::Int32 => {
                type $t = i32;
                $body
            }
            $crate::data::DataType::UInt64 => {
                type $t = u64;
                $body
            }
            $crate::data::DataType::Int64 => {
                type $t = i64;
                $body
            }
            $crate::data::DataType::Float32 => {
                type $t = f32;
                $body
            }
            $crate::data::DataType::Float64 => {
                type $t = f64;
                $body
            }
            $crate::data::DataType::String => $other,
        }
    };
}

/// Matches a [`Buffer`] reference, binding the typed storage to `$s`.
macro_rules! with_buffer {
    ($buffer:expr, $s:ident => $body:expr, string($strs:ident) => $other:expr) => {
        match $buffer {
            $crate::data::Buffer::UInt8($s) => $body,
            $crate::data::Buffer::Int8($s) => $body,
            $crate::data::Buffer::UInt16($s) => $body,
            $crate::data::Buffer::Int16($s) => $body,
            $crate::data::Buffer::UInt32($s) => $body,
            $crate::data::Buffer::Int32($s) => $body,
            $crate::data::Buffer::UInt64($s) => $body,
            $crate::data::Buffer::Int64($s) => $body,
            $crate::data::Buffer::Float32($s) => $body,
            $crate::data::Buffer::Float64($s) => $body,
            $crate::data::Buffer::String($strs) => $other,
        }
    };
}

pub(crate) use with_buffer;
pub(crate) use with_dtype;

#[cfg(test)]
mod tests {
    use super::{DataType, Element};

    #[test]
    fn wider_promotes_toward_float() {
        assert_eq!(DataType::UInt8.wider(DataType::Int8), DataType::Int8);
        assert_eq!(DataType::Int64.wider(DataType::Float32), DataType::Float32);
        assert_eq!(DataType::Float64.wider(DataType::UInt16), DataType::Float64);
        assert_eq!(DataType::Int32.wider(DataType::Int32), DataType::Int32);
    }

    #[test]
    fn blank_converts_to_destination_blank() {
        assert_eq!(<u8 as Element>::convert_from(f32::NAN), u8::MAX);
        assert_eq!(<i16 as Element>::convert_from(i32::MIN), i16::MIN);
        assert!(<f64 as Element>::convert_from(u32::MAX).is_nan());
        assert_eq!(<i32 as Element>::convert_from(7.9f64), 7);
    }

    #[test]
    fn integer_division_by_zero_is_blank() {
        assert!(Element::div(5i32, 0).is_blank());
        assert_eq!(Element::div(9u16, 2), 4);
    }
}
