//! Element types that can be loaded from and stored to a [`WordBuffer`](crate::WordBuffer).
//!
//! Stores follow C conversion rules for the element width: integers wrap
//! modulo 2^width, floats truncate toward zero when stored into an integer
//! element and non-finite floats store 0.

use std::fmt;

use bytemuck::Pod;

use crate::access::AccessType;

/// Intermediate numeric value used for conversions and in-place arithmetic.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Num {
    /// Integer domain (all integer elements fit in an `i64`).
    Int(i64),
    /// Floating-point domain.
    Float(f64),
}

/// In-place arithmetic operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArithOp {
    /// `a += b`
    Add,
    /// `a -= b`
    Sub,
    /// `a *= b`
    Mul,
    /// `a /= b`
    Div,
    /// `a %= b`
    Rem,
}

impl Num {
    /// Value as an `f64`.
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }

    /// Apply `op` with `rhs` as the right operand.
    ///
    /// Two integers combine in the 64-bit integer domain with wrapping;
    /// division or remainder by zero yields 0. Anything involving a float
    /// combines in `f64`.
    pub fn apply(self, op: ArithOp, rhs: Num) -> Num {
        match (self, rhs) {
            (Self::Int(a), Self::Int(b)) => Self::Int(match op {
                ArithOp::Add => a.wrapping_add(b),
                ArithOp::Sub => a.wrapping_sub(b),
                ArithOp::Mul => a.wrapping_mul(b),
                ArithOp::Div if b == 0 => 0,
                ArithOp::Div => a.wrapping_div(b),
                ArithOp::Rem if b == 0 => 0,
                ArithOp::Rem => a.wrapping_rem(b),
            }),
            (a, b) => {
                let (a, b) = (a.as_f64(), b.as_f64());
                Self::Float(match op {
                    ArithOp::Add => a + b,
                    ArithOp::Sub => a - b,
                    ArithOp::Mul => a * b,
                    ArithOp::Div => a / b,
                    ArithOp::Rem => a % b,
                })
            }
        }
    }

    /// Low 32 bits of the value after truncation toward zero.
    ///
    /// Non-finite floats map to 0.
    pub fn to_bits32(self) -> u32 {
        match self {
            Self::Int(i) => i as u32,
            Self::Float(f) if !f.is_finite() => 0,
            Self::Float(f) => f.trunc().rem_euclid(4_294_967_296.0) as u32,
        }
    }
}

impl fmt::Display for Num {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
        }
    }
}

/// A primitive element stored in the backing buffer.
///
/// Implemented for `u8`, `u16`, `u32`, `i8`, `i16`, `i32` and `f32`, one per
/// [`AccessType`].
pub trait Scalar: Pod + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// View this element type is read and written through.
    const ACCESS: AccessType;

    /// Widen to the intermediate numeric domain.
    fn to_num(self) -> Num;

    /// Narrow from the intermediate domain with wrap/truncate semantics.
    fn from_num(n: Num) -> Self;
}

macro_rules! int_scalar {
    ($($t:ty => $access:ident),* $(,)?) => {
        $(
            impl Scalar for $t {
                const ACCESS: AccessType = AccessType::$access;

                fn to_num(self) -> Num {
                    Num::Int(i64::from(self))
                }

                fn from_num(n: Num) -> Self {
                    n.to_bits32() as $t
                }
            }
        )*
    };
}

int_scalar! {
    u8 => Uint8,
    u16 => Uint16,
    u32 => Uint32,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
}

impl Scalar for f32 {
    const ACCESS: AccessType = AccessType::Float32;

    fn to_num(self) -> Num {
        Num::Float(f64::from(self))
    }

    fn from_num(n: Num) -> Self {
        n.as_f64() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_stores_wrap() {
        assert_eq!(u8::from_num(Num::Int(291)), 35);
        assert_eq!(i8::from_num(Num::Int(168)), -88);
        assert_eq!(u16::from_num(Num::Int(65537)), 1);
        assert_eq!(i16::from_num(Num::Int(42000)), -23536);
        assert_eq!(i32::from_num(Num::Int(4_000_000_000)), -294_967_296);
        assert_eq!(u32::from_num(Num::Int(5_000_000_000)), 705_032_704);
        assert_eq!(u16::from_num(Num::Int(-1)), 65535);
    }

    #[test]
    fn float_to_integer_truncates() {
        assert_eq!(i32::from_num(Num::Float(-3.9)), -3);
        assert_eq!(u8::from_num(Num::Float(4.1)), 4);
        assert_eq!(u8::from_num(Num::Float(f64::NAN)), 0);
        assert_eq!(i32::from_num(Num::Float(f64::INFINITY)), 0);
        assert_eq!(u8::from_num(Num::Float(-1.0)), 255);
    }

    #[test]
    fn integer_arithmetic_wraps_in_target() {
        let sum = Num::Int(2_000_000_000).apply(ArithOp::Add, Num::Int(2_000_000_000));
        assert_eq!(i32::from_num(sum), -294_967_296);
        let prod = Num::Int(u32::MAX as i64).apply(ArithOp::Mul, Num::Int(u32::MAX as i64));
        assert_eq!(u32::from_num(prod), 1);
    }

    #[test]
    fn integer_division_truncates_and_zero_divisor_stores_zero() {
        assert_eq!(Num::Int(7).apply(ArithOp::Div, Num::Int(2)), Num::Int(3));
        assert_eq!(Num::Int(-7).apply(ArithOp::Div, Num::Int(2)), Num::Int(-3));
        assert_eq!(Num::Int(7).apply(ArithOp::Div, Num::Int(0)), Num::Int(0));
        assert_eq!(Num::Int(7).apply(ArithOp::Rem, Num::Int(0)), Num::Int(0));
        assert_eq!(Num::Int(-7).apply(ArithOp::Rem, Num::Int(3)), Num::Int(-1));
    }

    #[test]
    fn mixed_operands_use_float_domain() {
        let r = Num::Int(3).apply(ArithOp::Add, Num::Float(1.5));
        assert_eq!(r, Num::Float(4.5));
        assert_eq!(i8::from_num(r), 4);
        assert_eq!(f32::from_num(Num::Float(1.0).apply(ArithOp::Div, Num::Float(0.0))), f32::INFINITY);
    }

    #[test]
    fn access_types_match_widths() {
        assert_eq!(<u8 as Scalar>::ACCESS.bytes() as usize, std::mem::size_of::<u8>());
        assert_eq!(<i16 as Scalar>::ACCESS.bytes() as usize, std::mem::size_of::<i16>());
        assert_eq!(<f32 as Scalar>::ACCESS.bytes() as usize, std::mem::size_of::<f32>());
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn u8_add_matches_wrapping_add(a in any::<u8>(), b in any::<u8>()) {
                let r = u8::from_num(a.to_num().apply(ArithOp::Add, b.to_num()));
                prop_assert_eq!(r, a.wrapping_add(b));
            }

            #[test]
            fn i32_mul_matches_wrapping_mul(a in any::<i32>(), b in any::<i32>()) {
                let r = i32::from_num(a.to_num().apply(ArithOp::Mul, b.to_num()));
                prop_assert_eq!(r, a.wrapping_mul(b));
            }

            #[test]
            fn i16_round_trip(v in any::<i16>()) {
                prop_assert_eq!(i16::from_num(v.to_num()), v);
            }
        }
    }
}
