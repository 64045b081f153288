//! Numeric primitives.

use std::fmt;
use std::marker::PhantomData;

use cmem_core::{Address, ArithOp, Memory, Num, Scalar};

use crate::error::CTypeError;
use crate::object::alloc_object;
use crate::types::{number_name, CType};
use crate::value::Value;

/// A numeric value of element type `T` at a fixed address.
///
/// The view holds only the address; every read and write goes through the
/// memory passed in, so a view stays valid across buffer growth.
pub struct Number<T: Scalar> {
    address: Address,
    _marker: PhantomData<T>,
}

/// `uint8_t`.
pub type Uint8 = Number<u8>;
/// `uint16_t`.
pub type Uint16 = Number<u16>;
/// `uint32_t`.
pub type Uint32 = Number<u32>;
/// `int8_t`.
pub type Int8 = Number<i8>;
/// `int16_t`.
pub type Int16 = Number<i16>;
/// `int32_t`.
pub type Int32 = Number<i32>;
/// `float`.
pub type Float = Number<f32>;

impl<T: Scalar> Number<T> {
    /// Size of the element in bytes.
    pub const BYTES: u32 = T::ACCESS.bytes();

    /// Allocate a new number from `mem`, optionally initialised.
    ///
    /// The caller owns the allocation and frees it with
    /// `mem.free(n.address())`.
    pub fn new<M: Memory + ?Sized>(mem: &mut M, value: Option<T>) -> Result<Self, CTypeError> {
        let address = alloc_object(mem, Self::BYTES, T::ACCESS.mask())?;
        let n = Self::at(address);
        if let Some(v) = value {
            n.set(mem, v);
        }
        Ok(n)
    }

    /// Non-owning view at `address`. Never allocates.
    pub fn at(address: Address) -> Self {
        Self {
            address,
            _marker: PhantomData,
        }
    }

    /// Type descriptor of `T`.
    pub fn ctype() -> CType {
        CType::number(T::ACCESS)
    }

    /// Typename, e.g. `Int16`.
    pub fn typename() -> &'static str {
        number_name(T::ACCESS)
    }

    /// Address of the value.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Re-point the view.
    pub fn set_address(&mut self, address: Address) {
        self.address = address;
    }

    /// Current value.
    pub fn get<M: Memory + ?Sized>(&self, mem: &M) -> T {
        mem.buffer().load(self.address)
    }

    /// Store `value`.
    pub fn set<M: Memory + ?Sized>(&self, mem: &mut M, value: T) {
        mem.buffer_mut().store(self.address, value);
    }

    /// Current value in the intermediate numeric domain.
    pub fn get_num<M: Memory + ?Sized>(&self, mem: &M) -> Num {
        self.get(mem).to_num()
    }

    /// Store a number, wrapping or truncating it to `T`.
    pub fn set_num<M: Memory + ?Sized>(&self, mem: &mut M, value: Num) {
        self.set(mem, T::from_num(value));
    }

    /// Current value as a [`Value`].
    pub fn value<M: Memory + ?Sized>(&self, mem: &M) -> Value {
        self.get_num(mem).into()
    }

    /// Store an `Int`, `Float` or `Char` (as its code point).
    pub fn set_value<M: Memory + ?Sized>(&self, mem: &mut M, value: &Value) -> Result<(), CTypeError> {
        let n = match value {
            Value::Char(c) => Num::Int(i64::from(u32::from(*c))),
            other => other.as_num().ok_or_else(|| CTypeError::ValueMismatch {
                expected: Self::typename().to_string(),
                found: other.kind().to_string(),
            })?,
        };
        self.set_num(mem, n);
        Ok(())
    }

    /// Copy the value of another number, converting between element types.
    pub fn copy_from<U: Scalar, M: Memory + ?Sized>(&self, mem: &mut M, other: &Number<U>) {
        let n = other.get_num(mem);
        self.set_num(mem, n);
    }

    /// `self op= rhs`, computed in the 64-bit integer domain for integer
    /// operands and in `f64` otherwise, then stored with wraparound.
    pub fn apply<M: Memory + ?Sized>(&self, mem: &mut M, op: ArithOp, rhs: Num) {
        let result = self.get_num(mem).apply(op, rhs);
        self.set_num(mem, result);
    }

    /// `self += 1`.
    pub fn inc<M: Memory + ?Sized>(&self, mem: &mut M) {
        self.apply(mem, ArithOp::Add, Num::Int(1));
    }

    /// `self -= 1`.
    pub fn dec<M: Memory + ?Sized>(&self, mem: &mut M) {
        self.apply(mem, ArithOp::Sub, Num::Int(1));
    }

    /// `self += rhs`.
    pub fn iadd<U: Scalar, M: Memory + ?Sized>(&self, mem: &mut M, rhs: &Number<U>) {
        let r = rhs.get_num(mem);
        self.apply(mem, ArithOp::Add, r);
    }

    /// `self -= rhs`.
    pub fn isub<U: Scalar, M: Memory + ?Sized>(&self, mem: &mut M, rhs: &Number<U>) {
        let r = rhs.get_num(mem);
        self.apply(mem, ArithOp::Sub, r);
    }

    /// `self *= rhs`.
    pub fn imul<U: Scalar, M: Memory + ?Sized>(&self, mem: &mut M, rhs: &Number<U>) {
        let r = rhs.get_num(mem);
        self.apply(mem, ArithOp::Mul, r);
    }

    /// `self /= rhs`. Integer division truncates; dividing by zero stores 0.
    pub fn idiv<U: Scalar, M: Memory + ?Sized>(&self, mem: &mut M, rhs: &Number<U>) {
        let r = rhs.get_num(mem);
        self.apply(mem, ArithOp::Div, r);
    }

    /// `self %= rhs`. Remainder by zero stores 0.
    pub fn imod<U: Scalar, M: Memory + ?Sized>(&self, mem: &mut M, rhs: &Number<U>) {
        let r = rhs.get_num(mem);
        self.apply(mem, ArithOp::Rem, r);
    }

    /// The value's bytes.
    pub fn bytes<'m, M: Memory + ?Sized>(&self, mem: &'m M) -> &'m [u8] {
        mem.buffer().bytes(self.address, Self::BYTES)
    }

    /// Overwrite memory at the value's address with `data`.
    pub fn set_bytes<M: Memory + ?Sized>(&self, mem: &mut M, data: &[u8]) {
        mem.buffer_mut().write_bytes(self.address, data);
    }
}

impl<T: Scalar> Clone for Number<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Scalar> Copy for Number<T> {}

impl<T: Scalar> PartialEq for Number<T> {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl<T: Scalar> Eq for Number<T> {}

impl<T: Scalar> fmt::Debug for Number<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", Self::typename(), self.address)
    }
}
