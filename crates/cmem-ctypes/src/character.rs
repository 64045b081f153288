//! One-code-unit character types.

use std::fmt;
use std::marker::PhantomData;

use cmem_core::{Address, Memory, Num, Scalar};

use crate::error::CTypeError;
use crate::object::alloc_object;
use crate::types::{CType, CharKind};
use crate::value::Value;

mod sealed {
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for u16 {}
}

/// Storage unit of a character type: `u8` for [`Char`], `u16` for [`WChar`].
pub trait CharUnit: Scalar + sealed::Sealed {
    /// Which character type this unit backs.
    const KIND: CharKind;
}

impl CharUnit for u8 {
    const KIND: CharKind = CharKind::Char;
}

impl CharUnit for u16 {
    const KIND: CharKind = CharKind::WChar;
}

/// A single code unit exposed as a one-character value.
///
/// Storing a character keeps the low bits of its first UTF-16 code unit, so
/// a [`Char`] holds Latin-1 exactly and a [`WChar`] holds the basic
/// multilingual plane. A stored unit that is not a valid scalar value on
/// its own (a lone surrogate) reads back as U+FFFD.
pub struct Character<T: CharUnit> {
    address: Address,
    _marker: PhantomData<T>,
}

/// One byte character.
pub type Char = Character<u8>;
/// Two byte character.
pub type WChar = Character<u16>;

impl<T: CharUnit> Character<T> {
    /// Allocate a new character from `mem`, optionally initialised.
    pub fn new<M: Memory + ?Sized>(mem: &mut M, value: Option<char>) -> Result<Self, CTypeError> {
        let access = T::KIND.access();
        let address = alloc_object(mem, access.bytes(), access.mask())?;
        let c = Self::at(address);
        if let Some(v) = value {
            c.set(mem, v);
        }
        Ok(c)
    }

    /// Non-owning view at `address`.
    pub fn at(address: Address) -> Self {
        Self {
            address,
            _marker: PhantomData,
        }
    }

    /// Type descriptor.
    pub fn ctype() -> CType {
        CType::character(T::KIND)
    }

    /// Address of the character.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Re-point the view.
    pub fn set_address(&mut self, address: Address) {
        self.address = address;
    }

    /// Raw code unit.
    pub fn code(&self, mem: &(impl Memory + ?Sized)) -> u32 {
        mem.buffer().load_slot(T::ACCESS, self.address)
    }

    /// Store a raw code unit, truncated to the unit width.
    pub fn set_code(&self, mem: &mut (impl Memory + ?Sized), code: u32) {
        mem.buffer_mut().store_slot(T::ACCESS, self.address, code);
    }

    /// Stored character.
    pub fn get(&self, mem: &(impl Memory + ?Sized)) -> char {
        char::from_u32(self.code(mem)).unwrap_or(char::REPLACEMENT_CHARACTER)
    }

    /// Store `c`.
    pub fn set(&self, mem: &mut (impl Memory + ?Sized), c: char) {
        let mut units = [0u16; 2];
        let unit = c.encode_utf16(&mut units)[0];
        self.set_code(mem, u32::from(unit));
    }

    /// Store the first character of `s`, or NUL for an empty string.
    pub fn set_str(&self, mem: &mut (impl Memory + ?Sized), s: &str) {
        let unit = s.encode_utf16().next().unwrap_or(0);
        self.set_code(mem, u32::from(unit));
    }

    /// Current value as [`Value::Char`].
    pub fn value(&self, mem: &(impl Memory + ?Sized)) -> Value {
        Value::Char(self.get(mem))
    }

    /// Store a `Char`, the first character of a `Text`, or an `Int` code.
    pub fn set_value(&self, mem: &mut (impl Memory + ?Sized), value: &Value) -> Result<(), CTypeError> {
        match value {
            Value::Char(c) => self.set(mem, *c),
            Value::Text(s) => self.set_str(mem, s),
            Value::Int(i) => self.set_code(mem, Num::Int(*i).to_bits32()),
            other => {
                return Err(CTypeError::ValueMismatch {
                    expected: T::KIND.name().to_string(),
                    found: other.kind().to_string(),
                })
            }
        }
        Ok(())
    }

    /// Copy another character of the same width.
    pub fn copy_from(&self, mem: &mut (impl Memory + ?Sized), other: &Self) {
        let code = other.code(mem);
        self.set_code(mem, code);
    }
}

impl<T: CharUnit> Clone for Character<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: CharUnit> Copy for Character<T> {}

impl<T: CharUnit> PartialEq for Character<T> {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl<T: CharUnit> Eq for Character<T> {}

impl<T: CharUnit> fmt::Debug for Character<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", T::KIND.name(), self.address)
    }
}
