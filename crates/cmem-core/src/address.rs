//! Byte addresses into a [`WordBuffer`](crate::WordBuffer) and alignment helpers.

use std::fmt;

/// Unsigned 32-bit byte offset into a managed buffer.
///
/// `Address(0)` is the null address. Allocators never return it for a
/// non-zero-size request; it only signals "no allocation" or a null pointer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub u32);

impl Address {
    /// The null address.
    pub const NULL: Address = Address(0);

    /// Whether this is the null address.
    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Index of the 32-bit word containing this address.
    pub fn word(self) -> u32 {
        self.0 >> 2
    }

    /// Address of the first byte of word `index`.
    pub fn from_word(index: u32) -> Self {
        Self(index << 2)
    }

    /// This address moved by `bytes`, wrapping at 2^32.
    #[must_use]
    pub fn offset(self, bytes: u32) -> Self {
        Self(self.0.wrapping_add(bytes))
    }

    /// This address moved by a signed byte delta, wrapping at 2^32.
    #[must_use]
    pub fn offset_signed(self, bytes: i64) -> Self {
        Self((i64::from(self.0).wrapping_add(bytes)) as u32)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl From<u32> for Address {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

impl From<Address> for u32 {
    fn from(a: Address) -> Self {
        a.0
    }
}

/// Round `num` up to a multiple of 2.
pub fn align2(num: u32) -> u32 {
    num.wrapping_add(1) & !1
}

/// Round `num` up to a multiple of 4.
pub fn align4(num: u32) -> u32 {
    num.wrapping_add(3) & !3
}

/// Round `num` up to a multiple of 8.
pub fn align8(num: u32) -> u32 {
    num.wrapping_add(7) & !7
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_helpers_round_up() {
        assert_eq!(align2(0), 0);
        assert_eq!(align2(1), 2);
        assert_eq!(align2(2), 2);
        assert_eq!(align4(1), 4);
        assert_eq!(align4(7), 8);
        assert_eq!(align4(8), 8);
        assert_eq!(align8(1), 8);
        assert_eq!(align8(9), 16);
        assert_eq!(align8(16), 16);
    }

    #[test]
    fn word_conversion_round_trips() {
        let a = Address::from_word(6);
        assert_eq!(a, Address(24));
        assert_eq!(a.word(), 6);
        assert_eq!(Address(27).word(), 6);
    }

    #[test]
    fn null_address() {
        assert!(Address::NULL.is_null());
        assert!(!Address(16).is_null());
        assert_eq!(Address::default(), Address::NULL);
    }

    #[test]
    fn signed_offset_wraps() {
        assert_eq!(Address(16).offset_signed(-8), Address(8));
        assert_eq!(Address(0).offset_signed(-1), Address(u32::MAX));
        assert_eq!(Address(u32::MAX).offset(1), Address(0));
    }

    #[test]
    fn display_is_hex() {
        assert_eq!(Address(24).to_string(), "0x00000018");
    }
}
