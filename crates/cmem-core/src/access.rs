//! Access types: which typed view of the backing buffer a value uses.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// One typed view of the backing buffer.
///
/// The discriminants are distinct bits so several access types can be
/// combined into an [`AccessMask`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AccessType {
    /// Unsigned 8-bit view.
    Uint8 = 1,
    /// Unsigned 16-bit view.
    Uint16 = 2,
    /// Unsigned 32-bit view (the native word view).
    Uint32 = 4,
    /// Signed 8-bit view.
    Int8 = 8,
    /// Signed 16-bit view.
    Int16 = 16,
    /// Signed 32-bit view.
    Int32 = 32,
    /// 32-bit float view.
    Float32 = 64,
}

impl AccessType {
    /// Every access type, in discriminant order.
    pub const ALL: [AccessType; 7] = [
        AccessType::Uint8,
        AccessType::Uint16,
        AccessType::Uint32,
        AccessType::Int8,
        AccessType::Int16,
        AccessType::Int32,
        AccessType::Float32,
    ];

    /// Width of one element of this view in bytes.
    pub const fn bytes(self) -> u32 {
        match self {
            Self::Uint8 | Self::Int8 => 1,
            Self::Uint16 | Self::Int16 => 2,
            Self::Uint32 | Self::Int32 | Self::Float32 => 4,
        }
    }

    /// Right shift turning a byte address into an element index.
    pub fn shift(self) -> u32 {
        self.bytes().trailing_zeros()
    }

    /// This access type as a single-bit mask.
    pub const fn mask(self) -> AccessMask {
        AccessMask(self as u8)
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Float32 => "float32",
        };
        f.write_str(name)
    }
}

/// A set of [`AccessType`]s.
///
/// Used both for the views registered on a buffer and for the combined
/// access footprint of a composite ctype (a struct touching 8- and 32-bit
/// fields carries both bits).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AccessMask(u8);

impl AccessMask {
    /// No access types.
    pub const EMPTY: AccessMask = AccessMask(0);
    /// All 8-bit views.
    pub const BIT8: AccessMask = AccessMask(AccessType::Uint8 as u8 | AccessType::Int8 as u8);
    /// All 16-bit views.
    pub const BIT16: AccessMask = AccessMask(AccessType::Uint16 as u8 | AccessType::Int16 as u8);
    /// All 32-bit views.
    pub const BIT32: AccessMask = AccessMask(
        AccessType::Uint32 as u8 | AccessType::Int32 as u8 | AccessType::Float32 as u8,
    );
    /// Every view.
    pub const ALL: AccessMask = AccessMask(0x7f);

    /// Raw bit representation.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Whether no access type is set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether `access` is in the set.
    pub fn contains(self, access: AccessType) -> bool {
        self.0 & access as u8 != 0
    }

    /// Whether the two masks share any access type.
    pub fn intersects(self, other: AccessMask) -> bool {
        self.0 & other.0 != 0
    }

    /// Address shift of the widest access in the set: 2 for any 32-bit
    /// access, 1 for any 16-bit access, 0 otherwise.
    pub fn shift(self) -> u32 {
        if self.intersects(Self::BIT32) {
            2
        } else if self.intersects(Self::BIT16) {
            1
        } else {
            0
        }
    }

    /// Byte alignment required by the widest access in the set.
    pub fn alignment(self) -> u32 {
        1 << self.shift()
    }

    /// Unsigned view of the widest width in the set, used for raw slot copies.
    pub fn slot_access(self) -> AccessType {
        match self.shift() {
            2 => AccessType::Uint32,
            1 => AccessType::Uint16,
            _ => AccessType::Uint8,
        }
    }

    /// Iterate the access types in the set in discriminant order.
    pub fn iter(self) -> impl Iterator<Item = AccessType> {
        AccessType::ALL.into_iter().filter(move |a| self.contains(*a))
    }
}

impl From<AccessType> for AccessMask {
    fn from(a: AccessType) -> Self {
        a.mask()
    }
}

impl BitOr for AccessMask {
    type Output = AccessMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        AccessMask(self.0 | rhs.0)
    }
}

impl BitOr<AccessType> for AccessMask {
    type Output = AccessMask;

    fn bitor(self, rhs: AccessType) -> Self::Output {
        AccessMask(self.0 | rhs as u8)
    }
}

impl BitOrAssign for AccessMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl FromIterator<AccessType> for AccessMask {
    fn from_iter<I: IntoIterator<Item = AccessType>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, |m, a| m | a)
    }
}
