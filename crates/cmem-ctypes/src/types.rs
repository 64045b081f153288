//! Runtime type descriptors.
//!
//! A [`CType`] is a cheap, shared handle to an immutable [`TypeInfo`]:
//! typename, byte size, access footprint and shape. Composite types are
//! built through a [`TypeRegistry`](crate::TypeRegistry), which memoizes
//! pointer and array types by typename.

use std::fmt;
use std::sync::Arc;

use cmem_core::{AccessMask, AccessType};

use crate::layout::StructLayout;

/// The two character types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CharKind {
    /// One byte code unit.
    Char,
    /// Two byte (UTF-16) code unit.
    WChar,
}

impl CharKind {
    /// View the character is stored through.
    pub fn access(self) -> AccessType {
        match self {
            Self::Char => AccessType::Uint8,
            Self::WChar => AccessType::Uint16,
        }
    }

    /// Typename.
    pub fn name(self) -> &'static str {
        match self {
            Self::Char => "Char",
            Self::WChar => "WChar",
        }
    }
}

/// Typename of the numeric type stored through `access`.
pub fn number_name(access: AccessType) -> &'static str {
    match access {
        AccessType::Uint8 => "Uint8",
        AccessType::Uint16 => "Uint16",
        AccessType::Uint32 => "Uint32",
        AccessType::Int8 => "Int8",
        AccessType::Int16 => "Int16",
        AccessType::Int32 => "Int32",
        AccessType::Float32 => "Float",
    }
}

/// Shape of a ctype.
#[derive(Debug)]
pub enum TypeKind {
    /// Numeric primitive stored through one view.
    Number(AccessType),
    /// Character primitive.
    Char(CharKind),
    /// Pointer to the given type, `None` for `void*`.
    Pointer(Option<CType>),
    /// Fixed-length array.
    Array {
        /// Element type.
        element: CType,
        /// Number of elements, at least 1.
        len: u32,
    },
    /// Struct with a precomputed layout.
    Struct(StructLayout),
}

/// Immutable description of one ctype.
#[derive(Debug)]
pub struct TypeInfo {
    name: String,
    bytes: u32,
    access: AccessMask,
    kind: TypeKind,
}

/// Shared handle to a [`TypeInfo`].
///
/// Equality compares typenames, which are unique within a registry. Use
/// [`CType::ptr_eq`] to check for the identical descriptor.
#[derive(Clone, Debug)]
pub struct CType(Arc<TypeInfo>);

impl CType {
    pub(crate) fn from_parts(name: String, bytes: u32, access: AccessMask, kind: TypeKind) -> Self {
        Self(Arc::new(TypeInfo {
            name,
            bytes,
            access,
            kind,
        }))
    }

    /// Numeric primitive stored through `access`.
    pub fn number(access: AccessType) -> Self {
        Self::from_parts(
            number_name(access).to_string(),
            access.bytes(),
            access.mask(),
            TypeKind::Number(access),
        )
    }

    /// Character primitive.
    pub fn character(kind: CharKind) -> Self {
        let access = kind.access();
        Self::from_parts(
            kind.name().to_string(),
            access.bytes(),
            access.mask(),
            TypeKind::Char(kind),
        )
    }

    /// The untyped pointer `void*`.
    pub fn void_pointer() -> Self {
        Self::from_parts(
            "void*".to_string(),
            4,
            AccessType::Uint32.mask(),
            TypeKind::Pointer(None),
        )
    }

    /// Typename, e.g. `Int16`, `Uint8*` or `Example[3]`.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Size in bytes.
    pub fn bytes(&self) -> u32 {
        self.0.bytes
    }

    /// Every view an object of this type reads or writes through.
    pub fn access(&self) -> AccessMask {
        self.0.access
    }

    /// Shape of the type.
    pub fn kind(&self) -> &TypeKind {
        &self.0.kind
    }

    /// Whether both handles point at the same descriptor.
    pub fn ptr_eq(&self, other: &CType) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Whether this is a numeric primitive.
    pub fn is_number(&self) -> bool {
        matches!(self.kind(), TypeKind::Number(_))
    }

    /// Whether this is `void*`.
    pub fn is_void_pointer(&self) -> bool {
        matches!(self.kind(), TypeKind::Pointer(None))
    }

    /// Pointee of a pointer type. `None` for `void*` and non-pointers.
    pub fn pointee(&self) -> Option<&CType> {
        match self.kind() {
            TypeKind::Pointer(pointee) => pointee.as_ref(),
            _ => None,
        }
    }

    /// Struct layout, if this is a struct type.
    pub fn layout(&self) -> Option<&StructLayout> {
        match self.kind() {
            TypeKind::Struct(layout) => Some(layout),
            _ => None,
        }
    }
}

impl PartialEq for CType {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.name() == other.name()
    }
}

impl Eq for CType {}

impl fmt::Display for CType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
