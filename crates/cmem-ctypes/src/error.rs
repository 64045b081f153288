//! Errors raised by the ctypes overlay.

use std::error::Error;
use std::fmt;

use cmem_core::MemoryError;

/// Why a pointer operation was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerFault {
    /// Dereferencing a pointer that holds address 0.
    NullDeref,
    /// Dereferencing a `void*`.
    VoidDeref,
    /// `inc`, `dec` or `add` on a `void*`.
    VoidArithmetic,
}

impl fmt::Display for PointerFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NullDeref => write!(f, "trying to deref NULL pointer"),
            Self::VoidDeref => write!(f, "trying to deref void pointer"),
            Self::VoidArithmetic => write!(f, "arithmetic on void pointer"),
        }
    }
}

/// Errors from ctype construction, type definition and value assignment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CTypeError {
    /// A null or void pointer was dereferenced, or void pointer arithmetic
    /// was attempted.
    InvalidPointerOperation(PointerFault),
    /// The allocator backing a new object failed.
    Memory(MemoryError),
    /// A struct has no field of this name.
    UnknownField {
        /// Struct typename.
        structure: String,
        /// Requested field name.
        field: String,
    },
    /// A typename is already registered.
    DuplicateType {
        /// The conflicting typename.
        name: String,
    },
    /// A struct or array type cannot be laid out.
    InvalidLayout {
        /// Typename being defined.
        name: String,
        /// Description of the problem.
        reason: String,
    },
    /// A value or object does not fit the target ctype.
    ValueMismatch {
        /// Typename of the target.
        expected: String,
        /// Kind of value that was supplied.
        found: String,
    },
}

impl fmt::Display for CTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPointerOperation(fault) => write!(f, "{fault}"),
            Self::Memory(e) => write!(f, "{e}"),
            Self::UnknownField { structure, field } => {
                write!(f, "struct '{structure}' has no field '{field}'")
            }
            Self::DuplicateType { name } => write!(f, "typename '{name}' is already registered"),
            Self::InvalidLayout { name, reason } => {
                write!(f, "invalid layout for '{name}': {reason}")
            }
            Self::ValueMismatch { expected, found } => {
                write!(f, "cannot assign {found} to {expected}")
            }
        }
    }
}

impl Error for CTypeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Memory(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MemoryError> for CTypeError {
    fn from(e: MemoryError) -> Self {
        Self::Memory(e)
    }
}

impl From<PointerFault> for CTypeError {
    fn from(fault: PointerFault) -> Self {
        Self::InvalidPointerOperation(fault)
    }
}
