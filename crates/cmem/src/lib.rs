//! cmem: manual memory management inside one growable buffer.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! cmem sub-crates. For most users, adding `cmem` as a single dependency is
//! sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use cmem::prelude::*;
//!
//! let mut mem = SeglistMemory::new(64).unwrap();
//! let mut types = TypeRegistry::new();
//!
//! // struct Pair { uint8_t tag; int32_t value; }
//! let pair = types
//!     .define_struct(
//!         "Pair",
//!         [
//!             ("tag", types.number(AccessType::Uint8)),
//!             ("value", types.number(AccessType::Int32)),
//!         ],
//!     )
//!     .unwrap();
//! assert_eq!(pair.bytes(), 8);
//!
//! let p = Structure::new(&mut mem, &pair, None).unwrap();
//! p.set_field(&mut mem, "value", &Value::Int(-7)).unwrap();
//!
//! // Walk to it through a typed pointer.
//! let ptr_ty = types.pointer(Some(&pair));
//! let ptr = Pointer::new(&mut mem, &ptr_ty, Some(p.address())).unwrap();
//! let target = ptr.deref(&mem).unwrap();
//! assert_eq!(target.value(&mem).get("value"), Some(&Value::Int(-7)));
//!
//! mem.free(ptr.address());
//! mem.free(p.address());
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `cmem-core` | Addresses, access types, `WordBuffer`, the `Memory` trait |
//! | [`arena`] | `cmem-arena` | `StackMemory`, `PoolMemory`, `SeglistMemory` and their configs |
//! | [`ctypes`] | `cmem-ctypes` | Numbers, characters, pointers, arrays and structs over memory |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and the allocator interface (`cmem-core`).
///
/// Contains [`types::Address`], [`types::AccessType`], the backing
/// [`types::WordBuffer`] and the [`types::Memory`] trait every allocator
/// implements.
pub use cmem_core as types;

/// The three allocators (`cmem-arena`).
///
/// [`arena::StackMemory`] for LIFO scratch space, [`arena::PoolMemory`] for
/// fixed-size objects and [`arena::SeglistMemory`] as a general heap.
pub use cmem_arena as arena;

/// Typed overlay (`cmem-ctypes`).
///
/// Define types through a [`ctypes::TypeRegistry`] and read or write them
/// with [`ctypes::Number`], [`ctypes::Pointer`], [`ctypes::CArray`] and
/// [`ctypes::Structure`].
pub use cmem_ctypes as ctypes;

/// Common imports for typical cmem usage.
///
/// ```rust
/// use cmem::prelude::*;
/// ```
///
/// This imports the allocators, the `Memory` trait, the type registry and
/// the object views.
pub mod prelude {
    // Core
    pub use cmem_core::{AccessType, Address, Memory, MemoryError};

    // Allocators
    pub use cmem_arena::{ArenaConfig, PoolConfig, PoolMemory, SeglistMemory, StackMemory};

    // ctypes
    pub use cmem_ctypes::{
        CArray, CObject, CType, CTypeError, Number, Pointer, Structure, TypeRegistry, Value,
    };
}
