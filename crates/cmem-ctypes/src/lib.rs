//! C-like typed objects over allocator memory.
//!
//! A ctype object is an address plus a type. It never owns the buffer it
//! reads from: every operation takes the [`Memory`](cmem_core::Memory) it
//! lives in, so objects stay valid when the buffer grows.
//!
//! ```text
//! CType (Arc<TypeInfo>)            registry memoizes by typename
//! ├── Number(AccessType)           Uint8 .. Int32, Float
//! ├── Char(CharKind)               Char, WChar
//! ├── Pointer(Option<CType>)       void*, T*, T**
//! ├── Array { element, len }       T[N]
//! └── Struct(StructLayout)         offsets computed once at definition
//! ```
//!
//! # Ownership
//!
//! `new` allocates storage from the memory it is given and the caller frees
//! it exactly once with `mem.free(obj.address())`. `at` builds a view over
//! existing storage, never allocates, and must not be freed through the
//! view.
//!
//! # Example
//!
//! ```rust
//! use cmem_arena::SeglistMemory;
//! use cmem_core::{AccessType, Memory};
//! use cmem_ctypes::{Structure, TypeRegistry, Value};
//!
//! let mut mem = SeglistMemory::new(64).unwrap();
//! let mut types = TypeRegistry::new();
//! let i16t = types.number(AccessType::Int16);
//! let point = types
//!     .define_struct("Point", [("x", i16t.clone()), ("y", i16t)])
//!     .unwrap();
//!
//! let p = Structure::new(&mut mem, &point, None).unwrap();
//! p.set_field(&mut mem, "x", &Value::Int(3)).unwrap();
//! assert_eq!(p.field_value(&mem, "x").unwrap(), Value::Int(3));
//! mem.free(p.address());
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod array;
pub mod character;
pub mod error;
pub mod layout;
pub mod number;
pub mod object;
pub mod pointer;
pub mod registry;
pub mod structure;
pub mod types;
pub mod value;

pub use array::CArray;
pub use character::{Char, CharUnit, Character, WChar};
pub use error::{CTypeError, PointerFault};
pub use layout::{FieldLayout, StructLayout};
pub use number::{Float, Int16, Int32, Int8, Number, Uint16, Uint32, Uint8};
pub use object::CObject;
pub use pointer::Pointer;
pub use registry::TypeRegistry;
pub use structure::Structure;
pub use types::{CType, CharKind, TypeInfo, TypeKind};
pub use value::Value;
