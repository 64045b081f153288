//! Core types and traits for the cmem memory managers.
//!
//! This is the leaf crate of the workspace. It defines the pieces every
//! allocator and the ctypes overlay agree on: the [`Address`] type, access
//! types and their bitmask, the [`Scalar`] element trait, the growable
//! [`WordBuffer`] and the [`Memory`] allocator interface.
//!
//! # Memory model
//!
//! ```text
//! WordBuffer (Vec<u32>, grows by replacement)
//! ├── RESERVED_BYTES (16) at the front, address 0 is null
//! ├── views: u8 / u16 / u32 / i8 / i16 / i32 / f32 (derived per access)
//! └── generation (bumped by update_access after growth)
//! ```
//!
//! Addresses are byte offsets into the buffer. A view borrowed from the
//! buffer can never outlive a growing call, so the "re-fetch views after
//! growth" rule is enforced by the borrow checker rather than by convention.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod access;
pub mod address;
pub mod buffer;
pub mod error;
pub mod memory;
pub mod scalar;

pub use access::{AccessMask, AccessType};
pub use address::{align2, align4, align8, Address};
pub use buffer::WordBuffer;
pub use error::MemoryError;
pub use memory::{Memory, MAX_BYTES, RESERVED_BYTES};
pub use scalar::{ArithOp, Num, Scalar};
