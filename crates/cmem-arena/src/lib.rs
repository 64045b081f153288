//! Stack, pool and segregated-free-list allocators over one growable buffer.
//!
//! Every allocator in this crate owns a single [`WordBuffer`] and hands out
//! byte [`Address`]es into it. They differ only in allocation discipline:
//!
//! ```text
//! StackMemory    bump pointer `sp`, LIFO free, 4-byte aligned
//! PoolMemory     fixed block size, intrusive free list, 4-byte aligned
//! SeglistMemory  general heap: 8 size-class free lists, boundary tags,
//!                split/coalesce, 8-byte aligned
//! ```
//!
//! All three grow the buffer by doubling (capped at `max_bytes`) and never
//! shrink it. `clear()` resets bookkeeping without touching the storage.
//!
//! # Checked and unchecked frees
//!
//! `StackMemory::free` is double-free and null safe because a stale address
//! can never lie below the current `sp`. `PoolMemory` and `SeglistMemory`
//! only tolerate null: freeing an address twice corrupts their free lists,
//! exactly like a native heap.
//!
//! [`WordBuffer`]: cmem_core::WordBuffer
//! [`Address`]: cmem_core::Address

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod pool;
pub mod seglist;
pub mod stack;

pub use config::{ArenaConfig, PoolConfig};
pub use pool::PoolMemory;
pub use seglist::{BlockInfo, SeglistMemory};
pub use stack::StackMemory;

pub use cmem_core::{Address, Memory, MemoryError};
