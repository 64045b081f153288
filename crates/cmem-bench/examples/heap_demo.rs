//! Walk-through of the seglist heap and the ctypes overlay.
//!
//! Demonstrates: grow a small heap → inspect the size-class lists → build a
//! struct array → walk it with a pointer → run out of memory.
//!
//! Run with `RUST_LOG=debug` to see growth and out-of-memory events.

use cmem_arena::{ArenaConfig, SeglistMemory};
use cmem_bench::{particle_type, random_particles};
use cmem_core::{Memory, MemoryError};
use cmem_ctypes::{CArray, Pointer, TypeRegistry, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("=== cmem Heap Demo ===\n");

    let config = ArenaConfig::new(64).with_max_bytes(4096);
    let mut mem = SeglistMemory::with_config(config).unwrap();
    print_heap("fresh heap", &mem);

    // --- Typed objects ---
    let mut types = TypeRegistry::new();
    let particle = particle_type(&mut types).unwrap();
    let array_ty = types.array(&particle, 8).unwrap();
    let particles = random_particles(42, 8);
    let array = CArray::new(&mut mem, &array_ty, Some(&Value::Array(particles))).unwrap();
    info!(typename = array_ty.name(), bytes = array_ty.bytes(), "array allocated");
    print_heap("after 8 particles", &mem);

    let cursor_ty = types.pointer(Some(&particle));
    let cursor = Pointer::new(&mut mem, &cursor_ty, Some(array.address())).unwrap();
    println!("Walking {} with a {} cursor:", array_ty, cursor_ty);
    for _ in 0..array.len() {
        let p = cursor.deref(&mem).unwrap();
        println!("  {} -> {}", cursor.get(&mem), p.value(&mem));
        cursor.inc(&mut mem).unwrap();
    }
    println!();

    array.reverse(&mut mem);
    println!("First after reverse: {}\n", array.get(&mem, 0));

    // --- Churn and exhaustion ---
    mem.free(cursor.address());
    mem.free(array.address());
    print_heap("after free (coalesced)", &mem);

    let mut held = Vec::new();
    loop {
        match mem.alloc(200) {
            Ok(address) => held.push(address),
            Err(MemoryError::OutOfMemory { requested, capacity }) => {
                println!(
                    "Out of memory after {} blocks: requested {} bytes, capacity {} bytes\n",
                    held.len(),
                    requested,
                    capacity
                );
                break;
            }
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    print_heap("exhausted", &mem);

    mem.clear();
    print_heap("after clear", &mem);
}

fn print_heap(label: &str, mem: &SeglistMemory) {
    let blocks = mem.blocks();
    let taken = blocks.iter().filter(|b| b.taken).count();
    println!(
        "[{label}] {} bytes, {} blocks ({} taken)",
        mem.capacity_words() * 4,
        blocks.len(),
        taken
    );
    for (i, list) in mem.free_lists().iter().enumerate() {
        if !list.is_empty() {
            println!("  list {i}: {list:?}");
        }
    }
    println!();
}
