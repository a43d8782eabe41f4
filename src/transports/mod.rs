//! Transport implementations

pub mod memory;

pub use memory::{MemoryHandle, MemoryTransport};
