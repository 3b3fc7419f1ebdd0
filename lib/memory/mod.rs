//! The memory a loader mapped for analysis.
//!
//! Descent analyses a static image, so memory is a flat, read-mostly set of
//! byte chunks. Loaders add chunks, the recoverer reads from them. Reads never
//! fail: they simply stop early at the first unmapped byte, and decoders are
//! expected to cope with short buffers near the end of mapped memory.

mod image;

pub use self::image::{Chunk, MemoryImage};
