use crate::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A contiguous run of loaded bytes.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Chunk {
    address: u64,
    data: Vec<u8>,
}

impl Chunk {
    fn new(address: u64, data: Vec<u8>) -> Chunk {
        Chunk { address, data }
    }

    /// The address of the first byte in this chunk.
    pub fn address(&self) -> u64 {
        self.address
    }

    /// The address one past the last byte in this chunk.
    pub fn end(&self) -> u64 {
        self.address.saturating_add(self.data.len() as u64)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Does this chunk hold the byte at `address`?
    pub fn contains(&self, address: u64) -> bool {
        address >= self.address && address < self.end()
    }

    fn overlaps(&self, address: u64, end: u64) -> bool {
        self.address < end && address < self.end()
    }
}

/// A flat memory image made of disjoint chunks, keyed by start address.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct MemoryImage {
    chunks: BTreeMap<u64, Chunk>,
}

impl MemoryImage {
    /// Create a new, empty `MemoryImage`.
    pub fn new() -> MemoryImage {
        MemoryImage::default()
    }

    /// Map `data` at `address`.
    ///
    /// Chunks are expected not to overlap, but this is not checked. If they
    /// do, which chunk answers a read of the shared bytes is unspecified. Use
    /// `try_add_chunk` when the caller wants overlaps rejected.
    pub fn add_chunk(&mut self, address: u64, data: Vec<u8>) {
        self.chunks.insert(address, Chunk::new(address, data));
    }

    /// Map `data` at `address`, failing if it would overlap an existing chunk.
    pub fn try_add_chunk(&mut self, address: u64, data: Vec<u8>) -> Result<(), Error> {
        let end = address.saturating_add(data.len() as u64);
        if let Some(existing) = self.chunks.values().find(|c| c.overlaps(address, end)) {
            return Err(Error::OverlappingChunk {
                address,
                existing: existing.address(),
            });
        }
        self.add_chunk(address, data);
        Ok(())
    }

    /// Find the chunk holding the byte at `address`.
    pub fn chunk(&self, address: u64) -> Option<&Chunk> {
        self.chunks
            .range(..=address)
            .next_back()
            .map(|(_, chunk)| chunk)
            .filter(|chunk| chunk.contains(address))
    }

    /// Get the byte at `address`, if it is mapped.
    pub fn get8(&self, address: u64) -> Option<u8> {
        self.chunk(address)
            .map(|chunk| chunk.data[(address - chunk.address) as usize])
    }

    /// Read up to `length` bytes starting at `address`.
    ///
    /// The read stops at the first unmapped byte and returns whatever was
    /// gathered until then, which may be nothing.
    pub fn read(&self, address: u64, length: usize) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(length);
        for i in 0..length {
            let byte = address
                .checked_add(i as u64)
                .and_then(|address| self.get8(address));
            match byte {
                Some(byte) => bytes.push(byte),
                None => break,
            }
        }
        bytes
    }

    /// Is the byte at `address` mapped?
    pub fn contains(&self, address: u64) -> bool {
        self.chunk(address).is_some()
    }

    /// The chunks in this image, in ascending address order.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    /// The number of chunks in this image.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}
