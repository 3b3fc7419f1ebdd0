use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A basic block.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Block {
    /// The address of the first instruction in this block.
    start: u64,
    /// The addresses of every instruction in this block, `start` included.
    addresses: BTreeSet<u64>,
}

impl Block {
    pub fn new(start: u64) -> Block {
        let mut addresses = BTreeSet::new();
        addresses.insert(start);
        Block { start, addresses }
    }

    /// Add an instruction address to this block.
    pub fn add(&mut self, address: u64) {
        self.addresses.insert(address);
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    /// The address of the last instruction in this block.
    ///
    /// This is where the last instruction starts, not the last byte it covers.
    pub fn end(&self) -> u64 {
        self.addresses.iter().next_back().copied().unwrap_or(self.start)
    }

    /// Instruction addresses in ascending order.
    pub fn addresses(&self) -> &BTreeSet<u64> {
        &self.addresses
    }

    pub fn contains(&self, address: u64) -> bool {
        self.addresses.contains(&address)
    }

    /// The number of instructions in this block.
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:x}-0x{:x}", self.start(), self.end())
    }
}
