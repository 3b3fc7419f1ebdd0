use crate::cfg::Block;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A function, identified by its entry address.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Function {
    // The address where this function was entered
    address: u64,
    // This function's blocks, keyed by start address
    blocks: BTreeMap<u64, Block>,
}

impl Function {
    pub fn new(address: u64) -> Function {
        Function {
            address,
            blocks: BTreeMap::new(),
        }
    }

    pub fn address(&self) -> u64 {
        self.address
    }

    /// Add a block to this function, replacing any block with the same start.
    pub fn add_block(&mut self, block: Block) {
        self.blocks.insert(block.start(), block);
    }

    /// Get the block starting at `start`.
    pub fn block(&self, start: u64) -> Option<&Block> {
        self.blocks.get(&start)
    }

    /// Blocks in ascending order of start address.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    /// Find the block which holds the instruction at `address`.
    pub fn block_containing(&self, address: u64) -> Option<&Block> {
        self.blocks
            .range(..=address)
            .rev()
            .map(|(_, block)| block)
            .find(|block| block.contains(address))
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// The number of instructions across every block.
    pub fn num_instructions(&self) -> usize {
        self.blocks.values().map(|block| block.len()).sum()
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let blocks = self
            .blocks()
            .map(|block| block.to_string())
            .collect::<Vec<String>>()
            .join(", ");
        write!(f, "0x{:x} {{{}}}", self.address, blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_in_order() {
        let mut function = Function::new(0x100);

        let mut tail = Block::new(0x108);
        tail.add(0x10a);
        function.add_block(tail);

        let mut head = Block::new(0x100);
        head.add(0x104);
        function.add_block(head);

        let starts = function.blocks().map(|b| b.start()).collect::<Vec<u64>>();
        assert_eq!(starts, vec![0x100, 0x108]);
        assert_eq!(function.num_instructions(), 4);
        assert_eq!(function.block_containing(0x10a).unwrap().start(), 0x108);
        assert_eq!(function.block_containing(0x104).unwrap().start(), 0x100);
        assert!(function.block_containing(0x106).is_none());
        assert_eq!(function.to_string(), "0x100 {0x100-0x104, 0x108-0x10a}");
    }
}
