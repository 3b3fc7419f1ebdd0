use crate::architecture::Architecture;
use crate::decoder::{Decoder, Instruction};
use rustc_hash::FxHashMap;

/// A decoder which replays instructions decoded ahead of time.
///
/// This is useful for driving recovery from another tool's disassembly
/// listing, and for exercising recovery without real machine code. The bytes
/// and architecture handed to `decode` are ignored. Addresses without a
/// scripted instruction decode as invalid.
#[derive(Clone, Debug, Default)]
pub struct Scripted {
    instructions: FxHashMap<u64, Instruction>,
}

impl Scripted {
    pub fn new() -> Scripted {
        Scripted::default()
    }

    /// Script `instruction` at its own address.
    pub fn insert(&mut self, instruction: Instruction) {
        self.instructions.insert(instruction.address(), instruction);
    }

    /// Builder form of `insert`.
    pub fn with(mut self, instruction: Instruction) -> Scripted {
        self.insert(instruction);
        self
    }
}

impl Decoder for Scripted {
    fn decode(&self, _: &[u8], address: u64, _: Option<Architecture>) -> Instruction {
        self.instructions
            .get(&address)
            .cloned()
            .unwrap_or_else(|| Instruction::invalid(address))
    }
}
