use serde::{Deserialize, Serialize};
use std::fmt;

/// How control reaches a destination of an instruction.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationType {
    /// The destination is called. It starts a new function, and control
    /// comes back afterwards.
    Call,
    /// A jump, a branch, or plain fallthrough to the next instruction.
    ControlFlow,
}

/// A decoded instruction.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Instruction {
    /// The address this instruction was decoded at.
    address: u64,
    /// The bytes of this instruction. Empty when decoding failed.
    bytes: Vec<u8>,
    /// Printable disassembly.
    text: String,
    /// Does straight-line flow end with this instruction?
    terminal: bool,
    /// Where control may go after this instruction.
    destinations: Vec<(u64, DestinationType)>,
}

impl Instruction {
    /// Create a new, non-terminal `Instruction` without destinations.
    pub fn new<S: Into<String>>(address: u64, bytes: Vec<u8>, text: S) -> Instruction {
        Instruction {
            address,
            bytes,
            text: text.into(),
            terminal: false,
            destinations: Vec::new(),
        }
    }

    /// An instruction which could not be decoded.
    pub fn invalid(address: u64) -> Instruction {
        Instruction {
            address,
            bytes: Vec::new(),
            text: String::new(),
            terminal: true,
            destinations: Vec::new(),
        }
    }

    /// Mark this instruction as ending straight-line flow.
    pub fn with_terminal(mut self, terminal: bool) -> Instruction {
        self.terminal = terminal;
        self
    }

    /// Add a destination to this instruction.
    pub fn with_destination(mut self, address: u64, type_: DestinationType) -> Instruction {
        self.destinations.push((address, type_));
        self
    }

    /// Add the address directly after this instruction as a destination.
    pub fn with_fallthrough(self) -> Instruction {
        let next = self.next_address();
        self.with_destination(next, DestinationType::ControlFlow)
    }

    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The length of this instruction in bytes. Zero if it is invalid.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_valid(&self) -> bool {
        !self.bytes.is_empty()
    }

    /// Returns true for returns, indirect jumps, other instructions after
    /// which flow does not simply continue, and invalid instructions.
    pub fn is_terminal(&self) -> bool {
        self.terminal || !self.is_valid()
    }

    /// The address of the byte directly after this instruction.
    pub fn next_address(&self) -> u64 {
        self.address.wrapping_add(self.size() as u64)
    }

    pub fn destinations(&self) -> &[(u64, DestinationType)] {
        &self.destinations
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}", self.text)
        } else {
            write!(f, "(bad)")
        }
    }
}
