//! Instruction decoders.
//!
//! The recoverer does not care about instruction semantics. It needs to know
//! how long an instruction is, whether straight-line flow ends with it, and
//! where control may go next. A `Decoder` answers exactly those questions for
//! the bytes at one address, producing an [`Instruction`].
//!
//! Decoders never fail. Bytes which can not be decoded, including a buffer cut
//! short by the end of mapped memory, produce an invalid instruction of length
//! zero.

mod instruction;
mod scripted;
mod x86;

pub use self::instruction::{DestinationType, Instruction};
pub use self::scripted::Scripted;
pub use self::x86::X86Decoder;

use crate::architecture::Architecture;
use std::fmt::Debug;

/// The most bytes the recoverer will hand a decoder for one instruction.
pub const DECODE_WINDOW: usize = 16;

/// A generic decoding trait, implemented for the supported architectures.
pub trait Decoder: Debug {
    /// Decode the single instruction at the start of `bytes`, which were read
    /// from `address`.
    ///
    /// `architecture` is `None` when nothing told the session which
    /// architecture it is looking at. Decoders should return
    /// `Instruction::invalid` when they can not decode.
    fn decode(&self, bytes: &[u8], address: u64, architecture: Option<Architecture>)
        -> Instruction;
}
