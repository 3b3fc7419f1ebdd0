//! iced-based decoder for 32/64-bit x86.

use crate::architecture::Architecture;
use crate::decoder::{Decoder, DestinationType, Instruction};
use iced_x86::{DecoderOptions, FlowControl, Formatter, IntelFormatter, OpKind};

/// The x86 decoder. Handles both `x86` and `amd64`.
#[derive(Clone, Debug, Default)]
pub struct X86Decoder;

impl X86Decoder {
    pub fn new() -> X86Decoder {
        X86Decoder
    }
}

/// The target of a direct near branch or call.
fn near_target(instruction: &iced_x86::Instruction) -> Option<u64> {
    match instruction.op0_kind() {
        OpKind::NearBranch16 | OpKind::NearBranch32 | OpKind::NearBranch64 => {
            Some(instruction.near_branch_target())
        }
        _ => None,
    }
}

impl Decoder for X86Decoder {
    fn decode(
        &self,
        bytes: &[u8],
        address: u64,
        architecture: Option<Architecture>,
    ) -> Instruction {
        let bitness = match architecture {
            Some(architecture) => architecture.word_size() as u32,
            None => return Instruction::invalid(address),
        };

        let mut decoder = iced_x86::Decoder::with_ip(bitness, bytes, address, DecoderOptions::NONE);
        let decoded = decoder.decode();
        // Also covers a buffer cut short by the end of mapped memory.
        if decoded.is_invalid() {
            return Instruction::invalid(address);
        }

        let mut text = String::new();
        IntelFormatter::new().format(&decoded, &mut text);

        let length = decoded.len().min(bytes.len());
        let instruction = Instruction::new(address, bytes[..length].to_vec(), text);
        let target = near_target(&decoded);

        match decoded.flow_control() {
            FlowControl::Return | FlowControl::IndirectBranch | FlowControl::Exception => {
                instruction.with_terminal(true)
            }
            FlowControl::UnconditionalBranch => match target {
                Some(target) => instruction
                    .with_terminal(true)
                    .with_destination(target, DestinationType::ControlFlow),
                None => instruction.with_terminal(true),
            },
            FlowControl::ConditionalBranch => match target {
                Some(target) => instruction
                    .with_destination(target, DestinationType::ControlFlow)
                    .with_fallthrough(),
                None => instruction.with_fallthrough(),
            },
            FlowControl::Call => match target {
                Some(target) => instruction
                    .with_destination(target, DestinationType::Call)
                    .with_fallthrough(),
                None => instruction.with_fallthrough(),
            },
            _ => instruction.with_fallthrough(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::DestinationType::{Call, ControlFlow};

    fn amd64(bytes: &[u8], address: u64) -> Instruction {
        X86Decoder::new().decode(bytes, address, Some(Architecture::Amd64))
    }

    #[test]
    fn straight_line() {
        let instruction = amd64(&[0x55, 0x48, 0x89, 0xe5, 0xc3], 0x1000);
        assert_eq!(instruction.size(), 1);
        assert_eq!(instruction.text(), "push rbp");
        assert!(!instruction.is_terminal());
        assert_eq!(instruction.destinations(), &[(0x1001, ControlFlow)]);

        let instruction = amd64(&[0x48, 0x89, 0xe5, 0xc3], 0x1001);
        assert_eq!(instruction.size(), 3);
        assert_eq!(instruction.bytes(), &[0x48, 0x89, 0xe5]);
        assert_eq!(instruction.destinations(), &[(0x1004, ControlFlow)]);
    }

    #[test]
    fn ret() {
        let instruction = amd64(&[0xc3], 0x1004);
        assert_eq!(instruction.size(), 1);
        assert_eq!(instruction.text(), "ret");
        assert!(instruction.is_terminal());
        assert!(instruction.destinations().is_empty());
    }

    #[test]
    fn call() {
        // call 0x100a
        let instruction = amd64(&[0xe8, 0x05, 0x00, 0x00, 0x00], 0x1000);
        assert_eq!(instruction.size(), 5);
        assert!(!instruction.is_terminal());
        assert_eq!(
            instruction.destinations(),
            &[(0x100a, Call), (0x1005, ControlFlow)]
        );
    }

    #[test]
    fn conditional_branch() {
        // je 0x1004
        let instruction = amd64(&[0x74, 0x02], 0x1000);
        assert!(!instruction.is_terminal());
        assert_eq!(
            instruction.destinations(),
            &[(0x1004, ControlFlow), (0x1002, ControlFlow)]
        );
    }

    #[test]
    fn jumps() {
        // jmp 0x1000
        let instruction = amd64(&[0xeb, 0xfe], 0x1000);
        assert!(instruction.is_terminal());
        assert_eq!(instruction.destinations(), &[(0x1000, ControlFlow)]);

        // jmp rax
        let instruction = amd64(&[0xff, 0xe0], 0x1000);
        assert!(instruction.is_terminal());
        assert!(instruction.destinations().is_empty());
    }

    #[test]
    fn x86_mode() {
        let instruction =
            X86Decoder::new().decode(&[0x55, 0xc3], 0x8048000, Some(Architecture::X86));
        assert_eq!(instruction.text(), "push ebp");
        assert_eq!(instruction.destinations(), &[(0x8048001, ControlFlow)]);
    }

    #[test]
    fn undecodable() {
        // call with a truncated displacement
        assert_eq!(amd64(&[0xe8, 0x05, 0x00], 0x1000).size(), 0);
        assert_eq!(amd64(&[], 0x1000).size(), 0);
        assert_eq!(X86Decoder::new().decode(&[0xc3], 0x1000, None).size(), 0);
    }
}
