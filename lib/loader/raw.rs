use crate::architecture::Architecture;
use crate::loader::Loader;
use crate::session::Static;
use crate::store::{Tag, TagValue};
use crate::Error;
use std::fs;
use std::path::Path;

/// Loader for a flat image of code, such as a firmware dump or shellcode.
#[derive(Clone, Debug)]
pub struct Raw {
    bytes: Vec<u8>,
    base_address: u64,
    architecture: Architecture,
}

impl Raw {
    /// Map `bytes` at `base_address`, to be decoded as `architecture`.
    pub fn new(bytes: Vec<u8>, base_address: u64, architecture: Architecture) -> Raw {
        Raw {
            bytes,
            base_address,
            architecture,
        }
    }

    /// Read a raw image from a file.
    pub fn from_file<P: AsRef<Path>>(
        filename: P,
        base_address: u64,
        architecture: Architecture,
    ) -> Result<Raw, Error> {
        let filename = filename.as_ref();
        let bytes = fs::read(filename)
            .map_err(|e| format!("Error opening {}: {}", filename.display(), e))?;
        Ok(Raw::new(bytes, base_address, architecture))
    }

    pub fn base_address(&self) -> u64 {
        self.base_address
    }

    pub fn architecture(&self) -> Architecture {
        self.architecture
    }
}

impl Loader for Raw {
    fn load(&self, session: &mut Static) -> Result<(), Error> {
        session.try_add_memory_chunk(self.base_address, self.bytes.clone())?;
        session.set_global(Tag::Arch, TagValue::from(self.architecture))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw() {
        let mut session = Static::new();
        Raw::new(vec![0x55, 0x48, 0x89, 0xe5, 0xc3], 0x400000, Architecture::Amd64)
            .load(&mut session)
            .unwrap();

        assert_eq!(session.architecture(), Some(Architecture::Amd64));
        assert_eq!(session.memory(0x400000, 8), vec![0x55, 0x48, 0x89, 0xe5, 0xc3]);
        assert!(session.memory(0x3fffff, 1).is_empty());

        session.recover_function(0x400000);
        let function = session.function(0x400000).unwrap();
        assert_eq!(function.num_blocks(), 1);
        assert_eq!(function.num_instructions(), 3);
        assert_eq!(
            session
                .store()
                .instruction(0x400001)
                .map(|instruction| instruction.text().to_string()),
            Some("mov rbp,rsp".to_string())
        );
    }

    #[test]
    fn raw_twice_overlaps() {
        let mut session = Static::new();
        let raw = Raw::new(vec![0xc3; 4], 0x1000, Architecture::X86);
        raw.load(&mut session).unwrap();

        assert!(matches!(
            raw.load(&mut session),
            Err(Error::OverlappingChunk {
                address: 0x1000,
                existing: 0x1000
            })
        ));
    }
}
