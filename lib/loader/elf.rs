use crate::architecture::Architecture;
use crate::loader::symbol::name_symbols;
use crate::loader::{Loader, Symbol};
use crate::session::Static;
use crate::store::{Tag, TagValue};
use crate::Error;
use goblin::elf::header::{EM_386, EM_X86_64};
use goblin::elf::program_header::PT_LOAD;
use log::{debug, warn};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// The most zero bytes a segment is extended by past its file contents.
const MAX_ZERO_FILL: u64 = 0x1000_0000;

/// Loader for a single ELF file.
#[derive(Clone, Debug)]
pub struct Elf {
    bytes: Vec<u8>,
    architecture: Architecture,
}

impl Elf {
    /// Create a new Elf from the given bytes.
    ///
    /// Fails if the bytes are not an ELF, or the ELF is for an architecture we
    /// can not decode.
    pub fn new(bytes: Vec<u8>) -> Result<Elf, Error> {
        let architecture = {
            let elf = goblin::elf::Elf::parse(&bytes)?;
            match elf.header.e_machine {
                EM_386 => Architecture::X86,
                EM_X86_64 => Architecture::Amd64,
                e_machine => return Err(Error::UnsupportedArchitecture(e_machine)),
            }
        };

        Ok(Elf {
            bytes,
            architecture,
        })
    }

    /// Load an Elf from a file.
    pub fn from_file<P: AsRef<Path>>(filename: P) -> Result<Elf, Error> {
        let filename: &Path = filename.as_ref();
        let mut file = match File::open(filename) {
            Ok(file) => file,
            Err(e) => {
                return Err(format!("Error opening {}: {}", filename.display(), e).into());
            }
        };
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        Elf::new(buf)
    }

    /// Return the goblin::elf::Elf for this elf.
    pub fn elf(&self) -> Result<goblin::elf::Elf, Error> {
        Ok(goblin::elf::Elf::parse(&self.bytes)?)
    }

    pub fn architecture(&self) -> Architecture {
        self.architecture
    }

    /// The address program execution begins at.
    pub fn program_entry(&self) -> Result<u64, Error> {
        Ok(self.elf()?.header.e_entry)
    }

    /// Every named symbol with an address, `.symtab` first and then
    /// `.dynsym`.
    ///
    /// A symbol listed in both tables appears twice.
    pub fn symbols(&self) -> Result<Vec<Symbol>, Error> {
        let elf = self.elf()?;
        let mut symbols = Vec::new();

        for sym in elf.syms.iter() {
            if sym.st_value == 0 {
                continue;
            }
            match elf.strtab.get_at(sym.st_name) {
                Some(name) if !name.is_empty() => symbols.push(Symbol::new(name, sym.st_value)),
                _ => continue,
            }
        }

        for sym in elf.dynsyms.iter() {
            if sym.st_value == 0 {
                continue;
            }
            match elf.dynstrtab.get_at(sym.st_name) {
                Some(name) if !name.is_empty() => symbols.push(Symbol::new(name, sym.st_value)),
                _ => continue,
            }
        }

        Ok(symbols)
    }
}

impl Loader for Elf {
    fn load(&self, session: &mut Static) -> Result<(), Error> {
        let elf = self.elf()?;

        for ph in elf.program_headers.iter() {
            if ph.p_type != PT_LOAD || ph.p_memsz == 0 {
                continue;
            }

            let start = ph.p_offset as usize;
            let end = start
                .checked_add(ph.p_filesz as usize)
                .ok_or("Malformed Elf")?;
            let mut bytes = self.bytes.get(start..end).ok_or("Malformed Elf")?.to_vec();

            match ph.p_memsz.checked_sub(ph.p_filesz) {
                Some(0) => {}
                Some(zero_fill) if zero_fill <= MAX_ZERO_FILL => {
                    bytes.resize(bytes.len() + zero_fill as usize, 0);
                }
                _ => warn!(
                    "segment at 0x{:x} has p_memsz 0x{:x} and p_filesz 0x{:x}, \
                     mapping file contents only",
                    ph.p_vaddr, ph.p_memsz, ph.p_filesz
                ),
            }

            if !bytes.is_empty() {
                session.add_memory_chunk(ph.p_vaddr, bytes);
            }
        }

        session.set_global(Tag::Arch, TagValue::from(self.architecture))?;

        let symbols = self.symbols()?;
        let named = name_symbols(session, &symbols);
        debug!("named {} of {} symbols", named, symbols.len());

        let entry = elf.header.e_entry;
        if entry != 0 && session.store().record(entry).and_then(|r| r.name()).is_none() {
            session.set_name(entry, "_start");
        }

        Ok(())
    }
}
