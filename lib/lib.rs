//! Descent: recursive-descent control flow recovery.
//!
//! Descent disassembles a binary image starting from known function entries,
//! following every branch it can resolve, and records what it learns in a
//! per-address tag store. Functions, their basic blocks, and the cross
//! references between them are all discovered this way.
//!
//! The pieces, from the bottom up:
//!
//! * [`memory::MemoryImage`] holds the bytes a loader mapped, and answers
//!   reads which may run off the end of mapped memory.
//! * [`store::TaggedStore`] holds per-address facts ("tags") such as names,
//!   comments, decoded instructions and cross references, plus a handful of
//!   global facts like the architecture.
//! * [`decoder::Decoder`] turns bytes into [`decoder::Instruction`]s.
//! * [`recovery`] drives the decoder over memory and writes functions and
//!   blocks back into the store.
//! * [`session::Static`] ties all of the above into one analysis session, and
//!   [`loader`] fills a session from a file on disk.
//!
//! ```
//! use descent::architecture::Architecture;
//! use descent::loader::{Loader, Raw};
//! use descent::session::Static;
//!
//! # fn example() -> Result<(), descent::Error> {
//! // push rbp; mov rbp, rsp; ret
//! let bytes = vec![0x55, 0x48, 0x89, 0xe5, 0xc3];
//!
//! let mut session = Static::new();
//! Raw::new(bytes, 0x1000, Architecture::Amd64).load(&mut session)?;
//!
//! session.recover_function(0x1000);
//! assert_eq!(session.functions().len(), 1);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod architecture;
pub mod cfg;
pub mod decoder;
pub mod loader;
pub mod memory;
pub mod recovery;
pub mod session;
pub mod store;

use thiserror::Error;

/// Descent's error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Custom(String),
    #[error("An error in the goblin library: {0}")]
    Goblin(#[from] goblin::error::Error),
    #[error("An I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("A json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("No address is named `{0}`")]
    NameNotFound(String),
    #[error("Memory chunk at 0x{address:x} overlaps the chunk at 0x{existing:x}")]
    OverlappingChunk { address: u64, existing: u64 },
    #[error("Tag `{tag}` can not hold a {found} value")]
    TagValueMismatch { tag: String, found: String },
    #[error("Unknown architecture `{0}`")]
    UnknownArchitecture(String),
    #[error("Unknown tag `{0}`")]
    UnknownTag(String),
    #[error("Unsupported architecture, e_machine={0}")]
    UnsupportedArchitecture(u16),
}

impl From<&str> for Error {
    fn from(s: &str) -> Error {
        Error::Custom(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Error {
        Error::Custom(s)
    }
}
