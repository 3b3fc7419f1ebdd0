//! Loading executable binaries into a session.
//!
//! A loader maps the bytes of a binary into a [`Static`] session, sets the
//! session's `arch`, and names the addresses it has symbols for.

mod elf;
mod raw;
mod symbol;

pub use self::elf::Elf;
pub use self::raw::Raw;
pub use self::symbol::Symbol;

use crate::session::Static;
use crate::Error;
use std::path::Path;

/// Generic trait for all loaders
pub trait Loader {
    /// Map this binary into `session`.
    fn load(&self, session: &mut Static) -> Result<(), Error>;
}

/// Load the ELF file at `filename` into `session`.
pub fn load_binary<P: AsRef<Path>>(filename: P, session: &mut Static) -> Result<(), Error> {
    Elf::from_file(filename)?.load(session)
}
