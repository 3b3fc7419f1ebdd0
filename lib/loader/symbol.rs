use crate::session::Static;
use log::trace;

/// A named address found in a binary.
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct Symbol {
    address: u64,
    name: String,
}

impl Symbol {
    pub fn new<S: Into<String>>(name: S, address: u64) -> Symbol {
        Symbol {
            name: name.into(),
            address,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> u64 {
        self.address
    }
}

/// Name every symbol's address in `session`, returning how many names were
/// registered.
///
/// A symbol whose name already belongs to its address is skipped, so a
/// symbol listed in more than one table keeps its plain name. Any other
/// collision gets a unique name from the session.
pub(crate) fn name_symbols(session: &mut Static, symbols: &[Symbol]) -> usize {
    let mut named = 0;
    for symbol in symbols {
        if session.get_address_by_name(symbol.name()) == Some(symbol.address()) {
            continue;
        }
        let name = session.set_name(symbol.address(), symbol.name());
        trace!("0x{:x}: {}", symbol.address(), name);
        named += 1;
    }
    named
}
