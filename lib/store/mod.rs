//! The per-address tag store.
//!
//! Everything Descent learns about an address is a *tag* on that address: its
//! name, a comment, the instruction decoded there, the block and function it
//! belongs to, who jumps to it and who calls it. Most tags are stored and read
//! back as-is, but a few are managed:
//!
//! * `crefs` and `xrefs` read as an empty set the first time, and that set is
//!   kept, so cross references accumulate in place.
//! * `name` writes are made unique by the [`NameRegistry`] before they are
//!   stored.
//! * A plain tag missing on an address falls back to the session-wide value in
//!   [`GlobalTags`], which is how every address gets a default `arch`.

mod global;
mod names;
mod record;
mod tag;

pub use self::global::GlobalTags;
pub use self::names::NameRegistry;
pub use self::record::TagRecord;
pub use self::tag::{AddressType, Tag, TagKind, TagValue};

use crate::architecture::Architecture;
use crate::cfg::Function;
use crate::decoder::Instruction;
use crate::Error;
use std::collections::{BTreeMap, BTreeSet};

/// The result of a `query`: requested tags which hold a value, by address.
pub type QueryResult = BTreeMap<u64, BTreeMap<Tag, TagValue>>;

/// Tags for every address an analysis session has touched.
#[derive(Clone, Debug, Default)]
pub struct TaggedStore {
    records: BTreeMap<u64, TagRecord>,
    names: NameRegistry,
    globals: GlobalTags,
}

impl TaggedStore {
    pub fn new() -> TaggedStore {
        TaggedStore::default()
    }

    /// Get the record for `address`, creating an empty one if needed.
    ///
    /// An address is known to the store from the first time its record is
    /// touched.
    pub fn record_mut(&mut self, address: u64) -> &mut TagRecord {
        self.records.entry(address).or_default()
    }

    /// Get the record for `address` without touching it.
    pub fn record(&self, address: u64) -> Option<&TagRecord> {
        self.records.get(&address)
    }

    /// Get the value of `tag` at `address`.
    ///
    /// `crefs` and `xrefs` always have a value, created empty on first read.
    /// Other tags fall back to the global value of the same tag, and then to
    /// `None`.
    pub fn get(&mut self, address: u64, tag: Tag) -> Option<TagValue> {
        let record = self.records.entry(address).or_default();
        match tag.kind() {
            TagKind::DerivedDefault => record
                .references_mut(tag)
                .map(|references| TagValue::References(references.clone())),
            TagKind::Plain | TagKind::Intercepted => {
                record.get(tag).or_else(|| self.globals.get(tag).cloned())
            }
        }
    }

    /// Set `tag` at `address` to `value`.
    ///
    /// Names are made unique first, see `set_name`. Every other tag is stored
    /// as given, replacing any previous value.
    pub fn set(&mut self, address: u64, tag: Tag, value: TagValue) -> Result<(), Error> {
        match (tag, value) {
            (Tag::Name, TagValue::Text(name)) => {
                self.set_name(address, &name);
                Ok(())
            }
            (tag, value) => self.record_mut(address).set(tag, value),
        }
    }

    /// Name `address`, returning the unique name actually stored.
    pub fn set_name(&mut self, address: u64, name: &str) -> String {
        let name = self.names.set_name(address, name);
        self.record_mut(address).name = Some(name.clone());
        name
    }

    /// The `crefs` of `address`, created empty if missing.
    pub fn crefs(&mut self, address: u64) -> &mut BTreeSet<u64> {
        self.record_mut(address)
            .crefs
            .get_or_insert_with(BTreeSet::new)
    }

    /// The `xrefs` of `address`, created empty if missing.
    pub fn xrefs(&mut self, address: u64) -> &mut BTreeSet<u64> {
        self.record_mut(address)
            .xrefs
            .get_or_insert_with(BTreeSet::new)
    }

    /// The instruction at `address`, with the usual global fallback.
    pub fn instruction(&self, address: u64) -> Option<&Instruction> {
        self.record(address)
            .and_then(|record| record.instruction())
            .or_else(|| {
                self.globals
                    .get(Tag::Instruction)
                    .and_then(|value| value.as_instruction())
            })
    }

    /// The architecture at `address`, with the usual global fallback.
    pub fn architecture(&self, address: u64) -> Option<Architecture> {
        self.record(address)
            .and_then(|record| record.arch())
            .or_else(|| {
                self.globals
                    .get(Tag::Arch)
                    .and_then(|value| value.as_architecture())
            })
    }

    /// The entry of the function `address` was last decoded for.
    pub fn function_of(&self, address: u64) -> Option<u64> {
        self.record(address).and_then(|record| record.function())
    }

    pub fn get_global(&self, tag: Tag) -> Option<&TagValue> {
        self.globals.get(tag)
    }

    pub fn set_global(&mut self, tag: Tag, value: TagValue) -> Result<(), Error> {
        self.globals.set(tag, value)
    }

    pub fn globals(&self) -> &GlobalTags {
        &self.globals
    }

    pub fn globals_mut(&mut self) -> &mut GlobalTags {
        &mut self.globals
    }

    /// Every recovered function, in ascending order of entry address.
    pub fn functions(&self) -> &BTreeMap<u64, Function> {
        self.globals.functions()
    }

    pub fn function(&self, address: u64) -> Option<&Function> {
        self.globals.function(address)
    }

    /// Store `function`, replacing any function with the same entry.
    pub fn insert_function(&mut self, function: Function) {
        self.globals.insert_function(function)
    }

    pub fn names(&self) -> &NameRegistry {
        &self.names
    }

    /// The address named exactly `name`.
    pub fn address_of(&self, name: &str) -> Option<u64> {
        self.names.address_of(name)
    }

    /// Every address the store knows of, ascending.
    pub fn addresses(&self) -> impl Iterator<Item = u64> + '_ {
        self.records.keys().copied()
    }

    /// Collect the values of `tags` for `addresses`, or for every known address
    /// when `addresses` is `None`.
    ///
    /// Only tags with a value are reported, and addresses with nothing to
    /// report are left out. Reads go through `get`, so asking for `crefs` or
    /// `xrefs` creates and reports empty sets.
    pub fn query(&mut self, tags: &[Tag], addresses: Option<&[u64]>) -> QueryResult {
        let addresses: Vec<u64> = match addresses {
            Some(addresses) => addresses.to_vec(),
            None => self.addresses().collect(),
        };

        let mut result = QueryResult::new();
        for address in addresses {
            let mut values = BTreeMap::new();
            for &tag in tags {
                if let Some(value) = self.get(address, tag) {
                    values.insert(tag, value);
                }
            }
            if !values.is_empty() {
                result.insert(address, values);
            }
        }
        result
    }
}
