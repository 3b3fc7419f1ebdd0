//! An analysis session over one binary image.

use crate::architecture::Architecture;
use crate::cfg::Function;
use crate::decoder::{Decoder, X86Decoder};
use crate::memory::MemoryImage;
use crate::recovery::{Options, Recoverer, Recovery};
use crate::store::{QueryResult, Tag, TagValue, TaggedStore};
use crate::Error;
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

/// A static analysis session.
///
/// `Static` owns the memory of the binary, the tags learned about it, and the
/// decoder and options used to recover functions from it. A [`Loader`] fills
/// in memory, the architecture and symbol names, after which functions are
/// recovered with `recover_function`.
///
/// [`Loader`]: crate::loader::Loader
#[derive(Debug)]
pub struct Static {
    memory: MemoryImage,
    store: TaggedStore,
    decoder: Box<dyn Decoder>,
    options: Options,
}

impl Default for Static {
    fn default() -> Static {
        Static::with_decoder(Box::new(X86Decoder::new()))
    }
}

impl Static {
    /// Create an empty session which decodes x86.
    pub fn new() -> Static {
        Static::default()
    }

    /// Create an empty session which decodes with `decoder`.
    pub fn with_decoder(decoder: Box<dyn Decoder>) -> Static {
        Static {
            memory: MemoryImage::new(),
            store: TaggedStore::new(),
            decoder,
            options: Options::default(),
        }
    }

    /// Builder form of `set_options`.
    pub fn with_options(mut self, options: Options) -> Static {
        self.options = options;
        self
    }

    /// Map `data` at `address`.
    pub fn add_memory_chunk(&mut self, address: u64, data: Vec<u8>) {
        debug!("mapping 0x{:x} bytes at 0x{:x}", data.len(), address);
        self.memory.add_chunk(address, data)
    }

    /// Map `data` at `address`, failing if it overlaps memory already mapped.
    pub fn try_add_memory_chunk(&mut self, address: u64, data: Vec<u8>) -> Result<(), Error> {
        self.memory.try_add_chunk(address, data)
    }

    /// Read up to `length` bytes at `address`, stopping early at unmapped
    /// memory.
    pub fn memory(&self, address: u64, length: usize) -> Vec<u8> {
        self.memory.read(address, length)
    }

    pub fn image(&self) -> &MemoryImage {
        &self.memory
    }

    pub fn get(&mut self, address: u64, tag: Tag) -> Option<TagValue> {
        self.store.get(address, tag)
    }

    pub fn set(&mut self, address: u64, tag: Tag, value: TagValue) -> Result<(), Error> {
        self.store.set(address, tag, value)
    }

    /// Name `address`, returning the name actually given. An existing name is
    /// never taken over; a taken name has `_` appended until it is unique.
    pub fn set_name(&mut self, address: u64, name: &str) -> String {
        self.store.set_name(address, name)
    }

    pub fn crefs(&mut self, address: u64) -> &mut BTreeSet<u64> {
        self.store.crefs(address)
    }

    pub fn xrefs(&mut self, address: u64) -> &mut BTreeSet<u64> {
        self.store.xrefs(address)
    }

    pub fn get_global(&self, tag: Tag) -> Option<&TagValue> {
        self.store.get_global(tag)
    }

    pub fn set_global(&mut self, tag: Tag, value: TagValue) -> Result<(), Error> {
        self.store.set_global(tag, value)
    }

    /// The session-wide architecture, if a loader set one.
    pub fn architecture(&self) -> Option<Architecture> {
        self.get_global(Tag::Arch)
            .and_then(|value| value.as_architecture())
    }

    pub fn get_address_by_name(&self, name: &str) -> Option<u64> {
        self.store.address_of(name)
    }

    /// See [`TaggedStore::query`].
    pub fn query(&mut self, tags: &[Tag], addresses: Option<&[u64]>) -> QueryResult {
        self.store.query(tags, addresses)
    }

    /// Recover the function at `entry` and, unless the options say otherwise,
    /// every function it calls.
    pub fn recover_function(&mut self, entry: u64) -> Recovery {
        Recoverer::new(
            &self.memory,
            &mut self.store,
            self.decoder.as_ref(),
            &self.options,
        )
        .recover(entry)
    }

    /// Every recovered function, by entry address.
    pub fn functions(&self) -> &BTreeMap<u64, Function> {
        self.store.functions()
    }

    pub fn function(&self, entry: u64) -> Option<&Function> {
        self.store.function(entry)
    }

    pub fn store(&self) -> &TaggedStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TaggedStore {
        &mut self.store
    }

    pub fn decoder(&self) -> &dyn Decoder {
        self.decoder.as_ref()
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn set_options(&mut self, options: Options) {
        self.options = options;
    }
}
