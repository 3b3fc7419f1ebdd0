use crate::cfg::Function;
use crate::store::{Tag, TagValue};
use crate::Error;
use std::collections::BTreeMap;

/// Facts which belong to the whole session instead of one address.
///
/// Plain tags stored here are the fallback for addresses which lack them,
/// which is how a loader sets a default `arch`. Every recovered function is
/// kept here as well, keyed by entry address.
#[derive(Clone, Debug, Default)]
pub struct GlobalTags {
    values: BTreeMap<Tag, TagValue>,
    functions: BTreeMap<u64, Function>,
}

impl GlobalTags {
    pub fn new() -> GlobalTags {
        GlobalTags::default()
    }

    pub fn get(&self, tag: Tag) -> Option<&TagValue> {
        self.values.get(&tag)
    }

    pub fn set(&mut self, tag: Tag, value: TagValue) -> Result<(), Error> {
        if !tag.accepts(&value) {
            return Err(tag.mismatch(&value));
        }
        self.values.insert(tag, value);
        Ok(())
    }

    /// Every recovered function, in ascending order of entry address.
    pub fn functions(&self) -> &BTreeMap<u64, Function> {
        &self.functions
    }

    pub fn function(&self, address: u64) -> Option<&Function> {
        self.functions.get(&address)
    }

    pub fn function_mut(&mut self, address: u64) -> Option<&mut Function> {
        self.functions.get_mut(&address)
    }

    /// Add a function, replacing any function with the same entry.
    pub fn insert_function(&mut self, function: Function) {
        self.functions.insert(function.address(), function);
    }
}
