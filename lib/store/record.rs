use crate::architecture::Architecture;
use crate::decoder::Instruction;
use crate::store::{AddressType, Tag, TagValue};
use crate::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Every tag attached to one address.
///
/// Names are not set through the record. They have to go through the
/// [`TaggedStore`](crate::store::TaggedStore) so they stay unique.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct TagRecord {
    pub(super) name: Option<String>,
    comment: Option<String>,
    len: Option<u64>,
    #[serde(rename = "type")]
    type_: Option<AddressType>,
    instruction: Option<Instruction>,
    arch: Option<Architecture>,
    block: Option<u64>,
    function: Option<u64>,
    pub(super) crefs: Option<BTreeSet<u64>>,
    pub(super) xrefs: Option<BTreeSet<u64>>,
}

impl TagRecord {
    pub fn new() -> TagRecord {
        TagRecord::default()
    }

    /// Get the value stored for `tag`, without defaults or fallbacks.
    pub fn get(&self, tag: Tag) -> Option<TagValue> {
        match tag {
            Tag::Name => self.name.clone().map(TagValue::Text),
            Tag::Comment => self.comment.clone().map(TagValue::Text),
            Tag::Len => self.len.map(TagValue::Integer),
            Tag::Type => self.type_.map(TagValue::Type),
            Tag::Instruction => self.instruction.clone().map(TagValue::Instruction),
            Tag::Arch => self.arch.map(TagValue::Architecture),
            Tag::Block => self.block.map(TagValue::Block),
            Tag::Function => self.function.map(TagValue::Function),
            Tag::Crefs => self.crefs.clone().map(TagValue::References),
            Tag::Xrefs => self.xrefs.clone().map(TagValue::References),
        }
    }

    /// Store `value` for `tag` verbatim.
    pub(crate) fn set(&mut self, tag: Tag, value: TagValue) -> Result<(), Error> {
        match (tag, value) {
            (Tag::Name, TagValue::Text(name)) => self.name = Some(name),
            (Tag::Comment, TagValue::Text(comment)) => self.comment = Some(comment),
            (Tag::Len, TagValue::Integer(len)) => self.len = Some(len),
            (Tag::Type, TagValue::Type(type_)) => self.type_ = Some(type_),
            (Tag::Instruction, TagValue::Instruction(instruction)) => {
                self.instruction = Some(instruction)
            }
            (Tag::Arch, TagValue::Architecture(arch)) => self.arch = Some(arch),
            (Tag::Block, TagValue::Block(block)) => self.block = Some(block),
            (Tag::Function, TagValue::Function(function)) => self.function = Some(function),
            (Tag::Crefs, TagValue::References(crefs)) => self.crefs = Some(crefs),
            (Tag::Xrefs, TagValue::References(xrefs)) => self.xrefs = Some(xrefs),
            (tag, value) => return Err(tag.mismatch(&value)),
        }
        Ok(())
    }

    /// The set stored for `crefs` or `xrefs`, created empty if missing.
    ///
    /// Returns `None` for every other tag.
    pub fn references_mut(&mut self, tag: Tag) -> Option<&mut BTreeSet<u64>> {
        match tag {
            Tag::Crefs => Some(self.crefs.get_or_insert_with(BTreeSet::new)),
            Tag::Xrefs => Some(self.xrefs.get_or_insert_with(BTreeSet::new)),
            _ => None,
        }
    }

    /// Is nothing at all stored in this record?
    pub fn is_empty(&self) -> bool {
        Tag::ALL.iter().all(|tag| self.get(*tag).is_none())
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn set_comment<S: Into<String>>(&mut self, comment: S) {
        self.comment = Some(comment.into());
    }

    pub fn len(&self) -> Option<u64> {
        self.len
    }

    pub fn set_len(&mut self, len: u64) {
        self.len = Some(len);
    }

    pub fn type_(&self) -> Option<AddressType> {
        self.type_
    }

    pub fn set_type(&mut self, type_: AddressType) {
        self.type_ = Some(type_);
    }

    pub fn instruction(&self) -> Option<&Instruction> {
        self.instruction.as_ref()
    }

    pub fn set_instruction(&mut self, instruction: Instruction) {
        self.instruction = Some(instruction);
    }

    pub fn arch(&self) -> Option<Architecture> {
        self.arch
    }

    pub fn set_arch(&mut self, arch: Architecture) {
        self.arch = Some(arch);
    }

    pub fn block(&self) -> Option<u64> {
        self.block
    }

    pub fn set_block(&mut self, block: u64) {
        self.block = Some(block);
    }

    pub fn function(&self) -> Option<u64> {
        self.function
    }

    pub fn set_function(&mut self, function: u64) {
        self.function = Some(function);
    }

    pub fn crefs(&self) -> Option<&BTreeSet<u64>> {
        self.crefs.as_ref()
    }

    pub fn xrefs(&self) -> Option<&BTreeSet<u64>> {
        self.xrefs.as_ref()
    }
}
