use crate::architecture::Architecture;
use crate::decoder::Instruction;
use crate::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// How the store treats reads and writes of a tag.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TagKind {
    /// Stored and read back verbatim. A missing value falls back to the
    /// global value of the same tag.
    Plain,
    /// The first read of a missing value creates, stores and returns an empty
    /// set. Later reads see the same set.
    DerivedDefault,
    /// Writes are rewritten by the store before they are stored. Reads behave
    /// like `Plain`.
    Intercepted,
}

/// A named fact attached to an address.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    /// The unique name of this address.
    Name,
    /// A free-form comment.
    Comment,
    /// The number of bytes grouped with this address.
    Len,
    /// What lives at this address.
    Type,
    /// The instruction decoded at this address.
    Instruction,
    /// The architecture of the code at this address.
    Arch,
    /// The start of the block this instruction belongs to.
    Block,
    /// The entry of the function this instruction belongs to.
    Function,
    /// Addresses which jump or branch here.
    Crefs,
    /// Addresses which call here.
    Xrefs,
}

impl Tag {
    /// Every tag, in order.
    pub const ALL: [Tag; 10] = [
        Tag::Name,
        Tag::Comment,
        Tag::Len,
        Tag::Type,
        Tag::Instruction,
        Tag::Arch,
        Tag::Block,
        Tag::Function,
        Tag::Crefs,
        Tag::Xrefs,
    ];

    pub fn name(&self) -> &'static str {
        match *self {
            Tag::Name => "name",
            Tag::Comment => "comment",
            Tag::Len => "len",
            Tag::Type => "type",
            Tag::Instruction => "instruction",
            Tag::Arch => "arch",
            Tag::Block => "block",
            Tag::Function => "function",
            Tag::Crefs => "crefs",
            Tag::Xrefs => "xrefs",
        }
    }

    pub fn kind(&self) -> TagKind {
        match *self {
            Tag::Crefs | Tag::Xrefs => TagKind::DerivedDefault,
            Tag::Name => TagKind::Intercepted,
            _ => TagKind::Plain,
        }
    }

    /// Can this tag hold `value`?
    pub fn accepts(&self, value: &TagValue) -> bool {
        matches!(
            (self, value),
            (Tag::Name, TagValue::Text(_))
                | (Tag::Comment, TagValue::Text(_))
                | (Tag::Len, TagValue::Integer(_))
                | (Tag::Type, TagValue::Type(_))
                | (Tag::Instruction, TagValue::Instruction(_))
                | (Tag::Arch, TagValue::Architecture(_))
                | (Tag::Block, TagValue::Block(_))
                | (Tag::Function, TagValue::Function(_))
                | (Tag::Crefs, TagValue::References(_))
                | (Tag::Xrefs, TagValue::References(_))
        )
    }

    pub(crate) fn mismatch(&self, value: &TagValue) -> Error {
        Error::TagValueMismatch {
            tag: self.name().to_string(),
            found: value.type_name().to_string(),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Tag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Tag, Error> {
        Tag::ALL
            .iter()
            .find(|tag| tag.name() == s)
            .copied()
            .ok_or_else(|| Error::UnknownTag(s.to_string()))
    }
}

/// What lives at an address.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressType {
    Instruction,
    Data,
    String,
}

/// The value of a tag.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TagValue {
    Text(String),
    Integer(u64),
    Type(AddressType),
    Instruction(Instruction),
    Architecture(Architecture),
    /// The start address of a block.
    Block(u64),
    /// The entry address of a function.
    Function(u64),
    References(BTreeSet<u64>),
}

impl TagValue {
    fn type_name(&self) -> &'static str {
        match *self {
            TagValue::Text(_) => "text",
            TagValue::Integer(_) => "integer",
            TagValue::Type(_) => "type",
            TagValue::Instruction(_) => "instruction",
            TagValue::Architecture(_) => "architecture",
            TagValue::Block(_) => "block",
            TagValue::Function(_) => "function",
            TagValue::References(_) => "references",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match *self {
            TagValue::Text(ref text) => Some(text),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<u64> {
        match *self {
            TagValue::Integer(integer) => Some(integer),
            _ => None,
        }
    }

    pub fn as_instruction(&self) -> Option<&Instruction> {
        match *self {
            TagValue::Instruction(ref instruction) => Some(instruction),
            _ => None,
        }
    }

    pub fn as_architecture(&self) -> Option<Architecture> {
        match *self {
            TagValue::Architecture(architecture) => Some(architecture),
            _ => None,
        }
    }

    pub fn as_references(&self) -> Option<&BTreeSet<u64>> {
        match *self {
            TagValue::References(ref references) => Some(references),
            _ => None,
        }
    }
}

impl From<Architecture> for TagValue {
    fn from(architecture: Architecture) -> TagValue {
        TagValue::Architecture(architecture)
    }
}

impl From<Instruction> for TagValue {
    fn from(instruction: Instruction) -> TagValue {
        TagValue::Instruction(instruction)
    }
}

impl From<&str> for TagValue {
    fn from(text: &str) -> TagValue {
        TagValue::Text(text.to_string())
    }
}

impl From<String> for TagValue {
    fn from(text: String) -> TagValue {
        TagValue::Text(text)
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            TagValue::Text(ref text) => write!(f, "{}", text),
            TagValue::Integer(integer) => write!(f, "{}", integer),
            TagValue::Type(type_) => write!(f, "{:?}", type_),
            TagValue::Instruction(ref instruction) => write!(f, "{}", instruction),
            TagValue::Architecture(architecture) => write!(f, "{}", architecture),
            TagValue::Block(address) | TagValue::Function(address) => write!(f, "0x{:x}", address),
            TagValue::References(ref references) => {
                let references = references
                    .iter()
                    .map(|address| format!("0x{:x}", address))
                    .collect::<Vec<String>>()
                    .join(", ");
                write!(f, "[{}]", references)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tags() {
        for tag in Tag::ALL.iter() {
            assert_eq!(tag.name().parse::<Tag>().unwrap(), *tag);
        }
        assert!(matches!("scope".parse::<Tag>(), Err(Error::UnknownTag(_))));
    }

    #[test]
    fn kinds() {
        assert_eq!(Tag::Crefs.kind(), TagKind::DerivedDefault);
        assert_eq!(Tag::Xrefs.kind(), TagKind::DerivedDefault);
        assert_eq!(Tag::Name.kind(), TagKind::Intercepted);
        assert_eq!(Tag::Arch.kind(), TagKind::Plain);
    }

    #[test]
    fn accepts() {
        assert!(Tag::Comment.accepts(&TagValue::from("hi")));
        assert!(!Tag::Len.accepts(&TagValue::from("hi")));
        assert!(Tag::Arch.accepts(&TagValue::from(Architecture::X86)));
    }
}
