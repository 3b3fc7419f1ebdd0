//! Information and types for Descent's supported architectures.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported architectures.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    /// 32-bit x86.
    X86,
    /// 64-bit x86.
    Amd64,
}

impl Architecture {
    /// Get the natural word size of the architecture in bits.
    pub fn word_size(&self) -> usize {
        match *self {
            Architecture::X86 => 32,
            Architecture::Amd64 => 64,
        }
    }

    /// The name used for this architecture in tags and on the command line.
    pub fn name(&self) -> &'static str {
        match *self {
            Architecture::X86 => "x86",
            Architecture::Amd64 => "amd64",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Architecture {
    type Err = Error;

    fn from_str(s: &str) -> Result<Architecture, Error> {
        match s.to_ascii_lowercase().as_str() {
            "x86" | "i386" => Ok(Architecture::X86),
            "amd64" | "x86_64" | "x86-64" => Ok(Architecture::Amd64),
            _ => Err(Error::UnknownArchitecture(s.to_string())),
        }
    }
}

#[test]
fn test_x86() {
    let arch = Architecture::X86;
    assert_eq!(arch.word_size(), 32);
    assert_eq!(arch.to_string(), "x86");
}

#[test]
fn test_amd64() {
    let arch: Architecture = "x86_64".parse().unwrap();
    assert_eq!(arch, Architecture::Amd64);
    assert_eq!(arch.word_size(), 64);
    assert_eq!(arch.to_string(), "amd64");
}

#[test]
fn test_unknown() {
    assert!(matches!(
        "mips".parse::<Architecture>(),
        Err(Error::UnknownArchitecture(_))
    ));
}
