use std::fmt;
use std::str::FromStr;

use crate::error::{Error, ErrorKind, Result};

/// Text encoding tag carried by every [`Cell`](crate::Cell).
///
/// The parser never transcodes: cell bytes are kept exactly as they were read
/// and the tag only tells downstream consumers how to interpret them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    Ascii,
    Binary,
    Latin1,
    Windows1252,
    Utf16Le,
    Utf16Be,
}

impl Encoding {
    /// Resolve a label such as `"utf-8"` or `"ISO-8859-1"`, case-insensitively.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label.trim().to_ascii_lowercase();

        Some(match normalized.as_str() {
            "utf-8" | "utf8" => Self::Utf8,
            "us-ascii" | "ascii" => Self::Ascii,
            "ascii-8bit" | "binary" => Self::Binary,
            "iso-8859-1" | "iso8859-1" | "latin1" => Self::Latin1,
            "windows-1252" | "cp1252" => Self::Windows1252,
            "utf-16le" => Self::Utf16Le,
            "utf-16be" => Self::Utf16Be,
            _ => return None,
        })
    }

    /// Canonical name of the encoding.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Ascii => "US-ASCII",
            Self::Binary => "ASCII-8BIT",
            Self::Latin1 => "ISO-8859-1",
            Self::Windows1252 => "Windows-1252",
            Self::Utf16Le => "UTF-16LE",
            Self::Utf16Be => "UTF-16BE",
        }
    }

    /// Interpret `bytes` as Rust text, if they are valid for this encoding
    /// without any conversion.
    pub(crate) fn decode<'b>(&self, bytes: &'b [u8]) -> Result<&'b str> {
        let invalid = || {
            Error::new(ErrorKind::InvalidEncoding {
                encoding: self.name(),
            })
        };

        match self {
            Self::Utf8 => std::str::from_utf8(bytes).map_err(|_| invalid()),
            // NOTE: single-byte encodings overlap UTF-8 on their ASCII range only
            Self::Ascii | Self::Binary | Self::Latin1 | Self::Windows1252 => {
                if bytes.is_ascii() {
                    std::str::from_utf8(bytes).map_err(|_| invalid())
                } else {
                    Err(invalid())
                }
            }
            Self::Utf16Le | Self::Utf16Be => Err(invalid()),
        }
    }
}

impl FromStr for Encoding {
    type Err = Error;

    fn from_str(label: &str) -> Result<Self> {
        Self::from_label(label)
            .ok_or_else(|| Error::config("encoding", format!("unknown encoding {:?}", label)))
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}
