//! Text-to-bytes conversion used when secrets are given as text.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Byte substituted for characters the target charset cannot represent.
const REPLACEMENT: u8 = b'?';

/// Supported character sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Charset {
    #[default]
    Utf8,
    /// `US-ASCII`: 7-bit only.
    Ascii,
    /// `ISO-8859-1`: one byte per char, code points up to U+00FF.
    Latin1,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported charset '{0}'")]
pub struct UnknownCharset(pub String);

impl Charset {
    pub fn name(&self) -> &'static str {
        match self {
            Charset::Utf8 => "UTF-8",
            Charset::Ascii => "US-ASCII",
            Charset::Latin1 => "ISO-8859-1",
        }
    }

    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Charset::Utf8 => text.as_bytes().to_vec(),
            _ => self.encode_chars(text.chars()),
        }
    }

    pub fn encode_chars<I>(&self, chars: I) -> Vec<u8>
    where
        I: IntoIterator<Item = char>,
    {
        let limit = match self {
            Charset::Utf8 => {
                return chars.into_iter().collect::<String>().into_bytes();
            }
            Charset::Ascii => 0x7F,
            Charset::Latin1 => 0xFF,
        };

        chars
            .into_iter()
            .map(|c| {
                let code = c as u32;
                if code <= limit { code as u8 } else { REPLACEMENT }
            })
            .collect()
    }
}

impl core::fmt::Display for Charset {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Charset {
    type Err = UnknownCharset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UTF-8" | "UTF8" => Ok(Charset::Utf8),
            "US-ASCII" | "ASCII" => Ok(Charset::Ascii),
            "ISO-8859-1" | "ISO8859-1" | "LATIN1" => Ok(Charset::Latin1),
            _ => Err(UnknownCharset(s.to_string())),
        }
    }
}

impl TryFrom<String> for Charset {
    type Error = UnknownCharset;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Charset> for String {
    fn from(value: Charset) -> Self {
        value.name().to_string()
    }
}
