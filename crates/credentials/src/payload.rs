//! Credential payloads carried by tokens and accounts.

use std::io::Read;
use std::path::PathBuf;

use crate::Credential;

/// A secret in one of the shapes the matcher knows how to reduce to bytes.
#[derive(Clone)]
pub enum Credentials {
    Bytes(Vec<u8>),
    Chars(Vec<char>),
    Text(String),
    Stored(Credential),
    /// Read fully when compared.
    File(PathBuf),
    /// A value with no byte representation, named by its type.
    Opaque(&'static str),
}

impl Credentials {
    /// Eagerly read a stream into a byte payload.
    pub fn from_reader<R: Read>(mut reader: R) -> std::io::Result<Self> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(Credentials::Bytes(buf))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Credentials::Bytes(_) => "bytes",
            Credentials::Chars(_) => "chars",
            Credentials::Text(_) => "text",
            Credentials::Stored(_) => "credential",
            Credentials::File(_) => "file",
            Credentials::Opaque(name) => name,
        }
    }

    /// Stored, hashed credential (its bytes are already the digest).
    pub fn as_hashed(&self) -> Option<&Credential> {
        match self {
            Credentials::Stored(credential) if credential.is_hashed() => Some(credential),
            _ => None,
        }
    }
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Credentials::Stored(credential) => f.debug_tuple("Stored").field(credential).finish(),
            Credentials::File(path) => f.debug_tuple("File").field(path).finish(),
            Credentials::Opaque(name) => f.debug_tuple("Opaque").field(name).finish(),
            other => write!(f, "{}(<redacted>)", other.kind()),
        }
    }
}

impl From<&str> for Credentials {
    fn from(value: &str) -> Self {
        Credentials::Text(value.to_string())
    }
}

impl From<String> for Credentials {
    fn from(value: String) -> Self {
        Credentials::Text(value)
    }
}

impl From<Vec<u8>> for Credentials {
    fn from(value: Vec<u8>) -> Self {
        Credentials::Bytes(value)
    }
}

impl From<&[u8]> for Credentials {
    fn from(value: &[u8]) -> Self {
        Credentials::Bytes(value.to_vec())
    }
}

impl From<Vec<char>> for Credentials {
    fn from(value: Vec<char>) -> Self {
        Credentials::Chars(value)
    }
}

impl From<Credential> for Credentials {
    fn from(value: Credential) -> Self {
        Credentials::Stored(value)
    }
}

/// Anything holding (possibly absent) credentials.
pub trait CredentialsContainer {
    fn credentials(&self) -> Option<&Credentials>;
}

impl CredentialsContainer for Credentials {
    fn credentials(&self) -> Option<&Credentials> {
        Some(self)
    }
}

impl CredentialsContainer for Option<Credentials> {
    fn credentials(&self) -> Option<&Credentials> {
        self.as_ref()
    }
}
