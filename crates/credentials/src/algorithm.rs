//! Message digest algorithms usable for credential hashing.

use core::str::FromStr;

use digest::Digest;
use serde::{Deserialize, Serialize};

use crate::CredentialError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    #[serde(rename = "MD5")]
    Md5,
    #[serde(rename = "SHA-1")]
    Sha1,
    #[serde(rename = "SHA-256")]
    Sha256,
    #[serde(rename = "SHA-384")]
    Sha384,
    #[serde(rename = "SHA-512")]
    Sha512,
}

impl HashAlgorithm {
    /// Canonical algorithm name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "MD5",
            HashAlgorithm::Sha1 => "SHA-1",
            HashAlgorithm::Sha256 => "SHA-256",
            HashAlgorithm::Sha384 => "SHA-384",
            HashAlgorithm::Sha512 => "SHA-512",
        }
    }

    /// Single digest of `data`.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        self.hash(&[], data, 1)
    }

    /// Iterated, salted digest.
    ///
    /// Starting from `secret`, each round computes `H(salt ++ previous)`.
    /// `iterations` below 1 is treated as 1.
    pub fn hash(&self, salt: &[u8], secret: &[u8], iterations: u32) -> Vec<u8> {
        let rounds = iterations.max(1);
        match self {
            HashAlgorithm::Md5 => iterate::<md5::Md5>(salt, secret, rounds),
            HashAlgorithm::Sha1 => iterate::<sha1::Sha1>(salt, secret, rounds),
            HashAlgorithm::Sha256 => iterate::<sha2::Sha256>(salt, secret, rounds),
            HashAlgorithm::Sha384 => iterate::<sha2::Sha384>(salt, secret, rounds),
            HashAlgorithm::Sha512 => iterate::<sha2::Sha512>(salt, secret, rounds),
        }
    }
}

fn iterate<D: Digest>(salt: &[u8], secret: &[u8], rounds: u32) -> Vec<u8> {
    let mut current = secret.to_vec();
    for _ in 0..rounds {
        let mut hasher = D::new();
        hasher.update(salt);
        hasher.update(&current);
        current = hasher.finalize().to_vec();
    }
    current
}

impl core::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = CredentialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_uppercase();

        match normalized.as_str() {
            "MD5" => Ok(HashAlgorithm::Md5),
            "SHA1" | "SHA" => Ok(HashAlgorithm::Sha1),
            "SHA256" => Ok(HashAlgorithm::Sha256),
            "SHA384" => Ok(HashAlgorithm::Sha384),
            "SHA512" => Ok(HashAlgorithm::Sha512),
            _ => Err(CredentialError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}
