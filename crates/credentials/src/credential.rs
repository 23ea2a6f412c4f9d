//! Stored secret material and the metadata describing how it was derived.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CredentialEncoder, CredentialError, HashAlgorithm};

/// Storage encoding of a credential's secret (and, for base64, its salt).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretEncoding {
    #[default]
    Raw,
    Base64,
    Hex,
}

impl core::fmt::Display for SecretEncoding {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SecretEncoding::Raw => f.write_str("raw"),
            SecretEncoding::Base64 => f.write_str("base64"),
            SecretEncoding::Hex => f.write_str("hex"),
        }
    }
}

/// Immutable stored credential.
///
/// When `hash_algorithm` is `None` the secret is plaintext and `salt` /
/// `hash_iterations` carry no meaning.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    secret: Vec<u8>,
    hash_algorithm: Option<HashAlgorithm>,
    salt: Option<Vec<u8>>,
    hash_iterations: u32,
    encoding: SecretEncoding,
    expire_date: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn builder() -> CredentialBuilder {
        CredentialBuilder::default()
    }

    pub fn encoder() -> CredentialEncoder {
        CredentialEncoder::new()
    }

    /// Secret bytes as stored (still base64/hex text if so encoded).
    pub fn secret(&self) -> &[u8] {
        &self.secret
    }

    pub fn decoded_secret(&self) -> Result<Vec<u8>, CredentialError> {
        match self.encoding {
            SecretEncoding::Raw => Ok(self.secret.clone()),
            SecretEncoding::Base64 => decode_base64(&self.secret),
            SecretEncoding::Hex => hex::decode(&self.secret).map_err(|e| CredentialError::Decode {
                encoding: SecretEncoding::Hex,
                reason: e.to_string(),
            }),
        }
    }

    pub fn hash_algorithm(&self) -> Option<HashAlgorithm> {
        self.hash_algorithm
    }

    pub fn salt(&self) -> Option<&[u8]> {
        self.salt.as_deref()
    }

    /// Salt bytes, base64-decoded when the credential is base64 encoded.
    pub fn decoded_salt(&self) -> Result<Option<Vec<u8>>, CredentialError> {
        match (&self.salt, self.encoding) {
            (None, _) => Ok(None),
            (Some(salt), SecretEncoding::Base64) => decode_base64(salt).map(Some),
            (Some(salt), _) => Ok(Some(salt.clone())),
        }
    }

    pub fn hash_iterations(&self) -> u32 {
        self.hash_iterations
    }

    pub fn encoding(&self) -> SecretEncoding {
        self.encoding
    }

    pub fn is_hashed(&self) -> bool {
        self.hash_algorithm.is_some()
    }

    pub fn expire_date(&self) -> Option<DateTime<Utc>> {
        self.expire_date
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expire_date.is_some_and(|expiry| expiry < now)
    }
}

impl core::fmt::Debug for Credential {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credential")
            .field("secret", &"<redacted>")
            .field("hash_algorithm", &self.hash_algorithm)
            .field("salt", &self.salt.as_ref().map(|_| "<redacted>"))
            .field("hash_iterations", &self.hash_iterations)
            .field("encoding", &self.encoding)
            .field("expire_date", &self.expire_date)
            .finish()
    }
}

fn decode_base64(data: &[u8]) -> Result<Vec<u8>, CredentialError> {
    STANDARD.decode(data).map_err(|e| CredentialError::Decode {
        encoding: SecretEncoding::Base64,
        reason: e.to_string(),
    })
}

#[derive(Debug, Clone, Default)]
pub struct CredentialBuilder {
    secret: Option<Vec<u8>>,
    hash_algorithm: Option<String>,
    salt: Option<Vec<u8>>,
    hash_iterations: Option<u32>,
    base64: bool,
    hex: bool,
    expire_date: Option<DateTime<Utc>>,
}

impl CredentialBuilder {
    /// Secret in its stored form (already hashed and/or encoded).
    pub fn secret(mut self, secret: impl AsRef<[u8]>) -> Self {
        self.secret = Some(secret.as_ref().to_vec());
        self
    }

    /// Algorithm name; validated by [`CredentialBuilder::build`].
    pub fn hash_algorithm(mut self, name: impl Into<String>) -> Self {
        self.hash_algorithm = Some(name.into());
        self
    }

    pub fn salt(mut self, salt: impl AsRef<[u8]>) -> Self {
        self.salt = Some(salt.as_ref().to_vec());
        self
    }

    pub fn hash_iterations(mut self, iterations: u32) -> Self {
        self.hash_iterations = Some(iterations);
        self
    }

    /// Replaces any encoding requested so far.
    pub fn encoding(mut self, encoding: SecretEncoding) -> Self {
        self.base64 = encoding == SecretEncoding::Base64;
        self.hex = encoding == SecretEncoding::Hex;
        self
    }

    /// Requesting this together with [`CredentialBuilder::hex_encoded`] fails at build.
    pub fn base64_encoded(mut self) -> Self {
        self.base64 = true;
        self
    }

    pub fn hex_encoded(mut self) -> Self {
        self.hex = true;
        self
    }

    pub fn expire_date(mut self, expire_date: DateTime<Utc>) -> Self {
        self.expire_date = Some(expire_date);
        self
    }

    pub fn build(self) -> Result<Credential, CredentialError> {
        let secret = self.secret.ok_or(CredentialError::MissingSecret)?;

        let hash_algorithm = self
            .hash_algorithm
            .map(|name| name.parse::<HashAlgorithm>())
            .transpose()?;

        let hash_iterations = match self.hash_iterations {
            Some(0) => return Err(CredentialError::InvalidIterations(0)),
            Some(n) => n,
            None => 1,
        };

        let encoding = match (self.base64, self.hex) {
            (true, true) => return Err(CredentialError::ConflictingEncodings),
            (true, false) => SecretEncoding::Base64,
            (false, true) => SecretEncoding::Hex,
            (false, false) => SecretEncoding::Raw,
        };

        Ok(Credential {
            secret,
            hash_algorithm,
            salt: self.salt,
            hash_iterations,
            encoding,
            expire_date: self.expire_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn build_requires_secret() {
        let err = Credential::builder().hash_algorithm("SHA-256").build().unwrap_err();
        assert_eq!(err, CredentialError::MissingSecret);
    }

    #[test]
    fn build_rejects_unknown_algorithm() {
        let err = Credential::builder()
            .secret("x")
            .hash_algorithm("ROT13")
            .build()
            .unwrap_err();
        assert_eq!(err, CredentialError::UnsupportedAlgorithm("ROT13".to_string()));
    }

    #[test]
    fn build_rejects_zero_iterations() {
        let err = Credential::builder()
            .secret("x")
            .hash_iterations(0)
            .build()
            .unwrap_err();
        assert_eq!(err, CredentialError::InvalidIterations(0));
    }

    #[test]
    fn defaults_to_single_iteration_and_raw_encoding() {
        let credential = Credential::builder().secret("pwd").build().unwrap();
        assert_eq!(credential.hash_iterations(), 1);
        assert_eq!(credential.encoding(), SecretEncoding::Raw);
        assert!(!credential.is_hashed());
        assert_eq!(credential.decoded_secret().unwrap(), b"pwd");
    }

    #[test]
    fn base64_decodes_secret_and_salt() {
        let credential = Credential::builder()
            .secret("cHdk")
            .salt("c2FsdA==")
            .base64_encoded()
            .build()
            .unwrap();

        assert_eq!(credential.decoded_secret().unwrap(), b"pwd");
        assert_eq!(credential.decoded_salt().unwrap().unwrap(), b"salt");
    }

    #[test]
    fn hex_decodes_secret_only() {
        let credential = Credential::builder()
            .secret("707764")
            .salt("raw-salt")
            .hex_encoded()
            .build()
            .unwrap();

        assert_eq!(credential.decoded_secret().unwrap(), b"pwd");
        assert_eq!(credential.decoded_salt().unwrap().unwrap(), b"raw-salt");
    }

    #[test]
    fn base64_and_hex_together_are_rejected() {
        let err = Credential::builder()
            .secret("cHdk")
            .base64_encoded()
            .hex_encoded()
            .build()
            .unwrap_err();
        assert_eq!(err, CredentialError::ConflictingEncodings);

        let err = Credential::builder()
            .secret("cHdk")
            .hex_encoded()
            .base64_encoded()
            .build()
            .unwrap_err();
        assert_eq!(err, CredentialError::ConflictingEncodings);
    }

    #[test]
    fn explicit_encoding_replaces_earlier_requests() {
        let credential = Credential::builder()
            .secret("cHdk")
            .hex_encoded()
            .encoding(SecretEncoding::Base64)
            .build()
            .unwrap();
        assert_eq!(credential.encoding(), SecretEncoding::Base64);
        assert_eq!(credential.decoded_secret().unwrap(), b"pwd");
    }

    #[test]
    fn malformed_hex_reports_decode_error() {
        let credential = Credential::builder().secret("zz").hex_encoded().build().unwrap();
        assert!(matches!(
            credential.decoded_secret(),
            Err(CredentialError::Decode { encoding: SecretEncoding::Hex, .. })
        ));
    }

    #[test]
    fn expiry() {
        let now = Utc::now();
        let expired = Credential::builder()
            .secret("x")
            .expire_date(now - Duration::minutes(1))
            .build()
            .unwrap();
        let valid = Credential::builder()
            .secret("x")
            .expire_date(now + Duration::minutes(1))
            .build()
            .unwrap();
        let forever = Credential::builder().secret("x").build().unwrap();

        assert!(expired.is_expired(now));
        assert!(!valid.is_expired(now));
        assert!(!forever.is_expired(now));
    }

    #[test]
    fn debug_redacts_secret() {
        let credential = Credential::builder().secret("hunter2").salt("pepper").build().unwrap();
        let rendered = format!("{credential:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("pepper"));
    }
}
