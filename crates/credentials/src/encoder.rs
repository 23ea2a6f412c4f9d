//! Turns a plaintext secret into its stored byte form.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use warden_core::Charset;

use crate::{Credential, CredentialError, HashAlgorithm, SecretEncoding};

#[derive(Debug, Clone)]
enum Material {
    Bytes(Vec<u8>),
    Text(String),
    Base64(String),
}

impl Material {
    fn resolve(&self, charset: Charset) -> Result<Vec<u8>, CredentialError> {
        match self {
            Material::Bytes(bytes) => Ok(bytes.clone()),
            Material::Text(text) => Ok(charset.encode(text)),
            Material::Base64(encoded) => {
                STANDARD
                    .decode(encoded.as_bytes())
                    .map_err(|e| CredentialError::Decode {
                        encoding: SecretEncoding::Base64,
                        reason: e.to_string(),
                    })
            }
        }
    }
}

/// Builder deriving stored credential bytes from a secret.
///
/// Without a hash algorithm the (charset-encoded) secret is returned as is.
/// With one, the secret is hashed `hash_iterations` times, every round
/// hashing `salt ++ previous_digest`.
///
/// ```ignore
/// let stored = CredentialEncoder::new()
///     .secret("pwd")
///     .hash_sha256()
///     .hash_iterations(3)
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct CredentialEncoder {
    secret: Option<Material>,
    salt: Option<Material>,
    hash_algorithm: Option<String>,
    hash_iterations: u32,
    charset: Option<String>,
}

impl CredentialEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(Material::Text(secret.into()));
        self
    }

    pub fn secret_bytes(mut self, secret: impl AsRef<[u8]>) -> Self {
        self.secret = Some(Material::Bytes(secret.as_ref().to_vec()));
        self
    }

    pub fn salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = Some(Material::Text(salt.into()));
        self
    }

    pub fn salt_bytes(mut self, salt: impl AsRef<[u8]>) -> Self {
        self.salt = Some(Material::Bytes(salt.as_ref().to_vec()));
        self
    }

    /// Salt given in base64 form; decoded at build time.
    pub fn salt_base64(mut self, salt: impl Into<String>) -> Self {
        self.salt = Some(Material::Base64(salt.into()));
        self
    }

    /// Algorithm name, resolved at build time.
    pub fn hash_algorithm(mut self, name: impl Into<String>) -> Self {
        self.hash_algorithm = Some(name.into());
        self
    }

    pub fn hash_md5(self) -> Self {
        self.hash_algorithm(HashAlgorithm::Md5.as_str())
    }

    pub fn hash_sha1(self) -> Self {
        self.hash_algorithm(HashAlgorithm::Sha1.as_str())
    }

    pub fn hash_sha256(self) -> Self {
        self.hash_algorithm(HashAlgorithm::Sha256.as_str())
    }

    pub fn hash_sha384(self) -> Self {
        self.hash_algorithm(HashAlgorithm::Sha384.as_str())
    }

    pub fn hash_sha512(self) -> Self {
        self.hash_algorithm(HashAlgorithm::Sha512.as_str())
    }

    pub fn hash_iterations(mut self, iterations: u32) -> Self {
        self.hash_iterations = iterations;
        self
    }

    /// Charset name used for textual secret and salt (default `UTF-8`).
    pub fn charset(mut self, name: impl Into<String>) -> Self {
        self.charset = Some(name.into());
        self
    }

    pub fn with_charset(self, charset: Charset) -> Self {
        self.charset(charset.name())
    }

    pub fn build(&self) -> Result<Vec<u8>, CredentialError> {
        Ok(self.derive()?.0)
    }

    pub fn build_and_encode_base64(&self) -> Result<String, CredentialError> {
        Ok(STANDARD.encode(self.build()?))
    }

    pub fn build_and_encode_hex(&self) -> Result<String, CredentialError> {
        Ok(hex::encode(self.build()?))
    }

    /// Derive the stored bytes and wrap them, with the hashing parameters,
    /// into a raw-encoded [`Credential`].
    pub fn build_credential(&self) -> Result<Credential, CredentialError> {
        let (secret, algorithm, salt) = self.derive()?;

        let mut builder = Credential::builder().secret(secret);
        if let Some(algorithm) = algorithm {
            builder = builder
                .hash_algorithm(algorithm.as_str())
                .hash_iterations(self.hash_iterations.max(1));
            if let Some(salt) = salt {
                builder = builder.salt(salt);
            }
        }
        builder.build()
    }

    fn derive(&self) -> Result<(Vec<u8>, Option<HashAlgorithm>, Option<Vec<u8>>), CredentialError> {
        let secret = self.secret.as_ref().ok_or(CredentialError::MissingSecret)?;

        let charset = match &self.charset {
            Some(name) => name.parse::<Charset>()?,
            None => Charset::default(),
        };
        let secret = secret.resolve(charset)?;

        let Some(name) = &self.hash_algorithm else {
            return Ok((secret, None, None));
        };
        let algorithm = name.parse::<HashAlgorithm>()?;

        let salt = self
            .salt
            .as_ref()
            .map(|salt| salt.resolve(charset))
            .transpose()?;

        let digest = algorithm.hash(
            salt.as_deref().unwrap_or_default(),
            &secret,
            self.hash_iterations,
        );
        Ok((digest, Some(algorithm), salt))
    }
}
