//! Comparison of a provided secret against stored credentials.

use subtle::ConstantTimeEq;

use warden_core::{AuthError, AuthResult, Charset};

use crate::{Credentials, CredentialsContainer};

/// Compares provided credentials with stored ones.
///
/// Returns `Ok(false)` on mismatch. A payload that is missing or has no
/// byte form is an [`AuthError::UnexpectedCredentials`], never `false`.
pub trait CredentialsMatcher: Send + Sync {
    fn matches(
        &self,
        provided: &dyn CredentialsContainer,
        stored: &dyn CredentialsContainer,
    ) -> AuthResult<bool>;
}

/// Default matcher.
///
/// If the stored side is a hashed [`Credential`](crate::Credential), the
/// provided plaintext is re-hashed with the stored algorithm, salt and
/// iteration count before comparing. Otherwise both sides are compared as
/// canonical bytes. Comparison is constant time.
#[derive(Debug, Clone, Default)]
pub struct DefaultCredentialsMatcher {
    charset: Charset,
}

impl DefaultCredentialsMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_charset(charset: Charset) -> Self {
        Self { charset }
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }

    /// Reduce a payload to the bytes used for comparison.
    pub fn canonical_bytes(&self, credentials: &Credentials) -> AuthResult<Vec<u8>> {
        match credentials {
            Credentials::Bytes(bytes) => Ok(bytes.clone()),
            Credentials::Chars(chars) => Ok(self.charset.encode_chars(chars.iter().copied())),
            Credentials::Text(text) => Ok(self.charset.encode(text)),
            Credentials::Stored(credential) => Ok(credential.decoded_secret()?),
            Credentials::File(path) => std::fs::read(path).map_err(|e| {
                AuthError::unexpected_credentials_with(
                    format!("unable to read credentials file {}", path.display()),
                    e,
                )
            }),
            Credentials::Opaque(type_name) => Err(AuthError::unexpected_credentials(format!(
                "credentials of type {type_name} have no byte representation"
            ))),
        }
    }
}

impl CredentialsMatcher for DefaultCredentialsMatcher {
    fn matches(
        &self,
        provided: &dyn CredentialsContainer,
        stored: &dyn CredentialsContainer,
    ) -> AuthResult<bool> {
        let provided = provided
            .credentials()
            .ok_or_else(|| AuthError::unexpected_credentials("provided credentials are missing"))?;
        let stored = stored
            .credentials()
            .ok_or_else(|| AuthError::unexpected_credentials("stored credentials are missing"))?;

        tracing::trace!(
            provided = provided.kind(),
            stored = stored.kind(),
            "matching credentials"
        );

        let expected = self.canonical_bytes(stored)?;

        // A provided digest is compared as is, never hashed a second time.
        let rehash = match stored {
            Credentials::Stored(credential) if provided.as_hashed().is_none() => credential
                .hash_algorithm()
                .map(|algorithm| (credential, algorithm)),
            _ => None,
        };

        let mut actual = self.canonical_bytes(provided)?;
        if let Some((credential, algorithm)) = rehash {
            let salt = credential.decoded_salt()?;
            actual = algorithm.hash(
                salt.as_deref().unwrap_or_default(),
                &actual,
                credential.hash_iterations(),
            );
        }

        Ok(bool::from(actual.ct_eq(&expected)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Credential, CredentialEncoder};
    use warden_core::AuthErrorKind;

    fn stored(credential: Credential) -> Credentials {
        Credentials::Stored(credential)
    }

    #[test]
    fn plaintext_credential_compares_bytes() {
        let matcher = DefaultCredentialsMatcher::new();
        let stored = stored(Credential::builder().secret("pwd").build().unwrap());

        assert!(matcher.matches(&Credentials::from("pwd"), &stored).unwrap());
        assert!(!matcher.matches(&Credentials::from("pwd2"), &stored).unwrap());
    }

    #[test]
    fn salt_and_iterations_are_ignored_without_algorithm() {
        let matcher = DefaultCredentialsMatcher::new();
        let stored = stored(
            Credential::builder()
                .secret("pwd")
                .salt("s")
                .hash_iterations(5)
                .build()
                .unwrap(),
        );

        assert!(matcher.matches(&Credentials::from("pwd"), &stored).unwrap());
        assert!(!matcher.matches(&Credentials::from("spwd"), &stored).unwrap());
    }

    #[test]
    fn hashed_credential_rehashes_provided_secret() {
        let matcher = DefaultCredentialsMatcher::new();
        let credential = CredentialEncoder::new()
            .secret("pwd")
            .salt("salt")
            .hash_sha256()
            .hash_iterations(3)
            .build_credential()
            .unwrap();
        let stored = stored(credential);

        assert!(matcher.matches(&Credentials::from("pwd"), &stored).unwrap());
        assert!(!matcher.matches(&Credentials::from("Pwd"), &stored).unwrap());
    }

    #[test]
    fn base64_stored_hash_is_decoded_before_comparison() {
        let encoded = CredentialEncoder::new()
            .secret("pwd")
            .salt("s4lt")
            .hash_sha512()
            .hash_iterations(2)
            .build_and_encode_base64()
            .unwrap();
        let credential = Credential::builder()
            .secret(encoded)
            .salt("czRsdA==")
            .hash_algorithm("SHA-512")
            .hash_iterations(2)
            .base64_encoded()
            .build()
            .unwrap();

        let matcher = DefaultCredentialsMatcher::new();
        assert!(matcher.matches(&Credentials::from("pwd"), &stored(credential)).unwrap());
    }

    #[test]
    fn hex_stored_hash_is_decoded_before_comparison() {
        let encoded = CredentialEncoder::new()
            .secret("pwd")
            .hash_md5()
            .build_and_encode_hex()
            .unwrap();
        let credential = Credential::builder()
            .secret(encoded)
            .hash_algorithm("MD5")
            .hex_encoded()
            .build()
            .unwrap();

        let matcher = DefaultCredentialsMatcher::new();
        assert!(matcher.matches(&Credentials::from("pwd"), &stored(credential)).unwrap());
    }

    #[test]
    fn chars_and_bytes_are_canonicalized() {
        let matcher = DefaultCredentialsMatcher::new();
        let stored = stored(Credential::builder().secret("pwd").build().unwrap());

        let chars = Credentials::Chars(vec!['p', 'w', 'd']);
        let bytes = Credentials::Bytes(b"pwd".to_vec());
        assert!(matcher.matches(&chars, &stored).unwrap());
        assert!(matcher.matches(&bytes, &stored).unwrap());
    }

    #[test]
    fn two_hashed_credentials_compare_digests() {
        let matcher = DefaultCredentialsMatcher::new();
        let encoder = CredentialEncoder::new().secret("pwd").hash_sha1();
        let a = stored(encoder.build_credential().unwrap());
        let b = stored(encoder.build_credential().unwrap());
        assert!(matcher.matches(&a, &b).unwrap());
    }

    #[test]
    fn missing_credentials_are_unexpected() {
        let matcher = DefaultCredentialsMatcher::new();
        let none: Option<Credentials> = None;
        let some = Credentials::from("pwd");

        let err = matcher.matches(&none, &some).unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::UnexpectedCredentials);

        let err = matcher.matches(&some, &none).unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::UnexpectedCredentials);
    }

    #[test]
    fn opaque_credentials_are_unexpected() {
        let matcher = DefaultCredentialsMatcher::new();
        let err = matcher
            .matches(&Credentials::Opaque("i64"), &Credentials::from("42"))
            .unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::UnexpectedCredentials);
    }

    #[test]
    fn undecodable_stored_secret_is_unexpected() {
        let matcher = DefaultCredentialsMatcher::new();
        let broken = stored(
            Credential::builder()
                .secret("not base64!")
                .hash_algorithm("SHA-256")
                .base64_encoded()
                .build()
                .unwrap(),
        );
        let err = matcher.matches(&Credentials::from("pwd"), &broken).unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::UnexpectedCredentials);
    }

    #[test]
    fn file_payload_is_read() {
        let path = std::env::temp_dir().join(format!("warden-matcher-{}.secret", std::process::id()));
        std::fs::write(&path, b"pwd").unwrap();

        let matcher = DefaultCredentialsMatcher::new();
        let result = matcher.matches(&Credentials::File(path.clone()), &Credentials::from("pwd"));
        std::fs::remove_file(&path).unwrap();
        assert!(result.unwrap());

        let err = matcher
            .matches(&Credentials::File(path), &Credentials::from("pwd"))
            .unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::UnexpectedCredentials);
    }

    #[test]
    fn charset_is_applied_to_text() {
        let matcher = DefaultCredentialsMatcher::with_charset(Charset::Latin1);
        let stored = Credentials::Bytes(vec![b'p', 0xE4]);
        assert!(matcher.matches(&Credentials::from("pä"), &stored).unwrap());
    }

    mod proptest_tests {
        use super::*;
        use crate::HashAlgorithm;
        use proptest::prelude::*;

        fn algorithm() -> impl Strategy<Value = HashAlgorithm> {
            prop_oneof![
                Just(HashAlgorithm::Md5),
                Just(HashAlgorithm::Sha1),
                Just(HashAlgorithm::Sha256),
                Just(HashAlgorithm::Sha384),
                Just(HashAlgorithm::Sha512),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 128,
                ..ProptestConfig::default()
            })]

            /// Property: an encoded credential matches exactly its own plaintext.
            #[test]
            fn encoded_credential_round_trip(
                plain in "\\PC{1,24}",
                other in "\\PC{1,24}",
                salt in "[a-z0-9]{0,12}",
                alg in algorithm(),
                iterations in 1u32..5,
            ) {
                let credential = CredentialEncoder::new()
                    .secret(plain.clone())
                    .salt(salt)
                    .hash_algorithm(alg.as_str())
                    .hash_iterations(iterations)
                    .build_credential()
                    .unwrap();
                let stored = Credentials::Stored(credential);
                let matcher = DefaultCredentialsMatcher::new();

                prop_assert!(matcher.matches(&Credentials::from(plain.clone()), &stored).unwrap());
                if other != plain {
                    prop_assert!(!matcher.matches(&Credentials::from(other), &stored).unwrap());
                }
            }
        }
    }
}
