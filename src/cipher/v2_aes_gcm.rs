//! Version 2: AES-256-GCM.

use crate::cipher::{check_layout, into_utf8, CipherVersion, VersionId};
use crate::config::cipher_params::{GCM_NONCE_SIZE, TAG_SIZE};
use crate::crypto::{fill_random, DerivedKeys};
use crate::envelope::{associated_data, SealedEnvelope};
use crate::error::{Error, Result};
use aes_gcm::aead::{AeadInPlace, Tag};
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use zeroize::Zeroizing;

/// HKDF label for the v2 encryption key.
const KEY_LABEL: &[u8] = b"secret-vault/v2/aes-256-gcm/enc";

/// AES-256-GCM with a random 96-bit nonce per seal.
///
/// Envelope layout: `nonce` 12 bytes, `ciphertext` same length as the
/// plaintext, detached `tag` 16 bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct AesGcmV2;

impl AesGcmV2 {
    fn cipher(keys: &DerivedKeys) -> Result<Aes256Gcm> {
        let key = keys.expand(KEY_LABEL)?;
        Aes256Gcm::new_from_slice(key.as_ref())
            .map_err(|e| Error::EncryptionFailure(e.to_string()))
    }
}

impl CipherVersion for AesGcmV2 {
    fn identifier(&self) -> VersionId {
        VersionId::V2
    }

    fn name(&self) -> &'static str {
        "AES-256-GCM"
    }

    fn encrypt(&self, plaintext: &str, keys: &DerivedKeys) -> Result<SealedEnvelope> {
        let cipher = Self::cipher(keys)?;

        let mut nonce_bytes = [0u8; GCM_NONCE_SIZE];
        fill_random(&mut nonce_bytes)?;
        let nonce = Nonce::from_slice(&nonce_bytes);

        let aad = associated_data(self.identifier(), keys.params());
        let mut buffer = Zeroizing::new(plaintext.as_bytes().to_vec());
        let tag = cipher
            .encrypt_in_place_detached(nonce, &aad, &mut buffer)
            .map_err(|e| Error::EncryptionFailure(e.to_string()))?;

        Ok(SealedEnvelope {
            version: self.identifier(),
            kdf: keys.params().clone(),
            nonce: nonce_bytes.to_vec(),
            ciphertext: std::mem::take(&mut *buffer),
            tag: tag.to_vec(),
        })
    }

    fn decrypt(&self, envelope: &SealedEnvelope, keys: &DerivedKeys) -> Result<Zeroizing<String>> {
        check_layout(self, envelope, GCM_NONCE_SIZE, TAG_SIZE)?;
        let cipher = Self::cipher(keys)?;

        let nonce = Nonce::from_slice(&envelope.nonce);
        let tag = Tag::<Aes256Gcm>::from_slice(&envelope.tag);
        let aad = associated_data(envelope.version, &envelope.kdf);

        let mut buffer = Zeroizing::new(envelope.ciphertext.clone());
        cipher
            .decrypt_in_place_detached(nonce, &aad, &mut buffer, tag)
            .map_err(|_| Error::AuthenticationFailure)?;

        into_utf8(std::mem::take(&mut *buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::test_support::keys;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let keys = keys(0x42);
        let envelope = AesGcmV2.encrypt("abandon ability able", &keys).unwrap();

        assert_eq!(envelope.version, VersionId::V2);
        assert_eq!(envelope.nonce.len(), GCM_NONCE_SIZE);
        assert_eq!(envelope.tag.len(), TAG_SIZE);
        assert_eq!(envelope.kdf, *keys.params());

        let plaintext = AesGcmV2.decrypt(&envelope, &keys).unwrap();
        assert_eq!(plaintext.as_str(), "abandon ability able");
    }

    #[test]
    fn test_wrong_key_fails() {
        let envelope = AesGcmV2.encrypt("secret", &keys(0x42)).unwrap();
        let result = AesGcmV2.decrypt(&envelope, &keys(0x43));

        assert!(matches!(result, Err(Error::AuthenticationFailure)));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let keys = keys(0x42);
        let mut envelope = AesGcmV2.encrypt("secret", &keys).unwrap();
        envelope.ciphertext[0] ^= 0x01;

        assert!(matches!(
            AesGcmV2.decrypt(&envelope, &keys),
            Err(Error::AuthenticationFailure)
        ));
    }

    #[test]
    fn test_tampered_kdf_params_fail() {
        let keys = keys(0x42);
        let mut envelope = AesGcmV2.encrypt("secret", &keys).unwrap();
        envelope.kdf.time_cost += 1;

        assert!(matches!(
            AesGcmV2.decrypt(&envelope, &keys),
            Err(Error::AuthenticationFailure)
        ));
    }

    #[test]
    fn test_short_tag_is_malformed() {
        let keys = keys(0x42);
        let mut envelope = AesGcmV2.encrypt("secret", &keys).unwrap();
        envelope.tag.pop();

        assert!(matches!(
            AesGcmV2.decrypt(&envelope, &keys),
            Err(Error::DecryptionFailure(_))
        ));
    }

    #[test]
    fn test_wrong_nonce_length_is_malformed() {
        let keys = keys(0x42);
        let mut envelope = AesGcmV2.encrypt("secret", &keys).unwrap();
        envelope.nonce.extend_from_slice(&[0u8; 12]);

        assert!(matches!(
            AesGcmV2.decrypt(&envelope, &keys),
            Err(Error::DecryptionFailure(_))
        ));
    }

    #[test]
    fn test_different_nonces_produce_different_ciphertexts() {
        let keys = keys(0x42);
        let enc1 = AesGcmV2.encrypt("same input", &keys).unwrap();
        let enc2 = AesGcmV2.encrypt("same input", &keys).unwrap();

        assert_ne!(enc1.nonce, enc2.nonce);
        assert_ne!(enc1.ciphertext, enc2.ciphertext);
    }

    #[test]
    fn test_ciphertext_replaces_plaintext_bytes() {
        let keys = keys(0x42);
        let plaintext = "abandon ability able about above";
        let envelope = AesGcmV2.encrypt(plaintext, &keys).unwrap();

        assert_eq!(envelope.ciphertext.len(), plaintext.len());
        assert_ne!(envelope.ciphertext, plaintext.as_bytes());
    }

    #[test]
    fn test_empty_plaintext_roundtrip() {
        let keys = keys(0x42);
        let envelope = AesGcmV2.encrypt("", &keys).unwrap();

        assert!(envelope.ciphertext.is_empty());
        assert!(AesGcmV2.decrypt(&envelope, &keys).unwrap().is_empty());
    }
}
