//! Version 1: XChaCha20-Poly1305.
//!
//! Superseded by v2 for new seals; kept registered so envelopes written by
//! earlier releases still open.

use crate::cipher::{check_layout, into_utf8, CipherVersion, VersionId};
use crate::config::cipher_params::{TAG_SIZE, XCHACHA_NONCE_SIZE};
use crate::crypto::{fill_random, DerivedKeys};
use crate::envelope::{associated_data, SealedEnvelope};
use crate::error::{Error, Result};
use chacha20poly1305::aead::{AeadInPlace, KeyInit, Tag};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use zeroize::Zeroizing;

const KEY_LABEL: &[u8] = b"secret-vault/v1/xchacha20-poly1305/enc";

/// XChaCha20-Poly1305 with a random 192-bit nonce per seal.
#[derive(Debug, Clone, Copy, Default)]
pub struct XChaCha20Poly1305V1;

impl XChaCha20Poly1305V1 {
    fn cipher(keys: &DerivedKeys) -> Result<XChaCha20Poly1305> {
        let key = keys.expand(KEY_LABEL)?;
        XChaCha20Poly1305::new_from_slice(key.as_ref())
            .map_err(|e| Error::EncryptionFailure(e.to_string()))
    }
}

impl CipherVersion for XChaCha20Poly1305V1 {
    fn identifier(&self) -> VersionId {
        VersionId::V1
    }

    fn name(&self) -> &'static str {
        "XChaCha20-Poly1305"
    }

    fn encrypt(&self, plaintext: &str, keys: &DerivedKeys) -> Result<SealedEnvelope> {
        let cipher = Self::cipher(keys)?;

        let mut nonce_bytes = [0u8; XCHACHA_NONCE_SIZE];
        fill_random(&mut nonce_bytes)?;
        let nonce = XNonce::from_slice(&nonce_bytes);

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
        check_layout(self, envelope, XCHACHA_NONCE_SIZE, TAG_SIZE)?;
        let cipher = Self::cipher(keys)?;

        let nonce = XNonce::from_slice(&envelope.nonce);
        let tag = Tag::<XChaCha20Poly1305>::from_slice(&envelope.tag);
        let aad = associated_data(envelope.version, &envelope.kdf);

        let mut buffer = Zeroizing::new(envelope.ciphertext.clone());
        cipher
            .decrypt_in_place_detached(nonce, &aad, &mut buffer, tag)
            .map_err(|_| Error::AuthenticationFailure)?;

        into_utf8(std::mem::take(&mut *buffer))
    }
}
