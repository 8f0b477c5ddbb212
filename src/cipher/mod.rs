//! Versioned authenticated-encryption schemes.
//!
//! Every shipped on-disk format gets its own [`CipherVersion`]
//! implementation. A version's wire format is frozen once released; new
//! schemes are added as new versions, never by changing an existing one.
//!
//! | Version | Scheme | Nonce | Tag |
//! |---|---|---|---|
//! | v1 | XChaCha20-Poly1305 | 24 bytes | 16 bytes |
//! | v2 | AES-256-GCM | 12 bytes | 16 bytes |

mod v1_xchacha;
mod v2_aes_gcm;

pub use v1_xchacha::XChaCha20Poly1305V1;
pub use v2_aes_gcm::AesGcmV2;

use crate::crypto::DerivedKeys;
use crate::envelope::SealedEnvelope;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

/// Identifier of an on-disk cipher format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(u8);

impl VersionId {
    /// XChaCha20-Poly1305 (legacy).
    pub const V1: VersionId = VersionId(1);

    /// AES-256-GCM.
    pub const V2: VersionId = VersionId(2);

    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl From<u8> for VersionId {
    fn from(id: u8) -> Self {
        Self(id)
    }
}

/// One shipped encryption scheme.
///
/// Implementations are stateless and self-contained: no version may rely
/// on another version's internals.
pub trait CipherVersion: Send + Sync {
    /// Identifier stamped on every envelope this version produces.
    fn identifier(&self) -> VersionId;

    /// Human-readable scheme name.
    fn name(&self) -> &'static str;

    /// Seal `plaintext` under `keys` with a fresh random nonce.
    ///
    /// The tag covers the ciphertext, the version identifier and the KDF
    /// parameters carried in `keys`.
    fn encrypt(&self, plaintext: &str, keys: &DerivedKeys) -> Result<SealedEnvelope>;

    /// Open an envelope produced by [`encrypt`](Self::encrypt).
    ///
    /// The tag is verified before any plaintext is released.
    fn decrypt(&self, envelope: &SealedEnvelope, keys: &DerivedKeys) -> Result<Zeroizing<String>>;
}

/// Structural checks every version runs before touching the AEAD.
pub(crate) fn check_layout(
    cipher: &dyn CipherVersion,
    envelope: &SealedEnvelope,
    nonce_size: usize,
    tag_size: usize,
) -> Result<()> {
    if envelope.version != cipher.identifier() {
        return Err(Error::DecryptionFailure(format!(
            "envelope stamped {} cannot be opened by {}",
            envelope.version,
            cipher.identifier()
        )));
    }
    if envelope.nonce.len() != nonce_size {
        return Err(Error::DecryptionFailure(format!(
            "nonce must be {} bytes, found {}",
            nonce_size,
            envelope.nonce.len()
        )));
    }
    if envelope.tag.len() != tag_size {
        return Err(Error::DecryptionFailure(format!(
            "tag must be {} bytes, found {}",
            tag_size,
            envelope.tag.len()
        )));
    }
    Ok(())
}

/// Turn an authenticated plaintext buffer into a string, wiping it on failure.
pub(crate) fn into_utf8(buffer: Vec<u8>) -> Result<Zeroizing<String>> {
    match String::from_utf8(buffer) {
        Ok(s) => Ok(Zeroizing::new(s)),
        Err(e) => {
            drop(Zeroizing::new(e.into_bytes()));
            Err(Error::DecryptionFailure(
                "plaintext is not valid UTF-8".to_string(),
            ))
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::VaultConfig;
    use crate::crypto::DerivedKeys;

    pub fn keys(byte: u8) -> DerivedKeys {
        DerivedKeys::from_raw([byte; 32], VaultConfig::new(8, 1, 1).kdf_params(vec![1u8; 32]))
    }
}
