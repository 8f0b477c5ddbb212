//! Sealed envelopes and their persisted representation.
//!
//! Binary layout:
//!
//! ```text
//! magic "SVLT" (4) | version (1) | bincode { kdf, nonce, ciphertext, tag }
//! ```
//!
//! The version byte sits at a fixed offset so it can be read before any
//! decryption attempt. It is also part of the associated data, so a
//! relabelled envelope fails authentication.

use crate::cipher::VersionId;
use crate::config::{ENVELOPE_MAGIC, MAX_ENVELOPE_SIZE};
use crate::crypto::KdfParams;
use crate::error::{Error, Result};
use bincode::Options;
use serde::{Deserialize, Serialize};

/// Length of the fixed header (magic + version).
pub const HEADER_SIZE: usize = ENVELOPE_MAGIC.len() + 1;

/// Everything needed to unseal a secret except the passphrase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedEnvelope {
    /// Cipher version that produced this envelope.
    pub version: VersionId,
    /// Key derivation parameters, including the salt.
    pub kdf: KdfParams,
    /// Per-envelope random nonce.
    pub nonce: Vec<u8>,
    /// Encrypted secret.
    pub ciphertext: Vec<u8>,
    /// Detached authentication tag.
    pub tag: Vec<u8>,
}

#[derive(Serialize)]
struct BodyRef<'a> {
    kdf: &'a KdfParams,
    nonce: &'a [u8],
    ciphertext: &'a [u8],
    tag: &'a [u8],
}

#[derive(Deserialize)]
struct Body {
    kdf: KdfParams,
    nonce: Vec<u8>,
    ciphertext: Vec<u8>,
    tag: Vec<u8>,
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_limit(MAX_ENVELOPE_SIZE)
        .reject_trailing_bytes()
}

/// Associated data authenticated by every cipher version.
pub fn associated_data(version: VersionId, kdf: &KdfParams) -> Vec<u8> {
    let mut aad = Vec::with_capacity(HEADER_SIZE + 13 + kdf.salt.len());
    aad.extend_from_slice(&ENVELOPE_MAGIC);
    aad.push(version.get());
    aad.extend_from_slice(&kdf.encode());
    aad
}

impl SealedEnvelope {
    /// Associated data for this envelope.
    pub fn associated_data(&self) -> Vec<u8> {
        associated_data(self.version, &self.kdf)
    }

    /// Read the version tag without decoding the rest of the envelope.
    pub fn peek_version(data: &[u8]) -> Result<VersionId> {
        if data.len() < HEADER_SIZE {
            return Err(Error::Serialization(format!(
                "envelope too short: {} bytes",
                data.len()
            )));
        }
        if data[..ENVELOPE_MAGIC.len()] != ENVELOPE_MAGIC {
            return Err(Error::InvalidMagic);
        }
        Ok(VersionId::new(data[ENVELOPE_MAGIC.len()]))
    }

    /// Serialize to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let body = BodyRef {
            kdf: &self.kdf,
            nonce: &self.nonce,
            ciphertext: &self.ciphertext,
            tag: &self.tag,
        };

        let mut out = Vec::with_capacity(HEADER_SIZE + self.ciphertext.len() + 128);
        out.extend_from_slice(&ENVELOPE_MAGIC);
        out.push(self.version.get());
        out.extend_from_slice(&codec().serialize(&body)?);
        Ok(out)
    }

    /// Deserialize from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let version = Self::peek_version(data)?;
        let body: Body = codec().deserialize(&data[HEADER_SIZE..])?;

        Ok(Self {
            version,
            kdf: body.kdf,
            nonce: body.nonce,
            ciphertext: body.ciphertext,
            tag: body.tag,
        })
    }

    /// Serialize to a lowercase hex string.
    pub fn to_hex(&self) -> Result<String> {
        Ok(hex::encode(self.to_bytes()?))
    }

    /// Deserialize from a hex string (surrounding whitespace ignored).
    pub fn from_hex(text: &str) -> Result<Self> {
        let data = hex::decode(text.trim())?;
        Self::from_bytes(&data)
    }

    /// Deserialize either the binary or the hex form.
    pub fn from_stored(data: &[u8]) -> Result<Self> {
        if data.starts_with(&ENVELOPE_MAGIC) {
            return Self::from_bytes(data);
        }
        let text = std::str::from_utf8(data).map_err(|_| Error::InvalidMagic)?;
        Self::from_hex(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VaultConfig;

    fn sample() -> SealedEnvelope {
        SealedEnvelope {
            version: VersionId::V2,
            kdf: VaultConfig::new(8, 1, 1).kdf_params(vec![3u8; 32]),
            nonce: vec![1u8; 12],
            ciphertext: b"ciphertext".to_vec(),
            tag: vec![2u8; 16],
        }
    }

    #[test]
    fn test_serialize_deserialize() {
        let envelope = sample();
        let bytes = envelope.to_bytes().unwrap();

        assert_eq!(&bytes[..4], b"SVLT");
        assert_eq!(bytes[4], 2);
        assert_eq!(SealedEnvelope::from_bytes(&bytes).unwrap(), envelope);
    }

    #[test]
    fn test_peek_version() {
        let bytes = sample().to_bytes().unwrap();
        assert_eq!(SealedEnvelope::peek_version(&bytes).unwrap(), VersionId::V2);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = sample().to_bytes().unwrap();
        bytes[0] = b'X';

        assert!(matches!(
            SealedEnvelope::from_bytes(&bytes),
            Err(Error::InvalidMagic)
        ));
    }

    #[test]
    fn test_truncated_header() {
        assert!(matches!(
            SealedEnvelope::peek_version(b"SVL"),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn test_truncated_body() {
        let bytes = sample().to_bytes().unwrap();
        let result = SealedEnvelope::from_bytes(&bytes[..bytes.len() - 3]);

        assert!(matches!(result, Err(Error::Serialization(_))));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = sample().to_bytes().unwrap();
        bytes.push(0);

        assert!(SealedEnvelope::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_hex_and_stored_forms() {
        let envelope = sample();
        let text = envelope.to_hex().unwrap();

        assert_eq!(SealedEnvelope::from_hex(&text).unwrap(), envelope);
        assert_eq!(
            SealedEnvelope::from_stored(format!("{}\n", text).as_bytes()).unwrap(),
            envelope
        );
        assert_eq!(
            SealedEnvelope::from_stored(&envelope.to_bytes().unwrap()).unwrap(),
            envelope
        );
    }

    #[test]
    fn test_associated_data_binds_version_and_salt() {
        let envelope = sample();
        let mut other = sample();
        other.version = VersionId::V1;
        let mut resalted = sample();
        resalted.kdf.salt[0] ^= 1;

        assert_ne!(envelope.associated_data(), other.associated_data());
        assert_ne!(envelope.associated_data(), resalted.associated_data());
    }

    #[test]
    fn test_json_inspection() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["version"], 2);
        assert_eq!(json["kdf"]["memory_cost"], 8);
    }
}
