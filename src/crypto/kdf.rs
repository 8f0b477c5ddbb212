//! Argon2id key derivation for passphrase-based sealing.

use crate::config::{argon2_params, cipher_params::KEY_SIZE, VaultConfig};
use crate::crypto::entropy::random_vec;
use crate::error::{Error, Result};
use argon2::{Algorithm, Argon2, Params, Version};
use hkdf::Hkdf;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Argon2id parameters stored alongside every sealed envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    /// Number of iterations.
    pub time_cost: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
    /// Per-envelope random salt.
    pub salt: Vec<u8>,
}

impl KdfParams {
    /// Check that the parameters are safe to run.
    ///
    /// Envelopes are untrusted input, so costs are bounded before Argon2
    /// allocates anything.
    pub fn validate(&self) -> Result<()> {
        let salt_len = self.salt.len();
        if !(argon2_params::MIN_SALT_LENGTH..=argon2_params::MAX_SALT_LENGTH).contains(&salt_len) {
            return Err(Error::DerivationFailure(format!(
                "salt length {} outside {}..={}",
                salt_len,
                argon2_params::MIN_SALT_LENGTH,
                argon2_params::MAX_SALT_LENGTH
            )));
        }
        if self.memory_cost > argon2_params::MAX_MEMORY_COST
            || self.time_cost > argon2_params::MAX_TIME_COST
            || self.parallelism > argon2_params::MAX_PARALLELISM
        {
            return Err(Error::DerivationFailure(format!(
                "cost parameters m={} t={} p={} exceed limits",
                self.memory_cost, self.time_cost, self.parallelism
            )));
        }
        Ok(())
    }

    /// Canonical byte encoding, authenticated as part of the associated data.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(13 + self.salt.len());
        out.extend_from_slice(&self.memory_cost.to_le_bytes());
        out.extend_from_slice(&self.time_cost.to_le_bytes());
        out.extend_from_slice(&self.parallelism.to_le_bytes());
        // validate() caps the salt well below 256 bytes
        out.push(self.salt.len() as u8);
        out.extend_from_slice(&self.salt);
        out
    }
}

/// Key material derived from a passphrase.
///
/// Holds the Argon2id output and the parameters that produced it. The key
/// bytes are wiped when the value is dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKeys {
    master: [u8; KEY_SIZE],
    #[zeroize(skip)]
    params: KdfParams,
}

impl DerivedKeys {
    /// Parameters (including salt) used to derive these keys.
    pub fn params(&self) -> &KdfParams {
        &self.params
    }

    /// Expand a 256-bit sub-key for `label` with HKDF-SHA256.
    ///
    /// Each cipher version uses its own labels, so a key derived for one
    /// version is never used by another.
    pub fn expand(&self, label: &[u8]) -> Result<Zeroizing<[u8; KEY_SIZE]>> {
        let hk = Hkdf::<Sha256>::new(None, &self.master);
        let mut okm = Zeroizing::new([0u8; KEY_SIZE]);
        hk.expand(label, okm.as_mut())
            .map_err(|e| Error::DerivationFailure(e.to_string()))?;
        Ok(okm)
    }

    #[cfg(test)]
    pub(crate) fn from_raw(master: [u8; KEY_SIZE], params: KdfParams) -> Self {
        Self { master, params }
    }
}

impl fmt::Debug for DerivedKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKeys")
            .field("master", &"[redacted]")
            .field("params", &self.params)
            .finish()
    }
}

/// Key derivation using Argon2id.
#[derive(Debug, Clone)]
pub struct KeyDerivation {
    params: KdfParams,
}

impl KeyDerivation {
    /// Create a KDF with the configured costs and a fresh random salt.
    pub fn new(config: &VaultConfig) -> Result<Self> {
        let salt = random_vec(argon2_params::SALT_LENGTH)?;
        Ok(Self {
            params: config.kdf_params(salt),
        })
    }

    /// Create a KDF from stored parameters (for unsealing).
    pub fn from_params(params: KdfParams) -> Self {
        Self { params }
    }

    /// Derive keys from a passphrase.
    ///
    /// Deterministic for a given passphrase, salt and cost triple.
    pub fn derive_keys(&self, secret: &str) -> Result<DerivedKeys> {
        if secret.is_empty() {
            return Err(Error::WeakSecret);
        }
        self.params.validate()?;

        let params = Params::new(
            self.params.memory_cost,
            self.params.time_cost,
            self.params.parallelism,
            Some(argon2_params::OUTPUT_LENGTH),
        )
        .map_err(|e| Error::DerivationFailure(e.to_string()))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut master = Zeroizing::new([0u8; KEY_SIZE]);
        argon2
            .hash_password_into(secret.as_bytes(), &self.params.salt, master.as_mut())
            .map_err(|e| Error::DerivationFailure(e.to_string()))?;

        Ok(DerivedKeys {
            master: *master,
            params: self.params.clone(),
        })
    }
}

/// Derive keys from `secret`.
///
/// Without a `salt` a fresh one is generated and returned inside the
/// bundle; without a `config` the default production costs apply.
pub fn derive(
    secret: &str,
    salt: Option<&[u8]>,
    config: Option<&VaultConfig>,
) -> Result<DerivedKeys> {
    let default_config = VaultConfig::default();
    let config = config.unwrap_or(&default_config);

    let kdf = match salt {
        Some(salt) => KeyDerivation::from_params(config.kdf_params(salt.to_vec())),
        None => KeyDerivation::new(config)?,
    };
    kdf.derive_keys(secret)
}
