//! Configuration constants and types for the secret vault.

use crate::crypto::KdfParams;
use serde::{Deserialize, Serialize};

/// Envelope magic number: "SVLT" in bytes.
pub const ENVELOPE_MAGIC: [u8; 4] = [0x53, 0x56, 0x4c, 0x54];

/// Upper bound on a serialized envelope body.
///
/// Sealed items are seeds, keys and tokens; anything larger is rejected
/// before bincode allocates for it.
pub const MAX_ENVELOPE_SIZE: u64 = 1024 * 1024;

/// Argon2id parameters for key derivation.
pub mod argon2_params {
    /// Memory cost in KiB (64 MB).
    pub const MEMORY_COST: u32 = 65536;

    /// Time cost (iterations).
    pub const TIME_COST: u32 = 3;

    /// Parallelism factor.
    pub const PARALLELISM: u32 = 4;

    /// Output length in bytes (256 bits).
    pub const OUTPUT_LENGTH: usize = 32;

    /// Salt length in bytes for newly sealed envelopes.
    pub const SALT_LENGTH: usize = 32;

    /// Shortest salt accepted from a stored envelope.
    pub const MIN_SALT_LENGTH: usize = 16;

    /// Longest salt accepted from a stored envelope.
    pub const MAX_SALT_LENGTH: usize = 64;

    /// Largest memory cost an envelope may request (1 GiB).
    pub const MAX_MEMORY_COST: u32 = 1024 * 1024;

    /// Largest iteration count an envelope may request.
    pub const MAX_TIME_COST: u32 = 64;

    /// Largest parallelism an envelope may request.
    pub const MAX_PARALLELISM: u32 = 16;
}

/// AEAD sizes for each shipped cipher version.
pub mod cipher_params {
    /// Key size shared by every version (256 bits).
    pub const KEY_SIZE: usize = 32;

    /// XChaCha20-Poly1305 nonce size (192 bits).
    pub const XCHACHA_NONCE_SIZE: usize = 24;

    /// AES-GCM nonce size (96 bits).
    pub const GCM_NONCE_SIZE: usize = 12;

    /// Poly1305 / GHASH authentication tag size (128 bits).
    pub const TAG_SIZE: usize = 16;
}

/// Configuration for sealing new envelopes.
///
/// Only affects `seal`; `unseal` always uses the parameters stored in the
/// envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Argon2id memory cost in KiB.
    pub memory_cost: u32,

    /// Argon2id iterations.
    pub time_cost: u32,

    /// Argon2id lanes.
    pub parallelism: u32,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            memory_cost: argon2_params::MEMORY_COST,
            time_cost: argon2_params::TIME_COST,
            parallelism: argon2_params::PARALLELISM,
        }
    }
}

impl VaultConfig {
    /// Create a new vault configuration with custom KDF costs.
    pub fn new(memory_cost: u32, time_cost: u32, parallelism: u32) -> Self {
        Self {
            memory_cost,
            time_cost,
            parallelism,
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.parallelism == 0 || self.parallelism > argon2_params::MAX_PARALLELISM {
            return Err(format!(
                "Parallelism must be between 1 and {}",
                argon2_params::MAX_PARALLELISM
            ));
        }
        if self.time_cost == 0 || self.time_cost > argon2_params::MAX_TIME_COST {
            return Err(format!(
                "Time cost must be between 1 and {}",
                argon2_params::MAX_TIME_COST
            ));
        }
        // Argon2 needs at least 8 KiB per lane.
        let min_memory = 8 * self.parallelism;
        if self.memory_cost < min_memory || self.memory_cost > argon2_params::MAX_MEMORY_COST {
            return Err(format!(
                "Memory cost must be between {} and {} KiB",
                min_memory,
                argon2_params::MAX_MEMORY_COST
            ));
        }
        Ok(())
    }

    /// Whether the costs are below the recommended production values.
    pub fn is_below_recommended(&self) -> bool {
        self.memory_cost < argon2_params::MEMORY_COST || self.time_cost < argon2_params::TIME_COST
    }

    /// KDF parameters for a new envelope, using the given fresh salt.
    pub fn kdf_params(&self, salt: Vec<u8>) -> KdfParams {
        KdfParams {
            memory_cost: self.memory_cost,
            time_cost: self.time_cost,
            parallelism: self.parallelism,
            salt,
        }
    }
}
