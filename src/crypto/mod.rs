//! Cryptographic building blocks shared by every cipher version.
//!
//! This module provides:
//! - Access to the platform CSPRNG (no fallback source)
//! - Argon2id password-based key derivation with HKDF sub-key expansion

mod entropy;
mod kdf;

pub use entropy::{fill_random, random_vec};
pub use kdf::{derive, DerivedKeys, KdfParams, KeyDerivation};
