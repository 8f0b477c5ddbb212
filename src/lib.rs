//! Secret Vault
//!
//! Versioned authenticated encryption for small secrets at rest: wallet
//! seeds, private keys, session tokens.
//!
//! # Features
//!
//! - **Versioned ciphers**: every shipped format stays readable; new seals use the newest
//! - **Argon2id key derivation**: parameters and salt travel inside each envelope
//! - **Authenticated headers**: the version tag and KDF parameters are covered by the AEAD tag
//! - **Zeroized key material**: derived keys and plaintexts are wiped on drop
//!
//! # Architecture
//!
//! ```text
//! Passphrase → Argon2id → HKDF (per version) → AEAD → SealedEnvelope
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use secret_vault::Vault;
//!
//! let vault = Vault::default();
//!
//! let envelope = vault.seal("my twelve word seed phrase", "correct-horse").unwrap();
//! let bytes = envelope.to_bytes().unwrap();
//!
//! // ... persist `bytes`, read them back later ...
//!
//! let envelope = secret_vault::SealedEnvelope::from_bytes(&bytes).unwrap();
//! let secret = vault.unseal(&envelope, "correct-horse").unwrap();
//! assert_eq!(secret.as_str(), "my twelve word seed phrase");
//! ```

pub mod cipher;
pub mod config;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod registry;
pub mod store;
pub mod vault;

pub use cipher::{CipherVersion, VersionId};
pub use config::VaultConfig;
pub use envelope::SealedEnvelope;
pub use error::{Error, Result};
pub use registry::CipherRegistry;
pub use vault::{MigrationStatus, Vault};
