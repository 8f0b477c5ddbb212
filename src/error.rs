//! Error types for the secret vault.

use crate::cipher::VersionId;
use thiserror::Error;

/// Result type alias for vault operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Message shown to users for a failed authentication.
pub const MSG_INCORRECT_PASSPHRASE: &str = "Incorrect passphrase";

/// Message shown to users for every other failure.
pub const MSG_UNREADABLE: &str = "Unable to read secure data";

/// Errors that can occur in vault operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The passphrase or secret handed to the KDF was empty.
    #[error("Secret is too weak: an empty secret cannot be used for key derivation")]
    WeakSecret,

    /// Key derivation could not run (unsupported or out-of-range parameters).
    #[error("Key derivation failed: {0}")]
    DerivationFailure(String),

    /// The platform CSPRNG could not be read.
    #[error("Secure random source unavailable: {0}")]
    EntropyUnavailable(String),

    /// The AEAD primitive refused to encrypt.
    #[error("Encryption failed: {0}")]
    EncryptionFailure(String),

    /// Malformed envelope (wrong lengths, wrong version for this cipher, bad UTF-8).
    #[error("Decryption failed: {0}")]
    DecryptionFailure(String),

    /// Tag mismatch: wrong passphrase or tampered data.
    #[error("Authentication failed: wrong passphrase or tampered data")]
    AuthenticationFailure,

    /// No cipher implementation registered for this version.
    #[error("Unsupported cipher version: {0}")]
    UnsupportedVersion(VersionId),

    /// Serialized data does not start with the envelope magic.
    #[error("Invalid envelope format: expected magic 'SVLT'")]
    InvalidMagic,

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid vault or registry configuration.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error means the passphrase was wrong (or the data tampered).
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, Error::AuthenticationFailure)
    }

    /// The message a host application should show to the user.
    ///
    /// Structural failures collapse into one message so the UI never reveals
    /// which check rejected the data.
    pub fn user_message(&self) -> &'static str {
        if self.is_authentication_failure() {
            MSG_INCORRECT_PASSPHRASE
        } else {
            MSG_UNREADABLE
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<hex::FromHexError> for Error {
    fn from(e: hex::FromHexError) -> Self {
        Error::Serialization(e.to_string())
    }
}
