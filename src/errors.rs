use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in ak.
#[derive(Debug, Error)]
pub enum AkError {
    // --- Not found (non-fatal for the process, reported to the user) ---
    #[error("Profile '{0}' not found")]
    ProfileNotFound(String),

    #[error("'{0}' not found")]
    KeyNotFound(String),

    #[error("No profiles are bound to {0}")]
    BindingNotFound(PathBuf),

    // --- Crypto / backend errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Encryption backend unavailable: {0}")]
    BackendUnavailable(String),

    // --- Name validation ---
    #[error("Invalid profile name '{0}': {1}")]
    InvalidProfileName(String, String),

    #[error("Invalid key name '{0}': {1}")]
    InvalidKeyName(String, String),

    #[error("Invalid directory '{0}': directory bindings require an absolute path")]
    InvalidDirectory(PathBuf),

    // --- Format errors ---
    #[error("Invalid vault format: {0}")]
    InvalidVaultFormat(String),

    #[error("Import parse error: {0}")]
    ImportParse(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- Config errors ---
    #[error("Config error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Keyring / clipboard ---
    #[error("Keyring error: {0}")]
    KeyringError(String),

    #[error("Clipboard error: {0}")]
    ClipboardError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,
}

impl AkError {
    /// Whether this error only reports something missing.
    ///
    /// The CLI uses this to phrase the message as information rather than
    /// as a failure of the storage layer.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ProfileNotFound(_) | Self::KeyNotFound(_) | Self::BindingNotFound(_)
        )
    }
}

/// Convenience type alias for ak results.
pub type Result<T> = std::result::Result<T, AkError>;
