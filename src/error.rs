use thiserror::Error;

/// Application-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// I/O errors from the store file, log directory or terminal.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal initialization or rendering errors.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// The persisted tree could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The key-value store rejected a read or write.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// A user action refused at the input boundary.
///
/// None of these leave partial state behind: the forest is untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("Name cannot be empty")]
    EmptyName,

    #[error("Please select a folder to upload files to.")]
    InvalidUploadTarget,

    #[error("No files selected for upload")]
    NoFiles,

    #[error("An upload is already in progress")]
    UploadInProgress,
}
