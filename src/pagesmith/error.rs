use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("{0}")]
    Validation(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("{0}")]
    IncompleteDocument(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("File \"{name}\" is too large. Maximum size is {limit_mb}MB.")]
    FileTooLarge { name: String, limit_mb: u64 },

    #[error("File \"{name}\" is not a supported media type ({mime}).")]
    UnsupportedFileType { name: String, mime: String },

    #[error("No item at position {index} (document has {len} items)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("No items selected")]
    NothingSelected,

    #[error("No original order to restore")]
    NothingToRestore,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EditorError {
    /// Errors that come from the environment rather than from user input.
    /// These are worth keeping as a diagnostic record.
    pub fn is_unexpected(&self) -> bool {
        matches!(
            self,
            EditorError::StorageUnavailable(_)
                | EditorError::Io(_)
                | EditorError::Serialization(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, EditorError>;
