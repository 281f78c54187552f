use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The dataset path does not resolve to a readable file.
    NotFound { path: PathBuf, reason: String },
    /// A required attribute column is absent from the dataset.
    Schema {
        column: String,
        available: Vec<String>,
    },
    /// The file was readable but is not a usable boundary collection.
    InvalidDataset(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound { path, reason } => {
                write!(f, "boundary dataset not found at {}: {reason}", path.display())
            }
            StoreError::Schema { column, available } => {
                write!(
                    f,
                    "column {column:?} missing from dataset (available: {})",
                    available.join(", ")
                )
            }
            StoreError::InvalidDataset(msg) => write!(f, "invalid boundary dataset: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}
