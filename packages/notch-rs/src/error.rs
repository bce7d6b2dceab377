use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotchError {
    #[error("Input file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Not a FIF file: {0}")]
    NotFif(String),

    #[error("Failed to parse FIF file: {0}")]
    FifParse(String),

    #[error("Filtering failed: {0}")]
    Filter(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NotchError {
    /// True for errors caused by user input (bad config or missing/unreadable
    /// input files) as opposed to runtime failures.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            NotchError::FileNotFound(_)
                | NotchError::InvalidConfig(_)
                | NotchError::InvalidParameter(_)
                | NotchError::NotFif(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, NotchError>;
