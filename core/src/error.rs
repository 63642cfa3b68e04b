use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage quota exceeded ({needed} bytes, limit {limit})")]
    QuotaExceeded { needed: usize, limit: usize },
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn is_quota(&self) -> bool {
        matches!(self, StoreError::QuotaExceeded { .. })
    }
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("invalid history document: {0}")]
    Format(String),
    #[error("no valid records found in import data")]
    NoValidRecords,
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Please type an answer first.")]
    Empty,
    #[error("\"{0}\" is not a number. Please type digits only.")]
    NotANumber(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    #[error(
        "Oops! Please enter time like this: hours:minutes:seconds (for example, 01:30:45) \
         or minutes:seconds (for example, 05:30) or just seconds (for example, 45). \
         Hours should be less than 1000."
    )]
    InvalidFormat(String),
    #[error(
        "Oops! Please enter a valid number for multiplication or division. \
         The number should be between -1,000,000 and 1,000,000."
    )]
    InvalidNumber(String),
    #[error("Oops! We can't divide by zero. Please try a different number.")]
    DivisionByZero,
    #[error("Unknown operation \"{0}\". Use add, subtract, multiply or divide.")]
    UnknownOperation(String),
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio asset for cue '{0}'")]
    MissingAsset(&'static str),
    #[error("audio playback failed: {0}")]
    Playback(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
