use thiserror::Error;

#[derive(Error, Debug)]
pub enum VocabError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Word not found in vocabulary: {0}")]
    WordNotFound(String),

    #[error("Malformed corpus line {line}: {content:?}")]
    MalformedLine { line: usize, content: String },
}

pub type Result<T> = std::result::Result<T, VocabError>;
