use thiserror::Error;

#[derive(Error, Debug)]
pub enum Seq2SeqError {
    #[error("Torch error: {0}")]
    Torch(#[from] tch::TchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Safetensors error: {0}")]
    Safetensors(#[from] safetensors::SafeTensorError),

    #[error("Shape mismatch for {what}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        what: String,
        expected: Vec<i64>,
        actual: Vec<i64>,
    },

    #[error("hidden_size must be even and positive, got {0}")]
    InvalidHiddenSize(i64),

    #[error("Direction axis must be even and non-zero, got {0}")]
    OddDirectionAxis(i64),

    #[error("Input sequence of length {length} exceeds max length {max_length}")]
    SequenceTooLong { length: usize, max_length: usize },

    #[error("Target sequence is empty")]
    EmptyTarget,

    #[error("Unsupported embedding matrix format: {0}")]
    UnsupportedEmbeddingFormat(String),
}

pub type Result<T> = std::result::Result<T, Seq2SeqError>;
