pub mod config;
pub mod decoder;
pub mod embeddings;
pub mod encoder;
pub mod error;
pub mod state;

pub use config::ModelConfig;
pub use decoder::Decoder;
pub use encoder::{Encoded, Encoder};
pub use error::{Result, Seq2SeqError};
pub use state::HiddenState;
