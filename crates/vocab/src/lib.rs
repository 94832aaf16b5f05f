pub mod error;
pub mod lang;
pub mod normalize;
pub mod pairs;

pub use error::{Result, VocabError};
pub use lang::Lang;
pub use normalize::Normalizer;
pub use pairs::{prepare_data, CorpusOptions, Pair, PreparedData};

/// Start-of-sequence token id, reserved in every vocabulary.
pub const SOS_TOKEN: i64 = 0;
/// End-of-sequence token id, reserved in every vocabulary.
pub const EOS_TOKEN: i64 = 1;
/// Sentences must have fewer words than this to enter the corpus.
pub const MAX_LENGTH: usize = 10;
