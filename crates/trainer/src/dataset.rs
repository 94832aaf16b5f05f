use rand::Rng;
use vocab::{Lang, Pair, EOS_TOKEN};

/// Source and target id sequences for one sentence pair, both EOS-terminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingPair {
    pub input: Vec<i64>,
    pub target: Vec<i64>,
}

pub fn sequence_from_sentence(lang: &Lang, sentence: &str) -> vocab::Result<Vec<i64>> {
    let mut indexes = lang.indexes_from_sentence(sentence)?;
    indexes.push(EOS_TOKEN);
    Ok(indexes)
}

pub fn sequences_from_pair(input_lang: &Lang, output_lang: &Lang, pair: &Pair) -> vocab::Result<TrainingPair> {
    Ok(TrainingPair {
        input: sequence_from_sentence(input_lang, &pair.input)?,
        target: sequence_from_sentence(output_lang, &pair.target)?,
    })
}

/// Draws `n` pairs uniformly with replacement.
pub fn sample_pairs<'a, R: Rng + ?Sized>(pairs: &'a [Pair], n: usize, rng: &mut R) -> Vec<&'a Pair> {
    if pairs.is_empty() {
        return Vec::new();
    }
    (0..n).map(|_| &pairs[rng.gen_range(0..pairs.len())]).collect()
}
