use log::info;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Result, VocabError};
use crate::lang::Lang;
use crate::normalize::Normalizer;
use crate::MAX_LENGTH;

/// Output-side prefixes kept when prefix filtering is enabled.
pub const ENG_PREFIXES: &[&str] = &[
    "i am ", "i m ",
    "he is ", "he s ",
    "she is ", "she s ",
    "you are ", "you re ",
    "we are ", "we re ",
    "they are ", "they re ",
];

/// An aligned (source, target) sentence pair, already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    pub input: String,
    pub target: String,
}

#[derive(Debug, Clone)]
pub struct CorpusOptions {
    pub lang1: String,
    pub lang2: String,
    /// Swap columns so `lang2` becomes the source language.
    pub reverse: bool,
    pub filter_prefixes: bool,
    pub max_length: usize,
}

impl Default for CorpusOptions {
    fn default() -> Self {
        Self {
            lang1: "eng".to_string(),
            lang2: "fra".to_string(),
            reverse: true,
            filter_prefixes: true,
            max_length: MAX_LENGTH,
        }
    }
}

#[derive(Debug)]
pub struct PreparedData {
    pub input_lang: Lang,
    pub output_lang: Lang,
    pub pairs: Vec<Pair>,
}

/// Reads `lang1<TAB>lang2` lines, normalizing both sides.
pub fn read_pairs<R: BufRead>(reader: R, normalizer: &Normalizer, reverse: bool) -> Result<Vec<Pair>> {
    let mut pairs = Vec::new();
    for (i, line_res) in reader.lines().enumerate() {
        let line = line_res?;
        if line.trim().is_empty() {
            continue;
        }

        let mut columns = line.split('\t');
        let (first, second) = match (columns.next(), columns.next()) {
            (Some(a), Some(b)) => (normalizer.normalize(a), normalizer.normalize(b)),
            _ => {
                return Err(VocabError::MalformedLine {
                    line: i + 1,
                    content: line.clone(),
                })
            }
        };

        let pair = if reverse {
            Pair { input: second, target: first }
        } else {
            Pair { input: first, target: second }
        };
        pairs.push(pair);
    }
    Ok(pairs)
}

pub fn keep_pair(pair: &Pair, options: &CorpusOptions) -> bool {
    let short = pair.input.split(' ').count() < options.max_length
        && pair.target.split(' ').count() < options.max_length;
    if !short {
        return false;
    }
    !options.filter_prefixes || ENG_PREFIXES.iter().any(|prefix| pair.target.starts_with(prefix))
}

/// Builds both vocabularies from the filtered pairs of an in-memory corpus.
pub fn prepare_from_reader<R: BufRead>(reader: R, options: &CorpusOptions) -> Result<PreparedData> {
    let normalizer = Normalizer::new()?;
    let pairs = read_pairs(reader, &normalizer, options.reverse)?;
    let read = pairs.len();

    let pairs: Vec<Pair> = pairs.into_iter().filter(|p| keep_pair(p, options)).collect();
    info!("Read {} sentence pairs, trimmed to {}", read, pairs.len());

    let (input_name, output_name) = if options.reverse {
        (&options.lang2, &options.lang1)
    } else {
        (&options.lang1, &options.lang2)
    };
    let mut input_lang = Lang::new(input_name.as_str());
    let mut output_lang = Lang::new(output_name.as_str());

    for pair in &pairs {
        input_lang.add_sentence(&pair.input);
        output_lang.add_sentence(&pair.target);
    }
    info!(
        "Counted words: {} {}, {} {}",
        input_lang.name, input_lang.n_words, output_lang.name, output_lang.n_words
    );

    Ok(PreparedData {
        input_lang,
        output_lang,
        pairs,
    })
}

pub fn prepare_data<P: AsRef<Path>>(path: P, options: &CorpusOptions) -> Result<PreparedData> {
    let file = File::open(path)?;
    prepare_from_reader(BufReader::new(file), options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const CORPUS: &str = "I am cold.\tJ'ai froid.\n\
                          He is tall.\tIl est grand.\n\
                          Run!\tCours !\n\
                          I am a very very very very very long sentence here.\tC'est long.\n";

    #[test]
    fn reversed_pairs_swap_columns() {
        let normalizer = Normalizer::new().unwrap();
        let pairs = read_pairs(Cursor::new("Go.\tVa !\n"), &normalizer, true).unwrap();
        assert_eq!(
            pairs,
            vec![Pair {
                input: "va !".to_string(),
                target: "go .".to_string()
            }]
        );
    }

    #[test]
    fn malformed_line_is_reported() {
        let normalizer = Normalizer::new().unwrap();
        let err = read_pairs(Cursor::new("no tab here\n"), &normalizer, false).unwrap_err();
        assert!(matches!(err, VocabError::MalformedLine { line: 1, .. }));
    }

    #[test]
    fn prepare_filters_by_length_and_prefix() {
        let data = prepare_from_reader(Cursor::new(CORPUS), &CorpusOptions::default()).unwrap();

        let targets: Vec<&str> = data.pairs.iter().map(|p| p.target.as_str()).collect();
        assert_eq!(targets, vec!["i am cold .", "he is tall ."]);
        assert_eq!(data.input_lang.name, "fra");
        assert_eq!(data.output_lang.name, "eng");
        assert!(data.output_lang.index_of("cold").is_ok());
        assert!(data.output_lang.index_of("run").is_err());
        assert!(data.input_lang.index_of("froid").is_ok());
    }

    #[test]
    fn prefix_filter_can_be_disabled() {
        let options = CorpusOptions {
            filter_prefixes: false,
            ..Default::default()
        };
        let data = prepare_from_reader(Cursor::new(CORPUS), &options).unwrap();
        assert_eq!(data.pairs.len(), 3);
    }
}
