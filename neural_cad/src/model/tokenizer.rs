//! Token id / text conversion.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{NeuralCadError, Result};

/// The two tokenizer capabilities the pipeline needs.
pub trait Tokenizer {
    /// Id of an exact token string, special tokens included.
    fn token_to_id(&self, token: &str) -> Option<u32>;

    /// Decode ids to text, keeping special tokens.
    fn decode(&self, ids: &[u32]) -> Result<String>;
}

impl Tokenizer for tokenizers::Tokenizer {
    fn token_to_id(&self, token: &str) -> Option<u32> {
        std::ops::Deref::deref(self).token_to_id(token)
    }

    fn decode(&self, ids: &[u32]) -> Result<String> {
        std::ops::Deref::deref(self).decode(ids, false)
            .map_err(|e| NeuralCadError::Tokenizer(e.to_string()))
    }
}

/// Load a `tokenizer.json` file.
pub fn load_tokenizer<P: AsRef<Path>>(path: P) -> Result<tokenizers::Tokenizer> {
    let path = path.as_ref();
    log::info!("Loading tokenizer from {:?}", path);
    tokenizers::Tokenizer::from_file(path)
        .map_err(|e| NeuralCadError::Tokenizer(format!("{:?}: {}", path, e)))
}

/// Minimal tokenizer over a fixed vocabulary where each id decodes to its
/// token string verbatim.
#[derive(Debug, Clone, Default)]
pub struct VocabTokenizer {
    tokens: Vec<String>,
    ids: HashMap<String, u32>,
}

impl VocabTokenizer {
    /// Build from tokens in id order.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        let ids = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i as u32))
            .collect();
        Self { tokens, ids }
    }

    /// Vocabulary size.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the vocabulary is empty.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Tokenizer for VocabTokenizer {
    fn token_to_id(&self, token: &str) -> Option<u32> {
        self.ids.get(token).copied()
    }

    fn decode(&self, ids: &[u32]) -> Result<String> {
        ids.iter()
            .map(|&id| {
                self.tokens
                    .get(id as usize)
                    .map(String::as_str)
                    .ok_or_else(|| NeuralCadError::Tokenizer(format!("id {} out of range", id)))
            })
            .collect()
    }
}
