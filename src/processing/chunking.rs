//! Token-bounded chunking for summarization input.
//!
//! The summarization model only accepts a fixed token budget per invocation,
//! so long documents are split on exact token boundaries. Token counting uses
//! `tiktoken` encodings; the configured name may be an encoding or a model
//! alias, resolved the same way in either case with a `cl100k_base` fallback.

use anyhow::Error as TokenizerError;
use std::sync::Arc;
use tiktoken_rs::{
    CoreBPE, cl100k_base, get_bpe_from_model, o200k_base, p50k_base, p50k_edit, r50k_base,
};

use super::types::ChunkingError;

const DEFAULT_ENCODING: &str = "cl100k_base";

/// Splits text into an ordered sequence of segments within a token budget.
pub struct TokenChunker {
    encoding: Arc<CoreBPE>,
}

impl TokenChunker {
    /// Build a chunker for the given encoding name, defaulting to
    /// `cl100k_base` when none is configured.
    pub fn new(encoding_name: Option<&str>) -> Result<Self, ChunkingError> {
        let target = match encoding_name.map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => DEFAULT_ENCODING,
        };
        let encoding = resolve_encoding(target).map_err(|source| ChunkingError::Tokenizer {
            encoding: target.to_string(),
            source,
        })?;
        Ok(Self {
            encoding: Arc::new(encoding),
        })
    }

    /// Count the tokens the summarization model will see for `text`.
    pub fn count_tokens(&self, text: &str) -> usize {
        self.encoding.encode_ordinary(text).len()
    }

    /// Split `text` into chunks of at most `max_tokens` tokens each.
    ///
    /// A text within the budget is returned verbatim as a single chunk, with
    /// no round-trip through the tokenizer, so its formatting is preserved
    /// exactly. Longer texts are re-materialized from consecutive token
    /// slices: every chunk but the last holds exactly `max_tokens` tokens,
    /// the remainder forms the last chunk, and token order is preserved.
    pub fn chunk(&self, text: &str, max_tokens: usize) -> Result<Vec<String>, ChunkingError> {
        if max_tokens == 0 {
            return Err(ChunkingError::InvalidChunkSize);
        }

        let tokens = self.encoding.encode_ordinary(text);
        if tokens.len() <= max_tokens {
            return Ok(vec![text.to_string()]);
        }

        let mut chunks = Vec::with_capacity(tokens.len().div_ceil(max_tokens));
        for slice in tokens.chunks(max_tokens) {
            let piece = self
                .encoding
                .decode(slice.to_vec())
                .map_err(|source| ChunkingError::Decode { source })?;
            chunks.push(piece);
        }
        Ok(chunks)
    }
}

fn resolve_encoding(name: &str) -> Result<CoreBPE, TokenizerError> {
    match get_bpe_from_model(name) {
        Ok(encoding) => Ok(encoding),
        Err(model_err) => {
            tracing::debug!(
                name,
                error = %model_err,
                "Tokenizer model lookup failed; trying encoding name"
            );
            if let Some(candidate) = encoding_from_name(name) {
                candidate
            } else {
                tracing::warn!(name, "Falling back to 'cl100k_base' encoding");
                cl100k_base()
            }
        }
    }
}

fn encoding_from_name(name: &str) -> Option<Result<CoreBPE, TokenizerError>> {
    match name {
        "cl100k_base" => Some(cl100k_base()),
        "o200k_base" => Some(o200k_base()),
        "p50k_base" => Some(p50k_base()),
        "p50k_edit" => Some(p50k_edit()),
        "r50k_base" | "gpt2" => Some(r50k_base()),
        _ => None,
    }
}
