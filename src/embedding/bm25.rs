//! BM25-style sparse query encoder
//!
//! Lexical term weighting over the raw query text. Term identifiers are
//! 32-bit FNV-1a hashes of the normalized tokens, matching the hashed
//! vocabulary used by the ingestion job that populates the sparse index.

use crate::embedding::SparseVector;
use std::collections::BTreeMap;

/// Portuguese function words excluded from the sparse representation
const STOPWORDS: &[&str] = &[
    "a", "o", "as", "os", "um", "uma", "de", "da", "do", "das", "dos", "e", "é", "em", "no", "na",
    "nos", "nas", "para", "por", "com", "que", "se", "ao", "à", "como", "mais", "mas", "ou", "sua",
    "seu", "são",
];

/// Sparse encoder applying the BM25 term-frequency formula to query tokens
#[derive(Debug, Clone)]
pub struct Bm25QueryEncoder {
    k1: f32,
    b: f32,
    avg_len: f32,
}

impl Bm25QueryEncoder {
    pub fn new(k1: f32, b: f32, avg_len: f32) -> Self {
        Self { k1, b, avg_len }
    }

    /// Encode a query into a sparse term-weight vector.
    ///
    /// Deterministic for fixed input. Duplicate terms are merged before
    /// weighting; `indices` and `values` always have equal length.
    pub fn encode(&self, text: &str) -> SparseVector {
        let tokens = tokenize(text);
        let doc_len = tokens.len() as f32;

        // BTreeMap keeps the output ordering stable across calls
        let mut term_freq: BTreeMap<u32, f32> = BTreeMap::new();
        for token in &tokens {
            *term_freq.entry(fnv1a_32(token)).or_insert(0.0) += 1.0;
        }

        let mut indices = Vec::with_capacity(term_freq.len());
        let mut values = Vec::with_capacity(term_freq.len());

        for (term_id, tf) in term_freq {
            let norm = self.k1 * (1.0 - self.b + self.b * doc_len / self.avg_len);
            let weight = tf * (self.k1 + 1.0) / (tf + norm);
            indices.push(term_id);
            values.push(weight);
        }

        SparseVector { indices, values }
    }
}

/// Lowercase, split on non-alphanumeric, drop single chars and stopwords
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() > 1 && !STOPWORDS.contains(token))
        .map(|token| token.to_string())
        .collect()
}

fn fnv1a_32(token: &str) -> u32 {
    const FNV_OFFSET: u32 = 0x811c_9dc5;
    const FNV_PRIME: u32 = 0x0100_0193;

    let mut hash = FNV_OFFSET;
    for byte in token.as_bytes() {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder() -> Bm25QueryEncoder {
        Bm25QueryEncoder::new(1.2, 0.75, 256.0)
    }

    #[test]
    fn test_encode_equal_lengths() {
        let sparse = encoder().encode("controle de pragas na lavoura de soja");
        assert_eq!(sparse.indices.len(), sparse.values.len());
        assert!(!sparse.is_empty());
    }

    #[test]
    fn test_encode_deterministic() {
        let a = encoder().encode("dosagem recomendada para aplicação");
        let b = encoder().encode("dosagem recomendada para aplicação");
        assert_eq!(a, b);
    }

    #[test]
    fn test_duplicate_terms_merged() {
        let repeated = encoder().encode("milho milho milho");
        let single = encoder().encode("milho");
        assert_eq!(repeated.indices, single.indices);
        assert_eq!(repeated.indices.len(), 1);
        // Higher term frequency weighs more, saturating below k1 + 1
        assert!(repeated.values[0] > single.values[0]);
        assert!(repeated.values[0] < 1.2 + 1.0);
    }

    #[test]
    fn test_stopwords_and_short_tokens_dropped() {
        let sparse = encoder().encode("a o de e x");
        assert!(sparse.is_empty());
    }

    #[test]
    fn test_accented_tokens_survive() {
        let sparse = encoder().encode("pulverização");
        assert_eq!(sparse.indices.len(), 1);
    }

    #[test]
    fn test_different_tokens_hash_differently() {
        let a = encoder().encode("fungicida");
        let b = encoder().encode("herbicida");
        assert_ne!(a.indices, b.indices);
    }
}
