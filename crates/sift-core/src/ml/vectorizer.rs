//! TF-IDF text vectorizer (word unigrams + bigrams)

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Sparse row: `(feature index, value)` sorted by index
pub type SparseVec = Vec<(usize, f64)>;

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("valid regex"))
}

/// Lowercased word tokens of at least two characters
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    token_regex()
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Unigrams followed by space-joined bigrams
fn ngrams(text: &str) -> Vec<String> {
    let tokens = tokenize(text);
    let mut grams = Vec::with_capacity(tokens.len() * 2);
    grams.extend(tokens.iter().cloned());
    grams.extend(tokens.windows(2).map(|w| format!("{} {}", w[0], w[1])));
    grams
}

/// Vectorizer hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VectorizerParams {
    /// Minimum number of documents a term must appear in
    pub min_df: usize,
    /// Keep at most this many terms, highest corpus frequency first
    pub max_features: usize,
}

impl Default for VectorizerParams {
    fn default() -> Self {
        Self {
            min_df: 2,
            max_features: 50_000,
        }
    }
}

/// Fitted TF-IDF vocabulary and inverse document frequencies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    pub params: VectorizerParams,
    /// term -> column, columns assigned in lexical order
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Learn the vocabulary and idf weights from a corpus
    pub fn fit<S: AsRef<str>>(docs: &[S], params: VectorizerParams) -> Result<Self> {
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        let mut term_freq: HashMap<String, usize> = HashMap::new();

        for doc in docs {
            let grams = ngrams(doc.as_ref());
            let mut seen = HashSet::new();
            for gram in grams {
                *term_freq.entry(gram.clone()).or_default() += 1;
                if seen.insert(gram.clone()) {
                    *doc_freq.entry(gram).or_default() += 1;
                }
            }
        }

        let mut kept: Vec<(String, usize)> = doc_freq
            .iter()
            .filter(|(_, &df)| df >= params.min_df)
            .map(|(term, _)| (term.clone(), term_freq.get(term).copied().unwrap_or(0)))
            .collect();

        if kept.is_empty() {
            return Err(Error::Training(
                "After pruning, no terms remain. Try more training rows or a lower min_df".into(),
            ));
        }

        if kept.len() > params.max_features {
            kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            kept.truncate(params.max_features);
        }

        let mut terms: Vec<String> = kept.into_iter().map(|(t, _)| t).collect();
        terms.sort();

        let n = docs.len() as f64;
        let idf = terms
            .iter()
            .map(|t| {
                let df = doc_freq.get(t).copied().unwrap_or(0) as f64;
                ((1.0 + n) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        let vocabulary = terms
            .into_iter()
            .enumerate()
            .map(|(i, t)| (t, i))
            .collect();

        Ok(Self {
            params,
            vocabulary,
            idf,
        })
    }

    pub fn n_features(&self) -> usize {
        self.idf.len()
    }

    /// L2-normalized tf-idf row for one document; unknown terms are ignored
    pub fn transform(&self, text: &str) -> SparseVec {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for gram in ngrams(text) {
            if let Some(&idx) = self.vocabulary.get(&gram) {
                *counts.entry(idx).or_default() += 1.0;
            }
        }

        let mut row: SparseVec = counts
            .into_iter()
            .map(|(idx, tf)| (idx, tf * self.idf[idx]))
            .collect();

        let norm = row.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, v) in row.iter_mut() {
                *v /= norm;
            }
        }
        row
    }

    pub fn transform_all<S: AsRef<str>>(&self, docs: &[S]) -> Vec<SparseVec> {
        docs.iter().map(|d| self.transform(d.as_ref())).collect()
    }

    /// Whether the persisted vocabulary and idf table agree
    pub(crate) fn is_consistent(&self) -> bool {
        self.vocabulary.len() == self.idf.len()
            && self.vocabulary.values().all(|&i| i < self.idf.len())
    }
}
