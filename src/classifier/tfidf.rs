use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// Splits text into lowercase word tokens of at least two characters.
///
/// A word is a maximal run of alphanumeric characters or underscores, so
/// `"I'm"` yields nothing and `"Let's"` yields `"let"`.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2)
        .map(str::to_string)
        .collect()
}

/// Term-frequency / inverse-document-frequency vectorizer.
///
/// Uses smoothed idf, `ln((1 + n) / (1 + df)) + 1`, raw term counts and L2
/// normalisation. Feature indices follow the sorted vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    pub fn fit<S: AsRef<str>>(documents: &[S]) -> Self {
        let tokenized: Vec<BTreeSet<String>> = documents
            .iter()
            .map(|doc| tokenize(doc.as_ref()).into_iter().collect())
            .collect();

        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for terms in &tokenized {
            for term in terms {
                *document_frequency.entry(term.clone()).or_insert(0) += 1;
            }
        }

        let n = documents.len() as f64;
        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(document_frequency.len());

        for (index, (term, df)) in document_frequency.into_iter().enumerate() {
            idf.push(((1.0 + n) / (1.0 + df as f64)).ln() + 1.0);
            vocabulary.insert(term, index);
        }

        TfidfVectorizer { vocabulary, idf }
    }

    /// Dense, unit-length feature vector for `document`. Text made only of
    /// unknown words maps to the zero vector.
    pub fn transform(&self, document: &str) -> Vec<f64> {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for token in tokenize(document) {
            if let Some(&index) = self.vocabulary.get(&token) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let mut vector = vec![0.0; self.idf.len()];
        for (index, count) in counts {
            vector[index] = count * self.idf[index];
        }

        let norm = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }

        vector
    }

    pub fn transform_all<S: AsRef<str>>(&self, documents: &[S]) -> Vec<Vec<f64>> {
        documents
            .iter()
            .map(|doc| self.transform(doc.as_ref()))
            .collect()
    }

    pub fn vocabulary_len(&self) -> usize {
        self.idf.len()
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.vocabulary.get(term).and_then(|&index| self.idf.get(index).copied())
    }

    /// Checks that every vocabulary entry has an idf weight.
    pub fn validate(&self) -> Result<(), String> {
        if self.vocabulary.len() != self.idf.len() {
            return Err(format!(
                "{} vocabulary terms but {} idf weights",
                self.vocabulary.len(),
                self.idf.len()
            ));
        }

        match self.vocabulary.iter().find(|(_, index)| **index >= self.idf.len()) {
            Some((term, index)) => Err(format!("term {:?} has out of range index {}", term, index)),
            None => Ok(()),
        }
    }
}
