//! # Text Classifiers
//!
//! Three independent single-label classifiers turn free text into the
//! emotion, intent and context labels used by the recommendation engine.
//! Each one is the same two-stage pipeline:
//!
//! ```text
//! text → tokenize → TF-IDF vector (training vocabulary) → logistic regression → label
//! ```
//!
//! Models are fitted once (see `moodify train`), written as JSON artifacts and
//! loaded read-only when the server starts. Text made only of words the
//! training set never saw maps to the zero vector, so the prediction falls
//! back to the label priors learned in the intercepts.

pub mod dataset;
pub mod logistic;
pub mod tfidf;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{ClassificationResult, TrainingSample};

pub use logistic::{LogisticRegression, TrainOptions};
pub use tfidf::TfidfVectorizer;

pub const EMOTION_MODEL_FILE: &str = "emotion_model.json";
pub const INTENT_MODEL_FILE: &str = "intent_model.json";
pub const CONTEXT_MODEL_FILE: &str = "context_model.json";

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("training data is empty")]
    EmptyDataset,

    #[error("{samples} samples but {labels} labels")]
    LengthMismatch { samples: usize, labels: usize },

    #[error("expected feature vectors of length {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("need at least two distinct labels, only found {0:?}")]
    SingleClass(String),

    #[error("cannot access model file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("inconsistent model file {}: {reason}", path.display())]
    Inconsistent { path: PathBuf, reason: String },

    #[error("malformed model file {}: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A fitted TF-IDF + logistic regression pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextClassifier {
    vectorizer: TfidfVectorizer,
    model: LogisticRegression,
}

impl TextClassifier {
    pub fn fit<S: AsRef<str>, L: AsRef<str>>(
        texts: &[S],
        labels: &[L],
        options: TrainOptions,
    ) -> Result<Self, ClassifierError> {
        let vectorizer = TfidfVectorizer::fit(texts);
        let features = vectorizer.transform_all(texts);
        let model = LogisticRegression::fit(&features, labels, options)?;

        Ok(TextClassifier { vectorizer, model })
    }

    pub fn predict(&self, text: &str) -> &str {
        self.model.predict(&self.vectorizer.transform(text))
    }

    pub fn predict_proba(&self, text: &str) -> Vec<(&str, f64)> {
        let probabilities = self.model.predict_proba(&self.vectorizer.transform(text));
        self.model
            .labels()
            .iter()
            .map(String::as_str)
            .zip(probabilities)
            .collect()
    }

    pub fn labels(&self) -> &[String] {
        self.model.labels()
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vectorizer.vocabulary_len()
    }

    pub fn iterations(&self) -> usize {
        self.model.iterations()
    }

    pub async fn save(&self, path: &Path) -> Result<(), ClassifierError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| ClassifierError::Format {
            path: path.to_path_buf(),
            source: e,
        })?;

        async_fs::write(path, json)
            .await
            .map_err(|e| ClassifierError::Io {
                path: path.to_path_buf(),
                source: e,
            })
    }

    pub async fn load(path: &Path) -> Result<Self, ClassifierError> {
        let content = async_fs::read_to_string(path)
            .await
            .map_err(|e| ClassifierError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        let classifier: TextClassifier =
            serde_json::from_str(&content).map_err(|e| ClassifierError::Format {
                path: path.to_path_buf(),
                source: e,
            })?;

        classifier
            .validate()
            .map_err(|reason| ClassifierError::Inconsistent {
                path: path.to_path_buf(),
                reason,
            })?;

        Ok(classifier)
    }

    /// Checks that the vectorizer and the model fit together, so a loaded
    /// artifact cannot fail later at prediction time.
    pub fn validate(&self) -> Result<(), String> {
        self.vectorizer.validate()?;
        self.model.validate()?;

        if self.model.dimensions() != self.vectorizer.vocabulary_len() {
            return Err(format!(
                "model expects {} features, vocabulary has {} terms",
                self.model.dimensions(),
                self.vectorizer.vocabulary_len()
            ));
        }

        Ok(())
    }
}

/// The emotion, intent and context classifiers, used together.
#[derive(Debug, Clone, PartialEq)]
pub struct Classifiers {
    pub emotion: TextClassifier,
    pub intent: TextClassifier,
    pub context: TextClassifier,
}

impl Classifiers {
    /// Fits all three classifiers on the same sentences.
    pub fn train(
        samples: &[TrainingSample],
        options: TrainOptions,
    ) -> Result<Self, ClassifierError> {
        let sentences: Vec<&str> = samples.iter().map(|s| s.sentence.as_str()).collect();
        let emotions: Vec<&str> = samples.iter().map(|s| s.emotion.as_str()).collect();
        let intents: Vec<&str> = samples.iter().map(|s| s.intent.as_str()).collect();
        let contexts: Vec<&str> = samples.iter().map(|s| s.context.as_str()).collect();

        Ok(Classifiers {
            emotion: TextClassifier::fit(&sentences, &emotions, options)?,
            intent: TextClassifier::fit(&sentences, &intents, options)?,
            context: TextClassifier::fit(&sentences, &contexts, options)?,
        })
    }

    pub fn classify(&self, text: &str) -> ClassificationResult {
        ClassificationResult {
            emotion: self.emotion.predict(text).to_string(),
            intent: self.intent.predict(text).to_string(),
            context: self.context.predict(text).to_string(),
        }
    }

    pub fn named(&self) -> [(&'static str, &TextClassifier); 3] {
        [
            ("emotion", &self.emotion),
            ("intent", &self.intent),
            ("context", &self.context),
        ]
    }

    /// Writes the three artifacts into `dir`, creating it if needed.
    pub async fn save(&self, dir: &Path) -> Result<(), ClassifierError> {
        async_fs::create_dir_all(dir)
            .await
            .map_err(|e| ClassifierError::Io {
                path: dir.to_path_buf(),
                source: e,
            })?;

        self.emotion.save(&dir.join(EMOTION_MODEL_FILE)).await?;
        self.intent.save(&dir.join(INTENT_MODEL_FILE)).await?;
        self.context.save(&dir.join(CONTEXT_MODEL_FILE)).await?;
        Ok(())
    }

    pub async fn load(dir: &Path) -> Result<Self, ClassifierError> {
        Ok(Classifiers {
            emotion: TextClassifier::load(&dir.join(EMOTION_MODEL_FILE)).await?,
            intent: TextClassifier::load(&dir.join(INTENT_MODEL_FILE)).await?,
            context: TextClassifier::load(&dir.join(CONTEXT_MODEL_FILE)).await?,
        })
    }

    /// Whether all three artifacts exist in `dir`.
    pub fn exist_in(dir: &Path) -> bool {
        [EMOTION_MODEL_FILE, INTENT_MODEL_FILE, CONTEXT_MODEL_FILE]
            .iter()
            .all(|file| dir.join(file).is_file())
    }
}
