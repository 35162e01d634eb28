//! Persisted classifier pipeline and its on-disk store

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::logistic::{argmax, LogisticModel};
use super::vectorizer::TfidfVectorizer;
use crate::error::{Error, Result};

/// Artifact written by custom training runs, preferred when present
pub const CUSTOM_ARTIFACT: &str = "expense_model.json";
/// Fallback artifact name
pub const DEFAULT_ARTIFACT: &str = "model.json";

const FORMAT_VERSION: u32 = 1;

/// Confidence reported when the model cannot produce usable probabilities
pub const NO_PROBA_CONFIDENCE: f64 = 0.5;

/// Vectorizer + classifier + sorted label list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    /// Sorted; index `i` is class `i` of the classifier
    pub labels: Vec<String>,
    pub vectorizer: TfidfVectorizer,
    pub classifier: LogisticModel,
    pub trained_at: DateTime<Utc>,
    pub training_rows: usize,
}

impl ModelArtifact {
    pub fn new(
        labels: Vec<String>,
        vectorizer: TfidfVectorizer,
        classifier: LogisticModel,
        training_rows: usize,
    ) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            labels,
            vectorizer,
            classifier,
            trained_at: Utc::now(),
            training_rows,
        }
    }

    /// Class probabilities in label order, `None` if they are not usable
    pub fn predict_proba(&self, text: &str) -> Option<Vec<f64>> {
        let probs = self
            .classifier
            .predict_proba(&self.vectorizer.transform(text));
        probs.iter().all(|p| p.is_finite()).then_some(probs)
    }

    /// Predicted label and confidence (max posterior, or 0.5 without probabilities)
    pub fn predict(&self, text: &str) -> Option<(String, f64)> {
        match self.predict_proba(text) {
            Some(probs) => {
                let idx = argmax(&probs)?;
                Some((self.labels.get(idx)?.clone(), probs[idx]))
            }
            None => {
                let scores = self
                    .classifier
                    .decision_function(&self.vectorizer.transform(text));
                let idx = argmax(&scores)?;
                Some((self.labels.get(idx)?.clone(), NO_PROBA_CONFIDENCE))
            }
        }
    }

    /// Predicted label only (used for evaluation)
    pub fn predict_label(&self, text: &str) -> Option<String> {
        self.predict(text).map(|(label, _)| label)
    }

    fn validate(&self) -> Result<()> {
        if self.format_version != FORMAT_VERSION {
            return Err(Error::ModelArtifact(format!(
                "Unsupported artifact format version {}",
                self.format_version
            )));
        }
        if self.labels.len() != self.classifier.n_classes()
            || self.vectorizer.n_features() != self.classifier.n_features()
            || !self.vectorizer.is_consistent()
            || !self.classifier.is_consistent()
        {
            return Err(Error::ModelArtifact(
                "Artifact labels, vocabulary and weights disagree".into(),
            ));
        }
        Ok(())
    }
}

/// Location of the model artifact inside the configured model directory
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Custom artifact if it exists, else the default path
    pub fn active_path(&self) -> PathBuf {
        let custom = self.dir.join(CUSTOM_ARTIFACT);
        if custom.exists() {
            custom
        } else {
            self.dir.join(DEFAULT_ARTIFACT)
        }
    }

    pub fn exists(&self) -> bool {
        self.active_path().exists()
    }

    /// Read the active artifact, `None` when no artifact exists
    pub fn load(&self) -> Result<Option<ModelArtifact>> {
        let path = self.active_path();
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path)?;
        let artifact: ModelArtifact = serde_json::from_slice(&bytes).map_err(|e| {
            Error::ModelArtifact(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        artifact.validate()?;
        debug!(path = %path.display(), labels = artifact.labels.len(), "Loaded model artifact");
        Ok(Some(artifact))
    }

    /// Write the artifact over the active path
    ///
    /// Serialized into a temp file in the same directory and renamed into
    /// place, so concurrent readers see either the old or the new artifact.
    pub fn save(&self, artifact: &ModelArtifact) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let target = self.active_path();

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer(&mut tmp, artifact)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|e| Error::Io(e.error))?;

        debug!(path = %target.display(), "Saved model artifact");
        Ok(target)
    }
}
