//! Lazily loaded, reloadable statistical classifier

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use super::artifact::{ModelArtifact, ModelStore};
use crate::error::Result;
use crate::models::{CategorizeResult, CategorySource};

/// Shared handle to the model artifact
///
/// The artifact is loaded on first use and then served from an `Arc`
/// snapshot. A missing artifact is not remembered, so a model trained later
/// is picked up without a restart. `reload()` swaps the snapshot; predictions
/// already running finish on the old one.
#[derive(Clone)]
pub struct Classifier {
    inner: Arc<ClassifierInner>,
}

struct ClassifierInner {
    store: ModelStore,
    snapshot: RwLock<Option<Arc<ModelArtifact>>>,
    predictions: AtomicUsize,
}

impl Classifier {
    pub fn new(store: ModelStore) -> Self {
        Self {
            inner: Arc::new(ClassifierInner {
                store,
                snapshot: RwLock::new(None),
                predictions: AtomicUsize::new(0),
            }),
        }
    }

    pub fn store(&self) -> &ModelStore {
        &self.inner.store
    }

    /// Current artifact, loading it from disk if not yet cached
    pub fn artifact(&self) -> Result<Option<Arc<ModelArtifact>>> {
        if let Ok(guard) = self.inner.snapshot.read() {
            if let Some(artifact) = guard.as_ref() {
                return Ok(Some(Arc::clone(artifact)));
            }
        }

        let loaded = match self.inner.store.load()? {
            Some(a) => Arc::new(a),
            None => return Ok(None),
        };

        let mut guard = self
            .inner
            .snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Another caller may have loaded first; keep theirs
        let artifact = guard.get_or_insert_with(|| Arc::clone(&loaded));
        Ok(Some(Arc::clone(artifact)))
    }

    /// Drop the cached snapshot and load the artifact now on disk
    pub fn reload(&self) -> Result<bool> {
        let fresh = self.inner.store.load()?.map(Arc::new);
        let present = fresh.is_some();
        let mut guard = self
            .inner
            .snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = fresh;
        debug!(present, "Classifier reloaded");
        Ok(present)
    }

    /// Whether an artifact can be served
    pub fn is_available(&self) -> bool {
        matches!(self.artifact(), Ok(Some(_)))
    }

    /// Predict a category; `None` if no artifact exists or it cannot be read
    ///
    /// Does not apply the confidence threshold.
    pub fn predict(&self, description: &str) -> Option<CategorizeResult> {
        self.inner.predictions.fetch_add(1, Ordering::SeqCst);

        let artifact = match self.artifact() {
            Ok(Some(a)) => a,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Model artifact unavailable");
                return None;
            }
        };

        let (category, confidence) = artifact.predict(description)?;
        Some(CategorizeResult::new(
            category,
            confidence,
            CategorySource::Ml,
            format!("ML prediction with confidence {:.2}", confidence),
        ))
    }

    /// Number of `predict` calls so far
    pub fn prediction_count(&self) -> usize {
        self.inner.predictions.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::trainer::{ModelTrainer, TrainingOptions};
    use std::io::Write;

    fn write_dataset(dir: &std::path::Path) -> std::path::PathBuf {
        let path = dir.join("train.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "description,category").unwrap();
        for i in 0..10 {
            writeln!(f, "netflix subscription {},Entertainment", i).unwrap();
            writeln!(f, "electric utility bill {},Utilities", i).unwrap();
        }
        path
    }

    #[test]
    fn test_no_artifact_predicts_none() {
        let dir = tempfile::tempdir().unwrap();
        let classifier = Classifier::new(ModelStore::new(dir.path()));
        assert!(classifier.predict("netflix").is_none());
        assert!(!classifier.is_available());
        assert_eq!(classifier.prediction_count(), 1);
    }

    #[test]
    fn test_absence_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let classifier = Classifier::new(ModelStore::new(dir.path().join("models")));
        assert!(classifier.predict("netflix").is_none());

        // Train through a separate trainer that does not share this classifier
        let data = write_dataset(dir.path());
        let trainer = ModelTrainer::new(ModelStore::new(dir.path().join("models")));
        trainer
            .train(&data, &TrainingOptions::default())
            .unwrap();

        let result = classifier.predict("netflix subscription").unwrap();
        assert_eq!(result.category, "Entertainment");
        assert_eq!(result.source, CategorySource::Ml);
        assert!(result.explanation.starts_with("ML prediction with confidence"));
    }

    #[test]
    fn test_reload_swaps_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("models"));
        let classifier = Classifier::new(store.clone());

        let data = write_dataset(dir.path());
        ModelTrainer::new(store.clone())
            .train(&data, &TrainingOptions::default())
            .unwrap();
        let first = classifier.artifact().unwrap().unwrap();

        ModelTrainer::new(store)
            .train(&data, &TrainingOptions::default())
            .unwrap();
        // Still the cached snapshot until reload
        let cached = classifier.artifact().unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &cached));

        assert!(classifier.reload().unwrap());
        let fresh = classifier.artifact().unwrap().unwrap();
        assert!(!Arc::ptr_eq(&first, &fresh));
    }
}
