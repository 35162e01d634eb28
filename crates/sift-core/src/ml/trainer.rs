//! Offline model training
//!
//! Reads a labeled CSV, splits it 80/20 with a fixed seed (stratified when
//! every label occurs at least twice), fits TF-IDF + logistic regression,
//! evaluates on the held-out rows and persists the artifact. Nothing is
//! written unless every step succeeds.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::artifact::{ModelArtifact, ModelStore};
use super::classifier::Classifier;
use super::logistic::{LogisticModel, LogisticParams};
use super::metrics::{accuracy, classification_report, confusion_matrix, ClassificationReport};
use super::vectorizer::{TfidfVectorizer, VectorizerParams};
use crate::error::{Error, Result};

pub const SPLIT_SEED: u64 = 42;
pub const TEST_FRACTION: f64 = 0.2;

/// Column names and hyperparameters for one training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingOptions {
    pub text_column: String,
    pub label_column: String,
    pub vectorizer: VectorizerParams,
    pub logistic: LogisticParams,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            text_column: "description".to_string(),
            label_column: "category".to_string(),
            vectorizer: VectorizerParams::default(),
            logistic: LogisticParams::default(),
        }
    }
}

impl TrainingOptions {
    pub fn with_columns(text_column: &str, label_column: &str) -> Self {
        Self {
            text_column: text_column.to_string(),
            label_column: label_column.to_string(),
            ..Self::default()
        }
    }
}

/// Evaluation of a completed training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub accuracy: f64,
    pub report: ClassificationReport,
    /// Rows and columns follow `labels`
    pub confusion_matrix: Vec<Vec<usize>>,
    /// Sorted distinct labels of the whole dataset
    pub labels: Vec<String>,
    pub train_rows: usize,
    pub test_rows: usize,
    pub stratified: bool,
    pub artifact_path: PathBuf,
}

/// Fits and persists the classifier artifact
pub struct ModelTrainer {
    store: ModelStore,
    classifier: Option<Classifier>,
}

impl ModelTrainer {
    pub fn new(store: ModelStore) -> Self {
        Self {
            store,
            classifier: None,
        }
    }

    /// Train into the classifier's store and reload it after each successful run
    pub fn with_classifier(classifier: Classifier) -> Self {
        Self {
            store: classifier.store().clone(),
            classifier: Some(classifier),
        }
    }

    pub fn train(&self, dataset: &Path, options: &TrainingOptions) -> Result<TrainingReport> {
        if !dataset.is_file() {
            return Err(Error::DatasetNotFound(dataset.display().to_string()));
        }

        let (texts, labels) = read_dataset(dataset, options)?;
        if texts.len() < 2 {
            return Err(Error::Training(format!(
                "Need at least 2 rows to train, found {}",
                texts.len()
            )));
        }

        let all_labels = sorted_unique(&labels);
        let stratified = all_labels
            .iter()
            .all(|l| labels.iter().filter(|x| *x == l).count() >= 2);
        let (train_idx, test_idx) = if stratified {
            stratified_split(&labels, &all_labels)
        } else {
            random_split(labels.len())
        };

        let train_texts: Vec<&str> = train_idx.iter().map(|&i| texts[i].as_str()).collect();
        let train_labels: Vec<&String> = train_idx.iter().map(|&i| &labels[i]).collect();

        let classes: Vec<String> = {
            let owned: Vec<String> = train_labels.iter().map(|l| (*l).clone()).collect();
            sorted_unique(&owned)
        };
        let y: Vec<usize> = train_labels
            .iter()
            .map(|l| classes.iter().position(|c| c == *l).unwrap_or(0))
            .collect();

        let vectorizer = TfidfVectorizer::fit(&train_texts, options.vectorizer)?;
        let x = vectorizer.transform_all(&train_texts);
        let model = LogisticModel::fit(
            &x,
            &y,
            classes.len(),
            vectorizer.n_features(),
            options.logistic,
        )?;
        let artifact = ModelArtifact::new(classes, vectorizer, model, train_idx.len());

        let truth: Vec<String> = test_idx.iter().map(|&i| labels[i].clone()).collect();
        let predicted: Vec<String> = test_idx
            .iter()
            .map(|&i| artifact.predict_label(&texts[i]).unwrap_or_default())
            .collect();
        let matrix = confusion_matrix(&all_labels, &truth, &predicted);
        let report = classification_report(&all_labels, &matrix);
        let acc = accuracy(&truth, &predicted);

        let artifact_path = self.store.save(&artifact)?;
        if let Some(classifier) = &self.classifier {
            classifier.reload()?;
        }

        info!(
            accuracy = acc,
            labels = all_labels.len(),
            train_rows = train_idx.len(),
            test_rows = test_idx.len(),
            stratified,
            path = %artifact_path.display(),
            "Model trained"
        );

        Ok(TrainingReport {
            accuracy: acc,
            report,
            confusion_matrix: matrix,
            labels: all_labels,
            train_rows: train_idx.len(),
            test_rows: test_idx.len(),
            stratified,
            artifact_path,
        })
    }
}

/// Text and label columns; missing cells become empty strings
fn read_dataset(path: &Path, options: &TrainingOptions) -> Result<(Vec<String>, Vec<String>)> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let column = |kind: &'static str, name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| Error::MissingColumn {
                kind,
                column: name.to_string(),
                available: headers.clone(),
            })
    };
    let text_idx = column("text", &options.text_column)?;
    let label_idx = column("label", &options.label_column)?;

    let mut texts = Vec::new();
    let mut labels = Vec::new();
    for record in reader.records() {
        let record = record?;
        texts.push(record.get(text_idx).unwrap_or("").to_string());
        labels.push(record.get(label_idx).unwrap_or("").to_string());
    }
    Ok((texts, labels))
}

fn sorted_unique(values: &[String]) -> Vec<String> {
    let mut out: Vec<String> = values.to_vec();
    out.sort();
    out.dedup();
    out
}

fn test_size(n: usize) -> usize {
    ((n as f64) * TEST_FRACTION).ceil() as usize
}

fn random_split(n: usize) -> (Vec<usize>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(SPLIT_SEED);
    let mut idx: Vec<usize> = (0..n).collect();
    idx.shuffle(&mut rng);
    let n_test = test_size(n).min(n - 1);
    let test = idx[..n_test].to_vec();
    let train = idx[n_test..].to_vec();
    (train, test)
}

/// Per-label proportional allocation of the test rows, largest remainders first
fn stratified_split(labels: &[String], classes: &[String]) -> (Vec<usize>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(SPLIT_SEED);
    let n = labels.len();
    let n_test = test_size(n);

    let mut by_class: BTreeMap<&String, Vec<usize>> = BTreeMap::new();
    for (i, label) in labels.iter().enumerate() {
        by_class.entry(label).or_default().push(i);
    }

    let mut allocation: Vec<(usize, f64)> = classes
        .iter()
        .map(|c| {
            let count = by_class.get(c).map(|v| v.len()).unwrap_or(0);
            let exact = count as f64 * n_test as f64 / n as f64;
            (exact.floor() as usize, exact - exact.floor())
        })
        .collect();

    let mut assigned: usize = allocation.iter().map(|(k, _)| k).sum();
    let mut order: Vec<usize> = (0..classes.len()).collect();
    order.sort_by(|&a, &b| {
        allocation[b]
            .1
            .partial_cmp(&allocation[a].1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });
    for &ci in order.iter().cycle().take(classes.len() * 2) {
        if assigned >= n_test {
            break;
        }
        let count = by_class.get(&classes[ci]).map(|v| v.len()).unwrap_or(0);
        if allocation[ci].0 + 1 < count {
            allocation[ci].0 += 1;
            assigned += 1;
        }
    }

    let mut train = Vec::with_capacity(n - assigned);
    let mut test = Vec::with_capacity(assigned);
    for (ci, class) in classes.iter().enumerate() {
        let mut members = by_class.get(class).cloned().unwrap_or_default();
        members.shuffle(&mut rng);
        let k = allocation[ci].0.min(members.len().saturating_sub(1));
        test.extend_from_slice(&members[..k]);
        train.extend_from_slice(&members[k..]);
    }
    test.sort_unstable();
    train.sort_unstable();
    (train, test)
}
