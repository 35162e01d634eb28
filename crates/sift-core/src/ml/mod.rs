//! Statistical text classifier
//!
//! - `vectorizer` - TF-IDF over word unigrams and bigrams
//! - `logistic` - multinomial logistic regression
//! - `artifact` - persisted pipeline and the model directory layout
//! - `classifier` - lazily loaded prediction service
//! - `trainer` - dataset split, fit, evaluation and persistence
//! - `metrics` - accuracy, per-class report, confusion matrix

pub mod artifact;
pub mod classifier;
pub mod logistic;
pub mod metrics;
pub mod trainer;
pub mod vectorizer;

pub use artifact::{ModelArtifact, ModelStore, CUSTOM_ARTIFACT, DEFAULT_ARTIFACT};
pub use classifier::Classifier;
pub use metrics::{AverageMetrics, ClassMetrics, ClassificationReport};
pub use trainer::{ModelTrainer, TrainingOptions, TrainingReport};
