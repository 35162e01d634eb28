//! Classification metrics

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class report plus macro and support-weighted averages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
}

/// `matrix[i][j]` counts rows whose true label is `labels[i]` and predicted is `labels[j]`
pub fn confusion_matrix(labels: &[String], truth: &[String], predicted: &[String]) -> Vec<Vec<usize>> {
    let index = |l: &String| labels.iter().position(|x| x == l);
    let mut matrix = vec![vec![0; labels.len()]; labels.len()];
    for (t, p) in truth.iter().zip(predicted) {
        if let (Some(i), Some(j)) = (index(t), index(p)) {
            matrix[i][j] += 1;
        }
    }
    matrix
}

pub fn accuracy(truth: &[String], predicted: &[String]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();
    correct as f64 / truth.len() as f64
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Precision/recall/F1 per label from a confusion matrix (zero when undefined)
pub fn classification_report(labels: &[String], matrix: &[Vec<usize>]) -> ClassificationReport {
    let classes: Vec<ClassMetrics> = labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let tp = matrix[i][i];
            let support: usize = matrix[i].iter().sum();
            let predicted: usize = matrix.iter().map(|row| row[i]).sum();
            let precision = ratio(tp, predicted);
            let recall = ratio(tp, support);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            ClassMetrics {
                label: label.clone(),
                precision,
                recall,
                f1,
                support,
            }
        })
        .collect();

    let total: usize = classes.iter().map(|c| c.support).sum();
    let n = classes.len().max(1) as f64;

    let macro_avg = AverageMetrics {
        precision: classes.iter().map(|c| c.precision).sum::<f64>() / n,
        recall: classes.iter().map(|c| c.recall).sum::<f64>() / n,
        f1: classes.iter().map(|c| c.f1).sum::<f64>() / n,
        support: total,
    };

    let weight = |f: fn(&ClassMetrics) -> f64| {
        if total == 0 {
            0.0
        } else {
            classes.iter().map(|c| f(c) * c.support as f64).sum::<f64>() / total as f64
        }
    };
    let weighted_avg = AverageMetrics {
        precision: weight(|c| c.precision),
        recall: weight(|c| c.recall),
        f1: weight(|c| c.f1),
        support: total,
    };

    ClassificationReport {
        classes,
        macro_avg,
        weighted_avg,
    }
}
