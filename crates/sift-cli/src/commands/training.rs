//! Classifier training command

use std::path::Path;

use anyhow::{Context, Result};
use sift_core::{Classifier, ModelTrainer, TrainingOptions, TrainingReport};

use super::print_json;

pub fn cmd_train(
    classifier: &Classifier,
    file: &Path,
    text_column: &str,
    label_column: &str,
    json: bool,
) -> Result<()> {
    if !json {
        println!("🧠 Training classifier from {}...", file.display());
    }

    let options = TrainingOptions::with_columns(text_column, label_column);
    let report = ModelTrainer::with_classifier(classifier.clone())
        .train(file, &options)
        .context("Training failed")?;

    if json {
        return print_json(&report);
    }

    print_report(&report);
    Ok(())
}

fn print_report(report: &TrainingReport) {
    println!();
    println!("📊 Evaluation");
    println!(
        "   Rows: {} train / {} test ({})",
        report.train_rows,
        report.test_rows,
        if report.stratified {
            "stratified split"
        } else {
            "random split"
        }
    );
    println!("   Accuracy: {:.3}", report.accuracy);
    println!();
    println!(
        "   {:<20} {:>9} {:>9} {:>9} {:>8}",
        "label", "precision", "recall", "f1", "support"
    );
    println!("   ─────────────────────────────────────────────────────────────");
    for class in &report.report.classes {
        println!(
            "   {:<20} {:>9.3} {:>9.3} {:>9.3} {:>8}",
            super::truncate(&class.label, 20),
            class.precision,
            class.recall,
            class.f1,
            class.support
        );
    }
    let avg = &report.report.macro_avg;
    println!(
        "   {:<20} {:>9.3} {:>9.3} {:>9.3} {:>8}",
        "macro avg", avg.precision, avg.recall, avg.f1, avg.support
    );
    let avg = &report.report.weighted_avg;
    println!(
        "   {:<20} {:>9.3} {:>9.3} {:>9.3} {:>8}",
        "weighted avg", avg.precision, avg.recall, avg.f1, avg.support
    );

    println!();
    println!("   Confusion matrix (rows = truth, columns = predicted):");
    println!("   {}", report.labels.join(" | "));
    for (label, row) in report.labels.iter().zip(&report.confusion_matrix) {
        let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
        println!("   {:<20} {}", super::truncate(label, 20), cells.join(" "));
    }

    println!();
    println!("✅ Model saved to {}", report.artifact_path.display());
}
