//! Plain-text evaluation summary.

use drowsy_core::{ConfusionMatrix, Evaluation};

/// Renders a 2x2 confusion matrix with actual classes as rows.
#[must_use]
pub fn render_confusion_matrix(matrix: &ConfusionMatrix) -> String {
    let [neg, pos] = ConfusionMatrix::CLASSES;
    let width = neg.len().max(pos.len());

    let mut lines = vec![
        format!("{:>w$}   Predicted", "", w = width + 8),
        format!("{:<8}{:>width$} {neg:>width$} {pos:>width$}", "Actual", ""),
    ];
    lines.extend([neg, pos].iter().zip(matrix.rows()).map(|(name, row)| {
        format!("{:<8}{name:>width$} {:>width$} {:>width$}", "", row[0], row[1])
    }));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Formats accuracy in `[0, 1]` as a percentage, e.g. `Model Accuracy: 100.0%`.
#[must_use]
pub fn accuracy_line(accuracy: f64) -> String {
    format!("Model Accuracy: {:?}%", accuracy * 100.0)
}

/// Prints the accuracy line and, unless `quiet`, the confusion matrix.
pub fn print_summary(evaluation: &Evaluation, quiet: bool) {
    println!("{}", accuracy_line(evaluation.accuracy));
    if !quiet {
        println!();
        print!("{}", render_confusion_matrix(&evaluation.confusion_matrix()));
    }
}
