//! Regression and binary-classification evaluators.

use crate::artifacts::Metrics;
use crate::dataset::Table;
use crate::error::{TrainingError, TrainingResult};

/// Probability threshold separating the positive class.
pub const DECISION_THRESHOLD: f64 = 0.5;

fn check_lengths(truth: &[f64], other: &[f64]) -> TrainingResult<()> {
    if truth.len() != other.len() {
        return Err(TrainingError::Dataset(format!(
            "ground truth has {} rows, predictions have {}",
            truth.len(),
            other.len()
        )));
    }
    if truth.is_empty() {
        return Err(TrainingError::Dataset("cannot evaluate on zero rows".to_string()));
    }
    Ok(())
}

/// `mse`, `mae` and `r2` for a predicted-value column.
pub fn regression_metrics(truth: &[f64], predicted: &[f64]) -> TrainingResult<Metrics> {
    check_lengths(truth, predicted)?;
    let n = truth.len() as f64;

    let mse = truth.iter().zip(predicted).map(|(t, p)| (t - p).powi(2)).sum::<f64>() / n;
    let mae = truth.iter().zip(predicted).map(|(t, p)| (t - p).abs()).sum::<f64>() / n;

    let mean = truth.iter().sum::<f64>() / n;
    let ss_res = mse * n;
    let ss_tot = truth.iter().map(|t| (t - mean).powi(2)).sum::<f64>();
    // Constant ground truth: perfect fit scores 1, anything else 0.
    let r2 = if ss_tot == 0.0 {
        if ss_res == 0.0 { 1.0 } else { 0.0 }
    } else {
        1.0 - ss_res / ss_tot
    };

    Ok(Metrics::from([
        ("mse".to_string(), Some(mse)),
        ("mae".to_string(), Some(mae)),
        ("r2".to_string(), Some(r2)),
    ]))
}

fn accuracy(truth: &[f64], labels: &[f64]) -> f64 {
    let hits = truth.iter().zip(labels).filter(|(t, p)| (*t - *p).abs() < f64::EPSILON).count();
    hits as f64 / truth.len() as f64
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

fn is_positive(value: f64) -> bool {
    (value - 1.0).abs() < f64::EPSILON
}

/// Area under the ROC curve via the rank-sum formulation; ties count half.
/// `None` when the ground truth holds a single class.
pub fn roc_auc(truth: &[f64], scores: &[f64]) -> Option<f64> {
    let positives: Vec<f64> = truth.iter().zip(scores).filter(|(t, _)| is_positive(**t)).map(|(_, s)| *s).collect();
    let negatives: Vec<f64> = truth.iter().zip(scores).filter(|(t, _)| !is_positive(**t)).map(|(_, s)| *s).collect();
    if positives.is_empty() || negatives.is_empty() {
        return None;
    }

    let mut wins = 0.0;
    for p in &positives {
        for n in &negatives {
            if p > n {
                wins += 1.0;
            } else if (p - n).abs() < f64::EPSILON {
                wins += 0.5;
            }
        }
    }
    Some(wins / (positives.len() * negatives.len()) as f64)
}

/// Binary classification metrics.
///
/// With a probability column the scores are thresholded at 0.5 and the full set
/// (`accuracy`, `f1`, `precision`, `recall`, `auc_score`) is computed; the hard-label
/// column is then ignored. With only hard labels just `accuracy` is computed. With
/// neither, every metric is `None`.
pub fn classification_metrics(
    truth: &[f64],
    labels: Option<&[f64]>,
    probabilities: Option<&[f64]>,
) -> TrainingResult<Metrics> {
    let mut accuracy_score = None;
    let mut f1 = None;
    let mut precision = None;
    let mut recall = None;
    let mut auc_score = None;

    if let Some(labels) = labels {
        check_lengths(truth, labels)?;
        accuracy_score = Some(accuracy(truth, labels));
    }

    if let Some(probabilities) = probabilities {
        check_lengths(truth, probabilities)?;
        let thresholded: Vec<f64> = probabilities
            .iter()
            .map(|p| if *p > DECISION_THRESHOLD { 1.0 } else { 0.0 })
            .collect();

        let (mut tp, mut fp, mut fn_) = (0usize, 0usize, 0usize);
        for (t, p) in truth.iter().zip(&thresholded) {
            match (is_positive(*t), is_positive(*p)) {
                (true, true) => tp += 1,
                (false, true) => fp += 1,
                (true, false) => fn_ += 1,
                (false, false) => {}
            }
        }

        let p = ratio(tp, tp + fp);
        let r = ratio(tp, tp + fn_);
        accuracy_score = Some(accuracy(truth, &thresholded));
        precision = Some(p);
        recall = Some(r);
        f1 = Some(if p + r == 0.0 { 0.0 } else { 2.0 * p * r / (p + r) });
        auc_score = roc_auc(truth, probabilities);
    }

    Ok(Metrics::from([
        ("accuracy".to_string(), accuracy_score),
        ("f1".to_string(), f1),
        ("precision".to_string(), precision),
        ("recall".to_string(), recall),
        ("auc_score".to_string(), auc_score),
    ]))
}

/// Regression metrics between `data[target]` and `predictions[prediction]`.
pub fn evaluate_regression(data: &Table, predictions: &Table, target: &str, prediction: &str) -> TrainingResult<Metrics> {
    regression_metrics(&data.numeric_column(target)?, &predictions.numeric_column(prediction)?)
}

/// Classification metrics, picking up whichever prediction columns are present.
pub fn evaluate_classification(
    data: &Table,
    predictions: &Table,
    target: &str,
    prediction: &str,
    predict_proba: &str,
) -> TrainingResult<Metrics> {
    let truth = data.numeric_column(target)?;
    let labels = if predictions.has_column(prediction) { Some(predictions.numeric_column(prediction)?) } else { None };
    let probabilities =
        if predictions.has_column(predict_proba) { Some(predictions.numeric_column(predict_proba)?) } else { None };
    classification_metrics(&truth, labels.as_deref(), probabilities.as_deref())
}
