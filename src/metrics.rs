//! Classification metrics: averaged scores and a per-class text report.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};

/// How per-class scores are combined into one number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Average {
    /// Unweighted mean over classes.
    Macro,
    /// Global counts; equals accuracy for single-label problems.
    #[default]
    Micro,
    /// Mean over classes weighted by their true support.
    Weighted,
}

/// Accuracy and averaged precision/recall/F1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl Metrics {
    fn rounded(self, decimals: u32) -> Self {
        Self {
            accuracy: round_to(self.accuracy, decimals),
            precision: round_to(self.precision, decimals),
            recall: round_to(self.recall, decimals),
            f1: round_to(self.f1, decimals),
        }
    }
}

/// Rounds to the nearest `decimals`-digit decimal, working on the exact binary
/// value with ties to even, so `round_to(0.0625, 3) == 0.062` like Python's
/// `round`.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    format!("{:.*}", decimals as usize, value)
        .parse()
        .unwrap_or(value)
}

// ---------------------------------------------------------------------------
// Per-class counts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
struct ClassCounts {
    tp: usize,
    fp: usize,
    fn_: usize,
}

impl ClassCounts {
    fn support(&self) -> usize {
        self.tp + self.fn_
    }

    fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    fn f1(&self) -> f64 {
        f1(self.precision(), self.recall())
    }
}

fn ratio(num: usize, denom: usize) -> f64 {
    if denom == 0 {
        0.0
    } else {
        num as f64 / denom as f64
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

/// Sorted union of labels plus one count triple per label.
fn tally(y_true: &[f64], y_pred: &[f64]) -> Result<(Vec<f64>, Vec<ClassCounts>)> {
    if y_true.len() != y_pred.len() {
        return Err(HarnessError::LengthMismatch {
            expected: y_true.len(),
            actual: y_pred.len(),
        });
    }
    if y_true.is_empty() {
        return Err(HarnessError::EmptyInput(
            "no labels to score".to_string(),
        ));
    }

    let mut labels: Vec<f64> = y_true.iter().chain(y_pred).copied().collect();
    if let Some(&bad) = labels.iter().find(|v| !v.is_finite() || v.fract() != 0.0) {
        return Err(HarnessError::NonIntegralLabel(bad));
    }
    labels.sort_by(f64::total_cmp);
    labels.dedup();

    let index = |v: f64| labels.partition_point(|&l| l < v);
    let mut counts = vec![ClassCounts::default(); labels.len()];
    for (&t, &p) in y_true.iter().zip(y_pred) {
        if t == p {
            counts[index(t)].tp += 1;
        } else {
            counts[index(t)].fn_ += 1;
            counts[index(p)].fp += 1;
        }
    }
    Ok((labels, counts))
}

// ---------------------------------------------------------------------------
// get_metrics
// ---------------------------------------------------------------------------

/// Accuracy plus precision, recall and F1 averaged per `average`, each
/// rounded to `precision` decimals. Classes with an empty denominator score 0.
pub fn get_metrics(
    y_true: &[f64],
    y_pred: &[f64],
    average: Average,
    precision: u32,
) -> Result<Metrics> {
    let (_, counts) = tally(y_true, y_pred)?;
    let n = y_true.len();
    let correct: usize = counts.iter().map(|c| c.tp).sum();
    let accuracy = correct as f64 / n as f64;

    let (p, r, f) = match average {
        Average::Micro => {
            let fp: usize = counts.iter().map(|c| c.fp).sum();
            let fn_: usize = counts.iter().map(|c| c.fn_).sum();
            let p = ratio(correct, correct + fp);
            let r = ratio(correct, correct + fn_);
            (p, r, f1(p, r))
        }
        Average::Macro => {
            let k = counts.len() as f64;
            (
                counts.iter().map(ClassCounts::precision).sum::<f64>() / k,
                counts.iter().map(ClassCounts::recall).sum::<f64>() / k,
                counts.iter().map(ClassCounts::f1).sum::<f64>() / k,
            )
        }
        Average::Weighted => {
            let total = n as f64;
            let weighted = |score: fn(&ClassCounts) -> f64| {
                counts
                    .iter()
                    .map(|c| score(c) * c.support() as f64)
                    .sum::<f64>()
                    / total
            };
            (
                weighted(ClassCounts::precision),
                weighted(ClassCounts::recall),
                weighted(ClassCounts::f1),
            )
        }
    };

    Ok(Metrics {
        accuracy,
        precision: p,
        recall: r,
        f1: f,
    }
    .rounded(precision))
}

// ---------------------------------------------------------------------------
// ClassificationReport
// ---------------------------------------------------------------------------

/// Scores for one class or one average row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class precision/recall/F1/support with accuracy and the macro and
/// weighted averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<ReportRow>,
    pub accuracy: f64,
    pub macro_avg: ReportRow,
    pub weighted_avg: ReportRow,
}

pub fn classification_report(y_true: &[f64], y_pred: &[f64]) -> Result<ClassificationReport> {
    let (labels, counts) = tally(y_true, y_pred)?;
    let n = y_true.len();

    let classes: Vec<ReportRow> = labels
        .iter()
        .zip(&counts)
        .map(|(label, c)| ReportRow {
            label: format!("{label}"),
            precision: c.precision(),
            recall: c.recall(),
            f1: c.f1(),
            support: c.support(),
        })
        .collect();

    let k = classes.len() as f64;
    let macro_avg = ReportRow {
        label: "macro avg".to_string(),
        precision: classes.iter().map(|r| r.precision).sum::<f64>() / k,
        recall: classes.iter().map(|r| r.recall).sum::<f64>() / k,
        f1: classes.iter().map(|r| r.f1).sum::<f64>() / k,
        support: n,
    };
    let weight = |pick: fn(&ReportRow) -> f64| {
        classes
            .iter()
            .map(|r| pick(r) * r.support as f64)
            .sum::<f64>()
            / n as f64
    };
    let weighted_avg = ReportRow {
        label: "weighted avg".to_string(),
        precision: weight(|r| r.precision),
        recall: weight(|r| r.recall),
        f1: weight(|r| r.f1),
        support: n,
    };

    let correct: usize = counts.iter().map(|c| c.tp).sum();
    Ok(ClassificationReport {
        classes,
        accuracy: correct as f64 / n as f64,
        macro_avg,
        weighted_avg,
    })
}

impl ClassificationReport {
    fn support(&self) -> usize {
        self.macro_avg.support
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|r| r.label.len())
            .chain([self.weighted_avg.label.len()])
            .max()
            .unwrap_or(0);

        let row = |f: &mut fmt::Formatter<'_>, r: &ReportRow| {
            writeln!(
                f,
                "{:>width$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                r.label, r.precision, r.recall, r.f1, r.support
            )
        };

        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for r in &self.classes {
            row(f, r)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.support()
        )?;
        row(f, &self.macro_avg)?;
        row(f, &self.weighted_avg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const Y_TRUE: [f64; 8] = [1.0, 1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 3.0];
    const Y_PRED: [f64; 8] = [1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 3.0, 1.0];

    #[test]
    fn perfect_prediction_scores_one() {
        for average in [Average::Macro, Average::Micro, Average::Weighted] {
            let m = get_metrics(&Y_TRUE, &Y_TRUE, average, 3).unwrap();
            assert_eq!(
                m,
                Metrics {
                    accuracy: 1.0,
                    precision: 1.0,
                    recall: 1.0,
                    f1: 1.0
                }
            );
        }
    }

    #[test]
    fn macro_average_matches_hand_computation() {
        // class 1: p 2/3 r 2/3; class 2: p 1/2 r 1/2; class 3: p 2/3 r 2/3
        let m = get_metrics(&Y_TRUE, &Y_PRED, Average::Macro, 3).unwrap();
        assert_eq!(m.accuracy, 0.625);
        assert_eq!(m.precision, 0.611);
        assert_eq!(m.recall, 0.611);
        assert_eq!(m.f1, 0.611);
    }

    #[test]
    fn micro_average_equals_accuracy() {
        let m = get_metrics(&Y_TRUE, &Y_PRED, Average::Micro, 4).unwrap();
        assert_eq!(m.precision, m.accuracy);
        assert_eq!(m.recall, m.accuracy);
        assert_eq!(m.f1, m.accuracy);
    }

    #[test]
    fn weighted_average_uses_support() {
        // (3 * 2/3 + 2 * 1/2 + 3 * 2/3) / 8 = 0.625
        let m = get_metrics(&Y_TRUE, &Y_PRED, Average::Weighted, 3).unwrap();
        assert_eq!(m.recall, 0.625);
    }

    #[test]
    fn class_never_predicted_scores_zero_precision() {
        let m = get_metrics(&[1.0, 2.0], &[1.0, 1.0], Average::Macro, 3).unwrap();
        // class 1: p 0.5 r 1; class 2: p 0 r 0
        assert_eq!(m.precision, 0.25);
        assert_eq!(m.recall, 0.5);
    }

    #[test]
    fn invalid_inputs() {
        assert!(matches!(
            get_metrics(&[1.0], &[1.0, 2.0], Average::Macro, 3),
            Err(HarnessError::LengthMismatch { .. })
        ));
        assert!(matches!(
            get_metrics(&[], &[], Average::Macro, 3),
            Err(HarnessError::EmptyInput(_))
        ));
        assert!(matches!(
            get_metrics(&[1.5], &[1.0], Average::Macro, 3),
            Err(HarnessError::NonIntegralLabel(v)) if v == 1.5
        ));
    }

    #[test]
    fn rounding_follows_the_decimal_value() {
        assert_eq!(round_to(0.0625, 3), 0.062);
        assert_eq!(round_to(0.6666, 3), 0.667);
        // 2.675 is stored just below the tie.
        assert_eq!(round_to(2.675, 2), 2.67);
        assert_eq!(round_to(1.0, 3), 1.0);
        assert_eq!(round_to(0.0, 3), 0.0);
    }

    #[test]
    fn tie_rounding_reaches_the_reported_metrics() {
        // 1 of 16 correct: accuracy 0.0625 reports as 0.062.
        let y_true: Vec<f64> = (0..16).map(|i| if i == 0 { 1.0 } else { 2.0 }).collect();
        let y_pred = vec![1.0; 16];
        let m = get_metrics(&y_true, &y_pred, Average::Micro, 3).unwrap();
        assert_eq!(m.accuracy, 0.062);
    }

    #[test]
    fn report_renders_fixed_width_table() {
        let report = classification_report(&Y_TRUE, &Y_PRED).unwrap();
        assert_eq!(report.classes.len(), 3);
        assert_eq!(report.classes[1].support, 2);
        assert_eq!(report.weighted_avg.support, 8);

        let text = report.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            format!("{:14}precision    recall  f1-score   support", "")
        );
        assert!(lines[1].is_empty());
        assert_eq!(
            lines[2],
            format!("{:>12}{:>11}{:>10}{:>10}{:>10}", "1", "0.67", "0.67", "0.67", "3")
        );
        assert!(lines
            .iter()
            .any(|l| l.starts_with("    accuracy") && l.ends_with("         8")));
        assert!(lines.last().unwrap().starts_with("weighted avg"));
    }
}
