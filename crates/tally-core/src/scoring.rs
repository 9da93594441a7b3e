//! Scoring engine: argument list → scores, ratio, recommendation.
//!
//! Pure and total. Previews and the persisted score snapshot both call
//! [`score`], so for the same argument list they agree bit for bit.
//!
//! # The "no data" sentinel
//!
//! With no negative weight the ratio would divide by zero. Instead:
//! - positive > 0, negative = 0 → `ratio = +∞`
//! - positive = 0, negative = 0 → `ratio = 1.0` and `has_data = false`
//!
//! `ratio = 1.0` with `has_data = true` is a genuine 1:1 tie. Callers that
//! need to tell the two apart must look at `has_data`, never at the ratio.

use serde::Serialize;

use crate::draft::ArgumentInput;
use crate::entities::{Argument, ScoreSnapshot};
use crate::enums::Recommendation;
use crate::validation::Weight;

pub const FAVORABLE_RATIO: f64 = 2.0;
pub const DEFAVORABLE_RATIO: f64 = 0.5;

/// Anything that carries an argument weight.
pub trait Weighted {
    fn weight(&self) -> Weight;
}

impl Weighted for Weight {
    fn weight(&self) -> Weight {
        *self
    }
}

impl Weighted for ArgumentInput {
    fn weight(&self) -> Weight {
        self.weight
    }
}

impl Weighted for Argument {
    fn weight(&self) -> Weight {
        self.weight
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreResult {
    /// Sum of weights > 0.
    pub positive_score: u32,
    /// Absolute sum of weights < 0.
    pub negative_score: u32,
    /// `positive / negative`, see the module docs for the zero cases.
    pub ratio: f64,
    pub recommendation: Recommendation,
    /// `false` only when both scores are zero.
    pub has_data: bool,
}

impl ScoreResult {
    /// `positive_score - negative_score`, i.e. the arithmetic sum of all weights.
    #[must_use]
    pub fn net(&self) -> i64 {
        i64::from(self.positive_score) - i64::from(self.negative_score)
    }

    #[must_use]
    pub const fn snapshot(&self) -> ScoreSnapshot {
        ScoreSnapshot {
            positive_score: self.positive_score,
            negative_score: self.negative_score,
            recommendation: self.recommendation,
        }
    }
}

/// Score an argument list.
#[must_use]
pub fn score<W: Weighted>(arguments: &[W]) -> ScoreResult {
    let (mut positive, mut negative) = (0u32, 0u32);
    for argument in arguments {
        let w = i32::from(argument.weight().get());
        if w > 0 {
            positive += w.unsigned_abs();
        } else {
            negative += w.unsigned_abs();
        }
    }

    let has_data = positive > 0 || negative > 0;
    let ratio = match (positive, negative) {
        (0, 0) => 1.0,
        (_, 0) => f64::INFINITY,
        (p, n) => f64::from(p) / f64::from(n),
    };

    ScoreResult {
        positive_score: positive,
        negative_score: negative,
        ratio,
        recommendation: recommend(ratio),
        has_data,
    }
}

/// Apply the 2:1 rule to a ratio.
#[must_use]
pub fn recommend(ratio: f64) -> Recommendation {
    if ratio >= FAVORABLE_RATIO {
        Recommendation::Favorable
    } else if ratio <= DEFAVORABLE_RATIO {
        Recommendation::Defavorable
    } else {
        Recommendation::Incertain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn weights(values: &[i64]) -> Vec<Weight> {
        values.iter().map(|v| Weight::new(*v).unwrap()).collect()
    }

    #[rstest]
    #[case::scenario_a(&[8, 6, -5, -2], 14, 7, 2.0, Recommendation::Favorable)]
    #[case::scenario_b(&[3, -6], 3, 6, 0.5, Recommendation::Defavorable)]
    #[case::scenario_c(&[3, -2], 3, 2, 1.5, Recommendation::Incertain)]
    #[case::all_cons(&[-4, -1], 0, 5, 0.0, Recommendation::Defavorable)]
    #[case::tie(&[5, -5], 5, 5, 1.0, Recommendation::Incertain)]
    fn scenarios(
        #[case] input: &[i64],
        #[case] positive: u32,
        #[case] negative: u32,
        #[case] ratio: f64,
        #[case] recommendation: Recommendation,
    ) {
        let result = score(&weights(input));
        assert_eq!(result.positive_score, positive);
        assert_eq!(result.negative_score, negative);
        assert!((result.ratio - ratio).abs() < f64::EPSILON, "ratio {}", result.ratio);
        assert_eq!(result.recommendation, recommendation);
        assert!(result.has_data);
    }

    #[test]
    fn empty_list_is_no_data_sentinel() {
        let result = score::<Weight>(&[]);
        assert_eq!(result.positive_score, 0);
        assert_eq!(result.negative_score, 0);
        assert_eq!(result.ratio.to_bits(), 1.0f64.to_bits());
        assert_eq!(result.recommendation, Recommendation::Incertain);
        assert!(!result.has_data);
    }

    #[test]
    fn zero_weights_only_are_no_data() {
        let result = score(&weights(&[0, 0]));
        assert!(!result.has_data);
        assert_eq!(result.recommendation, Recommendation::Incertain);
    }

    #[test]
    fn only_pros_is_infinite_and_favorable() {
        let result = score(&weights(&[2, 1]));
        assert!(result.ratio.is_infinite() && result.ratio.is_sign_positive());
        assert_eq!(result.recommendation, Recommendation::Favorable);
    }

    #[test]
    fn score_is_deterministic_and_net_matches_sum() {
        for values in [
            vec![10, -10, 7, -3, 0],
            vec![-1; 40],
            vec![9, 9, 9, -10],
            (-10..=10).collect::<Vec<_>>(),
        ] {
            let list = weights(&values);
            let first = score(&list);
            let second = score(&list);
            assert_eq!(first.ratio.to_bits(), second.ratio.to_bits());
            assert_eq!(first, second);
            assert_eq!(first.net(), values.iter().sum::<i64>());
        }
    }

    #[test]
    fn recommendation_partitions_ratios() {
        for ratio in [0.0, 0.25, 0.5, 0.5001, 1.0, 1.999, 2.0, 3.5, f64::INFINITY] {
            let rec = recommend(ratio);
            assert_eq!(rec == Recommendation::Favorable, ratio >= 2.0, "ratio {ratio}");
            assert_eq!(rec == Recommendation::Defavorable, ratio <= 0.5, "ratio {ratio}");
            assert_eq!(
                rec == Recommendation::Incertain,
                ratio > 0.5 && ratio < 2.0,
                "ratio {ratio}"
            );
        }
    }

    #[test]
    fn persisted_and_draft_arguments_score_identically() {
        let now = chrono::Utc::now();
        let inputs = vec![
            ArgumentInput::new("Higher salary", 8).unwrap(),
            ArgumentInput::new("Longer commute", -5).unwrap(),
        ];
        let persisted: Vec<Argument> = inputs
            .iter()
            .enumerate()
            .map(|(i, a)| Argument {
                id: format!("arg-{i:08x}"),
                text: a.text.clone(),
                weight: a.weight,
                created_at: now,
                updated_at: now,
            })
            .collect();
        assert_eq!(score(&inputs), score(&persisted));
    }
}
