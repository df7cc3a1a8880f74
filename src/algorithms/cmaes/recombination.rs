//! Ranking and weighted recombination

use std::cmp::Ordering;

use nalgebra::DVector;

/// Ascending cost order with NaN ranked after every other value
pub fn compare_costs(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b)
        .unwrap_or_else(|| a.is_nan().cmp(&b.is_nan()))
}

/// Population indices ordered best-first
///
/// The sort is stable, so equal costs keep their population index order and
/// the ranking is fully determined by the costs.
pub fn rank_by_cost(costs: &[f64]) -> Vec<usize> {
    let mut ranking: Vec<usize> = (0..costs.len()).collect();
    ranking.sort_by(|&a, &b| compare_costs(costs[a], costs[b]));
    ranking
}

/// Weighted step y_w = Σⱼ wⱼ · offset[rank j] over the best μ offsets
pub fn weighted_step(offsets: &[DVector<f64>], ranking: &[usize], weights: &[f64]) -> DVector<f64> {
    let n = offsets.first().map_or(0, |o| o.len());
    let mut step = DVector::zeros(n);
    for (&w, &idx) in weights.iter().zip(ranking) {
        step.axpy(w, &offsets[idx], 1.0);
    }
    step
}

/// Best, worst and median cost of a ranked population
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CostSummary {
    /// Lowest cost
    pub best: f64,
    /// Highest cost (NaN if any cost is NaN)
    pub worst: f64,
    /// Median cost
    pub median: f64,
}

impl CostSummary {
    /// Summarize costs given their best-first ranking
    pub fn from_ranking(costs: &[f64], ranking: &[usize]) -> Option<Self> {
        let best = costs[*ranking.first()?];
        let worst = costs[*ranking.last()?];
        let mid = ranking.len() / 2;
        let median = if ranking.len() % 2 == 0 {
            0.5 * (costs[ranking[mid - 1]] + costs[ranking[mid]])
        } else {
            costs[ranking[mid]]
        };
        Some(Self {
            best,
            worst,
            median,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rank_ascending() {
        assert_eq!(rank_by_cost(&[3.0, 1.0, 2.0]), vec![1, 2, 0]);
    }

    #[test]
    fn test_rank_ties_keep_index_order() {
        assert_eq!(rank_by_cost(&[2.0, 1.0, 2.0, 1.0, 2.0]), vec![1, 3, 0, 2, 4]);
    }

    #[test]
    fn test_rank_nan_last() {
        let costs = [f64::NAN, 5.0, f64::INFINITY, f64::NAN, -1.0];
        assert_eq!(rank_by_cost(&costs), vec![4, 1, 2, 0, 3]);
    }

    #[test]
    fn test_weighted_step() {
        let offsets = vec![
            DVector::from_vec(vec![1.0, 0.0]),
            DVector::from_vec(vec![0.0, 1.0]),
            DVector::from_vec(vec![10.0, 10.0]),
        ];
        let step = weighted_step(&offsets, &[1, 0, 2], &[0.75, 0.25]);
        assert_relative_eq!(step[0], 0.25);
        assert_relative_eq!(step[1], 0.75);
    }

    #[test]
    fn test_cost_summary() {
        let costs = [4.0, 1.0, 3.0, 2.0];
        let ranking = rank_by_cost(&costs);
        let summary = CostSummary::from_ranking(&costs, &ranking).unwrap();
        assert_eq!(summary.best, 1.0);
        assert_eq!(summary.worst, 4.0);
        assert_relative_eq!(summary.median, 2.5);

        let with_nan = [1.0, f64::NAN, 2.0];
        let summary = CostSummary::from_ranking(&with_nan, &rank_by_cost(&with_nan)).unwrap();
        assert_eq!(summary.best, 1.0);
        assert!(summary.worst.is_nan());

        assert!(CostSummary::from_ranking(&[], &[]).is_none());
    }
}
