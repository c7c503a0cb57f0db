//! Ranking helpers shared by the rank-based tests.

/// 1-based ranks with ties assigned their average rank (scipy `rankdata(method="average")`).
pub fn rankdata(x: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..x.len()).collect();
    order.sort_by(|&a, &b| x[a].total_cmp(&x[b]));

    let mut ranks = vec![0.0; x.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && x[order[end]] == x[order[start]] {
            end += 1;
        }
        // positions start..end share ranks start+1..=end
        let avg = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = avg;
        }
        start = end;
    }
    ranks
}

/// Sizes of the groups of equal values (groups of size 1 included).
pub fn tie_groups(x: &[f64]) -> Vec<usize> {
    let mut sorted = x.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mut groups = Vec::new();
    let mut start = 0;
    while start < sorted.len() {
        let mut end = start + 1;
        while end < sorted.len() && sorted[end] == sorted[start] {
            end += 1;
        }
        groups.push(end - start);
        start = end;
    }
    groups
}

/// `Σ (t³ - t)` over tie groups; zero when all values are distinct.
pub fn tie_sum(x: &[f64]) -> f64 {
    tie_groups(x)
        .into_iter()
        .map(|t| {
            let t = t as f64;
            t * t * t - t
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rankdata_average_ties() {
        assert_eq!(rankdata(&[10.0, 20.0, 10.0, 30.0]), vec![1.5, 3.0, 1.5, 4.0]);
        assert_eq!(rankdata(&[3.0, 1.0, 2.0]), vec![3.0, 1.0, 2.0]);
        assert!(rankdata(&[]).is_empty());
    }

    #[test]
    fn test_tie_sum() {
        assert_eq!(tie_sum(&[1.0, 2.0, 3.0]), 0.0);
        // one pair (6) and one triple (24)
        assert_eq!(tie_sum(&[1.0, 1.0, 2.0, 2.0, 2.0, 5.0]), 30.0);
    }

    proptest! {
        #[test]
        fn prop_rank_sum_is_triangular(x in proptest::collection::vec(-50i32..50, 0..200)) {
            let x: Vec<f64> = x.into_iter().map(f64::from).collect();
            let n = x.len() as f64;
            let total: f64 = rankdata(&x).iter().sum();
            prop_assert!((total - n * (n + 1.0) / 2.0).abs() < 1e-9);
            prop_assert_eq!(tie_groups(&x).iter().sum::<usize>(), x.len());
        }
    }
}
