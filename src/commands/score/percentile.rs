use std::cmp::Ordering;

/// Percentile rank (0-100) of every value against the whole column.
///
/// Tied values share the average of the ranks they span. Missing values do
/// not take part in ranking and score 0.
pub fn percentile_ranks(values: &[Option<f64>]) -> Vec<f64> {
    let mut present = values
        .iter()
        .enumerate()
        .filter_map(|(index, value)| value.filter(|v| v.is_finite()).map(|v| (index, v)))
        .collect::<Vec<(usize, f64)>>();
    present.sort_by(|left, right| left.1.partial_cmp(&right.1).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0.0; values.len()];
    let count = present.len();
    if count == 0 {
        return ranks;
    }

    let mut start = 0;
    while start < count {
        let mut end = start + 1;
        while end < count && present[end].1 == present[start].1 {
            end += 1;
        }

        // 1-based ranks start+1..=end averaged across the tie block.
        let average_rank = (start + 1 + end) as f64 / 2.0;
        let percentile = average_rank / count as f64 * 100.0;
        for (index, _) in &present[start..end] {
            ranks[*index] = percentile;
        }

        start = end;
    }

    ranks
}

#[cfg(test)]
mod tests {
    use super::percentile_ranks;

    #[test]
    fn ranks_distinct_values_uniformly() {
        let ranks = percentile_ranks(&[Some(30.0), Some(10.0), Some(20.0), Some(40.0)]);
        assert_eq!(ranks, vec![75.0, 25.0, 50.0, 100.0]);
    }

    #[test]
    fn ties_share_the_average_rank() {
        let ranks = percentile_ranks(&[Some(0.0), Some(0.0), Some(5.0), Some(0.0)]);
        assert_eq!(ranks, vec![50.0, 50.0, 100.0, 50.0]);
    }

    #[test]
    fn missing_values_rank_zero_and_do_not_count() {
        let ranks = percentile_ranks(&[None, Some(1.0), Some(2.0), None]);
        assert_eq!(ranks, vec![0.0, 50.0, 100.0, 0.0]);
    }

    #[test]
    fn empty_and_all_missing_columns_are_zero() {
        assert!(percentile_ranks(&[]).is_empty());
        assert_eq!(percentile_ranks(&[None, None]), vec![0.0, 0.0]);
    }
}
