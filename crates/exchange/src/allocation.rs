//! Per-line split of an order-level empty count.
//!
//! The single-line bypass and the floor-based proportional split preserve the
//! observed behavior of the live operation. The floor can lose remainder
//! units across lines of a multi-line order; that loss is part of the
//! documented contract, not a bug to correct here.

/// Split the empties actually collected across order lines.
///
/// - single-line order: the line takes the whole collected count.
/// - multi-line order: `floor(empty_collected × ordered ÷ expected_empty)`
///   per line; with `expected_empty <= 0` nothing can be attributed, so every
///   line gets 0 and the excess shows up as variance only.
pub fn allocate_line_returns(ordered: &[i64], empty_collected: i64, expected_empty: i64) -> Vec<i64> {
    if ordered.len() == 1 {
        return vec![empty_collected];
    }
    if expected_empty <= 0 {
        return vec![0; ordered.len()];
    }
    ordered
        .iter()
        .map(|qty| empty_collected * qty / expected_empty)
        .collect()
}

/// Split the order-level expected-empty count across lines for the
/// customer-stock pre-check, proportional to ordered quantity.
///
/// Mirrors the single-line bypass: one line carries the whole expectation.
pub fn allocate_expected_shares(ordered: &[i64], expected_empty: i64) -> Vec<i64> {
    if ordered.len() == 1 {
        return vec![expected_empty];
    }
    let total_ordered: i64 = ordered.iter().sum();
    if total_ordered <= 0 {
        return vec![0; ordered.len()];
    }
    ordered
        .iter()
        .map(|qty| expected_empty * qty / total_ordered)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_bypasses_the_formula() {
        assert_eq!(allocate_line_returns(&[50], 40, 50), vec![40]);
        assert_eq!(allocate_expected_shares(&[50], 50), vec![50]);
    }

    #[test]
    fn proportional_split_without_loss() {
        // 30/20 of 45 expected-50: 27 + 18 = 45, nothing lost here.
        assert_eq!(allocate_line_returns(&[30, 20], 45, 50), vec![27, 18]);
    }

    #[test]
    fn floor_split_can_lose_remainder_units() {
        // 33/17 of 45 expected-50: floor gives 29 + 15 = 44, one unit lost.
        let shares = allocate_line_returns(&[33, 17], 45, 50);
        assert_eq!(shares, vec![29, 15]);
        assert_eq!(shares.iter().sum::<i64>(), 44);
    }

    #[test]
    fn zero_expected_attributes_nothing_on_multi_line() {
        assert_eq!(allocate_line_returns(&[30, 20], 5, 0), vec![0, 0]);
    }

    #[test]
    fn expected_shares_follow_ordered_proportions() {
        assert_eq!(allocate_expected_shares(&[30, 20], 50), vec![30, 20]);
        assert_eq!(allocate_expected_shares(&[33, 17], 50), vec![33, 17]);
        // Floor here too: 25 over 30/20 gives 15 + 10.
        assert_eq!(allocate_expected_shares(&[30, 20], 25), vec![15, 10]);
    }
}
