use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of matching two legs against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegBalance {
    pub pairs: u32,
    /// Unmatched members left on the left leg.
    pub left_remaining: u32,
    /// Unmatched members left on the right leg.
    pub right_remaining: u32,
}

/// Match two legs using the 2:1 rule.
///
/// Each pair consumes two members from one leg and one from the other,
/// always draining the larger leg by two. On a tie the right leg is
/// drained by two. Matching stops once neither split is possible.
///
/// ```
/// use binary_payout_engine::income::promotional::balance_legs;
///
/// let balance = balance_legs(5, 5);
/// assert_eq!(balance.pairs, 3);
/// assert_eq!((balance.left_remaining, balance.right_remaining), (1, 0));
/// ```
pub fn balance_legs(left: u32, right: u32) -> LegBalance {
    let (mut l, mut r) = (left, right);
    let mut pairs = 0;
    while (l >= 2 && r >= 1) || (l >= 1 && r >= 2) {
        if l > r {
            l -= 2;
            r -= 1;
        } else {
            l -= 1;
            r -= 2;
        }
        pairs += 1;
    }
    LegBalance {
        pairs,
        left_remaining: l,
        right_remaining: r,
    }
}

/// Promotional income earned from matching a member's two legs.
///
/// Keeps the inputs, the uncapped amount and the cap so the final
/// figure can be re-derived by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionalIncome {
    pub left_count: u32,
    pub right_count: u32,
    pub pairs: u32,
    pub left_remaining: u32,
    pub right_remaining: u32,
    pub rate_per_pair: Decimal,
    /// Amount before the daily cap.
    pub potential_amount: Decimal,
    /// Amount actually earned.
    pub amount: Decimal,
    pub daily_cap_pairs: Option<u32>,
    pub cap_applied: bool,
}

impl PromotionalIncome {
    pub fn zero(rate_per_pair: Decimal, daily_cap_pairs: Option<u32>) -> Self {
        calculate_promotional_income(0, 0, rate_per_pair, daily_cap_pairs)
    }

    /// Pairs actually paid after the cap.
    pub fn paid_pairs(&self) -> u32 {
        match self.daily_cap_pairs {
            Some(cap) => self.pairs.min(cap),
            None => self.pairs,
        }
    }
}

impl fmt::Display for PromotionalIncome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pairs from legs {}/{} x {} = {}",
            self.pairs, self.left_count, self.right_count, self.rate_per_pair, self.potential_amount
        )?;
        if self.cap_applied {
            write!(f, " (capped to {})", self.amount)?;
        }
        Ok(())
    }
}

/// Compute promotional income from the eligible member counts of each leg.
///
/// Pairs come from [`balance_legs`]. The potential amount is
/// `pairs * rate_per_pair`; with a daily cap the paid amount is limited
/// to `cap * rate_per_pair`.
///
/// # Examples
///
/// ```
/// use binary_payout_engine::income::promotional::calculate_promotional_income;
/// use rust_decimal_macros::dec;
///
/// let income = calculate_promotional_income(100, 100, dec!(400), Some(5));
/// assert_eq!(income.amount, dec!(2000));
/// assert!(income.cap_applied);
/// ```
pub fn calculate_promotional_income(
    left_eligible: u32,
    right_eligible: u32,
    rate_per_pair: Decimal,
    daily_cap_pairs: Option<u32>,
) -> PromotionalIncome {
    let balance = balance_legs(left_eligible, right_eligible);
    let potential_amount = Decimal::from(balance.pairs) * rate_per_pair;
    let amount = match daily_cap_pairs {
        Some(cap) => potential_amount.min(Decimal::from(cap) * rate_per_pair),
        None => potential_amount,
    };

    PromotionalIncome {
        left_count: left_eligible,
        right_count: right_eligible,
        pairs: balance.pairs,
        left_remaining: balance.left_remaining,
        right_remaining: balance.right_remaining,
        rate_per_pair,
        potential_amount,
        amount,
        daily_cap_pairs,
        cap_applied: amount < potential_amount,
    }
}
