use crate::core::member::ReferralCode;
use crate::core::rates::RatesConfig;
use crate::income::mentorship::{calculate_mentorship_income, MentorshipIncome};
use crate::income::promotional::{calculate_promotional_income, PromotionalIncome};
use crate::network::directory::DownlineRepository;
use crate::network::pairs::count_pairs;
use crate::network::tree::{build_tree, TreeError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Everything the affiliate dashboard and the payout run need to know
/// about one member's network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSummary {
    pub referral_code: ReferralCode,
    pub tree_depth: u32,
    pub left_members: u32,
    pub right_members: u32,
    pub left_eligible: u32,
    pub right_eligible: u32,
    /// Positions in the tree where both children are eligible.
    pub tree_pairs: u32,
    pub direct_referrals: usize,
    pub promotional: PromotionalIncome,
    pub mentorship: MentorshipIncome,
}

impl NetworkSummary {
    /// Build the member's tree and derive pairs and income from it.
    ///
    /// Returns `Ok(None)` when `code` is not in the directory.
    pub fn compute<R: DownlineRepository + ?Sized>(
        repo: &R,
        code: &ReferralCode,
        rates: &RatesConfig,
    ) -> Result<Option<Self>, TreeError> {
        let Some(tree) = build_tree(repo, code, rates.tree_depth)? else {
            return Ok(None);
        };

        let legs = tree.leg_counts();
        let promotional = calculate_promotional_income(
            legs.left_eligible,
            legs.right_eligible,
            rates.promotional_rate_per_pair,
            rates.daily_cap_pairs,
        );
        let direct_referrals = repo.direct_referrals(code)?.len();
        let mentorship = calculate_mentorship_income(repo, code, rates)?;

        Ok(Some(Self {
            referral_code: code.clone(),
            tree_depth: rates.tree_depth,
            left_members: legs.left_members,
            right_members: legs.right_members,
            left_eligible: legs.left_eligible,
            right_eligible: legs.right_eligible,
            tree_pairs: count_pairs(Some(&tree)),
            direct_referrals,
            promotional,
            mentorship,
        }))
    }

    /// Summary of a member with no downline and no referrals.
    pub fn empty(code: &ReferralCode, rates: &RatesConfig) -> Self {
        Self {
            referral_code: code.clone(),
            tree_depth: rates.tree_depth,
            left_members: 0,
            right_members: 0,
            left_eligible: 0,
            right_eligible: 0,
            tree_pairs: 0,
            direct_referrals: 0,
            promotional: PromotionalIncome::zero(
                rates.promotional_rate_per_pair,
                rates.daily_cap_pairs,
            ),
            mentorship: MentorshipIncome::zero(rates.mentorship_rate_per_pair),
        }
    }

    /// Promotional plus mentorship income. Rewards are tracked on the member.
    pub fn network_income(&self) -> Decimal {
        self.promotional.amount + self.mentorship.amount
    }

    pub fn total_members(&self) -> u32 {
        self.left_members + self.right_members
    }
}

impl fmt::Display for NetworkSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Network: {} (depth {}) ===", self.referral_code, self.tree_depth)?;
        writeln!(
            f,
            "Left leg:          {} members, {} eligible",
            self.left_members, self.left_eligible
        )?;
        writeln!(
            f,
            "Right leg:         {} members, {} eligible",
            self.right_members, self.right_eligible
        )?;
        writeln!(f, "Tree pairs:        {}", self.tree_pairs)?;
        writeln!(f, "Direct referrals:  {}", self.direct_referrals)?;
        writeln!(f, "Promotional:       {}", self.promotional)?;
        writeln!(
            f,
            "Mentorship:        {} pairs x {} = {}",
            self.mentorship.pairs, self.mentorship.rate_per_pair, self.mentorship.amount
        )?;
        writeln!(f, "Network income:    {}", self.network_income())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::member::{Member, UserId};
    use crate::network::directory::InMemoryDirectory;
    use rust_decimal_macros::dec;

    fn member(code: &str) -> Member {
        Member::new(UserId::new(format!("uid-{code}")), ReferralCode::new(code))
    }

    fn code(s: &str) -> ReferralCode {
        ReferralCode::new(s)
    }

    fn directory() -> InMemoryDirectory {
        let mut d = InMemoryDirectory::new();
        d.insert(member("ROOT").approved().with_left(code("L")).with_right(code("R")))
            .unwrap();
        d.insert(
            member("L")
                .approved()
                .with_sponsor(code("ROOT"))
                .with_left(code("LL"))
                .with_right(code("LR")),
        )
        .unwrap();
        d.insert(member("R").approved().with_sponsor(code("ROOT")))
            .unwrap();
        d.insert(member("LL").approved()).unwrap();
        d.insert(member("LR").approved()).unwrap();
        d
    }

    #[test]
    fn test_summary_for_unknown_code() {
        let d = directory();
        let summary = NetworkSummary::compute(&d, &code("NOPE"), &RatesConfig::default()).unwrap();
        assert!(summary.is_none());
    }

    #[test]
    fn test_summary_figures() {
        let d = directory();
        let summary = NetworkSummary::compute(&d, &code("ROOT"), &RatesConfig::default())
            .unwrap()
            .unwrap();

        assert_eq!(summary.left_members, 3);
        assert_eq!(summary.right_members, 1);
        assert_eq!(summary.left_eligible, 3);
        assert_eq!(summary.right_eligible, 1);
        assert_eq!(summary.total_members(), 4);
        // ROOT and L both have two eligible children
        assert_eq!(summary.tree_pairs, 2);
        assert_eq!(summary.direct_referrals, 2);
        // 3,1 -> 1,0: one promotional pair
        assert_eq!(summary.promotional.pairs, 1);
        assert_eq!(summary.promotional.amount, dec!(400));
        // L's own legs are 1,1: no mentorship pairs
        assert_eq!(summary.mentorship.pairs, 0);
        assert_eq!(summary.network_income(), dec!(400));
    }

    #[test]
    fn test_summary_display() {
        let d = directory();
        let summary = NetworkSummary::compute(&d, &code("ROOT"), &RatesConfig::default())
            .unwrap()
            .unwrap();
        let text = summary.to_string();
        assert!(text.contains("Network: ROOT"));
        assert!(text.contains("Tree pairs:        2"));
    }
}
