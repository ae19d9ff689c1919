use crate::core::member::ReferralCode;
use crate::core::rates::RatesConfig;
use crate::income::promotional::balance_legs;
use crate::network::directory::DownlineRepository;
use crate::network::tree::{build_tree, TreeError};
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Pairs matched under one direct referral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralContribution {
    pub referral_code: ReferralCode,
    pub pairs: u32,
}

/// Income a sponsor earns from pairs matched in their direct referrals' trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentorshipIncome {
    pub pairs: u32,
    pub rate_per_pair: Decimal,
    pub amount: Decimal,
    pub contributions: Vec<ReferralContribution>,
}

impl MentorshipIncome {
    pub fn zero(rate_per_pair: Decimal) -> Self {
        Self {
            pairs: 0,
            rate_per_pair,
            amount: Decimal::ZERO,
            contributions: Vec::new(),
        }
    }
}

/// Compute mentorship income for the member with referral code `sponsor`.
///
/// Every eligible direct referral (matched by `referred_by`, not by tree
/// position) has their own tree built to `rates.tree_depth`. Their legs'
/// eligible counts go through the 2:1 leg balancer without a daily cap,
/// and each resulting pair pays `rates.mentorship_rate_per_pair`.
pub fn calculate_mentorship_income<R: DownlineRepository + ?Sized>(
    repo: &R,
    sponsor: &ReferralCode,
    rates: &RatesConfig,
) -> Result<MentorshipIncome, TreeError> {
    let mut income = MentorshipIncome::zero(rates.mentorship_rate_per_pair);

    for referral in repo.direct_referrals(sponsor)? {
        if !referral.is_eligible() {
            continue;
        }
        let Some(tree) = build_tree(repo, &referral.referral_code, rates.tree_depth)? else {
            continue;
        };
        let legs = tree.leg_counts();
        let balance = balance_legs(legs.left_eligible, legs.right_eligible);
        if balance.pairs == 0 {
            continue;
        }
        debug!(
            "mentorship: {} contributes {} pairs to {}",
            referral.referral_code, balance.pairs, sponsor
        );
        income.pairs += balance.pairs;
        income.contributions.push(ReferralContribution {
            referral_code: referral.referral_code.clone(),
            pairs: balance.pairs,
        });
    }

    income.amount = Decimal::from(income.pairs) * income.rate_per_pair;
    Ok(income)
}
