use crate::core::cycle::PayoutCycle;
use crate::core::member::{BankAccount, UserId};
use crate::core::payout::{BatchId, ExclusionReason, PayoutStatus};
use crate::income::mentorship::MentorshipIncome;
use crate::income::promotional::PromotionalIncome;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Every number that went into a payout, kept for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeBreakdown {
    pub promotional_income: Decimal,
    pub mentorship_income: Decimal,
    pub rewards_income: Decimal,
    /// Pairs matched anywhere in the member's tree.
    pub referral_pairs: u32,
    pub direct_referrals: usize,
    pub promotional: PromotionalIncome,
    pub mentorship: MentorshipIncome,
}

impl IncomeBreakdown {
    pub fn gross(&self) -> Decimal {
        self.promotional_income + self.mentorship_income + self.rewards_income
    }
}

/// A payout owed to one member for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutRecord {
    pub id: Uuid,
    pub user_id: UserId,
    pub payout_amount: Decimal,
    pub total_income: Decimal,
    pub deduction: Decimal,
    pub income_breakdown: IncomeBreakdown,
    pub bank_account: BankAccount,
    pub status: PayoutStatus,
    pub generated_at: DateTime<Utc>,
    pub payout_cycle: PayoutCycle,
    /// Generation run that produced this record; set when the record joins a batch.
    #[serde(default)]
    pub batch_id: Option<BatchId>,
}

impl PayoutRecord {
    /// Whether the amounts reconcile: payout + deduction = total = sum of incomes.
    pub fn is_consistent(&self) -> bool {
        self.total_income == self.income_breakdown.gross()
            && self.payout_amount + self.deduction == self.total_income
    }
}

impl fmt::Display for PayoutRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<12} gross {:>10}  fee {:>8}  payout {:>10}  [{}] -> {}",
            self.user_id,
            self.total_income,
            self.deduction,
            self.payout_amount,
            self.status,
            self.bank_account.masked_number()
        )
    }
}

/// Result of attempting to generate a payout for one member.
#[derive(Debug, Clone, PartialEq)]
pub enum PayoutOutcome {
    Payout(Box<PayoutRecord>),
    Excluded(ExclusionReason),
}

impl PayoutOutcome {
    pub fn record(&self) -> Option<&PayoutRecord> {
        match self {
            Self::Payout(record) => Some(record),
            Self::Excluded(_) => None,
        }
    }

    pub fn exclusion(&self) -> Option<ExclusionReason> {
        match self {
            Self::Payout(_) => None,
            Self::Excluded(reason) => Some(*reason),
        }
    }
}
