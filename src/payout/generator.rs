use crate::core::cycle::PayoutCycle;
use crate::core::member::{BankAccount, Member, PaymentRequestStatus};
use crate::core::payout::{BatchId, ExclusionReason, PayoutStatus};
use crate::core::rates::{round_currency, RatesConfig};
use crate::income::summary::NetworkSummary;
use crate::network::directory::DownlineRepository;
use crate::payout::batch::{Exclusion, PayoutBatch, PayoutBook, PayoutError};
use crate::payout::record::{IncomeBreakdown, PayoutOutcome, PayoutRecord};
use chrono::Utc;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

/// Check payout preconditions in order: KYC, bank account, payment request.
///
/// The first failing check decides the reason. On success the bank
/// account the payout will be sent to is returned.
pub fn check_payout_eligibility<'a>(
    member: &Member,
    bank_account: Option<&'a BankAccount>,
) -> Result<&'a BankAccount, ExclusionReason> {
    if !member.kyc_completed {
        return Err(ExclusionReason::KycIncomplete);
    }
    let account = bank_account.ok_or(ExclusionReason::BankAccountMissing)?;
    if member.payment_request_status != PaymentRequestStatus::Approved {
        return Err(ExclusionReason::PaymentRequestNotApproved);
    }
    Ok(account)
}

/// Split gross income into `(deduction, payout)`.
///
/// The deduction is rounded half away from zero to two decimal places;
/// the payout is the exact remainder, so the two always sum to `gross`.
///
/// ```
/// use binary_payout_engine::payout::generator::apply_deduction;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(apply_deduction(dec!(333), dec!(0.05)), (dec!(16.65), dec!(316.35)));
/// ```
pub fn apply_deduction(gross: Decimal, deduction_rate: Decimal) -> (Decimal, Decimal) {
    let deduction = round_currency(gross * deduction_rate);
    (deduction, gross - deduction)
}

/// Produce a payout for `member`, or the reason they are excluded.
///
/// Gross income is promotional plus mentorship plus rewards income.
/// The record keeps the complete breakdown alongside the final amount.
pub fn generate_payout(
    member: &Member,
    bank_account: Option<&BankAccount>,
    summary: &NetworkSummary,
    rates: &RatesConfig,
    cycle: PayoutCycle,
) -> PayoutOutcome {
    let account = match check_payout_eligibility(member, bank_account) {
        Ok(account) => account,
        Err(reason) => return PayoutOutcome::Excluded(reason),
    };

    let breakdown = IncomeBreakdown {
        promotional_income: summary.promotional.amount,
        mentorship_income: summary.mentorship.amount,
        rewards_income: member.rewards_income,
        referral_pairs: summary.tree_pairs,
        direct_referrals: summary.direct_referrals,
        promotional: summary.promotional.clone(),
        mentorship: summary.mentorship.clone(),
    };
    let total_income = breakdown.gross();
    let (deduction, payout_amount) = apply_deduction(total_income, rates.deduction_rate);

    PayoutOutcome::Payout(Box::new(PayoutRecord {
        id: Uuid::new_v4(),
        user_id: member.user_id.clone(),
        payout_amount,
        total_income,
        deduction,
        income_breakdown: breakdown,
        bank_account: account.clone(),
        status: PayoutStatus::Pending,
        generated_at: Utc::now(),
        payout_cycle: cycle,
        batch_id: None,
    }))
}

/// Runs payout generation against a member directory.
pub struct PayoutGenerator<'a, R: DownlineRepository + ?Sized> {
    repo: &'a R,
    rates: &'a RatesConfig,
}

impl<'a, R: DownlineRepository + ?Sized> PayoutGenerator<'a, R> {
    pub fn new(repo: &'a R, rates: &'a RatesConfig) -> Self {
        Self { repo, rates }
    }

    /// Payout outcome for a single member.
    ///
    /// Preconditions are checked before the network is walked, so
    /// excluded members cost no tree lookups.
    pub fn payout_for(
        &self,
        member: &Member,
        cycle: PayoutCycle,
    ) -> Result<PayoutOutcome, PayoutError> {
        let bank_account = self.repo.bank_account(&member.user_id)?;
        if let Err(reason) = check_payout_eligibility(member, bank_account.as_ref()) {
            debug!("{} excluded: {}", member.referral_code, reason);
            return Ok(PayoutOutcome::Excluded(reason));
        }

        let summary = match NetworkSummary::compute(self.repo, &member.referral_code, self.rates)? {
            Some(summary) => summary,
            None => {
                warn!("{} vanished from the directory mid-run", member.referral_code);
                NetworkSummary::empty(&member.referral_code, self.rates)
            }
        };
        Ok(generate_payout(
            member,
            bank_account.as_ref(),
            &summary,
            self.rates,
            cycle,
        ))
    }

    /// Compute a full batch for `cycle` without publishing it.
    ///
    /// Every affiliate is considered. Members with zero gross income are
    /// counted but get no record.
    pub fn build_batch(&self, id: BatchId, cycle: PayoutCycle) -> Result<PayoutBatch, PayoutError> {
        let mut batch = PayoutBatch::new(id, cycle);

        for member in self.repo.members()? {
            if !member.affiliate_status {
                continue;
            }
            match self.payout_for(&member, cycle)? {
                PayoutOutcome::Payout(record) => {
                    if record.total_income.is_zero() {
                        batch.skipped_zero_income += 1;
                    } else {
                        batch.push_record(*record);
                    }
                }
                PayoutOutcome::Excluded(reason) => batch.exclusions.push(Exclusion {
                    user_id: member.user_id.clone(),
                    referral_code: member.referral_code.clone(),
                    reason,
                }),
            }
        }

        info!(
            "batch {} for cycle {}: {} payouts totalling {}, {} excluded",
            id,
            cycle,
            batch.record_count(),
            batch.total_payout(),
            batch.exclusions.len()
        );
        Ok(batch)
    }

    /// Generate and publish the batch for `cycle`, replacing any previous one.
    pub fn generate_batch(
        &self,
        book: &PayoutBook,
        cycle: PayoutCycle,
    ) -> Result<Arc<PayoutBatch>, PayoutError> {
        book.regenerate(cycle, |id| self.build_batch(id, cycle))
    }
}
