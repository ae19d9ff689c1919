use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonic identifier of one payout generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(u64);

impl BatchId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Settlement state of a payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutStatus {
    Pending,
    Completed,
    Rejected,
}

impl PayoutStatus {
    /// Only pending payouts can move, and only to a terminal state.
    pub fn can_transition_to(self, next: PayoutStatus) -> bool {
        matches!(
            (self, next),
            (PayoutStatus::Pending, PayoutStatus::Completed)
                | (PayoutStatus::Pending, PayoutStatus::Rejected)
        )
    }

    pub fn is_terminal(self) -> bool {
        self != PayoutStatus::Pending
    }
}

impl fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// Why a member was left out of a payout cycle.
///
/// Exclusion is a normal business outcome shown to admins, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    KycIncomplete,
    BankAccountMissing,
    PaymentRequestNotApproved,
}

impl ExclusionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KycIncomplete => "kyc_incomplete",
            Self::BankAccountMissing => "bank_account_missing",
            Self::PaymentRequestNotApproved => "payment_request_not_approved",
        }
    }
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        assert!(PayoutStatus::Pending.can_transition_to(PayoutStatus::Completed));
        assert!(PayoutStatus::Pending.can_transition_to(PayoutStatus::Rejected));
        assert!(!PayoutStatus::Pending.can_transition_to(PayoutStatus::Pending));
        assert!(!PayoutStatus::Completed.can_transition_to(PayoutStatus::Rejected));
        assert!(!PayoutStatus::Rejected.can_transition_to(PayoutStatus::Completed));
        assert!(PayoutStatus::Completed.is_terminal());
        assert!(!PayoutStatus::Pending.is_terminal());
    }

    #[test]
    fn test_exclusion_reason_wire_names() {
        let json = serde_json::to_string(&ExclusionReason::PaymentRequestNotApproved).unwrap();
        assert_eq!(json, "\"payment_request_not_approved\"");
        assert_eq!(ExclusionReason::KycIncomplete.to_string(), "kyc_incomplete");
        assert_eq!(
            ExclusionReason::BankAccountMissing.as_str(),
            "bank_account_missing"
        );
    }

    #[test]
    fn test_batch_id_ordering() {
        assert!(BatchId::new(1) < BatchId::new(2));
        assert_eq!(BatchId::new(7).to_string(), "#7");
    }
}
