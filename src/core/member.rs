use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Referral code of a member in the affiliate network.
///
/// Referral codes are the keys used for tree edges: a member's
/// left and right downline slots hold the referral codes of the
/// members placed beneath them.
///
/// # Examples
///
/// ```
/// use binary_payout_engine::core::member::ReferralCode;
///
/// let a = ReferralCode::new("AFF1001");
/// let b = ReferralCode::new("AFF1002");
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferralCode(String);

impl ReferralCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReferralCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ReferralCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Primary key of a member record in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// State of a member's affiliate-program payment request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentRequestStatus {
    #[default]
    None,
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for PaymentRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// A participant in the affiliate network.
///
/// Mirrors the user document of the backing store. `referred_by`
/// points at the sponsor and is informational only: tree position
/// is decided exclusively by the sponsor's `left_down_line` and
/// `right_down_line` slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub user_id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub referral_code: ReferralCode,
    #[serde(default)]
    pub referred_by: Option<ReferralCode>,
    #[serde(default)]
    pub left_down_line: Option<ReferralCode>,
    #[serde(default)]
    pub right_down_line: Option<ReferralCode>,
    #[serde(default)]
    pub affiliate_status: bool,
    #[serde(default)]
    pub payment_request_status: PaymentRequestStatus,
    #[serde(default)]
    pub kyc_completed: bool,
    #[serde(default)]
    pub rewards_income: Decimal,
}

impl Member {
    /// Create a member with no downlines, no sponsor and no approvals.
    pub fn new(user_id: UserId, referral_code: ReferralCode) -> Self {
        Self {
            user_id,
            name: String::new(),
            email: String::new(),
            referral_code,
            referred_by: None,
            left_down_line: None,
            right_down_line: None,
            affiliate_status: false,
            payment_request_status: PaymentRequestStatus::None,
            kyc_completed: false,
            rewards_income: Decimal::ZERO,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_sponsor(mut self, sponsor: ReferralCode) -> Self {
        self.referred_by = Some(sponsor);
        self
    }

    pub fn with_left(mut self, code: ReferralCode) -> Self {
        self.left_down_line = Some(code);
        self
    }

    pub fn with_right(mut self, code: ReferralCode) -> Self {
        self.right_down_line = Some(code);
        self
    }

    /// Mark the member as an approved affiliate with an approved payment request.
    pub fn approved(mut self) -> Self {
        self.affiliate_status = true;
        self.payment_request_status = PaymentRequestStatus::Approved;
        self
    }

    pub fn with_payment_request(mut self, status: PaymentRequestStatus) -> Self {
        self.payment_request_status = status;
        self
    }

    pub fn with_kyc(mut self, completed: bool) -> Self {
        self.kyc_completed = completed;
        self
    }

    pub fn with_rewards(mut self, rewards: Decimal) -> Self {
        self.rewards_income = rewards;
        self
    }

    /// Whether this member counts toward pairs and income.
    ///
    /// True only for approved affiliates whose payment request was approved.
    pub fn is_eligible(&self) -> bool {
        self.affiliate_status && self.payment_request_status == PaymentRequestStatus::Approved
    }

    /// Downline codes in slot order: left, then right.
    pub fn downlines(&self) -> impl Iterator<Item = &ReferralCode> {
        self.left_down_line
            .iter()
            .chain(self.right_down_line.iter())
    }
}

/// Bank account on file for a member, required before any payout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    pub user_id: UserId,
    pub account_holder: String,
    pub account_number: String,
    pub ifsc: String,
    #[serde(default)]
    pub bank_name: Option<String>,
}

impl BankAccount {
    pub fn new(
        user_id: UserId,
        account_holder: impl Into<String>,
        account_number: impl Into<String>,
        ifsc: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            account_holder: account_holder.into(),
            account_number: account_number.into(),
            ifsc: ifsc.into(),
            bank_name: None,
        }
    }

    /// Account number with everything but the last four digits hidden.
    pub fn masked_number(&self) -> String {
        let chars: Vec<char> = self.account_number.chars().collect();
        let visible = chars.len().min(4);
        let hidden = chars.len() - visible;
        let tail: String = chars[hidden..].iter().collect();
        format!("{}{}", "*".repeat(hidden), tail)
    }
}
