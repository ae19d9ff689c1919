use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Tree depth used by the payout calculation.
pub const STANDARD_DEPTH: u32 = 3;

/// Tree depth used by the expanded network view.
pub const EXPANDED_DEPTH: u32 = 4;

/// Deepest tree the builder will walk.
pub const MAX_TREE_DEPTH: u32 = 64;

/// Decimal places kept on every monetary amount.
pub const CURRENCY_SCALE: u32 = 2;

/// Errors arising from loading or validating a [`RatesConfig`].
#[derive(Debug, Error)]
pub enum RatesError {
    #[error("failed to read rates file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse rates config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must not be negative, got {value}")]
    NegativeRate { field: &'static str, value: Decimal },
    #[error("deduction rate must be in [0, 1), got {0}")]
    InvalidDeductionRate(Decimal),
    #[error("daily cap must be at least one pair when set")]
    ZeroDailyCap,
    #[error("tree depth must be at least 1")]
    ZeroTreeDepth,
    #[error("tree depth {depth} exceeds the maximum of {max}")]
    TreeDepthTooLarge { depth: u32, max: u32 },
}

/// Rates, caps and limits applied by the income and payout calculations.
///
/// Every field has a default matching the live affiliate program, so a
/// JSON file only needs to list the values it overrides.
///
/// # Examples
///
/// ```
/// use binary_payout_engine::core::rates::RatesConfig;
/// use rust_decimal_macros::dec;
///
/// let rates = RatesConfig::from_json_str(r#"{ "promotionalRatePerPair": "500" }"#).unwrap();
/// assert_eq!(rates.promotional_rate_per_pair, dec!(500));
/// assert_eq!(rates.mentorship_rate_per_pair, dec!(100));
/// assert_eq!(rates.daily_cap_pairs, Some(5));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RatesConfig {
    /// Currency label used for display.
    pub currency: String,
    /// Promotional income per matched pair.
    pub promotional_rate_per_pair: Decimal,
    /// Mentorship income per pair matched under a direct referral.
    pub mentorship_rate_per_pair: Decimal,
    /// Maximum promotional pairs paid per day. `None` disables the cap.
    pub daily_cap_pairs: Option<u32>,
    /// Platform fee withheld from gross income.
    pub deduction_rate: Decimal,
    /// Number of tree levels considered, root included.
    pub tree_depth: u32,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            currency: "INR".to_string(),
            promotional_rate_per_pair: dec!(400),
            mentorship_rate_per_pair: dec!(100),
            daily_cap_pairs: Some(5),
            deduction_rate: dec!(0.05),
            tree_depth: STANDARD_DEPTH,
        }
    }
}

impl RatesConfig {
    /// Parse and validate a JSON rates document.
    pub fn from_json_str(json: &str) -> Result<Self, RatesError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON rates file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RatesError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| RatesError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<(), RatesError> {
        if self.promotional_rate_per_pair < Decimal::ZERO {
            return Err(RatesError::NegativeRate {
                field: "promotionalRatePerPair",
                value: self.promotional_rate_per_pair,
            });
        }
        if self.mentorship_rate_per_pair < Decimal::ZERO {
            return Err(RatesError::NegativeRate {
                field: "mentorshipRatePerPair",
                value: self.mentorship_rate_per_pair,
            });
        }
        if self.deduction_rate < Decimal::ZERO || self.deduction_rate >= Decimal::ONE {
            return Err(RatesError::InvalidDeductionRate(self.deduction_rate));
        }
        if self.daily_cap_pairs == Some(0) {
            return Err(RatesError::ZeroDailyCap);
        }
        if self.tree_depth == 0 {
            return Err(RatesError::ZeroTreeDepth);
        }
        if self.tree_depth > MAX_TREE_DEPTH {
            return Err(RatesError::TreeDepthTooLarge {
                depth: self.tree_depth,
                max: MAX_TREE_DEPTH,
            });
        }
        Ok(())
    }

    /// Same rates with the tree depth replaced.
    pub fn with_tree_depth(mut self, depth: u32) -> Self {
        self.tree_depth = depth;
        self
    }

    /// Largest promotional amount payable per day, if capped.
    pub fn daily_cap_amount(&self) -> Option<Decimal> {
        self.daily_cap_pairs
            .map(|pairs| Decimal::from(pairs) * self.promotional_rate_per_pair)
    }
}

/// Round a monetary amount half away from zero to [`CURRENCY_SCALE`] places.
///
/// ```
/// use binary_payout_engine::core::rates::round_currency;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(round_currency(dec!(16.645)), dec!(16.65));
/// assert_eq!(round_currency(dec!(16.644)), dec!(16.64));
/// ```
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}
