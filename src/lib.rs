//! # binary-payout-engine
//!
//! Pair matching, income calculation and payout generation for a
//! binary-tree affiliate network.
//!
//! Every member has two downline slots. Income comes from matching
//! eligible members of the left leg against the right leg, from pairs
//! matched under the member's direct referrals, and from rewards.
//! Payouts are generated per cycle in versioned batches.
//!
//! ## Architecture
//!
//! - **core**: Members, rates configuration, payout cycles, payout statuses
//! - **network**: Member directory, downline tree builder, pair counter
//! - **income**: Leg balancer, promotional and mentorship income, network summary
//! - **payout**: Payout records, payout generator and single-writer payout batches
//! - **simulation**: Random network generation for stress testing

pub mod core;
pub mod income;
pub mod network;
pub mod payout;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::core::cycle::PayoutCycle;
    pub use crate::core::member::{BankAccount, Member, PaymentRequestStatus, ReferralCode, UserId};
    pub use crate::core::payout::{ExclusionReason, PayoutStatus};
    pub use crate::core::rates::RatesConfig;
    pub use crate::income::promotional::calculate_promotional_income;
    pub use crate::income::summary::NetworkSummary;
    pub use crate::network::directory::{DownlineRepository, InMemoryDirectory};
    pub use crate::network::pairs::count_pairs;
    pub use crate::network::tree::{build_tree, TreeNode};
    pub use crate::payout::batch::PayoutBook;
    pub use crate::payout::generator::{generate_payout, PayoutGenerator};
    pub use crate::payout::record::{PayoutOutcome, PayoutRecord};
}
