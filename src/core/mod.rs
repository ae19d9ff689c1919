pub mod cycle;
pub mod member;
pub mod payout;
pub mod rates;
