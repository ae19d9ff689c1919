use binary_payout_engine::core::cycle::PayoutCycle;
use binary_payout_engine::core::member::{
    BankAccount, Member, PaymentRequestStatus, ReferralCode, UserId,
};
use binary_payout_engine::core::payout::{ExclusionReason, PayoutStatus};
use binary_payout_engine::core::rates::{RatesConfig, EXPANDED_DEPTH, STANDARD_DEPTH};
use binary_payout_engine::income::summary::NetworkSummary;
use binary_payout_engine::network::directory::{
    DirectoryError, DownlineRepository, InMemoryDirectory, LookupField,
};
use binary_payout_engine::network::pairs::count_pairs;
use binary_payout_engine::network::tree::{build_tree, TreeError};
use binary_payout_engine::payout::batch::{PayoutBook, PayoutError};
use binary_payout_engine::payout::generator::PayoutGenerator;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

fn code(s: &str) -> ReferralCode {
    ReferralCode::new(s)
}

fn member(c: &str) -> Member {
    Member::new(UserId::new(format!("uid-{c}")), code(c))
        .with_email(format!("{}@example.com", c.to_lowercase()))
}

fn account_for(c: &str) -> BankAccount {
    BankAccount::new(UserId::new(format!("uid-{c}")), c, "112233445566", "ICIC0000001")
}

/// A small organisation:
///
/// ```text
///                 ASHA
///           /              \
///        BALA              CHITRA
///       /    \            /      \
///    DEV     ELLA      FARAH    GOPI(pending)
///    /
///  HARI
/// ```
///
/// BALA and CHITRA were referred by ASHA; DEV and ELLA by BALA.
fn organisation() -> InMemoryDirectory {
    let mut d = InMemoryDirectory::new();
    let members = vec![
        member("ASHA")
            .approved()
            .with_kyc(true)
            .with_rewards(dec!(250))
            .with_left(code("BALA"))
            .with_right(code("CHITRA")),
        member("BALA")
            .approved()
            .with_kyc(true)
            .with_sponsor(code("ASHA"))
            .with_left(code("DEV"))
            .with_right(code("ELLA")),
        member("CHITRA")
            .approved()
            .with_sponsor(code("ASHA"))
            .with_left(code("FARAH"))
            .with_right(code("GOPI")),
        member("DEV")
            .approved()
            .with_kyc(true)
            .with_sponsor(code("BALA"))
            .with_left(code("HARI")),
        member("ELLA").approved().with_kyc(true).with_sponsor(code("BALA")),
        member("FARAH").approved().with_sponsor(code("CHITRA")),
        member("GOPI")
            .with_payment_request(PaymentRequestStatus::Pending)
            .with_sponsor(code("CHITRA")),
        member("HARI").approved().with_kyc(true).with_sponsor(code("DEV")),
    ];
    for m in members {
        d.insert(m).unwrap();
    }
    for c in ["ASHA", "BALA", "DEV"] {
        d.insert_bank_account(account_for(c));
    }
    d
}

/// Full pipeline: directory → tree → pairs → income → payout batch.
#[test]
fn full_pipeline_organisation() {
    let d = organisation();
    let rates = RatesConfig::default();

    let tree = build_tree(&d, &code("ASHA"), STANDARD_DEPTH).unwrap().unwrap();
    assert_eq!(tree.size(), 7);
    assert!(tree.preorder().iter().all(|n| n.level < STANDARD_DEPTH));
    // ASHA and BALA form pairs; CHITRA's right child is not eligible
    assert_eq!(count_pairs(Some(&tree)), 2);

    let summary = NetworkSummary::compute(&d, &code("ASHA"), &rates)
        .unwrap()
        .unwrap();
    assert_eq!(summary.left_eligible, 3);
    assert_eq!(summary.right_eligible, 2);
    // 3,2 -> 1,1: one promotional pair
    assert_eq!(summary.promotional.pairs, 1);
    assert_eq!(summary.promotional.amount, dec!(400));
    // BALA's legs are DEV+HARI / ELLA -> 2,1 -> one pair; CHITRA's are 1,0
    assert_eq!(summary.mentorship.pairs, 1);
    assert_eq!(summary.mentorship.amount, dec!(100));
    assert_eq!(summary.direct_referrals, 2);

    let book = PayoutBook::new();
    let cycle = PayoutCycle::parse("2026-10-22").unwrap();
    let batch = PayoutGenerator::new(&d, &rates)
        .generate_batch(&book, cycle)
        .unwrap();

    let asha = batch.record_for(&UserId::new("uid-ASHA")).unwrap();
    assert_eq!(asha.income_breakdown.promotional_income, dec!(400));
    assert_eq!(asha.income_breakdown.mentorship_income, dec!(100));
    assert_eq!(asha.income_breakdown.rewards_income, dec!(250));
    assert_eq!(asha.total_income, dec!(750));
    assert_eq!(asha.deduction, dec!(37.50));
    assert_eq!(asha.payout_amount, dec!(712.50));
    assert_eq!(asha.status, PayoutStatus::Pending);
    assert!(asha.is_consistent());

    // BALA: legs DEV+HARI / ELLA -> 2,1 -> one pair -> 400
    let bala = batch.record_for(&UserId::new("uid-BALA")).unwrap();
    assert_eq!(bala.total_income, dec!(400));
    assert_eq!(bala.payout_amount, dec!(380));

    assert_eq!(batch.total_payout(), dec!(1092.50));
    assert_eq!(
        batch.total_payout() + batch.total_deduction(),
        batch.total_income()
    );

    let excluded: HashMap<&str, ExclusionReason> = batch
        .exclusions
        .iter()
        .map(|e| (e.referral_code.as_str(), e.reason))
        .collect();
    assert_eq!(excluded.get("CHITRA"), Some(&ExclusionReason::KycIncomplete));
    assert_eq!(excluded.get("ELLA"), Some(&ExclusionReason::BankAccountMissing));
    assert_eq!(excluded.get("FARAH"), Some(&ExclusionReason::KycIncomplete));
    assert_eq!(excluded.get("HARI"), Some(&ExclusionReason::BankAccountMissing));
    // GOPI is not an affiliate; DEV earns nothing
    assert!(!excluded.contains_key("GOPI"));
    assert!(batch.record_for(&UserId::new("uid-DEV")).is_none());
    assert_eq!(batch.skipped_zero_income, 1);
}

#[test]
fn expanded_depth_sees_fourth_level() {
    let d = organisation();
    let tree = build_tree(&d, &code("ASHA"), EXPANDED_DEPTH).unwrap().unwrap();
    assert_eq!(tree.size(), 8);

    let rates = RatesConfig::default().with_tree_depth(EXPANDED_DEPTH);
    let summary = NetworkSummary::compute(&d, &code("ASHA"), &rates)
        .unwrap()
        .unwrap();
    assert_eq!(summary.left_eligible, 4);
    // 4,2 -> 2 pairs
    assert_eq!(summary.promotional.pairs, 2);
}

#[test]
fn lookup_by_each_field() {
    let d = organisation();
    let by_email = d
        .find_user_by_field(LookupField::Email, "farah@example.com")
        .unwrap()
        .unwrap();
    assert_eq!(by_email.referral_code, code("FARAH"));
    assert!(d
        .find_user_by_field(LookupField::UserId, "uid-NOBODY")
        .unwrap()
        .is_none());
}

/// A directory whose backing store is unreachable.
struct OfflineDirectory;

impl DownlineRepository for OfflineDirectory {
    fn find_user_by_field(
        &self,
        _field: LookupField,
        _value: &str,
    ) -> Result<Option<Member>, DirectoryError> {
        Err(DirectoryError::LookupFailed("connection refused".to_string()))
    }

    fn load_subtree(
        &self,
        _root: &ReferralCode,
        _depth: u32,
    ) -> Result<HashMap<ReferralCode, Member>, DirectoryError> {
        Err(DirectoryError::LookupFailed("connection refused".to_string()))
    }

    fn direct_referrals(&self, _code: &ReferralCode) -> Result<Vec<Member>, DirectoryError> {
        Err(DirectoryError::LookupFailed("connection refused".to_string()))
    }

    fn bank_account(&self, _user_id: &UserId) -> Result<Option<BankAccount>, DirectoryError> {
        Err(DirectoryError::LookupFailed("connection refused".to_string()))
    }

    fn members(&self) -> Result<Vec<Member>, DirectoryError> {
        Err(DirectoryError::LookupFailed("connection refused".to_string()))
    }
}

/// "Not found" and "lookup failed" stay distinct.
#[test]
fn lookup_failure_is_not_not_found() {
    let d = organisation();
    assert!(build_tree(&d, &code("NOBODY"), 3).unwrap().is_none());

    let err = build_tree(&OfflineDirectory, &code("ASHA"), 3).unwrap_err();
    assert!(matches!(
        err,
        TreeError::Directory(DirectoryError::LookupFailed(_))
    ));
}

/// A failed regeneration leaves the published batch in place.
#[test]
fn failed_regeneration_keeps_previous_batch() {
    let d = organisation();
    let rates = RatesConfig::default();
    let book = PayoutBook::new();
    let cycle = PayoutCycle::parse("2026-11-02").unwrap();

    let first = PayoutGenerator::new(&d, &rates)
        .generate_batch(&book, cycle)
        .unwrap();

    let result = PayoutGenerator::new(&OfflineDirectory, &rates).generate_batch(&book, cycle);
    assert!(matches!(result, Err(PayoutError::Directory(_))));

    let current = book.current(cycle).unwrap();
    assert_eq!(current.id, first.id);
    assert_eq!(current.record_count(), first.record_count());
}

/// Admin settlement flow across a regeneration.
#[test]
fn settle_then_regenerate_is_refused() {
    let d = organisation();
    let rates = RatesConfig::default();
    let book = PayoutBook::new();
    let cycle = PayoutCycle::parse("2026-11-12").unwrap();
    let generator = PayoutGenerator::new(&d, &rates);

    // regenerating an unsettled cycle replaces it with a newer batch
    let first = generator.generate_batch(&book, cycle).unwrap();
    let second = generator.generate_batch(&book, cycle).unwrap();
    assert!(second.id > first.id);
    assert_eq!(first.total_payout(), second.total_payout());

    let payout_id = second.records[0].id;
    book.update_status(cycle, payout_id, PayoutStatus::Completed)
        .unwrap();

    assert!(matches!(
        generator.generate_batch(&book, cycle),
        Err(PayoutError::CycleSettled { .. })
    ));

    // other cycles are unaffected
    let next = generator.generate_batch(&book, cycle.next()).unwrap();
    assert_eq!(next.cycle, cycle.next());
    assert_eq!(book.batches().len(), 2);
}

/// Payout records serialize with the field names of the payouts collection.
#[test]
fn payout_batch_serializes() {
    let d = organisation();
    let rates = RatesConfig::default();
    let book = PayoutBook::new();
    let cycle = PayoutCycle::parse("2026-10-02").unwrap();
    let batch = PayoutGenerator::new(&d, &rates)
        .generate_batch(&book, cycle)
        .unwrap();

    let json = serde_json::to_string_pretty(batch.as_ref()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    let record = &parsed["records"][0];
    assert!(record.get("payoutAmount").is_some());
    assert!(record.get("incomeBreakdown").is_some());
    assert_eq!(record["payoutCycle"], "2026-10-02");
    assert_eq!(record["status"], "pending");
    assert!(record["incomeBreakdown"]["promotional"]
        .get("capApplied")
        .is_some());
    assert_eq!(parsed["exclusions"][0]["reason"], "kyc_incomplete");
}

/// An empty directory yields an empty, valid batch.
#[test]
fn empty_directory_produces_empty_batch() {
    let d = InMemoryDirectory::new();
    let rates = RatesConfig::default();
    let book = PayoutBook::new();
    let batch = PayoutGenerator::new(&d, &rates)
        .generate_batch(&book, PayoutCycle::parse("2026-10-12").unwrap())
        .unwrap();
    assert_eq!(batch.record_count(), 0);
    assert_eq!(batch.total_payout(), Decimal::ZERO);
    assert!(batch.exclusions.is_empty());
}
