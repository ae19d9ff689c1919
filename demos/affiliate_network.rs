//! Binary network walkthrough.
//!
//! Builds a small affiliate network, prints the downline tree and shows
//! how the leg balancer and the daily cap turn eligible members into
//! promotional income.

use binary_payout_engine::core::member::{Member, ReferralCode, UserId};
use binary_payout_engine::core::rates::{RatesConfig, EXPANDED_DEPTH};
use binary_payout_engine::income::promotional::{balance_legs, calculate_promotional_income};
use binary_payout_engine::income::summary::NetworkSummary;
use binary_payout_engine::network::directory::InMemoryDirectory;
use binary_payout_engine::network::pairs::{count_pairs, pair_positions};
use binary_payout_engine::network::tree::build_tree;
use rust_decimal_macros::dec;

fn member(code: &str) -> Member {
    Member::new(UserId::new(format!("user-{}", code.to_lowercase())), ReferralCode::new(code))
}

fn main() {
    println!("╔════════════════════════════════════════════════╗");
    println!("║  binary-payout-engine: Affiliate Network Demo  ║");
    println!("╚════════════════════════════════════════════════╝\n");

    let code = |s: &str| ReferralCode::new(s);
    let mut directory = InMemoryDirectory::new();
    let members = vec![
        member("MEERA").approved().with_left(code("NIKHIL")).with_right(code("OM")),
        member("NIKHIL")
            .approved()
            .with_sponsor(code("MEERA"))
            .with_left(code("PRIYA"))
            .with_right(code("RAVI")),
        member("OM")
            .approved()
            .with_sponsor(code("MEERA"))
            .with_left(code("SITA")),
        member("PRIYA").approved().with_sponsor(code("NIKHIL")).with_left(code("TARUN")),
        member("RAVI").approved().with_sponsor(code("NIKHIL")),
        member("SITA").with_sponsor(code("OM")),
        member("TARUN").approved().with_sponsor(code("PRIYA")),
    ];
    for m in members {
        if let Err(e) = directory.insert(m) {
            eprintln!("Error: {}", e);
            return;
        }
    }

    // --- Scenario 1: Downline tree ---
    println!("━━━ Scenario 1: Downline Tree (depth 3) ━━━\n");

    let rates = RatesConfig::default();
    let tree = match build_tree(&directory, &code("MEERA"), rates.tree_depth) {
        Ok(Some(tree)) => tree,
        Ok(None) => {
            eprintln!("MEERA not found");
            return;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };
    print!("{}", tree);
    let legs = tree.leg_counts();
    println!(
        "\nLeft leg: {} eligible, right leg: {} eligible",
        legs.left_eligible, legs.right_eligible
    );
    println!("Pairs in tree: {}", count_pairs(Some(&tree)));
    for position in pair_positions(Some(&tree)) {
        println!("  pair under {}", position);
    }
    println!();

    // --- Scenario 2: Leg balancing ---
    println!("━━━ Scenario 2: 2:1 Leg Balancing ━━━\n");
    for (l, r) in [(3, 1), (5, 5), (10, 2), (1, 1)] {
        let balance = balance_legs(l, r);
        println!(
            "  {:>2} left / {:>2} right -> {} pairs, {} / {} carried",
            l, r, balance.pairs, balance.left_remaining, balance.right_remaining
        );
    }
    println!();

    // --- Scenario 3: Daily cap ---
    println!("━━━ Scenario 3: Daily Cap ━━━\n");
    let capped = calculate_promotional_income(30, 30, dec!(400), Some(5));
    println!("{}", capped);
    println!();

    // --- Scenario 4: Full summary at both depths ---
    println!("━━━ Scenario 4: Network Summary ━━━\n");
    for rates in [rates.clone(), rates.with_tree_depth(EXPANDED_DEPTH)] {
        match NetworkSummary::compute(&directory, &code("MEERA"), &rates) {
            Ok(Some(summary)) => println!("{}", summary),
            Ok(None) => eprintln!("MEERA not found"),
            Err(e) => eprintln!("Error: {}", e),
        }
    }
}
