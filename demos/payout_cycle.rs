//! Payout cycle walkthrough.
//!
//! Generates a random network, produces the payout batch for the next
//! cycle, settles a payout and shows that a settled cycle can no longer
//! be regenerated.

use binary_payout_engine::core::cycle::PayoutCycle;
use binary_payout_engine::core::payout::PayoutStatus;
use binary_payout_engine::core::rates::RatesConfig;
use binary_payout_engine::payout::batch::PayoutBook;
use binary_payout_engine::payout::generator::PayoutGenerator;
use binary_payout_engine::simulation::stress_test::{generate_random_network, NetworkConfig};

fn main() {
    println!("╔═════════════════════════════════════════════╗");
    println!("║  binary-payout-engine: Payout Cycle Demo    ║");
    println!("╚═════════════════════════════════════════════╝\n");

    let config = NetworkConfig {
        member_count: 60,
        ..Default::default()
    };
    let directory = match generate_random_network(&config) {
        Ok(directory) => directory,
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };
    let rates = RatesConfig::default();
    let generator = PayoutGenerator::new(&directory, &rates);
    let book = PayoutBook::new();
    let cycle = PayoutCycle::on_or_after(chrono::Utc::now().date_naive());

    // --- Step 1: Generate ---
    println!("━━━ Step 1: Generate batch for {} ━━━\n", cycle);
    let batch = match generator.generate_batch(&book, cycle) {
        Ok(batch) => batch,
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };
    println!("{}", batch);

    // --- Step 2: Regenerate before settlement ---
    println!("━━━ Step 2: Regenerate (unsettled) ━━━\n");
    match generator.generate_batch(&book, cycle) {
        Ok(newer) => println!("Batch {} replaced batch {}\n", newer.id, batch.id),
        Err(e) => println!("Refused: {}\n", e),
    }

    // --- Step 3: Settle one payout ---
    println!("━━━ Step 3: Settle a payout ━━━\n");
    let Some(current) = book.current(cycle) else {
        println!("No batch published for {}", cycle);
        return;
    };
    let Some(first) = current.records.first() else {
        println!("Nobody qualified for a payout this cycle");
        return;
    };
    for status in [PayoutStatus::Completed, PayoutStatus::Rejected] {
        match book.update_status(cycle, first.id, status) {
            Ok(record) => println!("  {} -> {}", record.user_id, record.status),
            Err(e) => println!("  Refused: {}", e),
        }
    }
    println!();

    // --- Step 4: Regenerate after settlement ---
    println!("━━━ Step 4: Regenerate (settled) ━━━\n");
    match generator.generate_batch(&book, cycle) {
        Ok(newer) => println!("Unexpected: batch {} published", newer.id),
        Err(e) => println!("Refused: {}", e),
    }
    println!("Next cycle: {}", cycle.next());
}
