//! binary-payout-engine CLI
//!
//! Inspect affiliate networks and generate payouts from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Print a member's downline tree
//! binary-payout-engine tree --input network.json --root AFF00000
//!
//! # Network summary with income figures
//! binary-payout-engine network --input network.json --root AFF00000 --format json
//!
//! # Generate the payout batch for a cycle
//! binary-payout-engine payouts --input network.json --cycle 2026-10-22
//!
//! # Generate a random network for testing
//! binary-payout-engine generate --members 100 --output network.json
//! ```
//!
//! Set `RUST_LOG=debug` for calculation traces.

use binary_payout_engine::core::cycle::PayoutCycle;
use binary_payout_engine::core::member::ReferralCode;
use binary_payout_engine::core::rates::RatesConfig;
use binary_payout_engine::income::summary::NetworkSummary;
use binary_payout_engine::network::directory::InMemoryDirectory;
use binary_payout_engine::network::pairs::count_pairs;
use binary_payout_engine::network::tree::build_tree;
use binary_payout_engine::payout::batch::PayoutBook;
use binary_payout_engine::payout::generator::PayoutGenerator;
use binary_payout_engine::simulation::stress_test::{generate_random_network, NetworkConfig};
use chrono::Utc;
use log::info;
use std::fs;
use std::process;

fn print_usage() {
    eprintln!(
        r#"binary-payout-engine: binary affiliate network income and payouts

USAGE:
    binary-payout-engine <COMMAND> [OPTIONS]

COMMANDS:
    tree        Print a member's downline tree
    network     Summarize a member's network and income
    payouts     Generate the payout batch for a cycle
    generate    Generate a random network (for testing)
    help        Show this message

OPTIONS (tree, network, payouts):
    --input <FILE>      Path to JSON network file
    --rates <FILE>      Path to JSON rates file (defaults apply otherwise)
    --format <FORMAT>   Output format: text (default) or json

OPTIONS (tree, network):
    --root <CODE>       Referral code of the member to inspect
    --depth <N>         Tree depth override (1 to 64)

OPTIONS (payouts):
    --cycle <DATE>      Cycle date YYYY-MM-DD (default: next cycle from today)

OPTIONS (generate):
    --members <N>       Number of members (default: 50)
    --output <FILE>     Write to file instead of stdout

EXAMPLES:
    binary-payout-engine tree --input network.json --root AFF00000 --depth 4
    binary-payout-engine network --input network.json --root AFF00000
    binary-payout-engine payouts --input network.json --cycle 2026-10-22 --format json
    binary-payout-engine generate --members 200 --output network.json"#
    );
}

struct CommonArgs {
    input: Option<String>,
    rates: Option<String>,
    format: String,
    root: Option<String>,
    depth: Option<u32>,
    cycle: Option<String>,
}

fn parse_common(args: &[String]) -> CommonArgs {
    let mut parsed = CommonArgs {
        input: None,
        rates: None,
        format: "text".to_string(),
        root: None,
        depth: None,
        cycle: None,
    };
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        i += 1;
        let value = args.get(i).cloned().unwrap_or_else(|| {
            eprintln!("{} requires a value", flag);
            process::exit(1);
        });
        match flag {
            "--input" => parsed.input = Some(value),
            "--rates" => parsed.rates = Some(value),
            "--format" => parsed.format = value,
            "--root" => parsed.root = Some(value),
            "--cycle" => parsed.cycle = Some(value),
            "--depth" => {
                parsed.depth = Some(value.parse().unwrap_or_else(|_| {
                    eprintln!("--depth requires a number");
                    process::exit(1);
                }));
            }
            _ => {
                eprintln!("Unknown option: {}", flag);
                process::exit(1);
            }
        }
        i += 1;
    }
    parsed
}

fn load_directory(args: &CommonArgs) -> InMemoryDirectory {
    let path = args.input.as_deref().unwrap_or_else(|| {
        eprintln!("Error: --input <FILE> is required");
        process::exit(1);
    });
    let content = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{}': {}", path, e);
        process::exit(1);
    });
    let directory = InMemoryDirectory::from_json_str(&content).unwrap_or_else(|e| {
        eprintln!("Error loading network: {}", e);
        eprintln!("Expected format:");
        eprintln!(
            r#"{{
  "members": [
    {{ "userId": "u1", "referralCode": "AFF1", "leftDownLine": "AFF2",
       "affiliateStatus": true, "paymentRequestStatus": "approved", "kycCompleted": true }}
  ],
  "bankAccounts": [
    {{ "userId": "u1", "accountHolder": "Asha", "accountNumber": "123456789012", "ifsc": "SBIN0000001" }}
  ]
}}"#
        );
        process::exit(1);
    });
    info!("loaded {} members from {}", directory.member_count(), path);
    directory
}

fn load_rates(args: &CommonArgs) -> RatesConfig {
    let rates = match &args.rates {
        Some(path) => RatesConfig::from_file(path).unwrap_or_else(|e| {
            eprintln!("Error loading rates: {}", e);
            process::exit(1);
        }),
        None => RatesConfig::default(),
    };
    match args.depth {
        Some(depth) => {
            let rates = rates.with_tree_depth(depth);
            if let Err(e) = rates.validate() {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
            rates
        }
        None => rates,
    }
}

fn required_root(args: &CommonArgs) -> ReferralCode {
    let root = args.root.as_deref().unwrap_or_else(|| {
        eprintln!("Error: --root <CODE> is required");
        process::exit(1);
    });
    ReferralCode::new(root)
}

fn print_json<T: serde::Serialize>(value: &T) {
    let json = serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        eprintln!("Error serializing output: {}", e);
        process::exit(1);
    });
    println!("{}", json);
}

fn cmd_tree(args: &[String]) {
    let args = parse_common(args);
    let directory = load_directory(&args);
    let rates = load_rates(&args);
    let root = required_root(&args);

    let tree = build_tree(&directory, &root, rates.tree_depth).unwrap_or_else(|e| {
        eprintln!("Error building tree: {}", e);
        process::exit(1);
    });
    let Some(tree) = tree else {
        eprintln!("No member with referral code {}", root);
        process::exit(1);
    };

    if args.format == "json" {
        print_json(&tree);
    } else {
        print!("{}", tree);
        println!(
            "\n{} members, {} eligible (*), {} pairs",
            tree.size(),
            tree.eligible_count(),
            count_pairs(Some(&tree))
        );
    }
}

fn cmd_network(args: &[String]) {
    let args = parse_common(args);
    let directory = load_directory(&args);
    let rates = load_rates(&args);
    let root = required_root(&args);

    let summary = NetworkSummary::compute(&directory, &root, &rates).unwrap_or_else(|e| {
        eprintln!("Error loading network: {}", e);
        process::exit(1);
    });
    let Some(summary) = summary else {
        eprintln!("No member with referral code {}", root);
        process::exit(1);
    };

    if args.format == "json" {
        print_json(&summary);
    } else {
        print!("{}", summary);
    }
}

fn cmd_payouts(args: &[String]) {
    let args = parse_common(args);
    let directory = load_directory(&args);
    let rates = load_rates(&args);

    let cycle = match &args.cycle {
        Some(date) => PayoutCycle::parse(date).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            process::exit(1);
        }),
        None => PayoutCycle::on_or_after(Utc::now().date_naive()),
    };

    let book = PayoutBook::new();
    let batch = PayoutGenerator::new(&directory, &rates)
        .generate_batch(&book, cycle)
        .unwrap_or_else(|e| {
            eprintln!("Error generating payouts: {}", e);
            process::exit(1);
        });

    if args.format == "json" {
        print_json(batch.as_ref());
    } else {
        print!("{}", batch);
    }
}

fn cmd_generate(args: &[String]) {
    let mut member_count = 50usize;
    let mut output_path: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--members" => {
                i += 1;
                member_count = args
                    .get(i)
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(|| {
                        eprintln!("--members requires a number");
                        process::exit(1);
                    });
            }
            "--output" => {
                i += 1;
                output_path = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--output requires a file path");
                    process::exit(1);
                }));
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let config = NetworkConfig {
        member_count,
        ..Default::default()
    };
    let directory = generate_random_network(&config).unwrap_or_else(|e| {
        eprintln!("Error generating network: {}", e);
        process::exit(1);
    });
    let json = serde_json::to_string_pretty(&directory.snapshot()).unwrap_or_else(|e| {
        eprintln!("Error serializing network: {}", e);
        process::exit(1);
    });

    if let Some(path) = output_path {
        fs::write(&path, &json).unwrap_or_else(|e| {
            eprintln!("Error writing to '{}': {}", path, e);
            process::exit(1);
        });
        eprintln!("Generated {} members → {}", directory.member_count(), path);
    } else {
        println!("{}", json);
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "tree" => cmd_tree(rest),
        "network" => cmd_network(rest),
        "payouts" => cmd_payouts(rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
