//! Batch forensics example
//!
//! Builds a small synthetic batch containing a routing cycle, a bursty
//! fan-in hub, a layered shell chain, and a payroll flow that the
//! false-positive filter should suppress, then prints the report.

use chrono::{DateTime, Duration, TimeZone, Utc};
use transaction_forensics::{batch_digest, ForensicsEngine, Transaction};

fn at(hour: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + Duration::hours(hour)
}

fn tx(id: &str, sender: &str, receiver: &str, amount: f64, hour: i64) -> Transaction {
    Transaction {
        transaction_id: id.to_string(),
        sender_id: sender.to_string(),
        receiver_id: receiver.to_string(),
        amount,
        timestamp: at(hour),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("=== Transaction Forensics ===\n");

    let mut batch = Vec::new();

    // 1. Circular fund routing: ACC_A -> ACC_B -> ACC_C -> ACC_A.
    batch.push(tx("CYC-1", "ACC_A", "ACC_B", 9500.0, 0));
    batch.push(tx("CYC-2", "ACC_B", "ACC_C", 9300.0, 2));
    batch.push(tx("CYC-3", "ACC_C", "ACC_A", 9100.0, 4));

    // 2. Smurfing: twelve ad-hoc senders into COLLECTOR within one day.
    for i in 0..12 {
        batch.push(tx(
            &format!("FAN-{i:02}"),
            &format!("SENDER_{i:02}"),
            "COLLECTOR",
            400.0 + 173.0 * i as f64,
            (i % 20) as i64,
        ));
    }

    // 3. Layered shell chain with busy endpoints.
    batch.push(tx("SHL-1", "ORIGIN", "SHELL_1", 15000.0, 1));
    batch.push(tx("SHL-2", "SHELL_1", "SHELL_2", 14800.0, 3));
    batch.push(tx("SHL-3", "SHELL_2", "SHELL_3", 14600.0, 5));
    batch.push(tx("SHL-4", "SHELL_3", "TARGET", 14400.0, 7));
    batch.push(tx("ORG-1", "ORIGIN", "VENDOR_A", 220.0, 8));
    batch.push(tx("ORG-2", "ORIGIN", "VENDOR_B", 340.0, 9));
    batch.push(tx("ORG-3", "CLIENT_A", "ORIGIN", 510.0, 10));
    batch.push(tx("TGT-1", "TARGET", "VENDOR_C", 95.0, 11));
    batch.push(tx("TGT-2", "CLIENT_B", "TARGET", 130.0, 12));
    batch.push(tx("TGT-3", "CLIENT_C", "TARGET", 125.0, 13));

    // 4. Legitimate payroll: constant amounts on a fixed schedule.
    for i in 0..120 {
        batch.push(tx(
            &format!("PAY-{i:03}"),
            "EMPLOYER",
            &format!("STAFF_{:02}", i % 12),
            2500.0,
            24 * i as i64,
        ));
    }

    println!("Analyzing {} transactions", batch.len());
    println!("Batch digest: {}\n", batch_digest(&batch));

    let engine = ForensicsEngine::new();
    let report = engine.analyze(&batch);

    println!("--- Suspicious Accounts ---");
    for account in &report.suspicious_accounts {
        println!(
            "  {:<12} score {:>5.1}  [{:?}]  patterns: {}",
            account.account_id,
            account.suspicion_score,
            account.risk_level(),
            account.patterns.join(", "),
        );
    }

    println!("\n--- Fraud Rings ---");
    for ring in &report.fraud_rings {
        println!(
            "  {:<8} {:<24} risk {:>5.1}  members: {}",
            ring.ring_id,
            ring.pattern_type,
            ring.risk_score,
            ring.member_accounts.join(" -> "),
        );
    }

    println!("\n--- Summary ---");
    println!(
        "  accounts analyzed: {}",
        report.summary.total_accounts_analyzed
    );
    println!(
        "  accounts flagged:  {}",
        report.summary.suspicious_accounts_flagged
    );
    println!(
        "  rings detected:    {}",
        report.summary.fraud_rings_detected
    );
    println!(
        "  processing time:   {}s",
        report.summary.processing_time_seconds
    );
    println!(
        "\n  graph projection: {} nodes, {} edges",
        report.graph_data.nodes.len(),
        report.graph_data.edges.len()
    );
}
