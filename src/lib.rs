//! # Transaction Forensics
//!
//! Batch forensic analysis of financial transactions for money-muling
//! behavior.
//!
//! ## Features
//!
//! - **Aggregated transaction graph**: interned account handles over a
//!   sorted id table, deterministic iteration everywhere
//! - **Circular fund routing**: simple-cycle enumeration (length 3-5) with
//!   SCC prefiltering
//! - **Smurfing**: fan-in/fan-out concentration hubs with a temporal
//!   burstiness multiplier and a legitimate-bulk-flow filter
//! - **Layered shell networks**: bounded search for chains routed through
//!   low-activity pass-through accounts
//! - **Fraud-ring assembly**: one named ring per pattern instance with a
//!   risk score, plus per-account suspicion scores capped at 100
//! - **Report projection**: JSON-ready output with a
//!   visualization-friendly view of the annotated graph
//!
//! The analysis is a pure function of the batch: the same input always
//! produces the same report, down to ring-id assignment and orderings.

pub mod cycles;
pub mod false_positives;
pub mod graph;
pub mod ingest;
pub mod report;
pub mod scoring;
pub mod shell_chains;
pub mod smurfing;

pub use false_positives::FalsePositiveThresholds;
pub use graph::{AccountNode, AggregatedEdge, TransactionGraph};
pub use ingest::{batch_digest, parse_transactions_csv, read_transactions_csv, IngestError};
pub use report::{
    AnalysisReport, AnalysisSummary, GraphData, GraphEdge, GraphNode, RiskLevel,
    SuspiciousAccount,
};
pub use scoring::{FraudRing, PatternKind};
pub use smurfing::{FanDirection, FanHub};

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One validated financial transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub sender_id: String,
    pub receiver_id: String,
    /// Non-negative transfer amount.
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
}

/// Detection thresholds and bounds.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Distinct-counterparty count at which an account becomes a fan hub.
    pub fan_threshold: usize,
    /// Window for the temporal burstiness test.
    pub temporal_window_seconds: i64,
    /// Inclusive total-transaction range that marks a shell account.
    pub shell_low_activity_range: (usize, usize),
    /// Inclusive bounds on enumerated cycle lengths.
    pub cycle_length_range: (usize, usize),
    /// Maximum hops explored per shell chain.
    pub path_hop_cutoff: usize,
    /// Accounts at or above this suspicion score are flagged.
    pub suspicious_score_threshold: f64,
    /// Regularity thresholds for suppressing legitimate bulk flows.
    pub false_positive: FalsePositiveThresholds,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fan_threshold: 10,
            temporal_window_seconds: 259_200, // 72 hours
            shell_low_activity_range: (2, 3),
            cycle_length_range: (3, 5),
            path_hop_cutoff: 6,
            suspicious_score_threshold: 50.0,
            false_positive: FalsePositiveThresholds::default(),
        }
    }
}

/// Batch analysis engine: builds the aggregated graph, runs the three
/// pattern detectors, scores accounts, and assembles the report.
pub struct ForensicsEngine {
    config: AnalysisConfig,
}

impl ForensicsEngine {
    /// Create an engine with default thresholds.
    pub fn new() -> Self {
        Self {
            config: AnalysisConfig::default(),
        }
    }

    /// Create an engine with custom thresholds.
    pub fn with_config(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze one transaction batch.
    ///
    /// Never fails for well-formed input: an empty batch produces an
    /// empty, well-formed report.
    pub fn analyze(&self, transactions: &[Transaction]) -> AnalysisReport {
        let started = Instant::now();

        tracing::debug!(
            transactions = transactions.len(),
            "building aggregated transaction graph"
        );
        let graph = TransactionGraph::build(transactions);

        let (min_cycle, max_cycle) = self.config.cycle_length_range;
        let cycles = cycles::find_cycles(&graph, min_cycle, max_cycle);
        let fan_ins = smurfing::find_fan_hubs(&graph, FanDirection::In, &self.config);
        let fan_outs = smurfing::find_fan_hubs(&graph, FanDirection::Out, &self.config);
        let chains = shell_chains::find_shell_chains(&graph, &self.config);

        tracing::info!(
            accounts = graph.node_count(),
            edges = graph.edge_count(),
            cycles = cycles.len(),
            fan_in_hubs = fan_ins.len(),
            fan_out_hubs = fan_outs.len(),
            shell_chains = chains.len(),
            "pattern detection complete"
        );

        // Ring ids depend on this fixed class order.
        let hits = scoring::collect_hits(cycles, fan_ins, fan_outs, chains);
        let assembly = scoring::assemble(&graph, &hits);
        report::build_report(
            &graph,
            assembly,
            started.elapsed(),
            self.config.suspicious_score_threshold,
        )
    }
}

impl Default for ForensicsEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

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

    fn score_of(report: &AnalysisReport, account: &str) -> Option<f64> {
        report
            .suspicious_accounts
            .iter()
            .find(|a| a.account_id == account)
            .map(|a| a.suspicion_score)
    }

    #[test]
    fn test_pure_three_cycle() {
        let batch = vec![
            tx("T1", "ACC_A", "ACC_B", 100.0, 0),
            tx("T2", "ACC_B", "ACC_C", 100.0, 0),
            tx("T3", "ACC_C", "ACC_A", 100.0, 0),
        ];
        let report = ForensicsEngine::new().analyze(&batch);

        assert_eq!(report.summary.fraud_rings_detected, 1);
        assert_eq!(report.summary.suspicious_accounts_flagged, 3);

        let ring = &report.fraud_rings[0];
        assert_eq!(ring.ring_id, "RING_1");
        assert_eq!(ring.pattern_type, "Circular Fund Routing");
        assert_eq!(ring.member_accounts, vec!["ACC_A", "ACC_B", "ACC_C"]);
        assert_eq!(ring.risk_score, 85.0);

        for account in ["ACC_A", "ACC_B", "ACC_C"] {
            assert_eq!(score_of(&report, account), Some(85.0));
        }
    }

    #[test]
    fn test_bursty_fan_in() {
        // Twelve senders with differing amounts, all inside a 10-hour window.
        let batch: Vec<Transaction> = (0..12)
            .map(|i| {
                tx(
                    &format!("T{i:02}"),
                    &format!("S{i:02}"),
                    "HUB",
                    850.0 + 431.0 * i as f64,
                    (i % 10) as i64,
                )
            })
            .collect();
        let report = ForensicsEngine::new().analyze(&batch);

        assert_eq!(report.fraud_rings.len(), 1);
        let ring = &report.fraud_rings[0];
        assert_eq!(ring.pattern_type, "Smurfing (Fan-in)");
        assert_eq!(ring.member_accounts.len(), 13);
        assert_eq!(ring.member_accounts[0], "HUB");

        // Full clustering: 65 * 1.5.
        assert_eq!(score_of(&report, "HUB"), Some(97.5));
        assert_eq!(report.summary.suspicious_accounts_flagged, 1);
        assert!(score_of(&report, "S00").is_none());
    }

    #[test]
    fn test_payroll_fan_out_suppressed() {
        // Constant-amount, evenly spaced disbursements to 25 recipients.
        let batch: Vec<Transaction> = (0..300)
            .map(|i| {
                tx(
                    &format!("T{i:03}"),
                    "PAYROLL",
                    &format!("R{:02}", i % 25),
                    2500.0,
                    6 * i as i64,
                )
            })
            .collect();
        let report = ForensicsEngine::new().analyze(&batch);

        assert_eq!(report.summary.fraud_rings_detected, 0);
        assert_eq!(report.summary.suspicious_accounts_flagged, 0);
        assert!(!report.has_suspicious_activity());
    }

    #[test]
    fn test_shell_chain_with_low_activity_middle() {
        let batch = vec![
            tx("T1", "SRC", "M1", 9000.0, 0),
            tx("T2", "M1", "M2", 8900.0, 1),
            tx("T3", "M2", "M3", 8800.0, 2),
            tx("T4", "M3", "DST", 8700.0, 3),
            // Endpoint activity outside the shell range.
            tx("T5", "SRC", "X1", 120.0, 4),
            tx("T6", "SRC", "X2", 80.0, 5),
            tx("T7", "X3", "SRC", 300.0, 6),
            tx("T8", "DST", "Y1", 45.0, 7),
            tx("T9", "Y2", "DST", 60.0, 8),
            tx("T10", "Y3", "DST", 75.0, 9),
        ];
        let report = ForensicsEngine::new().analyze(&batch);

        assert_eq!(report.fraud_rings.len(), 1);
        let ring = &report.fraud_rings[0];
        assert_eq!(ring.pattern_type, "Layered Shell Network");
        assert_eq!(ring.member_accounts, vec!["SRC", "M1", "M2", "M3", "DST"]);
        assert_eq!(ring.risk_score, 75.0);

        for shell in ["M1", "M2", "M3"] {
            assert_eq!(score_of(&report, shell), Some(75.0));
        }
        assert!(score_of(&report, "SRC").is_none());
        assert!(score_of(&report, "DST").is_none());
        assert_eq!(report.summary.suspicious_accounts_flagged, 3);
    }

    #[test]
    fn test_overlapping_cycle_and_shell() {
        // X sits in a 3-cycle and is also the interior of a shell chain.
        let batch = vec![
            tx("T1", "X", "C1", 400.0, 0),
            tx("T2", "C1", "C2", 400.0, 1),
            tx("T3", "C2", "X", 400.0, 2),
            tx("T4", "P0", "X", 400.0, 3),
            tx("T5", "C1", "P3", 400.0, 4),
        ];
        let report = ForensicsEngine::new().analyze(&batch);

        assert_eq!(report.fraud_rings.len(), 2);
        assert_eq!(report.fraud_rings[0].pattern_type, "Circular Fund Routing");
        assert_eq!(report.fraud_rings[1].pattern_type, "Layered Shell Network");
        assert_eq!(
            report.fraud_rings[1].member_accounts,
            vec!["P0", "X", "C1", "P3"]
        );

        // 85 + 75 capped at 100.
        assert_eq!(score_of(&report, "X"), Some(100.0));
        let x = report
            .suspicious_accounts
            .iter()
            .find(|a| a.account_id == "X")
            .unwrap();
        assert_eq!(
            x.patterns,
            vec!["Circular Fund Routing", "Layered Shell Network"]
        );
        assert_eq!(x.ring_ids, vec!["RING_1", "RING_2"]);
        assert_eq!(x.risk_level(), RiskLevel::Critical);
    }

    #[test]
    fn test_empty_input() {
        let report = ForensicsEngine::new().analyze(&[]);

        assert!(report.suspicious_accounts.is_empty());
        assert!(report.fraud_rings.is_empty());
        assert!(report.graph_data.nodes.is_empty());
        assert!(report.graph_data.edges.is_empty());
        assert_eq!(report.summary.total_accounts_analyzed, 0);
        assert_eq!(report.summary.suspicious_accounts_flagged, 0);
        assert_eq!(report.summary.fraud_rings_detected, 0);
    }

    fn mixed_batch() -> Vec<Transaction> {
        let mut batch = vec![
            tx("C1", "ACC_A", "ACC_B", 100.0, 0),
            tx("C2", "ACC_B", "ACC_C", 100.0, 1),
            tx("C3", "ACC_C", "ACC_A", 100.0, 2),
        ];
        for i in 0..11 {
            batch.push(tx(
                &format!("F{i:02}"),
                &format!("S{i:02}"),
                "HUB",
                500.0 + 37.0 * i as f64,
                (i % 8) as i64,
            ));
        }
        batch.push(tx("L1", "SRC", "W1", 7000.0, 0));
        batch.push(tx("L2", "W1", "W2", 6900.0, 1));
        batch.push(tx("L3", "W2", "W3", 6800.0, 2));
        batch.push(tx("L4", "W3", "DST", 6700.0, 3));
        batch.push(tx("L5", "SRC", "Z1", 50.0, 4));
        batch.push(tx("L6", "SRC", "Z2", 50.0, 5));
        batch.push(tx("L7", "Z3", "SRC", 50.0, 6));
        batch.push(tx("L8", "DST", "Z4", 50.0, 7));
        batch.push(tx("L9", "Z5", "DST", 50.0, 8));
        batch.push(tx("L10", "Z6", "DST", 50.0, 9));
        batch
    }

    #[test]
    fn test_determinism_across_runs() {
        let batch = mixed_batch();
        let engine = ForensicsEngine::new();

        let mut first = engine.analyze(&batch);
        let mut second = engine.analyze(&batch);
        // Wall time is the one non-deterministic field by design.
        first.summary.processing_time_seconds = 0.0;
        second.summary.processing_time_seconds = 0.0;

        assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    }

    #[test]
    fn test_input_order_irrelevant() {
        let batch = mixed_batch();
        let mut shuffled = batch.clone();
        shuffled.reverse();
        shuffled.swap(0, 7);

        let engine = ForensicsEngine::new();
        let mut first = engine.analyze(&batch);
        let mut second = engine.analyze(&shuffled);
        first.summary.processing_time_seconds = 0.0;
        second.summary.processing_time_seconds = 0.0;

        assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    }

    #[test]
    fn test_scores_bounded_and_counts_consistent() {
        let report = ForensicsEngine::new().analyze(&mixed_batch());

        for account in &report.suspicious_accounts {
            assert!(account.suspicion_score >= 0.0 && account.suspicion_score <= 100.0);
            assert!(!account.ring_ids.is_empty());
        }
        assert_eq!(
            report.summary.suspicious_accounts_flagged,
            report.suspicious_accounts.len()
        );
        assert_eq!(report.summary.fraud_rings_detected, report.fraud_rings.len());

        // Every ring member is a node in the projection.
        let node_ids: std::collections::HashSet<&str> = report
            .graph_data
            .nodes
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        for ring in &report.fraud_rings {
            for member in &ring.member_accounts {
                assert!(node_ids.contains(member.as_str()));
            }
        }
    }

    #[test]
    fn test_disjoint_addition_does_not_lower_scores() {
        let engine = ForensicsEngine::new();
        let before = engine.analyze(&mixed_batch());

        let mut extended = mixed_batch();
        extended.push(tx("EXTRA", "LONER_1", "LONER_2", 42.0, 100));
        let after = engine.analyze(&extended);

        for account in &before.suspicious_accounts {
            let later = score_of(&after, &account.account_id)
                .expect("previously flagged account stays flagged");
            assert!(later >= account.suspicion_score);
        }
        assert_eq!(
            after.summary.total_accounts_analyzed,
            before.summary.total_accounts_analyzed + 2
        );
    }

    #[test]
    fn test_self_loops_never_reach_detectors() {
        // A self-loop plus a 2-node back-and-forth: nothing to report.
        let batch = vec![
            tx("T1", "A", "A", 100.0, 0),
            tx("T2", "A", "B", 100.0, 1),
            tx("T3", "B", "A", 100.0, 2),
        ];
        let report = ForensicsEngine::new().analyze(&batch);

        assert!(report.fraud_rings.is_empty());
        assert_eq!(report.graph_data.edges.len(), 3);
    }
}
