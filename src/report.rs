//! Report assembly and the visualization-friendly graph projection.
//!
//! Field names on every serialized type are contractual: downstream
//! consumers parse the JSON projection directly.

use std::time::Duration;

use serde::Serialize;

use crate::graph::TransactionGraph;
use crate::scoring::{round_to_decimals, FraudRing, RingAssembly};

/// Qualitative banding over a suspicion score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// A flagged account with its score and the evidence behind it.
#[derive(Debug, Clone, Serialize)]
pub struct SuspiciousAccount {
    pub account_id: String,
    pub suspicion_score: f64,
    /// Contributing pattern labels, deduplicated, first-contribution order.
    pub patterns: Vec<String>,
    /// Rings in which this account is a scoring member, assignment order.
    pub ring_ids: Vec<String>,
}

impl SuspiciousAccount {
    /// Risk banding for triage displays.
    pub fn risk_level(&self) -> RiskLevel {
        match self.suspicion_score {
            s if s <= 25.0 => RiskLevel::Low,
            s if s <= 50.0 => RiskLevel::Medium,
            s if s <= 75.0 => RiskLevel::High,
            _ => RiskLevel::Critical,
        }
    }
}

/// Batch-level statistics.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
    pub total_accounts_analyzed: usize,
    pub suspicious_accounts_flagged: usize,
    pub fraud_rings_detected: usize,
    /// Wall time of the full analysis, rounded to 2 decimals.
    pub processing_time_seconds: f64,
}

/// One node of the graph projection.
#[derive(Debug, Clone, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub in_degree: usize,
    pub out_degree: usize,
    pub total_transactions: usize,
    pub suspicious: bool,
    pub patterns: Vec<String>,
    pub ring_ids: Vec<String>,
}

/// One aggregated edge of the graph projection.
#[derive(Debug, Clone, Serialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub total_amount: f64,
    pub count: usize,
}

/// Projection of the aggregated graph annotated with suspicion flags.
#[derive(Debug, Clone, Serialize)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// The full forensic report for one transaction batch.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub suspicious_accounts: Vec<SuspiciousAccount>,
    pub fraud_rings: Vec<FraudRing>,
    pub summary: AnalysisSummary,
    pub graph_data: GraphData,
}

impl AnalysisReport {
    /// Whether the analysis surfaced anything at all.
    pub fn has_suspicious_activity(&self) -> bool {
        !self.suspicious_accounts.is_empty() || !self.fraud_rings.is_empty()
    }

    /// Export as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Assemble the report sections from the scored graph.
pub fn build_report(
    graph: &TransactionGraph,
    assembly: RingAssembly,
    elapsed: Duration,
    suspicious_score_threshold: f64,
) -> AnalysisReport {
    let RingAssembly { rings, scores } = assembly;

    let mut suspicious_accounts = Vec::new();
    for v in 0..graph.node_count() {
        let account = &scores[v];
        if account.score >= suspicious_score_threshold {
            suspicious_accounts.push(SuspiciousAccount {
                account_id: graph.account_id(v).to_string(),
                suspicion_score: account.score,
                patterns: account.patterns.iter().map(|k| k.label().to_string()).collect(),
                ring_ids: account.ring_ids.clone(),
            });
        }
    }
    suspicious_accounts.sort_by(|a, b| {
        b.suspicion_score
            .total_cmp(&a.suspicion_score)
            .then_with(|| a.account_id.cmp(&b.account_id))
    });

    let nodes = (0..graph.node_count())
        .map(|v| {
            let node = graph.node(v);
            let account = &scores[v];
            GraphNode {
                id: graph.account_id(v).to_string(),
                in_degree: node.in_degree,
                out_degree: node.out_degree,
                total_transactions: node.total_transactions,
                suspicious: account.score >= suspicious_score_threshold,
                patterns: account.patterns.iter().map(|k| k.label().to_string()).collect(),
                ring_ids: account.ring_ids.clone(),
            }
        })
        .collect();

    let mut edges = Vec::with_capacity(graph.edge_count());
    for v in 0..graph.node_count() {
        for (w, edge) in graph.out_edges(v) {
            edges.push(GraphEdge {
                source: graph.account_id(v).to_string(),
                target: graph.account_id(w).to_string(),
                total_amount: edge.total_amount,
                count: edge.count,
            });
        }
    }

    let summary = AnalysisSummary {
        total_accounts_analyzed: graph.node_count(),
        suspicious_accounts_flagged: suspicious_accounts.len(),
        fraud_rings_detected: rings.len(),
        processing_time_seconds: round_to_decimals(elapsed.as_secs_f64(), 2),
    };

    AnalysisReport {
        suspicious_accounts,
        fraud_rings: rings,
        summary,
        graph_data: GraphData { nodes, edges },
    }
}
