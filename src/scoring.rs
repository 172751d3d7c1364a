//! Suspicion scoring and fraud-ring assembly.
//!
//! Detector output is merged in a fixed class order (cycles, fan-ins,
//! fan-outs, shells) before ring ids are assigned, so an analysis is
//! deterministic even if detectors ran concurrently.

use serde::Serialize;

use crate::graph::{saturating_amount_add, TransactionGraph};
use crate::smurfing::{FanDirection, FanHub};

/// Base score for every member of a routing cycle.
pub const CIRCULAR_ROUTING_BASE_SCORE: f64 = 85.0;
/// Base score for a smurfing hub.
pub const SMURFING_BASE_SCORE: f64 = 65.0;
/// Base score for every interior node of a shell chain.
pub const SHELL_NETWORK_BASE_SCORE: f64 = 75.0;
/// Suspicion scores are clamped here after all hits are accumulated.
pub const MAX_SUSPICION_SCORE: f64 = 100.0;

/// The pattern classes a hit can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternKind {
    CircularRouting,
    FanIn,
    FanOut,
    ShellNetwork,
}

impl PatternKind {
    /// Human-readable label used in reports.
    pub fn label(self) -> &'static str {
        match self {
            PatternKind::CircularRouting => "Circular Fund Routing",
            PatternKind::FanIn => "Smurfing (Fan-in)",
            PatternKind::FanOut => "Smurfing (Fan-out)",
            PatternKind::ShellNetwork => "Layered Shell Network",
        }
    }
}

/// One detector hit, normalized for the assembler.
#[derive(Debug, Clone)]
pub struct PatternHit {
    pub kind: PatternKind,
    /// Every account named by the hit, in the pattern's member order.
    pub members: Vec<usize>,
    /// The subset of members that accrue score from this hit.
    pub scoring_members: Vec<usize>,
    pub temporal_factor: f64,
    pub base_score: f64,
}

/// Merge detector output into the fixed class order.
pub fn collect_hits(
    cycles: Vec<Vec<usize>>,
    fan_ins: Vec<FanHub>,
    fan_outs: Vec<FanHub>,
    shell_chains: Vec<Vec<usize>>,
) -> Vec<PatternHit> {
    let mut hits = Vec::new();

    for cycle in cycles {
        hits.push(PatternHit {
            kind: PatternKind::CircularRouting,
            scoring_members: cycle.clone(),
            members: cycle,
            temporal_factor: 1.0,
            base_score: CIRCULAR_ROUTING_BASE_SCORE,
        });
    }

    for hub in fan_ins.into_iter().chain(fan_outs) {
        let kind = match hub.direction {
            FanDirection::In => PatternKind::FanIn,
            FanDirection::Out => PatternKind::FanOut,
        };
        let mut members = Vec::with_capacity(1 + hub.counterparties.len());
        members.push(hub.hub);
        members.extend(hub.counterparties);
        hits.push(PatternHit {
            kind,
            members,
            // Counterparties are named but only the hub is scored; they may
            // still be flagged through other hits.
            scoring_members: vec![hub.hub],
            temporal_factor: hub.temporal_factor,
            base_score: SMURFING_BASE_SCORE,
        });
    }

    for chain in shell_chains {
        let interior = chain[1..chain.len() - 1].to_vec();
        hits.push(PatternHit {
            kind: PatternKind::ShellNetwork,
            members: chain,
            scoring_members: interior,
            temporal_factor: 1.0,
            base_score: SHELL_NETWORK_BASE_SCORE,
        });
    }

    hits
}

/// A named group of accounts emitted for one detector hit.
#[derive(Debug, Clone, Serialize)]
pub struct FraudRing {
    pub ring_id: String,
    pub pattern_type: String,
    pub member_accounts: Vec<String>,
    pub risk_score: f64,
}

/// Accumulated suspicion state for one account.
#[derive(Debug, Clone, Default)]
pub struct AccountScore {
    /// Final suspicion score, already clamped to [0, 100].
    pub score: f64,
    /// Pattern kinds that contributed, in first-contribution order.
    pub patterns: Vec<PatternKind>,
    /// Rings in which this account was a scoring member, in assignment order.
    pub ring_ids: Vec<String>,
}

/// Rings plus per-account scores, indexed by node handle.
pub struct RingAssembly {
    pub rings: Vec<FraudRing>,
    pub scores: Vec<AccountScore>,
}

/// Assign ring ids in hit order, accumulate member scores, then cap each
/// account once and derive ring risk from the capped scores.
pub fn assemble(graph: &TransactionGraph, hits: &[PatternHit]) -> RingAssembly {
    let mut scores = vec![AccountScore::default(); graph.node_count()];
    let mut rings = Vec::with_capacity(hits.len());
    let mut ring_scoring_members: Vec<Vec<usize>> = Vec::with_capacity(hits.len());

    for (n, hit) in hits.iter().enumerate() {
        let ring_id = format!("RING_{}", n + 1);
        let contribution = hit.base_score * hit.temporal_factor;

        for &member in &hit.scoring_members {
            let account = &mut scores[member];
            account.score = saturating_amount_add(account.score, contribution);
            if !account.patterns.contains(&hit.kind) {
                account.patterns.push(hit.kind);
            }
            account.ring_ids.push(ring_id.clone());
        }

        rings.push(FraudRing {
            ring_id,
            pattern_type: hit.kind.label().to_string(),
            member_accounts: hit
                .members
                .iter()
                .map(|&m| graph.account_id(m).to_string())
                .collect(),
            risk_score: 0.0,
        });
        ring_scoring_members.push(hit.scoring_members.clone());
    }

    for account in &mut scores {
        account.score = account.score.min(MAX_SUSPICION_SCORE);
    }

    for (ring, scoring) in rings.iter_mut().zip(&ring_scoring_members) {
        ring.risk_score = if scoring.is_empty() {
            0.0
        } else {
            let mean =
                scoring.iter().map(|&m| scores[m].score).sum::<f64>() / scoring.len() as f64;
            round_to_decimals(mean, 1)
        };
    }

    RingAssembly { rings, scores }
}

pub(crate) fn round_to_decimals(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
