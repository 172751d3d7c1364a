//! Smurfing detection: fan-in and fan-out concentration hubs.
//!
//! A hub concentrates transfers from (or to) at least `fan_threshold`
//! distinct counterparties. Timestamp clustering on the relevant side
//! scales the hub's score through a temporal burstiness factor.

use chrono::{DateTime, Duration, Utc};

use crate::false_positives::is_regular_bulk_flow;
use crate::graph::TransactionGraph;
use crate::AnalysisConfig;

/// Which side of a hub the concentration sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanDirection {
    /// Many distinct senders into one receiver.
    In,
    /// One sender out to many distinct receivers.
    Out,
}

/// A detected fan-in or fan-out hub.
#[derive(Debug, Clone)]
pub struct FanHub {
    /// Node handle of the concentrating account.
    pub hub: usize,
    pub direction: FanDirection,
    /// Counterparties on the relevant side, ascending by id; self-loops
    /// never count.
    pub counterparties: Vec<usize>,
    /// Burstiness multiplier in [1.0, 1.5].
    pub temporal_factor: f64,
}

/// Scan every account for hub concentration in one direction.
///
/// Hubs whose relevant-side flow passes the legitimate-bulk-flow test are
/// dropped here, before any hit exists for them. Emission order is
/// ascending hub id.
pub fn find_fan_hubs(
    graph: &TransactionGraph,
    direction: FanDirection,
    config: &AnalysisConfig,
) -> Vec<FanHub> {
    let window = Duration::seconds(config.temporal_window_seconds);
    let mut hubs = Vec::new();

    for v in 0..graph.node_count() {
        let counterparties: Vec<usize> = match direction {
            FanDirection::In => graph.predecessors(v).filter(|&u| u != v).collect(),
            FanDirection::Out => graph
                .out_edges(v)
                .map(|(w, _)| w)
                .filter(|&w| w != v)
                .collect(),
        };
        if counterparties.len() < config.fan_threshold {
            continue;
        }

        // Flatten per-transaction data from every relevant-side edge.
        let mut timestamps: Vec<DateTime<Utc>> = Vec::new();
        let mut amounts: Vec<f64> = Vec::new();
        for &c in &counterparties {
            let edge = match direction {
                FanDirection::In => graph.edge(c, v),
                FanDirection::Out => graph.edge(v, c),
            };
            if let Some(edge) = edge {
                timestamps.extend_from_slice(&edge.timestamps);
                amounts.extend_from_slice(&edge.amounts);
            }
        }

        if is_regular_bulk_flow(&amounts, &timestamps, &config.false_positive) {
            tracing::debug!(
                hub = graph.account_id(v),
                transactions = amounts.len(),
                "suppressing regular bulk flow hub"
            );
            continue;
        }

        let temporal_factor = burstiness_factor(&mut timestamps, window);
        hubs.push(FanHub {
            hub: v,
            direction,
            counterparties,
            temporal_factor,
        });
    }
    hubs
}

/// Fraction of transactions inside the densest `window`, mapped onto a
/// multiplier in [1.0, 1.5]. All-identical timestamps cluster completely
/// and yield the maximum factor.
pub(crate) fn burstiness_factor(timestamps: &mut [DateTime<Utc>], window: Duration) -> f64 {
    if timestamps.is_empty() {
        return 1.0;
    }
    timestamps.sort_unstable();

    let mut densest = 1usize;
    let mut lo = 0usize;
    for hi in 0..timestamps.len() {
        while timestamps[hi] - timestamps[lo] > window {
            lo += 1;
        }
        densest = densest.max(hi - lo + 1);
    }

    let density = densest as f64 / timestamps.len() as f64;
    (1.0 + 0.5 * density).clamp(1.0, 1.5)
}
