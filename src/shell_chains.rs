//! Layered shell chain detection.
//!
//! A shell chain is a simple directed path of 3 to `path_hop_cutoff` hops
//! whose interior accounts are all low-activity: pass-through shells with
//! barely more history than the transfer itself. The walk starts only at
//! terminal sources and ends only at terminal sinks, so one layered route
//! is reported once, not once per suffix.

use crate::graph::TransactionGraph;
use crate::AnalysisConfig;

/// Minimum number of hops before a path counts as layered.
const MIN_SHELL_HOPS: usize = 3;

/// Enumerate shell chains as node-handle paths in traversal order.
///
/// Emission order: ascending source id; chains from one source ordered by
/// target id, depth-first discovery order within a (source, target) pair.
pub fn find_shell_chains(graph: &TransactionGraph, config: &AnalysisConfig) -> Vec<Vec<usize>> {
    let mut chains = Vec::new();
    let n = graph.node_count();

    for source in 0..n {
        if !is_terminal_source(graph, source, config) {
            continue;
        }
        if !has_external_successor(graph, source) {
            continue;
        }

        let mut found: Vec<Vec<usize>> = Vec::new();
        let mut in_path = vec![false; n];
        let mut path = vec![source];
        in_path[source] = true;
        extend_chain(graph, config, source, &mut path, &mut in_path, &mut found);

        // sort_by_key is stable: depth-first order survives within a target.
        found.sort_by_key(|chain| chain[chain.len() - 1]);
        chains.extend(found);
    }
    chains
}

fn extend_chain(
    graph: &TransactionGraph,
    config: &AnalysisConfig,
    current: usize,
    path: &mut Vec<usize>,
    in_path: &mut [bool],
    found: &mut Vec<Vec<usize>>,
) {
    let hops = path.len() - 1;
    if hops >= MIN_SHELL_HOPS
        && (is_terminal_sink(graph, current, config) || hops == config.path_hop_cutoff)
    {
        found.push(path.clone());
    }
    if hops == config.path_hop_cutoff {
        return;
    }
    // Continuing past a mid-path node makes it interior, which only
    // low-activity accounts may be.
    if hops > 0 && !is_low_activity(graph, current, config) {
        return;
    }

    for (next, _) in graph.out_edges(current) {
        if next == current || in_path[next] {
            continue;
        }
        path.push(next);
        in_path[next] = true;
        extend_chain(graph, config, next, path, in_path, found);
        path.pop();
        in_path[next] = false;
    }
}

/// Low-activity: total incident transaction count inside the shell range.
pub(crate) fn is_low_activity(graph: &TransactionGraph, v: usize, config: &AnalysisConfig) -> bool {
    let (lo, hi) = config.shell_low_activity_range;
    let total = graph.node(v).total_transactions;
    total >= lo && total <= hi
}

/// A chain may start here: the node could not itself be the interior of a
/// longer chain reaching back through it.
fn is_terminal_source(graph: &TransactionGraph, v: usize, config: &AnalysisConfig) -> bool {
    !is_low_activity(graph, v, config) || graph.predecessors(v).all(|u| u == v)
}

/// A chain may end here: the node could not legitimately carry the chain
/// further.
fn is_terminal_sink(graph: &TransactionGraph, v: usize, config: &AnalysisConfig) -> bool {
    !is_low_activity(graph, v, config) || !has_external_successor(graph, v)
}

fn has_external_successor(graph: &TransactionGraph, v: usize) -> bool {
    graph.out_edges(v).any(|(w, _)| w != v)
}
