//! Aggregated transaction graph.
//!
//! Folds a transaction batch into a directed multigraph aggregated by
//! (sender, receiver). Account ids are interned to dense indices over a
//! sorted id table, so every detector pass iterates nodes and edges in a
//! stable order without re-sorting.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};

use crate::Transaction;

/// Add two aggregated amounts, saturating at `f64::MAX` instead of
/// overflowing to infinity.
pub(crate) fn saturating_amount_add(a: f64, b: f64) -> f64 {
    let sum = a + b;
    if sum.is_finite() {
        sum
    } else {
        f64::MAX
    }
}

/// All transfers between one ordered (sender, receiver) pair.
#[derive(Debug, Clone)]
pub struct AggregatedEdge {
    /// Sum of all transfer amounts on this edge.
    pub total_amount: f64,
    /// Number of individual transactions aggregated into this edge.
    pub count: usize,
    /// Per-transaction timestamps, sorted ascending.
    pub timestamps: Vec<DateTime<Utc>>,
    /// Per-transaction amounts, index-aligned with `timestamps`.
    pub amounts: Vec<f64>,
}

impl AggregatedEdge {
    fn new() -> Self {
        Self {
            total_amount: 0.0,
            count: 0,
            timestamps: Vec::new(),
            amounts: Vec::new(),
        }
    }

    /// Re-sort the per-transaction data by (timestamp, amount) and rebuild
    /// the total from the sorted order. Folding is then independent of the
    /// order transactions arrived in, down to the last float bit.
    fn canonicalize(&mut self) {
        let mut pairs: Vec<(DateTime<Utc>, f64)> = self
            .timestamps
            .iter()
            .copied()
            .zip(self.amounts.iter().copied())
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));

        self.timestamps.clear();
        self.amounts.clear();
        let mut total = 0.0;
        for (timestamp, amount) in pairs {
            total = saturating_amount_add(total, amount);
            self.timestamps.push(timestamp);
            self.amounts.push(amount);
        }
        self.total_amount = total;
    }
}

/// Account attributes computed once the full batch has been folded in.
#[derive(Debug, Clone)]
pub struct AccountNode {
    /// Distinct counterparties sending into this account (self excluded).
    pub in_degree: usize,
    /// Distinct counterparties this account sends to (self excluded).
    pub out_degree: usize,
    /// Raw transaction count summed over all incident edges. A self-loop
    /// transaction is incident on both sides and counts twice.
    pub total_transactions: usize,
}

/// Directed multigraph aggregated by (sender, receiver).
///
/// Node handles are indices into a lexicographically sorted id table, so
/// ascending handle order is ascending account-id order. Adjacency uses
/// `BTreeMap`/`BTreeSet` to keep neighbor iteration sorted.
pub struct TransactionGraph {
    ids: Vec<String>,
    index: HashMap<String, usize>,
    out: Vec<BTreeMap<usize, AggregatedEdge>>,
    preds: Vec<BTreeSet<usize>>,
    nodes: Vec<AccountNode>,
}

impl TransactionGraph {
    /// Fold a transaction batch into the aggregated graph.
    ///
    /// Self-loops (sender == receiver) are stored like any other edge;
    /// detectors are responsible for skipping them.
    pub fn build(transactions: &[Transaction]) -> Self {
        let mut names: BTreeSet<&str> = BTreeSet::new();
        for tx in transactions {
            names.insert(&tx.sender_id);
            names.insert(&tx.receiver_id);
        }
        let ids: Vec<String> = names.into_iter().map(String::from).collect();
        let index: HashMap<String, usize> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();

        let n = ids.len();
        let mut out: Vec<BTreeMap<usize, AggregatedEdge>> = vec![BTreeMap::new(); n];
        let mut preds: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];

        for tx in transactions {
            let sender = index[&tx.sender_id];
            let receiver = index[&tx.receiver_id];
            let edge = out[sender].entry(receiver).or_insert_with(AggregatedEdge::new);
            edge.count += 1;
            edge.timestamps.push(tx.timestamp);
            edge.amounts.push(tx.amount);
            preds[receiver].insert(sender);
        }

        for adjacency in &mut out {
            for edge in adjacency.values_mut() {
                edge.canonicalize();
            }
        }

        let mut nodes = Vec::with_capacity(n);
        for v in 0..n {
            let out_degree = out[v].keys().filter(|&&w| w != v).count();
            let in_degree = preds[v].iter().filter(|&&u| u != v).count();
            let outgoing: usize = out[v].values().map(|e| e.count).sum();
            let incoming: usize = preds[v]
                .iter()
                .map(|&u| out[u].get(&v).map_or(0, |e| e.count))
                .sum();
            nodes.push(AccountNode {
                in_degree,
                out_degree,
                total_transactions: outgoing + incoming,
            });
        }

        Self {
            ids,
            index,
            out,
            preds,
            nodes,
        }
    }

    /// Number of distinct accounts in the batch.
    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    /// Number of aggregated (sender, receiver) edges.
    pub fn edge_count(&self) -> usize {
        self.out.iter().map(|adjacency| adjacency.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Account id for a node handle.
    pub fn account_id(&self, v: usize) -> &str {
        &self.ids[v]
    }

    /// All account ids in sorted order; handle `v` maps to `account_ids()[v]`.
    pub fn account_ids(&self) -> &[String] {
        &self.ids
    }

    /// Node handle for an account id, if the account appears in the batch.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn node(&self, v: usize) -> &AccountNode {
        &self.nodes[v]
    }

    /// Outgoing edges of `v` in ascending receiver order.
    pub fn out_edges(&self, v: usize) -> impl Iterator<Item = (usize, &AggregatedEdge)> {
        self.out[v].iter().map(|(&w, edge)| (w, edge))
    }

    /// Distinct senders into `v` in ascending order (self included if a
    /// self-loop exists).
    pub fn predecessors(&self, v: usize) -> impl Iterator<Item = usize> + '_ {
        self.preds[v].iter().copied()
    }

    /// The aggregated edge from `u` to `v`, if any transfer occurred.
    pub fn edge(&self, u: usize, v: usize) -> Option<&AggregatedEdge> {
        self.out[u].get(&v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn tx(id: &str, sender: &str, receiver: &str, amount: f64, hour: i64) -> Transaction {
        Transaction {
            transaction_id: id.to_string(),
            sender_id: sender.to_string(),
            receiver_id: receiver.to_string(),
            amount,
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
                + chrono::Duration::hours(hour),
        }
    }

    #[test]
    fn test_edge_aggregation() {
        let graph = TransactionGraph::build(&[
            tx("T1", "A", "B", 1000.0, 0),
            tx("T2", "A", "B", 500.0, 1),
            tx("T3", "B", "C", 750.0, 2),
        ]);

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);

        let a = graph.index_of("A").unwrap();
        let b = graph.index_of("B").unwrap();
        let edge = graph.edge(a, b).unwrap();
        assert_eq!(edge.count, 2);
        assert_eq!(edge.total_amount, 1500.0);
        assert_eq!(edge.timestamps.len(), 2);
        assert_eq!(edge.amounts, vec![1000.0, 500.0]);
    }

    #[test]
    fn test_degrees_count_distinct_counterparties() {
        // Two transactions on the same edge must not inflate the degree.
        let graph = TransactionGraph::build(&[
            tx("T1", "S1", "H", 100.0, 0),
            tx("T2", "S1", "H", 200.0, 1),
            tx("T3", "S2", "H", 300.0, 2),
            tx("T4", "H", "R1", 400.0, 3),
        ]);

        let h = graph.index_of("H").unwrap();
        assert_eq!(graph.node(h).in_degree, 2);
        assert_eq!(graph.node(h).out_degree, 1);
        assert_eq!(graph.node(h).total_transactions, 4);
    }

    #[test]
    fn test_self_loop_stored_but_not_a_counterparty() {
        let graph = TransactionGraph::build(&[
            tx("T1", "A", "A", 100.0, 0),
            tx("T2", "B", "A", 200.0, 1),
        ]);

        let a = graph.index_of("A").unwrap();
        assert!(graph.edge(a, a).is_some());
        assert_eq!(graph.node(a).in_degree, 1);
        assert_eq!(graph.node(a).out_degree, 0);
        // The self-loop transaction is incident twice.
        assert_eq!(graph.node(a).total_transactions, 3);
    }

    #[test]
    fn test_input_order_does_not_change_edges() {
        let batch = vec![
            tx("T1", "A", "B", 0.1, 3),
            tx("T2", "A", "B", 0.2, 1),
            tx("T3", "A", "B", 0.3, 2),
        ];
        let mut reversed = batch.clone();
        reversed.reverse();

        let forward = TransactionGraph::build(&batch);
        let backward = TransactionGraph::build(&reversed);

        let a = forward.index_of("A").unwrap();
        let b = forward.index_of("B").unwrap();
        let lhs = forward.edge(a, b).unwrap();
        let rhs = backward.edge(a, b).unwrap();
        assert_eq!(lhs.total_amount.to_bits(), rhs.total_amount.to_bits());
        assert_eq!(lhs.timestamps, rhs.timestamps);
        assert_eq!(lhs.amounts, rhs.amounts);
    }

    #[test]
    fn test_aggregated_amount_saturates() {
        let graph = TransactionGraph::build(&[
            tx("T1", "A", "B", f64::MAX, 0),
            tx("T2", "A", "B", f64::MAX, 1),
        ]);

        let a = graph.index_of("A").unwrap();
        let b = graph.index_of("B").unwrap();
        assert_eq!(graph.edge(a, b).unwrap().total_amount, f64::MAX);
    }

    #[test]
    fn test_empty_batch() {
        let graph = TransactionGraph::build(&[]);
        assert!(graph.is_empty());
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_handles_follow_sorted_id_order() {
        let graph = TransactionGraph::build(&[
            tx("T1", "ZULU", "ALPHA", 10.0, 0),
            tx("T2", "MIKE", "ZULU", 20.0, 1),
        ]);

        assert_eq!(graph.account_ids(), &["ALPHA", "MIKE", "ZULU"]);
        assert_eq!(graph.index_of("ALPHA"), Some(0));
        assert_eq!(graph.index_of("ZULU"), Some(2));
    }
}
