//! Simple-cycle enumeration for circular fund routing.
//!
//! Tarjan SCC decomposition narrows the search to non-trivial strongly
//! connected components, then a length-bounded Johnson-style DFS rooted at
//! each vertex enumerates every simple cycle exactly once, already in its
//! canonical rotation (starting at the lexicographically smallest member).

use crate::graph::TransactionGraph;

/// Enumerate all simple directed cycles with length in
/// `[min_length, max_length]`.
///
/// Cycles are returned as node-handle sequences rooted at their smallest
/// member; the closing edge back to the first node is implicit. Emission
/// order is deterministic: ascending root, then sorted-adjacency DFS
/// order. Self-loops never participate.
pub fn find_cycles(
    graph: &TransactionGraph,
    min_length: usize,
    max_length: usize,
) -> Vec<Vec<usize>> {
    let n = graph.node_count();
    if n == 0 || min_length > max_length {
        return Vec::new();
    }

    let component = strongly_connected_components(graph);
    let mut component_size = vec![0usize; n];
    for &c in &component {
        component_size[c] += 1;
    }

    let mut cycles = Vec::new();
    let mut in_path = vec![false; n];
    for root in 0..n {
        // A cycle of length >= min_length needs that many vertices in one SCC.
        if component_size[component[root]] < min_length {
            continue;
        }
        let mut path = vec![root];
        in_path[root] = true;
        extend_cycle(
            graph,
            &component,
            root,
            &mut path,
            &mut in_path,
            &mut cycles,
            min_length,
            max_length,
        );
        in_path[root] = false;
    }
    cycles
}

#[allow(clippy::too_many_arguments)]
fn extend_cycle(
    graph: &TransactionGraph,
    component: &[usize],
    root: usize,
    path: &mut Vec<usize>,
    in_path: &mut [bool],
    cycles: &mut Vec<Vec<usize>>,
    min_length: usize,
    max_length: usize,
) {
    let current = path[path.len() - 1];
    for (next, _) in graph.out_edges(current) {
        if next == current {
            continue;
        }
        if next == root {
            if path.len() >= min_length {
                cycles.push(path.clone());
            }
            continue;
        }
        // Restricting the walk to vertices above the root makes the root the
        // smallest member of every cycle found from it, so each cycle is
        // discovered exactly once in canonical rotation.
        if next < root || in_path[next] || component[next] != component[root] {
            continue;
        }
        if path.len() == max_length {
            continue;
        }
        path.push(next);
        in_path[next] = true;
        extend_cycle(
            graph, component, root, path, in_path, cycles, min_length, max_length,
        );
        path.pop();
        in_path[next] = false;
    }
}

/// Iterative Tarjan: returns the SCC id of every node.
fn strongly_connected_components(graph: &TransactionGraph) -> Vec<usize> {
    let n = graph.node_count();
    const UNVISITED: usize = usize::MAX;

    let mut index = vec![UNVISITED; n];
    let mut low = vec![0usize; n];
    let mut on_stack = vec![false; n];
    let mut stack: Vec<usize> = Vec::new();
    let mut component = vec![UNVISITED; n];
    let mut next_index = 0usize;
    let mut component_count = 0usize;

    // Explicit call stack: (vertex, successor list, next successor position).
    let mut frames: Vec<(usize, Vec<usize>, usize)> = Vec::new();

    for start in 0..n {
        if index[start] != UNVISITED {
            continue;
        }
        index[start] = next_index;
        low[start] = next_index;
        next_index += 1;
        stack.push(start);
        on_stack[start] = true;
        frames.push((start, successors(graph, start), 0));

        while !frames.is_empty() {
            let top = frames.len() - 1;
            let v = frames[top].0;
            if frames[top].2 < frames[top].1.len() {
                let w = frames[top].1[frames[top].2];
                frames[top].2 += 1;
                if index[w] == UNVISITED {
                    index[w] = next_index;
                    low[w] = next_index;
                    next_index += 1;
                    stack.push(w);
                    on_stack[w] = true;
                    frames.push((w, successors(graph, w), 0));
                } else if on_stack[w] {
                    low[v] = low[v].min(index[w]);
                }
            } else {
                if low[v] == index[v] {
                    while let Some(w) = stack.pop() {
                        on_stack[w] = false;
                        component[w] = component_count;
                        if w == v {
                            break;
                        }
                    }
                    component_count += 1;
                }
                let low_v = low[v];
                frames.pop();
                if let Some(parent) = frames.last() {
                    let p = parent.0;
                    low[p] = low[p].min(low_v);
                }
            }
        }
    }
    component
}

fn successors(graph: &TransactionGraph, v: usize) -> Vec<usize> {
    graph.out_edges(v).map(|(w, _)| w).filter(|&w| w != v).collect()
}
