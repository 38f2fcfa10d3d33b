use crate::concurrency::transaction::TransactionId;
use std::collections::{HashMap, HashSet};

pub struct DeadlockDetector;

impl DeadlockDetector {
    /// Depth-first search for a path leading from `start` back to itself.
    /// The returned cycle begins with `start`.
    pub fn find_cycle(
        wait_for_graph: &HashMap<TransactionId, HashSet<TransactionId>>,
        start: TransactionId,
    ) -> Option<Vec<TransactionId>> {
        let mut visited = HashSet::new();
        let mut path = vec![start];

        if Self::dfs(start, start, wait_for_graph, &mut visited, &mut path) {
            Some(path)
        } else {
            None
        }
    }

    fn dfs(
        node: TransactionId,
        start: TransactionId,
        graph: &HashMap<TransactionId, HashSet<TransactionId>>,
        visited: &mut HashSet<TransactionId>,
        path: &mut Vec<TransactionId>,
    ) -> bool {
        if let Some(neighbors) = graph.get(&node) {
            for &neighbor in neighbors {
                if neighbor == start {
                    return true;
                }
                if visited.insert(neighbor) {
                    path.push(neighbor);
                    if Self::dfs(neighbor, start, graph, visited, path) {
                        return true;
                    }
                    path.pop();
                }
            }
        }
        false
    }
}
