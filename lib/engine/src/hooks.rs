use rdf_eval_logical::AlgebraNode;
use rdf_eval_model::Multiset;
use rustc_hash::FxHashMap;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Observes the evaluation of every [AlgebraNode].
///
/// A node may be evaluated more than once, for example, when it is part of an `EXISTS` pattern or
/// when a limited evaluation needs more solutions of its input.
pub trait EvaluationHook {
    /// Called before `node` is evaluated. `depth` is zero for the root of the evaluation.
    fn before(&mut self, _node: &AlgebraNode, _depth: usize) {}

    /// Called with the solutions of `node` after it has been evaluated successfully.
    fn after(&mut self, node: &AlgebraNode, depth: usize, result: &Multiset, elapsed: Duration);
}

/// Emits a [tracing] event for every evaluated node.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHook;

impl EvaluationHook for TracingHook {
    fn before(&mut self, node: &AlgebraNode, depth: usize) {
        tracing::trace!(depth, node = node.name(), "Evaluating node");
    }

    fn after(&mut self, node: &AlgebraNode, depth: usize, result: &Multiset, elapsed: Duration) {
        tracing::debug!(
            depth,
            node = node.name(),
            solutions = result.len(),
            variables = result.variables().len(),
            ?elapsed,
            "Evaluated node"
        );
    }
}

/// Aggregated runtime information of a single node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeStatistics {
    pub name: String,
    pub depth: usize,
    /// How often the node has been evaluated.
    pub evaluations: usize,
    /// The number of solutions produced by all evaluations.
    pub solutions: usize,
    pub elapsed: Duration,
}

impl Display for NodeStatistics {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:indent$}{}: evaluations={}, solutions={}, elapsed={:?}",
            "",
            self.name,
            self.evaluations,
            self.solutions,
            self.elapsed,
            indent = self.depth * 2
        )
    }
}

/// Collects [NodeStatistics] for every evaluated node.
///
/// Nodes are identified by their address. The statistics must therefore be read before the
/// evaluated tree is modified or dropped.
#[derive(Debug, Default)]
pub struct StatisticsHook {
    nodes: FxHashMap<usize, NodeStatistics>,
}

impl StatisticsHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the statistics of `node`, if it has been evaluated.
    pub fn get(&self, node: &AlgebraNode) -> Option<&NodeStatistics> {
        self.nodes.get(&node_id(node))
    }

    /// Returns the statistics of all evaluated nodes of the tree rooted at `root` in pre-order.
    pub fn collect(&self, root: &AlgebraNode) -> Vec<NodeStatistics> {
        let mut result = Vec::new();
        self.collect_into(root, &mut result);
        result
    }

    fn collect_into(&self, node: &AlgebraNode, result: &mut Vec<NodeStatistics>) {
        if let Some(statistics) = self.get(node) {
            result.push(statistics.clone());
        }
        for child in node.children() {
            self.collect_into(child, result);
        }
    }
}

impl EvaluationHook for StatisticsHook {
    fn after(&mut self, node: &AlgebraNode, depth: usize, result: &Multiset, elapsed: Duration) {
        let statistics = self
            .nodes
            .entry(node_id(node))
            .or_insert_with(|| NodeStatistics {
                name: node.name().to_owned(),
                depth,
                evaluations: 0,
                solutions: 0,
                elapsed: Duration::ZERO,
            });
        statistics.evaluations += 1;
        statistics.solutions += result.len();
        statistics.elapsed += elapsed;
    }
}

fn node_id(node: &AlgebraNode) -> usize {
    std::ptr::from_ref(node) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statistics_accumulate_per_node() {
        let child = AlgebraNode::empty_bgp();
        let root = AlgebraNode::Distinct {
            inner: Box::new(child),
        };
        let AlgebraNode::Distinct { inner } = &root else {
            unreachable!()
        };

        let mut hook = StatisticsHook::new();
        hook.after(inner, 1, &Multiset::Identity, Duration::from_millis(1));
        hook.after(inner, 1, &Multiset::Identity, Duration::from_millis(1));
        hook.after(&root, 0, &Multiset::Null, Duration::from_millis(3));

        let statistics = hook.collect(&root);
        assert_eq!(statistics.len(), 2);
        assert_eq!(statistics[0].name, "Distinct");
        assert_eq!(statistics[0].solutions, 0);
        assert_eq!(statistics[1].evaluations, 2);
        assert_eq!(statistics[1].solutions, 2);
        assert_eq!(statistics[1].elapsed, Duration::from_millis(2));
    }
}
