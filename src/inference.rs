//! Exact inference on a tree-structured `FactorGraph` by the sum-product algorithm.
//!
//! Inference runs in two phases. The collect phase passes messages from the leaves toward a root:
//! a node becomes ready once it has heard from all but one of its neighbors, and then sends its
//! only permissible message to that last neighbor. The distribute phase passes messages from the
//! root back out to the leaves. Afterwards every node holds one message per neighbor and any
//! marginal can be computed.

use crate::graph::{ClearScope, FactorGraph};
use crate::util::{GraphError, Result};

use indexmap::IndexSet;
use log::{debug, trace};

use std::collections::VecDeque;


impl FactorGraph {

    /// Run sum-product with `root` as the collection point.
    ///
    /// Messages and marginals from any previous run are cleared first; clamped values are kept
    /// and act as evidence, including a clamp on `root` itself.
    ///
    /// # Errors
    /// * `GraphError::UnknownNode` if `root` is not a node of the graph
    /// * `GraphError::MalformedTopology` if the graph is not a tree: a ready node is missing more
    ///   than one message, some node is never reached, or some node is left without a message
    ///   from every neighbor
    pub fn sum_product(&mut self, root: &str) -> Result<()> {
        if ! self.contains(root) {
            return Err(GraphError::UnknownNode(String::from(root)));
        }

        self.clear(ClearScope::INFERENCE);
        self.collect(root)?;
        self.distribute(root)?;

        if let Some(node) = self.nodes().find(|n| ! n.has_all_messages()) {
            return Err(GraphError::malformed(format!(
                "terminated before all nodes were messaged ({} is missing {:?})",
                node.name(), node.pending()
            )));
        }

        debug!("sum-product rooted at {} complete", root);
        Ok(())
    }

    /// Run sum-product rooted at the configured root
    pub fn propagate(&mut self) -> Result<()> {
        let root = self.config().root.clone();
        self.sum_product(&root)
    }

    /// Phase 1: leaves to root
    fn collect(&mut self, root: &str) -> Result<()> {
        // nodes that still owe a message toward the root
        let mut not_ready: IndexSet<String> = self.nodes()
                                                  .filter(|n| n.name() != root)
                                                  .map(|n| String::from(n.name()))
                                                  .collect();

        let mut queued: IndexSet<String> = self.nodes()
                                               .filter(|n| n.name() != root)
                                               .filter(|n| n.is_leaf() || n.neighbors().len() == 1)
                                               .map(|n| String::from(n.name()))
                                               .collect();
        let mut ready: Vec<String> = queued.iter().cloned().collect();

        debug!("collect toward {}: {} initially ready nodes", root, ready.len());

        while let Some(name) = ready.pop() {
            let target = {
                let pending = self.node(&name)?.pending();
                if pending.len() != 1 {
                    return Err(GraphError::malformed(format!(
                        "node in ready list is not ready ({} is missing {:?})", name, pending
                    )));
                }
                String::from(pending[0])
            };

            self.send(&name, &target)?;
            not_ready.shift_remove(&name);

            let recipient = self.node(&target)?;
            if target != root && recipient.pending().len() == 1 && ! queued.contains(&target) {
                queued.insert(target.clone());
                ready.push(target);
            }
        }

        if ! not_ready.is_empty() {
            return Err(GraphError::malformed(
                format!("terminated before all nodes reached ({:?})", not_ready)
            ));
        }

        let root_pending = self.node(root)?.pending();
        if ! root_pending.is_empty() {
            return Err(GraphError::malformed(format!(
                "terminated without all messages reaching root {} (missing {:?})", root, root_pending
            )));
        }

        Ok(())
    }

    /// Phase 2: root to leaves
    fn distribute(&mut self, root: &str) -> Result<()> {
        let mut queue = VecDeque::new();
        queue.push_back(String::from(root));

        while let Some(name) = queue.pop_front() {
            let neighbors = self.node(&name)?.neighbors().to_vec();
            for neighbor in neighbors {
                if self.node(&neighbor)?.has_message_from(&name) {
                    continue;
                }

                self.send(&name, &neighbor)?;
                if ! self.node(&neighbor)?.is_leaf() {
                    queue.push_back(neighbor);
                }
            }
        }

        debug!("distribute from {} complete", root);
        Ok(())
    }

    /// Compute the message `from` sends to `to` and deliver it
    fn send(&mut self, from: &str, to: &str) -> Result<()> {
        let message = self.node(from)?.message_out(to)?;
        trace!("{} -> {}: {}", from, to, message);
        self.node_mut(to)?.receive(from, message)
    }
}
