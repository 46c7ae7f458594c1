//! Definition of the node module
//!
//! A `Node` is a vertex of a factor graph: either a `VariableNode` or a `FactorNode`. Both kinds
//! share a `NodeCore` holding the node's identity, its adjacency and the messages it has received.

use crate::factor::FactorNode;
use crate::util::{GraphError, Result};
use crate::variable::VariableNode;

use indexmap::IndexMap;
use ndarray::Array1;
use serde::{Deserialize, Serialize};


/// A message between neighboring nodes: one non-negative weight per value of the variable on the
/// edge, in that variable's `Domain` order.
pub type Message = Array1<f64>;


/// Identity, adjacency and message store common to every `Node`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NodeCore {

    /// The name of the `Node`. Unique within a `FactorGraph`.
    name: String,

    /// `true` if the outgoing message of this node needs no incoming messages
    leaf: bool,

    /// Names of the adjacent nodes, in link order
    neighbors: Vec<String>,

    /// Messages received so far, keyed by the sending neighbor
    #[serde(skip)]
    messages_in: IndexMap<String, Message>

}

impl NodeCore {

    pub fn new(name: &str, leaf: bool) -> Self {
        NodeCore {
            name: String::from(name),
            leaf,
            neighbors: Vec::new(),
            messages_in: IndexMap::new()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_leaf(&self) -> bool {
        self.leaf
    }

    pub fn neighbors(&self) -> &[String] {
        &self.neighbors
    }

    pub fn is_neighbor(&self, name: &str) -> bool {
        self.neighbors.iter().any(|n| n == name)
    }

    pub fn messages_in(&self) -> &IndexMap<String, Message> {
        &self.messages_in
    }

    pub fn add_link(&mut self, name: &str) {
        self.neighbors.push(String::from(name));
    }

    /// Neighbors that have not yet sent a message to this node
    pub fn pending(&self) -> Vec<&str> {
        self.neighbors.iter()
                      .filter(|n| ! self.messages_in.contains_key(n.as_str()))
                      .map(|n| n.as_str())
                      .collect()
    }

    pub fn has_all_messages(&self) -> bool {
        self.neighbors.iter().all(|n| self.messages_in.contains_key(n.as_str()))
    }

    pub fn clear_messages(&mut self) {
        self.messages_in.clear();
    }

    /// Verify that this node may send a message to `target`.
    ///
    /// # Errors
    /// * `GraphError::InvalidValue` if `target` is not a neighbor
    /// * `GraphError::NotReady` if any neighbor other than `target` has not sent its message
    pub fn check_messages(&self, target: &str) -> Result<()> {
        if ! self.is_neighbor(target) {
            return Err(GraphError::invalid(
                format!("cannot send message from {} to non-neighboring node {}", self.name, target)
            ));
        }

        let missing: Vec<&str> = self.pending().into_iter().filter(|&n| n != target).collect();
        if ! missing.is_empty() {
            return Err(GraphError::not_ready(format!(
                "not enough messages received at {} (missing {:?})", self.name, missing
            )));
        }

        Ok(())
    }

    /// Store a message from the neighbor `from`.
    ///
    /// # Errors
    /// * `GraphError::InvalidValue` if `from` is not a neighbor
    pub fn receive(&mut self, from: &str, message: Message) -> Result<()> {
        if ! self.is_neighbor(from) {
            return Err(GraphError::invalid(
                format!("{} cannot receive a message from non-neighboring node {}", self.name, from)
            ));
        }

        self.messages_in.insert(String::from(from), message);
        Ok(())
    }
}


/// A vertex of a factor graph.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Node {
    /// A random variable
    Variable(VariableNode),

    /// A potential function over an ordered tuple of variables
    Factor(FactorNode)
}

impl Node {

    fn core(&self) -> &NodeCore {
        match *self {
            Node::Variable(ref v) => v.core(),
            Node::Factor(ref f) => f.core()
        }
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        match *self {
            Node::Variable(ref mut v) => v.core_mut(),
            Node::Factor(ref mut f) => f.core_mut()
        }
    }

    pub fn name(&self) -> &str {
        self.core().name()
    }

    pub fn is_leaf(&self) -> bool {
        self.core().is_leaf()
    }

    pub fn neighbors(&self) -> &[String] {
        self.core().neighbors()
    }

    pub fn messages_in(&self) -> &IndexMap<String, Message> {
        self.core().messages_in()
    }

    /// Check if a message from `name` has been received
    pub fn has_message_from(&self, name: &str) -> bool {
        self.core().messages_in().contains_key(name)
    }

    /// Neighbors that have not yet sent a message to this node
    pub fn pending(&self) -> Vec<&str> {
        self.core().pending()
    }

    pub fn has_all_messages(&self) -> bool {
        self.core().has_all_messages()
    }

    pub fn is_variable(&self) -> bool {
        match *self {
            Node::Variable(_) => true,
            _ => false
        }
    }

    pub fn as_variable(&self) -> Option<&VariableNode> {
        match *self {
            Node::Variable(ref v) => Some(v),
            _ => None
        }
    }

    pub fn as_variable_mut(&mut self) -> Option<&mut VariableNode> {
        match *self {
            Node::Variable(ref mut v) => Some(v),
            _ => None
        }
    }

    pub fn as_factor(&self) -> Option<&FactorNode> {
        match *self {
            Node::Factor(ref f) => Some(f),
            _ => None
        }
    }

    pub fn as_factor_mut(&mut self) -> Option<&mut FactorNode> {
        match *self {
            Node::Factor(ref mut f) => Some(f),
            _ => None
        }
    }

    pub(crate) fn add_link(&mut self, name: &str) {
        self.core_mut().add_link(name)
    }

    /// Compute the message this node sends to its neighbor `target`
    pub fn message_out(&self, target: &str) -> Result<Message> {
        match *self {
            Node::Variable(ref v) => v.message_out(target),
            Node::Factor(ref f) => f.message_out(target)
        }
    }

    /// Store a message sent by the neighbor `from`
    pub fn receive(&mut self, from: &str, message: Message) -> Result<()> {
        match *self {
            Node::Variable(ref mut v) => v.receive(from, message),
            Node::Factor(ref mut f) => f.receive(from, message)
        }
    }

    pub fn compute_marginals(&mut self) -> Result<()> {
        match *self {
            Node::Variable(ref mut v) => v.compute_marginals(),
            Node::Factor(ref mut f) => f.compute_marginals()
        }
    }

    pub fn clear_messages(&mut self) {
        self.core_mut().clear_messages()
    }

    pub fn clear_marginals(&mut self) {
        match *self {
            Node::Variable(ref mut v) => v.clear_marginals(),
            Node::Factor(ref mut f) => f.clear_marginals()
        }
    }

    /// Remove any clamped value. Factors carry no observation, so this is a no-op for them.
    pub fn clear_value(&mut self) {
        if let Node::Variable(ref mut v) = *self {
            v.clear_value();
        }
    }
}

impl From<VariableNode> for Node {
    fn from(v: VariableNode) -> Self {
        Node::Variable(v)
    }
}

impl From<FactorNode> for Node {
    fn from(f: FactorNode) -> Self {
        Node::Factor(f)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn links_and_pending() {
        let mut core = NodeCore::new("AGP", false);
        core.add_link("Age");
        core.add_link("Gender");
        core.add_link("Pathology");

        assert!(core.is_neighbor("Gender"));
        assert!(! core.is_neighbor("Cough"));
        assert_eq!(core.pending(), vec!["Age", "Gender", "Pathology"]);

        core.receive("Age", array![1., 1.]).unwrap();
        assert_eq!(core.pending(), vec!["Gender", "Pathology"]);
        assert!(! core.has_all_messages());

        core.clear_messages();
        assert_eq!(core.pending().len(), 3);
    }

    #[test]
    fn check_messages() {
        let mut core = NodeCore::new("AGP", false);
        core.add_link("Age");
        core.add_link("Gender");
        core.add_link("Pathology");

        // two neighbors still missing: never ready
        match core.check_messages("Pathology") {
            Err(GraphError::NotReady(_)) => (),
            r => panic!("expected NotReady, got {:?}", r)
        }

        core.receive("Age", array![1.]).unwrap();
        core.receive("Gender", array![1.]).unwrap();
        assert!(core.check_messages("Pathology").is_ok());
        assert!(core.check_messages("Age").is_err());

        match core.check_messages("Cough") {
            Err(GraphError::InvalidValue(_)) => (),
            r => panic!("expected InvalidValue, got {:?}", r)
        }
    }

    #[test]
    fn receive_from_stranger() {
        let mut core = NodeCore::new("Age", true);
        core.add_link("AGP");
        assert!(core.receive("PSS_Cough", array![1.]).is_err());
        assert!(core.receive("AGP", array![1.]).is_ok());
        assert!(core.has_all_messages());
    }
}
