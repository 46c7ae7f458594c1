//! Definition of the variable module
//!
//! A `VariableNode` represents a discrete random variable in a factor graph: a finite, ordered
//! `Domain` of `Value`s, an optional clamped observation, and the messages it has received from
//! its neighboring `FactorNode`s.

use crate::node::{Message, NodeCore};
use crate::util::{GraphError, Result};

use indexmap::IndexSet;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use std::fmt;


/// A single value a `VariableNode` can take.
///
/// The symptom graph mixes boolean variables (symptom present), integer variables (age,
/// severity) and named variables (gender, pathology), so values are tagged.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A boolean value, e.g. whether a symptom is present
    Bool(bool),

    /// An integer value, e.g. an age in years or a severity score
    Int(i64),

    /// A named value, e.g. a gender or a pathology
    Text(String)
}

impl Value {

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(b) => Some(b),
            _ => None
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match *self {
            Value::Int(i) => Some(i),
            _ => None
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match *self {
            Value::Text(ref s) => Some(s),
            _ => None
        }
    }
}

impl fmt::Display for Value {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Text(ref s) => write!(f, "{}", s)
        }
    }

}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl<'a> From<&'a str> for Value {
    fn from(s: &'a str) -> Self {
        Value::Text(String::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}


/// The ordered, finite set of values over which a `VariableNode` is defined.
///
/// Messages and marginals are plain weight vectors; position `i` of a vector always refers to
/// `domain.get(i)`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Domain {
    values: IndexSet<Value>
}

impl Domain {

    /// Construct a `Domain` from an ordered sequence of distinct values.
    ///
    /// # Errors
    /// * `GraphError::InvalidValue` if a value appears more than once
    pub fn new<I, V>(values: I) -> Result<Self>
        where I: IntoIterator<Item = V>,
              V: Into<Value>
    {
        let mut set = IndexSet::new();
        for v in values {
            let v = v.into();
            if set.contains(&v) {
                return Err(GraphError::invalid(format!("duplicate domain value ({})", v)));
            }
            set.insert(v);
        }

        Ok(Domain { values: set })
    }

    /// The boolean domain `[true, false]`
    pub fn boolean() -> Self {
        Domain { values: vec![Value::Bool(true), Value::Bool(false)].into_iter().collect() }
    }

    /// The integer domain `start..end`
    pub fn range(start: i64, end: i64) -> Self {
        Domain { values: (start..end).map(Value::Int).collect() }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The position of `value` in the domain, if it is a member
    pub fn position(&self, value: &Value) -> Option<usize> {
        self.values.get_index_of(value)
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.values.contains(value)
    }

    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get_index(idx)
    }

    pub fn iter(&self) -> indexmap::set::Iter<'_, Value> {
        self.values.iter()
    }
}

// IndexSet equality ignores order, but message alignment depends on it
impl PartialEq for Domain {
    fn eq(&self, other: &Self) -> bool {
        self.values.iter().eq(other.values.iter())
    }
}

impl Eq for Domain {}


/// A discrete random variable in a factor graph.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VariableNode {

    /// Identity, adjacency and received messages
    core: NodeCore,

    /// The values this variable can take
    values: Domain,

    /// The observed value, if the variable has been clamped
    #[serde(skip)]
    fixed_value: Option<Value>,

    /// The unnormalized marginal, aligned with `values`
    #[serde(skip)]
    marginals: Option<Array1<f64>>

}

impl VariableNode {

    /// Construct a new, unlinked `VariableNode`
    pub fn new(name: &str, values: Domain, leaf: bool) -> Self {
        VariableNode {
            core: NodeCore::new(name, leaf),
            values,
            fixed_value: None,
            marginals: None
        }
    }

    pub fn name(&self) -> &str {
        self.core.name()
    }

    pub fn values(&self) -> &Domain {
        &self.values
    }

    pub fn fixed_value(&self) -> Option<&Value> {
        self.fixed_value.as_ref()
    }

    /// Clamp the variable to an observed value.
    ///
    /// # Errors
    /// * `GraphError::InvalidValue` if `value` is not in the variable's domain
    pub fn set_value(&mut self, value: Value) -> Result<()> {
        if ! self.values.contains(&value) {
            return Err(GraphError::invalid(
                format!("bad value ({}) for variable {}", value, self.name())
            ));
        }

        self.fixed_value = Some(value);
        Ok(())
    }

    pub fn clear_value(&mut self) {
        self.fixed_value = None;
    }

    pub(crate) fn core(&self) -> &NodeCore {
        &self.core
    }

    pub(crate) fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    pub(crate) fn clear_marginals(&mut self) {
        self.marginals = None;
    }

    /// Store a message from a neighboring factor.
    ///
    /// # Errors
    /// * `GraphError::InvalidValue` if `from` is not a neighbor or the message does not span
    ///   the variable's domain
    pub(crate) fn receive(&mut self, from: &str, message: Message) -> Result<()> {
        if message.len() != self.values.len() {
            return Err(GraphError::invalid(format!(
                "message from {} has {} entries but {} has {} values",
                from, message.len(), self.name(), self.values.len()
            )));
        }

        self.core.receive(from, message)
    }

    /// Compute the message this variable sends to the neighboring factor `target`.
    ///
    /// The message is the element-wise product of every message received from a neighbor other
    /// than `target` (all ones for a leaf). A clamped variable zeroes every value other than the
    /// observed one.
    ///
    /// # Errors
    /// * `GraphError::InvalidValue` if `target` is not a neighbor
    /// * `GraphError::NotReady` if a neighbor other than `target` has not sent its message
    pub fn message_out(&self, target: &str) -> Result<Message> {
        self.core.check_messages(target)?;

        let mut out = Array1::ones(self.values.len());
        if ! self.core.is_leaf() {
            for (_, msg) in self.core.messages_in().iter().filter(|&(n, _)| n != target) {
                out *= msg;
            }
        }

        self.clamp(&mut out);
        Ok(out)
    }

    /// Compute the marginal as the product of the messages received from every neighbor.
    ///
    /// # Errors
    /// * `GraphError::NotReady` unless a message has arrived from every neighbor
    pub fn compute_marginals(&mut self) -> Result<()> {
        if ! self.core.has_all_messages() {
            return Err(GraphError::not_ready(format!(
                "cannot compute marginals until all messages have been received at {}",
                self.name()
            )));
        }

        let mut marginals = Array1::ones(self.values.len());
        for msg in self.core.messages_in().values() {
            marginals *= msg;
        }

        self.clamp(&mut marginals);
        self.marginals = Some(marginals);
        Ok(())
    }

    /// The unnormalized marginal, if it has been computed
    pub fn marginals(&self) -> Option<&Array1<f64>> {
        self.marginals.as_ref()
    }

    /// The normalized marginal probability of `value`.
    ///
    /// # Returns
    /// the marginal weight of `value` divided by the total weight. A value outside the domain,
    /// or a marginal with total weight 0, has probability 0.
    ///
    /// # Errors
    /// * `GraphError::NotReady` if `compute_marginals` has not been called
    pub fn marginal_pmf(&self, value: &Value) -> Result<f64> {
        let marginals = self.marginals.as_ref().ok_or_else(|| {
            GraphError::not_ready(format!("marginals of {} have not been computed", self.name()))
        })?;

        let total = marginals.sum();
        match self.values.position(value) {
            Some(idx) if total != 0.0 => Ok(marginals[idx] / total),
            _ => Ok(0.0)
        }
    }

    /// Zero every weight other than the clamped value's
    fn clamp(&self, weights: &mut Array1<f64>) {
        if let Some(idx) = self.fixed_value.as_ref().and_then(|v| self.values.position(v)) {
            for (i, w) in weights.iter_mut().enumerate() {
                if i != idx {
                    *w = 0.0;
                }
            }
        }
    }
}


// Unit Tests for the VariableNode struct.
#[cfg(test)]
mod tests {

    use super::*;
    use ndarray::array;

    fn linked(name: &str, values: Domain, leaf: bool, neighbors: &[&str]) -> VariableNode {
        let mut var = VariableNode::new(name, values, leaf);
        for n in neighbors {
            var.core_mut().add_link(n);
        }
        var
    }

    #[test]
    fn domain() {
        let d = Domain::new(vec!["M", "F"]).unwrap();
        assert_eq!(d.len(), 2);
        assert_eq!(d.position(&Value::from("F")), Some(1));
        assert_eq!(d.position(&Value::from("X")), None);
        assert_eq!(d.get(0), Some(&Value::from("M")));

        assert!(Domain::new(vec![1, 2, 1]).is_err());

        let b = Domain::boolean();
        assert_eq!(b.position(&Value::Bool(false)), Some(1));

        let ages = Domain::range(0, 140);
        assert_eq!(ages.len(), 140);
        assert_eq!(ages.position(&Value::Int(139)), Some(139));
    }

    #[test]
    fn domain_iter_restarts() {
        let d = Domain::new(vec!["M", "F"]).unwrap();
        let it = d.iter();
        let again = it.clone();
        assert_eq!(it.collect::<Vec<_>>(), again.collect::<Vec<_>>());
    }

    #[test]
    fn domain_order_matters() {
        let a = Domain::new(vec![0, 1, 2]).unwrap();
        let b = Domain::new(vec![2, 1, 0]).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, Domain::range(0, 3));
    }

    #[test]
    fn set_value() {
        let mut var = VariableNode::new("Gender", Domain::new(vec!["M", "F"]).unwrap(), true);
        assert_eq!(var.fixed_value(), None);

        var.set_value(Value::from("F")).unwrap();
        assert_eq!(var.fixed_value(), Some(&Value::from("F")));

        match var.set_value(Value::from("X")) {
            Err(GraphError::InvalidValue(_)) => (),
            r => panic!("expected InvalidValue, got {:?}", r)
        }
        // a failed clamp leaves the previous observation in place
        assert_eq!(var.fixed_value(), Some(&Value::from("F")));

        var.clear_value();
        assert_eq!(var.fixed_value(), None);
    }

    #[test]
    fn leaf_message() {
        let var = linked("Cough", Domain::boolean(), true, &["PSS_Cough"]);
        let msg = var.message_out("PSS_Cough").unwrap();
        assert_eq!(msg, array![1., 1.]);
    }

    #[test]
    fn leaf_message_clamped() {
        let mut var = linked("Cough", Domain::boolean(), true, &["PSS_Cough"]);
        var.set_value(Value::Bool(true)).unwrap();
        let msg = var.message_out("PSS_Cough").unwrap();
        assert_eq!(msg, array![1., 0.]);
    }

    #[test]
    fn product_message() {
        let values = Domain::new(vec!["A", "B", "C"]).unwrap();
        let mut var = linked("Pathology", values, false, &["AGP", "PSS_Cough", "PSS_Fever"]);
        var.receive("AGP", array![0.2, 0.3, 0.5]).unwrap();
        var.receive("PSS_Cough", array![0.5, 1.0, 0.0]).unwrap();

        // PSS_Fever is the only missing neighbor, so it is the only legal target
        let msg = var.message_out("PSS_Fever").unwrap();
        assert_eq!(msg, array![0.1, 0.3, 0.0]);

        match var.message_out("AGP") {
            Err(GraphError::NotReady(_)) => (),
            r => panic!("expected NotReady, got {:?}", r)
        }

        var.receive("PSS_Fever", array![2.0, 2.0, 2.0]).unwrap();
        let msg = var.message_out("AGP").unwrap();
        assert_eq!(msg, array![1.0, 2.0, 0.0]);

        var.set_value(Value::from("B")).unwrap();
        let msg = var.message_out("AGP").unwrap();
        assert_eq!(msg, array![0.0, 2.0, 0.0]);
    }

    #[test]
    fn invalid_target() {
        let var = linked("Cough", Domain::boolean(), true, &["PSS_Cough"]);
        match var.message_out("PSS_Fever") {
            Err(GraphError::InvalidValue(_)) => (),
            r => panic!("expected InvalidValue, got {:?}", r)
        }
    }

    #[test]
    fn receive_wrong_length() {
        let mut var = linked("Cough", Domain::boolean(), true, &["PSS_Cough"]);
        assert!(var.receive("PSS_Cough", array![1., 1., 1.]).is_err());
        assert!(var.receive("AGP", array![1., 1.]).is_err());
    }

    #[test]
    fn marginals() {
        let values = Domain::new(vec!["A", "B", "C"]).unwrap();
        let mut var = linked("Pathology", values, false, &["AGP", "PSS_Cough"]);
        var.receive("AGP", array![0.25, 0.25, 0.5]).unwrap();

        match var.compute_marginals() {
            Err(GraphError::NotReady(_)) => (),
            r => panic!("expected NotReady, got {:?}", r)
        }
        assert!(var.marginal_pmf(&Value::from("A")).is_err());

        var.receive("PSS_Cough", array![0.6, 0.0, 1.0]).unwrap();
        var.compute_marginals().unwrap();

        let total = 0.25 * 0.6 + 0.5;
        assert!((var.marginal_pmf(&Value::from("A")).unwrap() - 0.15 / total).abs() < 1e-12);
        assert_eq!(var.marginal_pmf(&Value::from("B")).unwrap(), 0.0);
        assert!((var.marginal_pmf(&Value::from("C")).unwrap() - 0.5 / total).abs() < 1e-12);
        assert_eq!(var.marginal_pmf(&Value::from("Z")).unwrap(), 0.0);
    }

    #[test]
    fn clamped_marginals() {
        let mut var = linked("Age", Domain::range(0, 3), true, &["AGP"]);
        var.set_value(Value::Int(2)).unwrap();
        var.receive("AGP", array![0.2, 0.3, 0.5]).unwrap();
        var.compute_marginals().unwrap();

        assert_eq!(var.marginal_pmf(&Value::Int(2)).unwrap(), 1.0);
        assert_eq!(var.marginal_pmf(&Value::Int(0)).unwrap(), 0.0);
    }

    #[test]
    fn zero_marginals() {
        let mut var = linked("Age", Domain::range(0, 2), true, &["AGP"]);
        var.receive("AGP", array![0.0, 0.0]).unwrap();
        var.compute_marginals().unwrap();
        assert_eq!(var.marginal_pmf(&Value::Int(0)).unwrap(), 0.0);
    }

    #[test]
    fn value_conversions() {
        assert_eq!(Value::from(3i32), Value::Int(3));
        assert_eq!(Value::from(3u32).as_int(), Some(3));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from("F").as_text(), Some("F"));
        assert_eq!(Value::from("F").as_int(), None);
        assert_eq!(Value::Int(7).to_string(), "7");
    }
}
