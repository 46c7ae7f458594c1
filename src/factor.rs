//! Definition of the factor module
//!
//! A `FactorNode` represents a potential function over an ordered tuple of neighboring
//! `VariableNode`s. The potential is held as a dense table, with axis `i` indexed by the
//! `Domain` positions of the `i`th argument.

use crate::node::{Message, NodeCore};
use crate::util::{GraphError, Result};
use crate::variable::{Domain, Value};

use itertools::Itertools;
use ndarray::{Array1, ArrayD, IxDyn};
use serde::{Deserialize, Serialize};


/// Alias f64 ndarray::ArrayD as Table
pub type Table = ArrayD<f64>;


/// Build a dense `Table` over `domains` from a sparse list of weighted assignments.
///
/// Assignments that are not listed have weight 0. Weights of a repeated assignment accumulate,
/// so raw observation counts can be passed directly.
///
/// # Errors
/// * `GraphError::InvalidValue` if an assignment has the wrong arity, names a value outside its
///   argument's domain, or carries a negative or non-finite weight
pub fn table_from_weights<I>(domains: &[Domain], weights: I) -> Result<Table>
    where I: IntoIterator<Item = (Vec<Value>, f64)>
{
    let shape: Vec<usize> = domains.iter().map(Domain::len).collect();
    let mut table = Table::zeros(IxDyn(&shape));

    for (assignment, w) in weights {
        if assignment.len() != domains.len() {
            return Err(GraphError::invalid(format!(
                "assignment {:?} does not match {} arguments", assignment, domains.len()
            )));
        }

        if ! w.is_finite() || w < 0.0 {
            return Err(GraphError::invalid(format!("weight {} for {:?}", w, assignment)));
        }

        let idx = positions(domains, &assignment).ok_or_else(|| {
            GraphError::invalid(format!("assignment {:?} is outside the factor domain", assignment))
        })?;

        table[IxDyn(&idx)] += w;
    }

    Ok(table)
}


/// Map an assignment to its table index, or `None` if any value is outside its domain
fn positions(domains: &[Domain], assignment: &[Value]) -> Option<Vec<usize>> {
    if assignment.len() != domains.len() {
        return None;
    }

    domains.iter()
           .zip(assignment)
           .map(|(d, v)| d.position(v))
           .collect()
}


/// A potential function in a factor graph.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FactorNode {

    /// Identity, adjacency and received messages
    core: NodeCore,

    /// The names of the argument variables, in the order of the table's axes
    function_args: Vec<String>,

    /// The domain of each argument, aligned with `function_args`
    domains: Vec<Domain>,

    /// The values of the potential function
    table: Table,

    /// The unnormalized joint marginal over the arguments
    #[serde(skip)]
    marginals: Option<Table>

}

impl FactorNode {

    /// Create a new `FactorNode`.
    ///
    /// # Args
    /// * `name`: the name of the node
    /// * `scope`: the argument variables and their domains, in argument order
    /// * `table`: the potential, with one axis per argument
    /// * `leaf`: whether the node sends its message without waiting on any other. A leaf factor
    ///   must have exactly one argument.
    ///
    /// # Errors
    /// * `GraphError::InvalidValue` if the scope is empty or repeats a variable, the table shape
    ///   does not match the domains, a weight is negative or non-finite, or a leaf factor has
    ///   more than one argument
    pub fn new(name: &str, scope: Vec<(String, Domain)>, table: Table, leaf: bool) -> Result<Self> {
        let (function_args, domains): (Vec<String>, Vec<Domain>) = scope.into_iter().unzip();

        let factor = FactorNode {
            core: NodeCore::new(name, leaf),
            function_args,
            domains,
            table,
            marginals: None
        };

        factor.check()?;
        Ok(factor)
    }

    /// Verify the structural invariants of the factor. Runs on construction, and again on a
    /// factor read back from storage.
    ///
    /// # Errors
    /// * `GraphError::InvalidValue` on an empty or repeated scope, a leaf factor with more than
    ///   one argument, a table whose shape does not match the domains, or a negative or
    ///   non-finite weight
    pub(crate) fn check(&self) -> Result<()> {
        let name = self.name();
        let args = &self.function_args;

        if args.is_empty() {
            return Err(GraphError::invalid(format!("factor {} has an empty scope", name)));
        } else if self.core.is_leaf() && args.len() != 1 {
            return Err(GraphError::invalid(
                format!("leaf factor {} must have exactly one argument", name)
            ));
        } else if args.len() != self.domains.len() {
            return Err(GraphError::invalid(format!(
                "factor {} has {} arguments but {} domains", name, args.len(), self.domains.len()
            )));
        } else if args.len() != self.table.ndim() {
            return Err(GraphError::invalid(format!(
                "factor {} has {} arguments but a {}-dimensional table",
                name, args.len(), self.table.ndim()
            )));
        }

        if args.iter().unique().count() != args.len() {
            return Err(GraphError::invalid(format!("factor {} repeats an argument", name)));
        }

        for ((arg, d), &len) in args.iter().zip(self.domains.iter()).zip(self.table.shape()) {
            if d.len() != len {
                return Err(GraphError::invalid(format!(
                    "factor {}: argument {} has {} values but the table axis has {}",
                    name, arg, d.len(), len
                )));
            }
        }

        // factors may not have negative values
        if self.table.iter().any(|&w| ! w.is_finite() || w < 0.0) {
            return Err(GraphError::invalid(
                format!("factor {} has a negative or non-finite weight", name)
            ));
        }

        Ok(())
    }

    /// Create a new `FactorNode` from a sparse list of weighted assignments.
    ///
    /// See `table_from_weights` and `FactorNode::new`.
    pub fn from_weights<I>(name: &str, scope: Vec<(String, Domain)>, weights: I, leaf: bool) -> Result<Self>
        where I: IntoIterator<Item = (Vec<Value>, f64)>
    {
        let domains: Vec<Domain> = scope.iter().map(|(_, d)| d.clone()).collect();
        let table = table_from_weights(&domains, weights)?;
        FactorNode::new(name, scope, table, leaf)
    }

    pub fn name(&self) -> &str {
        self.core.name()
    }

    /// The argument names, in the order the potential expects them
    pub fn function_args(&self) -> &[String] {
        &self.function_args
    }

    pub fn domains(&self) -> &[Domain] {
        &self.domains
    }

    /// The domain of the argument `arg`
    pub fn domain_of(&self, arg: &str) -> Option<&Domain> {
        self.arg_position(arg).map(|i| &self.domains[i])
    }

    pub fn table(&self) -> &Table {
        &self.table
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

    fn arg_position(&self, arg: &str) -> Option<usize> {
        self.function_args.iter().position(|a| a == arg)
    }

    /// Evaluate the potential for an assignment given in `function_args` order.
    ///
    /// Any assignment outside the table (wrong arity, or a value outside an argument's domain)
    /// has potential 0.
    pub fn potential(&self, args: &[Value]) -> f64 {
        match positions(&self.domains, args) {
            Some(idx) => self.table[IxDyn(&idx)],
            None => 0.0
        }
    }

    /// Iterate over every joint assignment of the arguments, in row-major table order
    pub fn assignments(&self) -> impl Iterator<Item = Vec<Value>> + '_ {
        self.domains.iter()
                    .map(|d| d.iter().cloned())
                    .multi_cartesian_product()
    }

    /// Store a message from a neighboring variable.
    ///
    /// # Errors
    /// * `GraphError::InvalidValue` if `from` is not a neighbor and argument, or the message does
    ///   not span the argument's domain
    pub(crate) fn receive(&mut self, from: &str, message: Message) -> Result<()> {
        let expected = self.domain_of(from).map(Domain::len).ok_or_else(|| {
            GraphError::invalid(format!("{} is not an argument of factor {}", from, self.name()))
        })?;

        if message.len() != expected {
            return Err(GraphError::invalid(format!(
                "message from {} has {} entries but its domain in {} has {}",
                from, message.len(), self.name(), expected
            )));
        }

        self.core.receive(from, message)
    }

    /// The incoming message for each argument, `None` at position `skip`
    fn incoming(&self, skip: Option<usize>) -> Result<Vec<Option<&Message>>> {
        self.function_args.iter()
                          .enumerate()
                          .map(|(i, arg)| {
                              if Some(i) == skip {
                                  return Ok(None);
                              }
                              self.core.messages_in().get(arg).map(Some).ok_or_else(|| {
                                  GraphError::not_ready(
                                      format!("factor {} has no message from {}", self.name(), arg)
                                  )
                              })
                          })
                          .collect()
    }

    /// Compute the message this factor sends to the neighboring variable `target`.
    ///
    /// For each value `v` of `target`, sums over every joint assignment with `target` held at `v`
    /// the potential times the incoming message weight of every other argument's value. For a
    /// leaf factor this is the potential itself.
    ///
    /// # Errors
    /// * `GraphError::InvalidValue` if `target` is not a neighbor and argument
    /// * `GraphError::NotReady` if an argument other than `target` has not sent its message
    pub fn message_out(&self, target: &str) -> Result<Message> {
        self.core.check_messages(target)?;

        let t = self.arg_position(target).ok_or_else(|| {
            GraphError::invalid(format!("{} is not an argument of factor {}", target, self.name()))
        })?;
        let incoming = self.incoming(Some(t))?;

        let mut out = Array1::zeros(self.domains[t].len());
        for (idx, &w) in self.table.indexed_iter() {
            // structural zeros contribute nothing
            if w == 0.0 {
                continue;
            }

            let weight: f64 = incoming.iter()
                                      .enumerate()
                                      .filter_map(|(i, m)| m.map(|m| m[idx[i]]))
                                      .product();
            out[idx[t]] += w * weight;
        }

        Ok(out)
    }

    /// Compute the joint marginal over the arguments: the potential times every incoming message.
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

        let marginals = {
            let incoming = self.incoming(None)?;
            let mut marginals = self.table.clone();
            for (idx, w) in marginals.indexed_iter_mut() {
                let weight: f64 = incoming.iter()
                                          .enumerate()
                                          .filter_map(|(i, m)| m.map(|m| m[idx[i]]))
                                          .product();
                *w *= weight;
            }
            marginals
        };

        self.marginals = Some(marginals);
        Ok(())
    }

    /// The unnormalized joint marginal, if it has been computed
    pub fn marginals(&self) -> Option<&Table> {
        self.marginals.as_ref()
    }

    /// The normalized joint marginal probability of an assignment in `function_args` order.
    ///
    /// # Returns
    /// 0 for an assignment outside the table or a marginal with total weight 0.
    ///
    /// # Errors
    /// * `GraphError::NotReady` if `compute_marginals` has not been called
    pub fn marginal_pmf(&self, args: &[Value]) -> Result<f64> {
        let marginals = self.computed_marginals()?;

        let total = marginals.sum();
        match positions(&self.domains, args) {
            Some(idx) if total != 0.0 => Ok(marginals[IxDyn(&idx)] / total),
            _ => Ok(0.0)
        }
    }

    /// Every joint assignment with its unnormalized marginal weight, in row-major order.
    ///
    /// # Errors
    /// * `GraphError::NotReady` if `compute_marginals` has not been called
    pub fn marginal_table(&self) -> Result<Vec<(Vec<Value>, f64)>> {
        let marginals = self.computed_marginals()?;
        Ok(self.assignments().zip(marginals.iter().cloned()).collect())
    }

    fn computed_marginals(&self) -> Result<&Table> {
        self.marginals.as_ref().ok_or_else(|| {
            GraphError::not_ready(format!("marginals of {} have not been computed", self.name()))
        })
    }
}
