//! Defines the `FactorGraph`, a tree-structured factor graph over patient age, gender, pathology
//! and symptoms.
//!
//! # Representation
//! The graph owns every `Node` in a table keyed by name. Nodes never hold references to each
//! other; adjacency is a list of neighbor names that is resolved through the graph, so a node can
//! be replaced without leaving dangling links.
//!
//! # Topology
//! `build` produces the tree
//!
//! ```text
//!   Age ──┐
//!         AGP ── Pathology ──┬── PSS_<s1> ──┬── <s1>_severity
//! Gender ─┘                  │              └── <s1>
//!                            ├── PSS_<s2> ── ...
//! ```
//!
//! where AGP is the joint distribution of age, gender and pathology, and each `PSS_<s>` is the
//! distribution of symptom `s` (present, severity) conditioned on pathology.

use crate::config::GraphConfig;
use crate::factor::{table_from_weights, FactorNode};
use crate::node::Node;
use crate::stats::SymptomStatistics;
use crate::util::{GraphError, Result};
use crate::variable::{Domain, Value, VariableNode};

use indexmap::IndexMap;
use log::{debug, info};
use ndarray::Axis;

use std::collections::HashSet;
use std::io::{Read, Write};


/// Name of the age variable
pub const AGE: &str = "Age";

/// Name of the gender variable
pub const GENDER: &str = "Gender";

/// Name of the pathology variable
pub const PATHOLOGY: &str = "Pathology";

/// Name of the age/gender/pathology factor
pub const AGP: &str = "AGP";

/// Name of the severity variable of `symptom`
pub fn severity_name(symptom: &str) -> String {
    format!("{}_severity", symptom)
}

/// Name of the pathology/symptom/severity factor of `symptom`
pub fn pss_name(symptom: &str) -> String {
    format!("PSS_{}", symptom)
}


/// Which parts of the graph's runtime state `FactorGraph::clear` resets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClearScope {
    pub messages: bool,
    pub marginals: bool,
    pub values: bool
}

impl ClearScope {

    /// Reset everything
    pub const ALL: ClearScope = ClearScope { messages: true, marginals: true, values: true };

    /// Reset the results of inference, keeping clamped values
    pub const INFERENCE: ClearScope = ClearScope { messages: true, marginals: true, values: false };

    /// Reset clamped values only
    pub const VALUES: ClearScope = ClearScope { messages: false, marginals: false, values: true };
}

impl Default for ClearScope {
    fn default() -> Self {
        ClearScope::ALL
    }
}


/// A factor graph over named `VariableNode`s and `FactorNode`s.
#[derive(Clone, Debug, Default)]
pub struct FactorGraph {

    /// Every node of the graph, keyed by name, in insertion order
    pub(crate) nodes: IndexMap<String, Node>,

    /// Construction and query defaults
    config: GraphConfig

}

impl FactorGraph {

    /// Construct an empty `FactorGraph` with the default configuration
    pub fn new() -> Self {
        FactorGraph::default()
    }

    /// Construct an empty `FactorGraph` with the given configuration
    pub fn with_config(config: GraphConfig) -> Self {
        FactorGraph { nodes: IndexMap::new(), config }
    }

    /// Construct a `FactorGraph` and build it from `stats`. See `build`.
    pub fn from_statistics(stats: &SymptomStatistics) -> Result<Self> {
        let mut graph = FactorGraph::new();
        graph.build(stats)?;
        Ok(graph)
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: GraphConfig) {
        self.config = config;
    }

    /// Get the number of nodes in the graph
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Iterate over the nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Lookup a `Node` by name
    ///
    /// # Errors
    /// * `GraphError::UnknownNode` if there is no node called `name`
    pub fn node(&self, name: &str) -> Result<&Node> {
        self.nodes.get(name).ok_or_else(|| GraphError::UnknownNode(String::from(name)))
    }

    pub fn node_mut(&mut self, name: &str) -> Result<&mut Node> {
        self.nodes.get_mut(name).ok_or_else(|| GraphError::UnknownNode(String::from(name)))
    }

    /// Lookup a `VariableNode` by name
    ///
    /// # Errors
    /// * `GraphError::UnknownNode` if there is no node called `name`
    /// * `GraphError::InvalidValue` if `name` is a factor
    pub fn variable(&self, name: &str) -> Result<&VariableNode> {
        self.node(name)?
            .as_variable()
            .ok_or_else(|| GraphError::invalid(format!("{} is not a variable", name)))
    }

    pub fn variable_mut(&mut self, name: &str) -> Result<&mut VariableNode> {
        self.node_mut(name)?
            .as_variable_mut()
            .ok_or_else(|| GraphError::invalid(format!("{} is not a variable", name)))
    }

    /// Lookup a `FactorNode` by name
    ///
    /// # Errors
    /// * `GraphError::UnknownNode` if there is no node called `name`
    /// * `GraphError::InvalidValue` if `name` is a variable
    pub fn factor(&self, name: &str) -> Result<&FactorNode> {
        self.node(name)?
            .as_factor()
            .ok_or_else(|| GraphError::invalid(format!("{} is not a factor", name)))
    }

    pub fn factor_mut(&mut self, name: &str) -> Result<&mut FactorNode> {
        self.node_mut(name)?
            .as_factor_mut()
            .ok_or_else(|| GraphError::invalid(format!("{} is not a factor", name)))
    }

    /// Add a node to the graph.
    ///
    /// # Errors
    /// * `GraphError::InvalidValue` if a node with the same name already exists
    pub fn add_node<N: Into<Node>>(&mut self, node: N) -> Result<()> {
        let node = node.into();
        if self.nodes.contains_key(node.name()) {
            return Err(GraphError::invalid(format!("duplicate node {}", node.name())));
        }

        self.nodes.insert(String::from(node.name()), node);
        Ok(())
    }

    /// Link a variable and a factor, appending each to the other's neighbors.
    ///
    /// # Errors
    /// * `GraphError::UnknownNode` if either node is missing
    /// * `GraphError::InvalidValue` if the nodes are of the same kind, are already linked, or the
    ///   variable is not an argument of the factor with the same domain
    pub fn add_link(&mut self, a: &str, b: &str) -> Result<()> {
        {
            let (na, nb) = (self.node(a)?, self.node(b)?);
            let (var, factor) = match (na, nb) {
                (&Node::Variable(ref v), &Node::Factor(ref f)) => (v, f),
                (&Node::Factor(ref f), &Node::Variable(ref v)) => (v, f),
                _ => return Err(GraphError::invalid(
                    format!("cannot link {} and {}: links join a variable and a factor", a, b)
                ))
            };

            if na.neighbors().iter().any(|n| n == b) {
                return Err(GraphError::invalid(format!("{} and {} are already linked", a, b)));
            }

            check_argument(var, factor)?;
        }

        self.node_mut(a)?.add_link(b);
        self.node_mut(b)?.add_link(a);
        Ok(())
    }

    /// Build the symptom factor graph from frequency statistics, replacing any previous contents.
    /// On error the graph is left as it was.
    ///
    /// # Errors
    /// * `GraphError::InvalidValue` if `stats` has no records, contains an age outside
    ///   `0..age_limit`, or a count keyed by a value missing from the distinct value lists
    pub fn build(&mut self, stats: &SymptomStatistics) -> Result<()> {
        let total = stats.record_count();
        if total == 0 {
            return Err(GraphError::invalid("cannot build a factor graph without records"));
        }

        // assemble off to the side so a failure leaves the current graph untouched
        let mut graph = FactorGraph::with_config(self.config.clone());

        let ages = Domain::range(0, self.config.age_limit);
        let genders = Domain::new(stats.genders.iter().map(String::as_str))?;
        let pathologies = Domain::new(stats.pathologies.iter().map(String::as_str))?;

        ///////////////////////////////////////////////////////////////////////
        // 1) The age/gender/pathology branch
        let agp = age_gender_pathology_factor(stats, total, &ages, &genders, &pathologies)?;

        graph.add_node(VariableNode::new(AGE, ages, true))?;
        graph.add_node(VariableNode::new(GENDER, genders, true))?;
        graph.add_node(agp)?;
        graph.add_node(VariableNode::new(PATHOLOGY, pathologies.clone(), false))?;

        graph.add_link(AGE, AGP)?;
        graph.add_link(GENDER, AGP)?;
        graph.add_link(AGP, PATHOLOGY)?;

        ///////////////////////////////////////////////////////////////////////
        // 2) One symptom/severity branch per symptom
        for symptom in stats.symptoms.iter() {
            let severities = match stats.severities_of(symptom) {
                Some(s) => Domain::new(s.iter().cloned())?,
                None => Domain::new(vec![0])?
            };

            let severity = severity_name(symptom);
            let pss = pss_name(symptom);
            let factor = symptom_severity_factor(stats, symptom, &pathologies, &severities)?;

            graph.add_node(VariableNode::new(symptom, Domain::boolean(), true))?;
            graph.add_node(VariableNode::new(&severity, severities, true))?;
            graph.add_node(factor)?;

            graph.add_link(PATHOLOGY, &pss)?;
            graph.add_link(&severity, &pss)?;
            graph.add_link(symptom, &pss)?;
        }

        self.nodes = graph.nodes;

        info!(
            "built factor graph from {} records: {} nodes, {} symptoms",
            total, self.nodes.len(), stats.symptoms.len()
        );
        Ok(())
    }

    /// Clamp the variable `name` to an observed value.
    ///
    /// # Errors
    /// * `GraphError::UnknownNode` if there is no node called `name`
    /// * `GraphError::InvalidValue` if `name` is a factor or `value` is outside its domain
    pub fn set_value(&mut self, name: &str, value: Value) -> Result<()> {
        debug!("clamping {} = {}", name, value);
        self.variable_mut(name)?.set_value(value)
    }

    pub fn set_age(&mut self, age: i64) -> Result<()> {
        self.set_value(AGE, Value::Int(age))
    }

    pub fn set_gender(&mut self, gender: &str) -> Result<()> {
        self.set_value(GENDER, Value::from(gender))
    }

    /// Observe whether `symptom` is present
    pub fn set_symptom(&mut self, symptom: &str, present: bool) -> Result<()> {
        self.set_value(symptom, Value::Bool(present))
    }

    pub fn set_severity(&mut self, symptom: &str, severity: i64) -> Result<()> {
        self.set_value(&severity_name(symptom), Value::Int(severity))
    }

    pub fn set_pathology(&mut self, pathology: &str) -> Result<()> {
        self.set_value(PATHOLOGY, Value::from(pathology))
    }

    /// Reset messages, marginals and/or clamped values of every node
    pub fn clear(&mut self, scope: ClearScope) {
        for node in self.nodes.values_mut() {
            if scope.messages {
                node.clear_messages();
            }
            if scope.marginals {
                node.clear_marginals();
            }
            if scope.values {
                node.clear_value();
            }
        }
    }

    /// Compute the marginals of the node `name`. Requires a completed `sum_product`.
    pub fn compute_marginals(&mut self, name: &str) -> Result<()> {
        self.node_mut(name)?.compute_marginals()
    }

    /// Compute the marginals of every node
    pub fn compute_all_marginals(&mut self) -> Result<()> {
        for node in self.nodes.values_mut() {
            node.compute_marginals()?;
        }
        Ok(())
    }

    /// Check the structural invariants a loaded or hand-assembled graph must satisfy: node names
    /// match their keys, links are symmetric and join a variable to a factor, and every factor
    /// is linked to exactly its arguments with matching domains and passes the checks of
    /// `FactorNode::new`.
    ///
    /// # Errors
    /// * `GraphError::MalformedTopology` or `GraphError::InvalidValue` describing the first
    ///   violation found
    pub fn validate(&self) -> Result<()> {
        for (name, node) in self.nodes.iter() {
            if name != node.name() {
                return Err(GraphError::malformed(format!("node {} is stored as {}", node.name(), name)));
            }

            for neighbor in node.neighbors() {
                let other = self.nodes.get(neighbor).ok_or_else(|| {
                    GraphError::malformed(format!("{} links to missing node {}", name, neighbor))
                })?;

                if ! other.neighbors().iter().any(|n| n == name) {
                    return Err(GraphError::malformed(
                        format!("link {} - {} is not symmetric", name, neighbor)
                    ));
                }

                if other.is_variable() == node.is_variable() {
                    return Err(GraphError::malformed(
                        format!("link {} - {} joins nodes of the same kind", name, neighbor)
                    ));
                }
            }

            if let Node::Factor(ref f) = *node {
                f.check()?;

                let args: HashSet<&str> = f.function_args().iter().map(String::as_str).collect();
                let linked: HashSet<&str> = node.neighbors().iter().map(String::as_str).collect();
                if args != linked || node.neighbors().len() != linked.len() {
                    return Err(GraphError::malformed(
                        format!("factor {} is not linked to exactly its arguments", name)
                    ));
                }

                for arg in f.function_args() {
                    check_argument(self.variable(arg)?, f)?;
                }
            }
        }

        Ok(())
    }

    /// Persist the graph as JSON.
    ///
    /// Only the structure is written: names, leaf flags, links, domains, argument lists and
    /// potential tables. Messages, marginals and clamped values are not.
    pub fn save<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer(writer, &self.nodes)?;
        info!("saved factor graph with {} nodes", self.nodes.len());
        Ok(())
    }

    /// Load a graph written by `save`. The graph starts with no messages, marginals or clamped
    /// values, and the default configuration.
    ///
    /// # Errors
    /// * `GraphError::Serialization` if the input is not a persisted graph
    /// * any error of `validate`
    pub fn load<R: Read>(reader: R) -> Result<Self> {
        let nodes: IndexMap<String, Node> = serde_json::from_reader(reader)?;
        let graph = FactorGraph { nodes, config: GraphConfig::default() };
        graph.validate()?;

        info!("loaded factor graph with {} nodes", graph.nodes.len());
        Ok(graph)
    }
}


/// Check that `var` is an argument of `factor` over the same domain
fn check_argument(var: &VariableNode, factor: &FactorNode) -> Result<()> {
    match factor.domain_of(var.name()) {
        Some(d) if d == var.values() => Ok(()),
        Some(_) => Err(GraphError::invalid(format!(
            "domain of {} differs from its domain in factor {}", var.name(), factor.name()
        ))),
        None => Err(GraphError::invalid(
            format!("{} is not an argument of factor {}", var.name(), factor.name())
        ))
    }
}

/// The joint empirical distribution of (age, gender, pathology)
fn age_gender_pathology_factor(
    stats: &SymptomStatistics,
    total: u64,
    ages: &Domain,
    genders: &Domain,
    pathologies: &Domain,
) -> Result<FactorNode> {
    let weights = stats.age_gender_pathology.iter().map(|((a, g, p), &c)| {
        let key = vec![Value::Int(*a), Value::from(g.as_str()), Value::from(p.as_str())];
        (key, c as f64 / total as f64)
    });

    let scope = vec![
        (String::from(AGE), ages.clone()),
        (String::from(GENDER), genders.clone()),
        (String::from(PATHOLOGY), pathologies.clone())
    ];

    FactorNode::from_weights(AGP, scope, weights, false)
}

/// The empirical distribution of (symptom present, severity) conditioned on pathology
fn symptom_severity_factor(
    stats: &SymptomStatistics,
    symptom: &str,
    pathologies: &Domain,
    severities: &Domain,
) -> Result<FactorNode> {
    let scope = vec![
        (String::from(PATHOLOGY), pathologies.clone()),
        (String::from(symptom), Domain::boolean()),
        (severity_name(symptom), severities.clone())
    ];
    let domains: Vec<Domain> = scope.iter().map(|(_, d)| d.clone()).collect();

    let counts = stats.symptom_counts(symptom).into_iter().flat_map(|c| c.iter()).map(|((p, s, v), &c)| {
        (vec![Value::from(p.as_str()), Value::Bool(*s), Value::Int(*v)], c as f64)
    });
    let mut table = table_from_weights(&domains, counts)?;

    // normalize each pathology's slice into a conditional distribution
    for mut row in table.axis_iter_mut(Axis(0)) {
        let total = row.sum();
        if total > 0.0 {
            row /= total;
        }
    }

    FactorNode::new(&pss_name(symptom), scope, table, false)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{SymptomObservation, SymptomRecord};

    use itertools::iproduct;

    fn record(age: i64, gender: &str, pathology: &str, symptoms: &[(&str, i64)]) -> SymptomRecord {
        SymptomRecord {
            age,
            gender: String::from(gender),
            pathology: String::from(pathology),
            symptoms: symptoms.iter()
                              .map(|&(t, s)| SymptomObservation { text: String::from(t), severity: s })
                              .collect()
        }
    }

    fn small_stats() -> SymptomStatistics {
        let records = vec![
            record(30, "F", "Flu", &[("Cough", 3), ("Fever", 5)]),
            record(30, "F", "Flu", &[("Cough", 2)]),
            record(45, "M", "Cold", &[("Cough", 1)]),
            record(8, "M", "Cold", &[]),
            record(61, "F", "Asthma", &[("Cough", 4)])
        ];
        SymptomStatistics::from_records(&records)
    }

    #[test]
    fn build_topology() {
        let graph = FactorGraph::from_statistics(&small_stats()).unwrap();

        // Age, Gender, AGP, Pathology + 3 nodes per symptom
        assert_eq!(graph.len(), 4 + 3 * 2);

        assert!(graph.node(AGE).unwrap().is_leaf());
        assert!(graph.node(GENDER).unwrap().is_leaf());
        assert!(! graph.node(PATHOLOGY).unwrap().is_leaf());
        assert!(graph.node("Cough").unwrap().is_leaf());
        assert!(graph.node("Cough_severity").unwrap().is_leaf());

        assert_eq!(graph.node(AGP).unwrap().neighbors(), &["Age", "Gender", "Pathology"]);
        assert_eq!(
            graph.node(PATHOLOGY).unwrap().neighbors(),
            &["AGP", "PSS_Cough", "PSS_Fever"]
        );
        assert_eq!(
            graph.node("PSS_Cough").unwrap().neighbors(),
            &["Pathology", "Cough_severity", "Cough"]
        );
        assert_eq!(
            graph.factor("PSS_Cough").unwrap().function_args(),
            &["Pathology", "Cough", "Cough_severity"]
        );

        let severities: Vec<&Value> = graph.variable("Cough_severity").unwrap().values().iter().collect();
        assert_eq!(severities, vec![&Value::Int(0), &Value::Int(1), &Value::Int(2), &Value::Int(3), &Value::Int(4)]);

        assert_eq!(graph.variable(AGE).unwrap().values().len(), 140);
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn agp_sums_to_one() {
        let graph = FactorGraph::from_statistics(&small_stats()).unwrap();
        let agp = graph.factor(AGP).unwrap();
        let d = agp.domains();

        let total: f64 = iproduct!(d[0].iter(), d[1].iter(), d[2].iter())
            .map(|(a, g, p)| agp.potential(&[a.clone(), g.clone(), p.clone()]))
            .sum();
        assert!((total - 1.0).abs() < 1e-5);

        let p = agp.potential(&[Value::Int(30), Value::from("F"), Value::from("Flu")]);
        assert!((p - 0.4).abs() < 1e-12);
    }

    #[test]
    fn pss_rows_sum_to_one() {
        let graph = FactorGraph::from_statistics(&small_stats()).unwrap();
        for symptom in &["Cough", "Fever"] {
            let pss = graph.factor(&pss_name(symptom)).unwrap();
            let d = pss.domains();
            for p in d[0].iter() {
                let total: f64 = iproduct!(d[1].iter(), d[2].iter())
                    .map(|(s, v)| pss.potential(&[p.clone(), s.clone(), v.clone()]))
                    .sum();
                assert!((total - 1.0).abs() < 1e-5);
            }
        }

        let pss = graph.factor("PSS_Cough").unwrap();
        let p = pss.potential(&[Value::from("Flu"), Value::Bool(true), Value::Int(3)]);
        assert!((p - 0.5).abs() < 1e-12);
    }

    #[test]
    fn build_errs() {
        let mut graph = FactorGraph::new();
        match graph.build(&SymptomStatistics::default()) {
            Err(GraphError::InvalidValue(_)) => (),
            r => panic!("expected InvalidValue, got {:?}", r)
        }

        // ages outside the modeled range
        let stats = SymptomStatistics::from_records(&[record(150, "F", "Flu", &[])]);
        assert!(graph.build(&stats).is_err());

        let mut config = GraphConfig::default();
        config.age_limit = 200;
        let mut graph = FactorGraph::with_config(config);
        assert!(graph.build(&stats).is_ok());
    }

    #[test]
    fn failed_build_keeps_graph() {
        let mut graph = FactorGraph::from_statistics(&small_stats()).unwrap();
        let before = graph.len();

        let stats = SymptomStatistics::from_records(&[record(150, "F", "Flu", &[("Rash", 1)])]);
        assert!(graph.build(&stats).is_err());

        assert_eq!(graph.len(), before);
        assert!(! graph.contains("Rash"));
        assert!(graph.validate().is_ok());
        assert!(graph.sum_product(PATHOLOGY).is_ok());
    }

    #[test]
    fn rebuild_replaces_nodes() {
        let mut graph = FactorGraph::from_statistics(&small_stats()).unwrap();
        let stats = SymptomStatistics::from_records(&[record(20, "M", "Cold", &[("Rash", 1)])]);
        graph.build(&stats).unwrap();

        assert!(graph.contains("Rash"));
        assert!(! graph.contains("Cough"));
        assert_eq!(graph.len(), 7);
    }

    #[test]
    fn clamping() {
        let mut graph = FactorGraph::from_statistics(&small_stats()).unwrap();

        graph.set_age(30).unwrap();
        graph.set_gender("F").unwrap();
        graph.set_symptom("Cough", true).unwrap();
        graph.set_severity("Cough", 3).unwrap();
        graph.set_pathology("Flu").unwrap();

        assert_eq!(graph.variable(AGE).unwrap().fixed_value(), Some(&Value::Int(30)));
        assert_eq!(graph.variable("Cough").unwrap().fixed_value(), Some(&Value::Bool(true)));

        assert!(graph.set_age(140).is_err());
        assert!(graph.set_gender("X").is_err());
        assert!(graph.set_severity("Cough", 9).is_err());
        assert!(graph.set_pathology("Measles").is_err());

        match graph.set_symptom("Sneezing", true) {
            Err(GraphError::UnknownNode(_)) => (),
            r => panic!("expected UnknownNode, got {:?}", r)
        }

        match graph.set_value(AGP, Value::Int(1)) {
            Err(GraphError::InvalidValue(_)) => (),
            r => panic!("expected InvalidValue, got {:?}", r)
        }

        graph.clear(ClearScope::INFERENCE);
        assert_eq!(graph.variable(GENDER).unwrap().fixed_value(), Some(&Value::from("F")));

        graph.clear(ClearScope::VALUES);
        assert!(graph.nodes().filter_map(Node::as_variable).all(|v| v.fixed_value().is_none()));
    }

    #[test]
    fn link_errs() {
        let mut graph = FactorGraph::from_statistics(&small_stats()).unwrap();

        // same kind
        assert!(graph.add_link(AGE, GENDER).is_err());
        // already linked
        assert!(graph.add_link(AGE, AGP).is_err());
        // not an argument
        assert!(graph.add_link("Cough", AGP).is_err());
        // missing
        match graph.add_link("Sneezing", AGP) {
            Err(GraphError::UnknownNode(_)) => (),
            r => panic!("expected UnknownNode, got {:?}", r)
        }

        // duplicate node names
        assert!(graph.add_node(VariableNode::new(AGE, Domain::range(0, 2), true)).is_err());
    }

    #[test]
    fn save_and_load() {
        let mut graph = FactorGraph::from_statistics(&small_stats()).unwrap();
        graph.set_gender("F").unwrap();

        let mut buf = Vec::new();
        graph.save(&mut buf).unwrap();

        let loaded = FactorGraph::load(buf.as_slice()).unwrap();
        assert_eq!(loaded.len(), graph.len());

        for (a, b) in graph.nodes().zip(loaded.nodes()) {
            assert_eq!(a.name(), b.name());
            assert_eq!(a.is_leaf(), b.is_leaf());
            assert_eq!(a.neighbors(), b.neighbors());
        }

        assert_eq!(loaded.factor(AGP).unwrap().table(), graph.factor(AGP).unwrap().table());
        assert_eq!(
            loaded.variable("Cough_severity").unwrap().values(),
            graph.variable("Cough_severity").unwrap().values()
        );

        // clamped values are runtime state, not structure
        assert_eq!(loaded.variable(GENDER).unwrap().fixed_value(), None);
    }

    fn saved_json(graph: &FactorGraph) -> serde_json::Value {
        let mut buf = Vec::new();
        graph.save(&mut buf).unwrap();
        serde_json::from_slice(&buf).unwrap()
    }

    #[test]
    fn load_rejects_negative_weight() {
        let graph = FactorGraph::from_statistics(&small_stats()).unwrap();
        let mut json = saved_json(&graph);
        json["PSS_Cough"]["table"]["data"][0] = serde_json::json!(-5.0);

        match FactorGraph::load(json.to_string().as_bytes()) {
            Err(GraphError::InvalidValue(_)) => (),
            r => panic!("expected InvalidValue, got {:?}", r.map(|g| g.len()))
        }
    }

    #[test]
    fn load_rejects_multi_argument_leaf_factor() {
        let graph = FactorGraph::from_statistics(&small_stats()).unwrap();
        let mut json = saved_json(&graph);
        json[AGP]["core"]["leaf"] = serde_json::json!(true);

        assert!(FactorGraph::load(json.to_string().as_bytes()).is_err());

        // the untouched document still loads
        assert!(FactorGraph::load(saved_json(&graph).to_string().as_bytes()).is_ok());
    }

    #[test]
    fn load_rejects_asymmetric_links() {
        let graph = FactorGraph::from_statistics(&small_stats()).unwrap();
        let mut buf = Vec::new();
        graph.save(&mut buf).unwrap();

        let json = String::from_utf8(buf).unwrap();
        let broken = json.replacen(r#""neighbors":["AGP"]"#, r#""neighbors":[]"#, 1);
        assert_ne!(json, broken);

        match FactorGraph::load(broken.as_bytes()) {
            Err(GraphError::MalformedTopology(_)) => (),
            r => panic!("expected MalformedTopology, got {:?}", r.map(|g| g.len()))
        }

        assert!(FactorGraph::load("[1, 2]".as_bytes()).is_err());
    }
}
