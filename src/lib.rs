//! Exact inference over patient symptoms with a tree-structured factor graph.
//!
//! A `FactorGraph` is built from the frequency statistics of a collection of `SymptomRecord`s,
//! observations are clamped onto its variables, and the sum-product algorithm computes the
//! marginal of every node given that evidence.

pub mod config;
pub mod factor;
pub mod graph;
mod inference;
pub mod node;
pub mod query;
pub mod smoothing;
pub mod stats;
pub mod util;
pub mod variable;

pub use config::GraphConfig;
pub use factor::{table_from_weights, FactorNode, Table};
pub use graph::{pss_name, severity_name, ClearScope, FactorGraph, AGE, AGP, GENDER, PATHOLOGY};
pub use node::{Message, Node};
pub use query::{pathology_ranking, severity_density, severity_range, symptom_pathology_table};
pub use smoothing::KnnDensity;
pub use stats::{read_records, SymptomObservation, SymptomRecord, SymptomStatistics};
pub use util::{GraphError, Result};
pub use variable::{Domain, Value, VariableNode};
