//! Configuration of graph construction and inference queries.

use crate::util::Result;

use serde::{Deserialize, Serialize};

use std::io::Read;


/// Defaults used when building a `FactorGraph` and querying it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {

    /// Ages are modeled as the integers `0..age_limit`
    pub age_limit: i64,

    /// The node sum-product collects toward in `FactorGraph::propagate`
    pub root: String,

    /// Upper bound on the neighbors used by the severity density smoother
    pub smoothing_neighbors: usize

}

impl Default for GraphConfig {
    fn default() -> Self {
        GraphConfig {
            age_limit: 140,
            root: String::from(crate::graph::PATHOLOGY),
            smoothing_neighbors: 5
        }
    }
}

impl GraphConfig {

    /// Read a configuration from JSON. Missing fields take their default values.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = GraphConfig::default();
        assert_eq!(config.age_limit, 140);
        assert_eq!(config.root, "Pathology");
        assert_eq!(config.smoothing_neighbors, 5);
    }

    #[test]
    fn partial_json() {
        let config = GraphConfig::from_reader(r#"{"age_limit": 100}"#.as_bytes()).unwrap();
        assert_eq!(config.age_limit, 100);
        assert_eq!(config.root, "Pathology");

        assert!(GraphConfig::from_reader(r#"{"age_limit": "old"}"#.as_bytes()).is_err());
    }
}
