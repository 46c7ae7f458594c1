//! Defines the `GraphError` type for the symptom_graph library

use std::io;
use std::result;

use thiserror::Error;

pub type Result<T> = result::Result<T, GraphError>;

#[derive(Debug, Error)]
pub enum GraphError {

    /// A value outside the domain of a `VariableNode`, a message sent to a node that is not a
    /// neighbor, or a table entry that names a value no argument can take
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// A message or marginal was requested before every required incoming message arrived
    #[error("node not ready: {0}")]
    NotReady(String),

    /// Sum-product found a node with more than one unmet neighbor, or terminated without
    /// covering every node
    #[error("malformed topology: {0}")]
    MalformedTopology(String),

    /// The named node does not exist in the `FactorGraph`
    #[error("unknown node: {0}")]
    UnknownNode(String),

    /// Reading or writing a persisted graph or record file failed
    #[error(transparent)]
    Io(#[from] io::Error),

    /// A persisted graph, record file or configuration could not be (de)serialized
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

}

impl GraphError {

    pub(crate) fn invalid<S: Into<String>>(msg: S) -> Self {
        GraphError::InvalidValue(msg.into())
    }

    pub(crate) fn not_ready<S: Into<String>>(msg: S) -> Self {
        GraphError::NotReady(msg.into())
    }

    pub(crate) fn malformed<S: Into<String>>(msg: S) -> Self {
        GraphError::MalformedTopology(msg.into())
    }

}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let e = GraphError::UnknownNode(String::from("Cough"));
        assert_eq!(e.to_string(), "unknown node: Cough");

        let e = GraphError::not_ready("Pathology");
        assert_eq!(e.to_string(), "node not ready: Pathology");
    }

    #[test]
    fn from_json() {
        let err = serde_json::from_str::<u32>("not json").unwrap_err();
        match GraphError::from(err) {
            GraphError::Serialization(_) => (),
            e => panic!("wrong error type: {:?}", e)
        }
    }
}
