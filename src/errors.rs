use generational_arena::Index;
use thiserror::Error;

use crate::id::NodeId;
use crate::value::Value;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    #[error("Invalid label spec: {0}")]
    InvalidLabelSpec(String),

    #[error("Node {0} is not a leaf and thus has no value")]
    NotALeaf(NodeId),

    #[error("Cannot add a child to node {0}: its data is a scalar value")]
    NotEnumerable(NodeId),

    #[error("Cannot merge {left} with {right}: a child list and a scalar value have different shapes")]
    ShapeConflict { left: String, right: String },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Cannot apply {op} to {left} and {right}")]
    IncompatibleValues {
        op: &'static str,
        left: Value,
        right: Value,
    },

    #[error("Node not found in tree: {0:?}")]
    NodeNotFound(Index),

    #[error("Config error: {message}")]
    Config { message: String },
}

pub type TreeResult<T> = Result<T, TreeError>;
