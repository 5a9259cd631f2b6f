//! Error types for the layout core

use thiserror::Error;

/// Result type alias for layout operations
pub type Result<T> = std::result::Result<T, LayoutError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("unknown pathfinder algorithm: {name}")]
    UnknownAlgorithm { name: String },

    #[error("collapse/expand requested while another collapse/expand is in progress")]
    ReentrantMutation,

    #[error("no grid node with id {id}")]
    UnknownGridNode { id: usize },

    #[error("unknown chart element: {id}")]
    UnknownElement { id: String },
}
