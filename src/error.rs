use thiserror::Error;

/// Main error type for ragraph
#[derive(Error, Debug)]
pub enum RagraphError {
    /// Edge specification is malformed (empty selector, unknown sentinel)
    #[error("Invalid edge specification: {0}")]
    InvalidEdgeSpec(String),

    /// Neither edge specs nor an edge function were supplied
    #[error("No edges provided: supply edge specs or an edge function")]
    MissingEdges,

    /// A traversal instance was run more than once
    #[error("Traversal already used: create a new traversal per query")]
    AlreadyUsed,

    /// Cosine inputs differ in width
    #[error("Embedding dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    /// An adapter received an edge variant it cannot serve
    #[error("Unsupported edge: {0}")]
    UnsupportedEdge(String),

    /// A content is missing its embedding
    #[error("Content '{0}' has no embedding")]
    MissingEmbedding(String),

    /// A content or document has no id
    #[error("Content has no id")]
    MissingId,

    /// Underlying vector store signaled failure
    #[error("Adapter error: {0}")]
    Adapter(String),
}

/// Convenient Result type using RagraphError
pub type Result<T> = std::result::Result<T, RagraphError>;
