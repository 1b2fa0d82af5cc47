use thiserror::Error;

/// Crate-wide result alias, mirroring the error split below.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("internal: {0}")]
    Internal(#[from] InternalError),
    #[error(transparent)]
    User(#[from] UserError),
}

/// Invariant violations that §7 of the design calls "a programming bug, not
/// a runtime-recoverable condition". Production call sites log these and
/// degrade to empty output rather than letting them escape the crate
/// boundary; they exist as a distinct type so tests can assert on them.
#[derive(Error, Debug)]
pub enum InternalError {
    #[error("non-terminal node {node_idx} received a child after reaching its arity")]
    ArityExceeded { node_idx: usize },
    #[error("candidate ref-count dropped below zero")]
    RefCountUnderflow,
    #[error("node index {0} out of bounds for the compiled match object")]
    NodeIndexOutOfBounds(usize),
    #[error("term index {0} out of bounds for the compiled match object")]
    TermIndexOutOfBounds(usize),
}

/// Recoverable, caller-facing failures.
#[derive(Error, Debug)]
pub enum UserError {
    #[error("malformed debug query program: {0}")]
    DebugParse(String),
    #[error("query tree collapsed to nothing during simplification")]
    EmptyQuery,
}
