use thiserror::Error;

/// Errors raised by store operations.
///
/// All of them signal a programming mistake on the caller's side and are
/// returned synchronously; none is ever delivered through events or watches.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Parameter name must be non-empty string")]
    InvalidName,
    #[error("argument must be a Store instance")]
    InvalidAncestor,
    #[error("Path does not resolve to a Store")]
    PathResolution { segment: String },
    #[error("Ancestor Stores are read-only")]
    ReadOnly,
}
