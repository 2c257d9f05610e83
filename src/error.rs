use std::fmt;

/// Errors produced by the drone engine.
#[derive(Debug, Clone, PartialEq)]
pub enum DroneError {
    /// A scale/interval configuration is malformed (empty interval list,
    /// or an unrecognisable tonic). Not reachable from the fixed catalog.
    InvalidScale { reason: String },
    /// A node's `dispose()` was called after it had already been disposed.
    NodeDisposed { node: &'static str },
}

impl fmt::Display for DroneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DroneError::InvalidScale { reason } => write!(f, "Invalid scale: {reason}"),
            DroneError::NodeDisposed { node } => write!(f, "Node already disposed: {node}"),
        }
    }
}

impl std::error::Error for DroneError {}
