//! Error types for discovery queries and shape negotiation.

use std::time::Duration;

use thiserror::Error;

use crate::shape::ApiShape;

/// Errors raised by a capability provider while answering a discovery query.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Transport error (connection, I/O, TLS).
    #[error("transport error: {0}")]
    Transport(String),

    /// Protocol-level error (malformed frame, mismatched response).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The service answered the query with an error.
    #[error("group-version {group_version} rejected: {reason}")]
    Rejected {
        group_version: String,
        reason: String,
    },

    /// The provider did not answer before its deadline.
    #[error("discovery request timed out after {0:?}")]
    Timeout(Duration),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for discovery queries.
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// Terminal outcomes of a failed negotiation.
///
/// Either variant stands in for [`ApiShape::Unknown`]; callers that want the
/// sentinel can use `negotiate(..).unwrap_or_default()`.
#[derive(Debug, Error)]
pub enum NegotiationError {
    /// The provider failed while a candidate was being probed. Later
    /// candidates were not queried.
    #[error("probing {candidate}: {source}")]
    Probe {
        candidate: ApiShape,
        #[source]
        source: DiscoveryError,
    },

    /// Every candidate was probed and none serves the kind.
    #[error("no suitable {kind} API found, tried: [{}]", join_shapes(.tried))]
    NoMatch { kind: String, tried: Vec<ApiShape> },
}

impl NegotiationError {
    /// Candidates covered by this failure: the probed one for `Probe`, all of
    /// them for `NoMatch`.
    pub fn candidates(&self) -> &[ApiShape] {
        match self {
            Self::Probe { candidate, .. } => std::slice::from_ref(candidate),
            Self::NoMatch { tried, .. } => tried,
        }
    }
}

fn join_shapes(shapes: &[ApiShape]) -> String {
    shapes
        .iter()
        .map(ApiShape::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A string that names no known API shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized API shape: {0:?}")]
pub struct ParseShapeError(pub String);
