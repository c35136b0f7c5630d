//! Ordered-candidate API shape negotiation.
//!
//! Candidates are probed one at a time in the order given:
//! - the first candidate whose group-version serves the kind wins;
//! - a provider error aborts the negotiation on the spot;
//! - a miss moves on to the next candidate.

use crate::capability::{supports_kind, CapabilityProvider};
use crate::error::NegotiationError;
use crate::shape::{ApiShape, INGRESS_KIND};

/// Find the first candidate shape whose group-version serves `kind`.
///
/// # Arguments
/// * `provider` - Capability provider to probe
/// * `candidates` - Shapes in priority order
/// * `kind` - Resource kind that must be served
///
/// # Returns
/// The winning shape, [`NegotiationError::Probe`] if the provider failed, or
/// [`NegotiationError::NoMatch`] if no candidate serves the kind (including
/// when `candidates` is empty).
pub fn negotiate<P>(
    provider: &P,
    candidates: &[ApiShape],
    kind: &str,
) -> Result<ApiShape, NegotiationError>
where
    P: CapabilityProvider + ?Sized,
{
    for &candidate in candidates {
        let Some(group_version) = candidate.group_version() else {
            tracing::warn!("skipping candidate {} without a group-version", candidate);
            continue;
        };

        tracing::debug!(%group_version, kind, "probing candidate");
        match supports_kind(provider, group_version, kind) {
            Ok(true) => {
                tracing::debug!(%group_version, kind, "candidate serves kind");
                return Ok(candidate);
            }
            Ok(false) => continue,
            Err(source) => {
                tracing::debug!(%group_version, error = %source, "probe failed");
                return Err(NegotiationError::Probe { candidate, source });
            }
        }
    }

    Err(NegotiationError::NoMatch {
        kind: kind.to_string(),
        tried: candidates.to_vec(),
    })
}

/// [`negotiate`] for the `Ingress` kind.
pub fn negotiate_ingress_api<P>(
    provider: &P,
    candidates: &[ApiShape],
) -> Result<ApiShape, NegotiationError>
where
    P: CapabilityProvider + ?Sized,
{
    negotiate(provider, candidates, INGRESS_KIND)
}
