//! # gvprobe-core
//!
//! Core library for gvprobe: negotiating which schema revision ("API shape")
//! of a resource a live service supports.
//!
//! Callers hand [`negotiate`] a [`CapabilityProvider`] and a list of
//! candidate [`ApiShape`]s in priority order. Each candidate's group-version is
//! probed for the target kind until one serves it. Transport lives outside
//! this crate; see `gvprobe-client` for the discovery protocol client.

pub mod capability;
pub mod error;
pub mod message;
pub mod negotiate;
pub mod provider;
pub mod shape;

pub use capability::{supports_kind, CapabilityProvider};
pub use error::{DiscoveryError, DiscoveryResult, NegotiationError, ParseShapeError};
pub use message::{
    ApiResource, DiscoveryOutcome, DiscoveryRequest, DiscoveryResponse, ResourceList,
    DEFAULT_MAX_MESSAGE_SIZE,
};
pub use negotiate::{negotiate, negotiate_ingress_api};
pub use provider::StaticProvider;
pub use shape::{identifier_of, ApiShape, INGRESS_KIND};

/// Discovery wire protocol version.
pub const PROTOCOL_VERSION: &str = "0.1";
