//! Known API shapes and their group-version identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseShapeError;

/// Resource kind negotiated by [`crate::negotiate_ingress_api`].
pub const INGRESS_KIND: &str = "Ingress";

/// One schema revision of the Ingress resource family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ApiShape {
    /// Sentinel returned on failed negotiation. Has no group-version.
    #[default]
    #[serde(rename = "unknown API", skip_deserializing)]
    Unknown,
    #[serde(rename = "networking.k8s.io/v1")]
    NetworkingV1,
    #[serde(rename = "networking.k8s.io/v1beta1")]
    NetworkingV1beta1,
    #[serde(rename = "extensions/v1beta1")]
    ExtensionsV1beta1,
}

impl ApiShape {
    /// Known shapes, newest first. This is the usual candidate order.
    pub const KNOWN: [ApiShape; 3] = [
        Self::NetworkingV1,
        Self::NetworkingV1beta1,
        Self::ExtensionsV1beta1,
    ];

    /// Group-version to query the provider with, `None` for the sentinel.
    pub fn group_version(&self) -> Option<&'static str> {
        match self {
            Self::NetworkingV1 => Some("networking.k8s.io/v1"),
            Self::NetworkingV1beta1 => Some("networking.k8s.io/v1beta1"),
            Self::ExtensionsV1beta1 => Some("extensions/v1beta1"),
            Self::Unknown => None,
        }
    }

    /// Canonical string form. Only safe as a query key when
    /// [`is_known`](Self::is_known) holds.
    pub fn as_str(&self) -> &'static str {
        self.group_version().unwrap_or("unknown API")
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// Identifier of `shape` for logging and provider queries.
pub fn identifier_of(shape: ApiShape) -> &'static str {
    shape.as_str()
}

impl fmt::Display for ApiShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiShape {
    type Err = ParseShapeError;

    /// Parses a group-version into a known shape. The sentinel's display
    /// string is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::KNOWN
            .into_iter()
            .find(|shape| shape.group_version() == Some(s))
            .ok_or_else(|| ParseShapeError(s.to_string()))
    }
}
