//! Resource descriptors and discovery wire messages.
//!
//! On the wire every message is a JSON body preceded by a 4-byte big-endian
//! length prefix.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default upper bound for a single frame body.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// One resource type served at a group-version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResource {
    pub kind: String,
    /// Plural resource name, e.g. `ingresses`.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespaced: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verbs: Vec<String>,
}

impl ApiResource {
    /// Descriptor carrying only a kind.
    pub fn kind(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: String::new(),
            namespaced: false,
            verbs: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn namespaced(mut self) -> Self {
        self.namespaced = true;
        self
    }

    pub fn with_verbs<I, S>(mut self, verbs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.verbs = verbs.into_iter().map(Into::into).collect();
        self
    }
}

/// Resources the service supports at one group-version.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceList {
    pub group_version: String,
    #[serde(default)]
    pub resources: Vec<ApiResource>,
}

impl ResourceList {
    /// Empty list for `group_version`.
    pub fn empty(group_version: impl Into<String>) -> Self {
        Self {
            group_version: group_version.into(),
            resources: Vec::new(),
        }
    }

    /// List holding bare descriptors for the given kinds.
    pub fn with_kinds<I, S>(group_version: impl Into<String>, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            group_version: group_version.into(),
            resources: kinds.into_iter().map(ApiResource::kind).collect(),
        }
    }

    /// Exact, case-sensitive kind lookup.
    pub fn has_kind(&self, kind: &str) -> bool {
        self.resources.iter().any(|r| r.kind == kind)
    }
}

/// Client query for the resources of one group-version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryRequest {
    pub request_id: Uuid,
    pub group_version: String,
}

impl DiscoveryRequest {
    pub fn new(group_version: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            group_version: group_version.into(),
        }
    }
}

/// Result carried by a [`DiscoveryResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DiscoveryOutcome {
    Ok { resources: ResourceList },
    Error { message: String },
}

/// Server answer to a [`DiscoveryRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryResponse {
    pub in_response_to: Uuid,
    pub served_at: DateTime<Utc>,
    #[serde(flatten)]
    pub outcome: DiscoveryOutcome,
}

impl DiscoveryResponse {
    /// Successful answer to `request`.
    pub fn resources(request: &DiscoveryRequest, resources: ResourceList) -> Self {
        Self {
            in_response_to: request.request_id,
            served_at: Utc::now(),
            outcome: DiscoveryOutcome::Ok { resources },
        }
    }

    /// Error answer to the request with id `request_id`.
    pub fn error(request_id: Uuid, message: impl Into<String>) -> Self {
        Self {
            in_response_to: request_id,
            served_at: Utc::now(),
            outcome: DiscoveryOutcome::Error {
                message: message.into(),
            },
        }
    }
}
