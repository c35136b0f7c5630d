//! Resource catalog served by the discovery server.

use std::fs;
use std::path::Path;

use gvprobe_core::{
    ApiResource, CapabilityProvider, DiscoveryError, DiscoveryRequest, DiscoveryResponse,
    DiscoveryResult, ResourceList, StaticProvider,
};

/// Group-versions and the resources served under each.
#[derive(Debug, Clone, Default)]
pub struct ResourceCatalog {
    provider: StaticProvider,
}

impl ResourceCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in catalog of a service that has moved Ingress to
    /// `networking.k8s.io/v1` but still serves the beta group.
    pub fn sample() -> Self {
        let mut catalog = Self::new();
        catalog.register(ResourceList {
            group_version: "networking.k8s.io/v1".to_string(),
            resources: vec![
                ApiResource::kind("Ingress")
                    .with_name("ingresses")
                    .namespaced()
                    .with_verbs(["create", "delete", "get", "list", "patch", "update", "watch"]),
                ApiResource::kind("IngressClass")
                    .with_name("ingressclasses")
                    .with_verbs(["create", "delete", "get", "list", "patch", "update", "watch"]),
                ApiResource::kind("NetworkPolicy")
                    .with_name("networkpolicies")
                    .namespaced()
                    .with_verbs(["create", "delete", "get", "list", "patch", "update", "watch"]),
            ],
        });
        catalog.register(ResourceList {
            group_version: "networking.k8s.io/v1beta1".to_string(),
            resources: vec![ApiResource::kind("IngressClass")
                .with_name("ingressclasses")
                .with_verbs(["get", "list", "watch"])],
        });
        catalog
    }

    /// Load a catalog from a JSON array of resource lists.
    pub fn load(path: &Path) -> DiscoveryResult<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            DiscoveryError::Transport(format!("Failed to read catalog {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    /// Parse a catalog from a JSON array of resource lists.
    pub fn from_json(raw: &str) -> DiscoveryResult<Self> {
        let lists: Vec<ResourceList> = serde_json::from_str(raw)?;
        let mut catalog = Self::new();
        for list in lists {
            catalog.register(list);
        }
        Ok(catalog)
    }

    /// Register a resource list, replacing any previous one for its
    /// group-version.
    pub fn register(&mut self, list: ResourceList) {
        self.provider.register(list);
    }

    /// Served group-versions, sorted.
    pub fn group_versions(&self) -> Vec<String> {
        self.provider.group_versions()
    }

    /// Answer a discovery request. Unserved group-versions get an empty list.
    pub fn respond(&self, request: &DiscoveryRequest) -> DiscoveryResponse {
        if request.group_version.trim().is_empty() {
            return DiscoveryResponse::error(request.request_id, "empty group-version");
        }

        match self
            .provider
            .server_resources_for_group_version(&request.group_version)
        {
            Ok(list) => DiscoveryResponse::resources(request, list),
            Err(e) => DiscoveryResponse::error(request.request_id, e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gvprobe_core::DiscoveryOutcome;
    use std::io::Write;

    #[test]
    fn sample_serves_ingress_at_v1_only() {
        let catalog = ResourceCatalog::sample();
        assert_eq!(
            catalog.group_versions(),
            vec!["networking.k8s.io/v1", "networking.k8s.io/v1beta1"]
        );

        let request = DiscoveryRequest::new("networking.k8s.io/v1");
        let response = catalog.respond(&request);
        assert_eq!(response.in_response_to, request.request_id);
        match response.outcome {
            DiscoveryOutcome::Ok { resources } => assert!(resources.has_kind("Ingress")),
            other => panic!("unexpected outcome: {other:?}"),
        }

        let beta = catalog.respond(&DiscoveryRequest::new("networking.k8s.io/v1beta1"));
        assert!(matches!(
            beta.outcome,
            DiscoveryOutcome::Ok { ref resources } if !resources.has_kind("Ingress")
        ));
    }

    #[test]
    fn unknown_group_version_gets_empty_list() {
        let response = ResourceCatalog::sample().respond(&DiscoveryRequest::new("grains/v1"));
        assert_eq!(
            response.outcome,
            DiscoveryOutcome::Ok {
                resources: ResourceList::empty("grains/v1")
            }
        );
    }

    #[test]
    fn empty_group_version_is_an_error() {
        let request = DiscoveryRequest::new("  ");
        let response = ResourceCatalog::new().respond(&request);
        assert_eq!(response.in_response_to, request.request_id);
        assert!(matches!(response.outcome, DiscoveryOutcome::Error { .. }));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"group_version": "extensions/v1beta1",
                  "resources": [{{"kind": "Ingress", "name": "ingresses", "namespaced": true}}]}},
                {{"group_version": "apps/v1", "resources": [{{"kind": "Deployment"}}]}}
            ]"#
        )
        .unwrap();

        let catalog = ResourceCatalog::load(file.path()).unwrap();
        assert_eq!(catalog.group_versions(), vec!["apps/v1", "extensions/v1beta1"]);
    }

    #[test]
    fn load_rejects_bad_json() {
        assert!(matches!(
            ResourceCatalog::from_json("{\"not\": \"a list\"}"),
            Err(DiscoveryError::Serialization(_))
        ));
    }

    #[test]
    fn load_missing_file() {
        let err = ResourceCatalog::load(Path::new("/nonexistent/catalog.json")).unwrap_err();
        assert!(matches!(err, DiscoveryError::Transport(_)));
    }
}
