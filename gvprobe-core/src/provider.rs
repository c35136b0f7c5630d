//! In-memory capability provider.

use std::collections::HashMap;

use crate::capability::CapabilityProvider;
use crate::error::DiscoveryResult;
use crate::message::{ApiResource, ResourceList};

/// Provider backed by a fixed map of group-version to resources.
///
/// Unregistered group-versions are answered with an empty list.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    lists: HashMap<String, ResourceList>,
}

impl StaticProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register bare descriptors for `kinds` at `group_version`.
    pub fn with_kinds<I, S>(mut self, group_version: &str, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.register(ResourceList::with_kinds(group_version, kinds));
        self
    }

    /// Register a resource list, replacing any list already held for its
    /// group-version.
    pub fn register(&mut self, list: ResourceList) {
        self.lists.insert(list.group_version.clone(), list);
    }

    /// Append one resource to the list for `group_version`.
    pub fn add_resource(&mut self, group_version: &str, resource: ApiResource) {
        self.lists
            .entry(group_version.to_string())
            .or_insert_with(|| ResourceList::empty(group_version))
            .resources
            .push(resource);
    }

    /// Registered group-versions, sorted.
    pub fn group_versions(&self) -> Vec<String> {
        let mut gvs: Vec<String> = self.lists.keys().cloned().collect();
        gvs.sort();
        gvs
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Copy of the list for `group_version`, empty if unregistered.
    pub fn lookup(&self, group_version: &str) -> ResourceList {
        self.lists
            .get(group_version)
            .cloned()
            .unwrap_or_else(|| ResourceList::empty(group_version))
    }
}

impl FromIterator<ResourceList> for StaticProvider {
    fn from_iter<T: IntoIterator<Item = ResourceList>>(iter: T) -> Self {
        let mut provider = Self::new();
        for list in iter {
            provider.register(list);
        }
        provider
    }
}

impl CapabilityProvider for StaticProvider {
    fn server_resources_for_group_version(
        &self,
        group_version: &str,
    ) -> DiscoveryResult<ResourceList> {
        Ok(self.lookup(group_version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_group_version_is_empty() {
        let provider = StaticProvider::new().with_kinds("veg/v1", ["Potato"]);
        let list = provider
            .server_resources_for_group_version("grains/v1")
            .unwrap();
        assert_eq!(list, ResourceList::empty("grains/v1"));
    }

    #[test]
    fn register_replaces() {
        let mut provider = StaticProvider::new().with_kinds("veg/v1", ["Potato"]);
        provider.register(ResourceList::with_kinds("veg/v1", ["Carrot"]));

        assert_eq!(provider.len(), 1);
        assert!(provider.lookup("veg/v1").has_kind("Carrot"));
        assert!(!provider.lookup("veg/v1").has_kind("Potato"));
    }

    #[test]
    fn add_resource_appends() {
        let mut provider = StaticProvider::new();
        provider.add_resource("veg/v1", ApiResource::kind("Potato"));
        provider.add_resource("veg/v1", ApiResource::kind("Carrot"));

        assert_eq!(provider.lookup("veg/v1").resources.len(), 2);
    }

    #[test]
    fn collect_from_lists() {
        let provider: StaticProvider = vec![
            ResourceList::with_kinds("veg/v1", ["Potato"]),
            ResourceList::with_kinds("fruit/v1", ["Apple"]),
        ]
        .into_iter()
        .collect();

        assert_eq!(provider.group_versions(), vec!["fruit/v1", "veg/v1"]);
        assert!(!provider.is_empty());
    }
}
