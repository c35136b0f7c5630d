//! Capability providers and the kind-membership check.

use std::sync::Arc;

use crate::error::DiscoveryResult;
use crate::message::ResourceList;

/// Answers "which kinds does the service serve at this group-version?".
///
/// Implementations decide transport, deadlines and cancellation. Callers only
/// hold `&self` and may query the same provider any number of times.
pub trait CapabilityProvider {
    /// Fetch the resource list for `group_version`. An unknown group-version
    /// may be answered with an empty list or an error, at the provider's
    /// discretion.
    fn server_resources_for_group_version(&self, group_version: &str)
        -> DiscoveryResult<ResourceList>;
}

impl<P: CapabilityProvider + ?Sized> CapabilityProvider for &P {
    fn server_resources_for_group_version(
        &self,
        group_version: &str,
    ) -> DiscoveryResult<ResourceList> {
        (**self).server_resources_for_group_version(group_version)
    }
}

impl<P: CapabilityProvider + ?Sized> CapabilityProvider for Box<P> {
    fn server_resources_for_group_version(
        &self,
        group_version: &str,
    ) -> DiscoveryResult<ResourceList> {
        (**self).server_resources_for_group_version(group_version)
    }
}

impl<P: CapabilityProvider + ?Sized> CapabilityProvider for Arc<P> {
    fn server_resources_for_group_version(
        &self,
        group_version: &str,
    ) -> DiscoveryResult<ResourceList> {
        (**self).server_resources_for_group_version(group_version)
    }
}

/// Returns whether the service serves `kind` at `group_version`.
///
/// Provider errors are returned unchanged. A list without the kind, including
/// an empty one, is `Ok(false)`.
pub fn supports_kind<P>(provider: &P, group_version: &str, kind: &str) -> DiscoveryResult<bool>
where
    P: CapabilityProvider + ?Sized,
{
    let list = provider.server_resources_for_group_version(group_version)?;
    Ok(list.has_kind(kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiscoveryError;
    use crate::provider::StaticProvider;

    fn sample_provider() -> StaticProvider {
        StaticProvider::new()
            .with_kinds("veg/v1", ["Potato", "Carrot", "Lettuce"])
            .with_kinds("fruit/v1", ["Apple", "Banana", "Pear"])
    }

    struct FailingProvider;

    impl CapabilityProvider for FailingProvider {
        fn server_resources_for_group_version(&self, _: &str) -> DiscoveryResult<ResourceList> {
            Err(DiscoveryError::Transport("some fake error".to_string()))
        }
    }

    #[test]
    fn kind_present() {
        assert!(supports_kind(&sample_provider(), "veg/v1", "Carrot").unwrap());
    }

    #[test]
    fn provider_error_propagates() {
        let err = supports_kind(&FailingProvider, "veg/v1", "Carrot").unwrap_err();
        assert!(matches!(err, DiscoveryError::Transport(ref m) if m == "some fake error"));
    }

    #[test]
    fn group_version_lacks_kind() {
        assert!(!supports_kind(&sample_provider(), "veg/v1", "Australia").unwrap());
    }

    #[test]
    fn kind_lives_in_another_group_version() {
        assert!(!supports_kind(&sample_provider(), "fruit/v1", "Potato").unwrap());
    }

    #[test]
    fn unknown_group_version_is_absence() {
        assert!(!supports_kind(&sample_provider(), "grains/v1", "Wheat").unwrap());
    }

    #[test]
    fn match_is_case_sensitive() {
        let provider = sample_provider();
        assert!(!supports_kind(&provider, "veg/v1", "carrot").unwrap());
        assert!(!supports_kind(&provider, "veg/v1", "CARROT").unwrap());
    }

    #[test]
    fn works_through_trait_objects() {
        let boxed: Box<dyn CapabilityProvider> = Box::new(sample_provider());
        assert!(supports_kind(&boxed, "fruit/v1", "Pear").unwrap());

        let shared: Arc<dyn CapabilityProvider> = Arc::new(sample_provider());
        assert!(supports_kind(shared.as_ref(), "veg/v1", "Lettuce").unwrap());
    }
}
