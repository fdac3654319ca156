pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::gvk::GroupVersionKind;

/// An accessor trait for a statically typed kubernetes resource.
///
/// Implementors serialize as the object body without `apiVersion` and `kind`;
/// those are stamped on by [`DirectCodecFactory`](crate::DirectCodecFactory) when encoding.
pub trait Resource {
    /// API group, empty for the core group
    const GROUP: &'static str;
    /// API version within the group
    const VERSION: &'static str;
    /// Kind of the object
    const KIND: &'static str;
    /// Lowercase plural name used in url paths
    const PLURAL: &'static str;

    /// Returns apiVersion of this object
    fn api_version() -> String {
        if Self::GROUP.is_empty() {
            Self::VERSION.to_string()
        } else {
            format!("{}/{}", Self::GROUP, Self::VERSION)
        }
    }

    /// Group, version and kind of this object
    fn gvk() -> GroupVersionKind {
        GroupVersionKind::gvk(Self::GROUP, Self::VERSION, Self::KIND)
    }

    /// Metadata that all persisted resources must have
    fn meta(&self) -> &ObjectMeta;
    /// Metadata that all persisted resources must have
    fn meta_mut(&mut self) -> &mut ObjectMeta;
}

/// Helper methods for resources.
pub trait ResourceExt: Resource {
    /// Returns the name of the resource, falling back to the generate name
    ///
    /// Returns an empty string if neither is set.
    fn name_any(&self) -> String;
    /// The name of the resource, if set
    fn name(&self) -> Option<&str>;
    /// The most recently observed resource version
    fn resource_version(&self) -> Option<&str>;
}

impl<K: Resource> ResourceExt for K {
    fn name_any(&self) -> String {
        let meta = self.meta();
        meta.name
            .clone()
            .or_else(|| meta.generate_name.clone())
            .unwrap_or_default()
    }

    fn name(&self) -> Option<&str> {
        self.meta().name.as_deref()
    }

    fn resource_version(&self) -> Option<&str> {
        self.meta().resource_version.as_deref()
    }
}
