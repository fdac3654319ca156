//! Tracking which API group versions are served
//!
//! Clients consult a [`VersionRegistry`] before they are constructed so that no
//! client is ever built for a group version the running API surface does not support.
//! The registry is always passed in explicitly.
use std::{
    collections::{hash_set, HashSet},
    sync::Arc,
};

use crate::gvk::GroupVersion;

/// Answers whether a group version is enabled
pub trait VersionRegistry {
    /// Returns true if `gv` is enabled
    fn is_enabled_version(&self, gv: &GroupVersion) -> bool;
}

impl<T: VersionRegistry + ?Sized> VersionRegistry for &T {
    fn is_enabled_version(&self, gv: &GroupVersion) -> bool {
        (**self).is_enabled_version(gv)
    }
}

impl<T: VersionRegistry + ?Sized> VersionRegistry for Box<T> {
    fn is_enabled_version(&self, gv: &GroupVersion) -> bool {
        (**self).is_enabled_version(gv)
    }
}

impl<T: VersionRegistry + ?Sized> VersionRegistry for Arc<T> {
    fn is_enabled_version(&self, gv: &GroupVersion) -> bool {
        (**self).is_enabled_version(gv)
    }
}

/// A set of explicitly enabled group versions
///
/// ```
/// use aggregator_core::{EnabledVersions, GroupVersion, VersionRegistry};
///
/// let registry = EnabledVersions::new().with(GroupVersion::gv("apiregistration.k8s.io", "v1alpha1"));
/// assert!(registry.is_enabled_version(&GroupVersion::gv("apiregistration.k8s.io", "v1alpha1")));
/// assert!(!registry.is_enabled_version(&GroupVersion::gv("apiregistration.k8s.io", "v1beta1")));
/// ```
#[derive(Clone, Debug, Default)]
pub struct EnabledVersions {
    versions: HashSet<GroupVersion>,
}

impl EnabledVersions {
    /// An empty registry where nothing is enabled
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable a group version
    ///
    /// Returns false if it was already enabled.
    pub fn enable(&mut self, gv: GroupVersion) -> bool {
        self.versions.insert(gv)
    }

    /// Disable a group version
    ///
    /// Returns false if it was not enabled.
    pub fn disable(&mut self, gv: &GroupVersion) -> bool {
        self.versions.remove(gv)
    }

    /// Builder variant of [`EnabledVersions::enable`]
    #[must_use]
    pub fn with(mut self, gv: GroupVersion) -> Self {
        self.enable(gv);
        self
    }

    /// Iterate over the enabled group versions in no particular order
    pub fn iter(&self) -> hash_set::Iter<'_, GroupVersion> {
        self.versions.iter()
    }

    /// Number of enabled group versions
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Whether nothing is enabled
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

impl VersionRegistry for EnabledVersions {
    fn is_enabled_version(&self, gv: &GroupVersion) -> bool {
        self.versions.contains(gv)
    }
}

impl FromIterator<GroupVersion> for EnabledVersions {
    fn from_iter<I: IntoIterator<Item = GroupVersion>>(iter: I) -> Self {
        Self {
            versions: iter.into_iter().collect(),
        }
    }
}

impl Extend<GroupVersion> for EnabledVersions {
    fn extend<I: IntoIterator<Item = GroupVersion>>(&mut self, iter: I) {
        self.versions.extend(iter)
    }
}
