//! The `apiregistration.k8s.io` API group
use crate::{gvk::GroupVersion, registry::EnabledVersions};

pub mod v1alpha1;

/// Name of the API group
pub const GROUP_NAME: &str = "apiregistration.k8s.io";

/// Enable every served version of the group in `registry`
pub fn install(registry: &mut EnabledVersions) {
    registry.enable(GroupVersion::gv(GROUP_NAME, v1alpha1::VERSION));
}
