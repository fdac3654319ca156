//! Clients for the `apiregistration.k8s.io` API group
pub mod v1alpha1;

pub use aggregator_core::apiregistration::{install, GROUP_NAME};
