//! Types of `apiregistration.k8s.io/v1alpha1`
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use serde::{Deserialize, Serialize};

use crate::{gvk::GroupVersion, metadata::ObjectMeta, Resource};

pub use super::GROUP_NAME;

/// Version of the group served by this module
pub const VERSION: &str = "v1alpha1";

/// `group/version` literal of this module
pub const GROUP_VERSION: &str = "apiregistration.k8s.io/v1alpha1";

/// The group version used to register these objects
pub fn scheme_group_version() -> GroupVersion {
    GroupVersion::gv(GROUP_NAME, VERSION)
}

/// A server for a particular group version
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct APIService {
    /// Standard object metadata
    #[serde(default)]
    pub metadata: ObjectMeta,

    /// Spec contains information for locating and communicating with a server
    #[serde(default)]
    pub spec: APIServiceSpec,

    /// Status contains derived information about an API server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<APIServiceStatus>,
}

impl Resource for APIService {
    const GROUP: &'static str = GROUP_NAME;
    const VERSION: &'static str = VERSION;
    const KIND: &'static str = "APIService";
    const PLURAL: &'static str = "apiservices";

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

/// Contains information for locating and communicating with a server
///
/// Only https is supported, though you are able to disable certificate verification.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct APIServiceSpec {
    /// Reference to the service for this API server.
    ///
    /// It must communicate on port 443.
    #[serde(default)]
    pub service: ServiceReference,

    /// The API group name this server hosts
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,

    /// The API version this server hosts, for example `v1`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    /// Disables TLS certificate verification when communicating with this server.
    ///
    /// This is strongly discouraged. You should use the `ca_bundle` instead.
    #[serde(
        default,
        rename = "insecureSkipTLSVerify",
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub insecure_skip_tls_verify: bool,

    /// Base64 encoded PEM CA bundle which will be used to validate an API server's serving certificate
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ca_bundle: String,

    /// Controls the ordering of this API group in the overall discovery document
    ///
    /// Higher values sort first.
    #[serde(default)]
    pub priority: i64,
}

/// Holds a reference to a `Service` in the cluster
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ServiceReference {
    /// Namespace of the service
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    /// Name of the service
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

/// The observed state of an [`APIService`]
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct APIServiceStatus {
    /// Current service state
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<APIServiceCondition>,
}

/// Describes the state of an [`APIService`] at a particular point
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct APIServiceCondition {
    /// Type is the type of the condition, for example `Available`
    #[serde(rename = "type")]
    pub type_: String,

    /// Status is the status of the condition: `True`, `False` or `Unknown`
    pub status: String,

    /// Last time the condition transitioned from one status to another
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<Time>,

    /// Unique, one-word, CamelCase reason for the condition's last transition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message indicating details about the last transition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl APIServiceStatus {
    /// The `Available` condition, if reported
    pub fn available(&self) -> Option<&APIServiceCondition> {
        self.conditions.iter().find(|c| c.type_ == "Available")
    }
}
