//! Types and traits for talking to the `apiregistration.k8s.io` API group
//!
//! This crate carries everything that does not need a network stack:
//! group/version identifiers, the version registry, the codec used for request
//! and response bodies, request builders and the `APIService` resource types.
//!
//! The same information is re-exported from `aggregator-client` under `aggregator_client::core`.
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod apiregistration;

pub mod codec;
pub use codec::{CodecFactory, DirectCodecFactory};

pub mod gvk;
pub use gvk::{GroupVersion, GroupVersionKind};

pub mod metadata;

pub mod object;
pub use object::ObjectList;

pub mod params;

pub mod registry;
pub use registry::{EnabledVersions, VersionRegistry};

pub mod request;
pub use request::Request;

mod resource;
pub use resource::{Resource, ResourceExt};

pub mod response;

pub mod watch;
pub use watch::WatchEvent;

mod error;
pub use error::ErrorResponse;
