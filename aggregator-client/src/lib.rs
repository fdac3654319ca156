//! Typed client for the `apiregistration.k8s.io` API group
//!
//! The group client [`ApiregistrationV1alpha1Client`](apiregistration::v1alpha1::ApiregistrationV1alpha1Client)
//! is built from a [`Config`] and a [`VersionRegistry`](core::VersionRegistry) that says which
//! group versions are served. It refuses to build for a disabled version.
//!
//! # Example
//!
//! ```rust,no_run
//! use aggregator_client::{
//!     apiregistration::{self, v1alpha1::{ApiServicesGetter, ApiregistrationV1alpha1Client}},
//!     core::{params::PatchParams, params::Patch, EnabledVersions},
//!     Config,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut registry = EnabledVersions::new();
//!     apiregistration::install(&mut registry);
//!
//!     let config = Config::new("http://127.0.0.1:8001".parse()?);
//!     let client = ApiregistrationV1alpha1Client::new_for_config(&config, &registry)?;
//!
//!     // Bump the discovery priority of an aggregated api
//!     let patch = serde_json::json!({ "spec": { "priority": 200 } });
//!     let svc = client
//!         .api_services()
//!         .patch("v1alpha1.metrics.example.com", &PatchParams::default(), &Patch::Merge(&patch))
//!         .await?;
//!     println!("priority is now {}", svc.spec.priority);
//!     Ok(())
//! }
//! ```
//!
//! For more details, see:
//!
//! - [`RestClient`](crate::client) for the transport and its tower stack
//! - [`Config`](crate::config) for connection settings
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod apiregistration;

pub mod client;
#[doc(inline)]
pub use client::{RestClient, RestClientGetter};

pub mod config;
#[doc(inline)]
pub use config::Config;

pub mod error;
#[doc(inline)]
pub use error::Error;

/// Convenient alias for `Result<T, Error>`
pub type Result<T, E = Error> = std::result::Result<T, E>;

pub use crate::core::{Resource, ResourceExt};
/// Re-exports from aggregator_core
pub use aggregator_core as core;
