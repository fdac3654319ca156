//! Typed client for `apiregistration.k8s.io/v1alpha1`
//!
//! ```no_run
//! use aggregator_client::{
//!     apiregistration::{self, v1alpha1::{ApiServicesGetter, ApiregistrationV1alpha1Client}},
//!     core::{params::ListParams, EnabledVersions},
//!     Config,
//! };
//!
//! # async fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
//! let mut registry = EnabledVersions::new();
//! apiregistration::install(&mut registry);
//!
//! let config = Config::from_cluster_env()?;
//! let client = ApiregistrationV1alpha1Client::new_for_config(&config, &registry)?;
//! for svc in client.api_services().list(&ListParams::default()).await? {
//!     println!("{:?}", svc.metadata.name);
//! }
//! # Ok(())
//! # }
//! ```
use aggregator_core::{
    apiregistration::v1alpha1::GROUP_VERSION, CodecFactory, DirectCodecFactory, GroupVersion,
    VersionRegistry,
};

use crate::{
    client::RestClientGetter, config::default_user_agent, error::ConfigError, Config, RestClient, Result,
};

mod apiservice;
pub use apiservice::ApiServices;

pub use aggregator_core::apiregistration::v1alpha1::*;

/// Path prefix of named API groups
const API_PATH: &str = "/apis";

/// Hands out clients for the `apiservices` resource
pub trait ApiServicesGetter {
    /// A client for `apiservices` bound to this group client's transport
    fn api_services(&self) -> ApiServices;
}

/// Everything the `apiregistration.k8s.io/v1alpha1` group client offers
pub trait ApiregistrationV1alpha1Interface: RestClientGetter + ApiServicesGetter {}

impl<T: RestClientGetter + ApiServicesGetter + ?Sized> ApiregistrationV1alpha1Interface for T {}

/// Client for the `apiregistration.k8s.io/v1alpha1` group
///
/// Wraps exactly one [`RestClient`] and never changes after construction.
#[derive(Clone, Debug)]
pub struct ApiregistrationV1alpha1Client {
    rest_client: RestClient,
}

impl ApiregistrationV1alpha1Client {
    /// Wrap an existing transport
    ///
    /// No defaulting happens: the transport is used as configured.
    pub fn new(rest_client: RestClient) -> Self {
        Self { rest_client }
    }

    /// Build a client from `config`
    ///
    /// A copy of `config` receives the group defaults before the transport is built.
    /// The caller's value is left untouched.
    pub fn new_for_config(config: &Config, registry: &impl VersionRegistry) -> Result<Self> {
        let mut config = config.clone();
        set_config_defaults(&mut config, registry)?;
        let rest_client = RestClient::for_config(&config)?;
        Ok(Self::new(rest_client))
    }

    /// Build a client from `config`, panicking on failure
    ///
    /// # Panics
    ///
    /// Panics with the error [`ApiregistrationV1alpha1Client::new_for_config`] would return.
    /// Intended for process startup where a bad configuration is fatal.
    pub fn new_for_config_or_die(config: &Config, registry: &impl VersionRegistry) -> Self {
        match Self::new_for_config(config, registry) {
            Ok(client) => client,
            Err(err) => panic!("{err}"),
        }
    }
}

impl RestClientGetter for ApiregistrationV1alpha1Client {
    fn rest_client(&self) -> Option<&RestClient> {
        Some(&self.rest_client)
    }
}

impl ApiServicesGetter for ApiregistrationV1alpha1Client {
    fn api_services(&self) -> ApiServices {
        ApiServices::new(self.rest_client.clone())
    }
}

/// Fill in the group specific fields of `config`
///
/// Fails without touching `config` when the group version is not enabled in `registry`.
pub fn set_config_defaults(config: &mut Config, registry: &impl VersionRegistry) -> Result<()> {
    let gv: GroupVersion = GROUP_VERSION.parse().map_err(ConfigError::ParseGroupVersion)?;
    if !registry.is_enabled_version(&gv) {
        tracing::debug!("{} is not in the registry", gv);
        return Err(ConfigError::VersionNotEnabled(gv).into());
    }

    config.api_path = API_PATH.to_string();
    if config.user_agent.as_deref().map_or(true, str::is_empty) {
        config.user_agent = Some(default_user_agent());
    }
    config.group_version = Some(gv);
    config.negotiated_serializer = Some(DirectCodecFactory::new(CodecFactory::default()));
    tracing::trace!(api_path = API_PATH, group_version = GROUP_VERSION, "defaulted config");
    Ok(())
}
