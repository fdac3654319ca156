//! Connection settings for the API server.
//!
//! # Usage
//! Build a [`Config`] with [`Config::new`] or [`Config::from_cluster_env`] and hand it to a
//! group client constructor such as
//! [`ApiregistrationV1alpha1Client::new_for_config`](crate::apiregistration::v1alpha1::ApiregistrationV1alpha1Client::new_for_config),
//! which fills in the group specific fields on a copy.
mod incluster_config;

use std::{path::Path, time::Duration};

use aggregator_core::{DirectCodecFactory, GroupVersion};
use secrecy::SecretString;

use crate::{error::ConfigError, Result};
pub use incluster_config::Error as InClusterError;

/// Default timeout for establishing a connection
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration object detailing the cluster URL, credentials, timeouts and content settings.
///
/// The content fields (`api_path`, `group_version`, `negotiated_serializer`) are filled in by
/// the `set_config_defaults` function of a group client. Everything else is left to the caller.
#[derive(Debug, Clone)]
pub struct Config {
    /// The configured cluster url
    pub cluster_url: http::Uri,
    /// Prefix of every API path, `/apis` for named groups
    pub api_path: String,
    /// The group version requests are made against
    pub group_version: Option<GroupVersion>,
    /// Codec for request and response bodies
    pub negotiated_serializer: Option<DirectCodecFactory>,
    /// Value of the `User-Agent` header
    ///
    /// [`default_user_agent`] is used when unset or empty.
    pub user_agent: Option<String>,
    /// The configured root certificates, DER encoded
    pub root_cert: Option<Vec<Vec<u8>>>,
    /// Whether to accept invalid certificates
    pub accept_invalid_certs: bool,
    /// Timeout for establishing a connection.
    ///
    /// A value of `None` means no timeout
    pub connect_timeout: Option<Duration>,
    /// Timeout for reading a response.
    ///
    /// A value of `None` means no timeout
    pub read_timeout: Option<Duration>,
    /// Timeout for writing a request.
    ///
    /// A value of `None` means no timeout
    pub write_timeout: Option<Duration>,
    /// Stores information to tell the cluster who you are.
    pub auth_info: AuthInfo,
}

/// Credentials and impersonation settings
#[derive(Clone, Debug, Default)]
pub struct AuthInfo {
    /// The username for basic authentication.
    pub username: Option<String>,
    /// The password for basic authentication.
    pub password: Option<SecretString>,
    /// The bearer token for authentication.
    pub token: Option<SecretString>,
    /// PEM encoded client certificate for TLS client authentication.
    pub client_certificate: Option<Vec<u8>>,
    /// PEM encoded private key for `client_certificate`.
    pub client_key: Option<SecretString>,
    /// The username to act-as.
    pub impersonate: Option<String>,
    /// The groups to impersonate.
    pub impersonate_groups: Option<Vec<String>>,
}

impl Config {
    /// Construct a new config where only the `cluster_url` is set by the user.
    /// and everything else receives a default value.
    pub fn new(cluster_url: http::Uri) -> Self {
        Self {
            cluster_url,
            api_path: String::new(),
            group_version: None,
            negotiated_serializer: None,
            user_agent: None,
            root_cert: None,
            accept_invalid_certs: false,
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            read_timeout: None,
            write_timeout: None,
            auth_info: AuthInfo::default(),
        }
    }

    /// Create configuration from the cluster's environment
    ///
    /// This follows the standard [API Access from a Pod](https://kubernetes.io/docs/tasks/access-application-cluster/access-cluster/#accessing-the-api-from-a-pod)
    /// and relies on you having the service account's token mounted,
    /// as well as having given the service account rbac access to do what you need.
    pub fn from_cluster_env() -> Result<Self> {
        Self::from_service_account_dir(incluster_config::SERVICE_ACCOUNT_DIR)
    }

    /// Create in-cluster configuration from a service account directory holding `token` and `ca.crt`
    pub fn from_service_account_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let root_cert = incluster_config::load_cert(dir).map_err(ConfigError::InCluster)?;
        let token = incluster_config::load_token(dir).map_err(ConfigError::InCluster)?;
        tracing::debug!("loaded in-cluster config from {}", dir.display());

        Ok(Self {
            root_cert: Some(root_cert),
            auth_info: AuthInfo {
                token: Some(token),
                ..AuthInfo::default()
            },
            ..Self::new(incluster_config::kube_dns())
        })
    }

    /// Client certificate and private key in PEM, if both are configured
    pub(crate) fn identity_pem(&self) -> Option<Vec<u8>> {
        use secrecy::ExposeSecret;

        let cert = self.auth_info.client_certificate.as_ref()?;
        let key = self.auth_info.client_key.as_ref()?;
        let mut buffer = key.expose_secret().as_bytes().to_vec();
        buffer.push(b'\n');
        buffer.extend_from_slice(cert);
        buffer.push(b'\n');
        Some(buffer)
    }
}

/// The `User-Agent` used when none is configured
///
/// Formatted as `<binary>/v<version> (<os>/<arch>) aggregator-client`.
pub fn default_user_agent() -> String {
    let command = std::env::args_os()
        .next()
        .as_deref()
        .and_then(|arg0| Path::new(arg0).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "unknown".into());
    format!(
        "{command}/v{} ({}/{}) aggregator-client",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

fn certs(data: &[u8]) -> Result<Vec<Vec<u8>>, pem::PemError> {
    Ok(pem::parse_many(data)?
        .into_iter()
        .filter(|p| p.tag() == "CERTIFICATE")
        .map(pem::Pem::into_contents)
        .collect())
}
