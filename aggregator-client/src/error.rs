//! Error handling in [`aggregator_client`][crate]
use aggregator_core::GroupVersion;
use thiserror::Error;

pub use aggregator_core::ErrorResponse;

pub use crate::client::AuthError;
#[cfg(feature = "rustls-tls")]
#[cfg_attr(docsrs, doc(cfg(feature = "rustls-tls")))]
pub use crate::client::RustlsTlsError;

/// Possible errors from the [`RestClient`](crate::RestClient) and the group clients built on it
#[derive(Error, Debug)]
pub enum Error {
    /// The API server returned an error status
    ///
    /// Also used when a 4xx/5xx body could not be decoded as a `Status`.
    #[error("ApiError: {0} ({0:?})")]
    Api(#[source] ErrorResponse),

    /// Hyper error
    #[error("HyperError: {0}")]
    HyperError(#[source] hyper::Error),

    /// Service error
    #[error("ServiceError: {0}")]
    Service(#[source] tower::BoxError),

    /// Returned when the response body was not valid UTF-8
    #[error("UTF-8 Error: {0}")]
    FromUtf8(#[from] std::string::FromUtf8Error),

    /// Returned when failed to find a newline character within max length.
    /// Only returned by `RestClient::request_events` and this should never happen as
    /// the max is `usize::MAX`.
    #[error("Error finding newline character")]
    LinesCodecMaxLineLengthExceeded,

    /// Returned on `std::io::Error` when reading event stream.
    #[error("Error reading events stream: {0}")]
    ReadEvents(#[source] std::io::Error),

    /// Http based error
    #[error("HttpError: {0}")]
    HttpError(#[source] http::Error),

    /// Common error case when requesting parsing into own structs
    #[error("Error deserializing response: {0}")]
    SerdeError(#[source] serde_json::Error),

    /// Failed to build a request
    #[error("Failed to build request: {0}")]
    BuildRequest(#[source] aggregator_core::request::Error),

    /// Failed to encode or decode a body
    #[error("Codec error: {0}")]
    Codec(#[source] aggregator_core::codec::Error),

    /// The configuration could not be used to build a client
    #[error("Invalid configuration: {0}")]
    Config(#[source] ConfigError),

    /// An `https` cluster url was given without a TLS stack compiled in
    #[error("TLS required but no TLS stack selected")]
    TlsRequired,

    /// Errors from rustls based TLS
    #[cfg(feature = "rustls-tls")]
    #[cfg_attr(docsrs, doc(cfg(feature = "rustls-tls")))]
    #[error("rustls tls error: {0}")]
    RustlsTls(#[source] RustlsTlsError),

    /// Failed to set up authentication
    #[error("auth error: {0}")]
    Auth(#[source] AuthError),
}

/// Errors raised while defaulting or validating a [`Config`](crate::Config)
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A group version literal could not be parsed
    #[error(transparent)]
    ParseGroupVersion(#[from] aggregator_core::gvk::ParseGroupVersionError),

    /// The group version is not enabled in the supplied registry
    #[error("{0} is not enabled")]
    VersionNotEnabled(GroupVersion),

    /// A rest client needs a group version
    #[error("group version is required when initializing a rest client")]
    MissingGroupVersion,

    /// A rest client needs a serializer
    #[error("negotiated serializer is required when initializing a rest client")]
    MissingSerializer,

    /// The cluster url cannot address a server
    #[error("cluster url `{0}` needs both a scheme and a host")]
    InvalidClusterUrl(http::Uri),

    /// The transport was built outside of a Tokio runtime
    #[error("a Tokio runtime is required to build a rest client")]
    NoRuntime,

    /// Failed to load the in-cluster environment
    #[error("failed to load in-cluster config: {0}")]
    InCluster(#[source] crate::config::InClusterError),
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}
