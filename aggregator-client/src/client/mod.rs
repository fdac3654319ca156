//! The transport shared by typed group clients
//!
//! A [`RestClient`] pairs a tower [`Service`] stack with the content settings of one
//! group version: where its paths live and how bodies are encoded. Group clients such as
//! [`ApiregistrationV1alpha1Client`](crate::apiregistration::v1alpha1::ApiregistrationV1alpha1Client)
//! hold one and hand out resource clients bound to it.
use std::{fmt, sync::Arc};

use aggregator_core::{
    request::Request as RequestBuilder, response::Status, DirectCodecFactory, ErrorResponse, GroupVersion,
    WatchEvent,
};
use bytes::Bytes;
use either::{Either, Left, Right};
use futures::{future::BoxFuture, Stream, StreamExt, TryStreamExt};
use http::{Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::{
    codec::{FramedRead, LinesCodec, LinesCodecError},
    io::StreamReader,
};
use tower::{buffer::Buffer, util::BoxService, BoxError, Layer, Service, ServiceExt};
use tower_http::map_response_body::MapResponseBodyLayer;

use crate::{error::ConfigError, Config, Error, Result};

mod auth;
mod body;
mod builder;
mod config_ext;
pub mod middleware;
#[cfg(feature = "rustls-tls")] mod tls;

pub use auth::Error as AuthError;
pub use body::Body;
pub use builder::{ClientBuilder, DynBody, GenericService};
pub use config_ext::ConfigExt;
#[cfg(feature = "rustls-tls")] pub use tls::rustls_tls::Error as RustlsTlsError;

/// Content settings a [`RestClient`] is bound to
#[derive(Clone, Debug, PartialEq)]
pub struct ClientContentConfig {
    /// Prefix of every path, `/apis` for named groups
    pub api_path: String,
    /// The group version requests are made against
    pub group_version: GroupVersion,
    /// Codec for request and response bodies
    pub serializer: DirectCodecFactory,
}

impl TryFrom<&Config> for ClientContentConfig {
    type Error = ConfigError;

    fn try_from(config: &Config) -> Result<Self, ConfigError> {
        let group_version = config.group_version.clone().ok_or(ConfigError::MissingGroupVersion)?;
        let serializer = config
            .negotiated_serializer
            .clone()
            .ok_or(ConfigError::MissingSerializer)?;
        Ok(Self {
            api_path: config.api_path.clone(),
            group_version,
            serializer,
        })
    }
}

/// Client for one group version of the API server.
///
/// Cheap to clone: clones share the underlying connection pool and middleware.
#[derive(Clone)]
pub struct RestClient {
    // - `Buffer` for cheap clone
    // - `BoxFuture` for dynamic response future type
    inner: Buffer<Request<Body>, BoxFuture<'static, Result<Response<Body>, BoxError>>>,
    content: Arc<ClientContentConfig>,
}

impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient").field("content", &self.content).finish()
    }
}

impl RestClient {
    /// Create a [`RestClient`] using a custom `Service` stack.
    ///
    /// [`ConfigExt`] provides the layers of the default stack for reuse.
    /// To create the default stack from a [`Config`], use [`RestClient::for_config`].
    ///
    /// # Panics
    ///
    /// Panics when called outside of a Tokio runtime, the request buffer is driven by a spawned task.
    /// [`RestClient::for_config`] reports that case as [`ConfigError::NoRuntime`] instead.
    ///
    /// # Example
    ///
    /// ```rust
    /// # async fn doc() -> Result<(), Box<dyn std::error::Error>> {
    /// use aggregator_client::{client::{Body, ClientContentConfig, ConfigExt}, Config, RestClient};
    /// use aggregator_client::core::{DirectCodecFactory, GroupVersion};
    /// use hyper_util::{client::legacy::{connect::HttpConnector, Client}, rt::TokioExecutor};
    /// use tower::ServiceBuilder;
    ///
    /// let config = Config::new("http://127.0.0.1:8001".parse()?);
    /// let service = ServiceBuilder::new()
    ///     .layer(config.base_uri_layer())
    ///     .option_layer(config.auth_layer()?)
    ///     .service(Client::builder(TokioExecutor::new()).build::<_, Body>(HttpConnector::new()));
    /// let content = ClientContentConfig {
    ///     api_path: "/apis".into(),
    ///     group_version: GroupVersion::gv("apiregistration.k8s.io", "v1alpha1"),
    ///     serializer: DirectCodecFactory::default(),
    /// };
    /// let client = RestClient::new(service, content);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new<S, B>(service: S, content: ClientContentConfig) -> Self
    where
        S: Service<Request<Body>, Response = Response<B>> + Send + 'static,
        S::Future: Send + 'static,
        S::Error: Into<BoxError>,
        B: http_body::Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        // Transform response body to `Body` and use type erased error to avoid type parameters.
        let service = MapResponseBodyLayer::new(Body::wrap_body)
            .layer(service)
            .map_err(|e| e.into());
        Self {
            inner: Buffer::new(BoxService::new(service), 1024),
            content: Arc::new(content),
        }
    }

    /// Create a [`RestClient`] with the default stack
    ///
    /// The config must carry a `group_version` and a `negotiated_serializer`,
    /// and a Tokio runtime must be running.
    pub fn for_config(config: &Config) -> Result<Self> {
        Self::try_from(config.clone())
    }

    /// The content settings of this client
    pub fn content(&self) -> &ClientContentConfig {
        &self.content
    }

    /// The codec used for bodies
    pub fn serializer(&self) -> &DirectCodecFactory {
        &self.content.serializer
    }

    /// The `apiVersion` of the bound group version
    pub fn api_version(&self) -> String {
        self.content.group_version.api_version()
    }

    /// Path prefix of the bound group version, e.g. `/apis/apiregistration.k8s.io/v1alpha1`
    pub fn versioned_api_path(&self) -> String {
        let GroupVersion { group, version } = &self.content.group_version;
        let api_path = self.content.api_path.trim_end_matches('/');
        if group.is_empty() {
            format!("{api_path}/{version}")
        } else {
            format!("{api_path}/{group}/{version}")
        }
    }

    /// Request builder for a cluster scoped resource of the bound group version
    ///
    /// Bodies are sent with the content type of the client's codec.
    pub fn resource(&self, plural: &str) -> RequestBuilder {
        RequestBuilder::new(format!("{}/{}", self.versioned_api_path(), plural))
            .with_content_type(self.content.serializer.content_type())
    }

    /// Perform a raw HTTP request against the API and return the raw response back.
    pub async fn send(&self, request: Request<Body>) -> Result<Response<Body>> {
        let mut svc = self.inner.clone();
        let res = svc
            .ready()
            .await
            .map_err(Error::Service)?
            .call(request)
            .await
            .map_err(|err| {
                // Error decorating request
                err.downcast::<Error>()
                    .map(|e| *e)
                    // Error requesting
                    .or_else(|err| err.downcast::<hyper::Error>().map(|err| Error::HyperError(*err)))
                    // Error from another middleware
                    .unwrap_or_else(Error::Service)
            })?;
        Ok(res)
    }

    /// Perform a raw HTTP request against the API and decode the response with the client's codec
    pub async fn request<T>(&self, request: Request<Vec<u8>>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let text = self.request_text(request).await?;

        self.content.serializer.decode(text.as_bytes()).map_err(|e| {
            tracing::warn!("{}, {:?}", text, e);
            Error::Codec(e)
        })
    }

    /// Perform a raw HTTP request against the API and get back the response
    /// as a string
    pub async fn request_text(&self, request: Request<Vec<u8>>) -> Result<String> {
        let res = self.send(request.map(Body::from)).await?;
        let status = res.status();
        let body_bytes = res.into_body().collect_bytes().await?;
        let text = String::from_utf8(body_bytes.to_vec())?;
        handle_api_errors(&text, status)?;

        Ok(text)
    }

    /// Perform a raw HTTP request against the API and get back either an object
    /// deserialized as JSON or a [`Status`] Object.
    pub async fn request_status<T>(&self, request: Request<Vec<u8>>) -> Result<Either<T, Status>>
    where
        T: DeserializeOwned,
    {
        let text = self.request_text(request).await?;
        // It needs to be JSON:
        let v: Value = serde_json::from_str(&text).map_err(Error::SerdeError)?;
        if v["kind"] == "Status" {
            tracing::trace!("Status from {}", text);
            Ok(Right(serde_json::from_value::<Status>(v).map_err(|e| {
                tracing::warn!("{}, {:?}", text, e);
                Error::SerdeError(e)
            })?))
        } else {
            Ok(Left(serde_json::from_value::<T>(v).map_err(|e| {
                tracing::warn!("{}, {:?}", text, e);
                Error::SerdeError(e)
            })?))
        }
    }

    /// Perform a raw request and get back a stream of [`WatchEvent`] objects
    pub async fn request_events<T>(
        &self,
        request: Request<Vec<u8>>,
    ) -> Result<impl Stream<Item = Result<WatchEvent<T>>>>
    where
        T: Clone + DeserializeOwned,
    {
        let res = self.send(request.map(Body::from)).await?;
        let status = res.status();
        tracing::trace!("headers: {:?}", res.headers());
        if status.is_client_error() || status.is_server_error() {
            let text = String::from_utf8(res.into_body().collect_bytes().await?.to_vec())?;
            return Err(api_error(&text, status));
        }

        let frames = FramedRead::new(
            StreamReader::new(res.into_body().into_data_stream().map_err(|e| {
                // Unexpected EOF from chunked decoder.
                // Tends to happen when watching for 300+s. This will be ignored.
                if e.to_string().contains("unexpected EOF during chunk") {
                    return std::io::Error::new(std::io::ErrorKind::UnexpectedEof, e);
                }
                std::io::Error::other(e)
            })),
            LinesCodec::new(),
        );

        Ok(frames.filter_map(|res| async {
            match res {
                Ok(line) => match serde_json::from_str::<WatchEvent<T>>(&line) {
                    Ok(event) => Some(Ok(event)),
                    Err(e) => {
                        // Ignore EOF error that can happen for incomplete line from `decode_eof`.
                        if e.is_eof() {
                            return None;
                        }

                        // Got general error response
                        if let Ok(e_resp) = serde_json::from_str::<ErrorResponse>(&line) {
                            return Some(Err(Error::Api(e_resp)));
                        }
                        // Parsing error
                        Some(Err(Error::SerdeError(e)))
                    }
                },

                Err(LinesCodecError::Io(e)) => match e.kind() {
                    // Client timeout
                    std::io::ErrorKind::TimedOut => {
                        tracing::warn!("timeout in poll: {}", e); // our client timeout
                        None
                    }
                    // Unexpected EOF from chunked decoder.
                    // Tends to happen after 300+s of watching.
                    std::io::ErrorKind::UnexpectedEof => {
                        tracing::warn!("eof in poll: {}", e);
                        None
                    }
                    _ => Some(Err(Error::ReadEvents(e))),
                },

                // Reached the maximum line length without finding a newline.
                // This should never happen because we're using the default `usize::MAX`.
                Err(LinesCodecError::MaxLineLengthExceeded) => {
                    Some(Err(Error::LinesCodecMaxLineLengthExceeded))
                }
            }
        }))
    }
}

/// Kubernetes returned error handling
///
/// Either the API server returned a `Status` we can decode,
/// or something else that gets wrapped in a reconstructed [`ErrorResponse`].
fn handle_api_errors(text: &str, s: StatusCode) -> Result<()> {
    if s.is_client_error() || s.is_server_error() {
        Err(api_error(text, s))
    } else {
        Ok(())
    }
}

fn api_error(text: &str, s: StatusCode) -> Error {
    if let Ok(errdata) = serde_json::from_str::<ErrorResponse>(text) {
        tracing::debug!("Unsuccessful: {:?}", errdata);
        Error::Api(errdata)
    } else {
        tracing::warn!("Unsuccessful data error parse: {}", text);
        let ae = ErrorResponse {
            status: s.to_string(),
            code: s.as_u16(),
            message: format!("{text:?}"),
            reason: "Failed to parse error data".into(),
            details: None,
        };
        tracing::debug!("Unsuccessful: {:?} (reconstruct)", ae);
        Error::Api(ae)
    }
}

impl TryFrom<Config> for RestClient {
    type Error = Error;

    /// Builds a default [`RestClient`] from a [`Config`], see [`ClientBuilder`] if more customization is required
    fn try_from(config: Config) -> Result<Self> {
        let builder = ClientBuilder::<GenericService>::try_from(config)?;
        tokio::runtime::Handle::try_current().map_err(|_| ConfigError::NoRuntime)?;
        Ok(builder.build())
    }
}

/// Access to the transport of a group client
///
/// Returns `None` when there is no client to ask, such as an unset `Option`.
pub trait RestClientGetter {
    /// The underlying transport
    fn rest_client(&self) -> Option<&RestClient>;
}

impl RestClientGetter for RestClient {
    fn rest_client(&self) -> Option<&RestClient> {
        Some(self)
    }
}

impl<T: RestClientGetter> RestClientGetter for Option<T> {
    fn rest_client(&self) -> Option<&RestClient> {
        self.as_ref().and_then(RestClientGetter::rest_client)
    }
}

impl<T: RestClientGetter + ?Sized> RestClientGetter for &T {
    fn rest_client(&self) -> Option<&RestClient> {
        (**self).rest_client()
    }
}
