use std::time::Duration;

use bytes::Bytes;
use http::{Request, Response, Uri};
use hyper::body::Incoming;
use hyper_timeout::TimeoutConnector;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tower::{util::BoxService, BoxError, Layer, Service, ServiceBuilder};
use tower_http::{classify::ServerErrorsFailureClass, map_response_body::MapResponseBodyLayer, trace::TraceLayer};
use tracing::Span;

use super::{body::Body, ClientContentConfig, ConfigExt, RestClient};
use crate::{error::ConfigError, Config, Error, Result};

/// HTTP body of a dynamic backing type.
///
/// The suggested implementation type is [`crate::client::Body`].
pub type DynBody = dyn http_body::Body<Data = Bytes, Error = BoxError> + Send + Unpin;

/// The type erased default stack
pub type GenericService = BoxService<Request<Body>, Response<Box<DynBody>>, BoxError>;

/// Assembles the tower stack of a [`RestClient`] one layer at a time
///
/// `ClientBuilder::<GenericService>::try_from(config)` starts from the default stack,
/// [`ClientBuilder::new`] from any service.
pub struct ClientBuilder<Svc> {
    service: Svc,
    content: ClientContentConfig,
}

impl<Svc> ClientBuilder<Svc> {
    /// Start from a fully custom [`Service`] bound to `content`
    pub fn new(service: Svc, content: ClientContentConfig) -> Self
    where
        Svc: Service<Request<Body>>,
    {
        Self { service, content }
    }

    /// Wrap the current stack in `layer`
    pub fn with_layer<L: Layer<Svc>>(self, layer: &L) -> ClientBuilder<L::Service> {
        ClientBuilder {
            service: layer.layer(self.service),
            content: self.content,
        }
    }

    /// Finish the stack
    ///
    /// # Panics
    ///
    /// Panics outside of a Tokio runtime, see [`RestClient::new`].
    pub fn build<B>(self) -> RestClient
    where
        Svc: Service<Request<Body>, Response = Response<B>> + Send + 'static,
        Svc::Future: Send + 'static,
        Svc::Error: Into<BoxError>,
        B: http_body::Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        RestClient::new(self.service, self.content)
    }
}

impl TryFrom<Config> for ClientBuilder<GenericService> {
    type Error = Error;

    /// The default stack for `config`
    ///
    /// Fails when the cluster url lacks a scheme or host, when `group_version` or
    /// `negotiated_serializer` are unset, or when credentials and certificates cannot be used.
    fn try_from(config: Config) -> Result<Self> {
        check_cluster_url(&config.cluster_url)?;
        let content = ClientContentConfig::try_from(&config)?;
        tracing::debug!(url = %config.cluster_url, api_path = %content.api_path, "building rest client");

        let service = ServiceBuilder::new()
            .layer(config.base_uri_layer())
            .option_layer(config.auth_layer()?)
            .layer(config.extra_headers_layer()?)
            .layer(
                // Field names follow the OpenTelemetry HTTP client conventions
                TraceLayer::new_for_http()
                    .make_span_with(request_span)
                    .on_response(record_response)
                    .on_failure(record_failure),
            )
            .map_err(BoxError::from)
            .service(http_client(&config)?);

        let service = MapResponseBodyLayer::new(|body| {
            Box::new(http_body_util::BodyExt::map_err(body, BoxError::from)) as Box<DynBody>
        })
        .layer(service);
        Ok(ClientBuilder::new(BoxService::new(service), content))
    }
}

// Requests are joined onto the cluster url, which has to name a server
fn check_cluster_url(url: &Uri) -> Result<(), ConfigError> {
    match (url.scheme(), url.authority()) {
        (Some(_), Some(_)) => Ok(()),
        _ => Err(ConfigError::InvalidClusterUrl(url.clone())),
    }
}

#[cfg(feature = "rustls-tls")]
fn http_client(config: &Config) -> Result<Client<TimeoutConnector<hyper_rustls::HttpsConnector<HttpConnector>>, Body>> {
    let connector = config.rustls_https_connector_with_connector(plain_connector())?;
    Ok(with_timeouts(config, connector))
}

#[cfg(not(feature = "rustls-tls"))]
fn http_client(config: &Config) -> Result<Client<TimeoutConnector<HttpConnector>, Body>> {
    if config.cluster_url.scheme() == Some(&http::uri::Scheme::HTTPS) {
        return Err(Error::TlsRequired);
    }
    Ok(with_timeouts(config, plain_connector()))
}

fn plain_connector() -> HttpConnector {
    let mut connector = HttpConnector::new();
    connector.enforce_http(false);
    connector
}

fn with_timeouts<C>(config: &Config, connector: C) -> Client<TimeoutConnector<C>, Body>
where
    C: tower::Service<http::Uri> + Send,
    C::Response: hyper::rt::Read + hyper::rt::Write + Send + Unpin,
    C::Future: Send + 'static,
    C::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    TimeoutConnector<C>: hyper_util::client::legacy::connect::Connect + Clone + Send + Sync + 'static,
{
    let mut connector = TimeoutConnector::new(connector);
    connector.set_connect_timeout(config.connect_timeout);
    connector.set_read_timeout(config.read_timeout);
    connector.set_write_timeout(config.write_timeout);
    Client::builder(TokioExecutor::new()).build(connector)
}

fn request_span(req: &Request<Body>) -> Span {
    tracing::debug_span!(
        "HTTP",
        http.method = %req.method(),
        http.url = %req.uri(),
        http.status_code = tracing::field::Empty,
        otel.name = req.extensions().get::<&'static str>().unwrap_or(&"HTTP"),
        otel.kind = "client",
        otel.status_code = tracing::field::Empty,
    )
}

fn record_response(res: &Response<Incoming>, _latency: Duration, span: &Span) {
    let status = res.status();
    span.record("http.status_code", status.as_u16());
    if status.is_client_error() || status.is_server_error() {
        span.record("otel.status_code", "ERROR");
    }
}

fn record_failure(class: ServerErrorsFailureClass, _latency: Duration, span: &Span) {
    span.record("otel.status_code", "ERROR");
    match class {
        ServerErrorsFailureClass::StatusCode(status) => {
            span.record("http.status_code", status.as_u16());
            tracing::error!("failed with status {}", status)
        }
        ServerErrorsFailureClass::Error(err) => tracing::error!("failed with error {}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aggregator_core::{DirectCodecFactory, GroupVersion};
    use secrecy::SecretString;

    fn content_config(url: &str) -> Config {
        let mut config = Config::new(url.parse().unwrap());
        config.api_path = "/apis".into();
        config.group_version = Some(GroupVersion::gv("apiregistration.k8s.io", "v1alpha1"));
        config.negotiated_serializer = Some(DirectCodecFactory::default());
        config
    }

    #[tokio::test]
    async fn default_stack_builds() {
        let client = ClientBuilder::<GenericService>::try_from(content_config("http://127.0.0.1:8080"))
            .unwrap()
            .build();
        assert_eq!(client.api_version(), "apiregistration.k8s.io/v1alpha1");
    }

    #[test]
    fn requires_content_settings() {
        let mut config = content_config("http://127.0.0.1:8080");
        config.negotiated_serializer = None;
        assert!(matches!(
            ClientBuilder::<GenericService>::try_from(config),
            Err(Error::Config(ConfigError::MissingSerializer))
        ));

        let mut config = content_config("http://127.0.0.1:8080");
        config.group_version = None;
        assert!(matches!(
            ClientBuilder::<GenericService>::try_from(config),
            Err(Error::Config(ConfigError::MissingGroupVersion))
        ));
    }

    #[test]
    fn cluster_url_needs_scheme_and_host() {
        for url in ["localhost:8001", "/apis"] {
            assert!(
                matches!(
                    ClientBuilder::<GenericService>::try_from(content_config(url)),
                    Err(Error::Config(ConfigError::InvalidClusterUrl(_)))
                ),
                "{url} was accepted"
            );
        }
        assert!(check_cluster_url(&Uri::from_static("https://10.0.0.1:6443/prefix")).is_ok());
    }

    #[test]
    fn unusable_token_fails_the_build() {
        let mut config = content_config("https://10.0.0.1:6443");
        config.auth_info.token = Some(SecretString::from("bad\ntoken"));
        assert!(matches!(
            ClientBuilder::<GenericService>::try_from(config),
            Err(Error::Auth(_))
        ));
    }
}
