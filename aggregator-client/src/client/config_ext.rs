use std::sync::Arc;

use http::{
    header::{HeaderName, ACCEPT, USER_AGENT},
    HeaderValue,
};
#[cfg(feature = "rustls-tls")]
use hyper_util::client::legacy::connect::HttpConnector;
use secrecy::ExposeSecret;

#[cfg(feature = "rustls-tls")] use super::tls;
use super::{
    auth::Auth,
    middleware::{AddAuthorizationLayer, AuthLayer, BaseUriLayer, ExtraHeadersLayer},
};
use crate::{config::default_user_agent, Config, Error, Result};

/// Extensions to [`Config`](crate::Config) for building a custom [`RestClient`](crate::RestClient) stack.
///
/// See [`RestClient::new`](crate::RestClient::new) for an example.
///
/// This trait is sealed and cannot be implemented.
pub trait ConfigExt: private::Sealed {
    /// Layer to set the base URI of requests to the configured server.
    fn base_uri_layer(&self) -> BaseUriLayer;

    /// Optional layer to set up `Authorization` header depending on the config.
    fn auth_layer(&self) -> Result<Option<AuthLayer>>;

    /// Layer to add `User-Agent`, `Accept` and impersonation headers depending on the config.
    fn extra_headers_layer(&self) -> Result<ExtraHeadersLayer>;

    /// Create [`hyper_rustls::HttpsConnector`] based on config.
    ///
    /// Plain `http` urls are still allowed through the returned connector.
    #[cfg_attr(docsrs, doc(cfg(feature = "rustls-tls")))]
    #[cfg(feature = "rustls-tls")]
    fn rustls_https_connector(&self) -> Result<hyper_rustls::HttpsConnector<HttpConnector>>;

    /// Wrap `connector` in a [`hyper_rustls::HttpsConnector`] based on config.
    ///
    /// Plain `http` urls are passed through to `connector` untouched.
    #[cfg_attr(docsrs, doc(cfg(feature = "rustls-tls")))]
    #[cfg(feature = "rustls-tls")]
    fn rustls_https_connector_with_connector<H>(&self, connector: H) -> Result<hyper_rustls::HttpsConnector<H>>;

    /// Create [`rustls::ClientConfig`] based on config.
    #[cfg_attr(docsrs, doc(cfg(feature = "rustls-tls")))]
    #[cfg(feature = "rustls-tls")]
    fn rustls_client_config(&self) -> Result<rustls::ClientConfig>;
}

mod private {
    pub trait Sealed {}
    impl Sealed for super::Config {}
}

impl ConfigExt for Config {
    fn base_uri_layer(&self) -> BaseUriLayer {
        BaseUriLayer::new(self.cluster_url.clone())
    }

    fn auth_layer(&self) -> Result<Option<AuthLayer>> {
        Ok(match Auth::try_from(&self.auth_info).map_err(Error::Auth)? {
            Auth::None => None,
            Auth::Basic(user, pass) => Some(AuthLayer(
                AddAuthorizationLayer::basic(&user, pass.expose_secret()).as_sensitive(true),
            )),
            Auth::Bearer(token) => Some(AuthLayer(
                AddAuthorizationLayer::bearer(token.expose_secret()).as_sensitive(true),
            )),
        })
    }

    fn extra_headers_layer(&self) -> Result<ExtraHeadersLayer> {
        let user_agent = match self.user_agent.as_deref() {
            Some(ua) if !ua.is_empty() => ua.to_owned(),
            _ => default_user_agent(),
        };
        let mut headers = vec![(USER_AGENT, header_value(&user_agent)?)];
        if let Some(codec) = &self.negotiated_serializer {
            headers.push((ACCEPT, HeaderValue::from_static(codec.content_type())));
        }
        if let Some(impersonate_user) = &self.auth_info.impersonate {
            headers.push((
                HeaderName::from_static("impersonate-user"),
                header_value(impersonate_user)?,
            ));
        }
        for group in self.auth_info.impersonate_groups.iter().flatten() {
            headers.push((HeaderName::from_static("impersonate-group"), header_value(group)?));
        }
        Ok(ExtraHeadersLayer {
            headers: Arc::new(headers),
        })
    }

    #[cfg(feature = "rustls-tls")]
    fn rustls_client_config(&self) -> Result<rustls::ClientConfig> {
        tls::rustls_tls::rustls_client_config(
            self.identity_pem().as_deref(),
            self.root_cert.as_deref(),
            self.accept_invalid_certs,
        )
        .map_err(Error::RustlsTls)
    }

    #[cfg(feature = "rustls-tls")]
    fn rustls_https_connector(&self) -> Result<hyper_rustls::HttpsConnector<HttpConnector>> {
        let mut connector = HttpConnector::new();
        connector.enforce_http(false);
        self.rustls_https_connector_with_connector(connector)
    }

    #[cfg(feature = "rustls-tls")]
    fn rustls_https_connector_with_connector<H>(&self, connector: H) -> Result<hyper_rustls::HttpsConnector<H>> {
        Ok(hyper_rustls::HttpsConnectorBuilder::new()
            .with_tls_config(self.rustls_client_config()?)
            .https_or_http()
            .enable_http1()
            .wrap_connector(connector))
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(http::Error::from)
        .map_err(Error::HttpError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aggregator_core::DirectCodecFactory;
    use secrecy::SecretString;

    fn config() -> Config {
        Config::new("https://10.0.0.1".parse().unwrap())
    }

    fn header<'a>(layer: &'a ExtraHeadersLayer, name: &str) -> Vec<&'a str> {
        layer
            .headers
            .iter()
            .filter(|(n, _)| n == name)
            .filter_map(|(_, v)| v.to_str().ok())
            .collect()
    }

    #[test]
    fn user_agent_falls_back_to_default() {
        let mut config = config();
        config.user_agent = Some(String::new());
        let layer = config.extra_headers_layer().unwrap();
        assert_eq!(header(&layer, "user-agent"), vec![default_user_agent().as_str()]);
        assert!(header(&layer, "accept").is_empty());
    }

    #[test]
    fn impersonation_and_accept_headers() {
        let mut config = config();
        config.user_agent = Some("custom/v1".into());
        config.negotiated_serializer = Some(DirectCodecFactory::default());
        config.auth_info.impersonate = Some("jane".into());
        config.auth_info.impersonate_groups = Some(vec!["a".into(), "b".into()]);
        let layer = config.extra_headers_layer().unwrap();
        assert_eq!(header(&layer, "user-agent"), vec!["custom/v1"]);
        assert_eq!(header(&layer, "accept"), vec!["application/json"]);
        assert_eq!(header(&layer, "impersonate-user"), vec!["jane"]);
        assert_eq!(header(&layer, "impersonate-group"), vec!["a", "b"]);
    }

    #[test]
    fn invalid_header_values_are_errors() {
        let mut config = config();
        config.auth_info.impersonate = Some("bad\nuser".into());
        assert!(matches!(config.extra_headers_layer(), Err(Error::HttpError(_))));
    }

    #[test]
    fn auth_layer_from_credentials() {
        let mut config = config();
        assert!(config.auth_layer().unwrap().is_none());
        config.auth_info.token = Some(SecretString::from("token"));
        assert!(config.auth_layer().unwrap().is_some());
        config.auth_info.token = Some(SecretString::from("bad\ntoken"));
        assert!(matches!(config.auth_layer(), Err(Error::Auth(_))));
    }

    #[cfg(feature = "rustls-tls")]
    #[test]
    fn rustls_connector_from_roots() {
        let mut config = config();
        assert!(config.rustls_https_connector().is_ok());
        config.root_cert = Some(vec![b"not a certificate".to_vec()]);
        assert!(config.rustls_https_connector().is_err());
    }
}
