//! Make requests relative to the cluster url.
use futures::future::{self, Either, ErrInto, Ready, TryFutureExt};
use http::{uri, Request, Uri};
use tower::{BoxError, Layer, Service};

use crate::Error;

/// Layer that applies [`BaseUri`] which makes all requests relative to the URI.
///
/// Path in the base URI is preserved.
#[derive(Debug, Clone)]
pub struct BaseUriLayer {
    base_uri: Uri,
}

impl BaseUriLayer {
    /// Set base URI of requests.
    pub fn new(base_uri: Uri) -> Self {
        Self { base_uri }
    }
}

impl<S> Layer<S> for BaseUriLayer {
    type Service = BaseUri<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BaseUri {
            base_uri: self.base_uri.clone(),
            inner,
        }
    }
}

/// Middleware that rewrites request uris to sit under a base URI.
///
/// A request whose uri cannot be joined fails with [`Error::HttpError`] without reaching the inner service.
#[derive(Debug, Clone)]
pub struct BaseUri<S> {
    base_uri: Uri,
    inner: S,
}

impl<S, ReqBody> Service<Request<ReqBody>> for BaseUri<S>
where
    S: Service<Request<ReqBody>>,
    S::Error: Into<BoxError>,
{
    type Error = BoxError;
    type Future = Either<Ready<Result<S::Response, BoxError>>, ErrInto<S::Future, BoxError>>;
    type Response = S::Response;

    fn poll_ready(&mut self, cx: &mut std::task::Context<'_>) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        match join(&self.base_uri, req.uri().path_and_query()) {
            Ok(joined) => {
                *req.uri_mut() = joined;
                Either::Right(self.inner.call(req).err_into())
            }
            Err(err) => Either::Left(future::ready(Err(Error::HttpError(err).into()))),
        }
    }
}

// Keeps scheme and authority of the base, appends the request path to the base path.
fn join(base_uri: &Uri, req_pandq: Option<&uri::PathAndQuery>) -> Result<Uri, http::Error> {
    let mut parts = base_uri.clone().into_parts();
    parts.path_and_query = match (base_uri.path_and_query(), req_pandq) {
        (Some(base), Some(req)) => {
            // `PathAndQuery` always starts with a slash
            Some(format!("{}{}", base.path().trim_end_matches('/'), req).parse()?)
        }
        (Some(base), None) => Some(base.clone()),
        (None, req) => req.cloned(),
    };
    Ok(Uri::from_parts(parts)?)
}
