use std::{
    sync::Arc,
    task::{Context, Poll},
};

use http::{header::HeaderName, request::Request, HeaderValue};
use tower::{Layer, Service};

/// Layer that adds a static set of extra headers to each request
#[derive(Clone, Debug)]
pub struct ExtraHeadersLayer {
    pub(crate) headers: Arc<Vec<(HeaderName, HeaderValue)>>,
}

impl ExtraHeadersLayer {
    /// Add `headers` to every request, keeping headers a request already carries
    pub fn new(headers: Vec<(HeaderName, HeaderValue)>) -> Self {
        Self {
            headers: Arc::new(headers),
        }
    }
}

impl<S> Layer<S> for ExtraHeadersLayer {
    type Service = ExtraHeaders<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ExtraHeaders {
            inner,
            headers: self.headers.clone(),
        }
    }
}

/// Service that adds a static set of extra headers to each request
#[derive(Clone, Debug)]
pub struct ExtraHeaders<S> {
    inner: S,
    headers: Arc<Vec<(HeaderName, HeaderValue)>>,
}

impl<S, ReqBody> Service<Request<ReqBody>> for ExtraHeaders<S>
where
    S: Service<Request<ReqBody>>,
{
    type Error = S::Error;
    type Future = S::Future;
    type Response = S::Response;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let headers = req.headers_mut();
        for (name, value) in self.headers.iter() {
            // single valued headers set by the caller win, list valued ones accumulate
            if name == http::header::USER_AGENT || name == http::header::ACCEPT {
                headers.entry(name).or_insert_with(|| value.clone());
            } else {
                headers.append(name, value.clone());
            }
        }
        self.inner.call(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::pin_mut;
    use http::{header::USER_AGENT, Response};
    use tokio_test::assert_ready_ok;
    use tower_test::mock;

    #[tokio::test(flavor = "current_thread")]
    async fn adds_headers_without_clobbering() {
        let layer = ExtraHeadersLayer::new(vec![
            (USER_AGENT, HeaderValue::from_static("default-agent")),
            (
                HeaderName::from_static("impersonate-group"),
                HeaderValue::from_static("system:masters"),
            ),
        ]);
        let (mut service, handle) = mock::spawn_layer::<Request<()>, Response<()>, _>(layer);

        let spawned = tokio::spawn(async move {
            pin_mut!(handle);
            let (request, send) = handle.next_request().await.expect("service not called");
            assert_eq!(request.headers()[USER_AGENT], "custom-agent");
            let groups: Vec<_> = request.headers().get_all("impersonate-group").iter().collect();
            assert_eq!(groups, vec!["viewers", "system:masters"]);
            send.send_response(Response::new(()));
        });

        assert_ready_ok!(service.poll_ready());
        let req = Request::builder()
            .header(USER_AGENT, "custom-agent")
            .header("impersonate-group", "viewers")
            .body(())
            .unwrap();
        service.call(req).await.unwrap();
        spawned.await.unwrap();
    }
}
