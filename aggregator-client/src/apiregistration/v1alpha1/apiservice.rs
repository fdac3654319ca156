use either::Either;
use futures::Stream;
use serde::Serialize;

use aggregator_core::{
    apiregistration::v1alpha1::APIService,
    object::ObjectList,
    params::{DeleteParams, ListParams, Patch, PatchParams, PostParams},
    request::Request as RequestBuilder,
    response::Status,
    ErrorResponse, Resource, ResourceExt, WatchEvent,
};

use crate::{Error, RestClient, Result};

/// Subresource holding the observed state
const STATUS: &str = "status";

/// Client for the cluster scoped `apiservices` resource
///
/// Obtained from [`ApiServicesGetter::api_services`](super::ApiServicesGetter::api_services).
#[derive(Clone, Debug)]
pub struct ApiServices {
    client: RestClient,
    request: RequestBuilder,
}

impl ApiServices {
    pub(crate) fn new(client: RestClient) -> Self {
        let request = client.resource(APIService::PLURAL);
        Self { client, request }
    }

    /// Create an `APIService`
    ///
    /// The returned object is what the API server persisted.
    pub async fn create(&self, pp: &PostParams, data: &APIService) -> Result<APIService> {
        let body = self.encode(data)?;
        let mut req = self.request.create(pp, body).map_err(Error::BuildRequest)?;
        req.extensions_mut().insert("create");
        self.client.request::<APIService>(req).await
    }

    /// Replace an `APIService`, named by its metadata
    ///
    /// The object needs `metadata.resourceVersion` set to guard against lost updates.
    pub async fn update(&self, pp: &PostParams, data: &APIService) -> Result<APIService> {
        let body = self.encode(data)?;
        let mut req = self
            .request
            .replace(data.name().unwrap_or_default(), pp, body)
            .map_err(Error::BuildRequest)?;
        req.extensions_mut().insert("update");
        self.client.request::<APIService>(req).await
    }

    /// Replace the `status` subresource of an `APIService`
    pub async fn update_status(&self, pp: &PostParams, data: &APIService) -> Result<APIService> {
        let body = self.encode(data)?;
        let mut req = self
            .request
            .replace_subresource(STATUS, data.name().unwrap_or_default(), pp, body)
            .map_err(Error::BuildRequest)?;
        req.extensions_mut().insert("update_status");
        self.client.request::<APIService>(req).await
    }

    /// Delete a named `APIService`
    ///
    /// Returns the object while deletion is pending, or a [`Status`] once it is gone.
    pub async fn delete(&self, name: &str, dp: &DeleteParams) -> Result<Either<APIService, Status>> {
        let mut req = self.request.delete(name, dp).map_err(Error::BuildRequest)?;
        req.extensions_mut().insert("delete");
        self.client.request_status::<APIService>(req).await
    }

    /// Delete every `APIService` matched by `lp`
    pub async fn delete_collection(
        &self,
        dp: &DeleteParams,
        lp: &ListParams,
    ) -> Result<Either<ObjectList<APIService>, Status>> {
        let mut req = self
            .request
            .delete_collection(dp, lp)
            .map_err(Error::BuildRequest)?;
        req.extensions_mut().insert("delete_collection");
        self.client.request_status::<ObjectList<APIService>>(req).await
    }

    /// Get a named `APIService`
    ///
    /// # Errors
    ///
    /// A missing object is an [`Error::Api`] with reason `NotFound`.
    /// Use [`ApiServices::get_opt`] to treat that as `None`.
    pub async fn get(&self, name: &str) -> Result<APIService> {
        let mut req = self.request.get(name).map_err(Error::BuildRequest)?;
        req.extensions_mut().insert("get");
        self.client.request::<APIService>(req).await
    }

    /// Get a named `APIService` if it exists
    pub async fn get_opt(&self, name: &str) -> Result<Option<APIService>> {
        match self.get(name).await {
            Ok(obj) => Ok(Some(obj)),
            Err(Error::Api(ErrorResponse { reason, .. })) if &reason == "NotFound" => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// List `APIService` objects matched by `lp`
    pub async fn list(&self, lp: &ListParams) -> Result<ObjectList<APIService>> {
        let mut req = self.request.list(lp).map_err(Error::BuildRequest)?;
        req.extensions_mut().insert("list");
        self.client.request::<ObjectList<APIService>>(req).await
    }

    /// Watch `APIService` objects from `version` onwards
    ///
    /// The stream ends when the server closes the watch, at the latest after `lp.timeout`.
    pub async fn watch(
        &self,
        lp: &ListParams,
        version: &str,
    ) -> Result<impl Stream<Item = Result<WatchEvent<APIService>>>> {
        let mut req = self.request.watch(lp, version).map_err(Error::BuildRequest)?;
        req.extensions_mut().insert("watch");
        self.client.request_events::<APIService>(req).await
    }

    /// Patch a named `APIService`
    pub async fn patch<P: Serialize>(
        &self,
        name: &str,
        pp: &PatchParams,
        patch: &Patch<P>,
    ) -> Result<APIService> {
        let mut req = self.request.patch(name, pp, patch).map_err(Error::BuildRequest)?;
        req.extensions_mut().insert("patch");
        self.client.request::<APIService>(req).await
    }

    fn encode(&self, data: &APIService) -> Result<Vec<u8>> {
        self.client.serializer().encode_object(data).map_err(Error::Codec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Body, ClientContentConfig};
    use aggregator_core::{
        apiregistration::v1alpha1::{scheme_group_version, APIServiceSpec},
        metadata::ObjectMeta,
        response::StatusExt,
        DirectCodecFactory,
    };
    use anyhow::Result;
    use futures::TryStreamExt;
    use http::{Request, Response};
    use serde_json::json;

    type ApiServerHandle = tower_test::mock::Handle<Request<Body>, Response<Body>>;
    struct ApiServerVerifier(ApiServerHandle);

    fn testcontext() -> (ApiServices, ApiServerVerifier) {
        let (mock_service, handle) = tower_test::mock::pair::<Request<Body>, Response<Body>>();
        let content = ClientContentConfig {
            api_path: "/apis".into(),
            group_version: scheme_group_version(),
            serializer: DirectCodecFactory::default(),
        };
        let client = RestClient::new(mock_service, content);
        (ApiServices::new(client), ApiServerVerifier(handle))
    }

    async fn timeout_after_1s(handle: tokio::task::JoinHandle<()>) {
        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .expect("timeout on mock apiserver")
            .expect("scenario succeeded")
    }

    fn metrics_service() -> APIService {
        APIService {
            metadata: ObjectMeta {
                name: Some("v1alpha1.metrics.example.com".into()),
                resource_version: Some("10".into()),
                ..ObjectMeta::default()
            },
            spec: APIServiceSpec {
                group: "metrics.example.com".into(),
                version: "v1alpha1".into(),
                priority: 100,
                ..APIServiceSpec::default()
            },
            status: None,
        }
    }

    fn json_response(status: u16, body: serde_json::Value) -> Response<Body> {
        Response::builder()
            .status(status)
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    impl ApiServerVerifier {
        async fn next(&mut self) -> (Request<Body>, tower_test::mock::SendResponse<Response<Body>>) {
            self.0.next_request().await.expect("service not called")
        }

        async fn handle_create(mut self) -> Result<Self> {
            let (request, send) = self.next().await;
            assert_eq!(request.method(), http::Method::POST);
            assert_eq!(
                request.uri().to_string(),
                "/apis/apiregistration.k8s.io/v1alpha1/apiservices?&fieldManager=tests"
            );
            assert_eq!(request.headers()["content-type"], "application/json");
            let body = request.into_body().collect_bytes().await?;
            let sent: serde_json::Value = serde_json::from_slice(&body)?;
            assert_eq!(sent["apiVersion"], "apiregistration.k8s.io/v1alpha1");
            assert_eq!(sent["kind"], "APIService");
            assert_eq!(sent["spec"]["priority"], 100);
            send.send_response(json_response(201, sent));
            Ok(self)
        }

        async fn handle_update_status(mut self) -> Result<Self> {
            let (request, send) = self.next().await;
            assert_eq!(request.method(), http::Method::PUT);
            assert_eq!(
                request.uri().to_string(),
                "/apis/apiregistration.k8s.io/v1alpha1/apiservices/v1alpha1.metrics.example.com/status?"
            );
            let body = request.into_body().collect_bytes().await?;
            let mut sent: serde_json::Value = serde_json::from_slice(&body)?;
            sent["metadata"]["resourceVersion"] = json!("11");
            send.send_response(json_response(200, sent));
            Ok(self)
        }

        async fn handle_not_found(mut self) -> Result<Self> {
            let (request, send) = self.next().await;
            assert_eq!(request.method(), http::Method::GET);
            assert_eq!(
                request.uri().to_string(),
                "/apis/apiregistration.k8s.io/v1alpha1/apiservices/v1alpha1.missing.example.com"
            );
            send.send_response(json_response(
                404,
                json!({
                    "kind": "Status",
                    "apiVersion": "v1",
                    "status": "Failure",
                    "message": "apiservices.apiregistration.k8s.io \"v1alpha1.missing.example.com\" not found",
                    "reason": "NotFound",
                    "code": 404
                }),
            ));
            Ok(self)
        }

        async fn handle_list(mut self) -> Result<Self> {
            let (request, send) = self.next().await;
            assert_eq!(request.method(), http::Method::GET);
            assert_eq!(
                request.uri().to_string(),
                "/apis/apiregistration.k8s.io/v1alpha1/apiservices?&labelSelector=app%3Dmetrics"
            );
            send.send_response(json_response(
                200,
                json!({
                    "kind": "APIServiceList",
                    "apiVersion": "apiregistration.k8s.io/v1alpha1",
                    "metadata": { "resourceVersion": "12" },
                    "items": [metrics_service()]
                }),
            ));
            Ok(self)
        }

        async fn handle_delete(mut self) -> Result<Self> {
            let (request, send) = self.next().await;
            assert_eq!(request.method(), http::Method::DELETE);
            let body = request.into_body().collect_bytes().await?;
            assert_eq!(&body[..], br#"{"propagationPolicy":"Foreground"}"#);
            send.send_response(json_response(
                200,
                json!({
                    "kind": "Status",
                    "apiVersion": "v1",
                    "status": "Success",
                    "details": { "name": "v1alpha1.metrics.example.com", "group": "apiregistration.k8s.io", "kind": "apiservices" }
                }),
            ));
            Ok(self)
        }

        async fn handle_get(mut self) -> Result<Self> {
            let (request, send) = self.next().await;
            assert_eq!(request.method(), http::Method::GET);
            assert_eq!(
                request.uri().to_string(),
                "/apis/apiregistration.k8s.io/v1alpha1/apiservices/v1alpha1.metrics.example.com"
            );
            send.send_response(json_response(200, json!(metrics_service())));
            Ok(self)
        }

        async fn handle_update(mut self) -> Result<Self> {
            let (request, send) = self.next().await;
            assert_eq!(request.method(), http::Method::PUT);
            assert_eq!(
                request.uri().to_string(),
                "/apis/apiregistration.k8s.io/v1alpha1/apiservices/v1alpha1.metrics.example.com?&dryRun=All"
            );
            assert_eq!(request.headers()["content-type"], "application/json");
            let body = request.into_body().collect_bytes().await?;
            let mut sent: serde_json::Value = serde_json::from_slice(&body)?;
            assert_eq!(sent["metadata"]["resourceVersion"], "10");
            assert_eq!(sent["spec"]["priority"], 150);
            sent["metadata"]["resourceVersion"] = json!("14");
            send.send_response(json_response(200, sent));
            Ok(self)
        }

        async fn handle_patch(mut self) -> Result<Self> {
            let (request, send) = self.next().await;
            assert_eq!(request.method(), http::Method::PATCH);
            assert_eq!(
                request.uri().to_string(),
                "/apis/apiregistration.k8s.io/v1alpha1/apiservices/v1alpha1.metrics.example.com?&fieldManager=tests"
            );
            assert_eq!(request.headers()["content-type"], "application/merge-patch+json");
            let body = request.into_body().collect_bytes().await?;
            let sent: serde_json::Value = serde_json::from_slice(&body)?;
            assert_eq!(sent, json!({ "spec": { "priority": 200 } }));

            let mut patched = json!(metrics_service());
            patched["spec"]["priority"] = json!(200);
            send.send_response(json_response(200, patched));
            Ok(self)
        }

        async fn handle_delete_collection(mut self) -> Result<Self> {
            let (request, send) = self.next().await;
            assert_eq!(request.method(), http::Method::DELETE);
            assert_eq!(
                request.uri().to_string(),
                "/apis/apiregistration.k8s.io/v1alpha1/apiservices?&labelSelector=app%3Dmetrics"
            );
            let body = request.into_body().collect_bytes().await?;
            assert_eq!(&body[..], br#"{"propagationPolicy":"Background"}"#);
            send.send_response(json_response(
                200,
                json!({
                    "kind": "APIServiceList",
                    "apiVersion": "apiregistration.k8s.io/v1alpha1",
                    "metadata": { "resourceVersion": "15" },
                    "items": [metrics_service()]
                }),
            ));
            Ok(self)
        }

        async fn handle_watch(mut self) -> Result<Self> {
            let (request, send) = self.next().await;
            assert_eq!(
                request.uri().to_string(),
                "/apis/apiregistration.k8s.io/v1alpha1/apiservices?&watch=true&resourceVersion=12&timeoutSeconds=290"
            );
            let added = json!({ "type": "ADDED", "object": metrics_service() });
            let bookmark = json!({
                "type": "BOOKMARK",
                "object": {
                    "kind": "APIService",
                    "apiVersion": "apiregistration.k8s.io/v1alpha1",
                    "metadata": { "resourceVersion": "13" }
                }
            });
            let lines = format!("{added}\n{bookmark}\n");
            send.send_response(Response::builder().body(Body::from(lines.into_bytes()))?);
            Ok(self)
        }
    }

    #[tokio::test]
    async fn create_encodes_type_information() {
        let (api, fakeserver) = testcontext();
        let mocksrv = tokio::spawn(async move {
            fakeserver.handle_create().await.expect("scenario completed without errors");
        });

        let pp = PostParams {
            field_manager: Some("tests".into()),
            ..PostParams::default()
        };
        let created = api.create(&pp, &metrics_service()).await.unwrap();
        assert_eq!(created.name_any(), "v1alpha1.metrics.example.com");
        timeout_after_1s(mocksrv).await;
    }

    #[tokio::test]
    async fn update_status_targets_subresource() {
        let (api, fakeserver) = testcontext();
        let mocksrv = tokio::spawn(async move {
            fakeserver
                .handle_update_status()
                .await
                .expect("scenario completed without errors");
        });

        let updated = api
            .update_status(&PostParams::default(), &metrics_service())
            .await
            .unwrap();
        assert_eq!(updated.resource_version(), Some("11"));
        timeout_after_1s(mocksrv).await;
    }

    #[tokio::test]
    async fn update_requires_a_name() {
        let (api, _fakeserver) = testcontext();
        let err = api
            .update(&PostParams::default(), &APIService::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BuildRequest(_)));
    }

    #[tokio::test]
    async fn get_opt_maps_not_found() {
        let (api, fakeserver) = testcontext();
        let mocksrv = tokio::spawn(async move {
            fakeserver
                .handle_not_found()
                .await
                .expect("scenario completed without errors");
        });

        let missing = api.get_opt("v1alpha1.missing.example.com").await.unwrap();
        assert!(missing.is_none());
        timeout_after_1s(mocksrv).await;
    }

    #[tokio::test]
    async fn list_then_delete() {
        let (api, fakeserver) = testcontext();
        let mocksrv = tokio::spawn(async move {
            fakeserver
                .handle_list()
                .await
                .unwrap()
                .handle_delete()
                .await
                .expect("scenario completed without errors");
        });

        let list = api.list(&ListParams::default().labels("app=metrics")).await.unwrap();
        assert_eq!(list.metadata.resource_version.as_deref(), Some("12"));
        let names: Vec<_> = list.iter().map(ResourceExt::name_any).collect();
        assert_eq!(names, vec!["v1alpha1.metrics.example.com"]);

        let deleted = api
            .delete(&names[0], &DeleteParams::foreground())
            .await
            .unwrap();
        let status = deleted.right().expect("deleted immediately");
        assert!(status.is_success());
        timeout_after_1s(mocksrv).await;
    }

    #[tokio::test]
    async fn watch_streams_events() {
        let (api, fakeserver) = testcontext();
        let mocksrv = tokio::spawn(async move {
            fakeserver.handle_watch().await.expect("scenario completed without errors");
        });

        let stream = api.watch(&ListParams::default(), "12").await.unwrap();
        let events: Vec<_> = stream.try_collect().await.unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], WatchEvent::Added(svc) if svc.spec.priority == 100));
        assert!(matches!(&events[1], WatchEvent::Bookmark(b) if b.metadata.resource_version == "13"));
        timeout_after_1s(mocksrv).await;
    }

    #[tokio::test]
    async fn get_returns_the_object() {
        let (api, fakeserver) = testcontext();
        let mocksrv = tokio::spawn(async move {
            fakeserver.handle_get().await.expect("scenario completed without errors");
        });

        let svc = api.get("v1alpha1.metrics.example.com").await.unwrap();
        assert_eq!(svc.spec.group, "metrics.example.com");
        assert_eq!(svc.resource_version(), Some("10"));
        timeout_after_1s(mocksrv).await;
    }

    #[tokio::test]
    async fn update_puts_to_the_named_object() {
        let (api, fakeserver) = testcontext();
        let mocksrv = tokio::spawn(async move {
            fakeserver.handle_update().await.expect("scenario completed without errors");
        });

        let mut svc = metrics_service();
        svc.spec.priority = 150;
        let pp = PostParams {
            dry_run: true,
            ..PostParams::default()
        };
        let updated = api.update(&pp, &svc).await.unwrap();
        assert_eq!(updated.resource_version(), Some("14"));
        assert_eq!(updated.spec.priority, 150);
        timeout_after_1s(mocksrv).await;
    }

    #[tokio::test]
    async fn patch_sends_merge_patch() {
        let (api, fakeserver) = testcontext();
        let mocksrv = tokio::spawn(async move {
            fakeserver.handle_patch().await.expect("scenario completed without errors");
        });

        let pp = PatchParams {
            field_manager: Some("tests".into()),
            ..PatchParams::default()
        };
        let patch = Patch::Merge(json!({ "spec": { "priority": 200 } }));
        let patched = api
            .patch("v1alpha1.metrics.example.com", &pp, &patch)
            .await
            .unwrap();
        assert_eq!(patched.spec.priority, 200);
        timeout_after_1s(mocksrv).await;
    }

    #[tokio::test]
    async fn delete_collection_returns_pending_objects() {
        let (api, fakeserver) = testcontext();
        let mocksrv = tokio::spawn(async move {
            fakeserver
                .handle_delete_collection()
                .await
                .expect("scenario completed without errors");
        });

        let lp = ListParams::default().labels("app=metrics");
        let pending = api
            .delete_collection(&DeleteParams::background(), &lp)
            .await
            .unwrap()
            .left()
            .expect("objects still finalizing");
        assert_eq!(pending.metadata.resource_version.as_deref(), Some("15"));
        assert_eq!(pending.items.len(), 1);
        timeout_after_1s(mocksrv).await;
    }
}
