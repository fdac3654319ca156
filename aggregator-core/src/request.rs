//! Builders for the HTTP requests of a cluster scoped resource
//!
//! [`Request`] only produces `http::Request<Vec<u8>>` values. Sending them is left to the client.
use http::{header, Method};
use thiserror::Error;

use crate::{
    codec::JSON_MEDIA_TYPE,
    params::{DeleteParams, ListParams, Patch, PatchParams, PostParams},
};

/// Possible errors when building a request.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to build a request.
    #[error("failed to build request: {0}")]
    BuildRequest(#[source] http::Error),
    /// Failed to serialize body.
    #[error("failed to serialize body: {0}")]
    SerializeBody(#[source] serde_json::Error),
    /// Failed to validate request.
    #[error("failed to validate request: {0}")]
    Validation(String),
}

/// Request builder for one resource collection, e.g. `/apis/apiregistration.k8s.io/v1alpha1/apiservices`
#[derive(Debug, Clone)]
pub struct Request {
    /// Path of the collection
    pub url_path: String,
    /// `Content-Type` of create, replace and delete bodies
    pub content_type: &'static str,
}

impl Request {
    /// Builder for the collection at `url_path` with JSON bodies
    pub fn new<S: Into<String>>(url_path: S) -> Self {
        Self {
            url_path: url_path.into(),
            content_type: JSON_MEDIA_TYPE,
        }
    }

    /// Use `content_type` for encoded object bodies
    #[must_use]
    pub fn with_content_type(mut self, content_type: &'static str) -> Self {
        self.content_type = content_type;
        self
    }

    /// List the collection
    pub fn list(&self, lp: &ListParams) -> Result<http::Request<Vec<u8>>, Error> {
        let mut qp = query(&self.url_path);
        lp.append_list(&mut qp);
        bodyless(Method::GET, qp.finish())
    }

    /// Watch the collection from resource version `ver`
    pub fn watch(&self, lp: &ListParams, ver: &str) -> Result<http::Request<Vec<u8>>, Error> {
        lp.validate_watch()?;
        let mut qp = query(&self.url_path);
        lp.append_watch(&mut qp, ver);
        bodyless(Method::GET, qp.finish())
    }

    /// Get one object
    pub fn get(&self, name: &str) -> Result<http::Request<Vec<u8>>, Error> {
        bodyless(Method::GET, self.object_path(name)?)
    }

    /// Create an object from its encoded form
    pub fn create(&self, pp: &PostParams, data: Vec<u8>) -> Result<http::Request<Vec<u8>>, Error> {
        pp.validate()?;
        let mut qp = query(&self.url_path);
        pp.append(&mut qp);
        self.with_body(Method::POST, qp.finish(), data)
    }

    /// Replace an object, `data` must carry `metadata.resourceVersion`
    pub fn replace(&self, name: &str, pp: &PostParams, data: Vec<u8>) -> Result<http::Request<Vec<u8>>, Error> {
        let path = self.object_path(name)?;
        self.put(&path, pp, data)
    }

    /// Replace a subresource of an object, such as `status`
    pub fn replace_subresource(
        &self,
        subresource_name: &str,
        name: &str,
        pp: &PostParams,
        data: Vec<u8>,
    ) -> Result<http::Request<Vec<u8>>, Error> {
        let path = format!("{}/{subresource_name}", self.object_path(name)?);
        self.put(&path, pp, data)
    }

    /// Patch an object
    pub fn patch<P: serde::Serialize>(
        &self,
        name: &str,
        pp: &PatchParams,
        patch: &Patch<P>,
    ) -> Result<http::Request<Vec<u8>>, Error> {
        pp.validate(patch)?;
        let mut qp = query(&self.object_path(name)?);
        pp.append(&mut qp);
        http::Request::patch(qp.finish())
            .header(header::ACCEPT, self.content_type)
            .header(header::CONTENT_TYPE, patch.content_type())
            .body(patch.body()?)
            .map_err(Error::BuildRequest)
    }

    /// Delete an object
    pub fn delete(&self, name: &str, dp: &DeleteParams) -> Result<http::Request<Vec<u8>>, Error> {
        let path = self.object_path(name)?;
        self.with_body(Method::DELETE, path, delete_body(dp)?)
    }

    /// Delete every object matching the selectors in `lp`
    pub fn delete_collection(
        &self,
        dp: &DeleteParams,
        lp: &ListParams,
    ) -> Result<http::Request<Vec<u8>>, Error> {
        let mut qp = query(&self.url_path);
        lp.append_selectors(&mut qp);
        self.with_body(Method::DELETE, qp.finish(), delete_body(dp)?)
    }

    fn object_path(&self, name: &str) -> Result<String, Error> {
        if name.is_empty() {
            return Err(Error::Validation("A non-empty name is required".into()));
        }
        if name.contains('/') {
            return Err(Error::Validation(format!("Name {name:?} must not contain '/'")));
        }
        Ok(format!("{}/{name}", self.url_path))
    }

    fn put(&self, path: &str, pp: &PostParams, data: Vec<u8>) -> Result<http::Request<Vec<u8>>, Error> {
        pp.validate()?;
        let mut qp = query(path);
        pp.append(&mut qp);
        self.with_body(Method::PUT, qp.finish(), data)
    }

    fn with_body(&self, method: Method, uri: String, data: Vec<u8>) -> Result<http::Request<Vec<u8>>, Error> {
        http::Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, self.content_type)
            .body(data)
            .map_err(Error::BuildRequest)
    }
}

// `form_urlencoded` keeps the target as a prefix, so queries render as `path?&key=value`
fn query(path: &str) -> form_urlencoded::Serializer<'static, String> {
    form_urlencoded::Serializer::new(format!("{path}?"))
}

fn bodyless(method: Method, uri: String) -> Result<http::Request<Vec<u8>>, Error> {
    http::Request::builder()
        .method(method)
        .uri(uri)
        .body(vec![])
        .map_err(Error::BuildRequest)
}

fn delete_body(dp: &DeleteParams) -> Result<Vec<u8>, Error> {
    serde_json::to_vec(dp).map_err(Error::SerializeBody)
}
