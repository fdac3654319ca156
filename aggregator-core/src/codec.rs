//! Body encoding and decoding for typed clients
//!
//! A [`CodecFactory`] knows which media types are available. A
//! [`DirectCodecFactory`] wraps one and converts objects directly to and from
//! their wire form, stamping `apiVersion` and `kind` on the way out.
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::Resource;

/// Media type for JSON bodies
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Possible errors when encoding or decoding bodies
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to serialize an object
    #[error("failed to serialize object: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Failed to deserialize a body
    #[error("failed to deserialize body: {0}")]
    Deserialize(#[source] serde_json::Error),

    /// The encoded form of a resource was not a JSON object
    #[error("encoded {0} is not an object")]
    NotAnObject(String),
}

/// The set of serializers available to a client
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodecFactory {
    media_types: Vec<&'static str>,
}

impl Default for CodecFactory {
    fn default() -> Self {
        Self {
            media_types: vec![JSON_MEDIA_TYPE],
        }
    }
}

impl CodecFactory {
    /// Media types this factory can produce and consume
    pub fn supported_media_types(&self) -> &[&'static str] {
        &self.media_types
    }

    /// Whether `media_type` is understood
    ///
    /// Parameters such as `; charset=utf-8` are ignored.
    pub fn supports(&self, media_type: &str) -> bool {
        let essence = media_type.split(';').next().unwrap_or_default().trim();
        self.media_types.iter().any(|m| m.eq_ignore_ascii_case(essence))
    }

    /// Content type used for request bodies
    pub fn content_type(&self) -> &'static str {
        self.media_types.first().copied().unwrap_or(JSON_MEDIA_TYPE)
    }

    /// Encode a value as is
    pub fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, Error> {
        serde_json::to_vec(value).map_err(Error::Serialize)
    }

    /// Decode a body into `T`
    pub fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, Error> {
        serde_json::from_slice(data).map_err(Error::Deserialize)
    }
}

/// Serializer that converts objects directly without going through an internal version
///
/// Encoding a [`Resource`] sets its `apiVersion` and `kind`.
/// Decoding leaves type information to the target type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirectCodecFactory {
    codecs: CodecFactory,
}

impl DirectCodecFactory {
    /// Wrap a codec factory
    pub fn new(codecs: CodecFactory) -> Self {
        Self { codecs }
    }

    /// The wrapped codec factory
    pub fn codecs(&self) -> &CodecFactory {
        &self.codecs
    }

    /// Content type used for request bodies
    pub fn content_type(&self) -> &'static str {
        self.codecs.content_type()
    }

    /// Encode a resource with its `apiVersion` and `kind` filled in
    pub fn encode_object<K: Resource + Serialize>(&self, obj: &K) -> Result<Vec<u8>, Error> {
        let mut value = serde_json::to_value(obj).map_err(Error::Serialize)?;
        let map = value
            .as_object_mut()
            .ok_or_else(|| Error::NotAnObject(K::KIND.to_string()))?;
        map.insert("apiVersion".into(), K::api_version().into());
        map.insert("kind".into(), K::KIND.into());
        self.codecs.encode(&value)
    }

    /// Encode an arbitrary value as is
    pub fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, Error> {
        self.codecs.encode(value)
    }

    /// Decode a body into `T`
    pub fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, Error> {
        self.codecs.decode(data)
    }
}
