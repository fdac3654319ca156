//! Types for the watch api
//!
//! See <https://kubernetes.io/docs/reference/using-api/api-concepts/#efficient-detection-of-changes>

use crate::{error::ErrorResponse, metadata::TypeMeta};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// A raw event returned from a watch query
///
/// Note that a watch query returns many of these as newline separated JSON.
#[derive(Deserialize, Serialize, Clone)]
#[serde(tag = "type", content = "object", rename_all = "UPPERCASE")]
pub enum WatchEvent<K> {
    /// Resource was added
    Added(K),
    /// Resource was modified
    Modified(K),
    /// Resource was deleted
    Deleted(K),
    /// Resource bookmark, only carries a resource version
    Bookmark(Bookmark),
    /// There was some kind of error
    Error(ErrorResponse),
}

impl<K> Debug for WatchEvent<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &self {
            WatchEvent::Added(_) => write!(f, "Added event"),
            WatchEvent::Modified(_) => write!(f, "Modified event"),
            WatchEvent::Deleted(_) => write!(f, "Deleted event"),
            WatchEvent::Bookmark(_) => write!(f, "Bookmark event"),
            WatchEvent::Error(e) => write!(f, "Error event: {:?}", e),
        }
    }
}

/// Slimmed down object for [`WatchEvent::Bookmark`]
///
/// Bookmarks contain apiVersion + kind + basically empty metadata.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Bookmark {
    /// apiVersion + kind
    #[serde(flatten)]
    pub types: TypeMeta,

    /// Basically empty metadata
    pub metadata: BookmarkMeta,
}

/// Slimmed down metadata for [`WatchEvent::Bookmark`]
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkMeta {
    /// The only field we need from a Bookmark event.
    pub resource_version: String,
}

#[cfg(test)]
mod tests {
    use super::WatchEvent;
    use serde_json::Value;

    #[test]
    fn decodes_event_lines() {
        let added: WatchEvent<Value> =
            serde_json::from_str(r#"{"type":"ADDED","object":{"metadata":{"name":"a"}}}"#).unwrap();
        assert!(matches!(added, WatchEvent::Added(ref o) if o["metadata"]["name"] == "a"));

        let bookmark: WatchEvent<Value> = serde_json::from_str(
            r#"{"type":"BOOKMARK","object":{"apiVersion":"apiregistration.k8s.io/v1alpha1","kind":"APIService","metadata":{"resourceVersion":"3"}}}"#,
        )
        .unwrap();
        match bookmark {
            WatchEvent::Bookmark(b) => {
                assert_eq!(b.metadata.resource_version, "3");
                assert_eq!(b.types.kind, "APIService");
            }
            other => panic!("unexpected {other:?}"),
        }

        let error: WatchEvent<Value> = serde_json::from_str(
            r#"{"type":"ERROR","object":{"status":"Failure","message":"too old resource version","reason":"Expired","code":410}}"#,
        )
        .unwrap();
        assert!(matches!(error, WatchEvent::Error(ref e) if e.code == 410));
    }
}
