use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::response::StatusDetails;

/// An error response from the API.
#[derive(Error, Deserialize, Serialize, Debug, Clone, PartialEq)]
#[error("{message}: {reason}")]
pub struct ErrorResponse {
    /// The status
    pub status: String,
    /// A message about the error
    #[serde(default)]
    pub message: String,
    /// The reason for the error
    #[serde(default)]
    pub reason: String,
    /// The error code
    pub code: u16,
    /// Extended data associated with the reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<StatusDetails>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOT_FOUND: &str = r#"
    {
      "kind": "Status",
      "apiVersion": "v1",
      "metadata": {},
      "status": "Failure",
      "message": "apiservices.apiregistration.k8s.io \"v1alpha1.missing.example.com\" not found",
      "reason": "NotFound",
      "details": {
        "name": "v1alpha1.missing.example.com",
        "group": "apiregistration.k8s.io",
        "kind": "apiservices"
      },
      "code": 404
    }
    "#;

    const INVALID: &str = r#"
    {
      "kind": "Status",
      "apiVersion": "v1",
      "metadata": {},
      "status": "Failure",
      "message": "APIService.apiregistration.k8s.io \"bad\" is invalid: spec.group: Required value",
      "reason": "Invalid",
      "details": {
        "name": "bad",
        "group": "apiregistration.k8s.io",
        "kind": "APIService",
        "causes": [
          {
            "reason": "FieldValueRequired",
            "message": "Required value",
            "field": "spec.group"
          }
        ]
      },
      "code": 422
    }
    "#;

    #[test]
    fn not_found() {
        let err: ErrorResponse = serde_json::from_str(NOT_FOUND).unwrap();
        assert_eq!(err.code, 404);
        assert_eq!(err.reason, "NotFound");
        assert_eq!(
            err.details.and_then(|d| d.name).as_deref(),
            Some("v1alpha1.missing.example.com")
        );
    }

    #[test]
    fn invalid_with_causes() {
        let err: ErrorResponse = serde_json::from_str(INVALID).unwrap();
        assert_eq!(err.code, 422);
        let causes = err.details.as_ref().and_then(|d| d.causes.clone()).unwrap();
        assert_eq!(causes[0].field.as_deref(), Some("spec.group"));
        assert!(err.to_string().ends_with(": Invalid"));
    }
}
