//! The `Status` object the API server answers with when there is no object to return
//!
//! Deletes that finish immediately, and collection deletes, reply with a `v1/Status`
//! instead of the `APIService` they removed.
pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::{Status, StatusCause, StatusDetails};

const SUCCESS: &str = "Success";
const FAILURE: &str = "Failure";

/// Helpers for reading a [`Status`]
///
/// A status can be neither a success nor a failure when the server leaves the field empty.
pub trait StatusExt {
    /// `status` is `Success`
    fn is_success(&self) -> bool;

    /// `status` is `Failure`
    fn is_failure(&self) -> bool;

    /// Name of the object the status is about, if the server named one
    fn subject_name(&self) -> Option<&str>;
}

impl StatusExt for Status {
    fn is_success(&self) -> bool {
        self.status.as_deref() == Some(SUCCESS)
    }

    fn is_failure(&self) -> bool {
        self.status.as_deref() == Some(FAILURE)
    }

    fn subject_name(&self) -> Option<&str> {
        self.details.as_ref()?.name.as_deref()
    }
}

#[cfg(test)]
mod test {
    use super::{Status, StatusExt};

    #[test]
    fn deleted_apiservice() {
        let body = r#"{"kind":"Status","apiVersion":"v1","metadata":{},"status":"Success","details":{"name":"v1alpha1.metrics.example.com","group":"apiregistration.k8s.io","kind":"apiservices","uid":"1234-some-uid"}}"#;
        let s: Status = serde_json::from_str(body).unwrap();
        assert!(s.is_success());
        assert!(!s.is_failure());
        assert_eq!(s.subject_name(), Some("v1alpha1.metrics.example.com"));
    }

    #[test]
    fn conflict_without_details() {
        let body = r#"{"kind":"Status","apiVersion":"v1","metadata":{},"status":"Failure","code":409}"#;
        let s: Status = serde_json::from_str(body).unwrap();
        assert!(s.is_failure());
        assert_eq!(s.code, Some(409));
        assert_eq!(s.subject_name(), None);
    }

    #[test]
    fn empty_status_is_indeterminate() {
        let s = Status::default();
        assert!(!s.is_success());
        assert!(!s.is_failure());
    }
}
