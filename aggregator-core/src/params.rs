//! Query and body parameters for `apiservices` calls
//!
//! Each type mirrors the options object the API server accepts for one kind of call.
//! They are rendered into the query string, except [`DeleteParams`] which travels as the body.
use serde::Serialize;

use crate::request::Error;

/// The API server closes watches at this many seconds
const MAX_WATCH_TIMEOUT: u32 = 295;
/// Timeout sent for watches that do not ask for one
const DEFAULT_WATCH_TIMEOUT: u32 = 290;
/// Longest `fieldManager` the API server accepts
const MAX_FIELD_MANAGER_LEN: usize = 128;

/// Filtering and paging for list, watch and delete collection calls
///
/// ```
/// use aggregator_core::params::ListParams;
/// let lp = ListParams::default()
///     .labels("kube-aggregator.kubernetes.io/automanaged=true")
///     .limit(50);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListParams {
    /// Only match objects whose labels satisfy this selector
    pub label_selector: Option<String>,

    /// Only match objects whose fields satisfy this selector, e.g. `metadata.name=v1alpha1.metrics.example.com`
    pub field_selector: Option<String>,

    /// Server side timeout of the call in seconds
    ///
    /// Watches use 290 when unset and must stay below 295.
    pub timeout: Option<u32>,

    /// Page size. Lists only.
    pub limit: Option<u32>,

    /// Continue token from the previous page. Lists only.
    pub continue_token: Option<String>,

    /// Serve a list no older than this resource version
    ///
    /// Ignored when a continue token is set, the token pins the version already.
    pub resource_version: Option<String>,

    /// Ask a watch for `BOOKMARK` events
    pub bookmarks: bool,
}

impl ListParams {
    /// Select on labels, e.g. `key1=value1,key2!=value2`
    #[must_use]
    pub fn labels(mut self, label_selector: &str) -> Self {
        self.label_selector = Some(label_selector.to_string());
        self
    }

    /// Select on fields, e.g. `metadata.name=v1alpha1.metrics.example.com`
    #[must_use]
    pub fn fields(mut self, field_selector: &str) -> Self {
        self.field_selector = Some(field_selector.to_string());
        self
    }

    /// Set the server side timeout in seconds
    #[must_use]
    pub fn timeout(mut self, timeout_secs: u32) -> Self {
        self.timeout = Some(timeout_secs);
        self
    }

    /// Set the page size
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Resume from a continue token
    #[must_use]
    pub fn continue_token(mut self, token: &str) -> Self {
        self.continue_token = Some(token.to_string());
        self
    }

    /// List at or after a resource version
    #[must_use]
    pub fn at(mut self, resource_version: &str) -> Self {
        self.resource_version = Some(resource_version.to_string());
        self
    }

    /// Request `BOOKMARK` events on watches
    #[must_use]
    pub fn bookmarks(mut self) -> Self {
        self.bookmarks = true;
        self
    }

    pub(crate) fn validate_watch(&self) -> Result<(), Error> {
        for (field, set) in [
            ("limit", self.limit.is_some()),
            ("continue_token", self.continue_token.is_some()),
        ] {
            if set {
                return Err(Error::Validation(format!("ListParams::{field} is only valid for lists")));
            }
        }
        match self.timeout {
            Some(secs) if secs >= MAX_WATCH_TIMEOUT => Err(Error::Validation(format!(
                "watch timeout must be below {MAX_WATCH_TIMEOUT}s, got {secs}s"
            ))),
            _ => Ok(()),
        }
    }

    pub(crate) fn append_selectors(&self, qp: &mut form_urlencoded::Serializer<String>) {
        for (key, selector) in [
            ("fieldSelector", &self.field_selector),
            ("labelSelector", &self.label_selector),
        ] {
            if let Some(selector) = selector {
                qp.append_pair(key, selector);
            }
        }
    }

    pub(crate) fn append_list(&self, qp: &mut form_urlencoded::Serializer<String>) {
        if let Some(secs) = self.timeout {
            qp.append_pair("timeoutSeconds", &secs.to_string());
        }
        self.append_selectors(qp);
        if let Some(limit) = self.limit {
            qp.append_pair("limit", &limit.to_string());
        }
        match (&self.continue_token, &self.resource_version) {
            (Some(token), _) => {
                qp.append_pair("continue", token);
            }
            (None, Some(rv)) => {
                qp.append_pair("resourceVersion", rv);
            }
            (None, None) => {}
        }
    }

    pub(crate) fn append_watch(&self, qp: &mut form_urlencoded::Serializer<String>, version: &str) {
        qp.append_pair("watch", "true");
        qp.append_pair("resourceVersion", version);
        qp.append_pair(
            "timeoutSeconds",
            &self.timeout.unwrap_or(DEFAULT_WATCH_TIMEOUT).to_string(),
        );
        self.append_selectors(qp);
        if self.bookmarks {
            qp.append_pair("allowWatchBookmarks", "true");
        }
    }
}

/// Options for create and replace calls
#[derive(Default, Clone, Debug, PartialEq)]
pub struct PostParams {
    /// Validate the write without persisting it
    pub dry_run: bool,
    /// Name of the actor making the change
    pub field_manager: Option<String>,
}

impl PostParams {
    pub(crate) fn validate(&self) -> Result<(), Error> {
        check_field_manager(self.field_manager.as_deref())
    }

    pub(crate) fn append(&self, qp: &mut form_urlencoded::Serializer<String>) {
        append_write_options(qp, self.dry_run, false, self.field_manager.as_deref());
    }
}

/// A change to apply to an `APIService`
///
/// ```
/// use aggregator_core::params::Patch;
/// let priority = serde_json::json!({ "spec": { "priority": 200 } });
/// let patch = Patch::Merge(&priority);
/// ```
#[non_exhaustive]
#[derive(Debug, PartialEq, Clone)]
pub enum Patch<T: Serialize> {
    /// Server side apply of a partial object, requires a field manager
    Apply(T),
    /// RFC 7386 JSON merge patch
    Merge(T),
    /// Strategic merge patch using the patch strategies of the `APIService` type
    Strategic(T),
}

impl<T: Serialize> Patch<T> {
    fn is_apply(&self) -> bool {
        matches!(self, Self::Apply(_))
    }

    pub(crate) fn content_type(&self) -> &'static str {
        match self {
            Self::Apply(_) => "application/apply-patch+yaml",
            Self::Merge(_) => "application/merge-patch+json",
            Self::Strategic(_) => "application/strategic-merge-patch+json",
        }
    }

    pub(crate) fn body(&self) -> Result<Vec<u8>, Error> {
        let (Self::Apply(inner) | Self::Merge(inner) | Self::Strategic(inner)) = self;
        serde_json::to_vec(inner).map_err(Error::SerializeBody)
    }
}

/// Options for patch calls
#[derive(Default, Clone, Debug, PartialEq)]
pub struct PatchParams {
    /// Validate the patch without persisting it
    pub dry_run: bool,
    /// Take ownership of conflicting fields. Server side apply only.
    pub force: bool,
    /// Name of the actor making the change. Required for server side apply.
    pub field_manager: Option<String>,
}

impl PatchParams {
    /// Server side apply as `manager`
    #[must_use]
    pub fn apply(manager: &str) -> Self {
        Self {
            field_manager: Some(manager.to_string()),
            ..Self::default()
        }
    }

    /// Take ownership of conflicting fields
    #[must_use]
    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }

    /// Validate the patch without persisting it
    #[must_use]
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    pub(crate) fn validate<P: Serialize>(&self, patch: &Patch<P>) -> Result<(), Error> {
        check_field_manager(self.field_manager.as_deref())?;
        if patch.is_apply() && self.field_manager.is_none() {
            return Err(Error::Validation("server side apply needs a field manager".into()));
        }
        if self.force && !patch.is_apply() {
            return Err(Error::Validation("force is only valid for server side apply".into()));
        }
        Ok(())
    }

    pub(crate) fn append(&self, qp: &mut form_urlencoded::Serializer<String>) {
        append_write_options(qp, self.dry_run, self.force, self.field_manager.as_deref());
    }
}

fn check_field_manager(field_manager: Option<&str>) -> Result<(), Error> {
    match field_manager {
        Some(fm) if fm.len() > MAX_FIELD_MANAGER_LEN => Err(Error::Validation(format!(
            "field manager is longer than {MAX_FIELD_MANAGER_LEN} bytes"
        ))),
        _ => Ok(()),
    }
}

fn append_write_options(
    qp: &mut form_urlencoded::Serializer<String>,
    dry_run: bool,
    force: bool,
    field_manager: Option<&str>,
) {
    if dry_run {
        qp.append_pair("dryRun", "All");
    }
    if force {
        qp.append_pair("force", "true");
    }
    if let Some(fm) = field_manager {
        qp.append_pair("fieldManager", fm);
    }
}

/// Options for delete and delete collection calls, sent as the request body
#[derive(Default, Clone, Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteParams {
    /// Validate the deletion without persisting it
    #[serde(serialize_with = "all_dry_run_stages", skip_serializing_if = "std::ops::Not::not")]
    pub dry_run: bool,

    /// Seconds to wait before deleting, zero deletes immediately
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grace_period_seconds: Option<u32>,

    /// How dependents of the deleted objects are garbage collected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub propagation_policy: Option<PropagationPolicy>,
}

impl DeleteParams {
    /// Delete dependents in the background
    pub fn background() -> Self {
        Self::with_policy(PropagationPolicy::Background)
    }

    /// Delete dependents before the object itself
    pub fn foreground() -> Self {
        Self::with_policy(PropagationPolicy::Foreground)
    }

    /// Leave dependents in place
    pub fn orphan() -> Self {
        Self::with_policy(PropagationPolicy::Orphan)
    }

    fn with_policy(policy: PropagationPolicy) -> Self {
        Self {
            propagation_policy: Some(policy),
            ..Self::default()
        }
    }

    /// Validate the deletion without persisting it
    #[must_use]
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Wait `secs` before deleting
    #[must_use]
    pub fn grace_period(mut self, secs: u32) -> Self {
        self.grace_period_seconds = Some(secs);
        self
    }
}

// In a body dryRun is a list of stages rather than a flag. Only reached when set.
fn all_dry_run_stages<S: serde::Serializer>(_: &bool, s: S) -> Result<S::Ok, S::Error> {
    ["All"].serialize(s)
}

/// Garbage collection of dependents on delete
#[derive(Clone, Debug, Serialize, PartialEq)]
pub enum PropagationPolicy {
    /// Keep dependents
    Orphan,
    /// Delete dependents after the owner is gone
    Background,
    /// Delete dependents before the owner
    Foreground,
}
