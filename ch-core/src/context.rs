//! Per-request context handed to every plugin.
//!
//! The hosting framework owns authentication and routing. Whatever it knows
//! about the current request is copied into a [`RequestContext`] and passed
//! explicitly; plugins never consult ambient state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::role::Role;

/// The authenticated user viewing a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    pub username: String,
    pub role: Role,
}

impl Viewer {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }
}

/// Submitted form fields.
///
/// A field that is present with an empty value is distinct from an absent
/// field: a bare `?get` query still selects the "get" action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormData {
    fields: BTreeMap<String, String>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, value)` pairs. Later duplicates win.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Merge another set of fields into this one, overwriting on conflict.
    pub fn extend(&mut self, other: FormData) {
        self.fields.extend(other.fields);
    }
}

/// Everything a plugin may know about the current request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestContext {
    /// Authenticated viewer. `None` for anonymous access, which disables
    /// every role-dependent feature.
    pub viewer: Option<Viewer>,
    /// Course identifier; also the record-store scope.
    pub course: String,
    /// Public URL root of the course site.
    pub url_root: String,
    /// Path segments of the current page, starting with the course.
    pub path_info: Vec<String>,
    /// Submitted form. `None` when the host supplied no form at all.
    pub form: Option<FormData>,
}

impl RequestContext {
    pub fn new(course: impl Into<String>, url_root: impl Into<String>) -> Self {
        Self {
            course: course.into(),
            url_root: url_root.into(),
            ..Default::default()
        }
    }

    pub fn with_viewer(mut self, viewer: Viewer) -> Self {
        self.viewer = Some(viewer);
        self
    }

    pub fn with_form(mut self, form: FormData) -> Self {
        self.form = Some(form);
        self
    }

    pub fn with_path(mut self, path_info: Vec<String>) -> Self {
        self.path_info = path_info;
        self
    }

    /// The viewer's role, if any.
    pub fn role(&self) -> Option<&Role> {
        self.viewer.as_ref().map(|v| &v.role)
    }

    /// The viewer's username, if any.
    pub fn username(&self) -> Option<&str> {
        self.viewer.as_ref().map(|v| v.username.as_str())
    }

    /// Whether the viewer's role satisfies a capability check.
    /// Anonymous viewers never do.
    pub fn viewer_can(&self, capability: impl Fn(&Role) -> bool) -> bool {
        self.role().map(capability).unwrap_or(false)
    }

    /// URL of the current page.
    pub fn page_url(&self) -> String {
        let mut parts = vec![self.url_root.trim_end_matches('/').to_string()];
        parts.extend(self.path_info.iter().cloned());
        parts.join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_presence_vs_value() {
        let form = FormData::from_pairs([("get", ""), ("msg", "hi")]);
        assert!(form.contains("get"));
        assert_eq!(form.get("get"), Some(""));
        assert_eq!(form.get("msg"), Some("hi"));
        assert!(!form.contains("save"));
        assert_eq!(form.len(), 2);
    }

    #[test]
    fn test_form_extend_overwrites() {
        let mut a = FormData::from_pairs([("url", "old")]);
        a.extend(FormData::from_pairs([("url", "new"), ("save", "")]));
        assert_eq!(a.get("url"), Some("new"));
        assert!(a.contains("save"));
    }

    #[test]
    fn test_anonymous_has_no_capabilities() {
        let ctx = RequestContext::new("6.101", "https://example.edu/cs");
        assert!(!ctx.viewer_can(Role::is_staff));
        assert!(ctx.username().is_none());
    }

    #[test]
    fn test_viewer_capabilities() {
        let ctx = RequestContext::new("6.101", "https://example.edu/cs")
            .with_viewer(Viewer::new("alice", Role::Ta));
        assert!(ctx.viewer_can(Role::can_broadcast));
        assert_eq!(ctx.username(), Some("alice"));
    }

    #[test]
    fn test_page_url() {
        let ctx = RequestContext::new("6.101", "https://example.edu/cs/")
            .with_path(vec!["6.101".into(), "remote_queue".into()]);
        assert_eq!(ctx.page_url(), "https://example.edu/cs/6.101/remote_queue");
    }
}
