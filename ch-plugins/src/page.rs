//! Page plugin trait and registry.
//!
//! A page plugin owns one course page. The host hands it the request context
//! and gets back a [`PageResponse`]; the registry lets a host dispatch by page
//! name without knowing the concrete plugin types.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use ch_core::context::RequestContext;
use ch_core::error::{ChError, ChResult};

/// Result of dispatching a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageResponse {
    /// Nothing to show.
    Empty,
    /// Fragment rendered inside the host's page chrome.
    Html(String),
    /// Payload that replaces the whole response.
    Raw { content_type: String, body: String },
}

impl PageResponse {
    pub fn raw(content_type: &str, body: impl Into<String>) -> Self {
        PageResponse::Raw {
            content_type: content_type.to_string(),
            body: body.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            PageResponse::Empty => true,
            PageResponse::Html(html) => html.is_empty(),
            PageResponse::Raw { .. } => false,
        }
    }

    /// Response body; empty for `Empty`.
    pub fn body(&self) -> &str {
        match self {
            PageResponse::Empty => "",
            PageResponse::Html(html) => html,
            PageResponse::Raw { body, .. } => body,
        }
    }
}

/// Page content and head scripts as the host is about to send them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedPage {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub scripts: String,
}

/// A course page backed by a plugin.
pub trait PagePlugin: Send + Sync {
    /// Page name used for dispatch.
    fn name(&self) -> &str;

    /// Produce the response for one request.
    fn dispatch(&self, ctx: &RequestContext) -> ChResult<PageResponse>;
}

/// Page plugins by name.
#[derive(Default, Clone)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn PagePlugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin. A later plugin with the same name replaces the earlier one.
    pub fn register<P: PagePlugin + 'static>(&mut self, plugin: P) {
        let name = plugin.name().to_string();
        self.plugins.retain(|p| p.name() != name);
        info!("registered page plugin: {name}");
        self.plugins.push(Arc::new(plugin));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn PagePlugin>> {
        self.plugins.iter().find(|p| p.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    /// Dispatch to the named page. `None` when no such page is registered.
    ///
    /// An authorization denial renders as empty output; every other error
    /// propagates to the host.
    pub fn dispatch(&self, name: &str, ctx: &RequestContext) -> ChResult<Option<PageResponse>> {
        let Some(plugin) = self.get(name) else {
            return Ok(None);
        };
        match plugin.dispatch(ctx) {
            Ok(response) => Ok(Some(response)),
            Err(ChError::AuthorizationDenied(reason)) => {
                debug!("page {name}: {reason}");
                Ok(Some(PageResponse::Empty))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo(&'static str);

    impl PagePlugin for Echo {
        fn name(&self) -> &str {
            self.0
        }

        fn dispatch(&self, ctx: &RequestContext) -> ChResult<PageResponse> {
            match ctx.username() {
                Some(user) => Ok(PageResponse::Html(format!("{}:{user}", self.0))),
                None => Err(ChError::AuthorizationDenied("anonymous".into())),
            }
        }
    }

    struct Broken;

    impl PagePlugin for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn dispatch(&self, _ctx: &RequestContext) -> ChResult<PageResponse> {
            Err(ChError::Database("gone".into()))
        }
    }

    #[test]
    fn test_dispatch_by_name() {
        let mut registry = PluginRegistry::new();
        registry.register(Echo("a"));
        registry.register(Echo("b"));
        let ctx = RequestContext::new("c", "")
            .with_viewer(ch_core::Viewer::new("alice", ch_core::Role::Ta));

        let resp = registry.dispatch("b", &ctx).unwrap().unwrap();
        assert_eq!(resp.body(), "b:alice");
        assert!(registry.dispatch("missing", &ctx).unwrap().is_none());
        assert_eq!(registry.names(), vec!["a", "b"]);
    }

    #[test]
    fn test_denial_renders_empty() {
        let mut registry = PluginRegistry::new();
        registry.register(Echo("a"));
        let resp = registry.dispatch("a", &RequestContext::new("c", "")).unwrap();
        assert_eq!(resp, Some(PageResponse::Empty));
    }

    #[test]
    fn test_store_errors_propagate() {
        let mut registry = PluginRegistry::new();
        registry.register(Broken);
        let err = registry.dispatch("broken", &RequestContext::new("c", "")).unwrap_err();
        assert!(err.is_store_unavailable());
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = PluginRegistry::new();
        registry.register(Echo("a"));
        registry.register(Echo("a"));
        assert_eq!(registry.names().len(), 1);
    }

    #[test]
    fn test_response_helpers() {
        assert!(PageResponse::Empty.is_empty());
        assert!(PageResponse::Html(String::new()).is_empty());
        let raw = PageResponse::raw("application/json", "{}");
        assert!(!raw.is_empty());
        assert_eq!(raw.body(), "{}");
    }
}
