//! Shared state for request handlers.

use std::sync::Arc;

use ch_core::config::AppConfig;
use ch_core::context::{FormData, RequestContext, Viewer};
use ch_core::error::ChResult;
use ch_plugins::{
    BroadcastMirror, BroadcastPreloader, BroadcastService, HelpQueueInjector, PluginRegistry,
    RemoteQueueService,
};
use ch_store::RecordStore;

/// Everything a request handler needs, built once at startup.
pub struct AppState {
    pub registry: PluginRegistry,
    pub preloader: BroadcastPreloader,
    pub injector: HelpQueueInjector,
    pub course: String,
    pub url_root: String,
}

impl AppState {
    /// Wire the plugins to `store` using the loaded configuration.
    pub fn new(config: &AppConfig, store: Arc<dyn RecordStore>) -> ChResult<Self> {
        let course = config.course.name.clone();
        let mirror = BroadcastMirror::from_config(config)?;

        let mut registry = PluginRegistry::new();
        registry.register(BroadcastService::new(store.clone(), course.as_str(), mirror));
        registry.register(RemoteQueueService::new(store.clone(), course.as_str()));

        Ok(Self {
            registry,
            preloader: BroadcastPreloader::default(),
            injector: HelpQueueInjector::from_config(store, config),
            url_root: AppConfig::sanitize_url_root(&config.course.url_root),
            course,
        })
    }

    /// Request context for this course.
    pub fn context(&self, viewer: Option<Viewer>, path_info: Vec<String>, form: Option<FormData>) -> RequestContext {
        RequestContext {
            viewer,
            course: self.course.clone(),
            url_root: self.url_root.clone(),
            path_info,
            form,
        }
    }

    /// Path of a course page, starting with the course segment.
    pub fn page_path(&self, page: &str) -> Vec<String> {
        vec![self.course.clone(), page.to_string()]
    }
}
