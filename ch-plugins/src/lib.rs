//! coursehelp Plugins - the page handlers and render hooks.
//!
//! Each plugin takes an explicit [`RequestContext`](ch_core::RequestContext)
//! and a shared [`RecordStore`](ch_store::RecordStore), and produces either an
//! HTML fragment or a raw payload. Nothing here holds mutable state between
//! requests.

pub mod broadcast;
pub mod help_queue;
pub mod html;
pub mod mirror;
pub mod page;
pub mod preload;
pub mod remote_queue;

pub use broadcast::BroadcastService;
pub use help_queue::{HelpQueueInjector, PageProblem, QueueView};
pub use mirror::BroadcastMirror;
pub use page::{PagePlugin, PageResponse, PluginRegistry, RenderedPage};
pub use preload::BroadcastPreloader;
pub use remote_queue::RemoteQueueService;
