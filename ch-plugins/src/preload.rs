//! Broadcast poller injection.
//!
//! Every page rendered for a student or staff member gets the client
//! configuration, script and stylesheet for the broadcast poller. The poller
//! reads `<url_root>/msg/broadcast?get`, which the reverse proxy serves from
//! the mirror file.

use tracing::debug;

use ch_core::context::RequestContext;
use ch_core::role::Role;

use crate::html::{escape, escape_js, join_url};
use crate::page::RenderedPage;

/// Static asset prefix the hosting framework rewrites to the course's
/// static directory.
pub const COURSE_STATIC_PREFIX: &str = "COURSE";

#[derive(Debug, Clone)]
pub struct BroadcastPreloader {
    static_prefix: String,
}

impl Default for BroadcastPreloader {
    fn default() -> Self {
        Self::new(COURSE_STATIC_PREFIX)
    }
}

impl BroadcastPreloader {
    pub fn new(static_prefix: impl Into<String>) -> Self {
        Self {
            static_prefix: static_prefix.into(),
        }
    }

    /// Head markup for the viewer, or `None` when the viewer does not get
    /// broadcasts.
    pub fn scripts_for(&self, ctx: &RequestContext) -> Option<String> {
        if !ctx.viewer_can(Role::receives_broadcasts) {
            return None;
        }
        let is_staff = ctx.viewer_can(Role::is_staff);
        let course_url = join_url(&ctx.url_root, &["msg"]);

        let mut scripts = String::new();
        scripts.push_str(&format!(
            "<script type=\"text/javascript\">CS_USER_IS_STAFF={is_staff}</script>"
        ));
        scripts.push_str(&format!(
            "<script type=\"text/javascript\">CS_COURSE_URL=\"{}\"</script>",
            escape_js(&course_url)
        ));
        scripts.push_str(&format!(
            "<script type=\"text/javascript\" src=\"{}\"></script>",
            escape(&join_url(&self.static_prefix, &["broadcast.js"]))
        ));
        scripts.push_str(&format!(
            "<link rel=\"stylesheet\" href=\"{}\">",
            escape(&join_url(&self.static_prefix, &["broadcast.css"]))
        ));
        Some(scripts)
    }

    /// Append the poller markup to the page's scripts.
    pub fn apply(&self, ctx: &RequestContext, page: &mut RenderedPage) {
        if let Some(scripts) = self.scripts_for(ctx) {
            page.scripts.push_str(&scripts);
            debug!("broadcast poller added for {}", ctx.username().unwrap_or_default());
        }
    }
}
