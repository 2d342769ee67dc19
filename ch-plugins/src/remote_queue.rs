//! Remote-queue page.
//!
//! Staff publish a personal meeting URL and toggle whether they are taking
//! remote students. Students reach a staff member's link through `?get=<staff>`
//! (a clickable button) or `?go=<staff>` (an immediate meta refresh, logged as
//! a click). An inactive staff member is indistinguishable from one with no URL.

use std::sync::Arc;

use tracing::{debug, info};

use ch_core::constants::{content_types, fields, is_checked, logs};
use ch_core::context::{RequestContext, Viewer};
use ch_core::error::{ChError, ChResult};
use ch_store::{LogKey, RecordStore, RecordStoreExt, RemoteQueueRecord};

use crate::html::{escape, feedback};
use crate::page::{PagePlugin, PageResponse};

/// Page name used for dispatch.
pub const PAGE_NAME: &str = "remote_queue";

pub struct RemoteQueueService {
    store: Arc<dyn RecordStore>,
    course: String,
}

impl RemoteQueueService {
    pub fn new(store: Arc<dyn RecordStore>, course: impl Into<String>) -> Self {
        Self {
            store,
            course: course.into(),
        }
    }

    fn log(&self, username: &str) -> LogKey {
        LogKey::new(self.course.as_str(), [logs::REMOTE_QUEUE], username)
    }

    /// Current settings for `username`.
    pub fn get(&self, username: &str) -> ChResult<Option<RemoteQueueRecord>> {
        let record = self.store.most_recent_as(&self.log(username))?;
        if record.is_none() {
            debug!("no remote queue settings for {username}");
        }
        Ok(record)
    }

    /// Append new settings under the actor's username.
    pub fn save(&self, actor: &Viewer, url: &str, active: bool) -> ChResult<RemoteQueueRecord> {
        if !actor.role.can_publish_remote_url() {
            return Err(ChError::AuthorizationDenied(format!(
                "{} ({}) may not publish a remote queue url",
                actor.username, actor.role
            )));
        }
        let record = RemoteQueueRecord::new(url.trim(), active);
        self.store.append_record(&self.log(&actor.username), &record)?;
        info!("remote queue for {} saved (active={active})", actor.username);
        Ok(record)
    }

    fn active_url(&self, staffuser: &str) -> ChResult<Option<String>> {
        Ok(self
            .get(staffuser)?
            .and_then(|r| r.active_url().map(str::to_string)))
    }

    /// Button linking to the staff member's URL, or empty when inactive.
    pub fn render_link(&self, staffuser: &str) -> ChResult<String> {
        Ok(match self.active_url(staffuser)? {
            Some(url) => format!(
                "<button><font color='blue' size='+2'>Please <a href='{}' target='_blank'>\
                 click here to start your remote queue session</a></font></button>",
                escape(&url)
            ),
            None => String::new(),
        })
    }

    /// Meta refresh to the staff member's URL, or empty when inactive.
    pub fn render_redirect(&self, staffuser: &str) -> ChResult<String> {
        Ok(match self.active_url(staffuser)? {
            Some(url) => format!(
                "<meta http-equiv=\"Refresh\" content=\"0; url={}\" />",
                escape(&url)
            ),
            None => String::new(),
        })
    }

    /// Settings form prefilled with the actor's current values.
    pub fn show_form(&self, actor: &Viewer, extra_html: &str) -> ChResult<String> {
        let current = self.get(&actor.username)?.unwrap_or_default();
        let checked = if current.active { " checked " } else { "" };

        let mut html = String::from("<form method='POST'>");
        html.push_str(&format!(
            "<p>Your video url: <input type=\"text\" size=100 value=\"{}\" name=\"{}\"></input></p>",
            escape(&current.url),
            fields::URL
        ));
        html.push_str(&format!(
            "<p>You are active?  No <label class=\"switch\">\
             <input type=\"checkbox\" name=\"{}\"{checked}>\
             <span class=\"slider round\"></span>\
             </label> Yes</p>",
            fields::ACTIVE
        ));
        html.push_str(&format!(
            "<p><input type=\"submit\" name=\"{}\"></input></p>",
            fields::SAVE
        ));
        html.push_str("</form>");
        html.push_str(extra_html);
        Ok(html)
    }

    /// The staff member named by a `get`/`go` field. A bare field means the viewer.
    fn target<'a>(value: Option<&'a str>, ctx: &'a RequestContext) -> Option<&'a str> {
        match value.map(str::trim) {
            Some(name) if !name.is_empty() => Some(name),
            _ => ctx.username(),
        }
    }
}

impl PagePlugin for RemoteQueueService {
    fn name(&self) -> &str {
        PAGE_NAME
    }

    fn dispatch(&self, ctx: &RequestContext) -> ChResult<PageResponse> {
        let Some(form) = &ctx.form else {
            return Ok(PageResponse::Empty);
        };
        let actor = ctx.viewer.as_ref().filter(|v| v.role.can_publish_remote_url());

        if let Some(actor) = actor {
            if form.is_empty() {
                return Ok(PageResponse::Html(self.show_form(actor, "")?));
            }
            if form.contains(fields::SAVE) {
                let url = form.get(fields::URL).unwrap_or_default();
                let active = form.get(fields::ACTIVE).is_some_and(is_checked);
                self.save(actor, url, active)?;
                return Ok(PageResponse::Html(self.show_form(actor, &feedback("green", "saved"))?));
            }
        }
        if form.contains(fields::GET) {
            let html = match Self::target(form.get(fields::GET), ctx) {
                Some(staff) => self.render_link(staff)?,
                None => String::new(),
            };
            return Ok(PageResponse::raw(content_types::HTML, html));
        }
        if form.contains(fields::GO) {
            let html = match Self::target(form.get(fields::GO), ctx) {
                Some(staff) => {
                    let html = self.render_redirect(staff)?;
                    if !html.is_empty() {
                        info!(
                            "remote queue click: user={} staff={staff}",
                            ctx.username().unwrap_or("anonymous")
                        );
                    }
                    html
                }
                None => String::new(),
            };
            return Ok(PageResponse::raw(content_types::HTML, html));
        }
        match actor {
            Some(actor) => Ok(PageResponse::Html(self.show_form(actor, "")?)),
            None => Ok(PageResponse::Empty),
        }
    }
}
