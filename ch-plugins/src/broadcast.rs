//! Broadcast message page.
//!
//! Authorized staff post short messages to everyone on the course site, or to
//! staff only. The latest message is served to pollers as JSON (`?get`) and
//! mirrored to a flat file. Expiry and "already seen" tracking happen in the
//! client poller; the server always returns the literal latest record.

use std::sync::Arc;

use tracing::{debug, info};

use ch_core::constants::{content_types, fields, logs};
use ch_core::context::{RequestContext, Viewer};
use ch_core::error::{ChError, ChResult};
use ch_core::role::Role;
use ch_store::{Audience, BroadcastRecord, LogKey, RecordOrder, RecordStore, RecordStoreExt};

use crate::html::{escape, feedback};
use crate::mirror::BroadcastMirror;
use crate::page::{PagePlugin, PageResponse};

/// Page name used for dispatch.
pub const PAGE_NAME: &str = "broadcast";

/// The broadcast page and its poller endpoint.
///
/// The client poller shows a message for five minutes after its `datetime`
/// and remembers which messages it has already shown; neither rule is
/// applied here.
pub struct BroadcastService {
    store: Arc<dyn RecordStore>,
    course: String,
    mirror: BroadcastMirror,
}

impl BroadcastService {
    pub fn new(store: Arc<dyn RecordStore>, course: impl Into<String>, mirror: BroadcastMirror) -> Self {
        Self {
            store,
            course: course.into(),
            mirror,
        }
    }

    fn log(&self) -> LogKey {
        LogKey::new(self.course.as_str(), [logs::BROADCAST], logs::BROADCAST_KEY)
    }

    /// Latest broadcast visible to `viewer_role`. Staff-only messages are
    /// hidden from non-staff and anonymous viewers.
    pub fn get_current(&self, viewer_role: Option<&Role>) -> ChResult<Option<BroadcastRecord>> {
        let Some(record) = self.store.most_recent_as::<BroadcastRecord>(&self.log())? else {
            return Ok(None);
        };
        if record.is_staff_only() && !viewer_role.is_some_and(Role::is_staff) {
            debug!("hiding staff-only broadcast from non-staff viewer");
            return Ok(None);
        }
        Ok(Some(record))
    }

    /// Full history, newest first.
    pub fn get_all(&self) -> ChResult<Vec<BroadcastRecord>> {
        self.store.read_all_as(&self.log(), RecordOrder::NewestFirst)
    }

    /// Append a new broadcast and refresh the mirror file.
    pub fn submit(&self, message: &str, audience: Audience, actor: &Viewer) -> ChResult<BroadcastRecord> {
        if !actor.role.can_broadcast() {
            return Err(ChError::AuthorizationDenied(format!(
                "{} ({}) may not broadcast",
                actor.username, actor.role
            )));
        }
        if message.trim().is_empty() {
            return Err(ChError::Validation("Empty message: nothing done".into()));
        }

        let record = BroadcastRecord::new_now(message, actor.username.as_str(), audience);
        self.store.append_record(&self.log(), &record)?;
        info!(
            "broadcast from {} to {}: {} chars",
            actor.username,
            audience,
            record.msg.len()
        );
        self.mirror.publish(&record);
        Ok(record)
    }

    /// Admin form followed by the history table.
    pub fn show_form(&self, extra_html: &str) -> ChResult<String> {
        let history = self.get_all()?;

        let mut html = String::from(
            "<p>Fill in this form to immediately broadcast a message to users currently \
             connected to the course site. Leave the switch off to limit the message to \
             staff, or turn it on to send it to everyone.</p>",
        );
        html.push_str("<form method='POST'>");
        html.push_str(&format!(
            "<p>New (short) message to broadcast: <input type=\"text\" size=120 value=\"\" name=\"{}\"></input></p>",
            fields::MSG
        ));
        html.push_str(&format!(
            "<p>Send to staff only <label class=\"switch\">\
             <input type=\"checkbox\" name=\"{}\">\
             <span class=\"slider round\"></span>\
             </label> Broadcast to everyone: students and staff</p>",
            fields::EVERYONE
        ));
        html.push_str(&format!(
            "<p><input type=\"submit\" name=\"{}\" value=\"{}\"></input></p>",
            fields::BROADCAST,
            fields::BROADCAST
        ));
        html.push_str("</form>");
        html.push_str(extra_html);

        html.push_str("<div><table><tr><th>Date</th><th>Author</th><th>Audience</th><th>Message</th></tr>");
        for record in &history {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape(&record.datetime),
                escape(&record.creator),
                record.audience,
                escape(&record.msg)
            ));
        }
        html.push_str("</table></div>");
        Ok(html)
    }

    fn process_form_save(&self, ctx: &RequestContext, actor: &Viewer) -> ChResult<String> {
        let form = ctx.form.clone().unwrap_or_default();
        let message = form.get(fields::MSG).unwrap_or_default();
        let audience = Audience::from_everyone(form.get(fields::EVERYONE));

        let status = match self.submit(message, audience, actor) {
            Ok(_) => feedback("green", "Message broadcast!"),
            Err(ChError::Validation(msg)) => feedback("red", &msg),
            Err(e) => return Err(e),
        };
        self.show_form(&status)
    }

    fn current_json(&self, ctx: &RequestContext) -> ChResult<String> {
        let body = match self.get_current(ctx.role())? {
            Some(record) => serde_json::to_string(&record)?,
            None => "{}".to_string(),
        };
        Ok(body)
    }
}

impl PagePlugin for BroadcastService {
    fn name(&self) -> &str {
        PAGE_NAME
    }

    fn dispatch(&self, ctx: &RequestContext) -> ChResult<PageResponse> {
        let Some(form) = &ctx.form else {
            return Ok(PageResponse::Empty);
        };
        let actor = ctx.viewer.as_ref().filter(|v| v.role.can_broadcast());

        if let Some(actor) = actor {
            if form.is_empty() {
                return Ok(PageResponse::Html(self.show_form("")?));
            }
            if form.contains(fields::BROADCAST) {
                return Ok(PageResponse::Html(self.process_form_save(ctx, actor)?));
            }
        }
        if form.contains(fields::GET) {
            return Ok(PageResponse::raw(content_types::JSON, self.current_json(ctx)?));
        }
        match actor {
            Some(_) => Ok(PageResponse::Html(self.show_form("")?)),
            None => Ok(PageResponse::Empty),
        }
    }
}
