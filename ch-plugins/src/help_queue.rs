//! Help-queue injection into rendered course pages.
//!
//! Per render: collect the problems the viewer has not yet fully solved, add
//! "Ask for Help" (and, for checkoff problems, "Ask for Checkoff") buttons next
//! to each problem's own button row, and load the queue client with a view
//! chosen from the viewer's role and the `queue_view` request field.
//! Anonymous requests get none of it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use ch_core::config::{AppConfig, HelpQueueConfig};
use ch_core::constants::fields;
use ch_core::context::{FormData, RequestContext};
use ch_core::error::ChResult;
use ch_core::role::Role;
use ch_store::{ProblemState, RecordStore, RecordStoreExt};

use crate::html::{escape, escape_js, join_url};
use crate::page::RenderedPage;

/// Question type that also gets a checkoff button.
pub const CHECKOFF_QTYPE: &str = "checkoff";

/// Attribute text of a tag: anything up to `>`, with quoted values allowed to
/// contain `>`.
const TAG_ATTRS: &str = r#"(?:[^>"']|"[^"]*"|'[^']*')*"#;

lazy_static! {
    // Tag name of an opening tag.
    static ref OPEN_TAG_NAME: Regex = Regex::new(r"^<([A-Za-z][A-Za-z0-9-]*)").unwrap();

    // Comments and raw-text elements whose contents are not markup.
    static ref RAW_TEXT: Regex = Regex::new(&format!(
        r"(?is)<!--.*?-->|<script\b{TAG_ATTRS}>.*?</script\s*>|<style\b{TAG_ATTRS}>.*?</style\s*>"
    ))
    .unwrap();
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// A problem as rendered on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageProblem {
    pub name: String,
    pub qtype: String,
    #[serde(default)]
    pub display_name: String,
}

impl PageProblem {
    pub fn new(name: impl Into<String>, qtype: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qtype: qtype.into(),
            display_name: display_name.into(),
        }
    }

    pub fn is_checkoff(&self) -> bool {
        self.qtype == CHECKOFF_QTYPE
    }
}

/// Which queue client view to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueView {
    StaffView,
    StudentStatic,
    StudentPopup,
}

impl QueueView {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueView::StaffView => "staff_view",
            QueueView::StudentStatic => "student_static",
            QueueView::StudentPopup => "student_popup",
        }
    }

    /// CSS selector the client mounts into.
    pub fn container(&self) -> &'static str {
        match self {
            QueueView::StudentPopup => "body",
            _ => "#queue-container",
        }
    }
}

impl fmt::Display for QueueView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the view for `role`.
///
/// Off the queue page everyone gets the popup. On it, staff load the staff
/// view unless `queue_view=student`, student-staff load the student view
/// unless `queue_view=staff`, and everyone else gets the student view.
pub fn select_view(role: &Role, queue_page: bool, form: Option<&FormData>) -> QueueView {
    if !queue_page {
        return QueueView::StudentPopup;
    }
    let requested = form.and_then(|f| f.get(fields::QUEUE_VIEW));
    let staff = if role.can_view_staff_queue() {
        requested != Some("student")
    } else if role.is_student_staff() {
        requested == Some("staff")
    } else {
        false
    };
    if staff {
        QueueView::StaffView
    } else {
        QueueView::StudentStatic
    }
}

/// Problems still worth asking about: score for the viewer is not 1.
pub fn retain_unsolved(state: &ProblemState, problems: &[PageProblem]) -> BTreeMap<String, PageProblem> {
    problems
        .iter()
        .filter(|p| !state.is_complete(&p.name))
        .map(|p| (p.name.clone(), p.clone()))
        .collect()
}

/// Insert queue buttons after each question's `<name>_buttons` element.
///
/// Questions without a `cs_qdiv_<name>` container, or without a button row
/// inside it, are left alone.
pub fn inject_buttons(content: &str, questions: &BTreeMap<String, PageProblem>) -> String {
    let mut html = content.to_string();
    for (name, problem) in questions {
        let Some(qdiv) = find_element_by_id(&html, &format!("cs_qdiv_{name}"), 0..html.len()) else {
            debug!("no container for question {name}");
            continue;
        };
        let Some(buttons) = find_element_by_id(&html, &format!("{name}_buttons"), qdiv.open_end..qdiv.end)
        else {
            debug!("no button row for question {name}");
            continue;
        };
        html.insert_str(buttons.end, &queue_buttons(problem));
    }
    html
}

/// The `<span>` holding one question's queue buttons.
pub fn queue_buttons(problem: &PageProblem) -> String {
    let mut span = format!("<span id=\"{}_queue_buttons\">", escape(&problem.name));
    span.push(' ');
    span.push_str(&queue_button(problem, "help", "Ask for Help"));
    if problem.is_checkoff() {
        span.push(' ');
        span.push_str(&queue_button(problem, "checkoff", "Ask for Checkoff"));
    }
    span.push_str("</span>");
    span
}

fn queue_button(problem: &PageProblem, entry_type: &str, label: &str) -> String {
    let add = format!(
        "queue.add('{entry_type}', {{location: queue.get('location'), assignment: {{name: '{}', \
         page: catsoop.this_path, path: catsoop.path_info, display_name: '{}'}}}})",
        escape_js(&problem.name),
        escape_js(&problem.display_name),
    );
    let onclick = format!(
        "!queue.get('location') ? catsoop.modal('Enter Table Number', 'Please enter your table number:', true, true)\
         .then(function(text) {{ if (typeof text.value !== 'undefined') {{ queue.set('location', text.value); {add}; \
         queue.set('_visible', true); }} }}) : ({add}, queue.set('_visible', true))"
    );
    format!(
        "<button class=\"btn btn-catsoop\" onclick=\"{}\">{label}</button>",
        escape(&onclick)
    )
}

/// Byte offsets of one element in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Element {
    open_end: usize,
    end: usize,
}

/// Locate the element carrying `id` whose opening tag starts inside `within`,
/// and find its matching close tag by counting nested tags of the same name.
///
/// Ids match exactly. Comments, scripts and styles are blanked before
/// searching so markup-like text inside them is ignored; offsets still refer
/// to `html`.
fn find_element_by_id(html: &str, id: &str, within: std::ops::Range<usize>) -> Option<Element> {
    let pattern = format!(
        r#"<[A-Za-z][A-Za-z0-9-]*\b{TAG_ATTRS}?\s(?i:id)\s*=\s*(?:"{id}"|'{id}'){TAG_ATTRS}>"#,
        id = regex::escape(id)
    );
    let id_re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            warn!("bad element id pattern for {id}: {e}");
            return None;
        }
    };

    let masked = mask_raw_text(html);
    let region = masked.get(within.clone())?;
    let open = id_re.find(region)?;
    let open_end = within.start + open.end();
    let open_tag = open.as_str();

    let tag = OPEN_TAG_NAME.captures(open_tag)?.get(1)?.as_str().to_ascii_lowercase();
    if open_tag.ends_with("/>") || VOID_ELEMENTS.contains(&tag.as_str()) {
        return Some(Element { open_end, end: open_end });
    }

    let tag_re = Regex::new(&format!(r"(?i)<(/?){}\b{TAG_ATTRS}>", regex::escape(&tag))).ok()?;
    let mut depth = 1usize;
    for m in tag_re.captures_iter(masked.get(open_end..within.end)?) {
        let whole = m.get(0)?;
        if whole.as_str().ends_with("/>") {
            continue;
        }
        if m.get(1).is_some_and(|c| !c.as_str().is_empty()) {
            depth -= 1;
            if depth == 0 {
                return Some(Element {
                    open_end,
                    end: open_end + whole.end(),
                });
            }
        } else {
            depth += 1;
        }
    }
    None
}

/// Replace comment, script and style spans with spaces of the same byte length.
fn mask_raw_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    for m in RAW_TEXT.find_iter(html) {
        out.push_str(&html[last..m.start()]);
        out.extend(std::iter::repeat(' ').take(m.len()));
        last = m.end();
    }
    out.push_str(&html[last..]);
    out
}

/// Stylesheet links and script tags for the queue client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueAssets {
    pub stylesheets: String,
    pub scripts: String,
}

pub struct HelpQueueInjector {
    store: Arc<dyn RecordStore>,
    config: HelpQueueConfig,
}

impl HelpQueueInjector {
    pub fn new(store: Arc<dyn RecordStore>, config: HelpQueueConfig) -> Self {
        Self { store, config }
    }

    pub fn from_config(store: Arc<dyn RecordStore>, config: &AppConfig) -> Self {
        Self::new(store, config.help_queue.clone())
    }

    fn url_root(&self) -> String {
        AppConfig::sanitize_url_root(&self.config.url_root)
    }

    /// Problems on the page the viewer has not yet scored 1 on.
    /// Empty for anonymous viewers.
    pub fn collect_questions(
        &self,
        ctx: &RequestContext,
        problems: &[PageProblem],
    ) -> ChResult<BTreeMap<String, PageProblem>> {
        let Some(username) = ctx.username() else {
            return Ok(BTreeMap::new());
        };
        let key = ProblemState::log_key(&ctx.course, username, &ctx.path_info);
        let state: ProblemState = self.store.most_recent_as(&key)?.unwrap_or_default();
        Ok(retain_unsolved(&state, problems))
    }

    /// Queue client assets for the viewer, or `None` when anonymous.
    pub fn render_assets(&self, ctx: &RequestContext, queue_page: bool) -> Option<QueueAssets> {
        let role = ctx.role()?;
        let view = select_view(role, queue_page, ctx.form.as_ref());
        let root = self.url_root();

        let stylesheets = self
            .config
            .stylesheets
            .iter()
            .map(|sheet| format!("<link href=\"{}\" rel=\"stylesheet\">", escape(&join_url(&root, &["css", sheet]))))
            .collect::<Vec<_>>()
            .join("\n");

        let mut scripts = self
            .config
            .scripts
            .iter()
            .map(|script| format!("<script src=\"{}\"></script>", escape(&join_url(&root, &["js", script]))))
            .collect::<Vec<_>>()
            .join("\n");

        let is_staff = role.can_view_staff_queue() || role.is_student_staff();
        scripts.push_str(&format!(
            "\n<script>\ncatsoop.plugins.queue = {{\n    url_root: '{}',\n    is_staff: {is_staff},\n    \
             container: \"{}\",\n    view: '{}',\n    room: '{}',\n}};\n</script>\n",
            escape_js(&root),
            view.container(),
            view,
            escape_js(self.config.room.as_deref().unwrap_or_default()),
        ));

        Some(QueueAssets { stylesheets, scripts })
    }

    /// Run the whole injection against a page about to be sent.
    pub fn apply(
        &self,
        ctx: &RequestContext,
        page: &mut RenderedPage,
        problems: &[PageProblem],
        queue_page: bool,
    ) -> ChResult<()> {
        let Some(assets) = self.render_assets(ctx, queue_page) else {
            return Ok(());
        };
        let questions = self.collect_questions(ctx, problems)?;
        if !questions.is_empty() {
            page.content = inject_buttons(&page.content, &questions);
        }
        page.scripts.push_str(&assets.stylesheets);
        page.content.push_str(&assets.scripts);
        debug!("help queue injected: {} question(s)", questions.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> FormData {
        FormData::from_pairs(pairs.iter().copied())
    }

    #[test]
    fn test_view_off_queue_page_is_popup() {
        for role in [Role::Ta, Role::Sla, Role::Student] {
            assert_eq!(select_view(&role, false, None), QueueView::StudentPopup);
        }
    }

    #[test]
    fn test_view_staff_defaults_to_staff() {
        assert_eq!(select_view(&Role::Ta, true, None), QueueView::StaffView);
        assert_eq!(
            select_view(&Role::La, true, Some(&form(&[("queue_view", "student")]))),
            QueueView::StudentStatic
        );
    }

    #[test]
    fn test_view_student_staff_defaults_to_student() {
        assert_eq!(select_view(&Role::Sla, true, None), QueueView::StudentStatic);
        assert_eq!(
            select_view(&Role::Sla, true, Some(&form(&[("queue_view", "staff")]))),
            QueueView::StaffView
        );
    }

    #[test]
    fn test_view_students_cannot_escalate() {
        assert_eq!(
            select_view(&Role::Student, true, Some(&form(&[("queue_view", "staff")]))),
            QueueView::StudentStatic
        );
    }

    #[test]
    fn test_container() {
        assert_eq!(QueueView::StudentPopup.container(), "body");
        assert_eq!(QueueView::StaffView.container(), "#queue-container");
    }

    #[test]
    fn test_retain_unsolved() {
        let mut state = ProblemState::default();
        state.scores.insert("done".into(), 1.0);
        state.scores.insert("partial".into(), 0.5);
        let problems = vec![
            PageProblem::new("done", "pythoncode", "Done"),
            PageProblem::new("partial", "pythoncode", "Partial"),
            PageProblem::new("fresh", "checkoff", "Fresh"),
        ];
        let kept = retain_unsolved(&state, &problems);
        assert_eq!(kept.keys().collect::<Vec<_>>(), vec!["fresh", "partial"]);
    }

    #[test]
    fn test_inject_after_button_row() {
        let html = r#"<div id="cs_qdiv_q1"><div>body</div><span id="q1_buttons"><button>Submit</button></span><div id="q1_message"></div></div>"#;
        let mut questions = BTreeMap::new();
        questions.insert("q1".to_string(), PageProblem::new("q1", "pythoncode", "Q1"));

        let out = inject_buttons(html, &questions);
        let row_end = out.find("</button></span>").unwrap() + "</button></span>".len();
        assert!(out[row_end..].starts_with(r#"<span id="q1_queue_buttons">"#));
        assert!(out.contains("Ask for Help"));
        assert!(!out.contains("Ask for Checkoff"));
    }

    #[test]
    fn test_inject_handles_nested_same_tag() {
        let html = r#"<div id="cs_qdiv_q"><div id="q_buttons"><div>inner</div></div>tail</div>"#;
        let mut questions = BTreeMap::new();
        questions.insert("q".to_string(), PageProblem::new("q", "checkoff", "Q"));

        let out = inject_buttons(html, &questions);
        let idx = out.find(r#"<span id="q_queue_buttons">"#).unwrap();
        assert!(out[..idx].ends_with("<div>inner</div></div>"));
        assert!(out.contains("Ask for Checkoff"));
    }

    #[test]
    fn test_inject_skips_missing_container_or_row() {
        let html = r#"<div id="cs_qdiv_a">no buttons</div><span id="b_buttons"></span>"#;
        let mut questions = BTreeMap::new();
        questions.insert("a".to_string(), PageProblem::new("a", "x", "A"));
        questions.insert("b".to_string(), PageProblem::new("b", "x", "B"));
        assert_eq!(inject_buttons(html, &questions), html);
    }

    #[test]
    fn test_button_row_outside_container_is_ignored() {
        let html = r#"<div id="cs_qdiv_a"></div><span id="a_buttons"></span>"#;
        let mut questions = BTreeMap::new();
        questions.insert("a".to_string(), PageProblem::new("a", "x", "A"));
        assert_eq!(inject_buttons(html, &questions), html);
    }

    fn checkoff(name: &str) -> BTreeMap<String, PageProblem> {
        let mut questions = BTreeMap::new();
        questions.insert(name.to_string(), PageProblem::new(name, "checkoff", name));
        questions
    }

    fn injected_after(out: &str, row: &str, name: &str) -> bool {
        let marker = format!(r#"<span id="{name}_queue_buttons">"#);
        out.find(&marker).is_some_and(|idx| out[..idx].ends_with(row))
    }

    #[test]
    fn test_ids_match_case_sensitively() {
        let html = concat!(
            r#"<div id="cs_qdiv_Q"><span id="Q_buttons">upper</span></div>"#,
            r#"<div id="cs_qdiv_q"><span id="q_buttons">lower</span></div>"#,
        );
        let out = inject_buttons(html, &checkoff("q"));
        assert!(injected_after(&out, r#"<span id="q_buttons">lower</span>"#, "q"));
        assert!(out.starts_with(r#"<div id="cs_qdiv_Q"><span id="Q_buttons">upper</span></div>"#));
    }

    #[test]
    fn test_script_text_is_not_markup() {
        let html = r#"<div id="cs_qdiv_q"><script>var t = "<div>";</script><div id="q_buttons">row</div></div>"#;
        let out = inject_buttons(html, &checkoff("q"));
        assert!(injected_after(&out, r#"<div id="q_buttons">row</div>"#, "q"));
    }

    #[test]
    fn test_comments_and_styles_are_not_markup() {
        let html = concat!(
            r#"<div id="cs_qdiv_q"><!-- <div> --><style>div > p { color: red }</style>"#,
            r#"<div id="q_buttons">row</div></div>"#,
        );
        let out = inject_buttons(html, &checkoff("q"));
        assert!(injected_after(&out, r#"<div id="q_buttons">row</div>"#, "q"));
    }

    #[test]
    fn test_commented_out_row_is_ignored() {
        let html = r#"<div id="cs_qdiv_q"><!-- <span id="q_buttons"></span> --></div>"#;
        assert_eq!(inject_buttons(html, &checkoff("q")), html);
    }

    #[test]
    fn test_quoted_attribute_may_contain_gt() {
        let html = r#"<div data-cond="a>b" id="cs_qdiv_q"><div class='x>y' id="q_buttons">row</div></div>"#;
        let out = inject_buttons(html, &checkoff("q"));
        assert!(injected_after(&out, r#"<div class='x>y' id="q_buttons">row</div>"#, "q"));
    }

    #[test]
    fn test_button_escapes_display_name() {
        let span = queue_buttons(&PageProblem::new("q", "x", "Bob's \"lab\""));
        assert!(span.contains("Bob\\&#x27;s"));
        assert!(!span.contains("\"lab\""));
    }
}
