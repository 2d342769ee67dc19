//! HTTP server using hyper 1.x.
//!
//! Routes:
//! - `GET /health`                      -- liveness, no auth
//! - `GET|POST /pages/{broadcast,remote_queue}` -- page dispatch
//! - `POST /hooks/render`               -- preloader + help-queue injection
//!
//! Everything but `/health` requires `Authorization: Bearer <token>`.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info, info_span, warn, Instrument};

use ch_core::constants::content_types;
use ch_core::context::{FormData, Viewer};
use ch_core::error::{ChError, ChResult};
use ch_core::role::Role;
use ch_plugins::{PageProblem, PageResponse, RenderedPage};

use crate::auth::ServerAuth;
use crate::form;
use crate::state::AppState;
use crate::{ROLE_HEADER, USER_HEADER};

type BoxBody = http_body_util::combinators::UnsyncBoxBody<Bytes, Infallible>;
type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Largest request body accepted, in bytes.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

const PAGES_PREFIX: &str = "/pages/";

/// Shared context passed to every request handler.
pub struct ServerContext {
    pub auth: Arc<ServerAuth>,
    pub state: Arc<AppState>,
}

/// Bind the listener.
pub async fn bind(addr: SocketAddr) -> ChResult<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| ChError::Http(format!("failed to bind {addr}: {e}")))
}

/// Serve connections until the shutdown flag flips to `true`.
pub async fn serve(
    listener: TcpListener,
    ctx: Arc<ServerContext>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> ChResult<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("coursehelp server listening on http://{addr}");
    }

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, remote)) => {
                        let ctx = ctx.clone();
                        debug!("connection from {remote}");
                        tokio::task::spawn(async move {
                            let svc = service_fn(move |req| {
                                let ctx = ctx.clone();
                                async move { handle_request(req, ctx).await }
                            });
                            if let Err(e) = http1::Builder::new()
                                .serve_connection(hyper_util::rt::TokioIo::new(stream), svc)
                                .await
                            {
                                debug!("connection error: {e}");
                            }
                        });
                    }
                    Err(e) => {
                        warn!("accept error: {e}");
                    }
                }
            }
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    info!("server shutting down");
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Route an incoming HTTP request.
pub async fn handle_request<B>(req: Request<B>, ctx: Arc<ServerContext>) -> Result<Response<BoxBody>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let request_id = uuid::Uuid::new_v4();
    let span = info_span!("request", id = %request_id, method = %req.method(), path = %req.uri().path());
    Ok(route(req, ctx).instrument(span).await)
}

async fn route<B>(req: Request<B>, ctx: Arc<ServerContext>) -> Response<BoxBody>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    if method == Method::GET && path == "/health" {
        return text_response(StatusCode::OK, "text/plain", "ok");
    }

    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if !ctx.auth.validate(auth_header).await {
        warn!("unauthorized request to {path}");
        return json_error(StatusCode::UNAUTHORIZED, "unauthorized");
    }

    let result = match (&method, path.as_str()) {
        (&Method::GET | &Method::POST, p) if p.starts_with(PAGES_PREFIX) => {
            let page = p[PAGES_PREFIX.len()..].trim_end_matches('/').to_string();
            handle_page(req, ctx, page).await
        }
        (&Method::POST, "/hooks/render") => handle_render_hook(req, ctx).await,
        _ => Ok(json_error(StatusCode::NOT_FOUND, "not found")),
    };

    result.unwrap_or_else(|e| {
        if e.is_store_unavailable() {
            error!("record store unavailable for {path}: {e}");
        } else {
            error!("request failed: {e}");
        }
        json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
    })
}

/// Identity forwarded by the host. Both headers must be present.
pub fn viewer_from_headers(headers: &HeaderMap) -> Option<Viewer> {
    let get = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };
    let username = get(USER_HEADER)?;
    let role: Role = get(ROLE_HEADER)?.into();
    Some(Viewer::new(username, role))
}

async fn read_body<B>(body: B) -> Result<Bytes, Response<BoxBody>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            warn!("request body over {MAX_BODY_BYTES} bytes");
            Err(json_error(StatusCode::PAYLOAD_TOO_LARGE, "request body too large"))
        }
        Err(e) => Err(json_error(StatusCode::BAD_REQUEST, &format!("failed to read body: {e}"))),
    }
}

/// `GET|POST /pages/<name>`
async fn handle_page<B>(req: Request<B>, ctx: Arc<ServerContext>, page: String) -> ChResult<Response<BoxBody>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    if ctx.state.registry.get(&page).is_none() {
        return Ok(json_error(StatusCode::NOT_FOUND, "no such page"));
    }

    let viewer = viewer_from_headers(req.headers());
    let query = req.uri().query().map(str::to_string);
    let body = match read_body(req.into_body()).await {
        Ok(bytes) => bytes,
        Err(resp) => return Ok(resp),
    };
    let form = form::merge(query.as_deref(), &body);
    let request_ctx = ctx.state.context(viewer, ctx.state.page_path(&page), Some(form));

    let state = ctx.state.clone();
    let response = tokio::task::spawn_blocking(move || state.registry.dispatch(&page, &request_ctx))
        .await
        .map_err(|e| ChError::Internal(format!("page task failed: {e}")))??;

    Ok(match response {
        None | Some(PageResponse::Empty) => text_response(StatusCode::OK, content_types::HTML, ""),
        Some(PageResponse::Html(html)) => text_response(StatusCode::OK, content_types::HTML, &html),
        Some(PageResponse::Raw { content_type, body }) => text_response(StatusCode::OK, &content_type, &body),
    })
}

/// Body of `POST /hooks/render`.
#[derive(Debug, Deserialize)]
pub struct RenderHookRequest {
    #[serde(flatten)]
    pub page: RenderedPage,
    #[serde(default)]
    pub problems: Vec<PageProblem>,
    #[serde(default)]
    pub queue_page: bool,
    #[serde(default)]
    pub path_info: Vec<String>,
    #[serde(default)]
    pub form: Option<FormData>,
}

/// `POST /hooks/render`
async fn handle_render_hook<B>(req: Request<B>, ctx: Arc<ServerContext>) -> ChResult<Response<BoxBody>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let viewer = viewer_from_headers(req.headers());
    let body = match read_body(req.into_body()).await {
        Ok(bytes) => bytes,
        Err(resp) => return Ok(resp),
    };
    let hook: RenderHookRequest = match serde_json::from_slice(&body) {
        Ok(hook) => hook,
        Err(e) => return Ok(json_error(StatusCode::BAD_REQUEST, &format!("invalid render hook: {e}"))),
    };

    let state = ctx.state.clone();
    let page = tokio::task::spawn_blocking(move || -> ChResult<RenderedPage> {
        let request_ctx = state.context(viewer, hook.path_info, hook.form);
        let mut page = hook.page;
        state.preloader.apply(&request_ctx, &mut page);
        state
            .injector
            .apply(&request_ctx, &mut page, &hook.problems, hook.queue_page)?;
        Ok(page)
    })
    .await
    .map_err(|e| ChError::Internal(format!("render task failed: {e}")))??;

    let body = serde_json::to_string(&page)?;
    Ok(text_response(StatusCode::OK, content_types::JSON, &body))
}

// ─── Response Helpers ────────────────────────────────────────────────────────

fn full_body(s: &str) -> BoxBody {
    BoxBody::new(Full::new(Bytes::from(s.to_string())).map_err(|never| match never {}))
}

fn text_response(status: StatusCode, content_type: &str, body: &str) -> Response<BoxBody> {
    let mut resp = Response::new(full_body(body));
    *resp.status_mut() = status;
    let value = HeaderValue::from_str(content_type).unwrap_or(HeaderValue::from_static("text/plain"));
    resp.headers_mut().insert(CONTENT_TYPE, value);
    resp
}

fn json_error(status: StatusCode, message: &str) -> Response<BoxBody> {
    let body = serde_json::json!({ "error": message });
    text_response(status, content_types::JSON, &body.to_string())
}
