//! Per-request instrumentation pipeline.
//!
//! Stages run in a fixed order for every request:
//!
//! 1. **init**: pick the [`Context`] from the path and honour a reset request.
//! 2. **handler**: run the route with a fresh [`QueryCounter`] in its
//!    extensions, timing it.
//! 3. **footer**: for HTML pages, record the load time, sample, persist, log.
//! 4. **render**: inject head markup and the footer block into the page.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{Query, Request, State},
    http::{header, HeaderMap, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Result, StatsError};
use crate::history::Context;
use crate::log_emitter::{self, LogRecord};
use crate::metrics::{memory, MetricsSnapshot, QueryCounter};
use crate::render::{self, PageStats};
use crate::sampler;
use crate::AppState;

/// `?reset_page_load_stats=1` clears the current context's history.
pub const RESET_PARAM: &str = "reset_page_load_stats";
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";
pub const ADMIN_COOKIE: &str = "page_load_stats_admin";

pub async fn page_stats_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let start = Instant::now();
    let context = Context::from_path(req.uri().path());
    let admin = is_admin(&state.config, req.headers());

    // ── init ────────────────────────────────────────────────────
    if admin && reset_requested(req.uri()) {
        let target = redirect_target(req.headers());
        return Ok(reset(&state, context, &target).await);
    }

    // ── handler ─────────────────────────────────────────────────
    let queries = QueryCounter::new();
    req.extensions_mut().insert(queries.clone());
    let response = next.run(req).await;

    if !is_html_page(&response) {
        return Ok(response);
    }
    let elapsed = start.elapsed();

    let (mut parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|e| StatsError::Internal(format!("buffering page body: {e}")))?;
    let html = match String::from_utf8(bytes.to_vec()) {
        Ok(s) => s,
        Err(e) => return Ok(Response::from_parts(parts, Body::from(e.into_bytes()))),
    };

    // ── footer ──────────────────────────────────────────────────
    let stats = footer(&state, context, elapsed, queries.get()).await;

    // ── render ──────────────────────────────────────────────────
    let page = render::inject(
        &html,
        &render::head_markup(),
        &render::footer_markup(admin.then_some(&stats)),
    );
    parts.headers.remove(header::CONTENT_LENGTH);
    Ok(Response::from_parts(parts, Body::from(page)))
}

async fn footer(state: &AppState, context: Context, elapsed: Duration, query_count: u32) -> PageStats {
    let config = &state.config;
    let snapshot =
        MetricsSnapshot::capture(elapsed, query_count, memory::probe(), config.memory_limit_bytes());

    // Unrounded, so sub-millisecond pages still count as a run.
    let recorded = state.history.record(context, elapsed.as_secs_f64()).await;

    let sampled = sampler::should_sample(config.sample_rate, &mut rand::thread_rng());
    if sampled {
        if let Err(e) = state
            .history
            .persist(context, &recorded.history, config.history_ttl())
            .await
        {
            warn!(context = context.as_str(), error = %e, "persisting load-time history failed");
        }
        let record = LogRecord::new(&snapshot, recorded.average, recorded.history.len());
        log_emitter::append(&config.log_path(), &record).await;
    }

    PageStats {
        snapshot,
        average_load_secs: recorded.average,
        runs: recorded.history.len(),
    }
}

async fn reset(state: &AppState, context: Context, redirect_to: &str) -> Response {
    match state.history.reset(context).await {
        Ok(()) => info!(context = context.as_str(), "load-time history reset"),
        Err(e) => warn!(context = context.as_str(), error = %e, "load-time history reset failed"),
    }
    Redirect::to(redirect_to).into_response()
}

/// With no token configured everyone is an administrator.
pub fn is_admin(config: &Config, headers: &HeaderMap) -> bool {
    let Some(token) = config.admin_token.as_deref() else {
        return true;
    };
    let from_header = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == token);
    from_header || cookie(headers, ADMIN_COOKIE).is_some_and(|v| v == token)
}

fn cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
}

fn reset_requested(uri: &Uri) -> bool {
    Query::<HashMap<String, String>>::try_from_uri(uri)
        .map(|Query(q)| q.get(RESET_PARAM).is_some_and(|v| v == "1"))
        .unwrap_or(false)
}

/// Same-origin `Referer` path, or `/`.
fn redirect_target(headers: &HeaderMap) -> String {
    let Some(referer) = headers.get(header::REFERER).and_then(|v| v.to_str().ok()) else {
        return "/".into();
    };
    let Ok(uri) = referer.parse::<Uri>() else {
        return "/".into();
    };

    let same_origin = match uri.authority() {
        None => referer.starts_with('/') && !referer.starts_with("//"),
        Some(authority) => headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .is_some_and(|host| host.eq_ignore_ascii_case(authority.as_str())),
    };
    if !same_origin {
        return "/".into();
    }

    uri.path_and_query()
        .map(|pq| pq.as_str().to_owned())
        .filter(|pq| pq.starts_with('/'))
        .unwrap_or_else(|| "/".into())
}

fn is_html_page(response: &Response) -> bool {
    let headers = response.headers();
    response.status().is_success()
        && !headers.contains_key(header::CONTENT_ENCODING)
        && headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("text/html"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn admin_by_header_or_cookie() {
        let config = Config {
            admin_token: Some("s3cret".into()),
            ..Config::default()
        };
        let by_header = headers(&[(header::HeaderName::from_static(ADMIN_TOKEN_HEADER), "s3cret")]);
        let by_cookie = headers(&[(header::COOKIE, "theme=dark; page_load_stats_admin=s3cret")]);
        let wrong = headers(&[(header::COOKIE, "page_load_stats_admin=nope")]);

        assert!(is_admin(&config, &by_header));
        assert!(is_admin(&config, &by_cookie));
        assert!(!is_admin(&config, &wrong));
        assert!(!is_admin(&config, &HeaderMap::new()));
    }

    #[test]
    fn no_token_means_everyone_is_admin() {
        assert!(is_admin(&Config::default(), &HeaderMap::new()));
    }

    #[test]
    fn reset_flag_must_equal_one() {
        assert!(reset_requested(&"/?reset_page_load_stats=1".parse().unwrap()));
        assert!(reset_requested(&"/admin?a=b&reset_page_load_stats=1".parse().unwrap()));
        assert!(!reset_requested(&"/?reset_page_load_stats=0".parse().unwrap()));
        assert!(!reset_requested(&"/".parse().unwrap()));
    }

    #[test]
    fn redirects_only_to_same_origin() {
        assert_eq!(redirect_target(&HeaderMap::new()), "/");
        assert_eq!(redirect_target(&headers(&[(header::REFERER, "/admin?tab=2")])), "/admin?tab=2");
        assert_eq!(
            redirect_target(&headers(&[
                (header::REFERER, "http://site.test/admin"),
                (header::HOST, "site.test"),
            ])),
            "/admin"
        );
        assert_eq!(
            redirect_target(&headers(&[
                (header::REFERER, "http://evil.test/phish"),
                (header::HOST, "site.test"),
            ])),
            "/"
        );
    }
}
