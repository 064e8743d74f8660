//! HTTP routes.
//!
//! | Method   | Path                                   | Operation       |
//! |----------|----------------------------------------|-----------------|
//! | `GET`    | `/-/ping`                              | liveness        |
//! | `GET`    | `/-/package/<name>`                    | package record  |
//! | `GET`    | `/-/package/<name>/dist-tags`          | show tags       |
//! | `PUT`    | `/-/package/<name>/dist-tags/<tag>`    | save tag        |
//! | `DELETE` | `/-/package/<name>/dist-tags/<tag>`    | remove tag      |
//! | `GET`    | `/<name>`                              | package record  |
//!
//! `<name>` is either `koa` or `@scope/name`; the scope separator may be sent
//! raw or URL-encoded (`@cnpm%2Fkoa`). Path segments are percent-decoded
//! before they reach the service, so `%20beta2%20` arrives as ` beta2 `.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{Path, Request, State};
use axum::http::{Method, Uri};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use disttag_core::{PackageName, TagMap};
use disttag_registry::TagRegistry;
use percent_encoding::percent_decode_str;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::auth::{Authenticated, TokenTable};
use crate::error::ApiError;

const DIST_TAGS: &str = "dist-tags";

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The tag service.
    pub registry: TagRegistry,
    /// Token lookup table.
    pub tokens: Arc<TokenTable>,
}

impl AppState {
    /// Creates handler state.
    #[must_use]
    pub fn new(registry: TagRegistry, tokens: TokenTable) -> Self {
        Self {
            registry,
            tokens: Arc::new(tokens),
        }
    }
}

/// Builds the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/-/ping", get(ping))
        .route(
            "/-/package/*path",
            get(read_package_path).put(save_tag).delete(remove_tag),
        )
        .fallback(package_document)
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// What a decoded `/-/package/...` path addresses.
#[derive(Debug, PartialEq, Eq)]
enum Target {
    Package(String),
    Tags(String),
    Tag(String, String),
}

/// Joins one segment (`koa`) or a scope plus a name (`@cnpm`, `koa`).
fn join_name(segments: &[&str]) -> Option<String> {
    match segments {
        [name] if !name.is_empty() => Some((*name).to_string()),
        [scope, name] if scope.starts_with('@') => Some(format!("{scope}/{name}")),
        _ => None,
    }
}

fn parse_target(path: &str) -> Option<Target> {
    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    let Some(at) = segments.iter().skip(1).position(|s| *s == DIST_TAGS) else {
        return join_name(&segments).map(Target::Package);
    };

    let (name, rest) = segments.split_at(at + 1);
    let name = join_name(name)?;
    match rest {
        [_] => Some(Target::Tags(name)),
        [_, tag] => Some(Target::Tag(name, (*tag).to_string())),
        _ => None,
    }
}

fn no_route(uri: &Uri) -> ApiError {
    ApiError::NoRoute {
        path: uri.path().to_string(),
    }
}

fn ok() -> Json<Value> {
    Json(json!({ "ok": true }))
}

async fn ping() -> Json<Value> {
    ok()
}

async fn read_package_path(
    State(state): State<AppState>,
    Path(path): Path<String>,
    uri: Uri,
) -> Result<Response, ApiError> {
    match parse_target(&path) {
        Some(Target::Package(fullname)) => {
            let name: PackageName = fullname.parse()?;
            Ok(Json(state.registry.package(&name).await?).into_response())
        }
        Some(Target::Tags(fullname)) => {
            let name: PackageName = fullname.parse()?;
            let tags: TagMap = state.registry.show(&name).await?;
            Ok(Json(tags).into_response())
        }
        Some(Target::Tag(..)) | None => Err(no_route(&uri)),
    }
}

/// `GET /<name>` and `GET /@scope/name` outside the `/-/` namespace.
async fn package_document(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> Result<Response, ApiError> {
    if method != Method::GET || uri.path().starts_with("/-/") {
        return Err(no_route(&uri));
    }
    let decoded = percent_decode_str(uri.path())
        .decode_utf8()
        .map_err(|_| no_route(&uri))?;
    let segments: Vec<&str> = decoded.trim_start_matches('/').split('/').collect();
    let fullname = join_name(&segments).ok_or_else(|| no_route(&uri))?;

    let name: PackageName = fullname.parse()?;
    Ok(Json(state.registry.package(&name).await?).into_response())
}

async fn save_tag(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(path): Path<String>,
    uri: Uri,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let Some(Target::Tag(fullname, tag)) = parse_target(&path) else {
        return Err(no_route(&uri));
    };
    let name: PackageName = fullname.parse()?;

    let version = match parse_version_body(&body) {
        Ok(version) => version,
        Err(err) => {
            // A body that is not a version fails the version gate, so the
            // earlier gates still decide first.
            state
                .registry
                .precheck_save(&name, &tag, &identity.principal, identity.capabilities)
                .await?;
            return Err(err);
        }
    };

    state
        .registry
        .save(
            &name,
            &tag,
            &version,
            &identity.principal,
            identity.capabilities,
        )
        .await?;
    Ok(ok())
}

async fn remove_tag(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(path): Path<String>,
    uri: Uri,
) -> Result<Json<Value>, ApiError> {
    let Some(Target::Tag(fullname, tag)) = parse_target(&path) else {
        return Err(no_route(&uri));
    };
    let name: PackageName = fullname.parse()?;

    state
        .registry
        .remove(&name, &tag, &identity.principal, identity.capabilities)
        .await?;
    Ok(ok())
}

/// Decodes a `PUT` body, which must be a single JSON string.
fn parse_version_body(body: &[u8]) -> Result<String, ApiError> {
    serde_json::from_slice::<String>(body).map_err(|_| ApiError::InvalidBody {
        raw: String::from_utf8_lossy(body).into_owned(),
    })
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    if method == axum::http::Method::GET {
        debug!(%method, %path, status = status.as_u16(), elapsed_ms, "Request handled");
    } else {
        info!(%method, %path, status = status.as_u16(), elapsed_ms, "Request handled");
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target() {
        assert_eq!(
            parse_target("koa/dist-tags"),
            Some(Target::Tags("koa".into()))
        );
        assert_eq!(
            parse_target("@cnpm/koa/dist-tags/ beta2 "),
            Some(Target::Tag("@cnpm/koa".into(), " beta2 ".into()))
        );
        assert_eq!(
            parse_target("@cnpm/koa"),
            Some(Target::Package("@cnpm/koa".into()))
        );
        assert_eq!(parse_target("koa"), Some(Target::Package("koa".into())));
        assert_eq!(parse_target("a/b/dist-tags"), None);
        assert_eq!(parse_target("koa/dist-tags/beta/extra"), None);
        assert_eq!(parse_target(""), None);
    }

    #[test]
    fn test_parse_version_body() {
        assert_eq!(parse_version_body(b"\"1.0.0\"").unwrap(), "1.0.0");
        assert_eq!(parse_version_body(b"\"\"").unwrap(), "");

        let err = parse_version_body(b"1.0.0").unwrap_err();
        assert_eq!(err.to_string(), "version(\"1.0.0\") format invalid");

        let err = parse_version_body(b"").unwrap_err();
        assert_eq!(err.to_string(), "version(\"\") format invalid");
    }
}
