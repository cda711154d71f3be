//! # Update Routes
//!
//! - `GET /updates/latest?platform=&arch=` — JSON manifest, absolute URLs.
//! - `GET /updates/latest.yml?platform=&arch=` — `latest.yml` text template.
//! - `GET /updates/:file_name` — raw installer bytes from the updates root.
//!
//! Both manifest endpoints run the same pipeline and differ only in the
//! renderer. Resolution and hashing touch the filesystem, so they run on the
//! blocking pool; the async handler only awaits the result.

use axum::extract::{Path, Query, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use upd_core::{render, ResponseFormat, UpdateManifest};

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/updates/latest", get(latest_json))
        .route("/updates/latest.yml", get(latest_yaml))
        .route("/updates/:file_name", get(download))
}

/// Target selection query. Unknown or missing values fall back to the
/// configured defaults.
#[derive(Debug, Default, Deserialize)]
pub struct TargetQuery {
    pub platform: Option<String>,
    pub arch: Option<String>,
}

async fn latest_json(
    State(state): State<AppState>,
    query: Option<Query<TargetQuery>>,
) -> Result<Response, AppError> {
    latest(state, query, ResponseFormat::Json).await
}

async fn latest_yaml(
    State(state): State<AppState>,
    query: Option<Query<TargetQuery>>,
) -> Result<Response, AppError> {
    latest(state, query, ResponseFormat::YamlLike).await
}

async fn latest(
    state: AppState,
    query: Option<Query<TargetQuery>>,
    format: ResponseFormat,
) -> Result<Response, AppError> {
    // A query string that fails to parse is treated like an empty one.
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let manifest = attest_latest(&state, query).await?;
    let rendered = render(&manifest, format)?;

    tracing::info!(
        version = %manifest.version,
        file = %manifest.path,
        format = %format,
        "serving update manifest"
    );
    Ok(([(CONTENT_TYPE, rendered.content_type)], rendered.body).into_response())
}

/// Resolve → digest → build for the configured version.
pub async fn attest_latest(state: &AppState, query: TargetQuery) -> Result<UpdateManifest, AppError> {
    let resolver = state.resolver.clone();
    let digests = state.digests.clone();
    let version = state.config.version.clone();

    let record = tokio::task::spawn_blocking(move || {
        let located = resolver.resolve(
            &version,
            query.platform.as_deref(),
            query.arch.as_deref(),
        )?;
        digests.attest(located)
    })
    .await??;

    Ok(state.manifests.build(&record))
}

async fn download(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
    request: Request,
) -> Result<Response, AppError> {
    let resolver = state.resolver.clone();
    let name = file_name.clone();
    let path = tokio::task::spawn_blocking(move || resolver.locate_file(&name)).await??;

    tracing::info!(file = %file_name, "serving update artifact");
    let response = ServeFile::new(path)
        .oneshot(request)
        .await
        .unwrap_or_else(|never| match never {});
    Ok(response.into_response())
}
