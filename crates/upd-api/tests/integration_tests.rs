//! # Integration Tests for upd-api
//!
//! Drives the assembled router end to end over a temporary updates
//! directory: manifest negotiation in both formats, target fallback,
//! not-found handling, downloads, cross-origin headers and digest caching.

use std::path::Path;

use axum::body::Body;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_LENGTH, CONTENT_TYPE,
};
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use upd_api::error::ErrorBody;
use upd_api::routes::health::HealthResponse;
use upd_api::state::{AppConfig, AppState, DigestTimeoutConfig};
use upd_core::{Sha512Digest, UpdateManifest};

const PRODUCT: &str = "Product";
const VERSION: &str = "1.2.0";
const WIN_FILE: &str = "Product-1.2.0-win32-x64.exe";

/// Helper: config rooted at `dir` for `Product` 1.2.0.
fn test_config(dir: &Path) -> AppConfig {
    AppConfig {
        updates_dir: dir.to_path_buf(),
        product: PRODUCT.to_string(),
        version: VERSION.to_string(),
        ..AppConfig::default()
    }
}

/// Helper: temp updates dir holding a 1024-byte Windows installer.
fn fixture() -> (TempDir, Vec<u8>) {
    let dir = tempfile::tempdir().unwrap();
    let content: Vec<u8> = (0..1024u32).map(|i| (i % 251) as u8).collect();
    std::fs::write(dir.path().join(WIN_FILE), &content).unwrap();
    (dir, content)
}

async fn get(state: &AppState, uri: &str) -> axum::http::Response<Body> {
    upd_api::app(state.clone())
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// Helper: read response body as string.
async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn manifest(state: &AppState, uri: &str) -> UpdateManifest {
    let response = get(state, uri).await;
    assert_eq!(response.status(), StatusCode::OK);
    serde_json::from_str(&body_string(response).await).unwrap()
}

// -- JSON manifest ------------------------------------------------------------

#[tokio::test]
async fn test_latest_json_describes_artifact() {
    let (dir, content) = fixture();
    let state = AppState::new(test_config(dir.path()));
    let expected = Sha512Digest::of_bytes(&content).to_hex();

    let response = get(&state, "/updates/latest?platform=win32&arch=x64").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/json");

    let body: UpdateManifest = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body.version, VERSION);
    assert_eq!(body.files.len(), 1);
    assert_eq!(body.files[0].size, 1024);
    assert_eq!(body.files[0].sha512, expected);
    assert_eq!(body.sha512, expected);
    assert_eq!(body.path, WIN_FILE);
    assert_eq!(
        body.files[0].url,
        format!("http://localhost:3000/updates/{WIN_FILE}")
    );
    assert_eq!(body.release_name, "Product v1.2.0");
    assert!(body.release_date.ends_with('Z'));
}

#[tokio::test]
async fn test_latest_json_uses_wire_field_names() {
    let (dir, _) = fixture();
    let state = AppState::new(test_config(dir.path()));
    let body = body_string(get(&state, "/updates/latest").await).await;
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    for key in ["version", "files", "path", "sha512", "releaseDate", "releaseName", "releaseNotes"] {
        assert!(value.get(key).is_some(), "missing {key}");
    }
}

#[tokio::test]
async fn test_public_base_url_is_joined_once() {
    let (dir, _) = fixture();
    let config = AppConfig {
        public_base_url: Some("https://updates.example.com/app/".to_string()),
        ..test_config(dir.path())
    };
    let state = AppState::new(config);
    let body = manifest(&state, "/updates/latest").await;
    assert_eq!(
        body.files[0].url,
        format!("https://updates.example.com/app/{WIN_FILE}")
    );
}

#[tokio::test]
async fn test_missing_and_unknown_targets_use_defaults() {
    let (dir, _) = fixture();
    let state = AppState::new(test_config(dir.path()));
    assert_eq!(manifest(&state, "/updates/latest").await.path, WIN_FILE);
    assert_eq!(
        manifest(&state, "/updates/latest?platform=beos&arch=sparc").await.path,
        WIN_FILE
    );
    assert_eq!(
        manifest(&state, "/updates/latest?platform=&arch=").await.path,
        WIN_FILE
    );
}

#[tokio::test]
async fn test_configured_release_metadata_is_echoed() {
    let (dir, _) = fixture();
    let mut config = test_config(dir.path());
    config.release.name = "Spring Release".to_string();
    config.release.notes = "Online update support".to_string();
    config.release.date = Some("2024-05-01T12:00:00Z".parse().unwrap());
    let state = AppState::new(config);

    let body = manifest(&state, "/updates/latest").await;
    assert_eq!(body.release_name, "Spring Release");
    assert_eq!(body.release_notes, "Online update support");
    assert_eq!(body.release_date, "2024-05-01T12:00:00.000Z");
}

// -- latest.yml ---------------------------------------------------------------

#[tokio::test]
async fn test_latest_yml_template() {
    let (dir, content) = fixture();
    let state = AppState::new(test_config(dir.path()));
    let expected = Sha512Digest::of_bytes(&content).to_hex();

    let response = get(&state, "/updates/latest.yml?platform=win32&arch=x64").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "text/yaml");

    let body = body_string(response).await;
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines[0], "version: 1.2.0");
    assert_eq!(lines[1], "files:");
    assert!(lines.contains(&format!("sha512: {expected}").as_str()));
    assert!(lines.contains(&format!("path: {WIN_FILE}").as_str()));
    assert!(lines.contains(&"    size: 1024"));
}

#[tokio::test]
async fn test_formats_agree() {
    let (dir, _) = fixture();
    let state = AppState::new(test_config(dir.path()));

    let json = manifest(&state, "/updates/latest").await;
    let yaml = body_string(get(&state, "/updates/latest.yml").await).await;

    assert!(yaml.contains(&format!("version: {}", json.version)));
    assert!(yaml.contains(&format!("sha512: {}", json.sha512)));
    assert!(yaml.contains(&format!("path: {}", json.path)));
}

// -- Not found ----------------------------------------------------------------

#[tokio::test]
async fn test_missing_artifact_returns_404() {
    let (dir, _) = fixture();
    let state = AppState::new(test_config(dir.path()));

    for uri in [
        "/updates/latest?platform=linux&arch=arm64",
        "/updates/latest.yml?platform=linux&arch=arm64",
    ] {
        let response = get(&state, uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        let body: ErrorBody = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body.error, "update file not found");
        assert!(body.message.contains("Product-1.2.0-linux-arm64.AppImage"));
    }
}

#[tokio::test]
async fn test_missing_updates_dir_returns_404() {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::new(test_config(&dir.path().join("absent")));
    let response = get(&state, "/updates/latest").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_directory_with_artifact_name_is_not_served() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join(WIN_FILE)).unwrap();
    let state = AppState::new(test_config(dir.path()));
    let response = get(&state, "/updates/latest").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// -- Digest failures ----------------------------------------------------------

#[tokio::test]
async fn test_digest_timeout_returns_500_without_caching() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(WIN_FILE), vec![3u8; 256 * 1024]).unwrap();
    let config = AppConfig {
        digest_timeout: DigestTimeoutConfig {
            enabled: true,
            base_secs: 0,
            per_mib_millis: 0,
        },
        ..test_config(dir.path())
    };
    let state = AppState::new(config);

    for uri in ["/updates/latest", "/updates/latest.yml"] {
        let response = get(&state, uri).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json", "{uri}");
        let body: ErrorBody = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body.error, "internal server error");
        assert!(body.message.contains(WIN_FILE), "{uri}: {}", body.message);
        assert!(body.message.contains("did not finish"), "{uri}: {}", body.message);
    }

    let stats = state.digests.stats();
    assert_eq!(stats.entries, 0);
    assert_eq!(stats.computations, 0);
}

// -- Health -------------------------------------------------------------------

#[tokio::test]
async fn test_health_is_ok_without_updates_dir() {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::new(test_config(&dir.path().join("absent")));
    let response = get(&state, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: HealthResponse = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body.status, "ok");
    assert_eq!(body.server, "Update Server");
    assert!(body.timestamp.ends_with('Z'));
}

// -- Cross-origin headers -----------------------------------------------------

#[tokio::test]
async fn test_cors_headers_on_success_and_error() {
    let (dir, _) = fixture();
    let state = AppState::new(test_config(dir.path()));

    for uri in ["/updates/latest", "/updates/latest?platform=darwin", "/health"] {
        let response = get(&state, uri).await;
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*", "{uri}");
        assert_eq!(
            response.headers()[ACCESS_CONTROL_ALLOW_HEADERS],
            "Origin, X-Requested-With, Content-Type, Accept",
            "{uri}"
        );
    }
}

// -- Downloads ----------------------------------------------------------------

#[tokio::test]
async fn test_download_serves_bytes() {
    let (dir, content) = fixture();
    let state = AppState::new(test_config(dir.path()));

    let response = get(&state, &format!("/updates/{WIN_FILE}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_LENGTH], "1024");
    assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(bytes.as_ref(), content.as_slice());
}

#[tokio::test]
async fn test_download_url_from_manifest_resolves() {
    let (dir, _) = fixture();
    let state = AppState::new(test_config(dir.path()));
    let body = manifest(&state, "/updates/latest").await;

    let path = body.files[0]
        .url
        .strip_prefix("http://localhost:3000")
        .unwrap()
        .to_string();
    assert_eq!(get(&state, &path).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_download_rejects_traversal_and_missing_files() {
    let root = tempfile::tempdir().unwrap();
    let updates = root.path().join("updates");
    std::fs::create_dir(&updates).unwrap();
    std::fs::write(root.path().join("secret.txt"), b"not for download").unwrap();
    let state = AppState::new(test_config(&updates));

    for uri in [
        "/updates/..%2Fsecret.txt",
        "/updates/%2E%2E",
        "/updates/.hidden",
        "/updates/absent.exe",
    ] {
        let response = get(&state, uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

// -- Digest cache -------------------------------------------------------------

#[tokio::test]
async fn test_repeat_requests_hit_cache() {
    let (dir, _) = fixture();
    let state = AppState::new(test_config(dir.path()));

    let first = manifest(&state, "/updates/latest").await;
    let yaml = get(&state, "/updates/latest.yml").await;
    assert_eq!(yaml.status(), StatusCode::OK);
    let third = manifest(&state, "/updates/latest").await;

    assert_eq!(first.sha512, third.sha512);
    let stats = state.digests.stats();
    assert_eq!(stats.computations, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.entries, 1);
}

#[tokio::test]
async fn test_replaced_file_gets_new_digest() {
    let (dir, content) = fixture();
    let state = AppState::new(test_config(dir.path()));

    let before = manifest(&state, "/updates/latest").await;
    assert_eq!(before.sha512, Sha512Digest::of_bytes(&content).to_hex());

    let replacement = vec![7u8; 2048];
    std::fs::write(dir.path().join(WIN_FILE), &replacement).unwrap();

    let after = manifest(&state, "/updates/latest").await;
    assert_eq!(after.files[0].size, 2048);
    assert_eq!(after.sha512, Sha512Digest::of_bytes(&replacement).to_hex());
    assert_ne!(before.sha512, after.sha512);
}
