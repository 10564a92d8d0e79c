mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use common::{pipeline, text_pdf, FakeOcr};
use doc_insights::server::csrf::issue_token;
use doc_insights::server::{create_app, AppState};
use doc_insights::AppConfig;
use serde_json::Value;
use tower::ServiceExt;

const BOUNDARY: &str = "----doc-insights-test-boundary";

fn app() -> Router {
    let state = AppState::new(AppConfig::default(), pipeline(FakeOcr::returning("unused")));
    create_app(state)
}

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

fn multipart_body(parts: &[Part]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, filename, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        name, filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload(uri: &str, parts: &[Part]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health_reports_json() {
    let response = app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert!(json["status"] == "ok" || json["status"] == "degraded");
    assert_eq!(json["suggestions_enabled"], false);
    assert_eq!(json["tools"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_index_serves_upload_form() {
    let response = app()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("name=\"csrf_token\""));
    assert!(html.contains("name=\"files\""));
    assert!(html.contains("multiple"));
}

#[tokio::test]
async fn test_api_analyze_returns_report() {
    let pdf = text_pdf(&["Launch notes #release @ops"]);
    let response = app()
        .oneshot(upload(
            "/api/analyze",
            &[
                Part::File("files", "notes.pdf", &pdf),
                Part::File("files", "tool.exe", b"MZ"),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["files"][0]["filename"], "notes.pdf");
    assert_eq!(json["skipped"][0]["filename"], "tool.exe");
    assert_eq!(json["skipped"][0]["kind"], "unsupported_file_type");
    assert_eq!(json["analysis"]["hashtags"][0], "#release");
    assert!(json.get("suggestions").is_none());
}

#[tokio::test]
async fn test_api_analyze_with_only_unsupported_file() {
    let response = app()
        .oneshot(upload(
            "/api/analyze",
            &[Part::File("files", "report.exe", b"MZ")],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["status"], "error");
    assert_eq!(json["skipped"][0]["filename"], "report.exe");
}

#[tokio::test]
async fn test_api_analyze_without_files() {
    let response = app()
        .oneshot(upload("/api/analyze", &[Part::Text("note", "hello")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_form_without_token_is_forbidden() {
    let pdf = text_pdf(&["Hello World"]);
    let response = app()
        .oneshot(upload("/", &[Part::File("files", "hello.pdf", &pdf)]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let html = body_string(response).await;
    assert!(html.contains("expired"));
    assert!(html.contains("name=\"csrf_token\""));
}

#[tokio::test]
async fn test_form_with_token_renders_report() {
    let config = AppConfig::default();
    let token = issue_token(&config.server.secret_key, Utc::now().timestamp());
    let pdf = text_pdf(&["Hello World from the form"]);

    let response = app()
        .oneshot(upload(
            "/",
            &[
                Part::Text("csrf_token", &token),
                Part::File("files", "hello.pdf", &pdf),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("Hello World from the form"));
    assert!(html.contains("data:application/json;base64,"));
}

#[tokio::test]
async fn test_unusable_filename_is_listed_as_skipped() {
    let pdf = text_pdf(&["Release notes for the team"]);
    let response = app()
        .oneshot(upload(
            "/api/analyze",
            &[
                Part::File("files", "...", b"whatever"),
                Part::File("files", "notes.pdf", &pdf),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["skipped"][0]["filename"], "...");
    assert_eq!(json["skipped"][0]["kind"], "unsupported_file_type");
    assert_eq!(json["files"][0]["filename"], "notes.pdf");

    let response = app()
        .oneshot(upload("/api/analyze", &[Part::File("files", "...", b"x")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
