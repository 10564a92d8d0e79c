use axum::{
    extract::{Multipart, State},
    response::{Html, IntoResponse, Json, Response},
};
use chrono::Utc;
use log::{info, warn};

use super::csrf::{issue_token, verify_token};
use super::error::AppError;
use super::models::{HealthResponse, ToolStatus};
use super::render::{report_page, upload_page};
use super::SharedState;
use crate::error::ProcessError;
use crate::extractor::UploadedFile;
use crate::report::Report;

const MAX_FILENAME_LENGTH: usize = 255;

/// Files and form fields read from a multipart upload.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub files: Vec<UploadedFile>,
    pub csrf_token: Option<String>,
}

/// Health check endpoint, including OCR tool availability.
pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let problems = state.ocr.check_tools().await;
    let tools = ["tesseract", "pdftoppm"]
        .into_iter()
        .map(|tool| {
            let problem = problems
                .iter()
                .find(|p| p.tool() == tool)
                .map(ToString::to_string);
            ToolStatus {
                tool: tool.to_string(),
                available: problem.is_none(),
                problem,
            }
        })
        .collect();

    Json(HealthResponse::new(tools, state.pipeline.suggestions_enabled()))
}

/// Upload form.
pub async fn index(State(state): State<SharedState>) -> Html<String> {
    Html(upload_page(&fresh_token(&state), None, &[]))
}

/// Form submission from the upload page; answers with HTML.
pub async fn submit_form(State(state): State<SharedState>, multipart: Multipart) -> Response {
    match handle_form(&state, multipart).await {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            warn!("Upload failed: {}", err);
            let skipped = match &err {
                AppError::Process {
                    source: ProcessError::NothingProcessed { skipped },
                } => skipped.clone(),
                _ => Vec::new(),
            };
            let page = upload_page(&fresh_token(&state), Some(&err.public_message()), &skipped);
            (err.status_code(), Html(page)).into_response()
        }
    }
}

async fn handle_form(state: &SharedState, multipart: Multipart) -> Result<String, AppError> {
    let form = read_upload_form(multipart).await?;

    let token = form.csrf_token.as_deref().unwrap_or_default();
    if !verify_token(&state.config.server.secret_key, token, Utc::now().timestamp()) {
        return Err(AppError::InvalidFormToken);
    }

    let report = run_pipeline(state, form.files).await?;
    report_page(&report, &fresh_token(state))
        .map_err(|e| AppError::Internal(format!("Failed to serialize report: {}", e)))
}

/// JSON export of the full report.
pub async fn analyze(
    State(state): State<SharedState>,
    multipart: Multipart,
) -> Result<Json<Report>, AppError> {
    let form = read_upload_form(multipart).await?;
    let report = run_pipeline(&state, form.files).await?;
    Ok(Json(report))
}

async fn run_pipeline(state: &SharedState, files: Vec<UploadedFile>) -> Result<Report, AppError> {
    if files.is_empty() {
        return Err(AppError::BadRequest(
            "Please choose at least one PDF or image".to_string(),
        ));
    }

    info!(
        "Received upload with {} file(s): {}",
        files.len(),
        files
            .iter()
            .map(|f| f.filename.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(state.pipeline.run(files).await?)
}

fn fresh_token(state: &SharedState) -> String {
    issue_token(&state.config.server.secret_key, Utc::now().timestamp())
}

/// Read every `files` (or `file`) field plus the form token. Parts without a
/// filename, as browsers send when nothing was picked, are ignored.
pub async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read multipart: {}", e)))?
    {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        match field_name.as_str() {
            "files" | "file" => {
                let Some(raw_name) = field
                    .file_name()
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                else {
                    continue;
                };
                let filename = upload_name(&raw_name);

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read file data: {}", e)))?;

                form.files.push(UploadedFile::new(filename, data.to_vec()));
            }
            "csrf_token" => {
                let token = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read form token: {}", e)))?;
                form.csrf_token = Some(token);
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Sanitized name of an uploaded file. A name with nothing usable left, such
/// as `...`, keeps the tail of what the client sent. That tail ends in dots or
/// a separator, never an allowed extension, so the batch reports it as skipped.
fn upload_name(raw_name: &str) -> String {
    let sanitized = sanitize_filename(raw_name);
    if !sanitized.is_empty() {
        return sanitized;
    }
    let skip = raw_name.chars().count().saturating_sub(MAX_FILENAME_LENGTH);
    raw_name.chars().skip(skip).collect()
}

/// Keep only the final path component and replace anything outside
/// `[A-Za-z0-9._-]` with an underscore.
pub fn sanitize_filename(filename: &str) -> String {
    let filename_only = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim();

    let sanitized: String = filename_only
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    sanitized.trim_start_matches('.').to_string()
}
