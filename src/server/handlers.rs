//! HTTP request handlers.

use super::error::{status_for, ApiError};
use super::page::INDEX_HTML;
use super::upload::{read_upload, Upload};
use super::AppState;
use crate::config::PageRange;
use crate::error::{Failure, FailureKind};
use crate::output::{BatchResult, BatchStats, ConversionOutcome, ConversionPath, SourceDocument};
use axum::extract::{Multipart, State};
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use std::path::Path;
use tracing::info;

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const ZIP_MIME: &str = "application/zip";

static SUCCEEDED_HEADER: HeaderName = HeaderName::from_static("x-documents-succeeded");
static FAILED_HEADER: HeaderName = HeaderName::from_static("x-documents-failed");

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn health() -> &'static str {
    "ok"
}

/// `POST /convert`: one PDF in, one Word document out.
pub async fn convert(State(state): State<AppState>, multipart: Multipart) -> Result<Response, ApiError> {
    let Upload { mut files, pages } = read_upload(multipart).await?;
    if files.len() > 1 {
        return Err(ApiError::BadRequest(
            "Only one file per request; use /convert/batch for several".into(),
        ));
    }
    let doc = files.remove(0);
    convert_one(&state, doc, pages).await
}

/// `POST /convert/batch`: several PDFs in, one zip out.
///
/// A single upload behaves exactly like `/convert`.
pub async fn convert_batch(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let Upload { mut files, pages } = read_upload(multipart).await?;
    if files.len() == 1 {
        return convert_one(&state, files.remove(0), pages).await;
    }

    let result = state.converter.run_batch(files).await;
    info!(
        "Batch request: {}/{} succeeded",
        result.stats.succeeded, result.stats.total
    );

    if let Some(archive) = &result.archive {
        let bytes = read_output(&archive.path).await?;
        let mut response = attachment(ZIP_MIME, &archive.file_name, bytes);
        let headers = response.headers_mut();
        headers.insert(SUCCEEDED_HEADER.clone(), HeaderValue::from(result.stats.succeeded));
        headers.insert(FAILED_HEADER.clone(), HeaderValue::from(result.stats.failed));
        return Ok(response);
    }
    if let Some(failure) = &result.archive_error {
        return Err(ApiError::Conversion(failure.clone()));
    }

    let report = ApiReport::build(&result, false).await?;
    Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(report)).into_response())
}

/// `POST /api/convert`: the JSON report, with outputs inlined as base64.
///
/// A failed single document keeps its mapped status; batches answer 200.
pub async fn api_convert(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let Upload { mut files, pages } = read_upload(multipart).await?;
    let result = if files.len() == 1 {
        state.converter.run_document(files.remove(0), pages).await
    } else {
        state.converter.run_batch(files).await
    };
    let report = ApiReport::build(&result, true).await?;
    Ok((report.status(), Json(report)).into_response())
}

async fn convert_one(
    state: &AppState,
    doc: SourceDocument,
    pages: Option<PageRange>,
) -> Result<Response, ApiError> {
    let result = state.converter.run_document(doc, pages).await;
    let report = result
        .single()
        .ok_or_else(|| ApiError::Internal("no report produced".into()))?;

    match &report.outcome {
        ConversionOutcome::Success(converted) => {
            let bytes = read_output(&converted.output_path).await?;
            Ok(attachment(DOCX_MIME, &report.output_name, bytes))
        }
        ConversionOutcome::Failure(failure) => Err(ApiError::Conversion(failure.clone())),
    }
}

async fn read_output(path: &Path) -> Result<Vec<u8>, ApiError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| ApiError::Conversion(Failure::new(FailureKind::IoFailure, e.to_string())))
}

fn attachment(content_type: &'static str, file_name: &str, body: Vec<u8>) -> Response {
    let mut response = (StatusCode::OK, body).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    if let Ok(value) = HeaderValue::from_str(&content_disposition(file_name)) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    response
}

/// `attachment` header with an ASCII fallback name and the exact UTF-8 name.
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let mut encoded = String::new();
    for byte in file_name.bytes() {
        if byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}

// ── JSON report ──────────────────────────────────────────────────────────

/// Body of `POST /api/convert`, and of a batch where nothing succeeded.
#[derive(Debug, Serialize)]
pub struct ApiReport {
    pub documents: Vec<ApiDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<ApiArchive>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_error: Option<Failure>,
    pub stats: BatchStats,
}

#[derive(Debug, Serialize)]
pub struct ApiDocument {
    pub name: String,
    pub output_name: String,
    /// `succeeded` or `failed`.
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion_path: Option<ConversionPath>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_range: Option<PageRange>,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docx_base64: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiArchive {
    pub file_name: String,
    pub entries: Vec<String>,
    pub zip_base64: String,
}

impl ApiReport {
    /// Summarise a batch, optionally inlining every output file.
    pub async fn build(result: &BatchResult, with_payloads: bool) -> Result<Self, ApiError> {
        let mut documents = Vec::with_capacity(result.documents.len());
        for report in &result.documents {
            let document = match &report.outcome {
                ConversionOutcome::Success(converted) => ApiDocument {
                    name: report.name.clone(),
                    output_name: report.output_name.clone(),
                    status: "succeeded",
                    kind: None,
                    reason: None,
                    conversion_path: Some(converted.path),
                    page_range: Some(converted.page_range),
                    duration_ms: report.duration_ms,
                    docx_base64: if with_payloads {
                        Some(STANDARD.encode(read_output(&converted.output_path).await?))
                    } else {
                        None
                    },
                },
                ConversionOutcome::Failure(failure) => ApiDocument {
                    name: report.name.clone(),
                    output_name: report.output_name.clone(),
                    status: "failed",
                    kind: Some(failure.kind),
                    reason: Some(failure.reason.clone()),
                    conversion_path: None,
                    page_range: None,
                    duration_ms: report.duration_ms,
                    docx_base64: None,
                },
            };
            documents.push(document);
        }

        let archive = match (&result.archive, with_payloads) {
            (Some(archive), true) => Some(ApiArchive {
                file_name: archive.file_name.clone(),
                entries: archive.entries.clone(),
                zip_base64: STANDARD.encode(read_output(&archive.path).await?),
            }),
            _ => None,
        };

        Ok(Self {
            documents,
            archive,
            archive_error: result.archive_error.clone(),
            stats: result.stats.clone(),
        })
    }

    /// HTTP status a transport would use for the whole report.
    pub fn status(&self) -> StatusCode {
        match self.documents.as_slice() {
            [only] => only.kind.map(status_for).unwrap_or(StatusCode::OK),
            _ => StatusCode::OK,
        }
    }
}
