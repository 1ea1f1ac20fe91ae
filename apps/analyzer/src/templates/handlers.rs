//! Axum route handlers for the Template API.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::analysis::AnalysisResult;
use crate::errors::AppError;
use crate::raster::SourceFormat;
use crate::state::AppState;
use crate::styling::{derive_theme, TemplateTheme};

/// Multipart field carrying the template file.
const FILE_FIELD: &str = "file";

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SourceSummary {
    pub mime_type: String,
    pub byte_len: usize,
    pub format: SourceFormat,
    pub pixels_per_inch: f32,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeTemplateResponse {
    pub analysis_id: Uuid,
    pub analyzed_at: DateTime<Utc>,
    pub source: SourceSummary,
    pub analysis: AnalysisResult,
    pub theme: TemplateTheme,
}

struct Upload {
    mime_type: String,
    bytes: Bytes,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/templates/analyze
///
/// Multipart form with a single `file` part. The part's content type selects the decoder.
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalyzeTemplateResponse>, AppError> {
    let upload = read_upload(multipart).await?;
    // Unsupported types are rejected before any size or content check.
    SourceFormat::from_mime(&upload.mime_type)?;

    let max = state.config.max_upload_bytes;
    if upload.bytes.len() > max {
        return Err(AppError::PayloadTooLarge(format!(
            "template is {} bytes; the limit is {max} bytes",
            upload.bytes.len()
        )));
    }
    if upload.bytes.is_empty() {
        return Err(AppError::Validation("template file is empty".to_string()));
    }

    let analysis_id = Uuid::new_v4();
    let byte_len = upload.bytes.len();
    info!(%analysis_id, mime = %upload.mime_type, byte_len, "Analyzing template");

    let outcome = state
        .analyzer
        .analyze(upload.bytes, &upload.mime_type)
        .await?;
    let theme = derive_theme(&outcome.result, outcome.pixels_per_inch);

    Ok(Json(AnalyzeTemplateResponse {
        analysis_id,
        analyzed_at: Utc::now(),
        source: SourceSummary {
            mime_type: upload.mime_type,
            byte_len,
            format: outcome.format,
            pixels_per_inch: outcome.pixels_per_inch,
        },
        analysis: outcome.result,
        theme,
    }))
}

/// Pulls the `file` part out of the form. Other parts are ignored.
async fn read_upload(mut multipart: Multipart) -> Result<Upload, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let mime_type = field
            .content_type()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("file part has no content type".to_string()))?;
        let bytes = field.bytes().await.map_err(multipart_error)?;

        return Ok(Upload { mime_type, bytes });
    }

    Err(AppError::Validation(format!(
        "multipart form has no '{FILE_FIELD}' part"
    )))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::Validation(format!("malformed multipart body: {}", err.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::analysis::analyzer::tests::{divider_page, png_bytes, FakeRenderer};
    use crate::analysis::{ScratchPool, TemplateAnalyzer};
    use crate::config::Config;
    use crate::raster::pdf::tests::build_pdf;
    use crate::raster::{LopdfTextRuns, PixelBuffer, Rgba};
    use crate::routes::build_router;

    const BOUNDARY: &str = "template-boundary";

    fn test_state(config: Config) -> AppState {
        let page = PixelBuffer::from_fn(1224, 1584, |x, y| {
            if (144..1080).contains(&x) && (144..1440).contains(&y) && y % 40 < 4 {
                Rgba::opaque(20, 20, 20)
            } else {
                Rgba::opaque(255, 255, 255)
            }
        });
        let analyzer = TemplateAnalyzer::new(
            Arc::new(FakeRenderer::new(page)),
            Arc::new(LopdfTextRuns),
            Arc::new(ScratchPool::new(1)),
            config.pdf_render_scale,
        );
        AppState::with_analyzer(config, analyzer)
    }

    fn multipart_body(field: &str, content_type: Option<&str>, data: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"template\"\r\n"
        )
        .into_bytes();
        if let Some(ct) = content_type {
            body.extend_from_slice(format!("Content-Type: {ct}\r\n").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    async fn post(state: AppState, body: Vec<u8>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/templates/analyze")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();

        let response = build_router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_analyze_png_returns_result_and_theme() {
        let png = png_bytes(divider_page());
        let (status, json) = post(
            test_state(Config::default()),
            multipart_body("file", Some("image/png"), &png),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["source"]["format"], "png");
        assert_eq!(json["analysis"]["dimensions"]["width"], 800);
        assert_eq!(
            json["analysis"]["design_elements"]["horizontal_lines"][0]["y"],
            500
        );
        assert_eq!(json["analysis"]["layout"]["grid"]["columns"], 1);
        assert_eq!(json["theme"]["uses_dividers"], true);
        assert_eq!(json["theme"]["is_default_palette"], false);
        assert!(json["analysis_id"].is_string());
    }

    #[tokio::test]
    async fn test_analyze_pdf_reports_fonts() {
        let pdf = build_pdf(&[("F1", "XYZABC+Lato-Regular")]);
        let (status, json) = post(
            test_state(Config::default()),
            multipart_body("file", Some("application/pdf"), &pdf),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["analysis"]["fonts"][0], "Lato-Regular");
        assert_eq!(json["theme"]["font_family"], "Lato");
        assert_eq!(json["source"]["pixels_per_inch"], 144.0);
        assert_eq!(json["analysis"]["layout"]["margins"]["left"], 144);
    }

    #[tokio::test]
    async fn test_unsupported_mime_is_415() {
        let (status, json) = post(
            test_state(Config::default()),
            multipart_body("file", Some("image/gif"), b"GIF89a"),
        )
        .await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(json["error"]["code"], "UNSUPPORTED_FORMAT");
    }

    #[tokio::test]
    async fn test_unsupported_mime_wins_over_empty_file() {
        let (status, json) = post(
            test_state(Config::default()),
            multipart_body("file", Some("image/gif"), b""),
        )
        .await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(json["error"]["code"], "UNSUPPORTED_FORMAT");
    }

    #[tokio::test]
    async fn test_empty_png_is_400() {
        let (status, json) = post(
            test_state(Config::default()),
            multipart_body("file", Some("image/png"), b""),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_corrupt_png_is_422() {
        let (status, json) = post(
            test_state(Config::default()),
            multipart_body("file", Some("image/png"), b"not an image"),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["error"]["code"], "DECODE_FAILURE");
    }

    #[tokio::test]
    async fn test_missing_file_part_is_400() {
        let (status, _) = post(
            test_state(Config::default()),
            multipart_body("resume", Some("image/png"), b"x"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_content_type_is_400() {
        let (status, _) = post(
            test_state(Config::default()),
            multipart_body("file", None, b"x"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_oversized_upload_is_413() {
        let config = Config {
            max_upload_bytes: 1_000,
            ..Config::default()
        };
        let (status, json) = post(
            test_state(config),
            multipart_body("file", Some("image/png"), &[0u8; 2_000]),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(json["error"]["code"], "PAYLOAD_TOO_LARGE");
    }
}
