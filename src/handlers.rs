// src/handlers.rs
use crate::errors::CropDoctorError;
use crate::models::{
    AnalysisRequest, AnalysisResponse, AnalysisResult, RenderResponse, ReportRequest,
    UploadResponse,
};
use crate::services::exporter::REPORT_FILE_NAME;
use crate::AppState;
use actix_multipart::Multipart;
use actix_web::{Error, HttpResponse, web};
use futures_util::TryStreamExt;
use log::{error, info};
use uuid::Uuid;

/// Multipart upload -> data-URI encoded image, returned to the client to
/// hold in memory. Nothing is stored server-side.
pub async fn upload_image(
    mut payload: Multipart,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let request_id = Uuid::new_v4();

    while let Some(mut field) = payload.try_next().await? {
        let filename = field
            .content_disposition()
            .get_filename()
            .unwrap_or("upload")
            .to_string();
        let declared_mime = field.content_type().map(|ct| ct.to_string());

        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            bytes.extend_from_slice(&chunk);
        }

        let image = data
            .capture
            .encode_image(&bytes, declared_mime.as_deref())?;

        info!(
            "[{}] captured upload '{}' ({} bytes, {})",
            request_id,
            filename,
            bytes.len(),
            image.mime_type().unwrap_or("unknown")
        );

        // One image per session; the first file field wins.
        return Ok(HttpResponse::Ok().json(UploadResponse {
            image: image.as_data_uri().to_string(),
            filename,
            size: bytes.len(),
        }));
    }

    Err(CropDoctorError::CaptureFailed("no file field in upload".to_string()).into())
}

/// The gateway: one encoded image in, the model's raw answer out.
pub async fn analyze_crop(
    request: web::Json<AnalysisRequest>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let request_id = Uuid::new_v4();

    let image = request
        .into_inner()
        .encoded_image()
        .ok_or(CropDoctorError::MissingInput)?;

    info!("[{}] forwarding image to the diagnosis provider", request_id);

    let analysis = data.provider.diagnose(&image).await.map_err(|err| {
        // Full detail stays in the log; the response body carries only
        // the generic localized message.
        error!("[{}] analysis failed: {}", request_id, err);
        err
    })?;

    info!("[{}] analysis complete ({} chars)", request_id, analysis.0.len());

    Ok(HttpResponse::Ok().json(AnalysisResponse { analysis }))
}

/// Projects the analysis text into formatted HTML for the page.
pub async fn render_report(
    request: web::Json<ReportRequest>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let text = request
        .into_inner()
        .analysis
        .filter(|text| !text.trim().is_empty())
        .ok_or(CropDoctorError::MissingInput)?;

    let report = data.renderer.render(&AnalysisResult(text));
    Ok(HttpResponse::Ok().json(RenderResponse { html: report.html }))
}

/// Snapshots the rendered result into a single-page PDF download. Export
/// without a displayable result answers 204 rather than failing.
pub async fn export_report(
    request: web::Json<ReportRequest>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let request_id = Uuid::new_v4();

    let text = request.into_inner().analysis.unwrap_or_default();
    let report = data.renderer.render(&AnalysisResult(text));
    let bytes = data.exporter.export(&report).map_err(|err| {
        info!("[{}] export skipped: {}", request_id, err);
        err
    })?;

    info!("[{}] exported report ({} bytes)", request_id, bytes.len());

    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", REPORT_FILE_NAME),
        ))
        .body(bytes))
}

pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "cropdoctor",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
