// src/lib.rs
//! Crop-disease diagnosis service: a user uploads a plant-leaf photo, the
//! gateway forwards it to a vision-capable language model with a fixed
//! prompt, and the bilingual answer is rendered as a formatted report,
//! optionally exported as a single-page PDF.

use std::sync::Arc;

pub mod errors;
pub mod handlers;
pub mod models;
pub mod prompts;
pub mod services;
pub mod session;

use crate::services::capture::CaptureService;
use crate::services::exporter::ExporterService;
use crate::services::renderer::RendererService;
use crate::services::vision::DiagnosisProvider;

/// Shared, stateless services handed to every handler. No request shares
/// mutable state with another; session state lives client-side.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn DiagnosisProvider>,
    pub capture: Arc<CaptureService>,
    pub renderer: Arc<RendererService>,
    pub exporter: Arc<ExporterService>,
}

impl AppState {
    pub fn new(provider: Arc<dyn DiagnosisProvider>) -> Self {
        Self {
            provider,
            capture: Arc::new(CaptureService::new()),
            renderer: Arc::new(RendererService::new()),
            exporter: Arc::new(ExporterService::new()),
        }
    }
}

/// Route table, shared by the binary and the integration tests.
pub fn configure_routes(cfg: &mut actix_web::web::ServiceConfig) {
    use actix_web::web;

    cfg.service(
        web::scope("/api")
            .route("/upload-image", web::post().to(handlers::upload_image))
            .route("/analyze-crop", web::post().to(handlers::analyze_crop))
            .route("/render-report", web::post().to(handlers::render_report))
            .route("/export-report", web::post().to(handlers::export_report)),
    )
    .route("/health", web::get().to(handlers::health_check));
}
