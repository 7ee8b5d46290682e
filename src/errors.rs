// src/errors.rs
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::prompts::{MSG_ANALYSIS_FAILED, MSG_NO_IMAGE, MSG_UPLOAD_FAILED};

#[derive(Error, Debug)]
pub enum CropDoctorError {
    #[error("required input missing")]
    MissingInput,

    #[error("image capture failed: {0}")]
    CaptureFailed(String),

    #[error("analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("nothing to export: {0}")]
    ExportUnavailable(String),
}

impl ResponseError for CropDoctorError {
    fn error_response(&self) -> HttpResponse {
        match self {
            CropDoctorError::MissingInput => HttpResponse::BadRequest().json(serde_json::json!({
                "error": MSG_NO_IMAGE
            })),
            CropDoctorError::CaptureFailed(_) => {
                HttpResponse::BadRequest().json(serde_json::json!({
                    "error": MSG_UPLOAD_FAILED
                }))
            }
            // The variant text carries provider detail for the log; the
            // response body never does.
            CropDoctorError::AnalysisFailed(_) => {
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": MSG_ANALYSIS_FAILED
                }))
            }
            // Export failures are a no-op for the caller, not a fault.
            CropDoctorError::ExportUnavailable(_) => HttpResponse::NoContent().finish(),
        }
    }
}
