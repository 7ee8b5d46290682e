// src/session.rs
use crate::errors::CropDoctorError;
use crate::models::{EncodedImage, RenderedReport};
use crate::prompts::MSG_ANALYSIS_FAILED;
use crate::services::exporter::ExporterService;
use crate::services::renderer::RendererService;
use crate::services::vision::DiagnosisProvider;
use log::warn;

/// Where one session currently sits in the
/// upload -> analyze -> render -> export pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    ImageSelected,
    Analyzing,
    ResultDisplayed,
    Exporting,
}

/// The per-session view model. Holds at most one image and at most one
/// rendered result; `&mut self` on every operation is the re-submission
/// gate, since a second analyze call for the same session cannot start
/// while one is suspended.
pub struct AnalysisSession {
    phase: SessionPhase,
    image: Option<EncodedImage>,
    report: Option<RenderedReport>,
    notice: Option<String>,
    renderer: RendererService,
    exporter: ExporterService,
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Idle,
            image: None,
            report: None,
            notice: None,
            renderer: RendererService::new(),
            exporter: ExporterService::new(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn image(&self) -> Option<&EncodedImage> {
        self.image.as_ref()
    }

    pub fn report(&self) -> Option<&RenderedReport> {
        self.report.as_ref()
    }

    /// Failure notice shown in place of a result, when the last analysis
    /// attempt failed.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Accepts a new image. Any prior result or notice is cleared first,
    /// so at most one result is ever live per image.
    pub fn select_image(&mut self, image: EncodedImage) {
        self.image = Some(image);
        self.report = None;
        self.notice = None;
        self.phase = SessionPhase::ImageSelected;
    }

    /// Clears everything back to the starting state.
    pub fn reset(&mut self) {
        self.image = None;
        self.report = None;
        self.notice = None;
        self.phase = SessionPhase::Idle;
    }

    /// Drives the gateway for the held image, then renders the answer.
    /// From `ResultDisplayed` this re-analyzes, overwriting the old
    /// result. On failure the result stays cleared and a localized notice
    /// takes its place; the session returns to `ImageSelected` so the
    /// user can retry.
    pub async fn analyze(
        &mut self,
        provider: &dyn DiagnosisProvider,
    ) -> Result<&RenderedReport, CropDoctorError> {
        let Some(image) = self.image.clone() else {
            return Err(CropDoctorError::MissingInput);
        };

        self.report = None;
        self.notice = None;
        self.phase = SessionPhase::Analyzing;

        match provider.diagnose(&image).await {
            Ok(result) => {
                let report = self.renderer.render(&result);
                self.phase = SessionPhase::ResultDisplayed;
                Ok(&*self.report.insert(report))
            }
            Err(err) => {
                warn!("analysis failed for session: {}", err);
                self.notice = Some(MSG_ANALYSIS_FAILED.to_string());
                self.phase = SessionPhase::ImageSelected;
                Err(err)
            }
        }
    }

    /// Exports the displayed result as PDF bytes. A no-op (`None`) when
    /// no result is displayed or the snapshot fails.
    pub fn export_report(&mut self) -> Option<Vec<u8>> {
        let Some(report) = self.report.as_ref() else {
            return None;
        };
        self.phase = SessionPhase::Exporting;
        let outcome = self.exporter.export(report);
        self.phase = SessionPhase::ResultDisplayed;
        match outcome {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                warn!("export skipped: {}", err);
                None
            }
        }
    }
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new()
    }
}
