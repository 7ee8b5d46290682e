// src/services/mod.rs
pub mod capture;
pub mod exporter;
pub mod renderer;
pub mod vision;

pub use capture::CaptureService;
pub use exporter::ExporterService;
pub use renderer::RendererService;
pub use vision::VisionService;
