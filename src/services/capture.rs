// src/services/capture.rs
use crate::errors::CropDoctorError;
use crate::models::EncodedImage;

/// Turns a selected file into the encoded form the gateway forwards.
/// No size or format policy is enforced here; the page-side filter is
/// advisory and the model sees whatever the user picked.
pub struct CaptureService;

impl CaptureService {
    pub fn new() -> Self {
        Self
    }

    pub fn encode_image(
        &self,
        data: &[u8],
        declared_mime: Option<&str>,
    ) -> Result<EncodedImage, CropDoctorError> {
        if data.is_empty() {
            return Err(CropDoctorError::CaptureFailed("empty upload".to_string()));
        }

        let mime = declared_mime
            .filter(|mime| !mime.trim().is_empty())
            .or_else(|| Self::sniff_mime(data))
            .unwrap_or("application/octet-stream");

        Ok(EncodedImage::from_bytes(mime, data))
    }

    /// Maps the byte signature to a MIME type when the upload carried no
    /// usable content type of its own.
    fn sniff_mime(data: &[u8]) -> Option<&'static str> {
        match image::guess_format(data).ok()? {
            image::ImageFormat::Png => Some("image/png"),
            image::ImageFormat::Jpeg => Some("image/jpeg"),
            image::ImageFormat::Gif => Some("image/gif"),
            image::ImageFormat::WebP => Some("image/webp"),
            image::ImageFormat::Bmp => Some("image/bmp"),
            image::ImageFormat::Tiff => Some("image/tiff"),
            _ => None,
        }
    }
}

impl Default for CaptureService {
    fn default() -> Self {
        Self::new()
    }
}
