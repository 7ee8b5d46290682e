// src/models.rs
use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};

/// A user photo in its transport form: a self-describing
/// `data:<mime>;base64,<payload>` string. Held in memory only; the payload
/// is forwarded to the model opaquely, without decoding or validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct EncodedImage(String);

impl EncodedImage {
    /// Wraps an already-encoded image string. Blank input is refused;
    /// everything else is accepted as-is.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn from_bytes(mime: &str, data: &[u8]) -> Self {
        let payload = general_purpose::STANDARD.encode(data);
        Self(format!("data:{};base64,{}", mime, payload))
    }

    pub fn as_data_uri(&self) -> &str {
        &self.0
    }

    /// MIME type declared by the data URI, when the string carries one.
    pub fn mime_type(&self) -> Option<&str> {
        self.0
            .strip_prefix("data:")?
            .split(';')
            .next()
            .filter(|mime| !mime.is_empty())
    }
}

/// Raw diagnosis text exactly as the model returned it. Loosely markdown,
/// never parsed or validated on this side of the boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct AnalysisResult(pub String);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default)]
    pub image: Option<String>,
}

impl AnalysisRequest {
    /// The carried image, when the field is present and non-blank.
    pub fn encoded_image(self) -> Option<EncodedImage> {
        EncodedImage::new(self.image?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub analysis: AnalysisResult,
}

/// Body shared by the render and export endpoints: the analysis text the
/// client currently displays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRequest {
    #[serde(default)]
    pub analysis: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderResponse {
    pub html: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub image: String,
    pub filename: String,
    pub size: usize,
}

/// One styled fragment of inline text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InlineRun {
    pub text: String,
    pub strong: bool,
    pub emphasis: bool,
    pub code: bool,
}

impl InlineRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            strong: false,
            emphasis: false,
            code: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReportBlock {
    Heading { level: u8, runs: Vec<InlineRun> },
    Paragraph { runs: Vec<InlineRun> },
    ListItem { ordinal: Option<u64>, runs: Vec<InlineRun> },
    CodeBlock { text: String },
    Rule,
}

impl ReportBlock {
    pub fn runs(&self) -> &[InlineRun] {
        match self {
            ReportBlock::Heading { runs, .. }
            | ReportBlock::Paragraph { runs }
            | ReportBlock::ListItem { runs, .. } => runs,
            ReportBlock::CodeBlock { .. } | ReportBlock::Rule => &[],
        }
    }
}

/// The rendered view of one analysis: the verbatim source text, the block
/// tree it folded into, and an HTML projection for the page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenderedReport {
    pub source: String,
    pub blocks: Vec<ReportBlock>,
    pub html: String,
}

impl RenderedReport {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Text content with all markup stripped, block per line.
    pub fn plain_text(&self) -> String {
        let mut lines = Vec::with_capacity(self.blocks.len());
        for block in &self.blocks {
            match block {
                ReportBlock::CodeBlock { text } => lines.push(text.clone()),
                ReportBlock::Rule => {}
                _ => {
                    let joined: String =
                        block.runs().iter().map(|run| run.text.as_str()).collect();
                    lines.push(joined);
                }
            }
        }
        lines.join("\n")
    }
}
