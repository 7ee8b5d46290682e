// src/services/exporter.rs
use crate::errors::CropDoctorError;
use crate::models::{RenderedReport, ReportBlock};
use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{DynamicImage, Rgb, RgbImage};
use printpdf::{Image as PdfImage, ImageTransform, Mm, PdfDocument};

/// Deterministic download name for the exported report.
pub const REPORT_FILE_NAME: &str = "crop-analysis-report.pdf";

const PAGE_WIDTH_MM: f32 = 210.0;
const MM_PER_INCH: f32 = 25.4;

// The snapshot is drawn at 2x the 8px base glyph for legibility.
const SCALE: u32 = 2;
const HEADING_SCALE: u32 = 3;
const GLYPH: u32 = 8;
const MARGIN: u32 = 24;
const RASTER_WIDTH: u32 = 800;
const LINE_GAP: u32 = 6;
const BLOCK_GAP: u32 = 10;

const INK: Rgb<u8> = Rgb([30, 41, 59]);
const RULE_GRAY: Rgb<u8> = Rgb([203, 213, 225]);

/// Snapshots a rendered report into a raster image and lays it into a
/// single-page PDF at A4 width, height scaled to keep the aspect ratio.
pub struct ExporterService;

impl ExporterService {
    pub fn new() -> Self {
        Self
    }

    /// Produces the PDF bytes, or `ExportUnavailable` when there is no
    /// displayed result to snapshot.
    pub fn export(&self, report: &RenderedReport) -> Result<Vec<u8>, CropDoctorError> {
        if report.is_empty() {
            return Err(CropDoctorError::ExportUnavailable(
                "no rendered result to snapshot".to_string(),
            ));
        }

        let raster = self.snapshot(report);
        assemble_pdf(&raster)
    }

    /// Draws the block tree onto a white canvas with the 8x8 bitmap font.
    /// Glyphs outside the font's coverage draw as `?`.
    fn snapshot(&self, report: &RenderedReport) -> RgbImage {
        let lines = layout(report);

        let mut height = MARGIN;
        for line in &lines {
            height += line.advance();
        }
        // Footer line plus bottom margin.
        height += BLOCK_GAP + GLYPH * SCALE + MARGIN;

        let mut img = RgbImage::from_pixel(RASTER_WIDTH, height.max(MARGIN * 2), Rgb([255, 255, 255]));

        let mut y = MARGIN;
        for line in &lines {
            match line {
                Line::Text {
                    text,
                    scale,
                    bold,
                    indent,
                } => {
                    let x = (MARGIN + indent) as i32;
                    draw_text(&mut img, x, y as i32, text, INK, *scale);
                    if *bold {
                        // Double-strike stands in for a bold face.
                        draw_text(&mut img, x + 1, y as i32, text, INK, *scale);
                    }
                }
                Line::Rule => {
                    for x in MARGIN..RASTER_WIDTH - MARGIN {
                        img.put_pixel(x, y + 2, RULE_GRAY);
                    }
                }
                Line::Gap => {}
            }
            y += line.advance();
        }

        let footer = format!(
            "Generated {}",
            chrono::Utc::now().format("%Y-%m-%d %H:%M UTC")
        );
        draw_text(
            &mut img,
            MARGIN as i32,
            (y + BLOCK_GAP) as i32,
            &footer,
            RULE_GRAY,
            1,
        );

        img
    }
}

impl Default for ExporterService {
    fn default() -> Self {
        Self::new()
    }
}

enum Line {
    Text {
        text: String,
        scale: u32,
        bold: bool,
        indent: u32,
    },
    Rule,
    Gap,
}

impl Line {
    fn advance(&self) -> u32 {
        match self {
            Line::Text { scale, .. } => GLYPH * scale + LINE_GAP,
            Line::Rule => GLYPH * SCALE,
            Line::Gap => BLOCK_GAP,
        }
    }
}

/// Flattens the block tree into wrapped raster lines.
fn layout(report: &RenderedReport) -> Vec<Line> {
    let mut lines = Vec::new();

    for block in &report.blocks {
        match block {
            ReportBlock::Heading { .. } => {
                for wrapped in wrap(&joined(block), columns(HEADING_SCALE, 0)) {
                    lines.push(Line::Text {
                        text: wrapped,
                        scale: HEADING_SCALE,
                        bold: true,
                        indent: 0,
                    });
                }
                lines.push(Line::Gap);
            }
            ReportBlock::Paragraph { .. } => {
                for wrapped in wrap(&joined(block), columns(SCALE, 0)) {
                    lines.push(Line::Text {
                        text: wrapped,
                        scale: SCALE,
                        bold: false,
                        indent: 0,
                    });
                }
                lines.push(Line::Gap);
            }
            ReportBlock::ListItem { ordinal, .. } => {
                let marker = match ordinal {
                    Some(n) => format!("{}. ", n),
                    None => "- ".to_string(),
                };
                let indent = GLYPH * SCALE;
                // The marker is drawn inline, so it comes out of the
                // wrap budget; continuation lines pad to the same column.
                let marker_cols = marker.chars().count();
                let width = columns(SCALE, indent).saturating_sub(marker_cols).max(1);
                let mut first = true;
                for wrapped in wrap(&joined(block), width) {
                    let text = if first {
                        format!("{}{}", marker, wrapped)
                    } else {
                        format!("{}{}", " ".repeat(marker_cols), wrapped)
                    };
                    first = false;
                    lines.push(Line::Text {
                        text,
                        scale: SCALE,
                        bold: false,
                        indent,
                    });
                }
            }
            ReportBlock::CodeBlock { text } => {
                for raw in text.lines() {
                    for wrapped in wrap(raw, columns(SCALE, GLYPH * SCALE)) {
                        lines.push(Line::Text {
                            text: wrapped,
                            scale: SCALE,
                            bold: false,
                            indent: GLYPH * SCALE,
                        });
                    }
                }
                lines.push(Line::Gap);
            }
            ReportBlock::Rule => {
                lines.push(Line::Rule);
                lines.push(Line::Gap);
            }
        }
    }

    lines
}

fn joined(block: &ReportBlock) -> String {
    block.runs().iter().map(|run| run.text.as_str()).collect()
}

fn columns(scale: u32, indent: u32) -> usize {
    ((RASTER_WIDTH - 2 * MARGIN - indent) / (GLYPH * scale)) as usize
}

/// Greedy word wrap; a single word longer than the line is split hard.
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current_len > 0 && current_len + 1 + word_len > max_chars {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if word_len > max_chars {
            let mut chunk = String::new();
            for ch in word.chars() {
                if chunk.chars().count() == max_chars {
                    lines.push(std::mem::take(&mut chunk));
                }
                chunk.push(ch);
            }
            current = chunk;
            current_len = current.chars().count();
            continue;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn draw_text(img: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>, scale: u32) {
    let scale_i = scale.max(1) as i32;
    let mut cursor_x = x;
    for ch in text.chars() {
        let glyph = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?'));
        let Some(glyph) = glyph else {
            cursor_x += 8 * scale_i;
            continue;
        };
        for (row_idx, row) in glyph.iter().enumerate() {
            let row_bits = *row;
            for col_idx in 0..8 {
                if (row_bits >> col_idx) & 1 == 0 {
                    continue;
                }
                let px = cursor_x + col_idx * scale_i;
                let py = y + row_idx as i32 * scale_i;
                for sy in 0..scale_i {
                    for sx in 0..scale_i {
                        let tx = px + sx;
                        let ty = py + sy;
                        if tx >= 0
                            && ty >= 0
                            && tx < img.width() as i32
                            && ty < img.height() as i32
                        {
                            img.put_pixel(tx as u32, ty as u32, color);
                        }
                    }
                }
            }
        }
        cursor_x += 8 * scale_i;
    }
}

/// One page at A4 width; the height follows the snapshot's aspect ratio.
fn assemble_pdf(raster: &RgbImage) -> Result<Vec<u8>, CropDoctorError> {
    let dpi = raster.width() as f32 * MM_PER_INCH / PAGE_WIDTH_MM;
    let page_height_mm = raster.height() as f32 * MM_PER_INCH / dpi;

    let (doc, page, layer) = PdfDocument::new(
        "Crop Analysis Report",
        Mm(PAGE_WIDTH_MM),
        Mm(page_height_mm),
        "report",
    );

    let snapshot = DynamicImage::ImageRgb8(raster.clone());
    let embedded = PdfImage::from_dynamic_image(&snapshot);
    embedded.add_to_layer(
        doc.get_page(page).get_layer(layer),
        ImageTransform {
            dpi: Some(dpi),
            ..Default::default()
        },
    );

    doc.save_to_bytes()
        .map_err(|e| CropDoctorError::ExportUnavailable(format!("pdf assembly failed: {}", e)))
}
