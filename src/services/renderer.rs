// src/services/renderer.rs
use crate::models::{AnalysisResult, InlineRun, RenderedReport, ReportBlock};
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};

/// Folds the diagnosis text into a block tree and an HTML projection.
/// The text is treated as untrusted markup from the model: anything the
/// fold does not recognize is kept as plain text, and a parse that yields
/// nothing falls back to one paragraph carrying the raw source. Rendering
/// never fails.
pub struct RendererService;

impl RendererService {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, result: &AnalysisResult) -> RenderedReport {
        let source = result.0.clone();
        let mut blocks = fold_blocks(&source);

        if blocks.is_empty() && !source.trim().is_empty() {
            blocks.push(ReportBlock::Paragraph {
                runs: vec![InlineRun::plain(source.clone())],
            });
        }

        let html = project_html(&blocks);
        RenderedReport {
            source,
            blocks,
            html,
        }
    }
}

impl Default for RendererService {
    fn default() -> Self {
        Self::new()
    }
}

struct Fold {
    blocks: Vec<ReportBlock>,
    runs: Vec<InlineRun>,
    strong: u32,
    emphasis: u32,
    // One counter per open list; None for bullet lists.
    ordinals: Vec<Option<u64>>,
    // Open list items. Paragraph boundaries inside an item must not
    // flush, or a loose item's runs would end up as a bare paragraph.
    item_depth: u32,
}

impl Fold {
    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.runs.push(InlineRun {
            text: text.to_string(),
            strong: self.strong > 0,
            emphasis: self.emphasis > 0,
            code: false,
        });
    }

    fn take_runs(&mut self) -> Vec<InlineRun> {
        std::mem::take(&mut self.runs)
    }

    /// Ends a container that maps to a paragraph; drops empty ones.
    fn flush_paragraph(&mut self) {
        let runs = self.take_runs();
        if !runs.is_empty() {
            self.blocks.push(ReportBlock::Paragraph { runs });
        }
    }
}

fn fold_blocks(source: &str) -> Vec<ReportBlock> {
    let mut fold = Fold {
        blocks: Vec::new(),
        runs: Vec::new(),
        strong: 0,
        emphasis: 0,
        ordinals: Vec::new(),
        item_depth: 0,
    };
    let mut heading_level: Option<u8> = None;
    let mut code_block: Option<String> = None;

    for event in Parser::new(source) {
        // Inside a fenced/indented block every event is literal text.
        if let Some(buf) = code_block.as_mut() {
            match event {
                Event::End(TagEnd::CodeBlock) => {
                    let text = code_block.take().unwrap_or_default();
                    fold.blocks.push(ReportBlock::CodeBlock {
                        text: text.trim_end_matches('\n').to_string(),
                    });
                }
                Event::Text(text) => buf.push_str(&text),
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                fold.flush_paragraph();
                heading_level = Some(heading_rank(level));
            }
            Event::End(TagEnd::Heading(_)) => {
                let level = heading_level.take().unwrap_or(1);
                let runs = fold.take_runs();
                if !runs.is_empty() {
                    fold.blocks.push(ReportBlock::Heading { level, runs });
                }
            }
            Event::Start(Tag::List(start)) => {
                fold.flush_paragraph();
                fold.ordinals.push(start);
            }
            Event::End(TagEnd::List(_)) => {
                fold.ordinals.pop();
            }
            Event::Start(Tag::Item) => {
                fold.flush_paragraph();
                fold.item_depth += 1;
            }
            Event::End(TagEnd::Item) => {
                fold.item_depth = fold.item_depth.saturating_sub(1);
                let ordinal = match fold.ordinals.last_mut() {
                    Some(Some(n)) => {
                        let current = *n;
                        *n += 1;
                        Some(current)
                    }
                    _ => None,
                };
                let runs = fold.take_runs();
                if !runs.is_empty() {
                    fold.blocks.push(ReportBlock::ListItem { ordinal, runs });
                }
            }
            Event::Start(Tag::CodeBlock(_)) => {
                fold.flush_paragraph();
                code_block = Some(String::new());
            }
            Event::Start(Tag::Strong) => fold.strong += 1,
            Event::End(TagEnd::Strong) => fold.strong = fold.strong.saturating_sub(1),
            Event::Start(Tag::Emphasis) => fold.emphasis += 1,
            Event::End(TagEnd::Emphasis) => fold.emphasis = fold.emphasis.saturating_sub(1),
            // Loose list items wrap their text in paragraphs; those runs
            // stay buffered for the enclosing item, joined by a space.
            Event::Start(Tag::Paragraph) => {
                if fold.item_depth > 0 && !fold.runs.is_empty() {
                    fold.push_text(" ");
                }
            }
            Event::End(TagEnd::Paragraph) => {
                if fold.item_depth == 0 {
                    fold.flush_paragraph();
                }
            }
            Event::Rule => {
                fold.flush_paragraph();
                fold.blocks.push(ReportBlock::Rule);
            }
            Event::Text(text) => fold.push_text(&text),
            Event::Code(text) => {
                fold.runs.push(InlineRun {
                    text: text.to_string(),
                    strong: fold.strong > 0,
                    emphasis: fold.emphasis > 0,
                    code: true,
                });
            }
            // Raw HTML is not interpreted; the model's markup degrades to
            // its literal text rather than reaching the page as markup.
            Event::Html(text) | Event::InlineHtml(text) => fold.push_text(&text),
            Event::InlineMath(text) | Event::DisplayMath(text) => fold.push_text(&text),
            Event::End(TagEnd::HtmlBlock) => fold.flush_paragraph(),
            Event::SoftBreak | Event::HardBreak => fold.push_text(" "),
            // Blockquotes, tables, links, footnotes and anything else fall
            // through: their inner text still arrives as Text events.
            Event::Start(_) | Event::End(_) => {}
            Event::FootnoteReference(text) => fold.push_text(&text),
            Event::TaskListMarker(_) => {}
        }
    }

    fold.flush_paragraph();
    fold.blocks
}

fn heading_rank(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn project_html(blocks: &[ReportBlock]) -> String {
    let mut html = String::new();
    let mut i = 0;
    while i < blocks.len() {
        match &blocks[i] {
            // A run of consecutive items becomes one list element; the
            // first ordinal seeds `start` so numbering survives.
            ReportBlock::ListItem { ordinal, .. } => {
                let ordered = ordinal.is_some();
                let mut end = i;
                while let Some(ReportBlock::ListItem { ordinal, .. }) = blocks.get(end) {
                    if ordinal.is_some() != ordered {
                        break;
                    }
                    end += 1;
                }
                match ordinal {
                    Some(start) => html.push_str(&format!("<ol start=\"{}\">\n", start)),
                    None => html.push_str("<ul>\n"),
                }
                for item in &blocks[i..end] {
                    html.push_str("<li>");
                    push_runs(&mut html, item.runs());
                    html.push_str("</li>\n");
                }
                html.push_str(if ordered { "</ol>\n" } else { "</ul>\n" });
                i = end;
            }
            ReportBlock::Heading { level, runs } => {
                html.push_str(&format!("<h{}>", level));
                push_runs(&mut html, runs);
                html.push_str(&format!("</h{}>\n", level));
                i += 1;
            }
            ReportBlock::Paragraph { runs } => {
                html.push_str("<p>");
                push_runs(&mut html, runs);
                html.push_str("</p>\n");
                i += 1;
            }
            ReportBlock::CodeBlock { text } => {
                html.push_str("<pre><code>");
                html.push_str(&escape_html(text));
                html.push_str("</code></pre>\n");
                i += 1;
            }
            ReportBlock::Rule => {
                html.push_str("<hr>\n");
                i += 1;
            }
        }
    }
    html
}

fn push_runs(html: &mut String, runs: &[InlineRun]) {
    for run in runs {
        if run.strong {
            html.push_str("<strong>");
        }
        if run.emphasis {
            html.push_str("<em>");
        }
        if run.code {
            html.push_str("<code>");
        }
        html.push_str(&escape_html(&run.text));
        if run.code {
            html.push_str("</code>");
        }
        if run.emphasis {
            html.push_str("</em>");
        }
        if run.strong {
            html.push_str("</strong>");
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
