//! # Export
//!
//! Turns a [`Document`] into a downloadable [`Artifact`]:
//!
//! | format   | file                 | notes                                   |
//! |----------|----------------------|-----------------------------------------|
//! | html     | `<name>.html`        | standalone, styled, printable           |
//! | json     | `<name>.json`        | structured block list, re-importable    |
//! | markdown | `<name>.md`          | best effort, media become placeholders  |
//! | pdf      | `<name>.print.html`  | preview page that opens the print dialog |
//!
//! HTML, JSON and Markdown require a real title and at least one block, the
//! same precondition as saving. Exports embed the clean block markup; the
//! editing affordances only exist in [`crate::render::editor_markup`].

use crate::config::EditorConfig;
use crate::error::{EditorError, Result};
use crate::model::{Block, BlockAttributes, Document, HeadingLevel, TextAlign, TextStyle};
use crate::render::{element_classes, escape_html};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

const MAX_FILENAME_CHARS: usize = 100;

static FORBIDDEN_FILENAME_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[<>:"/\\|?*\x00-\x1f]"#).expect("filename pattern is valid")
});

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Html,
    Json,
    Markdown,
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Html => ".html",
            ExportFormat::Json => ".json",
            ExportFormat::Markdown => ".md",
            ExportFormat::Pdf => ".print.html",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ExportFormat::Html | ExportFormat::Pdf => "text/html",
            ExportFormat::Json => "application/json",
            ExportFormat::Markdown => "text/markdown",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Html => "HTML",
            ExportFormat::Json => "JSON",
            ExportFormat::Markdown => "Markdown",
            ExportFormat::Pdf => "PDF",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(ExportFormat::Html),
            "json" => Ok(ExportFormat::Json),
            "md" | "markdown" => Ok(ExportFormat::Markdown),
            "pdf" | "print" => Ok(ExportFormat::Pdf),
            other => Err(EditorError::UnsupportedFormat(format!(
                "{} (expected html, json, md or pdf)",
                other
            ))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An exported file, ready to be written somewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub filename: String,
    pub mime: String,
    pub content: String,
}

impl Artifact {
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }
        let path = dir.join(&self.filename);
        fs::write(&path, &self.content)?;
        debug!(path = %path.display(), bytes = self.content.len(), "wrote artifact");
        Ok(path)
    }
}

/// File-name stem for a title: unsafe characters and whitespace become `_`,
/// lowercased, at most 100 characters.
pub fn sanitize_filename(title: &str) -> String {
    let replaced = FORBIDDEN_FILENAME_CHARS.replace_all(title.trim(), "_");
    let collapsed = WHITESPACE_RUN.replace_all(&replaced, "_");
    let stem: String = collapsed
        .to_lowercase()
        .chars()
        .take(MAX_FILENAME_CHARS)
        .collect();
    if stem.is_empty() {
        "document".to_string()
    } else {
        stem
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedDocument {
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub content: Vec<ExportedItem>,
    #[serde(default)]
    pub metadata: ExportMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedItem {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub order: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<BlockAttributes>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    pub created: DateTime<Utc>,
    pub item_count: usize,
    pub version: String,
}

pub struct ExportEngine {
    placeholder_title: String,
    version: String,
}

impl ExportEngine {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            placeholder_title: config.placeholder_title.clone(),
            version: config.export_version.clone(),
        }
    }

    pub fn ensure_complete(&self, document: &Document) -> Result<()> {
        document.ensure_complete(&self.placeholder_title, "exporting")
    }

    pub fn export(
        &self,
        document: &Document,
        format: ExportFormat,
        now: DateTime<Utc>,
    ) -> Result<Artifact> {
        let content = match format {
            ExportFormat::Html => self.to_html(document, now)?,
            ExportFormat::Json => self.to_json(document, now)?,
            ExportFormat::Markdown => self.to_markdown(document)?,
            ExportFormat::Pdf => to_print_view(document),
        };
        Ok(Artifact {
            filename: format!("{}{}", sanitize_filename(&document.title), format.extension()),
            mime: format.mime().to_string(),
            content,
        })
    }

    pub fn to_html(&self, document: &Document, now: DateTime<Utc>) -> Result<String> {
        self.ensure_complete(document)?;

        let title = escape_html(&document.title);
        let mut head_meta = format!("<meta name=\"description\" content=\"{}\">\n", title);
        let mut meta = String::new();
        if !document.author.trim().is_empty() {
            let author = escape_html(&document.author);
            head_meta.push_str(&format!("<meta name=\"author\" content=\"{}\">\n", author));
            meta.push_str(&format!("<div><strong>Author:</strong> {}</div>", author));
        }
        meta.push_str(&format!(
            "<div><strong>Created:</strong> {}</div>",
            now.format("%Y-%m-%d")
        ));

        let mut tags = String::new();
        if !document.tags.is_empty() {
            head_meta.push_str(&format!(
                "<meta name=\"keywords\" content=\"{}\">\n",
                escape_html(&document.tags_line())
            ));
            let chips: String = document
                .tags
                .iter()
                .map(|tag| format!("<span class=\"tag\">{}</span>", escape_html(tag)))
                .collect();
            tags = format!("<div class=\"document-tags\">{}</div>", chips);
        }

        Ok(format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n{head_meta}<style>{EXPORT_CSS}</style>\n</head>\n<body>\n<div class=\"document-container\">\n<div class=\"document-header\">\n<h1 class=\"document-title\">{title}</h1>\n<div class=\"document-meta\">{meta}</div>\n{tags}\n</div>\n<div class=\"document-content\">\n{body}\n</div>\n</div>\n</body>\n</html>\n",
            body = clean_body(document),
        ))
    }

    pub fn to_json(&self, document: &Document, now: DateTime<Utc>) -> Result<String> {
        self.ensure_complete(document)?;

        let exported = ExportedDocument {
            title: document.title.clone(),
            author: document.author.clone(),
            tags: document.tags.clone(),
            content: document
                .blocks
                .iter()
                .enumerate()
                .map(|(order, block)| ExportedItem {
                    kind: block.kind().as_str().to_string(),
                    classes: element_classes(block.attributes()),
                    content: block.attributes().plain_text(),
                    order,
                    attributes: Some(block.attributes().clone()),
                })
                .collect(),
            metadata: ExportMetadata {
                created: now,
                item_count: document.blocks.len(),
                version: self.version.clone(),
            },
        };
        Ok(serde_json::to_string_pretty(&exported)?)
    }

    pub fn to_markdown(&self, document: &Document) -> Result<String> {
        self.ensure_complete(document)?;

        let mut md = format!("# {}\n\n", document.title.trim());
        if !document.author.trim().is_empty() {
            md.push_str(&format!("**Author:** {}\n\n", document.author.trim()));
        }
        if !document.tags.is_empty() {
            md.push_str(&format!("**Tags:** {}\n\n", document.tags_line()));
        }
        md.push_str("---\n\n");

        for block in &document.blocks {
            md.push_str(&markdown_block(block));
            md.push_str("\n\n");
        }
        Ok(md)
    }
}

fn markdown_block(block: &Block) -> String {
    match block.attributes() {
        BlockAttributes::Text { content, .. } => content.clone(),
        BlockAttributes::Heading { text, level } => {
            format!("{} {}", "#".repeat(level.number() as usize), text)
        }
        BlockAttributes::Quote { text, author } => {
            let mut quoted: Vec<String> = text.lines().map(|l| format!("> {}", l)).collect();
            if let Some(author) = author {
                quoted.push(format!("> — {}", author));
            }
            quoted.join("\n")
        }
        BlockAttributes::Image { url, alt, caption } => with_caption(
            format!("![{}]({})", alt.as_deref().unwrap_or("Image"), url),
            caption.as_deref(),
        ),
        BlockAttributes::Video { caption, .. } => {
            with_caption("[Media file]".to_string(), caption.as_deref())
        }
        BlockAttributes::Audio { title, .. } => {
            with_caption("[Media file]".to_string(), title.as_deref())
        }
    }
}

fn with_caption(line: String, caption: Option<&str>) -> String {
    match caption {
        Some(c) if !c.trim().is_empty() => format!("{}\n*{}*", line, c.trim()),
        _ => line,
    }
}

fn clean_body(document: &Document) -> String {
    document
        .blocks
        .iter()
        .map(Block::markup)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Lightweight standalone page for previewing the current document.
pub fn preview_html(document: &Document) -> String {
    let title = if document.title.trim().is_empty() {
        "Preview".to_string()
    } else {
        escape_html(&document.title)
    };
    let mut meta = String::new();
    if !document.author.trim().is_empty() {
        meta.push_str(&format!(
            "<p><strong>Author:</strong> {}</p>\n",
            escape_html(&document.author)
        ));
    }
    if !document.tags.is_empty() {
        meta.push_str(&format!(
            "<p><strong>Tags:</strong> {}</p>\n",
            escape_html(&document.tags_line())
        ));
    }
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title} - Preview</title>\n<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n<style>{PREVIEW_CSS}</style>\n</head>\n<body>\n<div class=\"container\">\n<h1>{title}</h1>\n{meta}<div>\n{body}\n</div>\n</div>\n</body>\n</html>\n",
        body = clean_body(document),
    )
}

const PRINT_SCRIPT: &str = "<script>window.addEventListener('load', function () { setTimeout(function () { window.print(); }, 500); });</script>\n";

/// The preview page plus a script that opens the print dialog once loaded.
/// There is no PDF encoder; saving as PDF is left to the print dialog.
pub fn to_print_view(document: &Document) -> String {
    let preview = preview_html(document);
    match preview.rfind("</body>") {
        Some(pos) => format!("{}{}{}", &preview[..pos], PRINT_SCRIPT, &preview[pos..]),
        None => format!("{}{}", preview, PRINT_SCRIPT),
    }
}

/// Rebuilds a document from the JSON export.
///
/// Items carrying `attributes` are restored exactly. Older exports without
/// them can still bring back text, headings and quotes from `type` and
/// `content`; media items cannot be rebuilt that way.
pub fn from_json(text: &str) -> Result<Document> {
    let mut exported: ExportedDocument = serde_json::from_str(text)
        .map_err(|e| EditorError::Validation(format!("Not a valid JSON export: {}", e)))?;
    exported.content.sort_by_key(|item| item.order);

    let blocks = exported
        .content
        .into_iter()
        .map(item_to_block)
        .collect::<Result<Vec<_>>>()?;

    Ok(Document {
        title: exported.title,
        author: exported.author,
        tags: exported
            .tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        blocks,
    })
}

fn item_to_block(item: ExportedItem) -> Result<Block> {
    if let Some(attributes) = item.attributes {
        return Block::new(attributes);
    }

    let has_class = |name: &str| item.classes.iter().any(|c| c == name);
    let content = item.content.trim().to_string();
    let attributes = match item.kind.to_ascii_lowercase().as_str() {
        "text" | "p" => BlockAttributes::Text {
            content,
            align: TextAlign::default(),
            style: TextStyle::default(),
            lyrics: has_class("lyrics"),
        },
        "heading" => BlockAttributes::Heading {
            text: content,
            level: HeadingLevel::default(),
        },
        tag @ ("h2" | "h3" | "h4") => BlockAttributes::Heading {
            text: content,
            level: tag.parse()?,
        },
        "quote" => BlockAttributes::Quote {
            text: content,
            author: None,
        },
        "div" if has_class("quote-block") => BlockAttributes::Quote {
            text: content,
            author: None,
        },
        other => {
            return Err(EditorError::Validation(format!(
                "Cannot rebuild a '{}' item without its attributes (item {})",
                other,
                item.order.saturating_add(1)
            )))
        }
    };
    Block::new(attributes)
}

const EXPORT_CSS: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif; background: #000; color: #fff; line-height: 1.6; margin: 0; padding: 2rem; }
.document-container { max-width: 900px; margin: 0 auto; background: #1e1e1e; padding: 3rem; border-radius: 1rem; box-shadow: 0 20px 40px rgba(0,0,0,0.3); }
.document-header { border-bottom: 2px solid #333; padding-bottom: 2rem; margin-bottom: 3rem; }
.document-title { color: #00d4ff; font-size: 3rem; font-weight: 700; margin: 0 0 1rem 0; }
.document-meta { color: #999; font-size: 1.1rem; }
.document-tags { margin-top: 1rem; }
.tag { background: rgba(0,212,255,0.2); color: #00d4ff; padding: 0.3rem 0.8rem; margin: 0 0.5rem 0.5rem 0; border-radius: 20px; font-size: 0.9rem; display: inline-block; }
.editable-item { margin: 2rem 0; }
h1, h2, h3, h4 { color: #00d4ff; font-weight: 600; margin: 2rem 0 1rem 0; }
h2 { font-size: 2.5rem; }
h3 { font-size: 2rem; }
h4 { font-size: 1.5rem; }
p { margin: 1.5rem 0; padding: 1.5rem; background: rgba(255,255,255,0.05); border-radius: 12px; line-height: 1.7; }
p[data-align="center"] { text-align: center; }
p[data-align="right"] { text-align: right; }
p[data-align="justify"] { text-align: justify; }
p[data-style="flat"] { background: none; }
p[data-style="elevated"] { box-shadow: 0 8px 24px rgba(0,0,0,0.4); }
p[data-style="bordered"] { border: 1px solid #333; }
.lyrics { background: rgba(0,212,255,0.1); border-left: 4px solid #00d4ff; font-style: italic; white-space: pre-line; }
.media-item { margin: 3rem 0; border-radius: 1rem; overflow: hidden; background: rgba(255,255,255,0.05); }
img, video, audio { width: 100%; max-width: 100%; height: auto; border-radius: 0.5rem; }
.media-caption { padding: 1rem; text-align: center; color: #ccc; font-style: italic; }
.quote-block { background: rgba(0,212,255,0.1); border-left: 6px solid #00d4ff; padding: 2.5rem; margin: 3rem 0; font-style: italic; font-size: 1.2rem; border-radius: 0.5rem; }
.video-container { position: relative; width: 100%; height: 0; padding-bottom: 56.25%; }
.video-container iframe { position: absolute; top: 0; left: 0; width: 100%; height: 100%; border-radius: 0.5rem; }
@media print { body { background: #fff; color: #000; } .document-container { background: #fff; box-shadow: none; } .document-title, h1, h2, h3, h4 { color: #000; } p { background: #f5f5f5; } }
"#;

const PREVIEW_CSS: &str = r#"
body { font-family: Inter, sans-serif; background: #000; color: #fff; line-height: 1.6; padding: 2rem; }
.container { max-width: 900px; margin: 0 auto; background: #1e1e1e; padding: 3rem; border-radius: 1rem; }
h1 { color: #00d4ff; font-size: 3rem; margin-bottom: 2rem; }
p { margin-bottom: 2rem; padding: 2rem; background: rgba(0,0,0,0.2); border-radius: 12px; }
.media-item { margin: 3rem 0; border-radius: 1rem; overflow: hidden; }
img, video { width: 100%; height: auto; }
.quote-block { background: rgba(0,212,255,0.1); border-left: 6px solid #00d4ff; padding: 2.5rem; margin: 3rem 0; font-style: italic; }
@media print { body { background: #fff; color: #000; } .container { background: #fff; } h1 { color: #000; } }
"#;
