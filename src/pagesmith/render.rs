//! # Block Rendering
//!
//! Turns modal-form input into validated [`Block`]s and renders each block's
//! attributes into a sanitized HTML fragment.
//!
//! Two rules hold for every fragment produced here:
//! - free text is HTML-escaped before it is embedded
//! - URL fields were rejected earlier if they contain `<`, `>`, `"` or `'`
//!
//! Rendering is a pure function of [`BlockAttributes`]; the dispatch is a
//! `match` on the closed attribute enum, so adding a block kind is a compile
//! error until it has a renderer.

use crate::error::{EditorError, Result};
use crate::media;
use crate::model::{
    Block, BlockAttributes, BlockKind, HeadingLevel, TextAlign, TextStyle, VideoSource,
};
use crate::upload::UploadedFile;
use std::collections::HashMap;

/// Raw field values from the block form, keyed by field name.
#[derive(Debug, Clone, Default)]
pub struct FormFields {
    values: HashMap<String, String>,
}

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Trimmed value, or `None` when the field is absent or blank.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, name: &str, message: &str) -> Result<String> {
        self.get(name)
            .map(str::to_string)
            .ok_or_else(|| EditorError::Validation(message.to_string()))
    }

    fn optional(&self, name: &str) -> Option<String> {
        self.get(name).map(str::to_string)
    }

    fn flag(&self, name: &str) -> bool {
        matches!(
            self.get(name).map(str::to_ascii_lowercase).as_deref(),
            Some("true" | "on" | "1" | "yes")
        )
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = FormFields::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

pub fn build_block(kind: BlockKind, fields: &FormFields) -> Result<Block> {
    Block::new(attributes_from_form(kind, fields)?)
}

pub fn attributes_from_form(kind: BlockKind, fields: &FormFields) -> Result<BlockAttributes> {
    match kind {
        BlockKind::Text => {
            let content = fields.required("text-content", "Please enter some text content")?;
            let align = match fields.get("text-align") {
                Some(v) => v.parse::<TextAlign>()?,
                None => TextAlign::default(),
            };
            let style = match fields.get("text-style") {
                Some(v) => v.parse::<TextStyle>()?,
                None => TextStyle::default(),
            };
            Ok(BlockAttributes::Text {
                content,
                align,
                style,
                lyrics: fields.flag("is-lyrics"),
            })
        }
        BlockKind::Heading => {
            let text = fields.required("heading-text", "Please enter heading text")?;
            let level = match fields.get("heading-level") {
                Some(v) => v.parse::<HeadingLevel>()?,
                None => HeadingLevel::default(),
            };
            Ok(BlockAttributes::Heading { text, level })
        }
        BlockKind::Image => {
            let url = fields.required(
                "image-url",
                "Please enter an image URL or upload an image",
            )?;
            check_image_url(&url)?;
            Ok(BlockAttributes::Image {
                url,
                alt: fields.optional("image-alt"),
                caption: fields.optional("image-caption"),
            })
        }
        BlockKind::Video => {
            let url = fields.required("video-url", "Please enter a video URL")?;
            media::ensure_safe_url(&url)?;
            media::parse_absolute_url(&url, "video")?;
            Ok(BlockAttributes::Video {
                source: media::video_source(&url)?,
                caption: fields.optional("video-caption"),
            })
        }
        BlockKind::Audio => {
            let url = fields.required("audio-url", "Please enter an audio URL")?;
            media::ensure_safe_url(&url)?;
            media::parse_absolute_url(&url, "audio")?;
            let format = media::direct_audio_format(&url).ok_or_else(|| {
                EditorError::UnsupportedFormat(
                    "Please use direct audio file URLs (.mp3, .wav, .ogg, .m4a, .aac, .flac, .wma)"
                        .to_string(),
                )
            })?;
            Ok(BlockAttributes::Audio {
                url,
                format,
                title: fields.optional("audio-title"),
            })
        }
        BlockKind::Quote => {
            let text = fields.required("quote-text", "Please enter quote text")?;
            Ok(BlockAttributes::Quote {
                text,
                author: fields.optional("quote-author"),
            })
        }
    }
}

fn check_image_url(url: &str) -> Result<()> {
    media::ensure_safe_url(url)?;
    if media::is_data_url_of(url, "image/") {
        return Ok(());
    }
    media::parse_absolute_url(url, "image").map(|_| ())
}

fn check_media_file_url(url: &str, data_prefix: &str, what: &str) -> Result<()> {
    media::ensure_safe_url(url)?;
    if media::is_data_url_of(url, data_prefix) {
        return Ok(());
    }
    media::parse_absolute_url(url, what).map(|_| ())
}

fn non_blank(value: &str, message: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(EditorError::Validation(message.to_string()))
    } else {
        Ok(())
    }
}

/// Checks attributes that did not come through the form (storage, imports,
/// direct edits).
pub fn validate_attributes(attributes: &BlockAttributes) -> Result<()> {
    match attributes {
        BlockAttributes::Text { content, .. } => {
            non_blank(content, "Please enter some text content")
        }
        BlockAttributes::Heading { text, .. } => non_blank(text, "Please enter heading text"),
        BlockAttributes::Image { url, .. } => {
            non_blank(url, "Please enter an image URL or upload an image")?;
            check_image_url(url)
        }
        BlockAttributes::Video { source, .. } => match source {
            VideoSource::YouTube { id } if media::is_valid_youtube_id(id) => Ok(()),
            VideoSource::Vimeo { id } if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) => {
                Ok(())
            }
            VideoSource::File { url, format } if media::is_format_token(format) => {
                non_blank(url, "Please enter a video URL")?;
                check_media_file_url(url, "video/", "video")
            }
            _ => Err(EditorError::UnsupportedFormat(
                "Invalid video source".to_string(),
            )),
        },
        BlockAttributes::Audio { url, format, .. } => {
            non_blank(url, "Please enter an audio URL")?;
            if !media::is_format_token(format) {
                return Err(EditorError::UnsupportedFormat(format!(
                    "Invalid audio format: {}",
                    format
                )));
            }
            check_media_file_url(url, "audio/", "audio")
        }
        BlockAttributes::Quote { text, .. } => non_blank(text, "Please enter quote text"),
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

pub fn render_markup(attributes: &BlockAttributes) -> String {
    match attributes {
        BlockAttributes::Text {
            content,
            align,
            style,
            lyrics,
        } => render_text(content, *align, *style, *lyrics),
        BlockAttributes::Heading { text, level } => render_heading(text, *level),
        BlockAttributes::Image { url, alt, caption } => {
            render_image(url, alt.as_deref(), caption.as_deref())
        }
        BlockAttributes::Video { source, caption } => render_video(source, caption.as_deref()),
        BlockAttributes::Audio { url, format, title } => {
            render_audio(url, format, title.as_deref())
        }
        BlockAttributes::Quote { text, author } => render_quote(text, author.as_deref()),
    }
}

fn render_text(content: &str, align: TextAlign, style: TextStyle, lyrics: bool) -> String {
    let mut attrs = String::new();
    if align != TextAlign::Left {
        attrs.push_str(&format!(" data-align=\"{}\"", align.as_str()));
    }
    if style != TextStyle::Standard {
        attrs.push_str(&format!(" data-style=\"{}\"", style.as_str()));
    }
    format!(
        "<p class=\"{}\"{}>{}</p>",
        element_classes(&BlockAttributes::Text {
            content: String::new(),
            align,
            style,
            lyrics,
        })
        .join(" "),
        attrs,
        escape_html(content)
    )
}

fn render_heading(text: &str, level: HeadingLevel) -> String {
    let n = level.number();
    format!("<h{n} class=\"editable-item\">{}</h{n}>", escape_html(text))
}

fn caption_div(caption: Option<&str>) -> String {
    match caption {
        Some(c) if !c.trim().is_empty() => {
            format!("<div class=\"media-caption\">{}</div>", escape_html(c))
        }
        _ => String::new(),
    }
}

fn media_item(inner: String, caption: Option<&str>) -> String {
    format!(
        "<div class=\"media-item editable-item\">{}{}</div>",
        inner,
        caption_div(caption)
    )
}

fn render_image(url: &str, alt: Option<&str>, caption: Option<&str>) -> String {
    media_item(
        format!(
            "<img src=\"{}\" alt=\"{}\" loading=\"lazy\" />",
            escape_html(url),
            escape_html(alt.unwrap_or("Image"))
        ),
        caption,
    )
}

fn embed_frame(src: &str) -> String {
    format!(
        "<div class=\"video-container\"><iframe src=\"{}\" frameborder=\"0\" allowfullscreen loading=\"lazy\"></iframe></div>",
        src
    )
}

fn render_video(source: &VideoSource, caption: Option<&str>) -> String {
    let inner = match source {
        VideoSource::YouTube { id } => {
            embed_frame(&format!("https://www.youtube.com/embed/{}", escape_html(id)))
        }
        VideoSource::Vimeo { id } => {
            embed_frame(&format!("https://player.vimeo.com/video/{}", escape_html(id)))
        }
        VideoSource::File { url, format } => {
            let src = escape_html(url);
            format!(
                "<video controls preload=\"metadata\"><source src=\"{src}\" type=\"{}\"><p>Your browser does not support the video tag. <a href=\"{src}\" target=\"_blank\">Download video</a></p></video>",
                media::video_mime(format)
            )
        }
    };
    media_item(inner, caption)
}

fn render_audio(url: &str, format: &str, title: Option<&str>) -> String {
    let src = escape_html(url);
    media_item(
        format!(
            "<audio controls preload=\"metadata\"><source src=\"{src}\" type=\"{}\"><p>Your browser does not support the audio element. <a href=\"{src}\" target=\"_blank\">Download audio</a></p></audio>",
            media::audio_mime(format)
        ),
        title,
    )
}

fn render_quote(text: &str, author: Option<&str>) -> String {
    let attribution = match author {
        Some(a) if !a.trim().is_empty() => {
            format!("<br><br><strong>— {}</strong>", escape_html(a))
        }
        _ => String::new(),
    };
    format!(
        "<div class=\"quote-block editable-item\">{}{}</div>",
        escape_html(text),
        attribution
    )
}

/// CSS classes of the rendered block element.
pub fn element_classes(attributes: &BlockAttributes) -> Vec<String> {
    let classes: &[&str] = match attributes {
        BlockAttributes::Text { lyrics: true, .. } => &["editable-item", "lyrics"],
        BlockAttributes::Text { .. } | BlockAttributes::Heading { .. } => &["editable-item"],
        BlockAttributes::Image { .. }
        | BlockAttributes::Video { .. }
        | BlockAttributes::Audio { .. } => &["media-item", "editable-item"],
        BlockAttributes::Quote { .. } => &["quote-block", "editable-item"],
    };
    classes.iter().map(|c| c.to_string()).collect()
}

const DRAG_HANDLE: &str = "<div class=\"drag-handle\" title=\"Drag to reorder\"><i class=\"fas fa-grip-vertical\"></i></div>";
const DELETE_BUTTON: &str = "<button class=\"delete-btn\" data-action=\"delete\" title=\"Delete\"><i class=\"fas fa-times\"></i></button>";

/// The block as shown while editing: its markup with the drag handle and the
/// delete button inside the outer element. Never exported.
pub fn editor_markup(block: &Block) -> String {
    let markup = block.markup();
    match markup.rfind("</") {
        Some(pos) => format!(
            "{}{}{}{}",
            &markup[..pos],
            DRAG_HANDLE,
            DELETE_BUTTON,
            &markup[pos..]
        ),
        None => format!("{}{}{}", markup, DRAG_HANDLE, DELETE_BUTTON),
    }
}

/// Block for an uploaded media file. The file name becomes alt text and caption.
pub fn block_from_upload(file: &UploadedFile) -> Result<Block> {
    let (top, sub) = file.mime.split_once('/').unwrap_or((file.mime.as_str(), ""));
    let attributes = match top {
        "image" => BlockAttributes::Image {
            url: file.data_url.clone(),
            alt: Some(file.name.clone()),
            caption: Some(file.name.clone()),
        },
        "video" => BlockAttributes::Video {
            source: VideoSource::File {
                url: file.data_url.clone(),
                format: sub.to_string(),
            },
            caption: Some(file.name.clone()),
        },
        "audio" => BlockAttributes::Audio {
            url: file.data_url.clone(),
            format: sub.to_string(),
            title: Some(file.name.clone()),
        },
        _ => {
            return Err(EditorError::UnsupportedFileType {
                name: file.name.clone(),
                mime: file.mime.clone(),
            })
        }
    };
    Block::new(attributes)
}

/// The image form's upload path accepts images only.
pub fn image_from_upload(file: &UploadedFile) -> Result<Block> {
    if !file.mime.starts_with("image/") {
        return Err(EditorError::UnsupportedFileType {
            name: file.name.clone(),
            mime: file.mime.clone(),
        });
    }
    block_from_upload(file)
}
