use crate::error::{EditorError, Result};
use crate::render;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Text,
    Heading,
    Image,
    Video,
    Audio,
    Quote,
}

impl BlockKind {
    pub fn all() -> &'static [BlockKind] {
        &[
            BlockKind::Text,
            BlockKind::Heading,
            BlockKind::Image,
            BlockKind::Video,
            BlockKind::Audio,
            BlockKind::Quote,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Text => "text",
            BlockKind::Heading => "heading",
            BlockKind::Image => "image",
            BlockKind::Video => "video",
            BlockKind::Audio => "audio",
            BlockKind::Quote => "quote",
        }
    }

    /// Label used by the content list view. Media kinds share one label.
    pub fn label(&self) -> &'static str {
        match self {
            BlockKind::Text => "Text",
            BlockKind::Heading => "Heading",
            BlockKind::Image | BlockKind::Video | BlockKind::Audio => "Media",
            BlockKind::Quote => "Quote",
        }
    }

    pub fn is_media(&self) -> bool {
        matches!(self, BlockKind::Image | BlockKind::Video | BlockKind::Audio)
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockKind {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self> {
        BlockKind::all()
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| EditorError::Validation(format!("Unknown block type: {}", s)))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
            TextAlign::Justify => "justify",
        }
    }
}

impl FromStr for TextAlign {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(TextAlign::Left),
            "center" => Ok(TextAlign::Center),
            "right" => Ok(TextAlign::Right),
            "justify" => Ok(TextAlign::Justify),
            other => Err(EditorError::Validation(format!(
                "Unknown text alignment: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextStyle {
    #[default]
    #[serde(rename = "default")]
    Standard,
    Flat,
    Elevated,
    Bordered,
}

impl TextStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextStyle::Standard => "default",
            TextStyle::Flat => "flat",
            TextStyle::Elevated => "elevated",
            TextStyle::Bordered => "bordered",
        }
    }
}

impl FromStr for TextStyle {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(TextStyle::Standard),
            "flat" => Ok(TextStyle::Flat),
            "elevated" => Ok(TextStyle::Elevated),
            "bordered" => Ok(TextStyle::Bordered),
            other => Err(EditorError::Validation(format!(
                "Unknown text style: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum HeadingLevel {
    #[default]
    H2,
    H3,
    H4,
}

impl HeadingLevel {
    pub fn number(&self) -> u8 {
        match self {
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
            HeadingLevel::H4 => 4,
        }
    }
}

impl From<HeadingLevel> for u8 {
    fn from(level: HeadingLevel) -> Self {
        level.number()
    }
}

impl TryFrom<u8> for HeadingLevel {
    type Error = EditorError;

    fn try_from(n: u8) -> Result<Self> {
        match n {
            2 => Ok(HeadingLevel::H2),
            3 => Ok(HeadingLevel::H3),
            4 => Ok(HeadingLevel::H4),
            other => Err(EditorError::Validation(format!(
                "Heading level must be 2, 3 or 4 (got {})",
                other
            ))),
        }
    }
}

impl FromStr for HeadingLevel {
    type Err = EditorError;

    /// Accepts both the tag form (`h3`) and the bare number (`3`).
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('h')
            .or_else(|| trimmed.strip_prefix('H'))
            .unwrap_or(trimmed);
        let n: u8 = digits
            .parse()
            .map_err(|_| EditorError::Validation(format!("Invalid heading level: {}", s)))?;
        HeadingLevel::try_from(n)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum VideoSource {
    YouTube { id: String },
    Vimeo { id: String },
    File { url: String, format: String },
}

/// Kind-specific block data. The variant fixes the block kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BlockAttributes {
    Text {
        content: String,
        #[serde(default)]
        align: TextAlign,
        #[serde(default)]
        style: TextStyle,
        #[serde(default)]
        lyrics: bool,
    },
    Heading {
        text: String,
        #[serde(default)]
        level: HeadingLevel,
    },
    Image {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alt: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
    Video {
        source: VideoSource,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
    Audio {
        url: String,
        format: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    Quote {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        author: Option<String>,
    },
}

impl BlockAttributes {
    pub fn kind(&self) -> BlockKind {
        match self {
            BlockAttributes::Text { .. } => BlockKind::Text,
            BlockAttributes::Heading { .. } => BlockKind::Heading,
            BlockAttributes::Image { .. } => BlockKind::Image,
            BlockAttributes::Video { .. } => BlockKind::Video,
            BlockAttributes::Audio { .. } => BlockKind::Audio,
            BlockAttributes::Quote { .. } => BlockKind::Quote,
        }
    }

    /// The visible text of the block, without markup.
    pub fn plain_text(&self) -> String {
        match self {
            BlockAttributes::Text { content, .. } => content.clone(),
            BlockAttributes::Heading { text, .. } => text.clone(),
            BlockAttributes::Image { caption, .. } | BlockAttributes::Video { caption, .. } => {
                caption.clone().unwrap_or_default()
            }
            BlockAttributes::Audio { title, .. } => title.clone().unwrap_or_default(),
            BlockAttributes::Quote { text, author } => match author {
                Some(author) => format!("{} — {}", text, author),
                None => text.clone(),
            },
        }
    }
}

/// A single content unit. `markup` is derived from `attributes` and is
/// regenerated on every change, including deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BlockRecord", into = "BlockRecord")]
pub struct Block {
    id: Uuid,
    attributes: BlockAttributes,
    markup: String,
}

#[derive(Serialize, Deserialize)]
struct BlockRecord {
    id: Uuid,
    attributes: BlockAttributes,
}

impl TryFrom<BlockRecord> for Block {
    type Error = EditorError;

    fn try_from(record: BlockRecord) -> Result<Self> {
        let mut block = Block::new(record.attributes)?;
        block.id = record.id;
        Ok(block)
    }
}

impl From<Block> for BlockRecord {
    fn from(block: Block) -> Self {
        BlockRecord {
            id: block.id,
            attributes: block.attributes,
        }
    }
}

const PREVIEW_CHARS: usize = 50;

impl Block {
    pub fn new(attributes: BlockAttributes) -> Result<Self> {
        render::validate_attributes(&attributes)?;
        let markup = render::render_markup(&attributes);
        Ok(Self {
            id: Uuid::new_v4(),
            attributes,
            markup,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> BlockKind {
        self.attributes.kind()
    }

    pub fn attributes(&self) -> &BlockAttributes {
        &self.attributes
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// Deep copy with a fresh identity.
    pub fn duplicate(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            attributes: self.attributes.clone(),
            markup: self.markup.clone(),
        }
    }

    pub fn set_attributes(&mut self, attributes: BlockAttributes) -> Result<()> {
        if attributes.kind() != self.kind() {
            return Err(EditorError::Validation(format!(
                "Cannot change a {} block into a {} block",
                self.kind(),
                attributes.kind()
            )));
        }
        render::validate_attributes(&attributes)?;
        self.markup = render::render_markup(&attributes);
        self.attributes = attributes;
        Ok(())
    }

    /// Short title for list views.
    pub fn preview_title(&self) -> String {
        let text = self.attributes.plain_text();
        if text.trim().is_empty() {
            return if self.kind().is_media() {
                "Media Item".to_string()
            } else {
                "Content Item".to_string()
            };
        }
        let mut chars = text.chars();
        let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
        if chars.next().is_some() {
            format!("{}...", head)
        } else {
            head
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub author: String,
    pub tags: Vec<String>,
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn tags_line(&self) -> String {
        self.tags.join(", ")
    }

    pub fn set_tags_line(&mut self, line: &str) {
        self.tags = parse_tags(line);
    }

    /// Precondition shared by save and the structured exports.
    pub fn ensure_complete(&self, placeholder_title: &str, purpose: &str) -> Result<()> {
        let title = self.title.trim();
        if title.is_empty() || title == placeholder_title {
            return Err(EditorError::IncompleteDocument(format!(
                "Please set a title before {}",
                purpose
            )));
        }
        if self.blocks.is_empty() {
            return Err(EditorError::IncompleteDocument(format!(
                "Please add some content before {}",
                purpose
            )));
        }
        Ok(())
    }
}

pub fn parse_tags(line: &str) -> Vec<String> {
    line.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl FontSize {
    pub fn next(self) -> Self {
        match self {
            FontSize::Small => FontSize::Medium,
            FontSize::Medium => FontSize::Large,
            FontSize::Large => FontSize::Small,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FontSize::Small => "small",
            FontSize::Medium => "medium",
            FontSize::Large => "large",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditMode {
    Edit,
    #[default]
    View,
}
