//! URL inspection for media blocks: YouTube/Vimeo id extraction, direct file
//! extensions, and the basic injection guard applied to every URL field.

use crate::error::{EditorError, Result};
use crate::model::VideoSource;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "ogg", "avi", "mov"];
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "m4a", "aac", "flac", "wma"];

static YOUTUBE_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^.*(youtu\.be/|v/|u/\w/|embed/|watch\?v=|&v=)([^#&?]*).*")
        .expect("youtube id pattern is valid")
});

static VIMEO_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"vimeo\.com/(?:video/)?([0-9]+)").expect("vimeo id pattern is valid")
});

static YOUTUBE_ID_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("youtube id charset is valid"));

const YOUTUBE_HOSTS: &[&str] = &["youtube.com", "www.youtube.com", "m.youtube.com", "youtu.be"];

/// Rejects URLs that could break out of an HTML attribute.
pub fn ensure_safe_url(url: &str) -> Result<()> {
    if url.contains(['<', '>', '"', '\'']) {
        return Err(EditorError::Validation(
            "URL contains characters that are not allowed (< > \" ')".to_string(),
        ));
    }
    Ok(())
}

pub fn parse_absolute_url(url: &str, what: &str) -> Result<Url> {
    Url::parse(url.trim())
        .map_err(|_| EditorError::Validation(format!("Invalid {} URL format", what)))
}

/// `data:` URL whose media type starts with `prefix` (e.g. `image/`).
pub fn is_data_url_of(url: &str, prefix: &str) -> bool {
    url.strip_prefix("data:")
        .map(|rest| rest.starts_with(prefix))
        .unwrap_or(false)
}

pub fn is_youtube_url(url: &str) -> bool {
    let host_matches = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        .map(|host| YOUTUBE_HOSTS.contains(&host.as_str()))
        .unwrap_or(false);
    host_matches && extract_youtube_id(url).is_some()
}

/// Extracts the 11 character video id from any of the common YouTube URL
/// shapes (`watch?v=`, `youtu.be/`, `embed/`, `v/`).
pub fn extract_youtube_id(url: &str) -> Option<String> {
    let caps = YOUTUBE_ID.captures(url)?;
    let id = caps.get(2)?.as_str();
    if YOUTUBE_ID_CHARS.is_match(id) {
        Some(id.to_string())
    } else {
        None
    }
}

pub fn is_valid_youtube_id(id: &str) -> bool {
    YOUTUBE_ID_CHARS.is_match(id)
}

pub fn extract_vimeo_id(url: &str) -> Option<String> {
    let host = Url::parse(url).ok()?.host_str()?.to_ascii_lowercase();
    if host != "vimeo.com" && !host.ends_with(".vimeo.com") {
        return None;
    }
    VIMEO_ID
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn path_extension(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let last = parsed.path_segments()?.next_back()?;
    let (_, ext) = last.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

pub fn direct_video_format(url: &str) -> Option<String> {
    path_extension(url).filter(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
}

pub fn direct_audio_format(url: &str) -> Option<String> {
    path_extension(url).filter(|ext| AUDIO_EXTENSIONS.contains(&ext.as_str()))
}

/// Classifies a video URL, or fails when it is none of the accepted shapes.
pub fn video_source(url: &str) -> Result<VideoSource> {
    if is_youtube_url(url) {
        if let Some(id) = extract_youtube_id(url) {
            return Ok(VideoSource::YouTube { id });
        }
    }
    if let Some(id) = extract_vimeo_id(url) {
        return Ok(VideoSource::Vimeo { id });
    }
    if let Some(format) = direct_video_format(url) {
        return Ok(VideoSource::File {
            url: url.to_string(),
            format,
        });
    }
    Err(EditorError::UnsupportedFormat(
        "Please use YouTube, Vimeo, or direct video file URLs (.mp4, .webm, .ogg, .avi, .mov)"
            .to_string(),
    ))
}

pub fn video_mime(format: &str) -> String {
    match format {
        "mov" => "video/quicktime".to_string(),
        "avi" => "video/x-msvideo".to_string(),
        other => format!("video/{}", other),
    }
}

pub fn audio_mime(format: &str) -> String {
    match format {
        "mp3" => "audio/mpeg".to_string(),
        "m4a" => "audio/mp4".to_string(),
        "wma" => "audio/x-ms-wma".to_string(),
        other => format!("audio/{}", other),
    }
}

/// Media format tokens end up inside a `type` attribute.
pub fn is_format_token(format: &str) -> bool {
    !format.is_empty()
        && format
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '+'))
}
