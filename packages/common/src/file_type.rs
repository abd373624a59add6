#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse classification of an attached file, derived from its extension.
///
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "image"))]
    Image,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "video"))]
    Video,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "document"))]
    Document,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "audio"))]
    Audio,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "other"))]
    Other,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp", "svg", "ico"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "wmv", "flv", "mkv", "webm"];
const DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt", "csv", "md", "hwp",
];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "flac", "aac", "m4a"];

impl FileType {
    /// All classifications.
    pub const ALL: &'static [FileType] = &[
        Self::Image,
        Self::Video,
        Self::Document,
        Self::Audio,
        Self::Other,
    ];

    /// Classify a lowercase extension (without the dot).
    ///
    /// Unknown or empty extensions map to [`FileType::Other`].
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_ascii_lowercase();
        let ext = ext.as_str();
        if IMAGE_EXTENSIONS.contains(&ext) {
            Self::Image
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            Self::Video
        } else if DOCUMENT_EXTENSIONS.contains(&ext) {
            Self::Document
        } else if AUDIO_EXTENSIONS.contains(&ext) {
            Self::Audio
        } else {
            Self::Other
        }
    }

    /// Classify a filename by the text after its last `.`.
    pub fn from_filename(filename: &str) -> Self {
        Self::from_extension(&extension_of(filename))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Document => "document",
            Self::Audio => "audio",
            Self::Other => "other",
        }
    }
}

/// Lowercased text after the last `.` of the final path segment.
///
/// Returns an empty string when there is no extension.
pub fn extension_of(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    match base.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => String::new(),
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for FileType {
    fn default() -> Self {
        Self::Other
    }
}

/// Error when parsing an invalid file type string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFileTypeError {
    invalid: String,
}

impl fmt::Display for ParseFileTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid file type '{}'. Valid values: {}",
            self.invalid,
            FileType::ALL
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseFileTypeError {}

impl FromStr for FileType {
    type Err = ParseFileTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            "document" => Ok(Self::Document),
            "audio" => Ok(Self::Audio),
            "other" => Ok(Self::Other),
            _ => Err(ParseFileTypeError {
                invalid: s.to_string(),
            }),
        }
    }
}
