use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Image,
    Document,
    Video,
    Audio,
    Archive,
    Code,
    Data,
    #[default]
    Other,
}

impl FileCategory {
    /// Folder label used by `{category}`.
    pub fn folder_label(self) -> &'static str {
        match self {
            FileCategory::Image => "Images",
            FileCategory::Document => "Documents",
            FileCategory::Video => "Videos",
            FileCategory::Audio => "Audio",
            FileCategory::Archive => "Archives",
            FileCategory::Code => "Code",
            FileCategory::Data => "Data",
            FileCategory::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MetadataCapability {
    #[default]
    None,
    Basic,
    Extended,
    Full,
}

/// A scanned file as handed over by the scanner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub path: PathBuf,
    /// Base name without extension.
    pub name: String,
    /// Extension without the leading dot.
    pub extension: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    #[serde(default)]
    pub category: FileCategory,
    #[serde(default)]
    pub metadata_capability: MetadataCapability,
}

impl FileDescriptor {
    /// Builds a descriptor from a path, splitting name and extension the way
    /// the scanner does.
    pub fn from_path(path: impl Into<PathBuf>, size: u64, modified_at: DateTime<Utc>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|v| v.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|v| v.to_string_lossy().to_string())
            .unwrap_or_default();
        let category = FileCategory::from_extension(&extension);
        Self {
            path,
            name,
            extension,
            size,
            created_at: modified_at,
            modified_at,
            category,
            metadata_capability: MetadataCapability::None,
        }
    }

    pub fn full_name(&self) -> String {
        if self.extension.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.name, self.extension)
        }
    }

    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}

impl FileCategory {
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "heic" | "heif" | "webp" | "tif" | "tiff" | "bmp"
            | "raw" | "dng" | "raf" | "cr2" | "nef" | "arw" => FileCategory::Image,
            "pdf" | "doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx" | "odt" | "txt" | "md"
            | "rtf" => FileCategory::Document,
            "mp4" | "mov" | "mkv" | "avi" | "webm" | "m4v" => FileCategory::Video,
            "mp3" | "wav" | "flac" | "aac" | "ogg" | "m4a" => FileCategory::Audio,
            "zip" | "tar" | "gz" | "7z" | "rar" | "xz" => FileCategory::Archive,
            "rs" | "py" | "js" | "ts" | "go" | "c" | "cpp" | "h" | "java" => FileCategory::Code,
            "json" | "csv" | "xml" | "yaml" | "yml" | "toml" | "sqlite" => FileCategory::Data,
            _ => FileCategory::Other,
        }
    }
}
