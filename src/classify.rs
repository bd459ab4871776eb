//! File categorisation from name and MIME type.
//!
//! Categories drive the local folder layout: every archived file lands under
//! exactly one category folder. Classification is a pure total function — any
//! `(name, mime)` pair maps to a category, with [`Category::Other`] as the
//! catch-all. The MIME hint wins over the extension because extensions can be
//! absent or ambiguous (Google-native documents have no meaningful extension
//! at all).

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// Closed set of archive categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Photos,
    Videos,
    Audio,
    Documents,
    Archives,
    Installers,
    Other,
}

impl Category {
    /// Folder name used under the archive root.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Photos => "Photos",
            Category::Videos => "Videos",
            Category::Audio => "Audio",
            Category::Documents => "Documents",
            Category::Archives => "Archives",
            Category::Installers => "Installers",
            Category::Other => "Other",
        }
    }

    /// Categories that nest files under `YYYY/YYYY-MM` subfolders.
    pub fn is_date_bucketed(self) -> bool {
        matches!(
            self,
            Category::Photos | Category::Videos | Category::Documents
        )
    }

    /// Every category, in folder-layout order.
    pub fn all() -> &'static [Category] {
        &[
            Category::Photos,
            Category::Videos,
            Category::Audio,
            Category::Documents,
            Category::Archives,
            Category::Installers,
            Category::Other,
        ]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category definitions by file extension (lowercase, no leading dot).
const CATEGORY_EXTENSIONS: &[(Category, &[&str])] = &[
    (
        Category::Photos,
        &[
            "jpg", "jpeg", "png", "heic", "webp", "gif", "bmp", "tiff", "tif", "raw", "cr2", "nef",
        ],
    ),
    (
        Category::Videos,
        &["mp4", "mkv", "mov", "avi", "webm", "wmv", "flv", "m4v", "3gp"],
    ),
    (
        Category::Audio,
        &["mp3", "wav", "flac", "m4a", "aac", "ogg", "wma", "aiff"],
    ),
    (
        Category::Documents,
        &[
            "pdf", "docx", "doc", "xlsx", "xls", "pptx", "ppt", "txt", "rtf", "odt", "ods", "odp",
        ],
    ),
    (
        Category::Archives,
        &["zip", "rar", "7z", "tar", "gz", "bz2", "xz", "tgz"],
    ),
    (
        Category::Installers,
        &["exe", "msi", "dmg", "pkg", "deb", "rpm", "appimage"],
    ),
];

/// MIME type to category, for cases where the extension is ambiguous or absent.
const CATEGORY_MIME_TYPES: &[(Category, &[&str])] = &[
    (
        Category::Photos,
        &[
            "image/jpeg",
            "image/png",
            "image/gif",
            "image/webp",
            "image/heic",
            "image/heif",
            "image/bmp",
            "image/tiff",
        ],
    ),
    (
        Category::Videos,
        &[
            "video/mp4",
            "video/x-matroska",
            "video/quicktime",
            "video/x-msvideo",
            "video/webm",
            "video/x-ms-wmv",
            "video/x-flv",
        ],
    ),
    (
        Category::Audio,
        &[
            "audio/mpeg",
            "audio/mp3",
            "audio/wav",
            "audio/x-wav",
            "audio/flac",
            "audio/x-flac",
            "audio/mp4",
            "audio/aac",
            "audio/ogg",
        ],
    ),
    (
        Category::Documents,
        &[
            "application/pdf",
            "application/msword",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "application/vnd.ms-excel",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "application/vnd.ms-powerpoint",
            "application/vnd.openxmlformats-officedocument.presentationml.presentation",
            "text/plain",
            // Google-native documents export to Office formats.
            "application/vnd.google-apps.document",
            "application/vnd.google-apps.spreadsheet",
            "application/vnd.google-apps.presentation",
        ],
    ),
    (
        Category::Archives,
        &[
            "application/zip",
            "application/x-rar-compressed",
            "application/x-7z-compressed",
            "application/x-tar",
            "application/gzip",
        ],
    ),
    (
        Category::Installers,
        &["application/x-msdownload", "application/x-msi"],
    ),
];

static EXTENSION_TO_CATEGORY: LazyLock<HashMap<&'static str, Category>> = LazyLock::new(|| {
    CATEGORY_EXTENSIONS
        .iter()
        .flat_map(|(category, extensions)| extensions.iter().map(|ext| (*ext, *category)))
        .collect()
});

static MIME_TO_CATEGORY: LazyLock<HashMap<&'static str, Category>> = LazyLock::new(|| {
    CATEGORY_MIME_TYPES
        .iter()
        .flat_map(|(category, mimes)| mimes.iter().map(|mime| (*mime, *category)))
        .collect()
});

/// Classify a file into a [`Category`] from its name and optional MIME hint.
///
/// The MIME table is consulted first; unknown MIME types fall back to the
/// lowercase extension (text after the last `.`). Anything that matches
/// neither table is [`Category::Other`].
pub fn classify(name: &str, mime_type: Option<&str>) -> Category {
    if let Some(mime) = mime_type {
        if let Some(category) = MIME_TO_CATEGORY.get(mime) {
            return *category;
        }
    }

    if let Some(ext) = extension_of(name) {
        if let Some(category) = EXTENSION_TO_CATEGORY.get(ext.as_str()) {
            return *category;
        }
    }

    Category::Other
}

/// Lowercase extension of `name`, without the leading dot. `None` when the
/// name has no extension (dotfiles like `.bashrc` count as extensionless).
fn extension_of(name: &str) -> Option<String> {
    std::path::Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}
