//! Upload policies per asset class.
//!
//! The allowed MIME types are fixed per class. Size limits are resolved at
//! the boundary by [`crate::config::UploadConfig`] and passed in.

use std::collections::BTreeSet;

use super::normalize_mime;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Default size limit for images when no environment override is set.
pub const DEFAULT_IMAGE_MAX_MB: u64 = 20;

/// Default size limit for documents and media.
pub const DEFAULT_DOCUMENT_MAX_MB: u64 = 100;

pub const IMAGE_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

pub const DOCUMENT_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
];

pub const ARCHIVE_MIME_TYPES: &[&str] = &[
    "application/zip",
    "application/x-zip-compressed",
    "application/vnd.rar",
    "application/x-rar-compressed",
    "application/x-7z-compressed",
];

pub const AUDIO_VIDEO_MIME_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/wav",
    "audio/x-wav",
    "video/mp4",
    "video/webm",
];

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// What happens when removing a superseded remote asset fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Log a warning and carry on with the submission.
    BestEffort,
    /// Abort the submission before the entity write.
    Required,
}

/// Broad category of an asset slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetClass {
    /// QR codes, reference images, thumbnails, cover images.
    Image,
    /// Office documents and PDFs (convocatoria bases, reports).
    Document,
    /// Documents plus archives, audio and video (resource library).
    Media,
}

impl AssetClass {
    /// MIME types accepted for this class.
    pub fn allowed_mime_types(self) -> Vec<&'static str> {
        match self {
            Self::Image => IMAGE_MIME_TYPES.to_vec(),
            Self::Document => DOCUMENT_MIME_TYPES.to_vec(),
            Self::Media => DOCUMENT_MIME_TYPES
                .iter()
                .chain(ARCHIVE_MIME_TYPES)
                .chain(AUDIO_VIDEO_MIME_TYPES)
                .copied()
                .collect(),
        }
    }

    pub fn default_max_mb(self) -> u64 {
        match self {
            Self::Image => DEFAULT_IMAGE_MAX_MB,
            Self::Document | Self::Media => DEFAULT_DOCUMENT_MAX_MB,
        }
    }

    /// Default policy for removing superseded assets of this class.
    pub fn delete_policy(self) -> DeletePolicy {
        match self {
            Self::Image => DeletePolicy::BestEffort,
            Self::Document | Self::Media => DeletePolicy::Required,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Document => "document",
            Self::Media => "media",
        }
    }
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Type and size policy a candidate file must satisfy before staging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    allowed_mime_types: BTreeSet<String>,
    max_bytes: u64,
}

impl UploadPolicy {
    pub fn new<I, S>(allowed_mime_types: I, max_bytes: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed_mime_types: allowed_mime_types
                .into_iter()
                .map(|m| normalize_mime(m.as_ref()))
                .filter(|m| !m.is_empty())
                .collect(),
            max_bytes,
        }
    }

    /// Policy for `class` with an explicit byte limit.
    pub fn for_class(class: AssetClass, max_bytes: u64) -> Self {
        Self::new(class.allowed_mime_types(), max_bytes)
    }

    pub fn allows(&self, mime_type: &str) -> bool {
        self.allowed_mime_types.contains(&normalize_mime(mime_type))
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn allowed_mime_types(&self) -> impl Iterator<Item = &str> {
        self.allowed_mime_types.iter().map(String::as_str)
    }

    /// Value for an HTML `accept` attribute.
    pub fn accept_attribute(&self) -> String {
        self.allowed_mime_types
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
