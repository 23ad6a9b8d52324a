//! Staged asset workflow building blocks.
//!
//! A form holds one [`slot::StagedAssetSlot`] per replaceable asset. Files
//! picked by the user are checked by [`validator::validate`], previewed
//! locally by [`preview::preview`] and only reach object storage when the
//! surrounding entity is saved.

pub mod policy;
pub mod preview;
pub mod slot;
pub mod validator;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub use policy::{AssetClass, DeletePolicy, UploadPolicy};
pub use preview::PreviewHandle;
pub use slot::{EffectiveAsset, RemoveOutcome, Resolution, SlotChange, SlotError, StagedAssetSlot};
pub use validator::{validate, Rejection};

/// A committed remote asset reference as stored on an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

impl AssetRef {
    pub fn new(url: impl Into<String>, alt: Option<String>) -> Self {
        Self {
            url: url.into(),
            alt,
        }
    }
}

/// Where the bytes of a [`CandidateFile`] live until it is uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    Memory(Vec<u8>),
    Disk(PathBuf),
}

/// A file picked by the user that has not been uploaded yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub name: String,
    pub size_bytes: u64,
    /// Declared MIME type, as reported by the picker.
    pub mime_type: String,
    pub source: FileSource,
}

impl CandidateFile {
    /// Build a candidate from bytes already held in memory.
    pub fn from_bytes(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size_bytes: bytes.len() as u64,
            mime_type: mime_type.into(),
            source: FileSource::Memory(bytes),
        }
    }

    /// Build a candidate backed by a local file. Only the metadata is read.
    pub async fn from_path(
        path: impl Into<PathBuf>,
        mime_type: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let path = path.into();
        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|source| CoreError::FileRead {
                path: path.display().to_string(),
                source,
            })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "archivo".to_string());

        Ok(Self {
            name,
            size_bytes: meta.len(),
            mime_type: mime_type.into(),
            source: FileSource::Disk(path),
        })
    }

    /// Normalized MIME type (lowercase, parameters stripped).
    pub fn normalized_mime(&self) -> String {
        normalize_mime(&self.mime_type)
    }

    pub fn is_image(&self) -> bool {
        self.normalized_mime().starts_with("image/")
    }

    /// Load the full file contents.
    pub async fn read_bytes(&self) -> Result<Vec<u8>, CoreError> {
        match &self.source {
            FileSource::Memory(bytes) => Ok(bytes.clone()),
            FileSource::Disk(path) => {
                tokio::fs::read(path)
                    .await
                    .map_err(|source| CoreError::FileRead {
                        path: path.display().to_string(),
                        source,
                    })
            }
        }
    }
}

/// Lowercase a MIME type and drop any `;`-separated parameters.
pub fn normalize_mime(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
