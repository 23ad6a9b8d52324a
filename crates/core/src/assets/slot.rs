//! State machine for one replaceable asset inside a form.
//!
//! A slot is bound to the asset currently persisted on the entity (if any)
//! and tracks at most one pending change: either a newly staged local file
//! or a request to delete the persisted asset. Nothing here performs remote
//! I/O; the submission coordinator turns pending changes into uploads and
//! deletes when the entity is saved.

use super::policy::UploadPolicy;
use super::preview::{self, PreviewHandle};
use super::validator::{self, Rejection};
use super::{AssetRef, CandidateFile};
use crate::error::CoreError;

/// Why [`StagedAssetSlot::select_file`] left the slot unchanged.
#[derive(Debug, thiserror::Error)]
pub enum SlotError {
    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error("Could not build a preview: {0}")]
    Preview(#[from] CoreError),
}

/// A staged local file together with its preview and, once the upload has
/// succeeded, the remote reference it produced.
#[derive(Debug, Clone)]
struct StagedFile {
    file: CandidateFile,
    preview: Option<PreviewHandle>,
    uploaded: Option<AssetRef>,
}

#[derive(Debug, Clone, Default)]
enum Pending {
    #[default]
    None,
    Staged(StagedFile),
    Delete,
}

/// What [`StagedAssetSlot::remove`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// A staged file was discarded locally.
    DiscardedStaged,
    /// The persisted asset is now marked for deletion on save.
    MarkedForDeletion,
    /// Nothing to remove.
    Nothing,
}

/// What the slot should currently display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveAsset<'a> {
    Empty,
    Persisted(&'a AssetRef),
    Staged {
        file: &'a CandidateFile,
        preview: Option<&'a PreviewHandle>,
    },
}

/// The pending remote work for a slot, as seen by the submission coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotChange<'a> {
    /// No pending change; the persisted reference passes through.
    Unchanged(Option<&'a AssetRef>),
    /// A staged file must be uploaded (unless `cached` already holds the
    /// result of an earlier attempt) and replaces `previous`.
    Replace {
        file: &'a CandidateFile,
        cached: Option<&'a AssetRef>,
        previous: Option<&'a AssetRef>,
    },
    /// The persisted asset is to be removed.
    Delete { previous: &'a AssetRef },
}

/// The reference a slot contributes to the entity payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(Option<AssetRef>),
    /// A staged file has not been uploaded yet.
    NeedsUpload,
}

#[derive(Debug, Clone, Default)]
pub struct StagedAssetSlot {
    persisted: Option<AssetRef>,
    pending: Pending,
}

impl StagedAssetSlot {
    /// An empty slot (new entity, or entity without this asset).
    pub fn new() -> Self {
        Self::default()
    }

    /// A clean slot bound to an already persisted asset.
    pub fn with_persisted(persisted: Option<AssetRef>) -> Self {
        Self {
            persisted,
            pending: Pending::None,
        }
    }

    /// Validate and stage `file`.
    ///
    /// On any error the slot is left exactly as it was. On success the file
    /// replaces whatever was staged before and any deletion mark is cleared.
    pub async fn select_file(
        &mut self,
        file: CandidateFile,
        policy: &UploadPolicy,
    ) -> Result<(), SlotError> {
        validator::validate(&file, policy)?;
        let preview = preview::preview(&file).await?;

        tracing::debug!(
            file = %file.name,
            size_bytes = file.size_bytes,
            has_preview = preview.is_some(),
            "Staged file"
        );
        self.pending = Pending::Staged(StagedFile {
            file,
            preview,
            uploaded: None,
        });
        Ok(())
    }

    /// Undo a staged file, or mark the persisted asset for deletion.
    pub fn remove(&mut self) -> RemoveOutcome {
        let outcome = match (&self.pending, &self.persisted) {
            (Pending::Staged(_), _) => RemoveOutcome::DiscardedStaged,
            (Pending::None, Some(_)) => RemoveOutcome::MarkedForDeletion,
            (Pending::Delete, _) | (Pending::None, None) => RemoveOutcome::Nothing,
        };

        match outcome {
            RemoveOutcome::DiscardedStaged => self.pending = Pending::None,
            RemoveOutcome::MarkedForDeletion => self.pending = Pending::Delete,
            RemoveOutcome::Nothing => {}
        }
        outcome
    }

    /// Clear a deletion mark. Returns `false` if the slot was not marked.
    pub fn cancel_deletion(&mut self) -> bool {
        if matches!(self.pending, Pending::Delete) {
            self.pending = Pending::None;
            true
        } else {
            false
        }
    }

    /// Rebind the slot to `persisted`, dropping any pending change.
    pub fn reset(&mut self, persisted: Option<AssetRef>) {
        self.persisted = persisted;
        self.pending = Pending::None;
    }

    /// Record the remote reference produced by uploading the staged file.
    ///
    /// Returns `false` (and records nothing) if no file is staged.
    pub fn record_upload(&mut self, asset: AssetRef) -> bool {
        match &mut self.pending {
            Pending::Staged(staged) => {
                staged.uploaded = Some(asset);
                true
            }
            _ => false,
        }
    }

    // ---- accessors ----

    pub fn persisted(&self) -> Option<&AssetRef> {
        self.persisted.as_ref()
    }

    pub fn persisted_url(&self) -> Option<&str> {
        self.persisted.as_ref().map(|a| a.url.as_str())
    }

    pub fn persisted_alt(&self) -> Option<&str> {
        self.persisted.as_ref().and_then(|a| a.alt.as_deref())
    }

    pub fn staged_file(&self) -> Option<&CandidateFile> {
        match &self.pending {
            Pending::Staged(staged) => Some(&staged.file),
            _ => None,
        }
    }

    pub fn preview(&self) -> Option<&PreviewHandle> {
        match &self.pending {
            Pending::Staged(staged) => staged.preview.as_ref(),
            _ => None,
        }
    }

    /// Reference recorded by a successful upload of the current staged file.
    pub fn cached_upload(&self) -> Option<&AssetRef> {
        match &self.pending {
            Pending::Staged(staged) => staged.uploaded.as_ref(),
            _ => None,
        }
    }

    pub fn is_marked_for_deletion(&self) -> bool {
        matches!(self.pending, Pending::Delete)
    }

    /// `true` when saving would change this slot's reference.
    pub fn is_dirty(&self) -> bool {
        !matches!(self.pending, Pending::None)
    }

    pub fn effective(&self) -> EffectiveAsset<'_> {
        match (&self.pending, &self.persisted) {
            (Pending::Staged(staged), _) => EffectiveAsset::Staged {
                file: &staged.file,
                preview: staged.preview.as_ref(),
            },
            (Pending::None, Some(asset)) => EffectiveAsset::Persisted(asset),
            (Pending::Delete, _) | (Pending::None, None) => EffectiveAsset::Empty,
        }
    }

    pub fn change(&self) -> SlotChange<'_> {
        match (&self.pending, &self.persisted) {
            (Pending::Staged(staged), previous) => SlotChange::Replace {
                file: &staged.file,
                cached: staged.uploaded.as_ref(),
                previous: previous.as_ref(),
            },
            (Pending::Delete, Some(previous)) => SlotChange::Delete { previous },
            (Pending::None, persisted) => SlotChange::Unchanged(persisted.as_ref()),
            // `remove` only marks slots that have a persisted asset and
            // `reset` clears the mark, so this is unreachable in practice.
            (Pending::Delete, None) => SlotChange::Unchanged(None),
        }
    }

    pub fn resolution(&self) -> Resolution {
        match &self.pending {
            Pending::None => Resolution::Resolved(self.persisted.clone()),
            Pending::Delete => Resolution::Resolved(None),
            Pending::Staged(staged) => match &staged.uploaded {
                Some(asset) => Resolution::Resolved(Some(asset.clone())),
                None => Resolution::NeedsUpload,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
