//! Form submission: turn staged asset changes into durable references, then
//! write the entity once.
//!
//! The run is strictly sequential:
//!
//! 1. Upload every staged file, in slot declaration order. The first failure
//!    aborts the run; later uploads are not attempted and the entity is not
//!    written. Successful uploads are cached on their slot so a retry does
//!    not send them again.
//! 2. Delete superseded remote assets (slots marked for deletion, and
//!    persisted assets replaced by a new upload). Failures follow the slot's
//!    [`DeletePolicy`].
//! 3. Assemble plain fields and resolved references into one payload.
//! 4. Create or update the entity.
//! 5. On success, rebind every slot to its resolved reference.

use estrella_core::assets::{AssetRef, DeletePolicy, SlotChange};
use estrella_core::notice::Notice;

use crate::entity::EntityWriter;
use crate::error::ClientError;
use crate::session::{FormSession, SlotBinding};
use crate::storage::{DeleteService, UploadService};

/// Generic message when the server gives no reason for a failed upload.
const UPLOAD_FALLBACK_MESSAGE: &str = "No se pudo subir el archivo";

/// Phase of a submission in which an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitPhase {
    Guard,
    Upload,
    Delete,
    EntityWrite,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("A submission of this form is already in progress")]
    AlreadySubmitting,

    #[error("Upload failed for slot '{slot}': {source}")]
    Upload {
        slot: String,
        #[source]
        source: ClientError,
    },

    #[error("Could not delete '{url}' for slot '{slot}': {source}")]
    Delete {
        slot: String,
        url: String,
        #[source]
        source: ClientError,
    },

    #[error("Saving the entity failed: {0}")]
    EntityWrite(#[source] ClientError),
}

impl SubmitError {
    pub fn phase(&self) -> SubmitPhase {
        match self {
            Self::AlreadySubmitting => SubmitPhase::Guard,
            Self::Upload { .. } => SubmitPhase::Upload,
            Self::Delete { .. } => SubmitPhase::Delete,
            Self::EntityWrite(_) => SubmitPhase::EntityWrite,
        }
    }

    /// Human-readable notice, distinct per phase.
    pub fn notice(&self) -> Notice {
        match self {
            Self::AlreadySubmitting => Notice::warning("Ya se están guardando los cambios"),
            Self::Upload { source, .. } => Notice::error(
                source
                    .server_message()
                    .unwrap_or_else(|| UPLOAD_FALLBACK_MESSAGE.to_string()),
            ),
            Self::Delete { source, .. } if source.is_timeout() => {
                Notice::error("Tiempo de espera agotado al eliminar el archivo")
            }
            Self::Delete { .. } => Notice::error("No se pudo eliminar el archivo anterior"),
            Self::EntityWrite(source) => Notice::error(match source.server_message() {
                Some(message) => format!("Error al guardar: {message}"),
                None => "Error al guardar los cambios".to_string(),
            }),
        }
    }
}

/// What happened to one slot during a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotOutcome {
    /// A staged file was uploaded in this run.
    Uploaded { slot: String, asset: AssetRef },
    /// A staged file had already been uploaded by an earlier attempt.
    ReusedUpload { slot: String, asset: AssetRef },
    /// A superseded remote asset was removed from storage.
    Deleted { slot: String, url: String },
    /// A best-effort delete failed; the blob may remain in storage.
    DeleteSkipped {
        slot: String,
        url: String,
        reason: String,
    },
    /// The slot's reference was set to `null`.
    Cleared { slot: String },
    /// The slot had no pending change.
    Kept { slot: String },
}

impl SlotOutcome {
    pub fn notice(&self) -> Option<Notice> {
        match self {
            Self::Uploaded { .. } => Some(Notice::success("Archivo subido")),
            Self::Deleted { .. } => Some(Notice::success("Archivo anterior eliminado")),
            Self::DeleteSkipped { .. } => Some(Notice::warning(
                "No se pudo eliminar el archivo anterior del almacenamiento",
            )),
            Self::ReusedUpload { .. } | Self::Cleared { .. } | Self::Kept { .. } => None,
        }
    }
}

/// Result of a successful submission.
#[derive(Debug)]
pub struct Submitted<T> {
    /// The entity as returned by the create/update call.
    pub entity: T,
    /// `true` if the entity was created rather than updated.
    pub created: bool,
    /// Per-slot outcomes in the order they happened.
    pub outcomes: Vec<SlotOutcome>,
}

impl<T> Submitted<T> {
    /// Per-phase notices followed by the final save notice.
    pub fn notices(&self) -> Vec<Notice> {
        let mut notices: Vec<Notice> = self.outcomes.iter().filter_map(SlotOutcome::notice).collect();
        notices.push(if self.created {
            Notice::success("Registro creado correctamente")
        } else {
            Notice::success("Cambios guardados correctamente")
        });
        notices
    }
}

/// Runs form submissions against the storage services.
pub struct SubmissionCoordinator<U, D> {
    uploads: U,
    deletes: D,
}

impl<U: UploadService, D: DeleteService> SubmissionCoordinator<U, D> {
    pub fn new(uploads: U, deletes: D) -> Self {
        Self { uploads, deletes }
    }

    /// Submit `session` through `writer`.
    ///
    /// Returns [`SubmitError::AlreadySubmitting`] without side effects if
    /// another submission of the same session is in flight. On error the
    /// session keeps its pending changes (plus any cached uploads) so the
    /// user can retry.
    pub async fn submit<W: EntityWriter>(
        &self,
        session: &mut FormSession,
        writer: &W,
    ) -> Result<Submitted<W::Output>, SubmitError> {
        let _guard = session
            .submitting_flag()
            .acquire()
            .ok_or(SubmitError::AlreadySubmitting)?;

        let mut outcomes = Vec::new();

        self.upload_staged(session, &mut outcomes).await?;
        self.delete_superseded(session, &mut outcomes).await?;

        let resolved = resolve_all(session, &mut outcomes);
        let payload = assemble_payload(session, &resolved);

        let created = session.target().is_none();
        let written = match session.target() {
            None => writer.create(&payload).await,
            Some(id) => writer.update(id, &payload).await,
        };
        let entity = written.map_err(|e| {
            tracing::error!(error = %e, entity_id = ?session.target(), "Entity write failed");
            SubmitError::EntityWrite(e)
        })?;

        for (entry, asset) in session.slots.iter_mut().zip(resolved) {
            entry.slot.reset(asset);
        }
        session.deleted_urls.clear();

        tracing::info!(created, slots = session.slots.len(), "Form submitted");
        Ok(Submitted {
            entity,
            created,
            outcomes,
        })
    }

    /// Step 1: upload staged files one at a time, stopping at the first failure.
    async fn upload_staged(
        &self,
        session: &mut FormSession,
        outcomes: &mut Vec<SlotOutcome>,
    ) -> Result<(), SubmitError> {
        for entry in session.slots.iter_mut() {
            let file = match entry.slot.change() {
                SlotChange::Replace {
                    cached: Some(asset),
                    ..
                } => {
                    outcomes.push(SlotOutcome::ReusedUpload {
                        slot: entry.spec.key.clone(),
                        asset: asset.clone(),
                    });
                    continue;
                }
                SlotChange::Replace { file, cached: None, .. } => file.clone(),
                SlotChange::Unchanged(_) | SlotChange::Delete { .. } => continue,
            };

            match self.uploads.upload(&entry.spec.endpoint, &file).await {
                Ok(uploaded) => {
                    let asset = uploaded.into_asset_ref(&file);
                    entry.slot.record_upload(asset.clone());
                    outcomes.push(SlotOutcome::Uploaded {
                        slot: entry.spec.key.clone(),
                        asset,
                    });
                }
                Err(source) => {
                    tracing::error!(
                        slot = %entry.spec.key,
                        endpoint = %entry.spec.endpoint,
                        error = %source,
                        "Upload failed, aborting submission"
                    );
                    return Err(SubmitError::Upload {
                        slot: entry.spec.key.clone(),
                        source,
                    });
                }
            }
        }
        Ok(())
    }

    /// Step 2: remove remote assets that the entity will stop referencing.
    async fn delete_superseded(
        &self,
        session: &mut FormSession,
        outcomes: &mut Vec<SlotOutcome>,
    ) -> Result<(), SubmitError> {
        for entry in session.slots.iter() {
            let url = match entry.slot.change() {
                SlotChange::Delete { previous } => previous.url.clone(),
                SlotChange::Replace {
                    previous: Some(previous),
                    cached: Some(new),
                    ..
                } if previous.url != new.url => previous.url.clone(),
                _ => continue,
            };
            if session.deleted_urls.contains(&url) {
                continue;
            }

            match self.deletes.delete(&url).await {
                Ok(()) => {
                    session.deleted_urls.push(url.clone());
                    outcomes.push(SlotOutcome::Deleted {
                        slot: entry.spec.key.clone(),
                        url,
                    });
                }
                Err(source) => match entry.spec.delete_policy {
                    DeletePolicy::BestEffort => {
                        tracing::warn!(
                            slot = %entry.spec.key,
                            %url,
                            error = %source,
                            "Could not delete superseded asset, continuing"
                        );
                        outcomes.push(SlotOutcome::DeleteSkipped {
                            slot: entry.spec.key.clone(),
                            url,
                            reason: source.to_string(),
                        });
                    }
                    DeletePolicy::Required => {
                        tracing::error!(
                            slot = %entry.spec.key,
                            %url,
                            error = %source,
                            "Could not delete superseded asset, aborting submission"
                        );
                        return Err(SubmitError::Delete {
                            slot: entry.spec.key.clone(),
                            url,
                            source,
                        });
                    }
                },
            }
        }
        Ok(())
    }
}

/// Step 3: the reference each slot contributes, in declaration order.
///
/// A persisted reference whose blob an earlier attempt of this session
/// already deleted resolves to `null`.
fn resolve_all(session: &FormSession, outcomes: &mut Vec<SlotOutcome>) -> Vec<Option<AssetRef>> {
    session
        .slots
        .iter()
        .map(|entry| match entry.slot.change() {
            SlotChange::Unchanged(Some(persisted))
                if session.deleted_urls.contains(&persisted.url) =>
            {
                outcomes.push(SlotOutcome::Cleared {
                    slot: entry.spec.key.clone(),
                });
                None
            }
            SlotChange::Unchanged(persisted) => {
                outcomes.push(SlotOutcome::Kept {
                    slot: entry.spec.key.clone(),
                });
                persisted.cloned()
            }
            SlotChange::Replace { cached, .. } => cached.cloned(),
            SlotChange::Delete { .. } => {
                outcomes.push(SlotOutcome::Cleared {
                    slot: entry.spec.key.clone(),
                });
                None
            }
        })
        .collect()
}

/// Plain fields overlaid with every slot's resolved reference.
///
/// A list field bound to slots is rebuilt from those slots alone; a plain
/// field of the same name is overwritten.
fn assemble_payload(session: &FormSession, resolved: &[Option<AssetRef>]) -> serde_json::Value {
    let mut payload = session.fields().clone();

    for entry in &session.slots {
        if let SlotBinding::ListEntry { list_field } = &entry.spec.binding {
            payload.insert(list_field.clone(), serde_json::Value::Array(Vec::new()));
        }
    }

    for (entry, asset) in session.slots.iter().zip(resolved) {
        match &entry.spec.binding {
            SlotBinding::Field {
                url_field,
                alt_field,
            } => {
                payload.insert(
                    url_field.clone(),
                    asset.as_ref().map(|a| a.url.clone()).into(),
                );
                if let Some(alt_field) = alt_field {
                    payload.insert(
                        alt_field.clone(),
                        asset.as_ref().and_then(|a| a.alt.clone()).into(),
                    );
                }
            }
            SlotBinding::ListEntry { list_field } => {
                if let (Some(asset), Some(serde_json::Value::Array(items))) =
                    (asset, payload.get_mut(list_field))
                {
                    items.push(serde_json::json!({
                        "url": asset.url,
                        "name": asset.alt,
                    }));
                }
            }
        }
    }

    serde_json::Value::Object(payload)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
