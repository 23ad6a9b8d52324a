//! Form sessions: plain field values plus an ordered set of asset slots for
//! one entity being created or edited.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use estrella_core::assets::{
    AssetClass, AssetRef, CandidateFile, DeletePolicy, RemoveOutcome, SlotError, StagedAssetSlot,
    UploadPolicy,
};
use estrella_core::config::UploadConfig;
use estrella_core::types::EntityId;

/// How a slot's resolved reference is written into the entity payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotBinding {
    /// Scalar fields, e.g. `qrImageUrl` / `qrImageAlt`. A cleared slot
    /// writes `null` to both.
    Field {
        url_field: String,
        alt_field: Option<String>,
    },
    /// One entry of an array field of `{ url, name }` objects. Cleared
    /// entries are left out of the array.
    ListEntry { list_field: String },
}

/// Per-slot configuration: where to upload, what to accept, how to bind.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotSpec {
    pub key: String,
    pub endpoint: String,
    pub class: AssetClass,
    pub policy: UploadPolicy,
    pub binding: SlotBinding,
    pub delete_policy: DeletePolicy,
}

impl SlotSpec {
    /// A slot bound to `<key>Url` / `<key>Alt`, using the class defaults
    /// resolved from `config`.
    pub fn new(
        key: impl Into<String>,
        endpoint: impl Into<String>,
        class: AssetClass,
        config: &UploadConfig,
    ) -> Self {
        let key = key.into();
        Self {
            binding: SlotBinding::Field {
                url_field: format!("{key}Url"),
                alt_field: Some(format!("{key}Alt")),
            },
            key,
            endpoint: endpoint.into(),
            class,
            policy: config.policy(class),
            delete_policy: class.delete_policy(),
        }
    }

    pub fn image(key: impl Into<String>, endpoint: impl Into<String>, config: &UploadConfig) -> Self {
        Self::new(key, endpoint, AssetClass::Image, config)
    }

    pub fn document(
        key: impl Into<String>,
        endpoint: impl Into<String>,
        config: &UploadConfig,
    ) -> Self {
        Self::new(key, endpoint, AssetClass::Document, config)
    }

    /// Bind to explicit payload fields.
    pub fn bind_to(mut self, url_field: impl Into<String>, alt_field: Option<&str>) -> Self {
        self.binding = SlotBinding::Field {
            url_field: url_field.into(),
            alt_field: alt_field.map(str::to_string),
        };
        self
    }

    /// Make this slot an entry of the array field `list_field`.
    pub fn in_list(mut self, list_field: impl Into<String>) -> Self {
        self.binding = SlotBinding::ListEntry {
            list_field: list_field.into(),
        };
        self
    }

    pub fn with_delete_policy(mut self, policy: DeletePolicy) -> Self {
        self.delete_policy = policy;
        self
    }

    pub fn with_policy(mut self, policy: UploadPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Unknown asset slot '{0}'")]
    UnknownSlot(String),

    #[error("Asset slot '{0}' is already declared")]
    DuplicateSlot(String),

    #[error(transparent)]
    Slot(#[from] SlotError),
}

#[derive(Debug, Clone)]
pub(crate) struct SessionSlot {
    pub(crate) spec: SlotSpec,
    pub(crate) slot: StagedAssetSlot,
}

/// Set while a submission of the session is in flight.
#[derive(Debug, Clone, Default)]
pub struct SubmittingFlag(Arc<AtomicBool>);

impl SubmittingFlag {
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Returns a guard if the flag was clear, `None` if already set.
    pub(crate) fn acquire(&self) -> Option<SubmitGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SubmitGuard(Arc::clone(&self.0)))
    }
}

/// Clears the submitting flag when dropped.
#[derive(Debug)]
pub(crate) struct SubmitGuard(Arc<AtomicBool>);

impl Drop for SubmitGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// State of one open form.
#[derive(Debug)]
pub struct FormSession {
    target: Option<EntityId>,
    fields: serde_json::Map<String, serde_json::Value>,
    pub(crate) slots: Vec<SessionSlot>,
    /// Superseded remote assets already removed by an earlier attempt.
    pub(crate) deleted_urls: Vec<String>,
    submitting: SubmittingFlag,
}

impl FormSession {
    /// Session for a new entity.
    pub fn create() -> Self {
        Self {
            target: None,
            fields: serde_json::Map::new(),
            slots: Vec::new(),
            deleted_urls: Vec::new(),
            submitting: SubmittingFlag::default(),
        }
    }

    /// Session editing the existing entity `id`.
    pub fn edit(id: impl Into<EntityId>) -> Self {
        Self {
            target: Some(id.into()),
            ..Self::create()
        }
    }

    /// `None` for a new entity.
    pub fn target(&self) -> Option<&EntityId> {
        self.target.as_ref()
    }

    // ---- plain fields ----

    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields.get(name)
    }

    pub fn remove_field(&mut self, name: &str) -> Option<serde_json::Value> {
        self.fields.remove(name)
    }

    pub fn fields(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.fields
    }

    // ---- slots ----

    /// Declare a slot. Declaration order is the upload order.
    pub fn add_slot(
        &mut self,
        spec: SlotSpec,
        persisted: Option<AssetRef>,
    ) -> Result<(), SessionError> {
        if self.slots.iter().any(|s| s.spec.key == spec.key) {
            return Err(SessionError::DuplicateSlot(spec.key));
        }
        self.slots.push(SessionSlot {
            spec,
            slot: StagedAssetSlot::with_persisted(persisted),
        });
        Ok(())
    }

    /// Builder form of [`add_slot`](Self::add_slot).
    pub fn with_slot(
        mut self,
        spec: SlotSpec,
        persisted: Option<AssetRef>,
    ) -> Result<Self, SessionError> {
        self.add_slot(spec, persisted)?;
        Ok(self)
    }

    pub fn slot(&self, key: &str) -> Option<&StagedAssetSlot> {
        self.slots.iter().find(|s| s.spec.key == key).map(|s| &s.slot)
    }

    pub fn spec(&self, key: &str) -> Option<&SlotSpec> {
        self.slots.iter().find(|s| s.spec.key == key).map(|s| &s.spec)
    }

    /// Slots in declaration order.
    pub fn slots(&self) -> impl Iterator<Item = (&SlotSpec, &StagedAssetSlot)> {
        self.slots.iter().map(|s| (&s.spec, &s.slot))
    }

    fn entry_mut(&mut self, key: &str) -> Result<&mut SessionSlot, SessionError> {
        self.slots
            .iter_mut()
            .find(|s| s.spec.key == key)
            .ok_or_else(|| SessionError::UnknownSlot(key.to_string()))
    }

    /// Validate and stage `file` in slot `key` using the slot's policy.
    pub async fn select_file(&mut self, key: &str, file: CandidateFile) -> Result<(), SessionError> {
        let entry = self.entry_mut(key)?;
        entry.slot.select_file(file, &entry.spec.policy).await?;
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Result<RemoveOutcome, SessionError> {
        Ok(self.entry_mut(key)?.slot.remove())
    }

    pub fn cancel_deletion(&mut self, key: &str) -> Result<bool, SessionError> {
        Ok(self.entry_mut(key)?.slot.cancel_deletion())
    }

    pub fn reset_slot(&mut self, key: &str, persisted: Option<AssetRef>) -> Result<(), SessionError> {
        self.entry_mut(key)?.slot.reset(persisted);
        Ok(())
    }

    /// `true` when any slot has a pending change.
    pub fn has_pending_assets(&self) -> bool {
        self.slots.iter().any(|s| s.slot.is_dirty())
    }

    // ---- submission state ----

    pub fn is_submitting(&self) -> bool {
        self.submitting.is_set()
    }

    /// A handle the UI can poll (e.g. to disable the save button).
    pub fn submitting_flag(&self) -> SubmittingFlag {
        self.submitting.clone()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn config() -> UploadConfig {
        UploadConfig::default()
    }

    #[test]
    fn spec_defaults_follow_key_and_class() {
        let spec = SlotSpec::image("qrImage", "/api/upload/qr-image", &config());
        assert_eq!(
            spec.binding,
            SlotBinding::Field {
                url_field: "qrImageUrl".into(),
                alt_field: Some("qrImageAlt".into())
            }
        );
        assert_eq!(spec.delete_policy, DeletePolicy::BestEffort);
        assert!(spec.policy.allows("image/png"));

        let doc = SlotSpec::document("bases", "/api/upload/convocatoria-document", &config())
            .in_list("documents");
        assert_eq!(doc.delete_policy, DeletePolicy::Required);
        assert_matches!(doc.binding, SlotBinding::ListEntry { ref list_field } if list_field == "documents");
    }

    #[test]
    fn duplicate_slot_keys_are_rejected() {
        let mut session = FormSession::create();
        session.add_slot(SlotSpec::image("cover", "/u", &config()), None).unwrap();
        let result = session.add_slot(SlotSpec::image("cover", "/u", &config()), None);
        assert_matches!(result, Err(SessionError::DuplicateSlot(k)) if k == "cover");
    }

    #[tokio::test]
    async fn unknown_slot_is_an_error() {
        let mut session = FormSession::edit(3);
        let file = CandidateFile::from_bytes("a.png", "image/png", vec![0; 4]);
        assert_matches!(
            session.select_file("missing", file).await,
            Err(SessionError::UnknownSlot(_))
        );
        assert_matches!(session.remove("missing"), Err(SessionError::UnknownSlot(_)));
    }

    #[tokio::test]
    async fn select_file_uses_slot_policy() {
        let mut session = FormSession::create()
            .with_slot(SlotSpec::image("cover", "/u", &config()), None)
            .unwrap();

        let pdf = CandidateFile::from_bytes("a.pdf", "application/pdf", vec![0; 4]);
        assert_matches!(session.select_file("cover", pdf).await, Err(SessionError::Slot(_)));
        assert!(!session.has_pending_assets());

        let png = CandidateFile::from_bytes("a.png", "image/png", vec![0; 4]);
        session.select_file("cover", png).await.unwrap();
        assert!(session.has_pending_assets());
    }

    #[test]
    fn remove_and_cancel_through_session() {
        let mut session = FormSession::edit(1)
            .with_slot(
                SlotSpec::image("cover", "/u", &config()),
                Some(AssetRef::new("https://bucket/c.png", None)),
            )
            .unwrap();

        assert_eq!(session.remove("cover").unwrap(), RemoveOutcome::MarkedForDeletion);
        assert!(session.slot("cover").unwrap().is_marked_for_deletion());
        assert!(session.cancel_deletion("cover").unwrap());
        assert!(!session.has_pending_assets());
    }

    #[test]
    fn fields_round_trip() {
        let mut session = FormSession::create();
        session.set_field("title", "Agua segura");
        session.set_field("goalAmount", 1500.5);
        assert_eq!(session.field("title"), Some(&serde_json::json!("Agua segura")));
        assert_eq!(session.remove_field("goalAmount"), Some(serde_json::json!(1500.5)));
        assert_eq!(session.fields().len(), 1);
    }

    #[test]
    fn submitting_flag_guards_once() {
        let session = FormSession::create();
        let flag = session.submitting_flag();

        let guard = flag.acquire().expect("first acquire succeeds");
        assert!(session.is_submitting());
        assert!(flag.acquire().is_none());

        drop(guard);
        assert!(!session.is_submitting());
        assert!(flag.acquire().is_some());
    }
}
