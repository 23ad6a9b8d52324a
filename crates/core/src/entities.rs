//! Typed views of the admin entities.
//!
//! The entities are owned by the remote API; these structs only mirror the
//! JSON it returns (camelCase) so the CRUD client can hand back typed rows.
//! Unknown fields are ignored and most fields are optional, since list and
//! detail endpoints do not always return the same shape.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::assets::AssetRef;
use crate::types::{EntityId, Timestamp};

/// A REST resource managed through the admin panel.
pub trait EntityKind: DeserializeOwned + Send + Sync + 'static {
    /// Path segment under the API root, e.g. `donation-projects`.
    const PATH: &'static str;

    /// Human-readable name used in logs and errors.
    const NAME: &'static str;

    /// Field flipped by the toggle-status endpoint.
    const STATUS_FIELD: &'static str = "isActive";

    /// Key under which list responses may wrap their rows.
    const LIST_KEY: &'static str = Self::PATH;

    fn id(&self) -> &EntityId;
}

/// Path of a single entity, e.g. `donation-projects/12`.
pub fn entity_path<E: EntityKind>(id: &EntityId) -> String {
    format!("{}/{id}", E::PATH)
}

fn asset(url: &Option<String>, alt: &Option<String>) -> Option<AssetRef> {
    url.as_deref()
        .filter(|u| !u.is_empty())
        .map(|u| AssetRef::new(u, alt.clone()))
}

// ---------------------------------------------------------------------------
// Donation projects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationProject {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub goal_amount: Option<f64>,
    #[serde(default)]
    pub current_amount: Option<f64>,
    #[serde(default)]
    pub bank_account: Option<String>,
    #[serde(default)]
    pub qr_image_url: Option<String>,
    #[serde(default)]
    pub qr_image_alt: Option<String>,
    #[serde(default)]
    pub reference_image_url: Option<String>,
    #[serde(default)]
    pub reference_image_alt: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

impl DonationProject {
    pub fn qr_image(&self) -> Option<AssetRef> {
        asset(&self.qr_image_url, &self.qr_image_alt)
    }

    pub fn reference_image(&self) -> Option<AssetRef> {
        asset(&self.reference_image_url, &self.reference_image_alt)
    }
}

impl EntityKind for DonationProject {
    const PATH: &'static str = "donation-projects";
    const NAME: &'static str = "DonationProject";
    const LIST_KEY: &'static str = "projects";

    fn id(&self) -> &EntityId {
        &self.id
    }
}

// ---------------------------------------------------------------------------
// Convocatorias
// ---------------------------------------------------------------------------

/// An entry of a convocatoria's document list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Convocatoria {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Draft, active or closed.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub start_date: Option<Timestamp>,
    #[serde(default)]
    pub end_date: Option<Timestamp>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_alt: Option<String>,
    #[serde(default)]
    pub documents: Vec<DocumentRef>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

impl Convocatoria {
    pub fn image(&self) -> Option<AssetRef> {
        asset(&self.image_url, &self.image_alt)
    }

    /// Document list entries as asset references, in stored order.
    pub fn document_assets(&self) -> Vec<AssetRef> {
        self.documents
            .iter()
            .map(|d| AssetRef::new(d.url.clone(), d.name.clone()))
            .collect()
    }
}

impl EntityKind for Convocatoria {
    const PATH: &'static str = "convocatorias";
    const NAME: &'static str = "Convocatoria";
    const STATUS_FIELD: &'static str = "status";

    fn id(&self) -> &EntityId {
        &self.id
    }
}

// ---------------------------------------------------------------------------
// Programas
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Programa {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_alt: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

impl Programa {
    pub fn image(&self) -> Option<AssetRef> {
        asset(&self.image_url, &self.image_alt)
    }
}

impl EntityKind for Programa {
    const PATH: &'static str = "programas";
    const NAME: &'static str = "Programa";

    fn id(&self) -> &EntityId {
        &self.id
    }
}

// ---------------------------------------------------------------------------
// Methodologies (iniciativas)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Methodology {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_alt: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

impl Methodology {
    pub fn image(&self) -> Option<AssetRef> {
        asset(&self.image_url, &self.image_alt)
    }
}

impl EntityKind for Methodology {
    const PATH: &'static str = "methodologies";
    const NAME: &'static str = "Methodology";

    fn id(&self) -> &EntityId {
        &self.id
    }
}

// ---------------------------------------------------------------------------
// Multimedia resources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

impl Resource {
    pub fn file(&self) -> Option<AssetRef> {
        asset(&self.file_url, &self.file_name)
    }

    pub fn thumbnail(&self) -> Option<AssetRef> {
        asset(&self.thumbnail_url, &None)
    }
}

impl EntityKind for Resource {
    const PATH: &'static str = "resources";
    const NAME: &'static str = "Resource";

    fn id(&self) -> &EntityId {
        &self.id
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: EntityId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

impl EntityKind for User {
    const PATH: &'static str = "users";
    const NAME: &'static str = "User";

    fn id(&self) -> &EntityId {
        &self.id
    }
}
