//! Typed CRUD client for the admin REST resources.
//!
//! Thin request/response wrappers: no retries, no caching. Callers re-fetch
//! lists after mutations.

use std::marker::PhantomData;

use async_trait::async_trait;
use serde::Serialize;

use estrella_core::entities::{entity_path, EntityKind};
use estrella_core::query::{decode_list_page, ListPage, ListQuery};
use estrella_core::types::EntityId;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::transport::{check_status, decode_entity, join_url, parse_response};

/// Final write of a form submission: create a new entity or update an
/// existing one from an assembled JSON payload.
#[async_trait]
pub trait EntityWriter: Send + Sync {
    type Output: Send;

    async fn create(&self, payload: &serde_json::Value) -> Result<Self::Output, ClientError>;

    async fn update(
        &self,
        id: &EntityId,
        payload: &serde_json::Value,
    ) -> Result<Self::Output, ClientError>;
}

/// HTTP client for one REST resource, e.g. `/api/donation-projects`.
pub struct EntityClient<E> {
    client: reqwest::Client,
    /// Root of the REST API, e.g. `http://host:3000/api`.
    api_root: String,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for EntityClient<E> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            api_root: self.api_root.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: EntityKind> EntityClient<E> {
    /// * `api_root` - REST root, e.g. `http://host:3000/api`.
    pub fn new(client: reqwest::Client, api_root: impl Into<String>) -> Self {
        Self {
            client,
            api_root: api_root.into(),
            _entity: PhantomData,
        }
    }

    /// Client rooted at `<api_url>/api`.
    pub fn from_config(client: reqwest::Client, config: &ClientConfig) -> Self {
        Self::new(client, join_url(&config.api_url, "api"))
    }

    fn collection_url(&self) -> String {
        join_url(&self.api_root, E::PATH)
    }

    fn item_url(&self, id: &EntityId) -> String {
        join_url(&self.api_root, &entity_path::<E>(id))
    }

    /// `GET /<path>?page=&limit=&search=...`
    pub async fn list(&self, query: &ListQuery) -> Result<ListPage<E>, ClientError> {
        let response = self
            .client
            .get(self.collection_url())
            .query(&query.to_pairs())
            .send()
            .await?;
        let body: serde_json::Value = parse_response(response).await?;

        decode_list_page(body, E::LIST_KEY).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// `GET /<path>/{id}`
    pub async fn get(&self, id: &EntityId) -> Result<E, ClientError> {
        let response = self.client.get(self.item_url(id)).send().await?;
        let body: serde_json::Value = parse_response(response).await?;
        decode_entity(body)
    }

    /// `POST /<path>`
    pub async fn create<P>(&self, payload: &P) -> Result<E, ClientError>
    where
        P: Serialize + Sync + ?Sized,
    {
        let response = self
            .client
            .post(self.collection_url())
            .json(payload)
            .send()
            .await?;
        let body: serde_json::Value = parse_response(response).await?;
        let created: E = decode_entity(body)?;

        tracing::info!(entity = E::NAME, id = %created.id(), "Entity created");
        Ok(created)
    }

    /// `PUT /<path>/{id}`
    pub async fn update<P>(&self, id: &EntityId, payload: &P) -> Result<E, ClientError>
    where
        P: Serialize + Sync + ?Sized,
    {
        let response = self
            .client
            .put(self.item_url(id))
            .json(payload)
            .send()
            .await?;
        let body: serde_json::Value = parse_response(response).await?;

        tracing::info!(entity = E::NAME, %id, "Entity updated");
        decode_entity(body)
    }

    /// `DELETE /<path>/{id}`
    pub async fn remove(&self, id: &EntityId) -> Result<(), ClientError> {
        let response = self.client.delete(self.item_url(id)).send().await?;
        check_status(response).await?;

        tracing::info!(entity = E::NAME, %id, "Entity deleted");
        Ok(())
    }

    /// `PATCH /<path>/{id}` with `{ "<status field>": value }`.
    pub async fn toggle_status(
        &self,
        id: &EntityId,
        value: impl Into<serde_json::Value>,
    ) -> Result<E, ClientError> {
        let mut body = serde_json::Map::new();
        body.insert(E::STATUS_FIELD.to_string(), value.into());

        let response = self
            .client
            .patch(self.item_url(id))
            .json(&body)
            .send()
            .await?;
        let body: serde_json::Value = parse_response(response).await?;

        tracing::info!(entity = E::NAME, %id, field = E::STATUS_FIELD, "Entity status changed");
        decode_entity(body)
    }
}

#[async_trait]
impl<E: EntityKind> EntityWriter for EntityClient<E> {
    type Output = E;

    async fn create(&self, payload: &serde_json::Value) -> Result<E, ClientError> {
        EntityClient::create(self, payload).await
    }

    async fn update(&self, id: &EntityId, payload: &serde_json::Value) -> Result<E, ClientError> {
        EntityClient::update(self, id, payload).await
    }
}
