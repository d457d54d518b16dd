//! Typed query interface: list/create/update/delete for each entity
//!
//! A thin request/response layer over [`RemoteStore`]; nothing is cached and
//! nothing is retried.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use crate::error::StoreError;
use crate::store::{RemoteStore, Select, PROPERTY_NAME_EMBED};
use propdash_types::{tables, Entity, MaintenanceRequestWithProperty};

#[derive(Clone)]
pub struct Queries {
    store: Arc<dyn RemoteStore>,
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, StoreError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(StoreError::from))
        .collect()
}

impl Queries {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    /// All records of `E`, newest first
    #[tracing::instrument(skip(self), fields(table = E::TABLE))]
    pub async fn list<E: Entity>(&self) -> Result<Vec<E>, StoreError> {
        let rows = self.store.select(&Select::newest_first(E::TABLE)).await?;
        decode_rows(rows)
    }

    #[tracing::instrument(skip(self, new), fields(table = E::TABLE))]
    pub async fn create<E: Entity>(&self, new: &E::New) -> Result<E, StoreError> {
        let row = self
            .store
            .insert(E::TABLE, serde_json::to_value(new)?)
            .await?;
        let created: E = serde_json::from_value(row)?;
        tracing::info!(id = created.id(), "created {}", E::NOUN);
        Ok(created)
    }

    #[tracing::instrument(skip(self, patch), fields(table = E::TABLE))]
    pub async fn update<E: Entity>(&self, id: &str, patch: &E::Patch) -> Result<E, StoreError> {
        let row = self
            .store
            .update(E::TABLE, id, serde_json::to_value(patch)?)
            .await?;
        Ok(serde_json::from_value(row)?)
    }

    #[tracing::instrument(skip(self), fields(table = E::TABLE))]
    pub async fn delete<E: Entity>(&self, id: &str) -> Result<(), StoreError> {
        self.store.delete(E::TABLE, id).await
    }

    /// Maintenance requests with their property's name joined in
    #[tracing::instrument(skip(self))]
    pub async fn list_maintenance_requests(
        &self,
    ) -> Result<Vec<MaintenanceRequestWithProperty>, StoreError> {
        let query =
            Select::newest_first(tables::MAINTENANCE_REQUESTS).with_embed(PROPERTY_NAME_EMBED);
        let rows = self.store.select(&query).await?;
        decode_rows(rows)
    }
}
