//! Per-screen view state
//!
//! A [`ViewController`] owns the collection one screen displays. It loads
//! that collection from the store, applies only the newest response, and
//! runs create/update/delete against the store followed by a full reload.
//! Every outcome is reported once through a [`Notifier`]; nothing is
//! retried and nothing is applied optimistically.

mod fence;
mod screens;

pub use fence::{Applied, LoadTicket};
pub use screens::{DashboardData, MaintenanceScreen};

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::notify::{Notification, Notifier};
use crate::queries::Queries;
use fence::{Fenced, TicketCounter};
use propdash_types::{
    capitalize, Entity, EntityForm, FormError, MaintenanceForm, MaintenanceRequest, Property,
    PropertyForm, Tenant, TenantForm,
};

/// Data a screen loads in one go
#[async_trait]
pub trait ScreenData: Clone + Default + Send + Sync + 'static {
    /// Used in "Failed to load ..." messages
    const LOAD_SUBJECT: &'static str;

    async fn fetch(queries: &Queries) -> Result<Self, StoreError>;
}

#[async_trait]
impl<E: Entity> ScreenData for Vec<E> {
    const LOAD_SUBJECT: &'static str = E::PLURAL;

    async fn fetch(queries: &Queries) -> Result<Self, StoreError> {
        queries.list::<E>().await
    }
}

/// Screens whose records can be created, edited and deleted through a form
pub trait Mutable: ScreenData {
    type Entity: Entity;
    type Form: EntityForm<Entity = Self::Entity> + Sync;
}

impl Mutable for Vec<Property> {
    type Entity = Property;
    type Form = PropertyForm;
}

impl Mutable for Vec<Tenant> {
    type Entity = Tenant;
    type Form = TenantForm;
}

impl Mutable for MaintenanceScreen {
    type Entity = MaintenanceRequest;
    type Form = MaintenanceForm;
}

/// Result of a user-initiated operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed,
}

impl Outcome {
    /// A failed submit leaves the form open with its input intact
    pub fn keep_form_open(&self) -> bool {
        *self == Outcome::Failed
    }

    pub fn is_success(&self) -> bool {
        *self == Outcome::Succeeded
    }
}

pub type PropertiesController = ViewController<Vec<Property>>;
pub type TenantsController = ViewController<Vec<Tenant>>;
pub type MaintenanceController = ViewController<MaintenanceScreen>;
pub type DashboardController = ViewController<DashboardData>;

pub struct ViewController<D: ScreenData> {
    queries: Queries,
    notifier: Arc<dyn Notifier>,
    tickets: TicketCounter,
    state: RwLock<Fenced<D>>,
}

impl<D: ScreenData> ViewController<D> {
    pub fn new(queries: Queries, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            queries,
            notifier,
            tickets: TicketCounter::default(),
            state: RwLock::new(Fenced::new(D::default())),
        }
    }

    /// Copy of the currently displayed data
    pub async fn snapshot(&self) -> D {
        self.state.read().await.value().clone()
    }

    /// False until the first load lands
    pub async fn is_loaded(&self) -> bool {
        self.state.read().await.is_loaded()
    }

    /// Fetch the screen's data and replace the displayed copy, unless a newer
    /// load already landed or the screen has been torn down.
    #[tracing::instrument(skip(self), fields(subject = D::LOAD_SUBJECT))]
    pub async fn load(&self) -> Outcome {
        let ticket = self.tickets.issue();
        match D::fetch(&self.queries).await {
            Ok(data) => {
                match self.state.write().await.apply(ticket, data) {
                    Applied::Fresh => {}
                    Applied::Stale => tracing::debug!(?ticket, "dropping stale load response"),
                    Applied::Detached => tracing::debug!(?ticket, "screen torn down, dropping load"),
                }
                Outcome::Succeeded
            }
            Err(err) => {
                tracing::warn!(error = %err, "load failed");
                if !self.state.read().await.is_detached() {
                    self.notifier.notify(Notification::error(format!(
                        "Failed to load {}",
                        D::LOAD_SUBJECT
                    )));
                }
                Outcome::Failed
            }
        }
    }

    /// The screen went away; in-flight loads must not touch its state.
    pub async fn teardown(&self) {
        self.state.write().await.detach();
    }

    fn reject(&self, err: FormError, failure: String) -> Outcome {
        tracing::debug!(error = %err, "form rejected");
        self.notifier
            .notify(Notification::error(format!("{}: {}", failure, err)));
        Outcome::Failed
    }

    async fn finish<T>(
        &self,
        result: Result<T, StoreError>,
        success: String,
        failure: String,
    ) -> Outcome {
        match result {
            Ok(_) => {
                self.notifier.notify(Notification::success(success));
                self.load().await;
                Outcome::Succeeded
            }
            Err(err) => {
                tracing::warn!(error = %err, "{}", failure);
                self.notifier.notify(Notification::error(failure));
                Outcome::Failed
            }
        }
    }
}

impl<D: Mutable> ViewController<D> {
    #[tracing::instrument(skip(self, form))]
    pub async fn create(&self, form: &D::Form) -> Outcome {
        let noun = <D::Entity as Entity>::NOUN;
        let failure = format!("Failed to add {}", noun);
        let new = match form.to_new() {
            Ok(new) => new,
            Err(err) => return self.reject(err, failure),
        };
        let result = self.queries.create::<D::Entity>(&new).await;
        self.finish(result, format!("{} added successfully", capitalize(noun)), failure)
            .await
    }

    #[tracing::instrument(skip(self, form))]
    pub async fn update(&self, id: &str, form: &D::Form) -> Outcome {
        let noun = <D::Entity as Entity>::NOUN;
        let failure = format!("Failed to update {}", noun);
        let patch = match form.to_patch() {
            Ok(patch) => patch,
            Err(err) => return self.reject(err, failure),
        };
        let result = self.queries.update::<D::Entity>(id, &patch).await;
        self.finish(result, format!("{} updated successfully", capitalize(noun)), failure)
            .await
    }

    /// Delete a record. Confirmation is the caller's job; this runs
    /// unconditionally.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Outcome {
        let noun = <D::Entity as Entity>::NOUN;
        let result = self.queries.delete::<D::Entity>(id).await;
        self.finish(
            result,
            format!("{} deleted successfully", capitalize(noun)),
            format!("Failed to delete {}", noun),
        )
        .await
    }
}

impl<E: Entity> ViewController<Vec<E>> {
    pub async fn find(&self, id: &str) -> Option<E> {
        self.state
            .read()
            .await
            .value()
            .iter()
            .find(|e| e.id() == id)
            .cloned()
    }
}
