//! Screens that load more than one collection

use async_trait::async_trait;

use super::{Outcome, ScreenData, ViewController};
use crate::dashboard::{self, DashboardStats, MaintenanceRow, PropertyOption};
use crate::error::StoreError;
use crate::queries::Queries;
use propdash_types::{
    MaintenanceRequest, MaintenanceRequestPatch, MaintenanceRequestWithProperty,
    MaintenanceStatus, Property, Tenant,
};

/// Maintenance requests plus the properties they can point at
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaintenanceScreen {
    pub requests: Vec<MaintenanceRequestWithProperty>,
    pub properties: Vec<Property>,
}

impl MaintenanceScreen {
    pub fn rows(&self) -> Vec<MaintenanceRow> {
        dashboard::maintenance_rows(&self.requests, &self.properties)
    }

    pub fn property_options(&self) -> Vec<PropertyOption> {
        dashboard::property_options(&self.properties)
    }
}

#[async_trait]
impl ScreenData for MaintenanceScreen {
    const LOAD_SUBJECT: &'static str = "data";

    async fn fetch(queries: &Queries) -> Result<Self, StoreError> {
        let (requests, properties) = futures::try_join!(
            queries.list_maintenance_requests(),
            queries.list::<Property>()
        )?;
        Ok(Self {
            requests,
            properties,
        })
    }
}

impl ViewController<MaintenanceScreen> {
    /// Move a request to another status without touching its other fields
    #[tracing::instrument(skip(self))]
    pub async fn set_status(&self, id: &str, status: MaintenanceStatus) -> Outcome {
        let result = self
            .queries
            .update::<MaintenanceRequest>(id, &MaintenanceRequestPatch::status_only(status))
            .await;
        self.finish(
            result,
            "Status updated successfully".to_string(),
            "Failed to update status".to_string(),
        )
        .await
    }

    pub async fn rows(&self) -> Vec<MaintenanceRow> {
        self.state.read().await.value().rows()
    }
}

/// Everything the dashboard summarizes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardData {
    pub properties: Vec<Property>,
    pub tenants: Vec<Tenant>,
    pub requests: Vec<MaintenanceRequestWithProperty>,
}

impl DashboardData {
    pub fn stats(&self) -> DashboardStats {
        DashboardStats::compute(
            &self.properties,
            &self.tenants,
            self.requests.iter().map(|r| &r.request),
        )
    }

    /// Most recent requests first, at most `limit` of them
    pub fn recent_requests(&self, limit: usize) -> Vec<MaintenanceRow> {
        let mut rows = dashboard::maintenance_rows(&self.requests, &self.properties);
        rows.truncate(limit);
        rows
    }
}

#[async_trait]
impl ScreenData for DashboardData {
    const LOAD_SUBJECT: &'static str = "dashboard data";

    async fn fetch(queries: &Queries) -> Result<Self, StoreError> {
        let (properties, tenants, requests) = futures::try_join!(
            queries.list::<Property>(),
            queries.list::<Tenant>(),
            queries.list_maintenance_requests()
        )?;
        Ok(Self {
            properties,
            tenants,
            requests,
        })
    }
}

impl ViewController<DashboardData> {
    pub async fn stats(&self) -> DashboardStats {
        self.state.read().await.value().stats()
    }
}
