//! Maintenance requests

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::entity::{capitalize, tables, Entity, ParseEnumError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    pub fn label(&self) -> String {
        capitalize(self.as_str())
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(ParseEnumError::new("priority", other)),
        }
    }
}

/// Workflow status of a maintenance request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    New,
    InProgress,
    Completed,
}

impl MaintenanceStatus {
    pub const ALL: [MaintenanceStatus; 3] = [
        MaintenanceStatus::New,
        MaintenanceStatus::InProgress,
        MaintenanceStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MaintenanceStatus::New => "new",
            MaintenanceStatus::InProgress => "in_progress",
            MaintenanceStatus::Completed => "completed",
        }
    }

    /// "In progress" style label
    pub fn label(&self) -> String {
        capitalize(&self.as_str().replace('_', " "))
    }
}

impl std::fmt::Display for MaintenanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaintenanceStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(MaintenanceStatus::New),
            "in_progress" => Ok(MaintenanceStatus::InProgress),
            "completed" => Ok(MaintenanceStatus::Completed),
            other => Err(ParseEnumError::new("maintenance status", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceRequest {
    pub id: String,
    pub title: String,
    pub description: String,
    pub property_id: String,
    pub priority: Priority,
    pub status: MaintenanceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for MaintenanceRequest {
    const TABLE: &'static str = tables::MAINTENANCE_REQUESTS;
    const NOUN: &'static str = "maintenance request";
    const PLURAL: &'static str = "maintenance requests";

    type New = NewMaintenanceRequest;
    type Patch = MaintenanceRequestPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMaintenanceRequest {
    pub title: String,
    pub description: String,
    pub property_id: String,
    pub priority: Priority,
    pub status: MaintenanceStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceRequestPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MaintenanceStatus>,
}

impl MaintenanceRequestPatch {
    /// Patch that touches nothing but the status column
    pub fn status_only(status: MaintenanceStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// Embedded `properties(name)` relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyName {
    pub name: String,
}

/// A maintenance request row joined with its property's name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceRequestWithProperty {
    #[serde(flatten)]
    pub request: MaintenanceRequest,
    /// `None` when the referenced property no longer exists
    #[serde(default)]
    pub properties: Option<PropertyName>,
}

impl MaintenanceRequestWithProperty {
    pub fn property_name(&self) -> Option<&str> {
        self.properties.as_ref().map(|p| p.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn row(properties: serde_json::Value) -> serde_json::Value {
        json!({
            "id": "m-1",
            "title": "Leaking Faucet",
            "description": "Kitchen sink drips",
            "property_id": "p-1",
            "priority": "high",
            "status": "in_progress",
            "created_at": "2024-05-02T09:30:00Z",
            "updated_at": "2024-05-03T10:00:00Z",
            "properties": properties
        })
    }

    #[test]
    fn test_joined_row_exposes_property_name() {
        let joined: MaintenanceRequestWithProperty =
            serde_json::from_value(row(json!({ "name": "Sunset Villa" }))).unwrap();
        assert_eq!(joined.property_name(), Some("Sunset Villa"));
        assert_eq!(joined.request.status, MaintenanceStatus::InProgress);
    }

    #[test]
    fn test_joined_row_with_missing_property() {
        let joined: MaintenanceRequestWithProperty =
            serde_json::from_value(row(serde_json::Value::Null)).unwrap();
        assert_eq!(joined.property_name(), None);
    }

    #[test]
    fn test_status_only_patch_serializes_single_field() {
        let patch = MaintenanceRequestPatch::status_only(MaintenanceStatus::Completed);
        assert_eq!(
            serde_json::to_value(patch).unwrap(),
            json!({ "status": "completed" })
        );
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(MaintenanceStatus::InProgress.label(), "In progress");
        assert_eq!(Priority::Low.label(), "Low");
    }

    #[test]
    fn test_enum_parsing_is_closed() {
        for status in MaintenanceStatus::ALL {
            assert_eq!(status.as_str().parse::<MaintenanceStatus>(), Ok(status));
        }
        for priority in Priority::ALL {
            assert_eq!(priority.as_str().parse::<Priority>(), Ok(priority));
        }
        assert!("urgent".parse::<Priority>().is_err());
        assert!("in progress".parse::<MaintenanceStatus>().is_err());
    }
}
