//! Property records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::entity::{capitalize, tables, Entity, ParseEnumError};

/// Occupancy status of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    Occupied,
    Vacant,
    Maintenance,
}

impl PropertyStatus {
    pub const ALL: [PropertyStatus; 3] = [
        PropertyStatus::Occupied,
        PropertyStatus::Vacant,
        PropertyStatus::Maintenance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyStatus::Occupied => "occupied",
            PropertyStatus::Vacant => "vacant",
            PropertyStatus::Maintenance => "maintenance",
        }
    }

    /// Badge text, e.g. "Occupied"
    pub fn label(&self) -> String {
        capitalize(self.as_str())
    }
}

impl std::fmt::Display for PropertyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "occupied" => Ok(PropertyStatus::Occupied),
            "vacant" => Ok(PropertyStatus::Vacant),
            "maintenance" => Ok(PropertyStatus::Maintenance),
            other => Err(ParseEnumError::new("property status", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub id: String,
    pub name: String,
    pub address: String,
    pub status: PropertyStatus,
    /// Monthly rent in whole currency units
    pub rent_amount: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Property {
    pub fn is_occupied(&self) -> bool {
        self.status == PropertyStatus::Occupied
    }
}

impl Entity for Property {
    const TABLE: &'static str = tables::PROPERTIES;
    const NOUN: &'static str = "property";
    const PLURAL: &'static str = "properties";

    type New = NewProperty;
    type Patch = PropertyPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Insert payload for a property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProperty {
    pub name: String,
    pub address: String,
    pub status: PropertyStatus,
    pub rent_amount: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Partial update for a property
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PropertyStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rent_amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_status_roundtrips_through_str() {
        for status in PropertyStatus::ALL {
            assert_eq!(status.as_str().parse::<PropertyStatus>(), Ok(status));
        }
        assert!("Occupied".parse::<PropertyStatus>().is_err());
        assert!("".parse::<PropertyStatus>().is_err());
    }

    #[test]
    fn test_status_label_is_capitalized() {
        assert_eq!(PropertyStatus::Maintenance.label(), "Maintenance");
    }

    #[test]
    fn test_deserializes_store_row() {
        let row = json!({
            "id": "8c1f",
            "name": "Sunset Villa",
            "address": "12 Ocean Dr",
            "status": "vacant",
            "rent_amount": 2500,
            "image_url": null,
            "created_at": "2024-03-01T12:00:00.123456+00:00"
        });
        let property: Property = serde_json::from_value(row).unwrap();
        assert_eq!(property.status, PropertyStatus::Vacant);
        assert_eq!(property.image_url, None);
        assert!(!property.is_occupied());
    }

    #[test]
    fn test_rejects_unknown_status_in_row() {
        let row = json!({
            "id": "8c1f",
            "name": "Sunset Villa",
            "address": "12 Ocean Dr",
            "status": "demolished",
            "rent_amount": 2500,
            "created_at": "2024-03-01T12:00:00Z"
        });
        assert!(serde_json::from_value::<Property>(row).is_err());
    }

    #[test]
    fn test_empty_patch_serializes_to_empty_object() {
        let value = serde_json::to_value(PropertyPatch::default()).unwrap();
        assert_eq!(value, json!({}));
    }
}
