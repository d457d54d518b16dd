//! Form input and its mapping onto store columns
//!
//! Forms carry raw strings exactly as the UI submits them, under the UI's
//! field names (`rent`, `leaseStart`, `property`). Each form type declares a
//! static [`FieldMapping`] table and converts itself into the entity's typed
//! insert or patch payload, rejecting empty required fields, non-numeric
//! amounts and values outside the closed enumerations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::Entity;
use crate::maintenance::{
    MaintenanceRequest, MaintenanceRequestPatch, MaintenanceStatus, NewMaintenanceRequest,
    Priority,
};
use crate::property::{NewProperty, Property, PropertyPatch, PropertyStatus};
use crate::tenant::{avatar_url_for, NewTenant, PaymentStatus, Tenant, TenantPatch};

/// One UI field and the store column it is written to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    pub form: &'static str,
    pub column: &'static str,
}

const fn field(form: &'static str, column: &'static str) -> FieldMapping {
    FieldMapping { form, column }
}

/// Rejected form input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{field} must be a whole, non-negative number (got {value:?})")]
    InvalidNumber { field: &'static str, value: String },

    #[error("{field} must be a date in YYYY-MM-DD form (got {value:?})")]
    InvalidDate { field: &'static str, value: String },

    #[error("{field} must be one of {allowed} (got {value:?})")]
    InvalidChoice {
        field: &'static str,
        value: String,
        allowed: String,
    },
}

/// A UI form that can be submitted as a create or an update of `Entity`
pub trait EntityForm {
    type Entity: Entity;

    /// Form field → column table for this form
    const FIELD_MAP: &'static [FieldMapping];

    fn to_new(&self) -> Result<<Self::Entity as Entity>::New, FormError>;

    fn to_patch(&self) -> Result<<Self::Entity as Entity>::Patch, FormError>;

    /// Column written for a given form field, if the form maps it
    fn column_for(form_field: &str) -> Option<&'static str> {
        Self::FIELD_MAP
            .iter()
            .find(|m| m.form == form_field)
            .map(|m| m.column)
    }
}

fn required(field: &'static str, value: &str) -> Result<String, FormError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FormError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

fn amount(field: &'static str, value: &str) -> Result<i64, FormError> {
    let trimmed = required(field, value)?;
    trimmed
        .parse::<i64>()
        .ok()
        .filter(|n| *n >= 0)
        .ok_or(FormError::InvalidNumber {
            field,
            value: trimmed,
        })
}

fn date(field: &'static str, value: &str) -> Result<NaiveDate, FormError> {
    let trimmed = required(field, value)?;
    NaiveDate::parse_from_str(&trimmed, "%Y-%m-%d").map_err(|_| FormError::InvalidDate {
        field,
        value: trimmed,
    })
}

fn choice<T: std::str::FromStr + std::fmt::Display>(
    field: &'static str,
    value: &str,
    all: &[T],
) -> Result<T, FormError> {
    let trimmed = required(field, value)?;
    trimmed.parse::<T>().map_err(|_| FormError::InvalidChoice {
        field,
        value: trimmed,
        allowed: all
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", "),
    })
}

fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// ============================================================
// Property
// ============================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyForm {
    pub name: String,
    pub address: String,
    pub status: String,
    pub rent: String,
}

impl PropertyForm {
    fn validated(&self) -> Result<NewProperty, FormError> {
        Ok(NewProperty {
            name: required("name", &self.name)?,
            address: required("address", &self.address)?,
            status: choice("status", &self.status, &PropertyStatus::ALL)?,
            rent_amount: amount("rent", &self.rent)?,
            image_url: None,
        })
    }
}

impl EntityForm for PropertyForm {
    type Entity = Property;

    const FIELD_MAP: &'static [FieldMapping] = &[
        field("name", "name"),
        field("address", "address"),
        field("status", "status"),
        field("rent", "rent_amount"),
    ];

    fn to_new(&self) -> Result<NewProperty, FormError> {
        self.validated()
    }

    fn to_patch(&self) -> Result<PropertyPatch, FormError> {
        let new = self.validated()?;
        Ok(PropertyPatch {
            name: Some(new.name),
            address: Some(new.address),
            status: Some(new.status),
            rent_amount: Some(new.rent_amount),
            image_url: None,
        })
    }
}

// ============================================================
// Tenant
// ============================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(rename = "leaseStart")]
    pub lease_start: String,
    #[serde(rename = "leaseEnd")]
    pub lease_end: String,
    pub rent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
}

impl EntityForm for TenantForm {
    type Entity = Tenant;

    const FIELD_MAP: &'static [FieldMapping] = &[
        field("name", "name"),
        field("email", "email"),
        field("phone", "phone"),
        field("leaseStart", "lease_start"),
        field("leaseEnd", "lease_end"),
        field("rent", "rent_amount"),
        field("property", "property_id"),
    ];

    /// New tenants start `pending` with a generated avatar
    fn to_new(&self) -> Result<NewTenant, FormError> {
        let name = required("name", &self.name)?;
        Ok(NewTenant {
            avatar_url: Some(avatar_url_for(&name)),
            name,
            email: required("email", &self.email)?,
            phone: required("phone", &self.phone)?,
            lease_start: date("leaseStart", &self.lease_start)?,
            lease_end: date("leaseEnd", &self.lease_end)?,
            rent_amount: amount("rent", &self.rent)?,
            payment_status: PaymentStatus::Pending,
            property_id: optional(&self.property),
        })
    }

    fn to_patch(&self) -> Result<TenantPatch, FormError> {
        Ok(TenantPatch {
            name: Some(required("name", &self.name)?),
            email: Some(required("email", &self.email)?),
            phone: Some(required("phone", &self.phone)?),
            lease_start: Some(date("leaseStart", &self.lease_start)?),
            lease_end: Some(date("leaseEnd", &self.lease_end)?),
            rent_amount: Some(amount("rent", &self.rent)?),
            // A blanked select unassigns; an absent field leaves it alone
            property_id: self.property.as_ref().map(|_| optional(&self.property)),
            ..TenantPatch::default()
        })
    }
}

// ============================================================
// Maintenance request
// ============================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceForm {
    pub title: String,
    pub description: String,
    /// Selected property id
    pub property: String,
    pub priority: String,
}

impl EntityForm for MaintenanceForm {
    type Entity = MaintenanceRequest;

    const FIELD_MAP: &'static [FieldMapping] = &[
        field("title", "title"),
        field("description", "description"),
        field("property", "property_id"),
        field("priority", "priority"),
    ];

    /// New requests always start in `new`
    fn to_new(&self) -> Result<NewMaintenanceRequest, FormError> {
        Ok(NewMaintenanceRequest {
            title: required("title", &self.title)?,
            description: required("description", &self.description)?,
            property_id: required("property", &self.property)?,
            priority: choice("priority", &self.priority, &Priority::ALL)?,
            status: MaintenanceStatus::New,
        })
    }

    /// Edits never touch `status`; that goes through the status selector
    fn to_patch(&self) -> Result<MaintenanceRequestPatch, FormError> {
        Ok(MaintenanceRequestPatch {
            title: Some(required("title", &self.title)?),
            description: Some(required("description", &self.description)?),
            property_id: Some(required("property", &self.property)?),
            priority: Some(choice("priority", &self.priority, &Priority::ALL)?),
            status: None,
        })
    }
}
