//! Shared data model for propdash
//!
//! Three entities live in the remote store: [`Property`], [`Tenant`] and
//! [`MaintenanceRequest`]. Each has a matching insert payload (`New*`), a
//! partial update payload (`*Patch`) and a form type that maps raw UI input
//! onto store columns.

pub mod entity;
pub mod form;
pub mod maintenance;
pub mod property;
pub mod tenant;

pub use entity::{capitalize, tables, Entity, ParseEnumError};
pub use form::{EntityForm, FieldMapping, FormError, MaintenanceForm, PropertyForm, TenantForm};
pub use maintenance::{
    MaintenanceRequest, MaintenanceRequestPatch, MaintenanceRequestWithProperty,
    MaintenanceStatus, NewMaintenanceRequest, Priority, PropertyName,
};
pub use property::{NewProperty, Property, PropertyPatch, PropertyStatus};
pub use tenant::{avatar_url_for, NewTenant, PaymentStatus, Tenant, TenantPatch};

/// Label shown when a maintenance request points at a property that is not
/// in the loaded collection.
pub const UNKNOWN_PROPERTY: &str = "Unknown Property";
