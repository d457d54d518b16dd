//! Derived values for the dashboard and maintenance screens
//!
//! Everything here is a pure function of already-loaded collections.

use serde::Serialize;

use propdash_types::{
    MaintenanceRequest, MaintenanceRequestWithProperty, MaintenanceStatus, PaymentStatus,
    Priority, Property, Tenant, UNKNOWN_PROPERTY,
};

/// Percentage of occupied properties, rounded half up. Zero when there are
/// no properties at all.
pub fn occupancy_rate(properties: &[Property]) -> u32 {
    let total = properties.len() as u64;
    if total == 0 {
        return 0;
    }
    let occupied = properties.iter().filter(|p| p.is_occupied()).count() as u64;
    ((200 * occupied + total) / (2 * total)) as u32
}

/// Headline numbers for the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_properties: usize,
    pub occupied_properties: usize,
    pub total_tenants: usize,
    pub occupancy_rate: u32,
    /// Sum of rent over occupied properties
    pub occupied_rent: i64,
    pub maintenance_by_status: Vec<(MaintenanceStatus, usize)>,
    pub maintenance_by_priority: Vec<(Priority, usize)>,
    pub tenants_by_payment: Vec<(PaymentStatus, usize)>,
}

fn tally<K: Copy + PartialEq>(keys: &[K], values: impl Iterator<Item = K>) -> Vec<(K, usize)> {
    let mut counts: Vec<(K, usize)> = keys.iter().map(|k| (*k, 0)).collect();
    for value in values {
        if let Some(slot) = counts.iter_mut().find(|(k, _)| *k == value) {
            slot.1 += 1;
        }
    }
    counts
}

impl DashboardStats {
    pub fn compute<'a, I>(properties: &[Property], tenants: &[Tenant], requests: I) -> Self
    where
        I: IntoIterator<Item = &'a MaintenanceRequest>,
        I::IntoIter: Clone,
    {
        let requests = requests.into_iter();
        let occupied: Vec<&Property> = properties.iter().filter(|p| p.is_occupied()).collect();

        Self {
            total_properties: properties.len(),
            occupied_properties: occupied.len(),
            total_tenants: tenants.len(),
            occupancy_rate: occupancy_rate(properties),
            occupied_rent: occupied
                .iter()
                .fold(0i64, |total, p| total.saturating_add(p.rent_amount)),
            maintenance_by_status: tally(&MaintenanceStatus::ALL, requests.clone().map(|r| r.status)),
            maintenance_by_priority: tally(&Priority::ALL, requests.map(|r| r.priority)),
            tenants_by_payment: tally(&PaymentStatus::ALL, tenants.iter().map(|t| t.payment_status)),
        }
    }

    /// "N out of M properties occupied"
    pub fn occupancy_description(&self) -> String {
        format!(
            "{} out of {} properties occupied",
            self.occupied_properties, self.total_properties
        )
    }

    pub fn occupancy_label(&self) -> String {
        format!("{}%", self.occupancy_rate)
    }

    pub fn open_maintenance(&self) -> usize {
        self.maintenance_by_status
            .iter()
            .filter(|(status, _)| *status != MaintenanceStatus::Completed)
            .map(|(_, n)| n)
            .sum()
    }
}

/// Name shown for the property a request points at, looked up in the loaded
/// properties collection. A dangling reference shows [`UNKNOWN_PROPERTY`].
pub fn resolve_property_name<'a>(property_id: &str, properties: &'a [Property]) -> &'a str {
    properties
        .iter()
        .find(|p| p.id == property_id)
        .map(|p| p.name.as_str())
        .unwrap_or(UNKNOWN_PROPERTY)
}

/// One row of the maintenance table, ready to display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaintenanceRow {
    pub id: String,
    pub title: String,
    pub property: String,
    pub priority: Priority,
    pub status: MaintenanceStatus,
    /// Creation date as `M/D/YYYY`
    pub date: String,
    pub description: String,
}

pub fn maintenance_rows(
    requests: &[MaintenanceRequestWithProperty],
    properties: &[Property],
) -> Vec<MaintenanceRow> {
    requests
        .iter()
        .map(|joined| {
            let r = &joined.request;
            MaintenanceRow {
                id: r.id.clone(),
                title: r.title.clone(),
                property: resolve_property_name(&r.property_id, properties).to_string(),
                priority: r.priority,
                status: r.status,
                date: r.created_at.format("%-m/%-d/%Y").to_string(),
                description: r.description.clone(),
            }
        })
        .collect()
}

/// Choices for a property picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyOption {
    pub id: String,
    pub name: String,
}

pub fn property_options(properties: &[Property]) -> Vec<PropertyOption> {
    properties
        .iter()
        .map(|p| PropertyOption {
            id: p.id.clone(),
            name: p.name.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use propdash_types::{PropertyName, PropertyStatus};

    fn property(id: &str, status: PropertyStatus, rent: i64) -> Property {
        Property {
            id: id.to_string(),
            name: format!("Property {}", id),
            address: "1 Main St".to_string(),
            status,
            rent_amount: rent,
            image_url: None,
            created_at: Utc::now(),
        }
    }

    fn tenant(payment_status: PaymentStatus) -> Tenant {
        Tenant {
            id: "t".to_string(),
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            phone: "555".to_string(),
            lease_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            lease_end: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            rent_amount: 1000,
            payment_status,
            property_id: None,
            avatar_url: None,
            created_at: Utc::now(),
        }
    }

    fn request(property_id: &str, priority: Priority, status: MaintenanceStatus) -> MaintenanceRequest {
        let at = Utc.with_ymd_and_hms(2024, 3, 7, 12, 0, 0).unwrap();
        MaintenanceRequest {
            id: "r1".to_string(),
            title: "Leak".to_string(),
            description: "Kitchen sink".to_string(),
            property_id: property_id.to_string(),
            priority,
            status,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_occupancy_rate_rounds() {
        let one_of_three = vec![
            property("a", PropertyStatus::Occupied, 1000),
            property("b", PropertyStatus::Vacant, 1000),
            property("c", PropertyStatus::Maintenance, 1000),
        ];
        assert_eq!(occupancy_rate(&one_of_three), 33);

        let two_of_three = vec![
            property("a", PropertyStatus::Occupied, 1000),
            property("b", PropertyStatus::Occupied, 1000),
            property("c", PropertyStatus::Vacant, 1000),
        ];
        assert_eq!(occupancy_rate(&two_of_three), 67);

        let mut one_of_eight = vec![property("a", PropertyStatus::Occupied, 1000)];
        one_of_eight.extend((0..7).map(|i| property(&i.to_string(), PropertyStatus::Vacant, 1)));
        assert_eq!(occupancy_rate(&one_of_eight), 13);
    }

    #[test]
    fn test_occupancy_rate_empty_is_zero() {
        assert_eq!(occupancy_rate(&[]), 0);
    }

    #[test]
    fn test_stats() {
        let properties = vec![
            property("a", PropertyStatus::Occupied, 1500),
            property("b", PropertyStatus::Occupied, 2500),
            property("c", PropertyStatus::Vacant, 900),
        ];
        let tenants = vec![
            tenant(PaymentStatus::Paid),
            tenant(PaymentStatus::Overdue),
            tenant(PaymentStatus::Paid),
        ];
        let requests = vec![
            request("a", Priority::High, MaintenanceStatus::New),
            request("b", Priority::Low, MaintenanceStatus::Completed),
        ];

        let stats = DashboardStats::compute(&properties, &tenants, &requests);
        assert_eq!(stats.total_properties, 3);
        assert_eq!(stats.occupied_properties, 2);
        assert_eq!(stats.total_tenants, 3);
        assert_eq!(stats.occupancy_rate, 67);
        assert_eq!(stats.occupancy_label(), "67%");
        assert_eq!(stats.occupancy_description(), "2 out of 3 properties occupied");
        assert_eq!(stats.occupied_rent, 4000);
        assert_eq!(
            stats.tenants_by_payment,
            vec![
                (PaymentStatus::Paid, 2),
                (PaymentStatus::Pending, 0),
                (PaymentStatus::Overdue, 1),
            ]
        );
        assert_eq!(stats.open_maintenance(), 1);
        assert_eq!(
            stats.maintenance_by_priority,
            vec![(Priority::High, 1), (Priority::Medium, 0), (Priority::Low, 1)]
        );
    }

    #[test]
    fn test_rows_use_loaded_properties() {
        let properties = vec![property("a", PropertyStatus::Occupied, 1000)];
        let requests = vec![
            MaintenanceRequestWithProperty {
                request: request("a", Priority::High, MaintenanceStatus::InProgress),
                properties: Some(PropertyName {
                    name: "Stale name".to_string(),
                }),
            },
            MaintenanceRequestWithProperty {
                request: request("gone", Priority::Low, MaintenanceStatus::New),
                properties: Some(PropertyName {
                    name: "Deleted since".to_string(),
                }),
            },
        ];

        let rows = maintenance_rows(&requests, &properties);
        assert_eq!(rows[0].property, "Property a");
        assert_eq!(rows[0].date, "3/7/2024");
        assert_eq!(rows[1].property, UNKNOWN_PROPERTY);
    }

    #[test]
    fn test_name_comes_from_loaded_properties_only() {
        let loaded = [property("a", PropertyStatus::Vacant, 1)];
        assert_eq!(resolve_property_name("a", &loaded), "Property a");
        assert_eq!(resolve_property_name("x", &loaded), UNKNOWN_PROPERTY);
        assert_eq!(resolve_property_name("a", &[]), UNKNOWN_PROPERTY);
    }

    #[test]
    fn test_occupied_rent_saturates() {
        let big = i64::MAX / 2 + 1;
        let properties = [
            property("a", PropertyStatus::Occupied, big),
            property("b", PropertyStatus::Occupied, big),
            property("c", PropertyStatus::Vacant, big),
        ];
        let stats = DashboardStats::compute(&properties, &[], Vec::<MaintenanceRequest>::new().iter());
        assert_eq!(stats.occupied_rent, i64::MAX);
        assert_eq!(stats.occupied_properties, 2);
    }

    #[test]
    fn test_property_options() {
        let options = property_options(&[property("a", PropertyStatus::Vacant, 1)]);
        assert_eq!(
            options,
            vec![PropertyOption {
                id: "a".to_string(),
                name: "Property a".to_string(),
            }]
        );
    }

    proptest! {
        #[test]
        fn occupancy_rate_is_nearest_percent(occupied in 0usize..60, vacant in 0usize..60) {
            let mut properties: Vec<Property> = (0..occupied)
                .map(|i| property(&i.to_string(), PropertyStatus::Occupied, 1))
                .collect();
            properties.extend((0..vacant).map(|i| property(&i.to_string(), PropertyStatus::Vacant, 1)));

            let rate = occupancy_rate(&properties);
            prop_assert!(rate <= 100);
            if !properties.is_empty() {
                let exact = 100.0 * occupied as f64 / properties.len() as f64;
                prop_assert!((rate as f64 - exact).abs() <= 0.5 + 1e-9);
            } else {
                prop_assert_eq!(rate, 0);
            }
        }
    }
}
