//! Column catalogue for the exposed tables
//!
//! Only tables and columns listed here are reachable over `/rest/v1`, so
//! every identifier that ends up in generated SQL comes from this file.

use propdash_types::tables;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Text,
    Integer,
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub kind: Kind,
    /// Set by clients. `id` and the timestamps are server-owned.
    pub writable: bool,
}

/// Many-to-one relation usable as `select=*,name(cols)`
#[derive(Debug, Clone, Copy)]
pub struct Relation {
    pub name: &'static str,
    pub foreign_key: &'static str,
    pub table: &'static str,
}

#[derive(Debug)]
pub struct TableSpec {
    pub name: &'static str,
    pub columns: &'static [Column],
    pub relations: &'static [Relation],
    pub has_updated_at: bool,
}

const fn text(name: &'static str) -> Column {
    Column {
        name,
        kind: Kind::Text,
        writable: true,
    }
}

const fn integer(name: &'static str) -> Column {
    Column {
        name,
        kind: Kind::Integer,
        writable: true,
    }
}

const fn server(name: &'static str) -> Column {
    Column {
        name,
        kind: Kind::Text,
        writable: false,
    }
}

pub static PROPERTIES: TableSpec = TableSpec {
    name: tables::PROPERTIES,
    columns: &[
        server("id"),
        text("name"),
        text("address"),
        text("status"),
        integer("rent_amount"),
        text("image_url"),
        server("created_at"),
    ],
    relations: &[],
    has_updated_at: false,
};

pub static TENANTS: TableSpec = TableSpec {
    name: tables::TENANTS,
    columns: &[
        server("id"),
        text("name"),
        text("email"),
        text("phone"),
        text("lease_start"),
        text("lease_end"),
        integer("rent_amount"),
        text("payment_status"),
        text("property_id"),
        text("avatar_url"),
        server("created_at"),
    ],
    relations: &[Relation {
        name: "properties",
        foreign_key: "property_id",
        table: tables::PROPERTIES,
    }],
    has_updated_at: false,
};

pub static MAINTENANCE_REQUESTS: TableSpec = TableSpec {
    name: tables::MAINTENANCE_REQUESTS,
    columns: &[
        server("id"),
        text("title"),
        text("description"),
        text("property_id"),
        text("priority"),
        text("status"),
        server("created_at"),
        server("updated_at"),
    ],
    relations: &[Relation {
        name: "properties",
        foreign_key: "property_id",
        table: tables::PROPERTIES,
    }],
    has_updated_at: true,
};

pub static ALL: [&TableSpec; 3] = [&PROPERTIES, &TENANTS, &MAINTENANCE_REQUESTS];

pub fn lookup(name: &str) -> Option<&'static TableSpec> {
    ALL.into_iter().find(|t| t.name == name)
}

impl TableSpec {
    pub fn column(&self, name: &str) -> Option<&'static Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn relation(&self, name: &str) -> Option<&'static Relation> {
        self.relations.iter().find(|r| r.name == name)
    }
}
