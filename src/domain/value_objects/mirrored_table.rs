use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// SQLite storage class used for a mirrored column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Real,
}

impl ColumnType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub column_type: ColumnType,
}

const fn text(name: &'static str) -> ColumnDef {
    ColumnDef {
        name,
        column_type: ColumnType::Text,
    }
}

const fn integer(name: &'static str) -> ColumnDef {
    ColumnDef {
        name,
        column_type: ColumnType::Integer,
    }
}

const fn real(name: &'static str) -> ColumnDef {
    ColumnDef {
        name,
        column_type: ColumnType::Real,
    }
}

const CLIENT_COLUMNS: &[ColumnDef] = &[
    text("id"),
    text("name"),
    text("email"),
    text("phone"),
    text("address"),
    text("tax_id"),
    integer("is_active"),
    text("created_at"),
    text("updated_at"),
];

const DEPARTMENT_COLUMNS: &[ColumnDef] = &[
    text("id"),
    text("name"),
    text("client_id"),
    text("description"),
    text("created_at"),
    text("updated_at"),
];

const DEPARTMENT_LOCATION_COLUMNS: &[ColumnDef] = &[
    text("id"),
    text("department_id"),
    text("client_id"),
    text("name"),
    text("address"),
    text("city"),
    text("created_at"),
    text("updated_at"),
];

const PRINTER_COLUMNS: &[ColumnDef] = &[
    text("id"),
    text("name"),
    text("brand"),
    text("model"),
    text("serial_number"),
    text("status"),
    integer("is_available"),
    text("location"),
    real("purchase_price"),
    text("notes"),
    text("created_at"),
    text("updated_at"),
];

const PRINTER_ASSIGNMENT_COLUMNS: &[ColumnDef] = &[
    text("id"),
    text("printer_id"),
    text("client_id"),
    text("department_id"),
    text("location_id"),
    text("assigned_at"),
    text("returned_at"),
    integer("is_active"),
    text("notes"),
    text("created_at"),
    text("updated_at"),
];

const PRODUCT_COLUMNS: &[ColumnDef] = &[
    text("id"),
    text("name"),
    text("description"),
    text("sku"),
    text("category"),
    real("price"),
    integer("stock"),
    text("supplier_id"),
    text("created_at"),
    text("updated_at"),
];

const SUPPLIER_COLUMNS: &[ColumnDef] = &[
    text("id"),
    text("name"),
    text("contact_name"),
    text("email"),
    text("phone"),
    text("address"),
    text("created_at"),
    text("updated_at"),
];

/// Server tables mirrored locally. Adding one means adding a variant here,
/// to [`MirroredTable::ALL`] and a column list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MirroredTable {
    Clients,
    Departments,
    DepartmentsLocation,
    Printers,
    PrinterAssignments,
    Products,
    Suppliers,
}

impl MirroredTable {
    pub const ALL: [MirroredTable; 7] = [
        MirroredTable::Clients,
        MirroredTable::Departments,
        MirroredTable::DepartmentsLocation,
        MirroredTable::Printers,
        MirroredTable::PrinterAssignments,
        MirroredTable::Products,
        MirroredTable::Suppliers,
    ];

    pub const PRIMARY_KEY: &'static str = "id";

    pub fn as_str(&self) -> &'static str {
        match self {
            MirroredTable::Clients => "clients",
            MirroredTable::Departments => "departments",
            MirroredTable::DepartmentsLocation => "departments_location",
            MirroredTable::Printers => "printers",
            MirroredTable::PrinterAssignments => "printer_assignments",
            MirroredTable::Products => "products",
            MirroredTable::Suppliers => "suppliers",
        }
    }

    pub fn columns(&self) -> &'static [ColumnDef] {
        match self {
            MirroredTable::Clients => CLIENT_COLUMNS,
            MirroredTable::Departments => DEPARTMENT_COLUMNS,
            MirroredTable::DepartmentsLocation => DEPARTMENT_LOCATION_COLUMNS,
            MirroredTable::Printers => PRINTER_COLUMNS,
            MirroredTable::PrinterAssignments => PRINTER_ASSIGNMENT_COLUMNS,
            MirroredTable::Products => PRODUCT_COLUMNS,
            MirroredTable::Suppliers => SUPPLIER_COLUMNS,
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns().iter().any(|column| column.name == name)
    }
}

impl fmt::Display for MirroredTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MirroredTable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MirroredTable::ALL
            .into_iter()
            .find(|table| table.as_str() == s)
            .ok_or_else(|| format!("Unknown mirrored table: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_table_starts_with_primary_key() {
        for table in MirroredTable::ALL {
            assert_eq!(table.columns()[0].name, MirroredTable::PRIMARY_KEY);
        }
    }

    #[test]
    fn parses_known_names_only() {
        assert_eq!(
            "departments_location".parse::<MirroredTable>(),
            Ok(MirroredTable::DepartmentsLocation)
        );
        assert!("invoices".parse::<MirroredTable>().is_err());
    }

    #[test]
    fn printers_expose_availability_column() {
        assert!(MirroredTable::Printers.has_column("is_available"));
        assert!(!MirroredTable::Printers.has_column("client_id"));
    }
}
