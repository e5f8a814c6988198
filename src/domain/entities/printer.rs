use super::record::lenient;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Printer {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    pub name: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::bool")]
    pub is_available: bool,
    pub location: Option<String>,
    pub purchase_price: Option<f64>,
    pub notes: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrinterAssignment {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(deserialize_with = "lenient::id")]
    pub printer_id: String,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub client_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub department_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub location_id: Option<String>,
    pub assigned_at: Option<String>,
    pub returned_at: Option<String>,
    #[serde(default, deserialize_with = "lenient::bool")]
    pub is_active: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSummary {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSummary {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
}

/// A printer joined with its active assignment and where it is placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignedPrinter {
    pub printer: Printer,
    pub assignment: PrinterAssignment,
    pub client: Option<ClientSummary>,
    pub location: Option<LocationSummary>,
}
