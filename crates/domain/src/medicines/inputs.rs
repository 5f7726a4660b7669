use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::aggregate::MedicineStatus;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AddMedicineInput {
    pub name: String,
    pub quantity: u32,
    /// ISO-8601 date; an unparseable value is rejected at deserialization
    pub expiry_date: NaiveDate,
    #[serde(default)]
    pub batch_number: String,
    #[serde(default)]
    pub condition: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpdateStatusInput {
    pub status: MedicineStatus,
}
