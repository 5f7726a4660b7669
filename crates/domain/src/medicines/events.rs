use chrono::{DateTime, NaiveDate, Utc};
use cqrs_es::DomainEvent;
use serde::{Deserialize, Serialize};

use super::aggregate::{MedicineStatus, RedistributionStatus};

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(tag = "type")]
pub enum Event {
    Added {
        id: String,
        owner: String,
        owner_name: String,
        name: String,
        batch_number: String,
        quantity: u32,
        expiry_date: NaiveDate,
        condition: Option<String>,
        status: MedicineStatus,
        redistribution: RedistributionStatus,
        created_at: DateTime<Utc>,
    },

    Listed {
        id: String,
        updated_at: DateTime<Utc>,
    },

    RedistributionRequested {
        id: String,
        request_id: String,
        requested_by: String,
        updated_at: DateTime<Utc>,
    },

    RedistributionReleased {
        id: String,
        updated_at: DateTime<Utc>,
    },

    OwnershipTransferred {
        id: String,
        new_owner: String,
        new_owner_name: String,
        updated_at: DateTime<Utc>,
    },

    MarkedSold {
        id: String,
        updated_at: DateTime<Utc>,
    },

    MarkedExpired {
        id: String,
        updated_at: DateTime<Utc>,
    },
}

impl DomainEvent for Event {
    fn event_type(&self) -> String {
        match self {
            Event::Added { .. } => "Medicine:Added".to_string(),
            Event::Listed { .. } => "Medicine:Listed".to_string(),
            Event::RedistributionRequested { .. } => "Medicine:RedistributionRequested".to_string(),
            Event::RedistributionReleased { .. } => "Medicine:RedistributionReleased".to_string(),
            Event::OwnershipTransferred { .. } => "Medicine:OwnershipTransferred".to_string(),
            Event::MarkedSold { .. } => "Medicine:MarkedSold".to_string(),
            Event::MarkedExpired { .. } => "Medicine:MarkedExpired".to_string(),
        }
    }

    fn event_version(&self) -> String {
        "1.0".to_string()
    }
}
