use chrono::{DateTime, Utc};
use cqrs_es::DomainEvent;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(tag = "type")]
pub enum Event {
    RequestOpened {
        id: String,
        medicine_id: String,
        medicine_name: String,
        quantity: u32,
        seller: String,
        buyer: String,
        buyer_name: String,
        requested_at: DateTime<Utc>,
    },

    /// Carries the batch identity so stream consumers (demand analytics)
    /// need no extra lookup.
    RequestAccepted {
        id: String,
        medicine_id: String,
        medicine_name: String,
        quantity: u32,
        updated_at: DateTime<Utc>,
    },

    RequestRejected {
        id: String,
        updated_at: DateTime<Utc>,
    },
}

impl DomainEvent for Event {
    fn event_type(&self) -> String {
        match self {
            Event::RequestOpened { .. } => "Transfer:RequestOpened".to_string(),
            Event::RequestAccepted { .. } => "Transfer:RequestAccepted".to_string(),
            Event::RequestRejected { .. } => "Transfer:RequestRejected".to_string(),
        }
    }

    fn event_version(&self) -> String {
        "1.0".to_string()
    }
}
