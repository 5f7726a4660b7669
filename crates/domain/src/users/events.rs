use chrono::{DateTime, Utc};
use cqrs_es::DomainEvent;
use serde::{Deserialize, Serialize};

use super::aggregate::Role;

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(tag = "type")]
pub enum Event {
    Registered {
        email: String,
        username: String,
        password_hash: String,
        role: Role,
        created_at: DateTime<Utc>,
    },
}

impl DomainEvent for Event {
    fn event_type(&self) -> String {
        match self {
            Event::Registered { .. } => "User:Registered".to_string(),
        }
    }

    fn event_version(&self) -> String {
        "1.0".to_string()
    }
}
