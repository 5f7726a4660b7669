use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cqrs_es::Aggregate;
use serde::{Deserialize, Serialize};

use crate::errors::Error;

use super::{Command, Event};

/// Account role, used to partition marketplace access.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Private person donating or requesting surplus stock
    Individual,
    /// Registered pharmacy
    Pharmacy,
    /// Platform administrator
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Self::Pharmacy
    }
}

/// User aggregate, keyed by email address.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct User {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

pub const AGGREGATE_TYPE: &str = "User";

#[derive(Clone, Default)]
pub struct Services {}

#[async_trait]
impl Aggregate for User {
    type Command = Command;
    type Event = Event;
    type Error = Error;
    type Services = Services;

    fn aggregate_type() -> String {
        AGGREGATE_TYPE.to_string()
    }

    async fn handle(
        &self,
        command: Self::Command,
        _services: &Self::Services,
    ) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            Command::Register {
                email,
                username,
                password_hash,
                role,
            } => {
                self.validate_new()?;
                if email.is_empty() || username.is_empty() || password_hash.is_empty() {
                    return Err(Error::Validation {
                        message: "All fields are required".to_string(),
                    });
                }

                Ok(vec![Event::Registered {
                    email,
                    username,
                    password_hash,
                    role,
                    created_at: Utc::now(),
                }])
            }
        }
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            Event::Registered {
                email,
                username,
                password_hash,
                role,
                created_at,
            } => {
                self.email = email;
                self.username = username;
                self.password_hash = password_hash;
                self.role = role;
                self.created_at = created_at;
            }
        }
    }
}

impl User {
    fn validate_new(&self) -> Result<(), Error> {
        if !self.email.is_empty() {
            return Err(Error::Uniqueness {
                field: "email".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_command() -> Command {
        Command::Register {
            email: "a@pharmacy.test".to_string(),
            username: "Pharmacy A".to_string(),
            password_hash: "salt$hash".to_string(),
            role: Role::Pharmacy,
        }
    }

    #[tokio::test]
    async fn register_emits_registered() {
        let events = User::default()
            .handle(register_command(), &Services::default())
            .await
            .unwrap();

        assert!(matches!(
            &events[..],
            [Event::Registered { email, role: Role::Pharmacy, .. }] if email == "a@pharmacy.test"
        ));
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let mut user = User::default();
        for event in user
            .handle(register_command(), &Services::default())
            .await
            .unwrap()
        {
            user.apply(event);
        }

        let err = user
            .handle(register_command(), &Services::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Uniqueness { .. }));
    }

    #[tokio::test]
    async fn registration_requires_all_fields() {
        let err = User::default()
            .handle(
                Command::Register {
                    email: "a@pharmacy.test".to_string(),
                    username: String::new(),
                    password_hash: "salt$hash".to_string(),
                    role: Role::Individual,
                },
                &Services::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }
}
