use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use cqrs_es::Aggregate;
use serde::{Deserialize, Serialize};

use crate::errors::Error;

use super::{Command, Event};

/// Primary lifecycle status of a batch
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum MedicineStatus {
    /// In stock with its current owner
    Active,
    /// Dispensed or sold locally
    Sold,
    /// Past its expiry date
    Expired,
}

impl Default for MedicineStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl MedicineStatus {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Sold => "sold",
            Self::Expired => "expired",
        }
    }
}

/// Marketplace flag, independent of the lifecycle status
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum RedistributionStatus {
    /// Not on the marketplace
    None,
    /// Listed as surplus, open to requests
    Available,
    /// Held by a pending transfer request
    Requested,
}

impl Default for RedistributionStatus {
    fn default() -> Self {
        Self::None
    }
}

impl RedistributionStatus {
    fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Available => "available",
            Self::Requested => "requested",
        }
    }
}

/// Medicine batch aggregate.
///
/// The `Requested` hold is what keeps a batch to at most one outstanding
/// transfer request: a new request is only accepted from `Available`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct Medicine {
    pub id: String,
    pub owner: String,
    pub owner_name: String,
    pub name: String,
    pub batch_number: String,
    pub quantity: u32,
    pub expiry_date: NaiveDate,
    pub condition: Option<String>,
    pub status: MedicineStatus,
    pub redistribution: RedistributionStatus,

    /// Transfer request currently holding the batch, if any
    pub pending_request: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const AGGREGATE_TYPE: &str = "Medicine";

#[derive(Clone, Default)]
pub struct Services {}

#[async_trait]
impl Aggregate for Medicine {
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
            Command::Add {
                id,
                owner,
                owner_name,
                name,
                batch_number,
                quantity,
                expiry_date,
                condition,
            } => {
                self.validate_new()?;
                if name.is_empty() || owner.is_empty() {
                    return Err(Error::Validation {
                        message: "Required fields missing".to_string(),
                    });
                }
                if quantity == 0 {
                    return Err(Error::Validation {
                        message: "Quantity must be positive".to_string(),
                    });
                }

                Ok(vec![Event::Added {
                    id,
                    owner,
                    owner_name,
                    name,
                    batch_number,
                    quantity,
                    expiry_date,
                    condition,
                    status: MedicineStatus::Active,
                    redistribution: RedistributionStatus::None,
                    created_at: Utc::now(),
                }])
            }

            Command::ListForRedistribution { requested_by } => {
                self.validate_existing()?;
                self.validate_owner(&requested_by)?;
                self.validate_active()?;
                if self.redistribution != RedistributionStatus::None {
                    return Err(self.redistribution_transition_error("available"));
                }

                Ok(vec![Event::Listed {
                    id: self.id.clone(),
                    updated_at: Utc::now(),
                }])
            }

            Command::RequestRedistribution {
                request_id,
                requested_by,
            } => {
                self.validate_existing()?;
                if requested_by == self.owner {
                    return Err(Error::Validation {
                        message: "Cannot request your own stock".to_string(),
                    });
                }
                if self.redistribution != RedistributionStatus::Available {
                    return Err(self.redistribution_transition_error("requested"));
                }

                Ok(vec![Event::RedistributionRequested {
                    id: self.id.clone(),
                    request_id,
                    requested_by,
                    updated_at: Utc::now(),
                }])
            }

            Command::ReleaseRedistribution => {
                self.validate_existing()?;
                if self.redistribution != RedistributionStatus::Requested {
                    return Err(self.redistribution_transition_error("available"));
                }

                Ok(vec![Event::RedistributionReleased {
                    id: self.id.clone(),
                    updated_at: Utc::now(),
                }])
            }

            Command::TransferOwnership {
                new_owner,
                new_owner_name,
            } => {
                self.validate_existing()?;
                if self.redistribution != RedistributionStatus::Requested {
                    return Err(self.redistribution_transition_error("none"));
                }

                Ok(vec![Event::OwnershipTransferred {
                    id: self.id.clone(),
                    new_owner,
                    new_owner_name,
                    updated_at: Utc::now(),
                }])
            }

            Command::MarkSold { requested_by } => {
                self.validate_existing()?;
                self.validate_owner(&requested_by)?;
                self.validate_active()?;
                // A listed or held batch must leave the marketplace first.
                if self.redistribution != RedistributionStatus::None {
                    return Err(self.status_transition_error("sold"));
                }

                Ok(vec![Event::MarkedSold {
                    id: self.id.clone(),
                    updated_at: Utc::now(),
                }])
            }

            Command::MarkExpired { requested_by } => {
                self.validate_existing()?;
                self.validate_owner(&requested_by)?;
                self.validate_active()?;
                // A held batch stays held until its request is resolved.
                if self.redistribution == RedistributionStatus::Requested {
                    return Err(self.status_transition_error("expired"));
                }

                Ok(vec![Event::MarkedExpired {
                    id: self.id.clone(),
                    updated_at: Utc::now(),
                }])
            }
        }
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            Event::Added {
                id,
                owner,
                owner_name,
                name,
                batch_number,
                quantity,
                expiry_date,
                condition,
                status,
                redistribution,
                created_at,
            } => {
                self.id = id;
                self.owner = owner;
                self.owner_name = owner_name;
                self.name = name;
                self.batch_number = batch_number;
                self.quantity = quantity;
                self.expiry_date = expiry_date;
                self.condition = condition;
                self.status = status;
                self.redistribution = redistribution;
                self.created_at = created_at;
                self.updated_at = created_at;
            }

            Event::Listed { updated_at, .. } => {
                self.redistribution = RedistributionStatus::Available;
                self.updated_at = updated_at;
            }

            Event::RedistributionRequested {
                request_id,
                updated_at,
                ..
            } => {
                self.redistribution = RedistributionStatus::Requested;
                self.pending_request = Some(request_id);
                self.updated_at = updated_at;
            }

            Event::RedistributionReleased { updated_at, .. } => {
                self.redistribution = RedistributionStatus::Available;
                self.pending_request = None;
                self.updated_at = updated_at;
            }

            Event::OwnershipTransferred {
                new_owner,
                new_owner_name,
                updated_at,
                ..
            } => {
                self.owner = new_owner;
                self.owner_name = new_owner_name;
                self.redistribution = RedistributionStatus::None;
                self.pending_request = None;
                self.updated_at = updated_at;
            }

            Event::MarkedSold { updated_at, .. } => {
                self.status = MedicineStatus::Sold;
                self.updated_at = updated_at;
            }

            Event::MarkedExpired { updated_at, .. } => {
                self.status = MedicineStatus::Expired;
                self.redistribution = RedistributionStatus::None;
                self.updated_at = updated_at;
            }
        }
    }
}

impl Medicine {
    fn validate_new(&self) -> Result<(), Error> {
        if !self.id.is_empty() {
            return Err(Error::Uniqueness {
                field: "id".to_string(),
            });
        }
        Ok(())
    }

    fn validate_existing(&self) -> Result<(), Error> {
        if self.id.is_empty() {
            return Err(Error::NotFound {
                entity: AGGREGATE_TYPE.to_string(),
            });
        }
        Ok(())
    }

    fn validate_owner(&self, requested_by: &str) -> Result<(), Error> {
        if requested_by != self.owner {
            return Err(Error::Forbidden);
        }
        Ok(())
    }

    fn validate_active(&self) -> Result<(), Error> {
        if self.status != MedicineStatus::Active {
            return Err(Error::InvalidStateTransition {
                from: self.status.as_str().to_string(),
                to: "active".to_string(),
            });
        }
        Ok(())
    }

    fn redistribution_transition_error(&self, to: &str) -> Error {
        Error::InvalidStateTransition {
            from: self.redistribution.as_str().to_string(),
            to: to.to_string(),
        }
    }

    fn status_transition_error(&self, to: &str) -> Error {
        Error::InvalidStateTransition {
            from: self.status.as_str().to_string(),
            to: to.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SELLER: &str = "seller@pharmacy.test";
    const BUYER: &str = "buyer@pharmacy.test";

    fn add_command() -> Command {
        Command::Add {
            id: "MED-1".to_string(),
            owner: SELLER.to_string(),
            owner_name: "City Pharmacy".to_string(),
            name: "Amoxicillin 500mg".to_string(),
            batch_number: "B-101".to_string(),
            quantity: 50,
            expiry_date: NaiveDate::from_ymd_opt(2026, 1, 20).unwrap(),
            condition: Some("Sealed".to_string()),
        }
    }

    async fn given(commands: Vec<Command>) -> Medicine {
        let mut medicine = Medicine::default();
        for command in commands {
            let events = medicine
                .handle(command, &Services::default())
                .await
                .unwrap();
            for event in events {
                medicine.apply(event);
            }
        }
        medicine
    }

    fn request_command() -> Command {
        Command::RequestRedistribution {
            request_id: "REQ-1".to_string(),
            requested_by: BUYER.to_string(),
        }
    }

    fn list_command() -> Command {
        Command::ListForRedistribution {
            requested_by: SELLER.to_string(),
        }
    }

    #[tokio::test]
    async fn added_batch_starts_active_and_unlisted() {
        let medicine = given(vec![add_command()]).await;
        assert_eq!(medicine.status, MedicineStatus::Active);
        assert_eq!(medicine.redistribution, RedistributionStatus::None);
        assert_eq!(medicine.owner, SELLER);
    }

    #[tokio::test]
    async fn adding_twice_is_rejected() {
        let medicine = given(vec![add_command()]).await;
        let err = medicine
            .handle(add_command(), &Services::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Uniqueness { .. }));
    }

    #[tokio::test]
    async fn zero_quantity_is_rejected() {
        let err = Medicine::default()
            .handle(
                Command::Add {
                    id: "MED-2".to_string(),
                    owner: SELLER.to_string(),
                    owner_name: "City Pharmacy".to_string(),
                    name: "Paracetamol".to_string(),
                    batch_number: "P-200".to_string(),
                    quantity: 0,
                    expiry_date: NaiveDate::from_ymd_opt(2026, 4, 10).unwrap(),
                    condition: None,
                },
                &Services::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[tokio::test]
    async fn only_the_owner_can_list() {
        let medicine = given(vec![add_command()]).await;
        let err = medicine
            .handle(
                Command::ListForRedistribution {
                    requested_by: BUYER.to_string(),
                },
                &Services::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden));
    }

    #[tokio::test]
    async fn requesting_an_unlisted_batch_is_rejected() {
        let medicine = given(vec![add_command()]).await;
        let err = medicine
            .handle(request_command(), &Services::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidStateTransition { .. }));
    }

    #[tokio::test]
    async fn owner_cannot_request_own_stock() {
        let medicine = given(vec![add_command(), list_command()]).await;
        let err = medicine
            .handle(
                Command::RequestRedistribution {
                    request_id: "REQ-1".to_string(),
                    requested_by: SELLER.to_string(),
                },
                &Services::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[tokio::test]
    async fn a_held_batch_takes_no_second_request() {
        let medicine = given(vec![add_command(), list_command(), request_command()]).await;
        assert_eq!(medicine.redistribution, RedistributionStatus::Requested);
        assert_eq!(medicine.pending_request.as_deref(), Some("REQ-1"));

        let err = medicine
            .handle(
                Command::RequestRedistribution {
                    request_id: "REQ-2".to_string(),
                    requested_by: "other@pharmacy.test".to_string(),
                },
                &Services::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidStateTransition { .. }));
    }

    #[tokio::test]
    async fn transfer_reassigns_owner_and_clears_the_listing() {
        let medicine = given(vec![
            add_command(),
            list_command(),
            request_command(),
            Command::TransferOwnership {
                new_owner: BUYER.to_string(),
                new_owner_name: "Buyer Pharmacy".to_string(),
            },
        ])
        .await;

        assert_eq!(medicine.owner, BUYER);
        assert_eq!(medicine.redistribution, RedistributionStatus::None);
        assert_eq!(medicine.pending_request, None);
        assert_eq!(medicine.status, MedicineStatus::Active);
    }

    #[tokio::test]
    async fn release_returns_the_batch_to_the_market() {
        let medicine = given(vec![
            add_command(),
            list_command(),
            request_command(),
            Command::ReleaseRedistribution,
        ])
        .await;

        assert_eq!(medicine.owner, SELLER);
        assert_eq!(medicine.redistribution, RedistributionStatus::Available);
        assert_eq!(medicine.pending_request, None);
    }

    #[tokio::test]
    async fn transfer_without_a_pending_request_is_rejected() {
        let medicine = given(vec![add_command(), list_command()]).await;
        let err = medicine
            .handle(
                Command::TransferOwnership {
                    new_owner: BUYER.to_string(),
                    new_owner_name: "Buyer Pharmacy".to_string(),
                },
                &Services::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidStateTransition { .. }));
    }

    #[tokio::test]
    async fn a_listed_batch_cannot_be_sold() {
        let medicine = given(vec![add_command(), list_command()]).await;
        let err = medicine
            .handle(
                Command::MarkSold {
                    requested_by: SELLER.to_string(),
                },
                &Services::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidStateTransition { .. }));
    }

    #[tokio::test]
    async fn expiring_a_listed_batch_clears_the_listing() {
        let medicine = given(vec![
            add_command(),
            list_command(),
            Command::MarkExpired {
                requested_by: SELLER.to_string(),
            },
        ])
        .await;

        assert_eq!(medicine.status, MedicineStatus::Expired);
        assert_eq!(medicine.redistribution, RedistributionStatus::None);
    }

    #[tokio::test]
    async fn a_held_batch_cannot_be_expired() {
        let medicine = given(vec![add_command(), list_command(), request_command()]).await;
        let err = medicine
            .handle(
                Command::MarkExpired {
                    requested_by: SELLER.to_string(),
                },
                &Services::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidStateTransition { .. }));
    }
}
