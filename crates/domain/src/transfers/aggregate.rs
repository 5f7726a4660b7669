use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cqrs_es::Aggregate;
use serde::{Deserialize, Serialize};

use crate::errors::Error;

use super::{Command, Event};

/// Transfer request status; mutated exactly once after opening
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl Default for RequestStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl RequestStatus {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

/// Transfer request aggregate linking a batch, its owner and a requester.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct TransferRequest {
    pub id: String,
    pub medicine_id: String,
    pub medicine_name: String,
    /// Batch quantity snapshot taken when the request was opened
    pub quantity: u32,
    pub seller: String,
    pub buyer: String,
    pub buyer_name: String,
    pub status: RequestStatus,
    pub requested_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const AGGREGATE_TYPE: &str = "Transfer";

#[derive(Clone, Default)]
pub struct Services {}

#[async_trait]
impl Aggregate for TransferRequest {
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
            Command::Open {
                id,
                medicine_id,
                medicine_name,
                quantity,
                seller,
                buyer,
                buyer_name,
            } => {
                self.validate_new()?;
                if buyer == seller {
                    return Err(Error::Validation {
                        message: "Cannot request your own stock".to_string(),
                    });
                }

                Ok(vec![Event::RequestOpened {
                    id,
                    medicine_id,
                    medicine_name,
                    quantity,
                    seller,
                    buyer,
                    buyer_name,
                    requested_at: Utc::now(),
                }])
            }

            Command::Accept { responded_by } => {
                self.validate_existing()?;
                self.validate_can_respond(&responded_by, "accepted")?;

                Ok(vec![Event::RequestAccepted {
                    id: self.id.clone(),
                    medicine_id: self.medicine_id.clone(),
                    medicine_name: self.medicine_name.clone(),
                    quantity: self.quantity,
                    updated_at: Utc::now(),
                }])
            }

            Command::Reject { responded_by } => {
                self.validate_existing()?;
                self.validate_can_respond(&responded_by, "rejected")?;

                Ok(vec![Event::RequestRejected {
                    id: self.id.clone(),
                    updated_at: Utc::now(),
                }])
            }
        }
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            Event::RequestOpened {
                id,
                medicine_id,
                medicine_name,
                quantity,
                seller,
                buyer,
                buyer_name,
                requested_at,
            } => {
                self.id = id;
                self.medicine_id = medicine_id;
                self.medicine_name = medicine_name;
                self.quantity = quantity;
                self.seller = seller;
                self.buyer = buyer;
                self.buyer_name = buyer_name;
                self.status = RequestStatus::Pending;
                self.requested_at = requested_at;
                self.updated_at = requested_at;
            }

            Event::RequestAccepted { updated_at, .. } => {
                self.status = RequestStatus::Accepted;
                self.updated_at = updated_at;
            }

            Event::RequestRejected { updated_at, .. } => {
                self.status = RequestStatus::Rejected;
                self.updated_at = updated_at;
            }
        }
    }
}

impl TransferRequest {
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

    /// Only the seller may respond, and only while the request is pending.
    fn validate_can_respond(&self, responded_by: &str, to: &str) -> Result<(), Error> {
        if responded_by != self.seller {
            return Err(Error::Forbidden);
        }
        if self.status != RequestStatus::Pending {
            return Err(Error::InvalidStateTransition {
                from: self.status.as_str().to_string(),
                to: to.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SELLER: &str = "seller@pharmacy.test";
    const BUYER: &str = "buyer@pharmacy.test";

    fn open_command() -> Command {
        Command::Open {
            id: "REQ-1".to_string(),
            medicine_id: "MED-1".to_string(),
            medicine_name: "Amoxicillin 500mg".to_string(),
            quantity: 50,
            seller: SELLER.to_string(),
            buyer: BUYER.to_string(),
            buyer_name: "Buyer Pharmacy".to_string(),
        }
    }

    async fn given(commands: Vec<Command>) -> TransferRequest {
        let mut request = TransferRequest::default();
        for command in commands {
            let events = request.handle(command, &Services::default()).await.unwrap();
            for event in events {
                request.apply(event);
            }
        }
        request
    }

    #[tokio::test]
    async fn opened_request_is_pending() {
        let request = given(vec![open_command()]).await;
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.seller, SELLER);
        assert_eq!(request.buyer, BUYER);
    }

    #[tokio::test]
    async fn self_request_is_rejected() {
        let err = TransferRequest::default()
            .handle(
                Command::Open {
                    id: "REQ-1".to_string(),
                    medicine_id: "MED-1".to_string(),
                    medicine_name: "Amoxicillin 500mg".to_string(),
                    quantity: 50,
                    seller: SELLER.to_string(),
                    buyer: SELLER.to_string(),
                    buyer_name: "City Pharmacy".to_string(),
                },
                &Services::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[tokio::test]
    async fn accept_records_the_batch_identity() {
        let request = given(vec![open_command()]).await;
        let events = request
            .handle(
                Command::Accept {
                    responded_by: SELLER.to_string(),
                },
                &Services::default(),
            )
            .await
            .unwrap();

        assert!(matches!(
            &events[..],
            [Event::RequestAccepted { medicine_id, quantity: 50, .. }] if medicine_id == "MED-1"
        ));
    }

    #[tokio::test]
    async fn only_the_seller_can_respond() {
        let request = given(vec![open_command()]).await;
        let err = request
            .handle(
                Command::Accept {
                    responded_by: BUYER.to_string(),
                },
                &Services::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden));
    }

    #[tokio::test]
    async fn a_resolved_request_takes_no_second_response() {
        let request = given(vec![
            open_command(),
            Command::Reject {
                responded_by: SELLER.to_string(),
            },
        ])
        .await;
        assert_eq!(request.status, RequestStatus::Rejected);

        let err = request
            .handle(
                Command::Accept {
                    responded_by: SELLER.to_string(),
                },
                &Services::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidStateTransition { .. }));
    }
}
