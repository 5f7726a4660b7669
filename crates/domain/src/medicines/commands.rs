use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub enum Command {
    /// Add a new batch to the owner's inventory
    Add {
        id: String,
        owner: String,
        owner_name: String,
        name: String,
        batch_number: String,
        quantity: u32,
        expiry_date: NaiveDate,
        condition: Option<String>,
    },

    /// Put the batch on the surplus marketplace
    ListForRedistribution {
        requested_by: String,
    },

    /// Put a hold on a listed batch while a transfer request is pending
    RequestRedistribution {
        request_id: String,
        requested_by: String,
    },

    /// Release a held batch back to the marketplace (request rejected)
    ReleaseRedistribution,

    /// Hand the batch to the requester (request accepted)
    TransferOwnership {
        new_owner: String,
        new_owner_name: String,
    },

    /// Close out a batch that was dispensed or sold locally
    MarkSold {
        requested_by: String,
    },

    /// Close out a batch past its expiry date
    MarkExpired {
        requested_by: String,
    },
}
