use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub enum Command {
    /// Open a pending request against a listed batch
    Open {
        id: String,
        medicine_id: String,
        medicine_name: String,
        quantity: u32,
        seller: String,
        buyer: String,
        buyer_name: String,
    },

    /// Seller accepts; ownership moves to the buyer
    Accept {
        responded_by: String,
    },

    /// Seller rejects; the batch goes back to the market
    Reject {
        responded_by: String,
    },
}
