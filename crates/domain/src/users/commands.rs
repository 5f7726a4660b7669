use serde::{Deserialize, Serialize};

use super::aggregate::Role;

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub enum Command {
    /// Register a new account. The aggregate id is the email address, so a
    /// duplicate registration fails at the event store before any event is
    /// committed.
    Register {
        email: String,
        username: String,
        password_hash: String,
        role: Role,
    },
}
