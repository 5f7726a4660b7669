/// Registration and login
pub mod auth;

/// Own-inventory endpoints
pub mod inventory;

/// Marketplace listing and requests
pub mod redistribute;

/// Pending-request approvals
pub mod transactions;
