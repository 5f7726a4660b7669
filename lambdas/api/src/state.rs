use domain::{medicines, transfers, users};

use crate::auth::TokenKey;

#[derive(Clone)]
pub struct AppState {
    pub dynamodb: aws_sdk_dynamodb::Client,

    pub users_repo: users::cqrs::Repo,
    pub users_cqrs: users::cqrs::Cqrs,

    pub medicines_repo: medicines::cqrs::Repo,
    pub medicines_cqrs: medicines::cqrs::Cqrs,

    pub transfers_repo: transfers::cqrs::Repo,
    pub transfers_cqrs: transfers::cqrs::Cqrs,

    pub token_key: TokenKey,
}
