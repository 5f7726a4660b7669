use std::{env, sync::Arc};

use cqrs_es::{
    persist::{PersistedEventStore, ViewRepository},
    CqrsFramework,
};
use dynamo_es::{DynamoEventRepository, DynamoViewRepository};

use crate::cqrs::{event_log_table, event_snapshots_table, SNAPSHOT_SIZE};

use super::{Query, Services, User, View};

pub type Repo = Arc<Box<dyn ViewRepository<View, User>>>;
pub type Cqrs = Arc<CqrsFramework<User, PersistedEventStore<DynamoEventRepository, User>>>;

pub fn view_table() -> String {
    env::var("DYNAMODB_USERS_VIEW_TABLE").unwrap_or("medshare-users-view".to_string())
}

pub fn init(client: aws_sdk_dynamodb::Client, repo: Repo) -> Cqrs {
    let store: PersistedEventStore<DynamoEventRepository, User> =
        PersistedEventStore::new_snapshot_store(
            DynamoEventRepository::new(client)
                .with_tables(&event_log_table(), &event_snapshots_table()),
            SNAPSHOT_SIZE,
        );

    let query = Box::new(Query::new(repo));

    Arc::new(CqrsFramework::new(store, vec![query], Services::default()))
}

pub fn init_repo(client: aws_sdk_dynamodb::Client) -> Repo {
    Arc::new(Box::new(DynamoViewRepository::new(&view_table(), client)))
}
