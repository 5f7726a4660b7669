use std::env;

/// Events per aggregate between snapshots.
pub const SNAPSHOT_SIZE: usize = 5;

/// All aggregates share one event log; the partition key includes the
/// aggregate type.
pub fn event_log_table() -> String {
    env::var("DYNAMODB_EVENT_LOG_TABLE").unwrap_or("medshare-event-log".to_string())
}

pub fn event_snapshots_table() -> String {
    env::var("DYNAMODB_EVENT_SNAPSHOTS_TABLE").unwrap_or("medshare-event-snapshots".to_string())
}
