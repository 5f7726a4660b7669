use derive_new::new;
use serde::{Deserialize, Serialize};

/// Envelope for a committed domain event as it travels the event pipeline
/// (event-log stream -> publisher -> Kinesis -> projectors).
///
/// `payload` and `metadata` carry the JSON the event store persisted;
/// consumers that care about the content deserialize `payload` into the
/// matching aggregate's event enum.
#[derive(Clone, Debug, Serialize, Deserialize, new)]
pub struct DomainEvent {
    /// Aggregate id the event belongs to.
    pub id: String,
    pub aggregate_type: String,
    /// Position within the aggregate's event sequence.
    pub sequence: usize,
    pub event_type: String,
    pub event_version: String,
    pub payload: String,
    pub metadata: String,
}
