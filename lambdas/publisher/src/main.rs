//! Relays committed events from the event-log table's DynamoDB stream to the
//! Kinesis event stream consumed by the projectors.
//!
//! Only INSERTs are published (the event log is append-only; anything else on
//! the stream is table maintenance). The partition key is the log's
//! `AggregateTypeAndId` so one aggregate's events land on one shard, in
//! order.

use aws_config::BehaviorVersion;
use aws_lambda_events::{
    dynamodb::{Event, EventRecord},
    streams::{DynamoDbBatchItemFailure, DynamoDbEventResponse},
};
use aws_sdk_kinesis::primitives::Blob;
use domain::DomainEvent;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde::{Deserialize, Serialize};

/// Row shape of the dynamo-es event log.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EventLogRecord {
    aggregate_type_and_id: String,
    event_type: String,
    aggregate_id: String,
    aggregate_type: String,
    #[serde(with = "serde_bytes")]
    metadata: Vec<u8>,
    #[serde(with = "serde_bytes")]
    payload: Vec<u8>,
    event_version: String,
    aggregate_id_sequence: usize,
}

impl EventLogRecord {
    fn into_domain_event(self) -> Result<DomainEvent, String> {
        let payload = String::from_utf8(self.payload)
            .map_err(|e| format!("Invalid payload UTF-8: {}", e))?;
        let metadata = String::from_utf8(self.metadata)
            .map_err(|e| format!("Invalid metadata UTF-8: {}", e))?;

        Ok(DomainEvent::new(
            self.aggregate_id,
            self.aggregate_type,
            self.aggregate_id_sequence,
            self.event_type,
            self.event_version,
            payload,
            metadata,
        ))
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
    let kinesis_client = aws_sdk_kinesis::Client::new(&config);

    lambda_runtime::run(service_fn(|event: LambdaEvent<Event>| async {
        handle(event, &kinesis_client).await
    }))
    .await
}

async fn handle(
    event: LambdaEvent<Event>,
    kinesis_client: &aws_sdk_kinesis::Client,
) -> Result<DynamoDbEventResponse, Error> {
    let stream_name = std::env::var("EVENT_STREAM_NAME")?;

    let inserts = event
        .payload
        .records
        .iter()
        .filter(|r| r.event_name == "INSERT")
        .count();
    tracing::info!(
        "Processing {} stream records ({} inserts)",
        event.payload.records.len(),
        inserts
    );

    let mut batch_item_failures = Vec::new();

    for record in event.payload.records.iter() {
        if record.event_name != "INSERT" {
            continue;
        }

        if let Err(e) = publish_record(record, kinesis_client, &stream_name).await {
            tracing::error!("Failed to publish {}: {}", record.event_id, e);
            batch_item_failures.push(DynamoDbBatchItemFailure {
                item_identifier: Some(record.event_id.clone()),
            });
        }
    }

    Ok(DynamoDbEventResponse {
        batch_item_failures,
    })
}

async fn publish_record(
    record: &EventRecord,
    kinesis_client: &aws_sdk_kinesis::Client,
    stream_name: &str,
) -> Result<(), Error> {
    let item = &record.change.new_image;
    let event_log: EventLogRecord = serde_dynamo::from_item(item.clone())?;
    let partition_key = event_log.aggregate_type_and_id.clone();
    let domain_event = event_log.into_domain_event()?;

    tracing::info!(
        "Publishing {} #{} for {}",
        domain_event.event_type,
        domain_event.sequence,
        domain_event.id
    );

    let data = serde_json::to_string(&domain_event)?;

    kinesis_client
        .put_record()
        .stream_name(stream_name)
        .partition_key(partition_key)
        .data(Blob::new(data))
        .send()
        .await?;

    Ok(())
}
