//! Demand analytics projector.
//!
//! Consumes domain events from the Kinesis stream; every accepted transfer
//! bumps a per-medicine monthly demand counter, then the medicine's demand
//! series is refit with least squares and the next-month forecast stored
//! alongside the counters.

use aws_config::BehaviorVersion;
use aws_lambda_events::{
    kinesis::{KinesisEvent, KinesisEventRecord},
    streams::{KinesisBatchItemFailure, KinesisEventResponse},
};
use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, Datelike, Utc};
use domain::{transfers, DomainEvent};
use lambda_runtime::{service_fn, Error, LambdaEvent};

mod forecast;

/// Sort key reserved for the forecast item; observed months start at the
/// month index of year 1.
const FORECAST_MONTH: i64 = 0;

fn demand_table() -> String {
    std::env::var("DYNAMODB_DEMAND_TABLE").unwrap_or("medshare-demand-view".to_string())
}

/// Months since year zero, so indexes stay comparable across year ends.
fn month_index(at: DateTime<Utc>) -> i64 {
    i64::from(at.year()) * 12 + i64::from(at.month0())
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
    let dynamodb_client = aws_sdk_dynamodb::Client::new(&config);

    lambda_runtime::run(service_fn(|event: LambdaEvent<KinesisEvent>| async {
        handle(event, &dynamodb_client).await
    }))
    .await
}

async fn handle(
    event: LambdaEvent<KinesisEvent>,
    dynamodb_client: &aws_sdk_dynamodb::Client,
) -> Result<KinesisEventResponse, Error> {
    tracing::info!("Processing {} Kinesis records", event.payload.records.len());

    let mut batch_item_failures = Vec::new();

    for record in event.payload.records.iter() {
        let sequence = record.kinesis.sequence_number.clone();

        if let Err(e) = handle_record(record, dynamodb_client).await {
            tracing::error!("Failed to process: {}", e);
            batch_item_failures.push(KinesisBatchItemFailure {
                item_identifier: sequence,
            });
        }
    }

    Ok(KinesisEventResponse {
        batch_item_failures,
    })
}

async fn handle_record(
    record: &KinesisEventRecord,
    dynamodb_client: &aws_sdk_dynamodb::Client,
) -> Result<(), Error> {
    let data = std::str::from_utf8(&record.kinesis.data)?;
    let event: DomainEvent = serde_json::from_str(data)?;

    if event.event_type != "Transfer:RequestAccepted" {
        return Ok(());
    }

    let payload: transfers::Event = serde_json::from_str(&event.payload)?;
    let transfers::Event::RequestAccepted {
        medicine_name,
        quantity,
        updated_at,
        ..
    } = payload
    else {
        return Ok(());
    };

    let table = demand_table();
    let month = month_index(updated_at);

    tracing::info!(
        "Recording demand of {} x {} for {}-{:02}",
        quantity,
        medicine_name,
        updated_at.year(),
        updated_at.month()
    );

    record_demand(dynamodb_client, &table, &medicine_name, month, quantity).await?;
    refresh_forecast(dynamodb_client, &table, &medicine_name).await?;

    Ok(())
}

async fn record_demand(
    client: &aws_sdk_dynamodb::Client,
    table: &str,
    medicine_name: &str,
    month: i64,
    quantity: u32,
) -> Result<(), Error> {
    client
        .update_item()
        .table_name(table)
        .key("MedicineName", AttributeValue::S(medicine_name.to_string()))
        .key("MonthIndex", AttributeValue::N(month.to_string()))
        .update_expression("ADD Quantity :q")
        .expression_attribute_values(":q", AttributeValue::N(quantity.to_string()))
        .send()
        .await?;

    Ok(())
}

/// Refit the medicine's monthly series and store the next-month forecast.
async fn refresh_forecast(
    client: &aws_sdk_dynamodb::Client,
    table: &str,
    medicine_name: &str,
) -> Result<(), Error> {
    let output = client
        .query()
        .table_name(table)
        .key_condition_expression("MedicineName = :name AND MonthIndex > :forecast")
        .expression_attribute_values(":name", AttributeValue::S(medicine_name.to_string()))
        .expression_attribute_values(":forecast", AttributeValue::N(FORECAST_MONTH.to_string()))
        .send()
        .await?;

    let points: Vec<(f64, f64)> = output
        .items()
        .iter()
        .filter_map(|item| {
            let month = item.get("MonthIndex")?.as_n().ok()?.parse::<f64>().ok()?;
            let quantity = item.get("Quantity")?.as_n().ok()?.parse::<f64>().ok()?;
            Some((month, quantity))
        })
        .collect();

    let Some(predicted) = forecast::forecast_next(&points) else {
        tracing::info!(
            "Not enough demand history for {} ({} months)",
            medicine_name,
            points.len()
        );
        return Ok(());
    };

    client
        .put_item()
        .table_name(table)
        .item("MedicineName", AttributeValue::S(medicine_name.to_string()))
        .item("MonthIndex", AttributeValue::N(FORECAST_MONTH.to_string()))
        .item(
            "ForecastQuantity",
            AttributeValue::N(format!("{:.1}", predicted)),
        )
        .item("UpdatedAt", AttributeValue::S(Utc::now().to_rfc3339()))
        .send()
        .await?;

    tracing::info!(
        "Forecast for {}: {:.1} units next month",
        medicine_name,
        predicted
    );

    Ok(())
}
