use aws_sdk_dynamodb::Client;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Attribute the view repository keeps the serialized view under.
const PAYLOAD_ATTRIBUTE: &str = "Payload";

/// Scan a view table and decode every row's payload.
///
/// The view repositories load by key only; the listing endpoints need the
/// whole table. Rows that fail to decode are logged and skipped so one bad
/// row cannot take a listing down.
pub async fn scan_views<V: DeserializeOwned>(
    client: &Client,
    table: &str,
) -> Result<Vec<V>, ApiError> {
    let mut views = Vec::new();

    let mut pages = client.scan().table_name(table).into_paginator().send();
    while let Some(page) = pages.next().await {
        let page = page.map_err(|e| ApiError::Internal(e.to_string()))?;
        for item in page.items() {
            let Some(payload) = item.get(PAYLOAD_ATTRIBUTE).and_then(|v| v.as_b().ok()) else {
                tracing::warn!("Row without payload in {}", table);
                continue;
            };
            match serde_json::from_slice::<V>(payload.as_ref()) {
                Ok(view) => views.push(view),
                Err(e) => tracing::warn!("Undecodable row in {}: {}", table, e),
            }
        }
    }

    Ok(views)
}
