use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use domain::{
    medicines::{self, MedicineStatus, RedistributionStatus},
    risk::{self, RiskTier},
    transfers::{self, inputs::RequestTransferInput},
};
use serde::Serialize;
use serde_json::json;
use ulid::Ulid;

use crate::{auth::AuthUser, error::ApiError, scan, state::AppState};

/// A surplus batch as the marketplace shows it.
#[derive(Serialize)]
struct MarketItem {
    id: String,
    name: String,
    batch_number: String,
    quantity: u32,
    expiry_date: NaiveDate,
    days_left: i64,
    risk: RiskTier,
    condition: Option<String>,
    owner_name: String,
}

/// Put one of the caller's batches on the marketplace.
pub async fn list_medicine(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let mut metadata = HashMap::new();
    metadata.insert("command_id".to_string(), Ulid::new().to_string());

    let command = medicines::Command::ListForRedistribution {
        requested_by: user.email,
    };

    state
        .medicines_cqrs
        .execute_with_metadata(&id, command, metadata)
        .await?;

    Ok(Json(json!({ "msg": "Listed for redistribution" })))
}

/// Surplus batches from other owners, soonest expiry first.
pub async fn market(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let views: Vec<medicines::View> =
        scan::scan_views(&state.dynamodb, &medicines::cqrs::view_table()).await?;

    let today = Utc::now().date_naive();
    let mut items: Vec<MarketItem> = views
        .into_iter()
        .map(|v| v.medicine)
        .filter(|m| {
            m.redistribution == RedistributionStatus::Available
                && m.status == MedicineStatus::Active
                && m.owner != user.email
        })
        .map(|m| MarketItem {
            days_left: risk::days_remaining(m.expiry_date, today),
            risk: risk::classify(m.expiry_date, today),
            id: m.id,
            name: m.name,
            batch_number: m.batch_number,
            quantity: m.quantity,
            expiry_date: m.expiry_date,
            condition: m.condition,
            owner_name: m.owner_name,
        })
        .collect();
    items.sort_by_key(|item| item.days_left);

    Ok(Json(items))
}

/// Open a transfer request against a listed batch.
///
/// Two aggregate writes: the hold on the medicine, then the pending request.
/// There is no cross-aggregate transaction; the hold alone is what blocks
/// competing requests.
pub async fn request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<RequestTransferInput>,
) -> Result<impl IntoResponse, ApiError> {
    let medicine = state
        .medicines_repo
        .load(&input.medicine_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Medicine not found".to_string()))?
        .medicine;

    let request_id = Ulid::new().to_string();

    let mut metadata = HashMap::new();
    metadata.insert("command_id".to_string(), Ulid::new().to_string());

    let hold = medicines::Command::RequestRedistribution {
        request_id: request_id.clone(),
        requested_by: user.email.clone(),
    };

    state
        .medicines_cqrs
        .execute_with_metadata(&input.medicine_id, hold, metadata.clone())
        .await?;

    let open = transfers::Command::Open {
        id: request_id.clone(),
        medicine_id: medicine.id,
        medicine_name: medicine.name,
        quantity: medicine.quantity,
        seller: medicine.owner,
        buyer: user.email,
        buyer_name: user.username,
    };

    state
        .transfers_cqrs
        .execute_with_metadata(&request_id, open, metadata)
        .await?;

    let view = state
        .transfers_repo
        .load(&request_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Request not found".to_string()))?;

    Ok((StatusCode::CREATED, Json(view)))
}
