use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use domain::{
    medicines::{
        self,
        inputs::{AddMedicineInput, UpdateStatusInput},
        Medicine, MedicineStatus,
    },
    risk::{self, RiskTier},
    users::Role,
};
use serde::Serialize;
use serde_json::json;
use ulid::Ulid;

use crate::{auth::AuthUser, error::ApiError, scan, state::AppState};

/// A batch as the dashboard sees it: stored fields plus the computed
/// risk classification.
#[derive(Serialize)]
pub struct InventoryItem {
    #[serde(flatten)]
    pub medicine: Medicine,
    pub days_left: i64,
    pub risk: RiskTier,
}

impl InventoryItem {
    pub fn classify(medicine: Medicine) -> Self {
        let today = Utc::now().date_naive();
        let days_left = risk::days_remaining(medicine.expiry_date, today);
        let risk = risk::classify(medicine.expiry_date, today);
        Self {
            medicine,
            days_left,
            risk,
        }
    }
}

pub async fn list_inventory(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let views: Vec<medicines::View> =
        scan::scan_views(&state.dynamodb, &medicines::cqrs::view_table()).await?;

    let mut items: Vec<InventoryItem> = views
        .into_iter()
        .filter(|v| v.medicine.owner == user.email)
        .map(|v| InventoryItem::classify(v.medicine))
        .collect();
    items.sort_by_key(|item| item.days_left);

    Ok(Json(items))
}

pub async fn add_medicine(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<AddMedicineInput>,
) -> Result<impl IntoResponse, ApiError> {
    let aggregate_id = Ulid::new().to_string();

    let mut metadata = HashMap::new();
    metadata.insert("command_id".to_string(), Ulid::new().to_string());

    let command = medicines::Command::Add {
        id: aggregate_id.clone(),
        owner: user.email,
        owner_name: user.username,
        name: input.name,
        batch_number: input.batch_number,
        quantity: input.quantity,
        expiry_date: input.expiry_date,
        condition: input.condition,
    };

    state
        .medicines_cqrs
        .execute_with_metadata(&aggregate_id, command, metadata)
        .await?;

    let view = state
        .medicines_repo
        .load(&aggregate_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Medicine not found".to_string()))?;

    Ok((StatusCode::CREATED, Json(InventoryItem::classify(view.medicine))))
}

pub async fn get_medicine(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .medicines_repo
        .load(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Medicine not found".to_string()))?;

    if view.medicine.owner != user.email && user.role != Role::Admin {
        return Err(ApiError::Forbidden("Not your stock".to_string()));
    }

    Ok(Json(InventoryItem::classify(view.medicine)))
}

pub async fn update_status(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<UpdateStatusInput>,
) -> Result<impl IntoResponse, ApiError> {
    let command = match input.status {
        MedicineStatus::Sold => medicines::Command::MarkSold {
            requested_by: user.email,
        },
        MedicineStatus::Expired => medicines::Command::MarkExpired {
            requested_by: user.email,
        },
        MedicineStatus::Active => {
            return Err(ApiError::Validation(
                "Cannot return a batch to active".to_string(),
            ))
        }
    };

    let mut metadata = HashMap::new();
    metadata.insert("command_id".to_string(), Ulid::new().to_string());

    state
        .medicines_cqrs
        .execute_with_metadata(&id, command, metadata)
        .await?;

    Ok(Json(json!({ "msg": "Status updated" })))
}
