use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use domain::{
    medicines,
    transfers::{
        self,
        inputs::{RespondInput, ResponseAction},
        RequestStatus, TransferRequest,
    },
    users::Role,
};
use serde_json::json;
use ulid::Ulid;

use crate::{auth::AuthUser, error::ApiError, scan, state::AppState};

/// Pending requests addressed to the caller (all of them for admins),
/// oldest first.
pub async fn pending(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let views: Vec<transfers::View> =
        scan::scan_views(&state.dynamodb, &transfers::cqrs::view_table()).await?;

    let mut requests: Vec<TransferRequest> = views
        .into_iter()
        .map(|v| v.request)
        .filter(|r| r.status == RequestStatus::Pending)
        .filter(|r| r.seller == user.email || user.role == Role::Admin)
        .collect();
    requests.sort_by_key(|r| r.requested_at);

    Ok(Json(requests))
}

/// Seller's response. Accepting hands the batch to the buyer; rejecting
/// releases it back to the market.
///
/// The request and the medicine are updated by two independent writes with
/// no cross-aggregate transaction; the request resolves first.
pub async fn respond(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<RespondInput>,
) -> Result<impl IntoResponse, ApiError> {
    let request = state
        .transfers_repo
        .load(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Request not found".to_string()))?
        .request;

    let mut metadata = HashMap::new();
    metadata.insert("command_id".to_string(), Ulid::new().to_string());

    match input.status {
        ResponseAction::Accepted => {
            state
                .transfers_cqrs
                .execute_with_metadata(
                    &id,
                    transfers::Command::Accept {
                        responded_by: user.email,
                    },
                    metadata.clone(),
                )
                .await?;

            state
                .medicines_cqrs
                .execute_with_metadata(
                    &request.medicine_id,
                    medicines::Command::TransferOwnership {
                        new_owner: request.buyer,
                        new_owner_name: request.buyer_name,
                    },
                    metadata,
                )
                .await?;

            Ok(Json(json!({ "msg": "Request accepted" })))
        }

        ResponseAction::Rejected => {
            state
                .transfers_cqrs
                .execute_with_metadata(
                    &id,
                    transfers::Command::Reject {
                        responded_by: user.email,
                    },
                    metadata.clone(),
                )
                .await?;

            state
                .medicines_cqrs
                .execute_with_metadata(
                    &request.medicine_id,
                    medicines::Command::ReleaseRedistribution,
                    metadata,
                )
                .await?;

            Ok(Json(json!({ "msg": "Request rejected" })))
        }
    }
}
