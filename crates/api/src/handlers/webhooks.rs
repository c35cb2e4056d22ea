//! Identity provider webhook intake.
//!
//! Deliveries are signed (`svix-id`, `svix-timestamp`, `svix-signature`);
//! the signature covers the raw body, so it is verified before parsing.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use playlistfox_core::audit::{actions, entity_types};
use playlistfox_core::error::CoreError;
use playlistfox_db::models::audit::CreateAuditLog;
use playlistfox_db::models::user::UpsertUser;
use playlistfox_db::repositories::UserRepo;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::handlers::audit::{self, snapshot};
use crate::response::DataResponse;
use crate::state::AppState;

const HEADER_ID: &str = "svix-id";
const HEADER_TIMESTAMP: &str = "svix-timestamp";
const HEADER_SIGNATURE: &str = "svix-signature";

/// Envelope of every delivery.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// `data` of `user.created` / `user.updated`.
#[derive(Debug, Deserialize)]
pub struct IdentityUser {
    pub id: String,
    #[serde(default)]
    pub email_addresses: Vec<EmailAddress>,
    #[serde(default)]
    pub primary_email_address_id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EmailAddress {
    pub id: String,
    pub email_address: String,
}

/// `data` of `user.deleted`.
#[derive(Debug, Deserialize)]
pub struct DeletedObject {
    pub id: Option<String>,
}

impl IdentityUser {
    fn primary_email(&self) -> Option<String> {
        let primary = self.primary_email_address_id.as_deref();
        self.email_addresses
            .iter()
            .find(|e| Some(e.id.as_str()) == primary)
            .or_else(|| self.email_addresses.first())
            .map(|e| e.email_address.clone())
    }

    fn display_name(&self) -> Option<String> {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if full.is_empty() {
            self.username.clone()
        } else {
            Some(full)
        }
    }

    fn to_upsert(&self) -> UpsertUser {
        UpsertUser {
            external_id: self.id.clone(),
            email: self.primary_email(),
            display_name: self.display_name(),
            avatar_url: self.image_url.clone(),
        }
    }
}

/// Acknowledgement returned for every accepted delivery.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub event: String,
    pub handled: bool,
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> AppResult<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest(format!("Missing {name} header")))
}

/// POST /api/v1/webhooks/identity
///
/// Handles `user.created`, `user.updated`, and `user.deleted`; other event
/// types are acknowledged with `handled: false`.
pub async fn identity_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<DataResponse<WebhookAck>>> {
    let msg_id = header(&headers, HEADER_ID)?;
    let timestamp = header(&headers, HEADER_TIMESTAMP)?;
    let signature = header(&headers, HEADER_SIGNATURE)?;

    state
        .webhooks
        .verify(msg_id, timestamp, signature, &body, Utc::now())
        .map_err(|e| {
            tracing::warn!(msg_id, error = %e, "Webhook signature rejected");
            AppError::Core(CoreError::Unauthorized(e.to_string()))
        })?;

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid webhook payload: {e}")))?;

    let handled = match event.kind.as_str() {
        "user.created" | "user.updated" => {
            handle_user_upsert(&state, &event).await?;
            true
        }
        "user.deleted" => {
            handle_user_deleted(&state, &event).await?;
            true
        }
        other => {
            tracing::debug!(msg_id, event = other, "Ignoring webhook event");
            false
        }
    };

    Ok(Json(DataResponse {
        data: WebhookAck {
            event: event.kind,
            handled,
        },
    }))
}

async fn handle_user_upsert(state: &AppState, event: &WebhookEvent) -> AppResult<()> {
    let payload: IdentityUser = serde_json::from_value(event.data.clone())
        .map_err(|e| AppError::BadRequest(format!("Invalid user payload: {e}")))?;

    let previous = UserRepo::find_by_external_id(&state.pool, &payload.id).await?;
    let user = UserRepo::upsert(&state.pool, &payload.to_upsert()).await?;

    let action = if previous.is_some() {
        actions::UPDATE
    } else {
        actions::CREATE
    };
    tracing::info!(user_id = user.id, external_id = %user.external_id, action, "User synced from webhook");

    audit::record(
        &state.pool,
        CreateAuditLog {
            user_id: Some(user.id),
            action,
            entity_type: entity_types::USER,
            entity_id: Some(user.id),
            old_values: previous.as_ref().and_then(snapshot),
            new_values: snapshot(&user),
        },
    )
    .await;
    Ok(())
}

async fn handle_user_deleted(state: &AppState, event: &WebhookEvent) -> AppResult<()> {
    let payload: DeletedObject = serde_json::from_value(event.data.clone())
        .map_err(|e| AppError::BadRequest(format!("Invalid user payload: {e}")))?;
    let Some(external_id) = payload.id.filter(|id| !id.is_empty()) else {
        return Err(AppError::BadRequest("user.deleted payload has no id".into()));
    };

    match UserRepo::soft_delete_by_external_id(&state.pool, &external_id).await? {
        Some(user) => {
            tracing::info!(user_id = user.id, external_id = %external_id, "User soft-deleted from webhook");
            audit::record(
                &state.pool,
                CreateAuditLog {
                    user_id: Some(user.id),
                    action: actions::DELETE,
                    entity_type: entity_types::USER,
                    entity_id: Some(user.id),
                    old_values: snapshot(&user),
                    new_values: None,
                },
            )
            .await;
        }
        None => {
            tracing::debug!(external_id = %external_id, "user.deleted for unknown user");
        }
    }
    Ok(())
}
