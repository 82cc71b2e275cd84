//! `/api/ticket` handlers.

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use serde_json::{Value, json};

use super::error::ApiError;
use super::extract::{AdminUser, ApiJson, ApiPath, ApiQuery, AuthUser};
use super::state::AppState;
use crate::error::ServiceError;
use crate::tickets::{
    CreateTicketInput, DeleteRestoreAction, Stage, SubTicketInput, TicketFilter,
    UpdateTicketInput,
};

type ApiResult = Result<Json<Value>, ApiError>;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    stage: Option<String>,
    #[serde(alias = "isTrashed")]
    trashed: Option<String>,
    search: Option<String>,
}

impl ListQuery {
    fn into_filter(self) -> Result<TicketFilter, ServiceError> {
        let stage = match self.stage.as_deref().map(str::trim) {
            None | Some("" | "all") => None,
            Some(raw) => Some(
                raw.parse::<Stage>()
                    .map_err(|e| ServiceError::validation(e.to_string()))?,
            ),
        };
        let trashed = matches!(
            self.trashed.as_deref().map(str::trim),
            Some("true" | "1" | "yes")
        );
        Ok(TicketFilter {
            stage,
            trashed,
            search: self.search,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionQuery {
    action_type: String,
}

impl ActionQuery {
    fn action(&self) -> Result<DeleteRestoreAction, ServiceError> {
        self.action_type
            .parse()
            .map_err(|e: crate::tickets::ParseEnumError| ServiceError::validation(e.to_string()))
    }
}

pub async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(input): ApiJson<CreateTicketInput>,
) -> ApiResult {
    let ticket_id = state.tickets.create_ticket(input).await?;
    Ok(Json(json!({
        "status": true,
        "ticketId": ticket_id,
        "message": "Ticket created successfully.",
    })))
}

pub async fn duplicate(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult {
    let ticket_id = state.tickets.duplicate_ticket(id).await?;
    Ok(Json(json!({
        "status": true,
        "ticketId": ticket_id,
        "message": "Ticket duplicated successfully.",
    })))
}

pub async fn dashboard(State(state): State<AppState>, _user: AuthUser) -> ApiResult {
    let summary = state.tickets.dashboard_statistics().await?;
    Ok(Json(json!({
        "status": true,
        "totalTickets": summary.total_tickets,
        "groupedByStage": summary.grouped_by_stage,
        "groupedByPriority": summary.grouped_by_priority,
        "recentTickets": summary.recent_tickets,
    })))
}

pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult {
    let filter = query.into_filter()?;
    let tickets = state.tickets.list_tickets(&filter).await?;
    Ok(Json(json!({ "status": true, "tickets": tickets })))
}

pub async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult {
    let ticket = state.tickets.get_ticket(id).await?;
    Ok(Json(json!({ "status": true, "ticket": ticket })))
}

pub async fn add_sub_ticket(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<SubTicketInput>,
) -> ApiResult {
    let sub_ticket = state.tickets.add_sub_ticket(id, input).await?;
    Ok(Json(json!({
        "status": true,
        "subTicket": sub_ticket,
        "message": "Sub-ticket added successfully.",
    })))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<UpdateTicketInput>,
) -> ApiResult {
    let changes = state
        .tickets
        .update_ticket(id, input, Some(principal.user_id))
        .await?;
    Ok(Json(json!({
        "status": true,
        "changes": changes,
        "message": "Ticket updated successfully.",
    })))
}

pub async fn trash(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult {
    state.tickets.trash_ticket(id).await?;
    Ok(Json(json!({
        "status": true,
        "message": "Ticket moved to trash.",
    })))
}

pub async fn delete_restore_one(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<ActionQuery>,
) -> ApiResult {
    delete_restore(&state, Some(id), query.action()?).await
}

pub async fn delete_restore_all(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiQuery(query): ApiQuery<ActionQuery>,
) -> ApiResult {
    delete_restore(&state, None, query.action()?).await
}

async fn delete_restore(
    state: &AppState,
    id: Option<i64>,
    action: DeleteRestoreAction,
) -> ApiResult {
    let affected = state.tickets.delete_or_restore(id, action).await?;
    Ok(Json(json!({
        "status": true,
        "affected": affected,
        "message": "Operation performed successfully.",
    })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn list_query_defaults_to_active_tickets() {
        let filter = ListQuery::default().into_filter().unwrap();
        assert!(!filter.trashed);
        assert!(filter.stage.is_none());
    }

    #[test]
    fn list_query_accepts_trash_flag_and_stage() {
        let query = ListQuery {
            stage: Some("In Progress".into()),
            trashed: Some("true".into()),
            search: None,
        };
        let filter = query.into_filter().unwrap();
        assert!(filter.trashed);
        assert_eq!(filter.stage, Some(Stage::InProgress));
    }

    #[test]
    fn list_query_rejects_unknown_stage() {
        let query = ListQuery {
            stage: Some("blocked".into()),
            ..ListQuery::default()
        };
        assert!(matches!(
            query.into_filter(),
            Err(ServiceError::Validation(_))
        ));
    }
}
