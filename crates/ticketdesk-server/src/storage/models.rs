//! Data models for `TicketDesk` storage.

use serde::Serialize;

use super::db::DatabaseError;
use crate::tickets::Ticket;

/// Full user row. The password hash is never serialized.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub title: String,
    pub role: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub is_admin: bool,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Public profile fields of a user, as attached to tickets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub title: String,
    pub role: String,
    pub email: String,
}

/// Fields of a user to insert.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub title: &'a str,
    pub role: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SubTicket {
    pub id: i64,
    pub ticket_id: i64,
    pub title: String,
    pub tag: String,
    pub created_at: i64,
}

/// Raw `tickets` row; `assets` is the JSON-encoded list.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct TicketRow {
    pub id: i64,
    pub title: String,
    pub priority: String,
    pub stage: String,
    pub assets: String,
    pub description: String,
    pub is_trashed: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub updated_by: Option<i64>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = DatabaseError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |what: String| DatabaseError::Query(format!("Ticket {id}: {what}"));
        Ok(Self {
            id,
            priority: row.priority.parse().map_err(|e| corrupt(format!("{e}")))?,
            stage: row.stage.parse().map_err(|e| corrupt(format!("{e}")))?,
            assets: decode_assets(&row.assets).map_err(|e| corrupt(format!("assets: {e}")))?,
            title: row.title,
            description: row.description,
            is_trashed: row.is_trashed,
            created_at: row.created_at,
            updated_at: row.updated_at,
            updated_by: row.updated_by,
            team: Vec::new(),
        })
    }
}

/// Team member joined with the ticket it is assigned to.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct TeamMemberRow {
    pub ticket_id: i64,
    pub id: i64,
    pub name: String,
    pub title: String,
    pub role: String,
    pub email: String,
}

impl From<TeamMemberRow> for UserSummary {
    fn from(row: TeamMemberRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            title: row.title,
            role: row.role,
            email: row.email,
        }
    }
}

pub(crate) fn encode_assets(assets: &[String]) -> Result<String, DatabaseError> {
    serde_json::to_string(assets).map_err(|e| DatabaseError::Query(format!("assets: {e}")))
}

fn decode_assets(raw: &str) -> Result<Vec<String>, serde_json::Error> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw)
}
