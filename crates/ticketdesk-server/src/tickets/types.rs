//! Ticket domain types and request inputs.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::storage::{SubTicket, UserSummary};

/// Ticket priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Normal,
    Low,
}

impl Priority {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Normal => "normal",
            Self::Low => "low",
        }
    }
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "normal" => Ok(Self::Normal),
            "low" => Ok(Self::Low),
            _ => Err(ParseEnumError::new("priority", s)),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow stage of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Stage {
    #[serde(rename = "todo")]
    Todo,
    #[serde(rename = "in progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
}

impl Stage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in progress",
            Self::Completed => "completed",
        }
    }
}

impl FromStr for Stage {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "todo" => Ok(Self::Todo),
            "in progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseEnumError::new("stage", s)),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value that is not a member of its enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {field} '{value}'")]
pub struct ParseEnumError {
    field: &'static str,
    value: String,
}

impl ParseEnumError {
    fn new(field: &'static str, value: &str) -> Self {
        Self {
            field,
            value: value.to_string(),
        }
    }
}

/// A team member reference as clients send it.
///
/// The frontend sends bare ids, numeric strings, or whole user objects
/// depending on the screen.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TeamRef {
    Id(i64),
    Member { id: serde_json::Value },
    Other(serde_json::Value),
}

impl TeamRef {
    /// The referenced user id, if the reference is numeric.
    pub fn user_id(&self) -> Option<i64> {
        match self {
            Self::Id(id) => Some(*id),
            Self::Member { id } | Self::Other(id) => numeric_id(id),
        }
    }
}

fn numeric_id(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Deduplicated, order-preserving set of user ids assigned to a ticket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamIds(Vec<i64>);

impl TeamIds {
    /// Resolve client references, discarding anything non-numeric.
    pub fn from_refs(refs: &[TeamRef]) -> Self {
        refs.iter().filter_map(TeamRef::user_id).collect()
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether both sets hold the same ids, ignoring order.
    pub fn same_members(&self, other: &[i64]) -> bool {
        let mut mine = self.0.clone();
        let mut theirs = other.to_vec();
        mine.sort_unstable();
        theirs.sort_unstable();
        theirs.dedup();
        mine == theirs
    }
}

impl FromIterator<i64> for TeamIds {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        let mut seen = HashSet::new();
        Self(iter.into_iter().filter(|id| seen.insert(*id)).collect())
    }
}

/// A ticket with its team resolved to user summaries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: i64,
    pub title: String,
    pub priority: Priority,
    pub stage: Stage,
    pub assets: Vec<String>,
    pub description: String,
    pub is_trashed: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub updated_by: Option<i64>,
    pub team: Vec<UserSummary>,
}

/// Single-ticket view: the ticket plus its sub-tickets.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketDetail {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub sub_tickets: Vec<SubTicket>,
}

/// Validated fields of a new ticket.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub title: String,
    pub priority: Priority,
    pub stage: Stage,
    pub assets: Vec<String>,
    pub team: TeamIds,
}

/// Validated fields of a ticket update. `team: None` leaves assignments as they are.
#[derive(Debug, Clone)]
pub struct TicketUpdate {
    pub title: String,
    pub priority: Priority,
    pub stage: Stage,
    pub assets: Vec<String>,
    pub team: Option<TeamIds>,
}

/// Filter for ticket listings.
#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    pub stage: Option<Stage>,
    /// List the trash instead of active tickets.
    pub trashed: bool,
    /// Case-insensitive title substring, or id substring.
    pub search: Option<String>,
}

/// Count of active tickets sharing a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct StageCount {
    pub stage: String,
    pub count: i64,
}

/// Count of active tickets sharing a priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct PriorityCount {
    pub priority: String,
    pub count: i64,
}

/// Dashboard snapshot over non-trashed tickets.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_tickets: i64,
    pub grouped_by_stage: Vec<StageCount>,
    pub grouped_by_priority: Vec<PriorityCount>,
    pub recent_tickets: Vec<Ticket>,
}

/// What `delete-restore` should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteRestoreAction {
    Delete,
    DeleteAll,
    Restore,
    RestoreAll,
}

impl FromStr for DeleteRestoreAction {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "delete" => Ok(Self::Delete),
            "deleteAll" => Ok(Self::DeleteAll),
            "restore" => Ok(Self::Restore),
            "restoreAll" => Ok(Self::RestoreAll),
            _ => Err(ParseEnumError::new("action type", s)),
        }
    }
}

/// Body of a create-ticket request.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTicketInput {
    pub title: String,
    pub priority: String,
    pub stage: String,
    #[serde(default, deserialize_with = "one_or_many")]
    pub assets: Vec<String>,
    #[serde(default)]
    pub team: Vec<TeamRef>,
}

/// Body of an update-ticket request.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTicketInput {
    pub title: String,
    pub priority: String,
    pub stage: String,
    #[serde(default, deserialize_with = "one_or_many")]
    pub assets: Vec<String>,
    #[serde(default)]
    pub team: Option<Vec<TeamRef>>,
}

/// Body of an add-sub-ticket request.
#[derive(Debug, Clone, Deserialize)]
pub struct SubTicketInput {
    pub title: String,
    #[serde(default)]
    pub tag: String,
}

/// Accept either a single asset string or a list of them.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Null(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
        OneOrMany::Null(()) => Vec::new(),
    })
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn priority_and_stage_parse_case_insensitively() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!(" Normal ".parse::<Priority>().unwrap(), Priority::Normal);
        assert_eq!("In Progress".parse::<Stage>().unwrap(), Stage::InProgress);
        assert_eq!("TODO".parse::<Stage>().unwrap(), Stage::Todo);
    }

    #[test]
    fn unknown_enum_values_are_rejected() {
        let err = "urgent".parse::<Priority>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid priority 'urgent'");
        assert!("done".parse::<Stage>().is_err());
        assert!("purge".parse::<DeleteRestoreAction>().is_err());
    }

    #[test]
    fn team_refs_resolve_to_distinct_numeric_ids() {
        let refs: Vec<TeamRef> =
            serde_json::from_str(r#"[3, "7", {"id": 3, "name": "alice"}, "bob", null, {"id": "9"}]"#)
                .unwrap();
        let team = TeamIds::from_refs(&refs);
        assert_eq!(team.as_slice(), &[3, 7, 9]);
    }

    #[test]
    fn same_members_ignores_order() {
        let team: TeamIds = [2, 1].into_iter().collect();
        assert!(team.same_members(&[1, 2]));
        assert!(!team.same_members(&[1]));
        assert!(TeamIds::default().same_members(&[]));
    }

    #[test]
    fn assets_accept_a_single_string() {
        let input: CreateTicketInput = serde_json::from_str(
            r#"{"title": "t", "priority": "low", "stage": "todo", "assets": "a.png"}"#,
        )
        .unwrap();
        assert_eq!(input.assets, vec!["a.png".to_string()]);
        assert!(input.team.is_empty());
    }

    #[test]
    fn update_without_team_leaves_it_unset() {
        let input: UpdateTicketInput = serde_json::from_str(
            r#"{"title": "t", "priority": "low", "stage": "todo", "assets": ["a", "b"]}"#,
        )
        .unwrap();
        assert!(input.team.is_none());
        assert_eq!(input.assets.len(), 2);
    }

    #[test]
    fn stage_serializes_canonically() {
        assert_eq!(
            serde_json::to_string(&Stage::InProgress).unwrap(),
            "\"in progress\""
        );
        assert_eq!(serde_json::to_string(&Priority::Medium).unwrap(), "\"medium\"");
    }
}
