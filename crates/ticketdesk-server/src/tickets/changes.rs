//! Human-readable change descriptions for ticket updates.

use super::types::{Ticket, TicketUpdate};

/// Clauses describing how an update differs from the stored ticket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    clauses: Vec<String>,
}

impl ChangeSet {
    /// Compare `update` against the stored ticket and its current team ids.
    ///
    /// Clause order is fixed: title, stage, priority, assets, team.
    pub fn between(current: &Ticket, current_team: &[i64], update: &TicketUpdate) -> Self {
        let mut clauses = Vec::new();

        if current.title.trim() != update.title.trim() {
            clauses.push(format!(
                "Title changed from '{}' to '{}'",
                current.title, update.title
            ));
        }
        if current.stage != update.stage {
            clauses.push(format!(
                "Stage changed from '{}' to '{}'",
                current.stage, update.stage
            ));
        }
        if current.priority != update.priority {
            clauses.push(format!(
                "Priority changed from '{}' to '{}'",
                current.priority, update.priority
            ));
        }
        if current.assets != update.assets {
            clauses.push("Assets updated".to_string());
        }
        if let Some(team) = &update.team {
            if !team.is_empty() && !team.same_members(current_team) {
                clauses.push("Team updated".to_string());
            }
        }

        Self { clauses }
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn clauses(&self) -> &[String] {
        &self.clauses
    }

    pub fn into_clauses(self) -> Vec<String> {
        self.clauses
    }

    /// The new ticket description, or `None` when nothing changed and the
    /// prior description should be kept.
    pub fn description(&self) -> Option<String> {
        (!self.is_empty()).then(|| self.clauses.join(", "))
    }
}
