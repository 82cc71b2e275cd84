//! Validation and orchestration in front of the ticket queries.

use tracing::{info, instrument};

use super::types::{
    CreateTicketInput, DashboardSummary, DeleteRestoreAction, NewTicket, SubTicketInput, TeamIds,
    Ticket, TicketDetail, TicketFilter, TicketUpdate, UpdateTicketInput,
};
use crate::error::{ServiceError, ServiceResult};
use crate::storage::{DatabaseError, SubTicket, TicketDatabase};

#[derive(Clone)]
pub struct TicketService {
    db: TicketDatabase,
}

impl TicketService {
    pub const fn new(db: TicketDatabase) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input))]
    pub async fn create_ticket(&self, input: CreateTicketInput) -> ServiceResult<i64> {
        let ticket = NewTicket {
            title: required("Title", &input.title)?,
            priority: parse_field(&input.priority)?,
            stage: parse_field(&input.stage)?,
            assets: input.assets,
            team: TeamIds::from_refs(&input.team),
        };

        let id = self.db.create_ticket(&ticket).await.map_err(team_error)?;

        info!(ticket_id = id, team = ticket.team.as_slice().len(), "Ticket created");
        Ok(id)
    }

    #[instrument(skip(self))]
    pub async fn duplicate_ticket(&self, source_id: i64) -> ServiceResult<i64> {
        let id = self.db.duplicate_ticket(source_id).await?;

        info!(source_id, ticket_id = id, "Ticket duplicated");
        Ok(id)
    }

    pub async fn get_ticket(&self, id: i64) -> ServiceResult<TicketDetail> {
        Ok(self.db.get_ticket(id).await?)
    }

    pub async fn list_tickets(&self, filter: &TicketFilter) -> ServiceResult<Vec<Ticket>> {
        Ok(self.db.list_tickets(filter).await?)
    }

    /// Apply an update and return the change clauses it produced.
    #[instrument(skip(self, input))]
    pub async fn update_ticket(
        &self,
        id: i64,
        input: UpdateTicketInput,
        updated_by: Option<i64>,
    ) -> ServiceResult<Vec<String>> {
        let update = TicketUpdate {
            title: required("Title", &input.title)?,
            priority: parse_field(&input.priority)?,
            stage: parse_field(&input.stage)?,
            assets: input.assets,
            team: input.team.as_deref().map(TeamIds::from_refs),
        };

        let changes = self
            .db
            .update_ticket(id, &update, updated_by)
            .await
            .map_err(team_error)?;

        info!(ticket_id = id, changes = changes.len(), "Ticket updated");
        Ok(changes)
    }

    /// Move a ticket to the trash. A missing id is `NotFound`; trashing an
    /// already-trashed ticket succeeds.
    #[instrument(skip(self))]
    pub async fn trash_ticket(&self, id: i64) -> ServiceResult<()> {
        if !self.db.trash_ticket(id).await? {
            return Err(ServiceError::not_found(format!("Ticket {id}")));
        }

        info!(ticket_id = id, "Ticket moved to trash");
        Ok(())
    }

    /// Hard-delete or restore tickets, returning how many were affected.
    ///
    /// `Delete` and `Restore` need an id; the `*All` variants ignore it and
    /// act on the whole trash.
    #[instrument(skip(self))]
    pub async fn delete_or_restore(
        &self,
        id: Option<i64>,
        action: DeleteRestoreAction,
    ) -> ServiceResult<u64> {
        let affected = match action {
            DeleteRestoreAction::Delete => {
                let id = id.ok_or_else(|| ServiceError::validation("Ticket id is required"))?;
                if !self.db.delete_ticket(id).await? {
                    return Err(ServiceError::not_found(format!("Ticket {id}")));
                }
                1
            }
            DeleteRestoreAction::Restore => {
                let id = id.ok_or_else(|| ServiceError::validation("Ticket id is required"))?;
                if !self.db.restore_ticket(id).await? {
                    return Err(ServiceError::not_found(format!("Ticket {id}")));
                }
                1
            }
            DeleteRestoreAction::DeleteAll => self.db.delete_trashed_tickets().await?,
            DeleteRestoreAction::RestoreAll => self.db.restore_trashed_tickets().await?,
        };

        info!(?action, affected, "Trash operation performed");
        Ok(affected)
    }

    #[instrument(skip(self, input))]
    pub async fn add_sub_ticket(
        &self,
        ticket_id: i64,
        input: SubTicketInput,
    ) -> ServiceResult<SubTicket> {
        let title = required("Sub-ticket title", &input.title)?;
        let sub_ticket = self
            .db
            .add_sub_ticket(ticket_id, &title, input.tag.trim())
            .await?;

        info!(ticket_id, sub_ticket_id = sub_ticket.id, "Sub-ticket added");
        Ok(sub_ticket)
    }

    pub async fn dashboard_statistics(&self) -> ServiceResult<DashboardSummary> {
        Ok(self.db.dashboard_statistics().await?)
    }
}

fn required(field: &str, value: &str) -> ServiceResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ServiceError::validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn parse_field<T>(value: &str) -> ServiceResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| ServiceError::validation(e.to_string()))
}

/// A foreign-key failure while writing a ticket means a team member does not exist.
fn team_error(e: DatabaseError) -> ServiceError {
    match e {
        DatabaseError::ForeignKeyViolation(_) => {
            ServiceError::validation("Team references an unknown user")
        }
        other => other.into(),
    }
}
