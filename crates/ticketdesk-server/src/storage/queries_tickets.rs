//! Ticket, team assignment, and sub-ticket queries.

use std::collections::HashMap;

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use ticketdesk_core::db::unix_timestamp;

use super::db::{DatabaseError, TicketDatabase};
use super::models::{SubTicket, TeamMemberRow, TicketRow, UserSummary, encode_assets};
use crate::tickets::{
    ChangeSet, DashboardSummary, NewTicket, PriorityCount, StageCount, Ticket, TicketDetail,
    TicketFilter, TicketUpdate,
};

/// Appended to the title of a duplicated ticket.
pub const DUPLICATE_SUFFIX: &str = " - Duplicate";

/// Number of tickets in the dashboard's recent list.
const RECENT_TICKETS: i64 = 10;

/// Bound parameters per statement when batching ids. `SQLite` caps a
/// statement at 32 766 variables.
const BATCH_PARAMS: usize = 900;

impl TicketDatabase {
    // =========================================================================
    // Ticket lifecycle
    // =========================================================================

    /// Insert a ticket and its team assignments in one transaction.
    pub async fn create_ticket(&self, ticket: &NewTicket) -> Result<i64, DatabaseError> {
        let assets = encode_assets(&ticket.assets)?;
        let now = unix_timestamp();

        let mut tx = self.pool().begin().await?;

        let id = sqlx::query(
            "INSERT INTO tickets (title, priority, stage, assets, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&ticket.title)
        .bind(ticket.priority.as_str())
        .bind(ticket.stage.as_str())
        .bind(&assets)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        insert_team(&mut tx, id, ticket.team.as_slice()).await?;

        tx.commit().await?;

        Ok(id)
    }

    /// Copy a ticket (trashed or not) and its team into a fresh ticket.
    pub async fn duplicate_ticket(&self, source_id: i64) -> Result<i64, DatabaseError> {
        let now = unix_timestamp();

        let mut tx = self.pool().begin().await?;

        let source = fetch_ticket_row(&mut tx, source_id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Ticket {source_id}")))?;

        let id = sqlx::query(
            "INSERT INTO tickets (title, priority, stage, assets, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(format!("{}{DUPLICATE_SUFFIX}", source.title))
        .bind(&source.priority)
        .bind(&source.stage)
        .bind(&source.assets)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        sqlx::query(
            "INSERT INTO ticket_team (ticket_id, user_id) SELECT ?, user_id FROM ticket_team WHERE ticket_id = ?",
        )
        .bind(id)
        .bind(source_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(id)
    }

    /// Get a ticket by ID with its team and sub-tickets.
    pub async fn get_ticket(&self, id: i64) -> Result<TicketDetail, DatabaseError> {
        let row = sqlx::query_as::<_, TicketRow>("SELECT * FROM tickets WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Ticket {id}")))?;

        let mut ticket = Ticket::try_from(row)?;
        ticket.team = self.ticket_team(id).await?;
        let sub_tickets = self.list_sub_tickets(id).await?;

        Ok(TicketDetail {
            ticket,
            sub_tickets,
        })
    }

    /// List tickets matching `filter`, newest first, teams attached.
    pub async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, DatabaseError> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM tickets WHERE is_trashed = ");
        qb.push_bind(filter.trashed);

        if let Some(stage) = filter.stage {
            qb.push(" AND stage = ").push_bind(stage.as_str());
        }
        if let Some(search) = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let pattern = like_pattern(search);
            qb.push(" AND (LOWER(title) LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR CAST(id AS TEXT) LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }
        qb.push(" ORDER BY id DESC");

        let rows: Vec<TicketRow> = qb.build_query_as().fetch_all(self.pool()).await?;
        let mut tickets = rows
            .into_iter()
            .map(Ticket::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        self.attach_teams(&mut tickets).await?;

        Ok(tickets)
    }

    /// Apply an update, returning the change clauses.
    ///
    /// The read-compare, the ticket-row write, and the team replacement share
    /// one transaction: an error at any step leaves the ticket untouched.
    pub async fn update_ticket(
        &self,
        id: i64,
        update: &TicketUpdate,
        updated_by: Option<i64>,
    ) -> Result<Vec<String>, DatabaseError> {
        let assets = encode_assets(&update.assets)?;
        let now = unix_timestamp();

        let mut tx = self.pool().begin().await?;

        let current = fetch_ticket_row(&mut tx, id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Ticket {id}")))?;
        let current = Ticket::try_from(current)?;

        let current_team: Vec<i64> =
            sqlx::query_scalar("SELECT user_id FROM ticket_team WHERE ticket_id = ?")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        let changes = ChangeSet::between(&current, &current_team, update);
        let description = changes.description().unwrap_or(current.description);

        sqlx::query(
            "UPDATE tickets SET title = ?, priority = ?, stage = ?, assets = ?, description = ?, updated_by = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&update.title)
        .bind(update.priority.as_str())
        .bind(update.stage.as_str())
        .bind(&assets)
        .bind(&description)
        .bind(updated_by)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if let Some(team) = &update.team {
            sqlx::query("DELETE FROM ticket_team WHERE ticket_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            insert_team(&mut tx, id, team.as_slice()).await?;
        }

        tx.commit().await?;

        Ok(changes.into_clauses())
    }

    /// Move a ticket to the trash.
    pub async fn trash_ticket(&self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE tickets SET is_trashed = 1, updated_at = ? WHERE id = ?")
            .bind(unix_timestamp())
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Take a ticket out of the trash.
    pub async fn restore_ticket(&self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE tickets SET is_trashed = 0, updated_at = ? WHERE id = ?")
            .bind(unix_timestamp())
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Restore every trashed ticket.
    pub async fn restore_trashed_tickets(&self) -> Result<u64, DatabaseError> {
        let result =
            sqlx::query("UPDATE tickets SET is_trashed = 0, updated_at = ? WHERE is_trashed = 1")
                .bind(unix_timestamp())
                .execute(self.pool())
                .await?;

        Ok(result.rows_affected())
    }

    /// Permanently delete a ticket, whatever its trash state.
    ///
    /// Team assignments and sub-tickets go with it (`ON DELETE CASCADE`).
    pub async fn delete_ticket(&self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM tickets WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Permanently delete every trashed ticket.
    pub async fn delete_trashed_tickets(&self) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM tickets WHERE is_trashed = 1")
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn ticket_exists(&self, id: i64) -> Result<bool, DatabaseError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM tickets WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

        Ok(found.is_some())
    }

    // =========================================================================
    // Team assignments
    // =========================================================================

    /// Resolve a ticket's team into user summaries.
    pub async fn ticket_team(&self, ticket_id: i64) -> Result<Vec<UserSummary>, DatabaseError> {
        let team = sqlx::query_as::<_, UserSummary>(
            "SELECT u.id, u.name, u.title, u.role, u.email FROM ticket_team tt \
             JOIN users u ON u.id = tt.user_id WHERE tt.ticket_id = ? ORDER BY u.id",
        )
        .bind(ticket_id)
        .fetch_all(self.pool())
        .await?;

        Ok(team)
    }

    /// Resolve the teams of many tickets, one join per batch of ids.
    async fn attach_teams(&self, tickets: &mut [Ticket]) -> Result<(), DatabaseError> {
        let ids: Vec<i64> = tickets.iter().map(|t| t.id).collect();
        let mut by_ticket: HashMap<i64, Vec<UserSummary>> = HashMap::new();

        for batch in ids.chunks(BATCH_PARAMS) {
            let mut qb = QueryBuilder::<Sqlite>::new(
                "SELECT tt.ticket_id, u.id, u.name, u.title, u.role, u.email FROM ticket_team tt \
                 JOIN users u ON u.id = tt.user_id WHERE tt.ticket_id IN (",
            );
            let mut separated = qb.separated(", ");
            for id in batch {
                separated.push_bind(*id);
            }
            separated.push_unseparated(") ORDER BY tt.ticket_id, u.id");

            let rows: Vec<TeamMemberRow> = qb.build_query_as().fetch_all(self.pool()).await?;
            for row in rows {
                by_ticket.entry(row.ticket_id).or_default().push(row.into());
            }
        }

        for ticket in tickets {
            ticket.team = by_ticket.remove(&ticket.id).unwrap_or_default();
        }

        Ok(())
    }

    // =========================================================================
    // Sub-tickets
    // =========================================================================

    /// Append a sub-ticket to an existing ticket.
    pub async fn add_sub_ticket(
        &self,
        ticket_id: i64,
        title: &str,
        tag: &str,
    ) -> Result<SubTicket, DatabaseError> {
        if !self.ticket_exists(ticket_id).await? {
            return Err(DatabaseError::NotFound(format!("Ticket {ticket_id}")));
        }

        let id = sqlx::query(
            "INSERT INTO sub_tickets (ticket_id, title, tag, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(ticket_id)
        .bind(title)
        .bind(tag)
        .bind(unix_timestamp())
        .execute(self.pool())
        .await?
        .last_insert_rowid();

        let sub_ticket = sqlx::query_as::<_, SubTicket>("SELECT * FROM sub_tickets WHERE id = ?")
            .bind(id)
            .fetch_one(self.pool())
            .await?;

        Ok(sub_ticket)
    }

    pub async fn list_sub_tickets(&self, ticket_id: i64) -> Result<Vec<SubTicket>, DatabaseError> {
        let sub_tickets = sqlx::query_as::<_, SubTicket>(
            "SELECT * FROM sub_tickets WHERE ticket_id = ? ORDER BY id",
        )
        .bind(ticket_id)
        .fetch_all(self.pool())
        .await?;

        Ok(sub_tickets)
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    /// Aggregate statistics over non-trashed tickets.
    pub async fn dashboard_statistics(&self) -> Result<DashboardSummary, DatabaseError> {
        let total_tickets: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM tickets WHERE is_trashed = 0")
                .fetch_one(self.pool())
                .await?;

        let grouped_by_stage = sqlx::query_as::<_, StageCount>(
            "SELECT stage, COUNT(*) AS count FROM tickets WHERE is_trashed = 0 GROUP BY stage ORDER BY stage",
        )
        .fetch_all(self.pool())
        .await?;

        let grouped_by_priority = sqlx::query_as::<_, PriorityCount>(
            "SELECT priority, COUNT(*) AS count FROM tickets WHERE is_trashed = 0 GROUP BY priority ORDER BY priority",
        )
        .fetch_all(self.pool())
        .await?;

        let rows = sqlx::query_as::<_, TicketRow>(
            "SELECT * FROM tickets WHERE is_trashed = 0 ORDER BY id DESC LIMIT ?",
        )
        .bind(RECENT_TICKETS)
        .fetch_all(self.pool())
        .await?;
        let mut recent_tickets = rows
            .into_iter()
            .map(Ticket::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        self.attach_teams(&mut recent_tickets).await?;

        Ok(DashboardSummary {
            total_tickets,
            grouped_by_stage,
            grouped_by_priority,
            recent_tickets,
        })
    }
}

async fn fetch_ticket_row(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<TicketRow>, DatabaseError> {
    let row = sqlx::query_as::<_, TicketRow>("SELECT * FROM tickets WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row)
}

async fn insert_team(
    conn: &mut SqliteConnection,
    ticket_id: i64,
    user_ids: &[i64],
) -> Result<(), DatabaseError> {
    // Two parameters per row.
    for batch in user_ids.chunks(BATCH_PARAMS / 2) {
        let mut qb = QueryBuilder::<Sqlite>::new("INSERT INTO ticket_team (ticket_id, user_id) ");
        qb.push_values(batch, |mut row, user_id| {
            row.push_bind(ticket_id).push_bind(*user_id);
        });
        qb.build().execute(&mut *conn).await?;
    }

    Ok(())
}

/// Lower-cased `LIKE` pattern matching `needle` anywhere, with wildcards escaped.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
