//! Storage layer tests for the `TicketDesk` server.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use super::db::{DatabaseError, TicketDatabase};
use super::models::NewUser;
use super::queries_tickets::DUPLICATE_SUFFIX;
use crate::tickets::{NewTicket, Priority, Stage, TeamIds, TicketFilter, TicketUpdate};

async fn test_db() -> TicketDatabase {
    TicketDatabase::open_in_memory().await.unwrap()
}

async fn add_user(db: &TicketDatabase, name: &str, email: &str) -> i64 {
    db.create_user(&NewUser {
        name,
        title: "Engineer",
        role: "Developer",
        email,
        password_hash: "hash123",
        is_admin: false,
    })
    .await
    .unwrap()
    .id
}

fn new_ticket(title: &str, team: &[i64]) -> NewTicket {
    NewTicket {
        title: title.into(),
        priority: Priority::Medium,
        stage: Stage::Todo,
        assets: vec!["a.png".into(), "b.pdf".into()],
        team: team.iter().copied().collect(),
    }
}

fn update_of(title: &str, team: Option<TeamIds>) -> TicketUpdate {
    TicketUpdate {
        title: title.into(),
        priority: Priority::Medium,
        stage: Stage::Todo,
        assets: vec!["a.png".into(), "b.pdf".into()],
        team,
    }
}

fn active() -> TicketFilter {
    TicketFilter::default()
}

// === User tests ===

#[tokio::test]
async fn create_and_get_user() {
    let db = test_db().await;
    let id = add_user(&db, "Alice", "alice@example.com").await;

    let user = db.get_user(id).await.unwrap();
    assert_eq!(user.name, "Alice");
    assert!(user.is_active);
    assert!(!user.is_admin);

    let by_email = db.get_user_by_email("ALICE@example.com").await.unwrap();
    assert_eq!(by_email.id, id);
    assert!(matches!(
        db.get_user_by_email("bob@example.com").await,
        Err(DatabaseError::NotFound(_))
    ));
}

#[tokio::test]
async fn duplicate_email_is_a_unique_violation() {
    let db = test_db().await;
    add_user(&db, "Alice", "alice@example.com").await;

    let err = db
        .create_user(&NewUser {
            name: "Other Alice",
            title: "",
            role: "",
            email: "Alice@Example.com",
            password_hash: "hash",
            is_admin: false,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::UniqueViolation(_)));
    assert_eq!(db.count_users().await.unwrap(), 1);
}

#[tokio::test]
async fn first_admin_only_while_the_table_is_empty() {
    let db = test_db().await;
    let bootstrap = |email| NewUser {
        name: "Root",
        title: "",
        role: "",
        email,
        password_hash: "hash",
        is_admin: true,
    };

    let root = db
        .create_first_admin(&bootstrap("root@example.com"))
        .await
        .unwrap()
        .unwrap();
    assert!(root.is_admin);

    assert!(
        db.create_first_admin(&bootstrap("late@example.com"))
            .await
            .unwrap()
            .is_none()
    );
    assert_eq!(db.count_users().await.unwrap(), 1);
}

#[tokio::test]
async fn list_users_orders_by_name() {
    let db = test_db().await;
    add_user(&db, "Zed", "z@example.com").await;
    add_user(&db, "Amy", "a@example.com").await;

    let names: Vec<String> = db
        .list_users()
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.name)
        .collect();
    assert_eq!(names, vec!["Amy", "Zed"]);
}

#[tokio::test]
async fn deleting_a_user_drops_assignments_and_clears_updated_by() {
    let db = test_db().await;
    let alice = add_user(&db, "Alice", "alice@example.com").await;
    let bob = add_user(&db, "Bob", "bob@example.com").await;
    let id = db.create_ticket(&new_ticket("Shared", &[alice, bob])).await.unwrap();
    db.update_ticket(id, &update_of("Shared!", None), Some(alice))
        .await
        .unwrap();

    assert!(db.delete_user(alice).await.unwrap());
    assert!(!db.delete_user(alice).await.unwrap());

    let ticket = db.get_ticket(id).await.unwrap().ticket;
    assert_eq!(ticket.updated_by, None);
    let team: Vec<i64> = ticket.team.iter().map(|u| u.id).collect();
    assert_eq!(team, vec![bob]);
}

// === Ticket tests ===

#[tokio::test]
async fn create_and_get_ticket() {
    let db = test_db().await;
    let alice = add_user(&db, "Alice", "alice@example.com").await;

    let id = db.create_ticket(&new_ticket("Fix login", &[alice])).await.unwrap();
    let detail = db.get_ticket(id).await.unwrap();

    assert_eq!(detail.ticket.title, "Fix login");
    assert_eq!(detail.ticket.priority, Priority::Medium);
    assert_eq!(detail.ticket.stage, Stage::Todo);
    assert_eq!(detail.ticket.assets, vec!["a.png", "b.pdf"]);
    assert!(!detail.ticket.is_trashed);
    assert_eq!(detail.ticket.team.len(), 1);
    assert_eq!(detail.ticket.team[0].email, "alice@example.com");
    assert!(detail.sub_tickets.is_empty());
}

#[tokio::test]
async fn get_missing_ticket_is_not_found() {
    let db = test_db().await;
    assert!(matches!(
        db.get_ticket(42).await,
        Err(DatabaseError::NotFound(_))
    ));
}

#[tokio::test]
async fn create_with_unknown_member_writes_nothing() {
    let db = test_db().await;
    let err = db.create_ticket(&new_ticket("Ghost team", &[999])).await.unwrap_err();

    assert!(matches!(err, DatabaseError::ForeignKeyViolation(_)));
    assert!(db.list_tickets(&active()).await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_team_replacement_rolls_back_the_ticket_row() {
    let db = test_db().await;
    let alice = add_user(&db, "Alice", "alice@example.com").await;
    let id = db.create_ticket(&new_ticket("Original", &[alice])).await.unwrap();

    // The ticket row is written before the team rows; user 999 fails the FK.
    let err = db
        .update_ticket(id, &update_of("Rewritten", Some([999].into_iter().collect())), None)
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::ForeignKeyViolation(_)));

    let ticket = db.get_ticket(id).await.unwrap().ticket;
    assert_eq!(ticket.title, "Original");
    assert_eq!(ticket.description, "");
    let team: Vec<i64> = ticket.team.iter().map(|u| u.id).collect();
    assert_eq!(team, vec![alice]);
}

#[tokio::test]
async fn update_replaces_team_only_when_given() {
    let db = test_db().await;
    let alice = add_user(&db, "Alice", "alice@example.com").await;
    let bob = add_user(&db, "Bob", "bob@example.com").await;
    let id = db.create_ticket(&new_ticket("Work", &[alice])).await.unwrap();

    let changes = db.update_ticket(id, &update_of("Work", None), None).await.unwrap();
    assert!(changes.is_empty());
    assert_eq!(db.ticket_team(id).await.unwrap().len(), 1);

    let changes = db
        .update_ticket(id, &update_of("Work", Some([bob].into_iter().collect())), None)
        .await
        .unwrap();
    assert_eq!(changes, vec!["Team updated"]);
    let team: Vec<i64> = db.ticket_team(id).await.unwrap().iter().map(|u| u.id).collect();
    assert_eq!(team, vec![bob]);

    db.update_ticket(id, &update_of("Work", Some(TeamIds::default())), None)
        .await
        .unwrap();
    assert!(db.ticket_team(id).await.unwrap().is_empty());
}

#[tokio::test]
async fn trashed_ticket_leaves_listing_and_dashboard() {
    let db = test_db().await;
    let keep = db.create_ticket(&new_ticket("Keep", &[])).await.unwrap();
    let gone = db.create_ticket(&new_ticket("Gone", &[])).await.unwrap();

    assert!(db.trash_ticket(gone).await.unwrap());

    let listed: Vec<i64> = db.list_tickets(&active()).await.unwrap().iter().map(|t| t.id).collect();
    assert_eq!(listed, vec![keep]);

    let trash = db
        .list_tickets(&TicketFilter {
            trashed: true,
            ..TicketFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(trash.len(), 1);
    assert_eq!(trash[0].id, gone);

    let stats = db.dashboard_statistics().await.unwrap();
    assert_eq!(stats.total_tickets, 1);
    assert!(stats.recent_tickets.iter().all(|t| t.id != gone));

    let still_there = db.get_ticket(gone).await.unwrap();
    assert!(still_there.ticket.is_trashed);
}

#[tokio::test]
async fn delete_removes_untrashed_ticket_with_its_children() {
    let db = test_db().await;
    let alice = add_user(&db, "Alice", "alice@example.com").await;
    let id = db.create_ticket(&new_ticket("Doomed", &[alice])).await.unwrap();
    db.add_sub_ticket(id, "Child", "qa").await.unwrap();

    assert!(db.delete_ticket(id).await.unwrap());
    assert!(!db.ticket_exists(id).await.unwrap());
    assert!(db.list_sub_tickets(id).await.unwrap().is_empty());

    let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ticket_team WHERE ticket_id = ?")
        .bind(id)
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(orphans, 0);
    assert!(!db.delete_ticket(id).await.unwrap());
}

#[tokio::test]
async fn restore_all_only_touches_trashed_tickets() {
    let db = test_db().await;
    let a = db.create_ticket(&new_ticket("A", &[])).await.unwrap();
    let b = db.create_ticket(&new_ticket("B", &[])).await.unwrap();
    let c = db.create_ticket(&new_ticket("C", &[])).await.unwrap();
    db.trash_ticket(a).await.unwrap();
    db.trash_ticket(c).await.unwrap();
    let untouched_before = db.get_ticket(b).await.unwrap().ticket.updated_at;

    assert_eq!(db.restore_trashed_tickets().await.unwrap(), 2);
    assert_eq!(db.list_tickets(&active()).await.unwrap().len(), 3);
    assert_eq!(db.get_ticket(b).await.unwrap().ticket.updated_at, untouched_before);
    assert_eq!(db.restore_trashed_tickets().await.unwrap(), 0);
}

#[tokio::test]
async fn delete_all_empties_only_the_trash() {
    let db = test_db().await;
    let a = db.create_ticket(&new_ticket("A", &[])).await.unwrap();
    let b = db.create_ticket(&new_ticket("B", &[])).await.unwrap();
    db.trash_ticket(a).await.unwrap();

    assert_eq!(db.delete_trashed_tickets().await.unwrap(), 1);
    assert!(!db.ticket_exists(a).await.unwrap());
    assert!(db.ticket_exists(b).await.unwrap());
}

#[tokio::test]
async fn duplicate_copies_fields_and_team() {
    let db = test_db().await;
    let alice = add_user(&db, "Alice", "alice@example.com").await;
    let source = db.create_ticket(&new_ticket("Fix login", &[alice])).await.unwrap();
    db.trash_ticket(source).await.unwrap();

    let copy = db.duplicate_ticket(source).await.unwrap();
    assert_ne!(copy, source);

    let ticket = db.get_ticket(copy).await.unwrap().ticket;
    assert_eq!(ticket.title, format!("Fix login{DUPLICATE_SUFFIX}"));
    assert_eq!(ticket.title, "Fix login - Duplicate");
    assert_eq!(ticket.assets, vec!["a.png", "b.pdf"]);
    assert!(!ticket.is_trashed);
    assert_eq!(ticket.team.len(), 1);

    assert!(matches!(
        db.duplicate_ticket(copy + 10).await,
        Err(DatabaseError::NotFound(_))
    ));
}

#[tokio::test]
async fn list_filters_by_stage_and_search() {
    let db = test_db().await;
    let login = db.create_ticket(&new_ticket("Fix LOGIN page", &[])).await.unwrap();
    let export = db.create_ticket(&new_ticket("CSV export 100%", &[])).await.unwrap();
    db.update_ticket(
        export,
        &TicketUpdate {
            stage: Stage::InProgress,
            ..update_of("CSV export 100%", None)
        },
        None,
    )
    .await
    .unwrap();

    let ids = |tickets: Vec<crate::tickets::Ticket>| tickets.iter().map(|t| t.id).collect::<Vec<_>>();

    let in_progress = db
        .list_tickets(&TicketFilter {
            stage: Some(Stage::InProgress),
            ..TicketFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(ids(in_progress), vec![export]);

    let searched = db
        .list_tickets(&TicketFilter {
            search: Some("login".into()),
            ..TicketFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(ids(searched), vec![login]);

    let literal_percent = db
        .list_tickets(&TicketFilter {
            search: Some("0%".into()),
            ..TicketFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(ids(literal_percent), vec![export]);

    let newest_first = db.list_tickets(&active()).await.unwrap();
    assert_eq!(ids(newest_first), vec![export, login]);
}

// === Sub-ticket and dashboard tests ===

#[tokio::test]
async fn listing_more_tickets_than_one_statement_can_bind() {
    let db = test_db().await;
    let alice = add_user(&db, "Alice", "alice@example.com").await;
    let first = db.create_ticket(&new_ticket("First", &[alice])).await.unwrap();

    sqlx::query(
        "WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < 33000) \
         INSERT INTO tickets (title, priority, stage, created_at, updated_at) \
         SELECT 'bulk ' || n, 'low', 'todo', 0, 0 FROM seq",
    )
    .execute(db.pool())
    .await
    .unwrap();

    let tickets = db.list_tickets(&active()).await.unwrap();
    assert_eq!(tickets.len(), 33_001);

    let first = tickets.iter().find(|t| t.id == first).unwrap();
    assert_eq!(first.team.len(), 1);
    assert_eq!(first.team[0].id, alice);
    assert!(tickets.iter().filter(|t| t.id != first.id).all(|t| t.team.is_empty()));
}

#[tokio::test]
async fn large_team_is_written_in_full() {
    let db = test_db().await;
    sqlx::query(
        "WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < 17000) \
         INSERT INTO users (name, email, password_hash, created_at, updated_at) \
         SELECT 'user ' || n, 'user' || n || '@example.com', 'hash', 0, 0 FROM seq",
    )
    .execute(db.pool())
    .await
    .unwrap();
    let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM users ORDER BY id")
        .fetch_all(db.pool())
        .await
        .unwrap();

    let id = db.create_ticket(&new_ticket("Everyone", &ids)).await.unwrap();

    let detail = db.get_ticket(id).await.unwrap();
    assert_eq!(detail.ticket.team.len(), 17_000);

    let fewer: TeamIds = ids[..9_000].iter().copied().collect();
    db.update_ticket(id, &update_of("Everyone again", Some(fewer)), None)
        .await
        .unwrap();
    let assigned: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ticket_team WHERE ticket_id = ?")
        .bind(id)
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(assigned, 9_000);
}

#[tokio::test]
async fn sub_tickets_attach_to_their_parent() {
    let db = test_db().await;
    let id = db.create_ticket(&new_ticket("Parent", &[])).await.unwrap();

    let first = db.add_sub_ticket(id, "Write tests", "qa").await.unwrap();
    db.add_sub_ticket(id, "Ship it", "").await.unwrap();

    assert_eq!(first.ticket_id, id);
    assert_eq!(first.tag, "qa");
    let detail = db.get_ticket(id).await.unwrap();
    let titles: Vec<&str> = detail.sub_tickets.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Write tests", "Ship it"]);

    assert!(matches!(
        db.add_sub_ticket(id + 1, "Lost", "").await,
        Err(DatabaseError::NotFound(_))
    ));
}

#[tokio::test]
async fn dashboard_groups_active_tickets() {
    let db = test_db().await;
    for title in ["a", "b", "c"] {
        db.create_ticket(&new_ticket(title, &[])).await.unwrap();
    }
    let high = db
        .create_ticket(&NewTicket {
            priority: Priority::High,
            stage: Stage::Completed,
            ..new_ticket("d", &[])
        })
        .await
        .unwrap();

    let stats = db.dashboard_statistics().await.unwrap();
    assert_eq!(stats.total_tickets, 4);
    assert_eq!(stats.recent_tickets[0].id, high);

    let count_for = |stage: &str| {
        stats
            .grouped_by_stage
            .iter()
            .find(|s| s.stage == stage)
            .map_or(0, |s| s.count)
    };
    assert_eq!(count_for("todo"), 3);
    assert_eq!(count_for("completed"), 1);
    assert!(
        stats
            .grouped_by_priority
            .iter()
            .any(|p| p.priority == "high" && p.count == 1)
    );
}
