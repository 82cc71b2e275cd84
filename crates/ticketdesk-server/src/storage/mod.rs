//! `SQLite` storage for the `TicketDesk` server.
//!
//! Provides persistence for users, tickets, team assignments, and sub-tickets.

mod db;
mod models;
mod queries_tickets;
mod queries_users;

#[cfg(test)]
mod tests;

pub use db::{DatabaseError, TicketDatabase};
pub use models::*;
