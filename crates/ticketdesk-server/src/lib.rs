//! TicketDesk Server Library
//!
//! Core functionality for the TicketDesk backend:
//! - SQLite storage for users, tickets, team assignments, and sub-tickets
//! - Session tokens, password hashing, and the access guard
//! - Ticket and account services
//! - REST API over axum

pub mod accounts;
pub mod api;
pub mod auth;
pub mod error;
pub mod storage;
pub mod tickets;
