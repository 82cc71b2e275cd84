//! Ticket Store: lifecycle and persistence contract for tickets, their team
//! assignments, and sub-tickets.

mod changes;
mod service;
mod types;


pub use changes::ChangeSet;
pub use service::TicketService;
pub use types::*;
