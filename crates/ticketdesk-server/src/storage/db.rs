//! Database connection and initialization.

pub use ticketdesk_core::db::DatabaseError;

ticketdesk_core::define_database!(TicketDatabase, "Ticket database migrations complete");
