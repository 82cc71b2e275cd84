//! Shared handler state.

use std::sync::Arc;

use super::session::SessionCookies;
use crate::accounts::AccountService;
use crate::auth::{AccessGuard, JwtManager};
use crate::storage::TicketDatabase;
use crate::tickets::TicketService;

/// Cloned into every handler; all members are cheap handles over one pool.
#[derive(Clone)]
pub struct AppState {
    pub db: TicketDatabase,
    pub tickets: TicketService,
    pub accounts: AccountService,
    pub guard: AccessGuard,
    pub cookies: SessionCookies,
}

impl AppState {
    pub fn new(db: TicketDatabase, jwt: Arc<JwtManager>, cookies: SessionCookies) -> Self {
        let guard = AccessGuard::new(db.clone(), jwt);
        Self {
            tickets: TicketService::new(db.clone()),
            accounts: AccountService::new(db.clone(), guard.clone()),
            guard,
            cookies,
            db,
        }
    }
}
