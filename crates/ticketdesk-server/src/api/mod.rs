//! REST API: route table, extractors, and the HTTP error mapping.

mod error;
mod extract;
mod health;
mod session;
mod state;
mod tickets;
mod users;


use axum::Router;
use axum::routing::{delete, get, post, put};
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use session::SessionCookies;
pub use state::AppState;

/// Build the application router over `state`.
pub fn build_router(state: AppState) -> Router {
    let ticket_routes = Router::new()
        .route("/", get(tickets::list))
        .route("/create", post(tickets::create))
        .route("/dashboard", get(tickets::dashboard))
        .route("/duplicate/:id", post(tickets::duplicate))
        .route("/create-subticket/:id", post(tickets::add_sub_ticket))
        .route("/update/:id", put(tickets::update))
        .route("/delete-restore", delete(tickets::delete_restore_all))
        .route("/delete-restore/:id", delete(tickets::delete_restore_one))
        .route("/:id", get(tickets::get).put(tickets::trash));

    let user_routes = Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/logout", post(users::logout))
        .route("/get-team", get(users::team))
        .route("/profile", put(users::update_profile))
        .route("/change-password", put(users::change_password))
        .route("/:id", put(users::set_active).delete(users::delete));

    Router::new()
        .route("/health", get(health::health))
        .nest("/api/ticket", ticket_routes)
        .nest("/api/user", user_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
