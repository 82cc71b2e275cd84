//! User accounts: registration, login, and profile management.

mod service;
mod types;


pub use service::AccountService;
pub use types::{ActivationInput, ChangePasswordInput, LoginInput, ProfileInput, RegisterInput};
