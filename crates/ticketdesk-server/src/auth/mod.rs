//! Access Guard: session tokens, password hashing, and the authentication
//! and authorization checks in front of every ticket operation.

pub mod claims;
pub mod guard;
pub mod jwt;
pub mod password;


pub use claims::Claims;
pub use guard::{AccessGuard, Principal};
pub use jwt::{JwtManager, SessionToken};
